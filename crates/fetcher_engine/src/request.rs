use std::time::Duration;

use serde::Deserialize;
use url::Url;

/// Hard bounds on the per-request timeout, in seconds.
pub const MIN_TIMEOUT_SECS: f64 = 1.0;
pub const MAX_TIMEOUT_SECS: f64 = 60.0;

/// Incoming `/fetch` request body, as deserialized from JSON. Values are
/// not trusted until [`FetchRequest::validate`] has run.
#[derive(Debug, Clone, Deserialize)]
pub struct FetchRequest {
    pub urls: Vec<String>,
    pub timeout: Option<f64>,
    pub concurrency: Option<usize>,
    #[serde(default = "default_to_markdown")]
    pub to_markdown: bool,
}

fn default_to_markdown() -> bool {
    true
}

/// Server-side bounds applied during validation, read once from the
/// environment at startup.
#[derive(Debug, Clone)]
pub struct RequestLimits {
    pub max_urls: usize,
    pub default_concurrency: usize,
    pub max_concurrency: usize,
    pub default_timeout_secs: f64,
}

impl Default for RequestLimits {
    fn default() -> Self {
        Self {
            max_urls: 64,
            default_concurrency: 10,
            max_concurrency: 64,
            default_timeout_secs: 15.0,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("urls must contain at least one URL")]
    EmptyUrls,
    #[error("urls cannot contain more than {max} items")]
    TooManyUrls { max: usize },
    #[error("invalid URL provided: {url}")]
    InvalidUrl { url: String },
    #[error("timeout must be between {min} and {max} seconds", min = MIN_TIMEOUT_SECS, max = MAX_TIMEOUT_SECS)]
    TimeoutOutOfRange,
    #[error("concurrency must be between 1 and {max}")]
    ConcurrencyOutOfRange { max: usize },
}

/// A request that passed boundary validation. Ranges are resolved against
/// the limits; no clamping happened, out-of-range input was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    pub urls: Vec<String>,
    pub timeout: Duration,
    /// Effective concurrency: the requested (or default) value, never more
    /// than the number of URLs.
    pub concurrency: usize,
    pub to_markdown: bool,
}

impl FetchRequest {
    /// Checks shape and ranges before any network activity. Every URL must
    /// be a well-formed absolute http(s) URL.
    pub fn validate(&self, limits: &RequestLimits) -> Result<ValidatedRequest, RequestError> {
        if self.urls.is_empty() {
            return Err(RequestError::EmptyUrls);
        }
        if self.urls.len() > limits.max_urls {
            return Err(RequestError::TooManyUrls {
                max: limits.max_urls,
            });
        }

        for url in &self.urls {
            let parsed = Url::parse(url).map_err(|_| RequestError::InvalidUrl {
                url: url.clone(),
            })?;
            let scheme_ok = parsed.scheme() == "http" || parsed.scheme() == "https";
            if !scheme_ok || !parsed.has_host() {
                return Err(RequestError::InvalidUrl { url: url.clone() });
            }
        }

        let timeout_secs = self.timeout.unwrap_or(limits.default_timeout_secs);
        if !(MIN_TIMEOUT_SECS..=MAX_TIMEOUT_SECS).contains(&timeout_secs) {
            return Err(RequestError::TimeoutOutOfRange);
        }

        let requested = self.concurrency.unwrap_or(limits.default_concurrency);
        if requested < 1 || requested > limits.max_concurrency {
            return Err(RequestError::ConcurrencyOutOfRange {
                max: limits.max_concurrency,
            });
        }

        Ok(ValidatedRequest {
            urls: self.urls.clone(),
            timeout: Duration::from_secs_f64(timeout_secs),
            concurrency: requested.min(self.urls.len()),
            to_markdown: self.to_markdown,
        })
    }
}
