//! Environment-style configuration, read once at process start.
//!
//! Malformed values log a warning and fall back to the default; startup
//! never aborts over a bad variable.

use std::env;
use std::time::Duration;

use fetcher_engine::{FetchSettings, RequestLimits};
use fetcher_logging::fetcher_warn;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind_addr: String,
    pub limits: RequestLimits,
    pub connect_timeout: Duration,
    pub redirect_limit: usize,
    pub max_body_bytes: u64,
    pub allowed_content_keywords: Vec<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8000".to_string(),
            limits: RequestLimits::default(),
            connect_timeout: Duration::from_secs(10),
            redirect_limit: 5,
            max_body_bytes: 5 * 1024 * 1024,
            allowed_content_keywords: vec!["text".into(), "html".into(), "xml".into()],
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let default_concurrency = env_usize(
            "FETCHER_DEFAULT_CONCURRENCY",
            defaults.limits.default_concurrency,
            1,
        );
        // The ceiling can never undercut the default.
        let max_concurrency = env_usize(
            "FETCHER_MAX_CONCURRENCY",
            defaults.limits.max_concurrency.max(default_concurrency),
            default_concurrency,
        );

        Self {
            bind_addr: env::var("FETCHER_BIND_ADDR").unwrap_or(defaults.bind_addr),
            limits: RequestLimits {
                max_urls: env_usize("FETCHER_MAX_URLS", defaults.limits.max_urls, 1),
                default_concurrency,
                max_concurrency,
                default_timeout_secs: env_f64(
                    "FETCHER_DEFAULT_TIMEOUT",
                    defaults.limits.default_timeout_secs,
                    1.0,
                ),
            },
            connect_timeout: Duration::from_secs_f64(env_f64(
                "FETCHER_CONNECT_TIMEOUT",
                defaults.connect_timeout.as_secs_f64(),
                0.1,
            )),
            redirect_limit: defaults.redirect_limit,
            max_body_bytes: env_usize(
                "FETCHER_MAX_BODY_BYTES",
                defaults.max_body_bytes as usize,
                1,
            ) as u64,
            allowed_content_keywords: env_keywords(
                "FETCHER_ALLOWED_CONTENT_KEYWORDS",
                defaults.allowed_content_keywords,
            ),
        }
    }

    /// Base fetch settings for a batch; the per-request timeout replaces
    /// `request_timeout` when the batch runs.
    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            connect_timeout: self.connect_timeout,
            request_timeout: Duration::from_secs_f64(self.limits.default_timeout_secs),
            redirect_limit: self.redirect_limit,
            max_bytes: self.max_body_bytes,
        }
    }
}

fn env_usize(name: &str, default: usize, minimum: usize) -> usize {
    match env::var(name) {
        Ok(raw) => match raw.trim().parse::<usize>() {
            Ok(value) => value.max(minimum),
            Err(_) => {
                fetcher_warn!("{name} is not a valid integer, fallback to {default}");
                default
            }
        },
        Err(_) => default,
    }
}

fn env_f64(name: &str, default: f64, minimum: f64) -> f64 {
    match env::var(name) {
        Ok(raw) => match raw.trim().parse::<f64>() {
            // Non-finite values parse but cannot become a Duration.
            Ok(value) if value.is_finite() => value.max(minimum),
            _ => {
                fetcher_warn!("{name} is not a valid float, fallback to {default}");
                default
            }
        },
        Err(_) => default,
    }
}

fn env_keywords(name: &str, default: Vec<String>) -> Vec<String> {
    match env::var(name) {
        Ok(raw) => raw
            .split(',')
            .filter_map(|kw| {
                let kw = kw.trim().to_ascii_lowercase();
                if kw.is_empty() {
                    None
                } else {
                    Some(kw)
                }
            })
            .collect(),
        Err(_) => default,
    }
}
