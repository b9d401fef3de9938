use std::fmt;

use serde::{Deserialize, Serialize};

/// Raw transport result for one URL. Non-2xx statuses land here too; the
/// runner decides what a given status means for the outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutput {
    pub status: u16,
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// Per-URL result record, one per input URL, in input order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchOutcome {
    pub url: String,
    pub ok: bool,
    pub status_code: Option<u16>,
    pub charset: Option<String>,
    pub content: Option<String>,
    pub error: Option<String>,
    pub bytes_downloaded: Option<u64>,
    pub elapsed_ms: u64,
}

impl FetchOutcome {
    /// A fresh, not-yet-successful outcome for `url`. Fields are filled in
    /// as the runner advances; `ok` flips to true only on full success.
    pub fn pending(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ok: false,
            status_code: None,
            charset: None,
            content: None,
            error: None,
            bytes_downloaded: None,
            elapsed_ms: 0,
        }
    }
}

/// Aggregate response for one batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    pub total: usize,
    pub concurrency: usize,
    pub elapsed_ms: u64,
    pub results: Vec<FetchOutcome>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}: {}", self.kind, self.message)
        }
    }
}

/// Classification of transport-level failures. HTTP statuses are not in
/// here: reaching the server is a transport success whatever the code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    Timeout,
    Connect,
    RedirectLimitExceeded,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Connect => write!(f, "connection error"),
            FailureKind::RedirectLimitExceeded => write!(f, "too many redirects"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}
