use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::fetch::{FetchSettings, Fetcher, ReqwestFetcher};
use crate::request::{FetchRequest, RequestError, RequestLimits};
use crate::runner::run_url;
use crate::types::{BatchResult, FetchOutcome};
use fetcher_logging::fetcher_info;

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    /// Malformed request, rejected before any network activity.
    #[error(transparent)]
    Request(#[from] RequestError),
    /// The per-batch HTTP client could not be constructed.
    #[error("http client setup failed: {0}")]
    Client(String),
    /// Execution slot allocation failed.
    #[error("execution slot allocation failed")]
    Slots,
    /// A task runner terminated abnormally instead of producing an outcome.
    #[error("task join failure: {0}")]
    Join(String),
}

/// Orchestrates one batch: validates the request, fans the URLs out over a
/// semaphore-bounded set of task runners and reassembles the outcomes in
/// input order.
#[derive(Debug, Clone)]
pub struct BatchRunner {
    limits: RequestLimits,
    settings: FetchSettings,
    allowed_content_keywords: Vec<String>,
}

impl BatchRunner {
    pub fn new(
        limits: RequestLimits,
        settings: FetchSettings,
        allowed_content_keywords: Vec<String>,
    ) -> Self {
        Self {
            limits,
            settings,
            allowed_content_keywords,
        }
    }

    pub async fn run(&self, request: &FetchRequest) -> Result<BatchResult, BatchError> {
        let validated = request.validate(&self.limits)?;
        let total = validated.urls.len();

        fetcher_info!(
            "incoming fetch: {} urls, concurrency={}, timeout={:.1}s",
            total,
            validated.concurrency,
            validated.timeout.as_secs_f64()
        );

        // One client per batch, carrying the request-level timeout budget.
        let settings = FetchSettings {
            request_timeout: validated.timeout,
            ..self.settings.clone()
        };
        let fetcher: Arc<dyn Fetcher> = Arc::new(
            ReqwestFetcher::new(settings).map_err(|err| BatchError::Client(err.to_string()))?,
        );

        let semaphore = Arc::new(Semaphore::new(validated.concurrency));
        let started = Instant::now();

        let mut tasks = JoinSet::new();
        for (index, url) in validated.urls.iter().cloned().enumerate() {
            let fetcher = Arc::clone(&fetcher);
            let semaphore = Arc::clone(&semaphore);
            let keywords = self.allowed_content_keywords.clone();
            let to_markdown = validated.to_markdown;

            tasks.spawn(async move {
                // The item clock starts at dispatch, so slot wait counts.
                let item_started = Instant::now();
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return Err(BatchError::Slots);
                };
                let mut outcome = run_url(&url, fetcher.as_ref(), to_markdown, &keywords).await;
                outcome.elapsed_ms = item_started.elapsed().as_millis() as u64;
                Ok((index, outcome))
            });
        }

        // Results land at their reserved index, whatever the finish order.
        let mut slots: Vec<Option<FetchOutcome>> = vec![None; total];
        while let Some(joined) = tasks.join_next().await {
            let (index, outcome) = joined.map_err(|err| BatchError::Join(err.to_string()))??;
            slots[index] = Some(outcome);
        }

        let results: Vec<FetchOutcome> = slots.into_iter().flatten().collect();
        debug_assert_eq!(results.len(), total);

        Ok(BatchResult {
            total,
            concurrency: validated.concurrency,
            elapsed_ms: started.elapsed().as_millis() as u64,
            results,
        })
    }
}
