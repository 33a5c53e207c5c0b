//! The summarise-and-enrich pipeline.
//!
//! Cache-aside orchestration: check the store first, and only on a miss
//! extract content, then run summarisation and related-article lookup
//! together, then commit the combined result. Concurrent calls for the
//! same URL collapse onto a single execution.

use crate::agent::{AgentError, Summarizer};
use crate::extract::{ContentSource, ExtractError, Strategy};
use crate::related::{EnrichError, RelatedFinder};
use crate::storage::SummaryStore;
use crate::summary::Summary;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("content extraction failed: {0}")]
    Extraction(#[from] ExtractError),
    #[error("summarisation failed: {0}")]
    Summarization(#[from] AgentError),
    #[error("related-article lookup failed: {0}")]
    Enrichment(#[from] EnrichError),
}

/// Per-URL gate: whoever holds it may run the miss path for that URL.
type Gate = Arc<Mutex<()>>;

/// Orchestrates one `summarize` operation over injected collaborators.
pub struct Pipeline {
    store: Arc<dyn SummaryStore>,
    source: Arc<dyn ContentSource>,
    summarizer: Arc<dyn Summarizer>,
    finder: Arc<dyn RelatedFinder>,
    inflight: Mutex<HashMap<String, Gate>>,
}

impl Pipeline {
    pub fn new(
        store: Arc<dyn SummaryStore>,
        source: Arc<dyn ContentSource>,
        summarizer: Arc<dyn Summarizer>,
        finder: Arc<dyn RelatedFinder>,
    ) -> Self {
        Self {
            store,
            source,
            summarizer,
            finder,
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// Summarise `url`, reusing the cached result when one exists.
    ///
    /// On a miss this runs the full extract → summarise + find-related
    /// sequence and caches the combined result. Nothing is ever cached
    /// for a failed run.
    pub async fn summarize(&self, url: &str) -> Result<Summary, PipelineError> {
        if let Some(hit) = self.cached(url).await {
            debug!(%url, "cache hit");
            return Ok(hit);
        }

        let gate = self.acquire_gate(url).await;
        let result = {
            let _running = gate.lock().await;
            // Someone may have finished this URL while we waited.
            match self.cached(url).await {
                Some(hit) => {
                    debug!(%url, "cache hit after waiting on in-flight run");
                    Ok(hit)
                }
                None => self.run(url).await,
            }
        };
        self.release_gate(url, &gate).await;
        result
    }

    /// Cache read; failures count as misses so the pipeline can rebuild
    /// (and overwrite) a broken record.
    async fn cached(&self, url: &str) -> Option<Summary> {
        match self.store.get(url).await {
            Ok(Some(stored)) => Some(stored.summary),
            Ok(None) => None,
            Err(err) => {
                warn!(%url, error = %err, "cache read failed; treating as miss");
                None
            }
        }
    }

    /// One full miss-path execution.
    async fn run(&self, url: &str) -> Result<Summary, PipelineError> {
        let strategy = Strategy::for_url(url);
        debug!(%url, ?strategy, "cache miss; extracting content");
        let content = self.source.extract(url, strategy).await?;

        // The two service calls are independent given the extracted
        // text; either failure drops the whole result before anything
        // is persisted.
        let (completion, related) = tokio::try_join!(
            async {
                self.summarizer
                    .summarize(&content, strategy.prompt())
                    .await
                    .map_err(PipelineError::from)
            },
            async {
                self.finder
                    .find_related(url)
                    .await
                    .map_err(PipelineError::from)
            },
        )?;

        let summary = Summary::new(completion.text, completion.tokens_used, related);

        // A failed write only costs the next call a recomputation.
        if let Err(err) = self.store.put(url, &summary).await {
            warn!(%url, error = %err, "failed to cache summary");
        }

        Ok(summary)
    }

    async fn acquire_gate(&self, url: &str) -> Gate {
        let mut inflight = self.inflight.lock().await;
        inflight.entry(url.to_string()).or_default().clone()
    }

    /// Drop the map entry once nothing else holds this gate. Waiters
    /// hold their own clone, so a strong count above two means the
    /// entry stays for the last of them to clean up.
    async fn release_gate(&self, url: &str, gate: &Gate) {
        let mut inflight = self.inflight.lock().await;
        if Arc::strong_count(gate) <= 2 {
            inflight.remove(url);
        }
    }
}
