use std::sync::Arc;
use std::time::Duration;

use indicatif::ProgressBar;
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, warn};

use crate::config::{CrawlConfig, DelayRange};
use crate::context::RunContext;
use crate::error::ResolveError;
use crate::fetch::{fetch_with_retry, Fetcher, RetryPolicy};
use crate::parser;
use crate::record::{DetailRecord, RowMetadata};

type Resolved = (usize, RowMetadata, Result<DetailRecord, ResolveError>);

/// Bounded worker pool that turns listing rows into detail records.
pub struct DetailResolver {
    fetcher: Arc<dyn Fetcher>,
    semaphore: Arc<Semaphore>,
    workers: usize,
    policy: RetryPolicy,
    delay: DelayRange,
}

impl DetailResolver {
    pub fn new(fetcher: Arc<dyn Fetcher>, cfg: &CrawlConfig) -> Self {
        let workers = cfg.workers.max(1);
        DetailResolver {
            fetcher,
            semaphore: Arc::new(Semaphore::new(workers)),
            workers,
            policy: RetryPolicy {
                max_retries: cfg.max_retries,
                base_backoff: Duration::from_millis(cfg.retry_backoff_ms),
            },
            delay: cfg.detail_delay,
        }
    }

    /// Resolve a single row, outside the pool.
    pub async fn resolve(&self, meta: &RowMetadata) -> Result<DetailRecord, ResolveError> {
        resolve_one(self.fetcher.as_ref(), meta, self.policy, self.delay).await
    }

    /// Resolve one batch with at most `workers` fetches in flight.
    /// Successes come back in listing order; failures are counted and dropped.
    pub async fn resolve_batch(
        &self,
        batch: Vec<RowMetadata>,
        ctx: &RunContext,
        pb: &ProgressBar,
    ) -> Vec<(RowMetadata, DetailRecord)> {
        let (tx, mut rx) = mpsc::channel::<Resolved>(self.workers * 2);

        for (index, meta) in batch.into_iter().enumerate() {
            let fetcher = Arc::clone(&self.fetcher);
            let sem = Arc::clone(&self.semaphore);
            let tx = tx.clone();
            let policy = self.policy;
            let delay = self.delay;

            tokio::spawn(async move {
                let Ok(_permit) = sem.acquire_owned().await else {
                    return;
                };
                let result = resolve_one(fetcher.as_ref(), &meta, policy, delay).await;
                let _ = tx.send((index, meta, result)).await;
            });
        }

        // rx closes once every task has dropped its sender
        drop(tx);

        let mut resolved: Vec<(usize, RowMetadata, DetailRecord)> = Vec::new();
        while let Some((index, meta, result)) = rx.recv().await {
            match result {
                Ok(detail) => {
                    RunContext::incr(&ctx.entries_resolved);
                    if detail.has_notes() {
                        RunContext::incr(&ctx.entries_with_notes);
                    }
                    resolved.push((index, meta, detail));
                }
                Err(e) => {
                    RunContext::incr(&ctx.failed_fetches);
                    warn!(url = %meta.detail_url, "{e}");
                }
            }
            pb.inc(1);
        }

        resolved.sort_by_key(|(index, _, _)| *index);
        resolved.into_iter().map(|(_, m, d)| (m, d)).collect()
    }
}

async fn resolve_one(
    fetcher: &dyn Fetcher,
    meta: &RowMetadata,
    policy: RetryPolicy,
    delay: DelayRange,
) -> Result<DetailRecord, ResolveError> {
    tokio::time::sleep(delay.sample()).await;

    let doc = fetch_with_retry(fetcher, &meta.detail_url, policy)
        .await
        .map_err(|(source, attempts)| ResolveError {
            key: meta.key.clone(),
            attempts,
            source,
        })?;

    let detail = parser::parse_detail(&doc.body);
    debug!(key = %meta.key, notes = detail.has_notes(), "resolved detail");
    Ok(detail)
}
