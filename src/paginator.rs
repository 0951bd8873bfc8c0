use tracing::{debug, info, warn};
use url::Url;

use crate::config::CrawlConfig;
use crate::context::RunContext;
use crate::error::PipelineError;
use crate::fetch::{fetch_with_retry, Fetcher, RetryPolicy};
use crate::parser::table;
use crate::record::{ListingPage, PageStatus, RowMetadata};

/// Rows read from one page index. `empty` feeds the circuit breaker.
#[derive(Debug)]
pub struct PageOutcome {
    pub rows: Vec<RowMetadata>,
    pub empty: bool,
    pub status: PageStatus,
}

/// Sequential listing walker. Page cursors are stateful, so pages are never fetched in parallel.
pub struct Paginator<'a> {
    fetcher: &'a dyn Fetcher,
    cfg: &'a CrawlConfig,
    base: Url,
}

impl<'a> Paginator<'a> {
    pub fn new(fetcher: &'a dyn Fetcher, cfg: &'a CrawlConfig) -> Result<Self, PipelineError> {
        let base = Url::parse(&cfg.base_url)
            .map_err(|e| PipelineError::Config(format!("invalid base_url: {e}")))?;
        Ok(Paginator { fetcher, cfg, base })
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.cfg.max_retries,
            base_backoff: std::time::Duration::from_millis(self.cfg.retry_backoff_ms),
        }
    }

    /// Try each listing URL template until one answers with a recognizable table.
    pub async fn fetch_page(&self, index: usize) -> PageOutcome {
        for template in &self.cfg.listing_urls {
            let url = self.cfg.listing_url(template, index);
            let page = match fetch_with_retry(self.fetcher, &url, self.retry_policy()).await {
                Ok(doc) => ListingPage {
                    index,
                    document: doc.body,
                    status: PageStatus::Ok,
                },
                Err((e, attempts)) => {
                    debug!(page = index, url = %url, attempts, error = %e, "listing fetch failed");
                    continue;
                }
            };

            match table::read_listing(&page.document, &self.base) {
                Some(rows) => {
                    let status = if rows.is_empty() {
                        PageStatus::Empty
                    } else {
                        page.status
                    };
                    debug!(page = page.index, url = %url, rows = rows.len(), ?status, "listing parsed");
                    return PageOutcome {
                        empty: status != PageStatus::Ok,
                        status,
                        rows,
                    };
                }
                None => {
                    debug!(page = page.index, url = %url, "no table in listing document");
                }
            }
        }

        warn!(page = index, "every listing URL failed");
        PageOutcome {
            rows: Vec::new(),
            empty: true,
            status: PageStatus::Failed,
        }
    }

    /// Walk pages from 1 until the target is met, the page cap is passed,
    /// or too many consecutive pages come back empty.
    pub async fn collect(&self, ctx: &RunContext) -> Vec<RowMetadata> {
        let mut all: Vec<RowMetadata> = Vec::new();
        let mut page = 1usize;
        let mut consecutive_empty = 0usize;

        while all.len() < self.cfg.target_entries
            && page <= self.cfg.max_pages
            && consecutive_empty < self.cfg.empty_page_threshold
        {
            if page > 1 {
                tokio::time::sleep(self.cfg.page_delay.sample()).await;
            }

            info!(page, entries = all.len(), "scraping listing page");
            let outcome = self.fetch_page(page).await;
            RunContext::incr(&ctx.pages_fetched);
            if outcome.status == PageStatus::Failed {
                RunContext::incr(&ctx.pages_failed);
            }

            if outcome.empty {
                consecutive_empty += 1;
                info!(page, consecutive_empty, "no entries found");
            } else {
                consecutive_empty = 0;
                info!(page, found = outcome.rows.len(), "entries found");
                all.extend(outcome.rows);
            }
            page += 1;
        }

        if consecutive_empty >= self.cfg.empty_page_threshold {
            warn!(consecutive_empty, "pagination stopped by empty-page breaker");
        }

        all.truncate(self.cfg.target_entries);
        RunContext::add(&ctx.entries_found, all.len());
        all
    }
}
