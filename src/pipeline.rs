use std::path::PathBuf;
use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::aggregate::{merge, Aggregator};
use crate::checkpoint::CheckpointWriter;
use crate::config::CrawlConfig;
use crate::context::{RunContext, RunSummary};
use crate::error::PipelineError;
use crate::fetch::Fetcher;
use crate::normalize::normalize_all;
use crate::paginator::Paginator;
use crate::record::{NormalizedRecord, RowMetadata};
use crate::resolver::DetailResolver;

/// Final output of a crawl.
#[derive(Debug)]
pub struct RunOutput {
    pub records: Vec<NormalizedRecord>,
    pub summary: RunSummary,
    pub final_checkpoint: Option<PathBuf>,
}

/// Paginate → resolve in batches → dedup → checkpoint → normalize.
pub struct Pipeline {
    cfg: CrawlConfig,
    fetcher: Arc<dyn Fetcher>,
}

fn progress_bar(len: usize, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len as u64);
    if let Ok(style) =
        ProgressStyle::default_bar().template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")
    {
        pb.set_style(style.progress_chars("=> "));
    }
    pb
}

/// Split off the next `size` rows, leaving the rest in `rows`.
fn next_batch(rows: &mut Vec<RowMetadata>, size: usize) -> Vec<RowMetadata> {
    let rest = rows.split_off(size.min(rows.len()));
    std::mem::replace(rows, rest)
}

impl Pipeline {
    pub fn new(cfg: CrawlConfig, fetcher: Arc<dyn Fetcher>) -> Self {
        Pipeline { cfg, fetcher }
    }

    pub async fn run(&self) -> Result<RunOutput, PipelineError> {
        self.cfg.validate()?;
        let ctx = RunContext::new();
        info!(
            target_entries = self.cfg.target_entries,
            max_pages = self.cfg.max_pages,
            workers = self.cfg.workers,
            batch_size = self.cfg.batch_size,
            "starting crawl"
        );

        // Phase 1: sequential pagination
        let mut pending = Paginator::new(self.fetcher.as_ref(), &self.cfg)?
            .collect(&ctx)
            .await;
        if pending.is_empty() {
            return Err(PipelineError::NoEntries);
        }
        info!(entries = pending.len(), "pagination complete");

        // Phase 2: batched detail resolution
        let resolver = DetailResolver::new(Arc::clone(&self.fetcher), &self.cfg);
        let mut aggregator = Aggregator::new();
        let mut checkpoints =
            CheckpointWriter::new(&self.cfg.checkpoint_dir, self.cfg.checkpoint_interval);
        let total_batches = pending.len().div_ceil(self.cfg.batch_size);
        let pb = progress_bar(pending.len(), self.cfg.show_progress);

        let mut batch_no = 0usize;
        while !pending.is_empty() {
            batch_no += 1;
            let batch = next_batch(&mut pending, self.cfg.batch_size);
            let size = batch.len();

            let resolved = resolver.resolve_batch(batch, &ctx, &pb).await;
            let resolved_count = resolved.len();
            let added = aggregator.extend(resolved.into_iter().map(|(m, d)| merge(m, d)));

            info!(
                batch = batch_no,
                of = total_batches,
                size,
                resolved = resolved_count,
                added,
                total = aggregator.len(),
                "batch complete"
            );
            checkpoints.maybe_checkpoint(aggregator.records(), &ctx);
        }
        pb.finish_and_clear();
        if aggregator.is_empty() {
            warn!(batches = total_batches, "no detail page resolved");
        }

        RunContext::add(&ctx.duplicates, aggregator.duplicates());
        let final_checkpoint = checkpoints.finalize(aggregator.records(), &ctx);

        // Phase 3: normalization
        let (records, dropped) = normalize_all(aggregator.into_records());
        RunContext::add(&ctx.dropped_by_normalizer, dropped);

        let summary = ctx.summary(records.len());
        info!(
            records = summary.records_out,
            failed = summary.failed_fetches,
            duplicates = summary.duplicates,
            "crawl finished in {:.1}s",
            summary.elapsed_secs
        );

        Ok(RunOutput {
            records,
            summary,
            final_checkpoint,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::load_records;
    use crate::fetch::testing::MemoryFetcher;
    use crate::paginator::tests::{listing_html, test_config, BASE};

    fn detail_html(id: u32) -> String {
        format!(
            "<html><body><dl>\
             <dt>Institution</dt><dd>University {id}</dd>\
             <dt>Program</dt><dd>CS</dd>\
             <dt>Degree Type</dt><dd>PhD</dd>\
             <dt>Decision</dt><dd>Accepted</dd>\
             <dt>Notes</dt><dd>Entry number {id} notes.</dd>\
             </dl></body></html>"
        )
    }

    #[test]
    fn batches_split_in_order() {
        let mut rows: Vec<RowMetadata> = (0..5)
            .map(|i| RowMetadata {
                key: i.to_string(),
                ..RowMetadata::default()
            })
            .collect();
        assert_eq!(next_batch(&mut rows, 2).len(), 2);
        assert_eq!(rows[0].key, "2");
        assert_eq!(next_batch(&mut rows, 2).len(), 2);
        assert_eq!(next_batch(&mut rows, 2).len(), 1);
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn end_to_end_two_pages() {
        let dir = tempfile::tempdir().unwrap();
        let mut fetcher = MemoryFetcher::default()
            .with(&format!("{BASE}/survey?p=1"), 200, &listing_html(&[1, 2, 3, 4, 5]))
            .with(&format!("{BASE}/survey?p=2"), 200, &listing_html(&[6, 1, 7]));
        // entry 7's detail document is missing and answers 404
        for id in 1..=6 {
            fetcher = fetcher.with(&format!("{BASE}/result/{id}"), 200, &detail_html(id));
        }
        let fetcher = Arc::new(fetcher);

        let cfg = CrawlConfig {
            target_entries: 100,
            empty_page_threshold: 3,
            batch_size: 3,
            checkpoint_interval: 4,
            checkpoint_dir: dir.path().to_path_buf(),
            ..test_config()
        };
        let out = Pipeline::new(cfg, fetcher.clone()).run().await.unwrap();

        assert_eq!(out.records.len(), 6);
        let keys: Vec<&str> = out.records.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["1", "2", "3", "4", "5", "6"]);

        let first = &out.records[0];
        assert_eq!(first.program.as_deref(), Some("Computer Science"));
        assert_eq!(first.season.as_deref(), Some("Fall 2025"));
        assert_eq!(first.added_on.as_deref(), Some("2025-03-01"));
        assert_eq!(first.completeness, 87);

        let s = &out.summary;
        assert_eq!(s.entries_found, 8);
        assert_eq!(s.entries_resolved, 7);
        assert_eq!(s.entries_with_notes, 7);
        assert_eq!(s.failed_fetches, 1);
        assert_eq!(s.duplicates, 1);
        assert_eq!(s.dropped_by_normalizer, 0);
        // pages 1-2 with rows, then 3 empty pages trip the breaker
        assert_eq!(s.pages_fetched, 5);
        assert_eq!(s.checkpoints_written, 2);

        let snapshot = load_records(&out.final_checkpoint.unwrap()).unwrap();
        assert_eq!(snapshot.len(), 6);
    }

    #[tokio::test]
    async fn unresolvable_details_finish_with_empty_output() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = MemoryFetcher::default()
            .with(&format!("{BASE}/survey?p=1"), 200, &listing_html(&[1, 2]));
        let cfg = CrawlConfig {
            target_entries: 2,
            checkpoint_dir: dir.path().to_path_buf(),
            ..test_config()
        };
        let out = Pipeline::new(cfg, Arc::new(fetcher)).run().await.unwrap();

        assert!(out.records.is_empty());
        assert_eq!(out.summary.failed_fetches, 2);
        let snapshot = load_records(&out.final_checkpoint.unwrap()).unwrap();
        assert!(snapshot.is_empty());
    }

    #[tokio::test]
    async fn zero_entries_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = CrawlConfig {
            checkpoint_dir: dir.path().to_path_buf(),
            ..test_config()
        };
        let err = Pipeline::new(cfg, Arc::new(MemoryFetcher::default()))
            .run()
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::NoEntries));
    }
}
