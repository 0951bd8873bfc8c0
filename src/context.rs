use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;

/// Counters shared by every pipeline stage. Workers only touch these through atomics.
#[derive(Debug)]
pub struct RunContext {
    started: Instant,
    pub pages_fetched: AtomicUsize,
    pub pages_failed: AtomicUsize,
    pub entries_found: AtomicUsize,
    pub entries_resolved: AtomicUsize,
    pub entries_with_notes: AtomicUsize,
    pub failed_fetches: AtomicUsize,
    pub duplicates: AtomicUsize,
    pub dropped_by_normalizer: AtomicUsize,
    pub checkpoints_written: AtomicUsize,
    pub checkpoints_failed: AtomicUsize,
}

impl Default for RunContext {
    fn default() -> Self {
        RunContext {
            started: Instant::now(),
            pages_fetched: AtomicUsize::new(0),
            pages_failed: AtomicUsize::new(0),
            entries_found: AtomicUsize::new(0),
            entries_resolved: AtomicUsize::new(0),
            entries_with_notes: AtomicUsize::new(0),
            failed_fetches: AtomicUsize::new(0),
            duplicates: AtomicUsize::new(0),
            dropped_by_normalizer: AtomicUsize::new(0),
            checkpoints_written: AtomicUsize::new(0),
            checkpoints_failed: AtomicUsize::new(0),
        }
    }
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn incr(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(counter: &AtomicUsize, n: usize) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn summary(&self, records_out: usize) -> RunSummary {
        let get = |c: &AtomicUsize| c.load(Ordering::Relaxed);
        RunSummary {
            pages_fetched: get(&self.pages_fetched),
            pages_failed: get(&self.pages_failed),
            entries_found: get(&self.entries_found),
            entries_resolved: get(&self.entries_resolved),
            entries_with_notes: get(&self.entries_with_notes),
            failed_fetches: get(&self.failed_fetches),
            duplicates: get(&self.duplicates),
            dropped_by_normalizer: get(&self.dropped_by_normalizer),
            checkpoints_written: get(&self.checkpoints_written),
            checkpoints_failed: get(&self.checkpoints_failed),
            records_out,
            elapsed_secs: self.elapsed().as_secs_f64(),
        }
    }
}

/// Run totals handed to the reporting layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub pages_fetched: usize,
    pub pages_failed: usize,
    pub entries_found: usize,
    pub entries_resolved: usize,
    pub entries_with_notes: usize,
    pub failed_fetches: usize,
    pub duplicates: usize,
    pub dropped_by_normalizer: usize,
    pub checkpoints_written: usize,
    pub checkpoints_failed: usize,
    pub records_out: usize,
    pub elapsed_secs: f64,
}

impl RunSummary {
    pub fn print(&self) {
        println!("Pages fetched:      {} ({} failed)", self.pages_fetched, self.pages_failed);
        println!("Entries found:      {}", self.entries_found);
        println!("Entries resolved:   {}", self.entries_resolved);
        println!("Entries with notes: {}", self.entries_with_notes);
        println!("Failed fetches:     {}", self.failed_fetches);
        println!("Duplicates:         {}", self.duplicates);
        println!("Dropped (sparse):   {}", self.dropped_by_normalizer);
        println!(
            "Checkpoints:        {} written, {} failed",
            self.checkpoints_written, self.checkpoints_failed
        );
        println!("Records out:        {}", self.records_out);
    }
}
