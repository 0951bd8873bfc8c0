use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{info, warn};

use crate::context::RunContext;
use crate::error::PipelineError;
use crate::record::AggregatedRecord;

/// Write `value` as pretty JSON via a temporary sibling, then rename into place.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), PipelineError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let mut writer = BufWriter::new(File::create(&tmp)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    drop(writer);

    fs::rename(&tmp, path)?;
    Ok(())
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, PipelineError> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

/// Load a checkpoint artifact for an operator-driven replay.
pub fn load_records(path: &Path) -> Result<Vec<AggregatedRecord>, PipelineError> {
    read_json(path)
}

/// Snapshots the accumulated set every `interval` records and once at the end.
/// Every snapshot gets a new file; nothing is overwritten.
#[derive(Debug)]
pub struct CheckpointWriter {
    dir: PathBuf,
    interval: usize,
    next_at: usize,
    seq: usize,
}

impl CheckpointWriter {
    pub fn new(dir: impl Into<PathBuf>, interval: usize) -> Self {
        let interval = interval.max(1);
        CheckpointWriter {
            dir: dir.into(),
            interval,
            next_at: interval,
            seq: 0,
        }
    }

    /// Write a snapshot if the record count has crossed the next multiple of the interval.
    pub fn maybe_checkpoint(
        &mut self,
        records: &[AggregatedRecord],
        ctx: &RunContext,
    ) -> Option<PathBuf> {
        if records.len() < self.next_at {
            return None;
        }
        self.next_at = (records.len() / self.interval + 1) * self.interval;
        self.write(records, false, ctx)
    }

    pub fn finalize(&mut self, records: &[AggregatedRecord], ctx: &RunContext) -> Option<PathBuf> {
        self.write(records, true, ctx)
    }

    fn file_name(&self, count: usize, is_final: bool) -> String {
        let stamp = chrono::Local::now().format("%Y%m%dT%H%M%S%3f");
        let pid = std::process::id();
        let suffix = if is_final { "_final" } else { "" };
        format!("checkpoint_{stamp}_{pid}_{:04}_{count}_entries{suffix}.json", self.seq)
    }

    /// Next unused artifact path; an existing snapshot is never reused.
    fn next_path(&mut self, count: usize, is_final: bool) -> PathBuf {
        loop {
            self.seq += 1;
            let path = self.dir.join(self.file_name(count, is_final));
            if !path.exists() {
                return path;
            }
        }
    }

    // Failures are logged and counted; the run carries on.
    fn write(
        &mut self,
        records: &[AggregatedRecord],
        is_final: bool,
        ctx: &RunContext,
    ) -> Option<PathBuf> {
        let path = self.next_path(records.len(), is_final);

        match write_json(&path, records) {
            Ok(()) => {
                RunContext::incr(&ctx.checkpoints_written);
                info!(path = %path.display(), records = records.len(), "checkpoint saved");
                Some(path)
            }
            Err(e) => {
                RunContext::incr(&ctx.checkpoints_failed);
                warn!(path = %path.display(), error = %e, "checkpoint write failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(n: usize) -> Vec<AggregatedRecord> {
        (0..n)
            .map(|i| AggregatedRecord {
                key: i.to_string(),
                detail_url: format!("https://gc.test/result/{i}"),
                institution: Some(format!("U{i}")),
                ..AggregatedRecord::default()
            })
            .collect()
    }

    #[test]
    fn fires_on_each_interval_crossing() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = RunContext::new();
        let mut writer = CheckpointWriter::new(dir.path(), 50);

        assert!(writer.maybe_checkpoint(&records(49), &ctx).is_none());
        assert!(writer.maybe_checkpoint(&records(50), &ctx).is_some());
        assert!(writer.maybe_checkpoint(&records(60), &ctx).is_none());
        // a batch that jumps past two multiples still fires once
        assert!(writer.maybe_checkpoint(&records(140), &ctx).is_some());
        assert!(writer.maybe_checkpoint(&records(149), &ctx).is_none());
        assert!(writer.maybe_checkpoint(&records(150), &ctx).is_some());

        assert_eq!(ctx.summary(0).checkpoints_written, 3);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 3);
    }

    #[test]
    fn artifacts_are_unique_and_loadable() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = RunContext::new();
        let mut writer = CheckpointWriter::new(dir.path(), 2);

        let first = writer.maybe_checkpoint(&records(2), &ctx).unwrap();
        let last = writer.finalize(&records(3), &ctx).unwrap();
        assert_ne!(first, last);

        let name = last.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("checkpoint_"));
        assert!(name.ends_with("_3_entries_final.json"));

        let loaded = load_records(&last).unwrap();
        assert_eq!(loaded, records(3));
        assert!(load_records(&first).unwrap().len() == 2);
        // no temporary files left behind
        assert!(fs::read_dir(dir.path())
            .unwrap()
            .all(|e| !e.unwrap().file_name().to_string_lossy().ends_with(".tmp")));
    }

    #[test]
    fn concurrent_writers_never_share_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = RunContext::new();
        let mut a = CheckpointWriter::new(dir.path(), 10);
        let mut b = CheckpointWriter::new(dir.path(), 10);

        let first = a.finalize(&records(3), &ctx).unwrap();
        let second = b.finalize(&records(3), &ctx).unwrap();
        assert_ne!(first, second);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
        assert_eq!(load_records(&first).unwrap().len(), 3);
    }

    #[test]
    fn write_failure_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not_a_dir");
        fs::write(&blocker, "x").unwrap();

        let ctx = RunContext::new();
        let mut writer = CheckpointWriter::new(&blocker, 1);
        assert!(writer.maybe_checkpoint(&records(1), &ctx).is_none());
        assert!(writer.finalize(&records(1), &ctx).is_none());

        let s = ctx.summary(0);
        assert_eq!(s.checkpoints_failed, 2);
        assert_eq!(s.checkpoints_written, 0);
    }
}
