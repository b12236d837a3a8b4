//! Scalar writer implementations

use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// One recorded scalar value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarRecord {
    /// Metric name, e.g. `"scalar/kd_loss"`
    pub tag: String,
    /// Metric value at this step
    pub value: f32,
    /// Global training step
    pub step: u64,
}

/// Sink for per-step scalar metrics.
pub trait ScalarWriter {
    /// Record one named scalar at a training step.
    fn add_scalar(&mut self, tag: &str, value: f32, step: u64);

    /// Flush buffered records to the backing store, if any.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Sink for runs without metric logging. Accepts and discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpWriter;

impl ScalarWriter for NoOpWriter {
    fn add_scalar(&mut self, _tag: &str, _value: f32, _step: u64) {}
}

/// In-memory sink, mainly for tests and post-run inspection.
#[derive(Debug, Default)]
pub struct InMemoryWriter {
    records: Vec<ScalarRecord>,
}

impl InMemoryWriter {
    /// Create an empty in-memory sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// All records written so far, in write order.
    pub fn records(&self) -> &[ScalarRecord] {
        &self.records
    }

    /// Records written under one tag, in write order.
    pub fn records_for(&self, tag: &str) -> Vec<&ScalarRecord> {
        self.records.iter().filter(|r| r.tag == tag).collect()
    }
}

impl ScalarWriter for InMemoryWriter {
    fn add_scalar(&mut self, tag: &str, value: f32, step: u64) {
        self.records.push(ScalarRecord {
            tag: tag.to_string(),
            value,
            step,
        });
    }
}

/// File-backed sink: one JSON record per line under the run's log directory.
#[derive(Debug)]
pub struct JsonlWriter {
    out: BufWriter<File>,
}

impl JsonlWriter {
    /// Create `scalars.jsonl` inside `log_dir`, creating the directory if
    /// needed. An existing file is truncated.
    pub fn create(log_dir: &Path) -> Result<Self> {
        fs::create_dir_all(log_dir)?;
        let file = File::create(log_dir.join("scalars.jsonl"))?;
        Ok(Self {
            out: BufWriter::new(file),
        })
    }
}

impl ScalarWriter for JsonlWriter {
    fn add_scalar(&mut self, tag: &str, value: f32, step: u64) {
        let record = ScalarRecord {
            tag: tag.to_string(),
            value,
            step,
        };
        // A full disk mid-training should not abort the step; drop the
        // record and say so.
        if let Err(err) = serde_json::to_writer(&mut self.out, &record)
            .map_err(std::io::Error::from)
            .and_then(|()| self.out.write_all(b"\n"))
        {
            tracing::warn!(%tag, step, "failed to write scalar record: {err}");
        }
    }

    fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}
