//! Scalar metric sinks
//!
//! The trainer reports a map of named scalar metrics once per step. Sinks
//! implement [`ScalarWriter`]; when no log directory is configured the
//! trainer gets a [`NoOpWriter`] and reporting silently does nothing, which
//! is the contract: an absent sink must never error.

mod writer;


pub use writer::{InMemoryWriter, JsonlWriter, NoOpWriter, ScalarRecord, ScalarWriter};

use crate::Result;
use std::collections::BTreeMap;
use std::path::Path;

/// Build the scalar sink for a run: JSONL under `log_dir`, or a no-op when
/// no directory is configured.
pub fn writer_from_config(log_dir: Option<&Path>) -> Result<Box<dyn ScalarWriter>> {
    match log_dir {
        Some(dir) => Ok(Box::new(JsonlWriter::create(dir)?)),
        None => {
            tracing::debug!("no log_dir configured, scalar reporting disabled");
            Ok(Box::new(NoOpWriter))
        }
    }
}

/// Write one step's named scalar metrics to a sink.
pub fn write_scalars(writer: &mut dyn ScalarWriter, scalars: &BTreeMap<String, f32>, step: u64) {
    for (tag, &value) in scalars {
        writer.add_scalar(tag, value, step);
    }
}
