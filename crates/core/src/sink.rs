//! Append-only record sink.
//!
//! This layer is deliberately byte-only — it does not know about packets
//! or record formats. The extractor formats records and appends them here.
//!
//! One sink instance exists per filter stage: opened by
//! [`SeiTap::start`](crate::SeiTap::start), closed by
//! [`SeiTap::stop`](crate::SeiTap::stop), never shared and never reopened
//! mid-stream.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Buffered append-only file sink for extraction records.
#[derive(Debug)]
pub struct RecordSink {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl RecordSink {
    /// Open the sink at `path` in truncate-write binary mode.
    ///
    /// Returns [`Error::SinkUnavailable`] if the file cannot be created —
    /// fatal to stage startup.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|source| Error::SinkUnavailable {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "record sink opened");
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
        })
    }

    /// Append raw bytes to the sink.
    pub fn append(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer.write_all(bytes)?;
        Ok(())
    }

    /// Flush buffered records to the file.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Flush and close the sink, logging any final-flush failure.
    ///
    /// Records appended after the last successful flush may be lost if the
    /// final flush fails; the close itself never faults.
    pub fn close(mut self) {
        if let Err(e) = self.writer.flush() {
            tracing::warn!(path = %self.path.display(), error = %e, "sink final flush failed");
        }
        tracing::debug!(path = %self.path.display(), "record sink closed");
    }

    /// Path the sink was opened at.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
