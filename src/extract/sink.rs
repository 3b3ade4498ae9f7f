//! Newline-delimited JSON output
//!
//! One sink per job, opened in append mode: re-running a job adds to the
//! file rather than truncating what a previous run wrote.

use crate::extract::{ExtractError, Record};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Appending JSONL writer for one job's output file
pub struct JsonlSink {
    writer: BufWriter<File>,
}

impl JsonlSink {
    /// Opens `path` for appending, creating it if absent
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ExtractError> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    /// Appends one record as a compact JSON line
    pub fn write(&mut self, record: &Record) -> Result<(), ExtractError> {
        let line = serde_json::to_string(record)?;
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), ExtractError> {
        self.writer.flush()?;
        Ok(())
    }
}
