use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Append-only run log. Each stage of the pipeline records a one-line
/// status message; the file survives across runs (append, never truncate).
pub struct JobLog {
    path: PathBuf,
}

impl JobLog {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Append `<timestamp> : <message>` to the log file.
    pub fn record(&self, message: &str) -> Result<()> {
        let timestamp = Local::now().format(TIMESTAMP_FORMAT);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open log file {}", self.path.display()))?;
        writeln!(file, "{} : {}", timestamp, message)
            .with_context(|| format!("Failed to write to log file {}", self.path.display()))?;
        Ok(())
    }
}

// ── Tests ──
