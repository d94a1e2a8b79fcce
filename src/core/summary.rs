//! Session summary written when the loop stops

use crate::core::booth::LoopStats;
use crate::core::error::{BoothError, Result};
use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// How the session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionOutcome {
    Terminated,
    Failed,
}

/// One run of the capture loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub camera: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub outcome: SessionOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub stats: LoopStats,
}

impl SessionSummary {
    /// Duration of the session in whole seconds
    pub fn duration_secs(&self) -> i64 {
        (self.ended_at - self.started_at).num_seconds()
    }

    /// Write the summary as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        self.write_json(path).map_err(|source| BoothError::Output {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Saved session summary to: {}", path.display());
        Ok(())
    }

    fn write_json(&self, path: &Path) -> io::Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.write_all(b"\n")?;
        writer.flush()
    }
}
