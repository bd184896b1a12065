//! Append-only failure log (one JSON object per line) for engine failures.
use std::collections::BTreeSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::planning::requests::ProcessingRequest;
use crate::error::{Error, Result};
use crate::types::{Polarization, Workflow};

pub const FAILURE_LOG_NAME: &str = "failures.jsonl";

/// Enough identity to reproduce a failed unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub workflow: Workflow,
    pub unit: String,
    /// Canonical path fragment of the missing output
    pub marker: String,
    pub dates: Vec<NaiveDate>,
    pub scenes: Vec<PathBuf>,
    pub polarizations: Vec<Polarization>,
    pub message: String,
    pub recorded_at: DateTime<Utc>,
}

impl FailureRecord {
    pub fn from_request(request: &ProcessingRequest, error: &Error) -> Self {
        Self {
            workflow: request.workflow,
            unit: request.unit_name(),
            marker: request.marker.to_string(),
            dates: request.dates.clone(),
            scenes: request.scenes().cloned().collect(),
            polarizations: request.polarizations.clone(),
            message: error.to_string(),
            recorded_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FailureLog {
    path: PathBuf,
}

impl FailureLog {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            path: dir.join(FAILURE_LOG_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, record: &FailureRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let line = serde_json::to_string(record)?;
        writeln!(file, "{line}")?;
        Ok(())
    }

    /// All records; a missing log reads as empty. Unparseable lines are skipped.
    pub fn read(&self) -> Result<Vec<FailureRecord>> {
        if !self.path.is_file() {
            return Ok(Vec::new());
        }
        let text = fs::read_to_string(&self.path)?;
        let mut records = Vec::new();
        for (no, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<FailureRecord>(line) {
                Ok(record) => records.push(record),
                Err(e) => warn!("{}:{}: {}", self.path.display(), no + 1, e),
            }
        }
        Ok(records)
    }

    /// Dates touched by failures, optionally for one workflow only.
    pub fn failed_dates(&self, workflow: Option<Workflow>) -> Result<BTreeSet<NaiveDate>> {
        Ok(self
            .read()?
            .into_iter()
            .filter(|r| workflow.is_none_or(|w| r.workflow == w))
            .flat_map(|r| r.dates)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::engine::tests::request;

    #[test]
    fn records_round_trip_through_the_log() {
        let dir = tempfile::tempdir().unwrap();
        let log = FailureLog::in_dir(&dir.path().join("logs"));
        assert!(log.read().unwrap().is_empty());

        let req = request(dir.path().join("out/P/VV"));
        let err = Error::EngineFailure {
            unit: req.unit_name(),
            message: "gpt exited with exit status: 1".into(),
        };
        log.append(&FailureRecord::from_request(&req, &err)).unwrap();
        log.append(&FailureRecord::from_request(&req, &err)).unwrap();

        let records = log.read().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].unit, "P_VV");
        assert_eq!(records[0].marker, "P/VV.tif");
        assert!(records[0].message.contains("exit status"));
    }

    #[test]
    fn failed_dates_filter_by_workflow_and_skip_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let log = FailureLog::in_dir(dir.path());
        let req = request(dir.path().join("out/P/VV"));
        let err = Error::EngineFailure {
            unit: "P_VV".into(),
            message: "boom".into(),
        };
        log.append(&FailureRecord::from_request(&req, &err)).unwrap();
        fs::OpenOptions::new()
            .append(true)
            .open(log.path())
            .unwrap()
            .write_all(b"not json\n")
            .unwrap();

        let all = log.failed_dates(None).unwrap();
        assert_eq!(all.len(), 1);
        assert!(log.failed_dates(Some(Workflow::Coh)).unwrap().is_empty());
    }
}
