//! Per-run session: identity, working directory and final report
//!
//! A session owns one directory under the sessions root. All artifacts of
//! the run live there, and `session.json` is written into it only once the
//! results have been set in full.

mod report;

pub use report::{SessionReport, TrackResults};

use crate::error::{Error, Result};
use chrono::{DateTime, Local};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Report file name inside the session directory
pub const REPORT_FILE: &str = "session.json";

/// Timestamp layout of session ids (second resolution)
const ID_FORMAT: &str = "%Y%m%d%H%M%S";

/// Suffixes tried when a session directory for the same second already exists
const MAX_ID_SUFFIX: u32 = 1000;

/// State of one pipeline run
#[derive(Debug)]
pub struct Session {
    id: String,
    work_dir: PathBuf,
    report: Option<SessionReport>,

    /// Serialized report, computed when results are set
    json: Option<String>,
}

impl Session {
    /// Create a new session directory under `sessions_root`
    ///
    /// The id is the local timestamp; runs started within the same second
    /// get a `-1`, `-2`, ... suffix instead of sharing a directory.
    pub fn initialize(sessions_root: &Path) -> Result<Self> {
        Self::initialize_at(sessions_root, Local::now())
    }

    pub(crate) fn initialize_at(sessions_root: &Path, now: DateTime<Local>) -> Result<Self> {
        fs::create_dir_all(sessions_root).map_err(|e| {
            Error::io(format!("Failed to create sessions directory {:?}", sessions_root), e)
        })?;

        let base_id = now.format(ID_FORMAT).to_string();

        for suffix in 0..MAX_ID_SUFFIX {
            let id = if suffix == 0 {
                base_id.clone()
            } else {
                format!("{}-{}", base_id, suffix)
            };
            let work_dir = sessions_root.join(&id);

            match fs::create_dir(&work_dir) {
                Ok(()) => {
                    log::debug!("Session {} created at {:?}", id, work_dir);
                    return Ok(Self {
                        id,
                        work_dir,
                        report: None,
                        json: None,
                    });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(Error::io(
                        format!("Failed to create session directory {:?}", work_dir),
                        e,
                    ))
                }
            }
        }

        Err(Error::io(
            format!("No free session directory for id {}", base_id),
            std::io::Error::new(ErrorKind::AlreadyExists, "session id space exhausted"),
        ))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Path of an artifact inside the session directory
    pub fn artifact(&self, name: &str) -> PathBuf {
        self.work_dir.join(name)
    }

    pub fn report_path(&self) -> PathBuf {
        self.artifact(REPORT_FILE)
    }

    /// Final results, once set
    pub fn report(&self) -> Option<&SessionReport> {
        self.report.as_ref()
    }

    /// Serialized report, once results are set
    pub fn json(&self) -> Option<&str> {
        self.json.as_deref()
    }

    /// Set all result fields at once and serialize the report
    ///
    /// Results are write-once; a second call fails and leaves the first
    /// results in place.
    pub fn set_results(&mut self, results: TrackResults) -> Result<()> {
        if self.report.is_some() {
            return Err(Error::ResultsAlreadySet(self.id.clone()));
        }

        let report = SessionReport::new(
            &self.id,
            self.work_dir.display().to_string(),
            results,
        );
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| Error::io("Failed to serialize session report", e.into()))?;

        self.report = Some(report);
        self.json = Some(json);
        Ok(())
    }

    /// Write `session.json`
    ///
    /// Returns the written path, or None when no results were set yet
    /// (nothing to persist is not a failure).
    pub fn save(&self) -> Result<Option<PathBuf>> {
        let Some(json) = &self.json else {
            log::debug!("Session {} has no results yet, nothing to save", self.id);
            return Ok(None);
        };

        let path = self.report_path();
        fs::write(&path, json)
            .map_err(|e| Error::io(format!("Failed to write {:?}", path), e))?;

        Ok(Some(path))
    }
}
