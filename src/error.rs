//! Error taxonomy for a pipeline run
//!
//! Component errors ([`ToolError`], [`ParseError`]) stay specific; the
//! crate-level [`Error`] says which kind of step broke so the driver can
//! attach the stage it was in.

use crate::fields::ParseError;
use crate::tools::ToolError;
use std::path::PathBuf;

/// Crate result type
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No source URL was supplied
    #[error("Please provide a YouTube, SoundCloud or Instagram link as an argument")]
    Usage,

    /// Directory or file create/move/delete failure
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Downloader metadata missing, unreadable or without a title
    #[error("Metadata error for {path:?}: {message}")]
    Metadata { path: PathBuf, message: String },

    /// Duration probe printed something other than `duration=<seconds>`
    #[error("Unexpected probe output: {0}")]
    ProbeParse(String),

    /// Analyzer stdout did not match its fixed layout
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Download failed: {0}")]
    Download(#[source] ToolError),

    #[error("Duration probe failed: {0}")]
    Probe(#[source] ToolError),

    #[error("Reference clip failed: {0}")]
    Clip(#[source] ToolError),

    /// Rounded duration leaves nothing to clip
    #[error("Track too short to analyze ({0:.2}s)")]
    TrackTooShort(f64),

    #[error("Error analyzing tonal key: {0}")]
    TonalAnalysis(#[source] ToolError),

    #[error("Error analyzing rhythm: {0}")]
    RhythmAnalysis(#[source] ToolError),

    #[error("Session {0} already has results")]
    ResultsAlreadySet(String),
}

impl Error {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Error::Io {
            context: context.into(),
            source,
        }
    }
}
