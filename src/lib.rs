//! Tracklabel - turn a media URL into a labeled audio file
//!
//! This library downloads a track with external tools, cuts a short
//! reference clip, runs a tonal and a rhythm analyzer over it and stores
//! the renamed audio next to a `session.json` report.

pub mod analysis;
pub mod browser;
pub mod clip;
pub mod error;
pub mod fields;
pub mod finalize;
pub mod metadata;
pub mod pipeline;
pub mod session;
pub mod tools;

pub use error::{Error, Result};
pub use pipeline::{Pipeline, PipelineConfig, PipelineFailure, PipelineRun, Stage};
pub use session::{Session, SessionReport};
