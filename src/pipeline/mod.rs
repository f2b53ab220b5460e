//! Pipeline orchestration

pub mod config;
pub mod driver;

pub use config::PipelineConfig;
pub use driver::{Pipeline, PipelineFailure, PipelineRun, Stage, CLIP_AUDIO, SOURCE_AUDIO};
