//! Analyzer layer
//!
//! The tonal and rhythm analyzers are external tools with fixed stdout
//! layouts. Each is described by an [`Analyzer`] implementation; the
//! coordinator runs both concurrently against the reference clip.

mod coordinator;
mod rhythm;
mod tonal;
mod traits;

pub use crate::fields::ParseError;
pub use coordinator::{analyze_clip, AnalysisOutcome};
pub use rhythm::{parse_rhythm_output, recommended_bpm, RhythmAnalyzer, TempoReading};
pub use tonal::{parse_tonal_output, TonalAnalyzer, TonalReading, TONAL_ARTIFACT};
pub use traits::{run_analyzer, Analyzer};
