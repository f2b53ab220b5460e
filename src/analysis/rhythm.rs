//! Rhythm analyzer: tempo

use super::traits::Analyzer;
use crate::error::Error;
use crate::fields::{positive_number, LabeledField, OutputLines, ParseError};
use crate::tools::{Invocation, ToolError};
use std::path::PathBuf;

const TOOL: &str = "rhythm analyzer";

/// Line of the rhythm output carrying the tempo
const BPM_LINE: usize = 4;

/// `bpm:<value>` (4-character prefix)
const BPM: LabeledField = LabeledField::new("bpm", ':');

/// Parsed rhythm analyzer output
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempoReading {
    /// Tempo as measured
    pub raw_bpm: f64,

    /// Recommended whole-number tempo, see [`recommended_bpm`]
    pub bpm: u32,
}

/// Round a measured tempo to a whole BPM
///
/// Ties go to the even neighbour: 119.5 -> 120, 120.5 -> 120, 121.5 -> 122.
pub fn recommended_bpm(raw_bpm: f64) -> u32 {
    raw_bpm.round_ties_even() as u32
}

#[derive(Debug, Clone)]
pub struct RhythmAnalyzer {
    program: PathBuf,
}

impl RhythmAnalyzer {
    pub fn new(program: PathBuf) -> Self {
        Self { program }
    }
}

impl Analyzer for RhythmAnalyzer {
    type Reading = TempoReading;

    fn invocation(&self, clip_name: &str) -> Invocation {
        Invocation::new(&self.program).arg(clip_name)
    }

    fn parse(&self, stdout: &str) -> Result<TempoReading, ParseError> {
        parse_rhythm_output(stdout)
    }

    fn failure(&self, error: ToolError) -> Error {
        Error::RhythmAnalysis(error)
    }
}

/// Parse the tempo from line 5 of the rhythm analyzer output
pub fn parse_rhythm_output(stdout: &str) -> Result<TempoReading, ParseError> {
    let lines = OutputLines::new(TOOL, stdout);
    lines.expect_at_least(BPM_LINE + 1)?;

    let value = lines.field(BPM_LINE, &BPM)?;
    let raw_bpm = positive_number(TOOL, BPM.label, value)?;

    Ok(TempoReading {
        raw_bpm,
        bpm: recommended_bpm(raw_bpm),
    })
}
