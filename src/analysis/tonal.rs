//! Tonal analyzer: tuning frequency and key

use super::traits::Analyzer;
use crate::error::Error;
use crate::fields::{positive_number, LabeledField, OutputLines, ParseError};
use crate::tools::{Invocation, ToolError};
use std::path::PathBuf;

/// Side artifact the tonal analyzer writes into the session directory
pub const TONAL_ARTIFACT: &str = "tonal.yaml";

const TOOL: &str = "tonal analyzer";

/// `Tuning Frequency: <hz>` (18-character prefix including the space)
const TUNING_FREQUENCY: LabeledField = LabeledField::new("Tuning Frequency", ':');

/// `Key: <key>` (5-character prefix including the space)
const KEY: LabeledField = LabeledField::new("Key", ':');

/// Parsed tonal analyzer output
#[derive(Debug, Clone, PartialEq)]
pub struct TonalReading {
    /// Tuning frequency as printed, e.g. `441.2`
    pub tuning_frequency: String,

    /// Key name as printed, e.g. `A min`
    pub key: String,
}

#[derive(Debug, Clone)]
pub struct TonalAnalyzer {
    program: PathBuf,
}

impl TonalAnalyzer {
    pub fn new(program: PathBuf) -> Self {
        Self { program }
    }
}

impl Analyzer for TonalAnalyzer {
    type Reading = TonalReading;

    fn invocation(&self, clip_name: &str) -> Invocation {
        Invocation::new(&self.program).args([clip_name, TONAL_ARTIFACT])
    }

    fn parse(&self, stdout: &str) -> Result<TonalReading, ParseError> {
        parse_tonal_output(stdout)
    }

    fn failure(&self, error: ToolError) -> Error {
        Error::TonalAnalysis(error)
    }
}

/// Parse the two-line tonal analyzer output
pub fn parse_tonal_output(stdout: &str) -> Result<TonalReading, ParseError> {
    let lines = OutputLines::new(TOOL, stdout);
    lines.expect_exactly(2)?;

    let tuning_frequency = lines.field(0, &TUNING_FREQUENCY)?;
    positive_number(TOOL, TUNING_FREQUENCY.label, tuning_frequency)?;

    let key = lines.field(1, &KEY)?;

    Ok(TonalReading {
        tuning_frequency: tuning_frequency.to_string(),
        key: key.to_string(),
    })
}
