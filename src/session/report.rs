use serde::{Deserialize, Serialize};

/// Final results of one run, set on the session in a single step
#[derive(Debug, Clone, PartialEq)]
pub struct TrackResults {
    /// Sanitized track title
    pub title: String,

    /// Tuning frequency exactly as the tonal analyzer printed it
    pub tuning_frequency: String,

    pub tonal_key: String,

    pub raw_bpm: f64,

    /// Recommended (rounded) BPM
    pub bpm: u32,
}

/// Contents of `session.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub id: String,
    pub path: String,
    pub title: String,
    pub tuning_frequency: String,
    pub tonal_key: String,
    #[serde(rename = "rawBpm")]
    pub raw_bpm: f64,
    pub bpm: u32,
}

impl SessionReport {
    pub(crate) fn new(id: &str, path: String, results: TrackResults) -> Self {
        Self {
            id: id.to_string(),
            path,
            title: results.title,
            tuning_frequency: results.tuning_frequency,
            tonal_key: results.tonal_key,
            raw_bpm: results.raw_bpm,
            bpm: results.bpm,
        }
    }
}
