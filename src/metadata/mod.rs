//! Track metadata: downloader title and probed duration

use crate::error::{Error, Result};
use crate::fields::{positive_number, LabeledField, OutputLines};
use crate::tools::{Invocation, ToolInvoker};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const PROBE_TOOL: &str = "probe";

/// `duration=<seconds>` as printed with `-of default=noprint_wrappers=1`
const DURATION: LabeledField = LabeledField::new("duration", '=');

/// The part of the downloader's `.info.json` we read
#[derive(Debug, Deserialize)]
struct DownloadInfo {
    title: String,
}

/// Path of the metadata document the downloader writes beside `audio`
pub fn info_json_path(audio: &Path) -> PathBuf {
    let mut name = audio.file_name().unwrap_or_default().to_os_string();
    name.push(".info.json");
    audio.with_file_name(name)
}

/// Read the human-readable title from a downloader metadata document
pub fn read_title(info_json: &Path) -> Result<String> {
    let metadata_error = |message: String| Error::Metadata {
        path: info_json.to_path_buf(),
        message,
    };

    let raw = fs::read_to_string(info_json)
        .map_err(|e| metadata_error(format!("cannot read: {}", e)))?;
    let info: DownloadInfo =
        serde_json::from_str(&raw).map_err(|e| metadata_error(format!("invalid: {}", e)))?;

    Ok(info.title)
}

/// Parse the probe's stdout into seconds
pub fn parse_duration(stdout: &str) -> Result<f64> {
    // Blank lines before the first field carry nothing
    let lines = OutputLines::new(PROBE_TOOL, stdout.trim_start());

    // One line per stream; the first stream is the audio we just extracted
    let value = lines
        .field(0, &DURATION)
        .map_err(|e| Error::ProbeParse(e.to_string()))?;

    positive_number(PROBE_TOOL, DURATION.label, value).map_err(|e| Error::ProbeParse(e.to_string()))
}

/// Whole seconds used for the clip decision (round half to even)
pub fn whole_seconds(duration: f64) -> u64 {
    duration.round_ties_even() as u64
}

/// Run the probe against `audio` (relative to `work_dir`) and return its duration in seconds
pub fn probe_duration<I: ToolInvoker>(
    invoker: &I,
    probe: &Path,
    work_dir: &Path,
    audio_name: &str,
    timeout: Option<Duration>,
) -> Result<f64> {
    let invocation = Invocation::new(probe)
        .args([
            "-v",
            "error",
            "-hide_banner",
            "-show_entries",
            "stream=duration",
            "-of",
            "default=noprint_wrappers=1",
            audio_name,
        ])
        .in_dir(work_dir)
        .captured()
        .with_timeout(timeout);

    let tool = invocation.tool_name();
    let output = invoker
        .invoke(&invocation)
        .and_then(|out| out.ensure_success(&tool))
        .map_err(Error::Probe)?;

    parse_duration(&output.stdout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_info_json_path() {
        assert_eq!(
            info_json_path(Path::new("/s/20240101/ref.mp3")),
            PathBuf::from("/s/20240101/ref.mp3.info.json")
        );
    }

    #[test]
    fn test_read_title() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ref.mp3.info.json");
        fs::write(
            &path,
            r#"{"id": "abc", "title": "Daft Punk - Around the World", "duration": 429}"#,
        )
        .unwrap();

        assert_eq!(read_title(&path).unwrap(), "Daft Punk - Around the World");
    }

    #[test]
    fn test_read_title_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = read_title(&dir.path().join("absent.info.json"));
        assert!(matches!(result, Err(Error::Metadata { .. })));
    }

    #[test]
    fn test_read_title_without_title_field() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ref.mp3.info.json");
        fs::write(&path, r#"{"id": "abc", "uploader": "someone"}"#).unwrap();

        assert!(matches!(read_title(&path), Err(Error::Metadata { .. })));
    }

    #[test]
    fn test_read_title_unparsable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ref.mp3.info.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(read_title(&path), Err(Error::Metadata { .. })));
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("duration=183.431837\n").unwrap(), 183.431837);
        assert_eq!(parse_duration("duration=59.5\r\n").unwrap(), 59.5);
        // Extra streams are ignored
        assert_eq!(parse_duration("duration=42.0\nduration=41.9\n").unwrap(), 42.0);
    }

    #[test]
    fn test_parse_duration_skips_leading_blank_lines() {
        assert_eq!(parse_duration("\nduration=183.4\n").unwrap(), 183.4);
        assert_eq!(parse_duration("\r\n  \nduration=61\n").unwrap(), 61.0);
    }

    #[test]
    fn test_parse_duration_rejects_unexpected_output() {
        for bad in ["", "\n", "duration=N/A\n", "duration=\n", "durations=12\n", "12.5\n", "Duration: 12\n"] {
            assert!(
                matches!(parse_duration(bad), Err(Error::ProbeParse(_))),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_whole_seconds_rounds_half_to_even() {
        assert_eq!(whole_seconds(59.4), 59);
        assert_eq!(whole_seconds(59.5), 60);
        assert_eq!(whole_seconds(60.5), 60);
        assert_eq!(whole_seconds(61.5), 62);
        assert_eq!(whole_seconds(0.4), 0);
    }
}
