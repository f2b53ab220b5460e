//! Reference clip preparation
//!
//! Analyzers run against a short excerpt instead of the full download.
//! Tracks of at least [`FULL_TRACK_THRESHOLD_SECS`] are cut to the first
//! [`REFERENCE_WINDOW_SECS`]; shorter tracks are used whole.

use crate::error::{Error, Result};
use crate::tools::{Invocation, ToolInvoker};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Tracks shorter than this are clipped whole
pub const FULL_TRACK_THRESHOLD_SECS: u64 = 60;

/// Clip length for tracks at or above the threshold
pub const REFERENCE_WINDOW_SECS: u64 = 45;

/// Span of the source kept in the clip, in whole seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipWindow {
    pub start_secs: u64,
    pub end_secs: u64,
}

impl ClipWindow {
    /// Window for a track of `duration_secs` (already rounded)
    pub fn for_duration(duration_secs: u64) -> Self {
        let end_secs = if duration_secs >= FULL_TRACK_THRESHOLD_SECS {
            REFERENCE_WINDOW_SECS
        } else {
            duration_secs
        };
        Self {
            start_secs: 0,
            end_secs,
        }
    }

    pub fn len_secs(&self) -> u64 {
        self.end_secs - self.start_secs
    }

    pub fn is_empty(&self) -> bool {
        self.len_secs() == 0
    }

    /// End position as `HH:MM:SS` for the transcoder's `-to`
    pub fn end_timestamp(&self) -> String {
        let s = self.end_secs;
        format!("{:02}:{:02}:{:02}", s / 3600, (s % 3600) / 60, s % 60)
    }
}

/// Cut `window` of `source_name` into `clip_name`, both inside `work_dir`
///
/// Returns the path of the written clip.
pub fn prepare_clip<I: ToolInvoker>(
    invoker: &I,
    transcoder: &Path,
    work_dir: &Path,
    source_name: &str,
    clip_name: &str,
    window: ClipWindow,
    timeout: Option<Duration>,
) -> Result<PathBuf> {
    let invocation = Invocation::new(transcoder)
        .args(["-nostats", "-loglevel", "0", "-i", source_name, "-vn", "-acodec", "copy"])
        .args(["-to".to_string(), window.end_timestamp()])
        .arg(clip_name)
        .in_dir(work_dir)
        .captured()
        .with_timeout(timeout);

    log::debug!(
        "Clipping {} to {}s ({} -> {})",
        source_name,
        window.len_secs(),
        window.end_timestamp(),
        clip_name
    );

    let tool = invocation.tool_name();
    invoker
        .invoke(&invocation)
        .and_then(|out| out.ensure_success(&tool))
        .map_err(Error::Clip)?;

    let clip = work_dir.join(clip_name);
    if !clip.is_file() {
        return Err(Error::io(
            format!("{} reported success but wrote no clip", tool),
            std::io::Error::new(std::io::ErrorKind::NotFound, clip.display().to_string()),
        ));
    }

    Ok(clip)
}
