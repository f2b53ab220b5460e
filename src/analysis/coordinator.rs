//! Concurrent execution of the tonal and rhythm analyzers
//!
//! Both analyzers only read the clip, so each runs on its own thread and
//! reports over a channel the moment it finishes. Readings are logged in
//! completion order. The first failure ends the analysis at once: the
//! other branch is left to finish in the background and its result is
//! never looked at.

use super::rhythm::{RhythmAnalyzer, TempoReading};
use super::tonal::{TonalAnalyzer, TonalReading};
use super::traits::{run_analyzer, Analyzer};
use crate::error::{Error, Result};
use crate::tools::{ToolError, ToolInvoker};
use crossbeam_channel::Sender;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Readings of both analyzers for one clip
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOutcome {
    pub tonal: TonalReading,
    pub tempo: TempoReading,
}

enum Finished {
    Tonal(Result<TonalReading>),
    Rhythm(Result<TempoReading>),
}

/// Run both analyzers against `clip_name` in `work_dir`
///
/// Returns as soon as both have succeeded or either has failed.
pub fn analyze_clip<I>(
    invoker: &Arc<I>,
    tonal: &TonalAnalyzer,
    rhythm: &RhythmAnalyzer,
    work_dir: &Path,
    clip_name: &str,
    timeout: Option<Duration>,
) -> Result<AnalysisOutcome>
where
    I: ToolInvoker + Send + Sync + 'static,
{
    let (tx, rx) = crossbeam_channel::bounded(2);

    spawn_branch(
        tonal.clone(),
        Arc::clone(invoker),
        work_dir,
        clip_name,
        timeout,
        tx.clone(),
        Finished::Tonal,
    );
    spawn_branch(
        rhythm.clone(),
        Arc::clone(invoker),
        work_dir,
        clip_name,
        timeout,
        tx,
        Finished::Rhythm,
    );

    let mut tonal_reading = None;
    let mut tempo_reading = None;

    loop {
        // Disconnected only if a branch died without reporting
        let Ok(finished) = rx.recv() else {
            return Err(if tonal_reading.is_none() {
                abandoned(tonal, clip_name)
            } else {
                abandoned(rhythm, clip_name)
            });
        };

        match finished {
            Finished::Tonal(Ok(reading)) => {
                log::info!("Tuning Frequency : {}", reading.tuning_frequency);
                log::info!("Tonal Key : {}", reading.key);
                tonal_reading = Some(reading);
            }
            Finished::Rhythm(Ok(reading)) => {
                log::info!("Raw BPM : {}", reading.raw_bpm);
                log::info!("Recommended BPM : {}", reading.bpm);
                tempo_reading = Some(reading);
            }
            Finished::Tonal(Err(e)) => {
                if tempo_reading.is_none() {
                    log::error!("{} (not waiting for the rhythm analyzer)", e);
                }
                return Err(e);
            }
            Finished::Rhythm(Err(e)) => {
                if tonal_reading.is_none() {
                    log::error!("{} (not waiting for the tonal analyzer)", e);
                }
                return Err(e);
            }
        }

        if let (Some(tonal), Some(tempo)) = (&tonal_reading, &tempo_reading) {
            return Ok(AnalysisOutcome {
                tonal: tonal.clone(),
                tempo: *tempo,
            });
        }
    }
}

/// Run one analyzer on a detached thread and send its result
fn spawn_branch<A, I>(
    analyzer: A,
    invoker: Arc<I>,
    work_dir: &Path,
    clip_name: &str,
    timeout: Option<Duration>,
    tx: Sender<Finished>,
    wrap: fn(Result<A::Reading>) -> Finished,
) where
    A: Analyzer + Send + 'static,
    I: ToolInvoker + Send + Sync + 'static,
{
    let work_dir: PathBuf = work_dir.to_path_buf();
    let clip_name = clip_name.to_string();

    thread::spawn(move || {
        let result = run_analyzer(&analyzer, invoker.as_ref(), &work_dir, &clip_name, timeout);
        // The receiver is gone once the other branch failed
        let _ = tx.send(wrap(result));
    });
}

fn abandoned<A: Analyzer>(analyzer: &A, clip_name: &str) -> Error {
    analyzer.failure(ToolError::Io {
        tool: analyzer.invocation(clip_name).tool_name(),
        source: std::io::Error::other("analyzer thread ended without a result"),
    })
}
