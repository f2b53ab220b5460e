//! Main pipeline: download, probe, clip, analyze, finalize

use super::config::PipelineConfig;
use crate::analysis::{analyze_clip, RhythmAnalyzer, TonalAnalyzer};
use crate::clip::{prepare_clip, ClipWindow};
use crate::error::{Error, Result};
use crate::finalize::{finalize, FinalArtifacts};
use crate::metadata;
use crate::session::Session;
use crate::tools::{Invocation, ToolInvoker};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Full download inside the session directory
pub const SOURCE_AUDIO: &str = "ref.mp3";

/// Scratch reference clip inside the session directory
pub const CLIP_AUDIO: &str = "data.mp3";

const SEPARATOR: &str = "-----------------------";

/// Where a run is (or where it stopped)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    Downloading,
    ProbingDuration,
    ClippingReference,
    Analyzing,
    Finalizing,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Init => "Init",
            Stage::Downloading => "Downloading",
            Stage::ProbingDuration => "Probing duration",
            Stage::ClippingReference => "Clipping reference",
            Stage::Analyzing => "Analyzing",
            Stage::Finalizing => "Finalizing",
            Stage::Done => "Done",
        };
        f.write_str(name)
    }
}

/// Terminal failure of a run: the stage it was in and why it stopped
#[derive(Debug, thiserror::Error)]
#[error("{stage} failed: {source}")]
pub struct PipelineFailure {
    pub stage: Stage,
    #[source]
    pub source: Error,
}

/// A completed run
#[derive(Debug)]
pub struct PipelineRun {
    pub session: Session,
    pub artifacts: FinalArtifacts,
}

/// Main pipeline
///
/// Stages run strictly in order and block on their tool; only the two
/// analyzers overlap. Any failure ends the run, nothing is retried and no
/// report is written.
pub struct Pipeline<I: ToolInvoker> {
    config: PipelineConfig,
    invoker: Arc<I>,
    tonal: TonalAnalyzer,
    rhythm: RhythmAnalyzer,
}

impl<I: ToolInvoker + Send + Sync + 'static> Pipeline<I> {
    /// Create a new pipeline
    pub fn new(config: PipelineConfig, invoker: I) -> Self {
        let tonal = TonalAnalyzer::new(config.tools.tonal_analyzer.clone());
        let rhythm = RhythmAnalyzer::new(config.tools.rhythm_analyzer.clone());

        Self {
            config,
            invoker: Arc::new(invoker),
            tonal,
            rhythm,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn invoker(&self) -> &I {
        self.invoker.as_ref()
    }

    /// Run the whole pipeline for one source URL
    pub fn run(&self, source_url: &str) -> std::result::Result<PipelineRun, PipelineFailure> {
        let mut stage = Stage::Init;
        self.run_stages(source_url, &mut stage)
            .map_err(|source| PipelineFailure { stage, source })
    }

    fn run_stages(&self, source_url: &str, stage: &mut Stage) -> Result<PipelineRun> {
        let source_url = source_url.trim();
        if source_url.is_empty() {
            return Err(Error::Usage);
        }

        let timeout = self.config.tool_timeout;
        let tools = &self.config.tools;

        let mut session = Session::initialize(&self.config.sessions_root)?;
        log::info!("Session {} created at {:?}", session.id(), session.work_dir());

        // Step 1: Download audio and metadata
        enter(stage, Stage::Downloading);
        let source = self.download(&session, source_url)?;
        let title = metadata::read_title(&metadata::info_json_path(&source))?;

        // Step 2: Measure the download
        enter(stage, Stage::ProbingDuration);
        let duration = metadata::probe_duration(
            self.invoker.as_ref(),
            &tools.probe,
            session.work_dir(),
            SOURCE_AUDIO,
            timeout,
        )?;
        let duration_secs = metadata::whole_seconds(duration);

        // Step 3: Cut the reference clip
        enter(stage, Stage::ClippingReference);
        let window = ClipWindow::for_duration(duration_secs);
        if window.is_empty() {
            return Err(Error::TrackTooShort(duration));
        }
        let clip = prepare_clip(
            self.invoker.as_ref(),
            &tools.transcoder,
            session.work_dir(),
            SOURCE_AUDIO,
            CLIP_AUDIO,
            window,
            timeout,
        )?;

        log::info!("{}", SEPARATOR);
        log::info!("Total Track Duration : {}s", duration_secs);
        log::info!("Track Title : {}", title);

        // Step 4: Tonal and rhythm analysis, side by side
        enter(stage, Stage::Analyzing);
        let outcome = analyze_clip(
            &self.invoker,
            &self.tonal,
            &self.rhythm,
            session.work_dir(),
            CLIP_AUDIO,
            timeout,
        )?;

        // Step 5: Rename, clean up, write the report
        enter(stage, Stage::Finalizing);
        let artifacts = finalize(&mut session, &source, &clip, &title, &outcome)?;

        log::info!("{}", SEPARATOR);
        log::info!("session.json generated");

        enter(stage, Stage::Done);
        Ok(PipelineRun { session, artifacts })
    }

    /// Fetch `source_url` as mp3 into the session directory
    fn download(&self, session: &Session, source_url: &str) -> Result<PathBuf> {
        let target = session.artifact(SOURCE_AUDIO);

        let invocation = Invocation::new(&self.config.tools.downloader)
            .arg(source_url)
            .args([
                "--restrict-filenames",
                "-q",
                "--no-warnings",
                "--newline",
                "--progress",
                "--extract-audio",
                "--write-info-json",
                "--audio-format",
                "mp3",
                "--audio-quality",
                "320K",
                "-o",
            ])
            .arg(target.to_string_lossy())
            .in_dir(session.work_dir())
            .with_timeout(self.config.tool_timeout);

        log::info!("Downloading {}", source_url);

        let tool = invocation.tool_name();
        self.invoker
            .invoke(&invocation)
            .and_then(|out| out.ensure_success(&tool))
            .map_err(Error::Download)?;

        if !target.is_file() {
            return Err(Error::io(
                format!("{} reported success but {:?} is missing", tool, target),
                std::io::Error::from(std::io::ErrorKind::NotFound),
            ));
        }

        Ok(target)
    }
}

fn enter(stage: &mut Stage, next: Stage) {
    log::debug!("Stage: {} -> {}", stage, next);
    *stage = next;
}
