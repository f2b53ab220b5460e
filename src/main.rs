use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracklabel::browser::open_in_file_browser;
use tracklabel::tools::{resolve_program, ProcessInvoker, ToolPaths};
use tracklabel::{Error, Pipeline, PipelineConfig};

/// Process exit code for any failed run
const FAILURE_EXIT_CODE: i32 = -1;

#[derive(Parser, Debug)]
#[command(name = "tracklabel")]
#[command(about = "Download a track and label it with key, tuning and BPM", long_about = None)]
struct Args {
    /// Source link (YouTube, SoundCloud, Instagram, ...)
    url: Option<String>,

    /// Directory that receives one sub-directory per session
    #[arg(long, default_value = "sessions")]
    sessions_dir: String,

    /// Directory holding the external tools (default: look them up on PATH)
    #[arg(long)]
    bin_dir: Option<String>,

    /// Tonal analyzer executable (overrides --bin-dir)
    #[arg(long)]
    key_tool: Option<String>,

    /// Rhythm analyzer executable (overrides --bin-dir)
    #[arg(long)]
    rhythm_tool: Option<String>,

    /// Maximum run time of each external tool, in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Don't open the session directory when done
    #[arg(long)]
    no_open: bool,

    /// Verbose logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    if let Err(e) = run(args) {
        log::error!("{:#}", e);
        log::error!("Exiting...");
        std::process::exit(FAILURE_EXIT_CODE);
    }
}

fn run(args: Args) -> Result<()> {
    let url = args.url.ok_or(Error::Usage)?;

    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let sessions_root = absolute(&cwd, &args.sessions_dir);

    let mut tools = match &args.bin_dir {
        Some(dir) => ToolPaths::in_dir(&absolute(&cwd, dir)),
        None => ToolPaths::from_path(),
    };
    if let Some(key_tool) = &args.key_tool {
        tools = tools.with_tonal_analyzer(resolve_program(&cwd, key_tool));
    }
    if let Some(rhythm_tool) = &args.rhythm_tool {
        tools = tools.with_rhythm_analyzer(resolve_program(&cwd, rhythm_tool));
    }

    let config = PipelineConfig::new(sessions_root)
        .with_tools(tools)
        .with_tool_timeout(args.timeout.map(Duration::from_secs));

    if let Some(limit) = config.tool_timeout {
        log::info!("Tool timeout: {:?}", limit);
    }

    let pipeline = Pipeline::new(config, ProcessInvoker::new());
    let run = pipeline.run(&url)?;

    log::info!("Track saved to: {:?}", run.artifacts.audio);
    log::info!("Report saved to: {:?}", run.artifacts.report);

    if !args.no_open {
        open_in_file_browser(pipeline.invoker(), run.session.work_dir());
    }

    Ok(())
}

/// Expand `~` and resolve against the current directory
fn absolute(cwd: &Path, path: &str) -> PathBuf {
    let expanded = shellexpand::tilde(path);
    cwd.join(expanded.as_ref())
}
