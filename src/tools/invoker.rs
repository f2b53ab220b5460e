//! Blocking child-process invocation

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// How often a child with a deadline is polled for exit
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Runs one external tool to completion - allows swapping the real process
/// runner for a scripted one in tests
pub trait ToolInvoker {
    /// Run the invocation and block until the child has terminated
    ///
    /// A non-zero exit is not an error at this level; callers decide via
    /// [`ToolOutput::ensure_success`].
    fn invoke(&self, invocation: &Invocation) -> Result<ToolOutput, ToolError>;
}

impl<T: ToolInvoker + ?Sized> ToolInvoker for &T {
    fn invoke(&self, invocation: &Invocation) -> Result<ToolOutput, ToolError> {
        (**self).invoke(invocation)
    }
}

/// One external tool call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Executable path or bare name looked up on PATH
    pub program: PathBuf,

    pub args: Vec<String>,

    /// Child working directory (inherits ours when None)
    pub working_dir: Option<PathBuf>,

    /// Capture stdout/stderr instead of inheriting the terminal
    pub capture: bool,

    /// Maximum run time; None waits indefinitely
    pub timeout: Option<Duration>,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
            capture: false,
            timeout: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn in_dir(mut self, dir: &Path) -> Self {
        self.working_dir = Some(dir.to_path_buf());
        self
    }

    pub fn captured(mut self) -> Self {
        self.capture = true;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Short program name for log lines and errors
    pub fn tool_name(&self) -> String {
        self.program
            .file_stem()
            .unwrap_or(self.program.as_os_str())
            .to_string_lossy()
            .into_owned()
    }
}

/// Exit status and captured streams of a finished tool
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code; None when the child was terminated by a signal
    pub code: Option<i32>,

    pub stdout: String,

    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Turn a non-zero exit into [`ToolError::Exit`]
    pub fn ensure_success(self, tool: &str) -> Result<Self, ToolError> {
        if self.success() {
            Ok(self)
        } else {
            Err(ToolError::Exit {
                tool: tool.to_string(),
                code: self.code,
                stderr: self.stderr.trim().to_string(),
            })
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Failed to run {tool}: {source}")]
    Launch {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exited with status {}{}", display_code(.code), display_stderr(.stderr))]
    Exit {
        tool: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("{tool} did not finish within {limit:?}")]
    TimedOut { tool: String, limit: Duration },

    #[error("I/O error while running {tool}: {source}")]
    Io {
        tool: String,
        #[source]
        source: std::io::Error,
    },
}

fn display_code(code: &Option<i32>) -> String {
    code.map_or_else(|| "signal".to_string(), |c| c.to_string())
}

fn display_stderr(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {}", stderr)
    }
}

/// Invoker backed by `std::process`
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessInvoker;

impl ProcessInvoker {
    pub fn new() -> Self {
        Self
    }
}

impl ToolInvoker for ProcessInvoker {
    fn invoke(&self, invocation: &Invocation) -> Result<ToolOutput, ToolError> {
        let tool = invocation.tool_name();
        log::debug!(
            "Running {:?} {:?} (cwd: {:?})",
            invocation.program,
            invocation.args,
            invocation.working_dir
        );

        let mut command = Command::new(&invocation.program);
        command.args(&invocation.args).stdin(Stdio::null());
        if let Some(dir) = &invocation.working_dir {
            command.current_dir(dir);
        }
        if invocation.capture {
            command.stdout(Stdio::piped()).stderr(Stdio::piped());
        }

        let mut child = command.spawn().map_err(|source| ToolError::Launch {
            tool: tool.clone(),
            source,
        })?;

        // Drain both pipes while waiting so a chatty child cannot block on a full pipe
        let stdout_reader = child.stdout.take().map(spawn_reader);
        let stderr_reader = child.stderr.take().map(spawn_reader);

        let status = match invocation.timeout {
            Some(limit) => wait_with_deadline(&mut child, limit, &tool)?,
            None => child.wait().map_err(|source| ToolError::Io {
                tool: tool.clone(),
                source,
            })?,
        };

        let stdout = collect_reader(stdout_reader, &tool)?;
        let stderr = collect_reader(stderr_reader, &tool)?;

        log::debug!("{} finished with {}", tool, status);

        Ok(ToolOutput {
            code: status.code(),
            stdout,
            stderr,
        })
    }
}

fn spawn_reader<R: Read + Send + 'static>(mut stream: R) -> JoinHandle<std::io::Result<Vec<u8>>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf)?;
        Ok(buf)
    })
}

fn collect_reader(
    reader: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
    tool: &str,
) -> Result<String, ToolError> {
    let Some(handle) = reader else {
        return Ok(String::new());
    };

    let bytes = handle
        .join()
        .map_err(|_| ToolError::Io {
            tool: tool.to_string(),
            source: std::io::Error::other("output reader thread panicked"),
        })?
        .map_err(|source| ToolError::Io {
            tool: tool.to_string(),
            source,
        })?;

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn wait_with_deadline(child: &mut Child, limit: Duration, tool: &str) -> Result<ExitStatus, ToolError> {
    let deadline = Instant::now() + limit;
    loop {
        let polled = child.try_wait().map_err(|source| ToolError::Io {
            tool: tool.to_string(),
            source,
        })?;
        if let Some(status) = polled {
            return Ok(status);
        }

        if Instant::now() >= deadline {
            if let Err(e) = child.kill() {
                log::warn!("Failed to kill {} after timeout: {}", tool, e);
            }
            // Reap so the pipe readers see EOF
            let _ = child.wait();
            return Err(ToolError::TimedOut {
                tool: tool.to_string(),
                limit,
            });
        }

        thread::sleep(POLL_INTERVAL);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_builder() {
        let inv = Invocation::new("/opt/tools/ffprobe")
            .arg("-v")
            .args(["error", "ref.mp3"])
            .in_dir(Path::new("/tmp/session"))
            .captured()
            .with_timeout(Some(Duration::from_secs(5)));

        assert_eq!(inv.args, vec!["-v", "error", "ref.mp3"]);
        assert_eq!(inv.working_dir, Some(PathBuf::from("/tmp/session")));
        assert!(inv.capture);
        assert_eq!(inv.timeout, Some(Duration::from_secs(5)));
        assert_eq!(inv.tool_name(), "ffprobe");
    }

    #[test]
    fn test_tool_name_strips_exe_suffix() {
        assert_eq!(Invocation::new("bin/key.exe").tool_name(), "key");
        assert_eq!(Invocation::new("yt-dlp").tool_name(), "yt-dlp");
    }

    #[test]
    fn test_ensure_success() {
        let ok = ToolOutput {
            code: Some(0),
            stdout: "out".to_string(),
            stderr: String::new(),
        };
        assert_eq!(ok.clone().ensure_success("key").unwrap(), ok);

        let failed = ToolOutput {
            code: Some(3),
            stdout: String::new(),
            stderr: "  bad input\n".to_string(),
        };
        match failed.ensure_success("key") {
            Err(ToolError::Exit { tool, code, stderr }) => {
                assert_eq!(tool, "key");
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "bad input");
            }
            other => panic!("expected exit error, got {:?}", other),
        }
    }

    #[test]
    fn test_signal_exit_is_failure() {
        let killed = ToolOutput {
            code: None,
            ..Default::default()
        };
        let err = killed.ensure_success("rhythm").unwrap_err();
        assert_eq!(err.to_string(), "rhythm exited with status signal");
    }

    #[test]
    fn test_missing_program_is_launch_error() {
        let inv = Invocation::new("/nonexistent/tool-that-does-not-exist").captured();
        let result = ProcessInvoker::new().invoke(&inv);
        assert!(matches!(result, Err(ToolError::Launch { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_captures_stdout_and_exit_code() {
        let inv = Invocation::new("sh")
            .args(["-c", "printf 'Key: A min\\n'; echo oops >&2; exit 2"])
            .captured();
        let output = ProcessInvoker::new().invoke(&inv).unwrap();

        assert_eq!(output.code, Some(2));
        assert_eq!(output.stdout, "Key: A min\n");
        assert_eq!(output.stderr, "oops\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_kills_child() {
        let inv = Invocation::new("sh")
            .args(["-c", "exec sleep 5"])
            .captured()
            .with_timeout(Some(Duration::from_millis(100)));

        let started = Instant::now();
        let result = ProcessInvoker::new().invoke(&inv);

        assert!(matches!(result, Err(ToolError::TimedOut { .. })));
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
