//! Analyzer trait definitions

use crate::error::{Error, Result};
use crate::fields::ParseError;
use crate::tools::{Invocation, ToolError, ToolInvoker};
use std::fmt::Debug;
use std::path::Path;
use std::time::Duration;

/// An external analyzer with a fixed stdout layout
///
/// Implementations describe how to call the tool and how to read it; the
/// invocation itself goes through a [`ToolInvoker`].
pub trait Analyzer: Sync {
    /// Typed result parsed from stdout
    type Reading: Debug + Send;

    /// Build the call against `clip_name` (relative to the session directory)
    fn invocation(&self, clip_name: &str) -> Invocation;

    /// Parse and validate the tool's stdout
    fn parse(&self, stdout: &str) -> std::result::Result<Self::Reading, ParseError>;

    /// Wrap a launch, exit or timeout failure in this analyzer's error
    fn failure(&self, error: ToolError) -> Error;
}

/// Run one analyzer to completion and parse what it printed
pub fn run_analyzer<A, I>(
    analyzer: &A,
    invoker: &I,
    work_dir: &Path,
    clip_name: &str,
    timeout: Option<Duration>,
) -> Result<A::Reading>
where
    A: Analyzer + ?Sized,
    I: ToolInvoker + ?Sized,
{
    let invocation = analyzer
        .invocation(clip_name)
        .in_dir(work_dir)
        .captured()
        .with_timeout(timeout);
    let tool = invocation.tool_name();

    let output = invoker
        .invoke(&invocation)
        .and_then(|out| out.ensure_success(&tool))
        .map_err(|e| analyzer.failure(e))?;

    let reading = analyzer.parse(&output.stdout)?;
    log::debug!("{} reading: {:?}", tool, reading);
    Ok(reading)
}
