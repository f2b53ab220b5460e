//! Pipeline configuration

use crate::tools::ToolPaths;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory holding one sub-directory per session
    pub sessions_root: PathBuf,

    /// External executables
    pub tools: ToolPaths,

    /// Maximum run time of any single tool (None = wait indefinitely)
    pub tool_timeout: Option<Duration>,
}

impl PipelineConfig {
    /// Create a configuration with tools looked up on PATH and no timeout
    pub fn new(sessions_root: PathBuf) -> Self {
        Self {
            sessions_root,
            tools: ToolPaths::from_path(),
            tool_timeout: None,
        }
    }

    /// Set tool locations
    pub fn with_tools(mut self, tools: ToolPaths) -> Self {
        self.tools = tools;
        self
    }

    /// Set the per-tool timeout
    pub fn with_tool_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.tool_timeout = timeout;
        self
    }
}
