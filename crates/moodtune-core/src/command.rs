//! Analyzer backed by an external analysis command.
//!
//! The command is invoked as `<program> [args...] <image_path> <actions>`,
//! where `<actions>` is a comma-separated list such as `emotion,age,gender,race`.
//! It must print either one JSON record or a JSON array of records on stdout.

use crate::analyzer::{AnalyzerError, FaceAnalyzer};
use crate::types::{Action, AnalysisOutput};
use std::path::Path;
use std::process::Command;

#[derive(Debug, Clone)]
pub struct CommandAnalyzer {
    program: String,
    args: Vec<String>,
}

impl CommandAnalyzer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self { program: program.into(), args }
    }

    /// Split a whitespace-separated command line into program and arguments.
    pub fn from_command_line(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace().map(str::to_owned);
        let program = parts.next()?;
        Some(Self::new(program, parts.collect()))
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl FaceAnalyzer for CommandAnalyzer {
    fn analyze(
        &mut self,
        image_path: &Path,
        actions: &[Action],
    ) -> Result<AnalysisOutput, AnalyzerError> {
        if !image_path.exists() {
            return Err(AnalyzerError::ImageNotFound(image_path.to_path_buf()));
        }
        let actions = actions.iter().map(Action::as_str).collect::<Vec<_>>().join(",");

        tracing::debug!(program = %self.program, args = ?self.args, %actions, "running analysis command");
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(image_path)
            .arg(&actions)
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::warn!(program = %self.program, status = %output.status, "analysis command failed");
            return Err(AnalyzerError::CommandFailed {
                status: output.status.to_string(),
                stderr,
            });
        }

        parse_output(&output.stdout)
    }
}

/// Parse analysis command output: a single JSON record or an array of them.
pub fn parse_output(stdout: &[u8]) -> Result<AnalysisOutput, AnalyzerError> {
    Ok(serde_json::from_slice(stdout)?)
}
