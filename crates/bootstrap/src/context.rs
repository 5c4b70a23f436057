//! Runner and progress traits for plan execution
//!
//! These traits let the executor run without depending on a specific
//! process-spawning implementation or UI.

use anyhow::Result;

use crate::types::BootstrapStep;

/// Output of a step command.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub success: bool,
    /// Exit code, if the process exited normally.
    pub code: Option<i32>,
}

impl From<std::process::Output> for CommandOutput {
    fn from(output: std::process::Output) -> Self {
        Self {
            stdout: output.stdout,
            stderr: output.stderr,
            success: output.status.success(),
            code: output.status.code(),
        }
    }
}

impl CommandOutput {
    /// Get stderr as a string
    pub fn stderr_str(&self) -> String {
        String::from_utf8_lossy(&self.stderr).to_string()
    }

    /// One-line failure summary: exit code and the last stderr line.
    pub fn failure_summary(&self) -> String {
        let status = match self.code {
            Some(code) => format!("exit status {code}"),
            None => "terminated by signal".to_string(),
        };
        let stderr = self.stderr_str();
        match stderr.lines().rev().find(|l| !l.trim().is_empty()) {
            Some(line) => format!("{status}: {}", line.trim()),
            None => status,
        }
    }
}

/// Runs the shell command of a step on the current machine.
///
/// Implement this trait to execute steps; the executor decides what a
/// failure means.
pub trait StepRunner {
    /// Run `command` for `step`.
    ///
    /// Return `Err` only when the command could not be started at all; a
    /// command that ran and failed is reported through
    /// [`CommandOutput::success`].
    fn run(&self, step: &BootstrapStep, command: &str) -> Result<CommandOutput>;
}

/// Progress callback for plan execution
pub trait ProgressCallback {
    /// Called before a step runs.
    fn on_step_start(&mut self, index: usize, total: usize, step: &BootstrapStep);

    /// Called after a step ran, with whether it succeeded.
    fn on_step_complete(&mut self, step: &BootstrapStep, success: bool);
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_step_start(&mut self, _index: usize, _total: usize, _step: &BootstrapStep) {}
    fn on_step_complete(&mut self, _step: &BootstrapStep, _success: bool) {}
}
