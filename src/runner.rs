use anyhow::{Context, Result};
use bootstrap::{BootstrapStep, CommandOutput, StepRunner};
use std::process::{Command, Stdio};

/// Runs step commands through `bash -c` on this machine
pub struct ShellRunner {
    shell: String,
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self {
            shell: "bash".to_string(),
        }
    }
}

impl ShellRunner {
    /// Use a different shell binary
    #[cfg(test)]
    pub fn with_shell(shell: &str) -> Self {
        Self {
            shell: shell.to_string(),
        }
    }
}

impl StepRunner for ShellRunner {
    fn run(&self, step: &BootstrapStep, command: &str) -> Result<CommandOutput> {
        // Same strictness the rendered script gives each step
        let script = format!("set -e\n{command}");
        let output = Command::new(&self.shell)
            .args(["-c", &script])
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("Failed to execute step {} with {}", step.id, self.shell))?;

        Ok(CommandOutput::from(output))
    }
}

/// Check if a command exists
pub fn command_exists(cmd: &str) -> bool {
    Command::new("which")
        .arg(cmd)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bootstrap::{Criticality, StepAction};

    fn step() -> BootstrapStep {
        BootstrapStep {
            id: "test.step".to_string(),
            description: "test".to_string(),
            action: StepAction::RunCommand {
                command: "true".to_string(),
                cwd: None,
            },
            criticality: Criticality::Optional,
            fatal: false,
        }
    }

    #[test]
    fn test_shell_runner_success() {
        if !command_exists("bash") {
            return;
        }
        let output = ShellRunner::default().run(&step(), "echo hello").unwrap();
        assert!(output.success);
        assert_eq!(String::from_utf8_lossy(&output.stdout), "hello\n");
    }

    #[test]
    fn test_shell_runner_stops_at_first_failure() {
        if !command_exists("bash") {
            return;
        }
        let output = ShellRunner::default()
            .run(&step(), "echo oops >&2\nfalse\necho unreachable")
            .unwrap();
        assert!(!output.success);
        assert_eq!(output.code, Some(1));
        assert!(output.stdout.is_empty());
        assert_eq!(output.failure_summary(), "exit status 1: oops");
    }

    #[test]
    fn test_missing_shell_is_runner_error() {
        let runner = ShellRunner::with_shell("/nonexistent/shell");
        assert!(runner.run(&step(), "true").is_err());
    }
}
