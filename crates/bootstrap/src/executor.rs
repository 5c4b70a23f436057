//! Plan executor - runs a bootstrap plan step by step on an instance
//!
//! Steps run strictly in order. The first failing fatal step aborts the
//! run with [`Error::FatalStep`]; the instance must then be replaced, not
//! patched. Failing non-fatal steps are logged and collected as warnings.

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::context::{ProgressCallback, StepRunner};
use crate::error::{Error, Result, StepWarning};
use crate::script::step_command;
use crate::types::{BootstrapPlan, InstallLayout};

/// Options for execution
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Don't run anything, just report what would run
    pub dry_run: bool,
    /// Command prefix used for package installs
    pub package_manager: String,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            package_manager: InstallLayout::default().package_manager,
        }
    }
}

/// Summary of execution results
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecuteSummary {
    /// Steps that ran successfully
    pub completed: usize,
    /// Steps not run (dry run)
    pub skipped: usize,
    /// Non-fatal steps that failed
    pub warnings: Vec<StepWarning>,
}

impl ExecuteSummary {
    /// Total number of steps processed
    pub fn total(&self) -> usize {
        self.completed + self.skipped + self.warnings.len()
    }

    /// Whether every step that ran succeeded
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Execute a plan with the given runner and progress callback
pub fn execute<R, P>(
    plan: &BootstrapPlan,
    opts: &ExecuteOptions,
    runner: &R,
    progress: &mut P,
) -> Result<ExecuteSummary>
where
    R: StepRunner + ?Sized,
    P: ProgressCallback,
{
    let mut summary = ExecuteSummary::default();
    let total = plan.len();

    if opts.dry_run {
        summary.skipped = total;
        return Ok(summary);
    }

    for (index, step) in plan.steps().iter().enumerate() {
        progress.on_step_start(index, total, step);
        info!("[{}/{total}] {}: {}", index + 1, step.id, step.description);

        let command = step_command(step, &opts.package_manager);
        let output = runner.run(step, &command).map_err(|source| Error::Runner {
            step: step.id.clone(),
            source,
        })?;

        progress.on_step_complete(step, output.success);

        if output.success {
            summary.completed += 1;
            continue;
        }

        let message = output.failure_summary();
        if step.fatal {
            return Err(Error::FatalStep {
                step: step.id.clone(),
                message,
            });
        }

        warn!("optional step '{}' failed: {message}", step.id);
        summary.warnings.push(StepWarning {
            step: step.id.clone(),
            message,
        });
    }

    Ok(summary)
}
