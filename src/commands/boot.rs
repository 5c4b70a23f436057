//! Boot command - run a role's bootstrap plan on this machine
//!
//! Meant for user-data or manual recovery: the rendered script does the same
//! thing, this path adds progress output and a step summary.

use anyhow::{Context, Result};
use bootstrap::{BootstrapPlan, ExecuteOptions, ExecuteSummary, FailurePolicy};
use colored::Colorize;
use topology::Role;

use super::Workspace;
use crate::Context as AppContext;
use crate::progress::StepProgress;
use crate::runner::{self, ShellRunner};
use crate::ui;

pub fn run(ctx: &AppContext, role: Role, dry_run: bool, yes: bool) -> Result<()> {
    let ws = Workspace::load(ctx)?;
    let plan = ws.plan_for(role)?;
    let policy = ws.file.bootstrap.failure_policy;

    ui::header(&format!("Boot {role} node of {}", ws.file.cluster.cluster_name));
    println!(
        "  {} steps, {} fatal, policy {}",
        plan.len().to_string().bold(),
        plan.steps().iter().filter(|s| s.fatal).count().to_string().red(),
        policy_name(policy)
    );
    println!();

    let opts = ExecuteOptions {
        dry_run,
        package_manager: ws.file.bootstrap.layout.package_manager.clone(),
    };

    if dry_run {
        list_steps(&plan);
        let summary = bootstrap::execute(
            &plan,
            &opts,
            &ShellRunner::default(),
            &mut bootstrap::NoProgress,
        )?;
        ui::info(&format!("Dry run: {} steps would run", summary.skipped));
        return Ok(());
    }

    if !runner::command_exists("bash") {
        anyhow::bail!("bash is required to run bootstrap steps");
    }

    if !yes {
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(format!("Run {} steps on this machine?", plan.len()))
            .default(false)
            .interact()
            .context("Failed to read confirmation")?;

        if !confirmed {
            ui::info("Aborted");
            return Ok(());
        }
    }

    let mut progress = StepProgress::new(ctx.quiet);
    let result = bootstrap::execute(&plan, &opts, &ShellRunner::default(), &mut progress);
    progress.finish();

    let summary = result.with_context(|| {
        format!("Bootstrap of the {role} node failed; replace the instance rather than patching it")
    })?;
    report(&summary);
    Ok(())
}

fn policy_name(policy: FailurePolicy) -> &'static str {
    match policy {
        FailurePolicy::Strict => "strict",
        FailurePolicy::Lenient => "lenient",
    }
}

fn list_steps(plan: &BootstrapPlan) {
    for (i, step) in plan.steps().iter().enumerate() {
        ui::step(i + 1, plan.len(), &format!("{} {}", step.id, step.description));
    }
    println!();
}

fn report(summary: &ExecuteSummary) {
    if summary.is_clean() {
        ui::success(&format!("All {} steps completed", summary.completed));
        return;
    }

    ui::warn(&format!(
        "{} steps completed, {} optional steps failed",
        summary.completed,
        summary.warnings.len()
    ));
    for warning in &summary.warnings {
        ui::dim(&warning.to_string());
    }
}
