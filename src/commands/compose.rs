//! Compose command - show bootstrap steps or emit the deployment manifest

use anyhow::Result;
use bootstrap::BootstrapStep;
use colored::Colorize;
use topology::Role;

use super::Workspace;
use crate::Context as AppContext;
use crate::manifest::DeploymentManifest;
use crate::ui;

pub fn run(ctx: &AppContext, role: Option<Role>, json: bool) -> Result<()> {
    let ws = Workspace::load(ctx)?;

    if let Some(role) = role {
        // Surface a friendly error for roles the topology lacks
        ws.plan_for(role)?;
    }

    let composer = ws.composer();
    let mut manifest = DeploymentManifest::build(&ws.topology, &ws.file.cluster, &composer)?;
    if let Some(role) = role {
        manifest.retain_role(role);
    }

    if json {
        println!("{}", manifest.to_json()?);
        return Ok(());
    }

    for entry in &manifest.groups {
        let group = &entry.group;
        ui::header(&ui::group_summary(group));
        ui::kv("digest", ui::short_digest(&entry.digest));

        let steps = entry.plan.steps();
        for (i, step) in steps.iter().enumerate() {
            ui::step(i + 1, steps.len(), &describe_step(step));
        }
    }

    Ok(())
}

fn describe_step(step: &BootstrapStep) -> String {
    format!(
        "{} {} {}{} {}{}",
        step.id.bold(),
        step.description,
        "[".dimmed(),
        step.kind().to_string().dimmed(),
        ui::criticality(step),
        "]".dimmed()
    )
}
