//! Validate command - check the cluster file, templates and every plan

use anyhow::{Context, Result};

use super::Workspace;
use crate::Context as AppContext;
use crate::ui;

pub fn run(ctx: &AppContext) -> Result<()> {
    let ws = Workspace::load(ctx)?;
    ws.file.cluster.validate()?;
    let plans = ws
        .composer()
        .compose_all(&ws.topology, &ws.file.cluster)
        .context("Templates do not cover every role group")?;

    if ctx.quiet {
        return Ok(());
    }

    ui::success(&format!(
        "{}: {} groups, {} instances",
        ws.path.display(),
        ws.topology.groups().len(),
        ws.topology.total_capacity()
    ));
    for plan in &plans {
        ui::dim(&format!("{:<12} {} steps", plan.role().name(), plan.len()));
    }

    for note in advisories(&ws) {
        ui::warn(&note);
    }
    Ok(())
}

/// Things that are valid but worth knowing about.
fn advisories(ws: &Workspace) -> Vec<String> {
    let spec = &ws.file.cluster;
    let mut notes = Vec::new();

    if !spec.single_node && spec.counts.ingest > 0 {
        notes.push(format!(
            "ingest count {} is ignored; ingest runs on data nodes",
            spec.counts.ingest
        ));
    }
    if !spec.distribution.is_public_artifact() {
        notes.push(format!(
            "non-public distribution; plugins are fetched from {}",
            spec.distribution.plugin_mirror
        ));
    }
    if spec.security_disabled {
        notes.push("security plugin is disabled; listeners use plain HTTP".to_string());
    }
    notes
}
