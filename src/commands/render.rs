//! Render command - write a role's user-data script

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use topology::Role;

use super::Workspace;
use crate::Context as AppContext;
use crate::config;
use crate::ui;

pub fn run(ctx: &AppContext, role: Role, output: Option<&Path>) -> Result<()> {
    let ws = Workspace::load(ctx)?;
    let script = ws.script_for(role)?;

    match output {
        Some(path) => {
            let path = config::expand_path(path);
            write_script(&path, &script)?;
            if !ctx.quiet {
                ui::success(&format!("Wrote {role} script to {}", path.display()));
            }
        }
        None => print!("{script}"),
    }

    Ok(())
}

fn write_script(path: &Path, script: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Could not create {}", parent.display()))?;
    }
    fs::write(path, script).with_context(|| format!("Could not write {}", path.display()))
}
