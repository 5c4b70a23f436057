//! Diff command - compare a role's script across two cluster files

use anyhow::Result;
use colored::Colorize;
use similar::{ChangeTag, TextDiff};
use std::path::Path;
use topology::Role;

use super::Workspace;
use crate::Context as AppContext;
use crate::config;
use crate::ui;

pub fn run(ctx: &AppContext, other: &Path, role: Role) -> Result<()> {
    let ours = Workspace::load(ctx)?;
    let theirs = Workspace::load_from(&config::expand_path(other), ctx.templates.as_deref())?;

    let before = script_or_empty(&ours, role)?;
    let after = script_or_empty(&theirs, role)?;

    ui::header(&format!("{role} script"));
    ui::kv("from", &ours.path.display().to_string());
    ui::kv("to", &theirs.path.display().to_string());
    println!();

    if !print_diff(&before, &after) {
        ui::success("Scripts are identical; instances need no replacement");
    }
    Ok(())
}

/// A role missing from one side diffs against an empty script.
fn script_or_empty(ws: &Workspace, role: Role) -> Result<String> {
    if ws.topology.group(role).is_none() {
        ui::warn(&format!("{} has no {role} group", ws.path.display()));
        return Ok(String::new());
    }
    ws.script_for(role)
}

/// Print a unified diff, returning whether anything changed.
fn print_diff(before: &str, after: &str) -> bool {
    let diff = TextDiff::from_lines(before, after);
    let mut has_changes = false;

    for (i, group) in diff.grouped_ops(3).iter().enumerate() {
        if i > 0 {
            println!("{}", "...".dimmed());
        }
        for op in group {
            for change in diff.iter_changes(op) {
                match change.tag() {
                    ChangeTag::Delete => {
                        has_changes = true;
                        print!("{}", format!("- {change}").red());
                    }
                    ChangeTag::Insert => {
                        has_changes = true;
                        print!("{}", format!("+ {change}").green());
                    }
                    ChangeTag::Equal => print!("{}", format!("  {change}").dimmed()),
                }
                if change.missing_newline() {
                    println!();
                }
            }
        }
    }

    has_changes
}
