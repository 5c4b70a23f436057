//! Render bootstrap plans as bash user-data scripts.
//!
//! Each step runs in its own subshell with `set -e`. A failing fatal step
//! exits the script non-zero so the instance never signals healthy; a
//! failing non-fatal step prints a warning and the script continues.
//!
//! The subshell's status is checked on the following line. Bash ignores
//! `set -e` inside any command on the left of `||` or `&&`, so the subshell
//! must never be part of such a list.

use std::fmt::Write;

use crate::types::{BootstrapPlan, BootstrapStep, StepAction, WriteMode};

const PRELUDE: &str = r#"set -uo pipefail

fail() {
  echo "bootstrap: fatal step '$1' failed" >&2
  exit 1
}

warn() {
  echo "bootstrap: optional step '$1' failed, continuing" >&2
}
"#;

/// Quote a word for bash if it contains anything beyond a safe set.
pub fn quote(word: &str) -> String {
    let safe = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-./:=@%+,".contains(c));
    if safe {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

/// Shell command performing a single step, without failure handling.
pub fn step_command(step: &BootstrapStep, package_manager: &str) -> String {
    match &step.action {
        StepAction::PackageInstall { package } => {
            format!("{package_manager} {}", quote(package))
        }
        StepAction::WriteFile {
            path,
            content,
            mode,
        } => {
            let redirect = match mode {
                WriteMode::Overwrite => ">",
                WriteMode::Append => ">>",
            };
            format!("printf '%s' {} {redirect} {}", quote(content), quote(path))
        }
        StepAction::RunCommand { command, cwd } => match cwd {
            Some(dir) => format!("cd {}\n{command}", quote(dir)),
            None => command.clone(),
        },
    }
}

/// Render a full plan with the default package manager.
pub fn render(plan: &BootstrapPlan) -> String {
    render_with(plan, &crate::types::InstallLayout::default().package_manager)
}

/// Render a full plan.
pub fn render_with(plan: &BootstrapPlan, package_manager: &str) -> String {
    let mut out = String::new();
    let total = plan.len();

    let _ = writeln!(out, "#!/bin/bash");
    let _ = writeln!(out, "# bootstrap plan for role {} ({total} steps)", plan.role());
    out.push_str(PRELUDE);

    for (i, step) in plan.steps().iter().enumerate() {
        let handler = if step.fatal { "fail" } else { "warn" };
        let _ = writeln!(out);
        let _ = writeln!(out, "# [{}/{total}] {}: {}", i + 1, step.id, step.description);
        let _ = writeln!(out, "(");
        let _ = writeln!(out, "set -e");
        let _ = writeln!(out, "{}", step_command(step, package_manager));
        let _ = writeln!(out, ")");
        let _ = writeln!(out, "[ \"$?\" -eq 0 ] || {handler} {}", quote(&step.id));
    }

    out
}
