use bootstrap::BootstrapStep;
use colored::{ColoredString, Colorize};
use topology::RoleGroup;

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a section header
pub fn section(title: &str) {
    println!();
    println!("{}", title.cyan().bold());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Print a step indicator
pub fn step(num: usize, total: usize, msg: &str) {
    println!("{} {}", format!("[{num}/{total}]").blue().bold(), msg);
}

// ============================================================================
// Cluster Formatting
// ============================================================================

/// Criticality label of a step
pub fn criticality(step: &BootstrapStep) -> ColoredString {
    if step.fatal {
        "fatal".red()
    } else {
        "optional".yellow()
    }
}

/// Outcome mark of a finished step; a failed optional step only warns
pub fn outcome(step: &BootstrapStep, success: bool) -> ColoredString {
    if success {
        "✓".green()
    } else if step.fatal {
        "✗".red()
    } else {
        "⚠".yellow()
    }
}

/// One-line summary of a role group, e.g. `data × 4 (r5.large, 100 GiB)`
pub fn group_summary(group: &RoleGroup) -> String {
    format!(
        "{} × {} ({}, {} GiB)",
        group.role.name(),
        group.capacity,
        group.instance_profile,
        group.storage_gib
    )
}

/// Short form of a content digest for display
pub fn short_digest(digest: &str) -> &str {
    digest.get(..12).unwrap_or(digest)
}
