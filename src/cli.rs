use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use topology::Role;

#[derive(Parser)]
#[command(name = "searchform")]
#[command(version)]
#[command(about = "Plan search-engine clusters and compose node bootstrap scripts", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Cluster file (default: ~/.config/searchform/cluster.toml)
    #[arg(long, global = true, env = "SEARCHFORM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Template directory (overrides the cluster file's `templates`)
    #[arg(long, global = true)]
    pub templates: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Validate the cluster and print role groups, listeners and launch waves
    Plan {
        /// Print the topology as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print bootstrap steps for one or all role groups
    Compose {
        /// Only this role (seed, manager, data, client, ml, single-node)
        #[arg(long, value_parser = parse_role)]
        role: Option<Role>,

        /// Emit the full deployment manifest as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write the user-data script for a role
    Render {
        #[arg(long, value_parser = parse_role)]
        role: Role,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Diff a role's script against another cluster file
    Diff {
        /// Cluster file to compare against
        other: PathBuf,

        #[arg(long, value_parser = parse_role)]
        role: Role,
    },

    /// Validate the cluster file and templates
    Validate,

    /// Run a role's bootstrap plan on this machine
    Boot {
        #[arg(long, value_parser = parse_role)]
        role: Role,

        /// Show what would run without running it
        #[arg(long)]
        dry_run: bool,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn parse_role(s: &str) -> Result<Role, String> {
    s.parse()
}
