//! Plan command - show the role groups a cluster file turns into

use anyhow::{Context, Result};
use colored::Colorize;
use topology::{ListenerBinding, Role, TopologyPlan};

use super::Workspace;
use crate::Context as AppContext;
use crate::ui;

pub fn run(ctx: &AppContext, json: bool) -> Result<()> {
    let ws = Workspace::load(ctx)?;

    if json {
        let out =
            serde_json::to_string_pretty(&ws.topology).context("Failed to serialize topology")?;
        println!("{out}");
        return Ok(());
    }

    ui::header(&format!("Cluster {}", ws.file.cluster.cluster_name));
    ui::kv("file", &ws.path.display().to_string());
    ui::kv("instances", &ws.topology.total_capacity().to_string());

    print_topology(&ws.topology);
    Ok(())
}

pub(crate) fn print_topology(topology: &TopologyPlan) {
    ui::section("Role groups");
    for group in topology.groups() {
        let target = if group.is_load_balancer_target {
            " load-balanced".green().to_string()
        } else {
            String::new()
        };
        println!(
            "  {:<12} {:>3} × {:<12} {:>5} GiB{target}",
            group.role.name().bold(),
            group.capacity,
            group.instance_profile,
            group.storage_gib,
        );
    }

    ui::section("Listeners");
    for listener in topology.listeners() {
        println!("  {}", describe_listener(listener));
    }

    ui::section("Launch waves");
    for (i, wave) in topology.launch_waves().iter().enumerate() {
        println!("  {}. {}", i + 1, join_roles(wave));
    }
}

fn describe_listener(listener: &ListenerBinding) -> String {
    format!(
        "{:<10} :{} → {} ({})",
        listener.kind.to_string(),
        listener.port,
        listener.target_port,
        join_roles(&listener.targets)
    )
}

fn join_roles(roles: &[Role]) -> String {
    roles.iter().map(Role::name).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use topology::{ListenerKind, SEARCH_PORT};

    #[test]
    fn test_describe_listener() {
        let listener = ListenerBinding {
            kind: ListenerKind::Search,
            port: 443,
            target_port: SEARCH_PORT,
            targets: vec![Role::Client],
        };
        assert_eq!(describe_listener(&listener), "search     :443 → 9200 (client)");
    }

    #[test]
    fn test_join_roles() {
        assert_eq!(join_roles(&[Role::Manager, Role::Data]), "manager, data");
        assert_eq!(join_roles(&[]), "");
    }
}
