//! Deployment manifest handed to the provisioning platform.
//!
//! One document per cluster: every role group with its bootstrap plan and
//! script digest, the load-balancer listeners, and the launch order.

use anyhow::{Context, Result};
use bootstrap::{BootstrapPlan, Composer};
use serde::Serialize;
use topology::{ClusterSpec, ListenerBinding, Role, RoleGroup, TopologyPlan};

#[derive(Debug, Serialize)]
pub struct DeploymentManifest {
    pub cluster_name: String,
    pub seed_role: Role,
    pub groups: Vec<GroupManifest>,
    pub listeners: Vec<ListenerBinding>,
    pub launch_waves: Vec<Vec<Role>>,
}

#[derive(Debug, Serialize)]
pub struct GroupManifest {
    #[serde(flatten)]
    pub group: RoleGroup,
    /// blake3 digest of the rendered user-data script
    pub digest: String,
    pub plan: BootstrapPlan,
}

impl DeploymentManifest {
    /// Compose every group of `topology` into a manifest.
    pub fn build(
        topology: &TopologyPlan,
        spec: &ClusterSpec,
        composer: &Composer<'_>,
    ) -> Result<Self> {
        let plans = composer
            .compose_all(topology, spec)
            .context("Failed to compose bootstrap plans")?;

        let groups = topology
            .groups()
            .iter()
            .zip(plans)
            .map(|(group, plan)| GroupManifest {
                group: group.clone(),
                digest: plan.digest(),
                plan,
            })
            .collect();

        Ok(Self {
            cluster_name: spec.cluster_name.clone(),
            seed_role: topology.seed_role(),
            groups,
            listeners: topology.listeners().to_vec(),
            launch_waves: topology.launch_waves(),
        })
    }

    /// Only keep the group for `role`.
    pub fn retain_role(&mut self, role: Role) {
        self.groups.retain(|g| g.group.role == role);
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize manifest")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bootstrap::{ComposeOptions, ConfigTemplates};
    use topology::NodeCounts;

    fn manifest() -> DeploymentManifest {
        let spec = ClusterSpec::with_counts(NodeCounts {
            manager: 3,
            data: 4,
            client: 2,
            ..NodeCounts::default()
        });
        let topology = topology::plan(&spec).unwrap();
        let templates = ConfigTemplates::builtin().unwrap();
        let composer = Composer::new(&templates, ComposeOptions::default());
        DeploymentManifest::build(&topology, &spec, &composer).unwrap()
    }

    #[test]
    fn test_manifest_covers_every_group() {
        let manifest = manifest();
        let roles: Vec<Role> = manifest.groups.iter().map(|g| g.group.role).collect();
        assert_eq!(roles, vec![Role::Seed, Role::Manager, Role::Data, Role::Client]);
        assert_eq!(manifest.seed_role, Role::Seed);
        assert_eq!(manifest.launch_waves[0], vec![Role::Seed]);

        for group in &manifest.groups {
            assert_eq!(group.plan.role(), group.group.role);
            assert_eq!(group.digest, group.plan.digest());
        }
    }

    #[test]
    fn test_manifest_json_shape() {
        let json: serde_json::Value = serde_json::from_str(&manifest().to_json().unwrap()).unwrap();
        let seed = &json["groups"][0];
        assert_eq!(seed["role"], "seed");
        assert_eq!(seed["capacity"], 1);
        assert_eq!(seed["digest"].as_str().unwrap().len(), 64);
        assert!(seed["plan"]["steps"].as_array().unwrap().len() > 1);
        assert_eq!(json["listeners"][0]["target_port"], 9200);
    }

    #[test]
    fn test_retain_role() {
        let mut manifest = manifest();
        manifest.retain_role(Role::Client);
        assert_eq!(manifest.groups.len(), 1);
        assert!(manifest.groups[0].group.is_load_balancer_target);
    }
}
