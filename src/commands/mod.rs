//! Command implementations
//!
//! Every command starts from the same inputs: a cluster file, its
//! templates, and the validated topology. [`Workspace::load`] gathers them.

pub mod boot;
pub mod compose;
pub mod diff;
pub mod plan;
pub mod render;
pub mod validate;

use anyhow::{Context, Result};
use bootstrap::{BootstrapPlan, Composer, ConfigTemplates};
use std::path::{Path, PathBuf};
use topology::{Role, TopologyPlan};

use crate::Context as AppContext;
use crate::config::{self, ClusterFile};

/// A loaded cluster file with its templates and topology
#[derive(Debug)]
pub struct Workspace {
    pub path: PathBuf,
    pub file: ClusterFile,
    pub templates: ConfigTemplates,
    pub topology: TopologyPlan,
}

impl Workspace {
    /// Load the cluster file selected on the command line
    pub fn load(ctx: &AppContext) -> Result<Self> {
        let path = match &ctx.config {
            Some(path) => config::expand_path(path),
            None => config::default_cluster_path()?,
        };
        Self::load_from(&path, ctx.templates.as_deref())
    }

    /// Load a specific cluster file
    pub fn load_from(path: &Path, templates_dir: Option<&Path>) -> Result<Self> {
        log::debug!("loading cluster file {}", path.display());
        let file = ClusterFile::load(path)?;
        let templates = file.load_templates(templates_dir)?;
        let topology = topology::plan(&file.cluster)
            .with_context(|| format!("Invalid cluster in {}", path.display()))?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
            templates,
            topology,
        })
    }

    pub fn composer(&self) -> Composer<'_> {
        Composer::new(&self.templates, self.file.bootstrap.clone())
    }

    /// Compose the plan for one role, failing when the topology has no
    /// group for it
    pub fn plan_for(&self, role: Role) -> Result<BootstrapPlan> {
        let group = self.topology.group(role).with_context(|| {
            let roles: Vec<&str> = self.topology.groups().iter().map(|g| g.role.name()).collect();
            format!(
                "Cluster '{}' has no {role} group (groups: {})",
                self.file.cluster.cluster_name,
                roles.join(", ")
            )
        })?;

        self.composer()
            .compose(group, &self.file.cluster)
            .with_context(|| format!("Failed to compose the {role} plan"))
    }

    /// Rendered user-data script for a role
    pub fn script_for(&self, role: Role) -> Result<String> {
        let plan = self.plan_for(role)?;
        Ok(bootstrap::script::render_with(
            &plan,
            &self.file.bootstrap.layout.package_manager,
        ))
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{CLUSTER, cluster_file};
    use super::*;

    #[test]
    fn test_load_workspace() {
        let (_tmp, path) = cluster_file(CLUSTER);
        let ws = Workspace::load_from(&path, None).unwrap();

        assert_eq!(ws.topology.groups().len(), 4);
        assert_eq!(ws.topology.total_capacity(), 9);
    }

    #[test]
    fn test_invalid_cluster_is_rejected_at_load() {
        let (_tmp, path) = cluster_file("[cluster.counts]\nmanager = 3\n");
        let err = Workspace::load_from(&path, None).unwrap_err();
        assert!(format!("{err:#}").contains("Invalid cluster"));
    }

    #[test]
    fn test_plan_for_missing_role() {
        let (_tmp, path) = cluster_file(CLUSTER);
        let ws = Workspace::load_from(&path, None).unwrap();

        let err = ws.plan_for(Role::Ml).unwrap_err();
        assert!(err.to_string().contains("no ml group"));
        assert!(ws.plan_for(Role::Client).is_ok());
    }

    #[test]
    fn test_script_for_role() {
        let (_tmp, path) = cluster_file(CLUSTER);
        let ws = Workspace::load_from(&path, None).unwrap();

        let script = ws.script_for(Role::Seed).unwrap();
        assert!(script.starts_with("#!/bin/bash"));
        assert!(script.contains("engine.download"));
    }
}
