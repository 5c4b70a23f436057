//! Topology planner - turns node counts into role groups
//!
//! Every multi-node cluster gets exactly one seed instance that the rest of
//! the cluster discovers against. The seed is carved out of the manager pool
//! when dedicated managers were requested, otherwise out of the data pool.

use log::{debug, warn};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::types::{
    ClusterSpec, DASHBOARDS_PORT, ListenerBinding, ListenerKind, Role, RoleGroup, SEARCH_PORT,
};

/// Load balancer port for search traffic when TLS terminates on the nodes.
const SECURE_LISTENER_PORT: u16 = 443;
/// Load balancer port for search traffic without the security plugin.
const PLAIN_LISTENER_PORT: u16 = 80;
/// Load balancer port for dashboards traffic.
const DASHBOARDS_LISTENER_PORT: u16 = 8443;

/// Planner output: role groups in launch order plus their routing.
///
/// Only [`plan`] builds one, so the seed group is always present and first.
/// Serialize-only for the same reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopologyPlan {
    groups: Vec<RoleGroup>,
    seed_role: Role,
    listeners: Vec<ListenerBinding>,
}

impl TopologyPlan {
    /// All role groups, ordered Single | Seed, Manager, Data, Client, Ml.
    pub fn groups(&self) -> &[RoleGroup] {
        &self.groups
    }

    /// Role of the group every other group waits on.
    pub fn seed_role(&self) -> Role {
        self.seed_role
    }

    /// The seed group (the single node in single-node mode).
    pub fn seed(&self) -> &RoleGroup {
        // plan() always emits the seed role first
        &self.groups[0]
    }

    /// Find the group for a role.
    pub fn group(&self, role: Role) -> Option<&RoleGroup> {
        self.groups.iter().find(|g| g.role == role)
    }

    /// Groups receiving client traffic.
    pub fn load_balancer_targets(&self) -> impl Iterator<Item = &RoleGroup> {
        self.groups.iter().filter(|g| g.is_load_balancer_target)
    }

    /// Listener bindings exposed to the load balancer.
    pub fn listeners(&self) -> &[ListenerBinding] {
        &self.listeners
    }

    /// Total number of instances across all groups.
    pub fn total_capacity(&self) -> u32 {
        self.groups.iter().map(|g| g.capacity).sum()
    }

    /// Launch order for the provisioning platform.
    ///
    /// The seed starts alone; every other group is held until the seed
    /// reports healthy and then starts in parallel with its siblings.
    pub fn launch_waves(&self) -> Vec<Vec<Role>> {
        let rest: Vec<Role> = self
            .groups
            .iter()
            .map(|g| g.role)
            .filter(|r| *r != self.seed_role)
            .collect();

        let mut waves = vec![vec![self.seed_role]];
        if !rest.is_empty() {
            waves.push(rest);
        }
        waves
    }
}

/// Reject specs that cannot be turned into a cluster.
///
/// Runs eagerly so that no deployment starts from an impossible shape.
pub fn validate(spec: &ClusterSpec) -> Result<()> {
    if spec.cluster_name.trim().is_empty() {
        return Err(Error::field("cluster_name must not be empty"));
    }

    if spec.single_node {
        return Ok(());
    }

    let counts = &spec.counts;
    if counts.is_empty() {
        return Err(Error::shape(
            "every node count is 0; set counts or enable single_node",
        ));
    }

    if counts.data == 0 {
        return Err(Error::shape(format!(
            "a multi-node cluster needs at least 1 data node (got manager={}, client={}, ml={})",
            counts.manager, counts.client, counts.ml
        )));
    }

    if counts.manager == 0 && counts.data == 1 && counts.client == 0 {
        return Err(Error::shape(
            "the only data node becomes the seed, leaving no node to receive client traffic; \
             add a data or client node",
        ));
    }

    Ok(())
}

/// Plan the role groups for a cluster.
///
/// Deterministic and side-effect free. Fails with
/// [`Error::InvalidSpec`] before anything is provisioned.
pub fn plan(spec: &ClusterSpec) -> Result<TopologyPlan> {
    validate(spec)?;

    if spec.single_node {
        debug!("single-node cluster, all roles on one instance");
        let mut single = RoleGroup::new(
            Role::Single,
            1,
            &spec.instances.data,
            spec.storage.data,
        );
        single.is_load_balancer_target = true;
        return Ok(TopologyPlan {
            listeners: listeners_for(spec, &[Role::Single]),
            groups: vec![single],
            seed_role: Role::Single,
        });
    }

    let counts = spec.counts;
    if counts.ingest > 0 {
        warn!(
            "ingest count {} ignored: ingest runs on data nodes",
            counts.ingest
        );
    }

    let mut groups = Vec::with_capacity(5);

    // Managers take precedence for seeding over data nodes
    let (manager_capacity, data_capacity) = if counts.manager > 0 {
        debug!("seed elected from manager pool");
        groups.push(RoleGroup::new(
            Role::Seed,
            1,
            &spec.instances.manager,
            spec.storage.manager,
        ));
        (counts.manager - 1, counts.data)
    } else {
        debug!("seed elected from data pool");
        groups.push(RoleGroup::new(
            Role::Seed,
            1,
            &spec.instances.data,
            spec.storage.data,
        ));
        (0, counts.data - 1)
    };

    if manager_capacity > 0 {
        groups.push(RoleGroup::new(
            Role::Manager,
            manager_capacity,
            &spec.instances.manager,
            spec.storage.manager,
        ));
    }

    if data_capacity > 0 {
        let mut data = RoleGroup::new(
            Role::Data,
            data_capacity,
            &spec.instances.data,
            spec.storage.data,
        );
        // Without client nodes, traffic goes straight to data nodes
        data.is_load_balancer_target = counts.client == 0;
        groups.push(data);
    }

    if counts.client > 0 {
        let mut client = RoleGroup::new(
            Role::Client,
            counts.client,
            &spec.instances.client,
            spec.storage.client,
        );
        client.is_load_balancer_target = true;
        groups.push(client);
    }

    if counts.ml > 0 {
        groups.push(RoleGroup::new(
            Role::Ml,
            counts.ml,
            &spec.instances.ml,
            spec.storage.ml,
        ));
    }

    let targets: Vec<Role> = groups
        .iter()
        .filter(|g| g.is_load_balancer_target)
        .map(|g| g.role)
        .collect();

    Ok(TopologyPlan {
        listeners: listeners_for(spec, &targets),
        groups,
        seed_role: Role::Seed,
    })
}

fn listeners_for(spec: &ClusterSpec, targets: &[Role]) -> Vec<ListenerBinding> {
    let search_port = if spec.security_disabled || spec.distribution.minimal {
        PLAIN_LISTENER_PORT
    } else {
        SECURE_LISTENER_PORT
    };

    let mut listeners = vec![ListenerBinding {
        kind: ListenerKind::Search,
        port: search_port,
        target_port: SEARCH_PORT,
        targets: targets.to_vec(),
    }];

    if spec.dashboards_enabled() {
        listeners.push(ListenerBinding {
            kind: ListenerKind::Dashboards,
            port: DASHBOARDS_LISTENER_PORT,
            target_port: DASHBOARDS_PORT,
            targets: targets.to_vec(),
        });
    }

    listeners
}
