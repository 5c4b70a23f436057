//! Core types for cluster topology planning.
//!
//! [`ClusterSpec`] is the immutable input describing the requested cluster.
//! [`RoleGroup`] is the planner's output unit: a set of identically
//! configured instances sharing a role, a capacity and an instance profile.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Host serving the canonical public distribution artifacts.
pub const PUBLIC_ARTIFACT_HOST: &str = "artifacts.opensearch.org";

/// Default mirror for version-pinned plugin builds.
pub const DEFAULT_PLUGIN_MIRROR: &str =
    "https://ci.opensearch.org/ci/dbc/distribution-build-opensearch";

/// Port the engine listens on for search traffic.
pub const SEARCH_PORT: u16 = 9200;

/// Port the dashboards companion listens on.
pub const DASHBOARDS_PORT: u16 = 5601;

// ============================================================================
// Roles
// ============================================================================

/// Operational role a group of nodes plays.
///
/// Variants are declared in emission order, so sorting groups by role
/// yields the planner's output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    /// Sole node of a single-node cluster, absorbing every other role.
    Single,
    /// The one instance every other node discovers against.
    Seed,
    /// Dedicated cluster-manager nodes.
    Manager,
    /// Data nodes.
    Data,
    /// Coordinating-only nodes that front client traffic.
    Client,
    /// Machine-learning nodes.
    Ml,
}

impl Role {
    /// Stable identifier used in file names, step ids and the CLI.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Single => "single-node",
            Self::Seed => "seed",
            Self::Manager => "manager",
            Self::Data => "data",
            Self::Client => "client",
            Self::Ml => "ml",
        }
    }

    /// All roles in emission order.
    #[must_use]
    pub fn all() -> &'static [Role] {
        &[
            Role::Single,
            Role::Seed,
            Role::Manager,
            Role::Data,
            Role::Client,
            Role::Ml,
        ]
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "single" | "single-node" => Ok(Self::Single),
            "seed" => Ok(Self::Seed),
            "manager" | "cluster-manager" => Ok(Self::Manager),
            "data" => Ok(Self::Data),
            "client" => Ok(Self::Client),
            "ml" => Ok(Self::Ml),
            other => Err(format!(
                "unknown role '{other}' (expected one of: single-node, seed, manager, data, client, ml)"
            )),
        }
    }
}

// ============================================================================
// Cluster spec
// ============================================================================

/// Requested node count per class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeCounts {
    pub manager: u32,
    pub data: u32,
    /// Accepted for compatibility; no ingest role is provisioned.
    pub ingest: u32,
    pub client: u32,
    pub ml: u32,
}

impl NodeCounts {
    /// True when every count is zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.manager == 0 && self.data == 0 && self.ingest == 0 && self.client == 0 && self.ml == 0
    }
}

/// Root volume size in GiB per node class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassStorage {
    pub manager: u32,
    pub data: u32,
    pub client: u32,
    pub ml: u32,
}

impl Default for ClassStorage {
    fn default() -> Self {
        Self {
            manager: 8,
            data: 100,
            client: 8,
            ml: 100,
        }
    }
}

/// Instance profile (instance class) per node class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstanceProfiles {
    pub manager: String,
    pub data: String,
    pub client: String,
    pub ml: String,
}

impl Default for InstanceProfiles {
    fn default() -> Self {
        Self {
            manager: "c5.xlarge".to_string(),
            data: "r5.large".to_string(),
            client: "c5.large".to_string(),
            ml: "m5.xlarge".to_string(),
        }
    }
}

/// CPU architecture of the cluster's instances.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CpuArch {
    #[default]
    X64,
    Arm64,
}

impl CpuArch {
    /// Architecture segment used in distribution artifact paths.
    #[must_use]
    pub fn artifact_name(&self) -> &'static str {
        match self {
            Self::X64 => "x64",
            Self::Arm64 => "arm64",
        }
    }
}

impl fmt::Display for CpuArch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.artifact_name())
    }
}

/// Where the engine distribution comes from and what kind of build it is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Distribution {
    /// Tarball URL of the engine distribution.
    pub url: String,
    /// Engine version, used to pin plugin artifacts.
    pub version: String,
    pub cpu_arch: CpuArch,
    /// Trimmed build without bundled plugins or launcher scripts.
    pub minimal: bool,
    /// Mirror serving version-pinned plugin builds.
    pub plugin_mirror: String,
}

impl Default for Distribution {
    fn default() -> Self {
        Self {
            url: "https://artifacts.opensearch.org/releases/bundle/opensearch/2.11.0/opensearch-2.11.0-linux-x64.tar.gz"
                .to_string(),
            version: "2.11.0".to_string(),
            cpu_arch: CpuArch::X64,
            minimal: false,
            plugin_mirror: DEFAULT_PLUGIN_MIRROR.to_string(),
        }
    }
}

impl Distribution {
    /// Whether the artifact is served by the canonical public host.
    #[must_use]
    pub fn is_public_artifact(&self) -> bool {
        url_host(&self.url).is_some_and(|host| host == PUBLIC_ARTIFACT_HOST)
    }
}

/// Extract the host part of an http(s) URL.
fn url_host(url: &str) -> Option<&str> {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    let host = rest.split(['/', '?', '#']).next()?;
    let host = host.rsplit_once('@').map_or(host, |(_, h)| h);
    let host = host.split(':').next()?;
    (!host.is_empty()).then_some(host)
}

/// Companion dashboards installation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardsSpec {
    /// Tarball URL of the dashboards distribution.
    pub url: String,
}

/// Immutable description of the requested cluster.
///
/// Constructed once from user input. When `single_node` is set the node
/// counts are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterSpec {
    pub cluster_name: String,
    pub single_node: bool,
    pub counts: NodeCounts,
    pub storage: ClassStorage,
    pub instances: InstanceProfiles,
    pub distribution: Distribution,
    pub security_disabled: bool,
    /// Comma-separated JVM system properties (`a=1,b=2`).
    pub jvm_sys_props: Option<String>,
    /// Free-form text appended verbatim to the engine config.
    pub additional_config: Option<String>,
    /// Size the heap to half of the instance memory.
    pub heap_auto_size: bool,
    pub dashboards: Option<DashboardsSpec>,
    /// Log sink the metrics agent ships the engine log to.
    pub log_group: String,
}

impl Default for ClusterSpec {
    fn default() -> Self {
        Self {
            cluster_name: "search-cluster".to_string(),
            single_node: false,
            counts: NodeCounts::default(),
            storage: ClassStorage::default(),
            instances: InstanceProfiles::default(),
            distribution: Distribution::default(),
            security_disabled: false,
            jvm_sys_props: None,
            additional_config: None,
            heap_auto_size: false,
            dashboards: None,
            log_group: "search-cluster/logs".to_string(),
        }
    }
}

impl ClusterSpec {
    /// Check the spec without planning; see [`crate::planner::validate`].
    pub fn validate(&self) -> crate::Result<()> {
        crate::planner::validate(self)
    }

    /// Create a multi-node spec with the given counts and defaults elsewhere.
    pub fn with_counts(counts: NodeCounts) -> Self {
        Self {
            counts,
            ..Self::default()
        }
    }

    /// Create a single-node spec.
    pub fn single() -> Self {
        Self {
            single_node: true,
            ..Self::default()
        }
    }

    /// Normalise optional strings: blank values mean absent.
    pub fn normalized(mut self) -> Self {
        self.jvm_sys_props = non_blank(self.jvm_sys_props);
        self.additional_config = non_blank(self.additional_config);
        self.dashboards = self.dashboards.filter(|d| !d.url.trim().is_empty());
        self
    }

    /// JVM system properties, if any were supplied.
    pub fn jvm_sys_props(&self) -> Option<&str> {
        self.jvm_sys_props.as_deref().filter(|s| !s.trim().is_empty())
    }

    /// Additional config text, if any was supplied.
    pub fn additional_config(&self) -> Option<&str> {
        self.additional_config
            .as_deref()
            .filter(|s| !s.trim().is_empty())
    }

    /// Dashboards companion, if enabled.
    pub fn dashboards(&self) -> Option<&DashboardsSpec> {
        self.dashboards.as_ref().filter(|d| !d.url.trim().is_empty())
    }

    pub fn dashboards_enabled(&self) -> bool {
        self.dashboards().is_some()
    }

    /// Security is off and the build ships the security plugin to turn off.
    pub fn strips_security(&self) -> bool {
        self.security_disabled && !self.distribution.minimal
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

// ============================================================================
// Planner output
// ============================================================================

/// A set of identically configured instances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleGroup {
    pub role: Role,
    pub capacity: u32,
    pub instance_profile: String,
    /// Root volume size in GiB.
    pub storage_gib: u32,
    /// Receives client traffic from the load balancer.
    pub is_load_balancer_target: bool,
}

impl RoleGroup {
    pub(crate) fn new(role: Role, capacity: u32, instance_profile: &str, storage_gib: u32) -> Self {
        Self {
            role,
            capacity,
            instance_profile: instance_profile.to_string(),
            storage_gib,
            is_load_balancer_target: false,
        }
    }
}

/// Logical listener exposed by the load balancer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListenerKind {
    /// Client search traffic.
    Search,
    /// Dashboards companion traffic.
    Dashboards,
}

impl fmt::Display for ListenerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Search => write!(f, "search"),
            Self::Dashboards => write!(f, "dashboards"),
        }
    }
}

/// A listener bound to the roles that receive its traffic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenerBinding {
    pub kind: ListenerKind,
    /// Port the load balancer listens on.
    pub port: u16,
    /// Port traffic is forwarded to on the targets.
    pub target_port: u16,
    pub targets: Vec<Role>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip_names() {
        for role in Role::all() {
            assert_eq!(role.name().parse::<Role>().unwrap(), *role);
        }
        assert!("ingest".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_order_matches_emission_order() {
        let mut roles = vec![Role::Ml, Role::Data, Role::Seed, Role::Client, Role::Manager];
        roles.sort();
        assert_eq!(
            roles,
            vec![Role::Seed, Role::Manager, Role::Data, Role::Client, Role::Ml]
        );
    }

    #[test]
    fn test_public_artifact_detection() {
        let mut dist = Distribution::default();
        assert!(dist.is_public_artifact());

        dist.url = "https://ci.opensearch.org/ci/dbc/distribution-build-opensearch/2.11.0/opensearch.tar.gz"
            .to_string();
        assert!(!dist.is_public_artifact());

        // Host must match, not merely appear in the path
        dist.url = "https://mirror.example.com/artifacts.opensearch.org/os.tar.gz".to_string();
        assert!(!dist.is_public_artifact());

        dist.url = "https://artifacts.opensearch.org:443/releases/os.tar.gz".to_string();
        assert!(dist.is_public_artifact());
    }

    #[test]
    fn test_normalized_drops_blank_strings() {
        let spec = ClusterSpec {
            jvm_sys_props: Some("   ".to_string()),
            additional_config: Some(String::new()),
            dashboards: Some(DashboardsSpec { url: " ".to_string() }),
            ..ClusterSpec::default()
        }
        .normalized();

        assert_eq!(spec.jvm_sys_props, None);
        assert_eq!(spec.additional_config, None);
        assert_eq!(spec.dashboards, None);
    }

    #[test]
    fn test_accessors_ignore_blank_without_normalizing() {
        let spec = ClusterSpec {
            jvm_sys_props: Some(String::new()),
            ..ClusterSpec::default()
        };
        assert_eq!(spec.jvm_sys_props(), None);
        assert!(!spec.dashboards_enabled());
    }

    #[test]
    fn test_strips_security() {
        let mut spec = ClusterSpec {
            security_disabled: true,
            ..ClusterSpec::default()
        };
        assert!(spec.strips_security());

        spec.distribution.minimal = true;
        assert!(!spec.strips_security());
    }
}
