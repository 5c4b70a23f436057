//! Bootstrap composer - builds the first-boot plan of a role group
//!
//! The plan is a fixed sequence of guarded rules. Each rule pairs a guard
//! with a builder; rules are evaluated in table order and a rule whose
//! guard holds appends its steps. Later steps rely on files and services
//! created by earlier ones, so the table order is the execution order.

use log::{debug, trace};
use serde_json::json;

use topology::{ClusterSpec, Role, RoleGroup, TopologyPlan};

use crate::document::{ConfigDocument, ConfigValue};
use crate::error::Result;
use crate::heap;
use crate::script::quote;
use crate::templates::ConfigTemplates;
use crate::types::{
    BootstrapPlan, BootstrapStep, ComposeOptions, Criticality, StepAction, WriteMode,
};

/// OS package of the metrics agent.
pub const METRICS_AGENT_PACKAGE: &str = "amazon-cloudwatch-agent";
const METRICS_AGENT_CONFIG: &str =
    "/opt/aws/amazon-cloudwatch-agent/etc/amazon-cloudwatch-agent.json";
const METRICS_AGENT_CTL: &str = "/opt/aws/amazon-cloudwatch-agent/bin/amazon-cloudwatch-agent-ctl";
const METRICS_FLUSH_INTERVAL_SECS: u64 = 5;

/// Kernel memory-map limit the engine refuses to start below.
const MAX_MAP_COUNT: u64 = 262_144;

const DISCOVERY_PLUGIN: &str = "discovery-ec2";

/// Node name of the seed; the multi-node base lists it in
/// `cluster.initial_cluster_manager_nodes`.
pub const SEED_NODE_NAME: &str = "seed";
const NODE_ROLES: &str = "node.roles";

/// Everything a rule can look at.
struct StepInput<'a> {
    group: &'a RoleGroup,
    spec: &'a ClusterSpec,
    templates: &'a ConfigTemplates,
    options: &'a ComposeOptions,
}

type Guard = fn(&StepInput<'_>) -> bool;
type Builder = fn(&StepInput<'_>) -> Result<Vec<BootstrapStep>>;

struct StepRule {
    name: &'static str,
    guard: Guard,
    build: Builder,
}

const RULES: &[StepRule] = &[
    StepRule {
        name: "metrics-agent",
        guard: always,
        build: metrics_agent,
    },
    StepRule {
        name: "kernel-params",
        guard: always,
        build: kernel_params,
    },
    StepRule {
        name: "engine-download",
        guard: always,
        build: engine_download,
    },
    StepRule {
        name: "engine-config",
        guard: always,
        build: engine_config,
    },
    StepRule {
        name: "discovery-plugin",
        guard: always,
        build: discovery_plugin,
    },
    StepRule {
        name: "security-disable",
        guard: |input| input.spec.strips_security(),
        build: security_disable,
    },
    StepRule {
        name: "jvm-properties",
        guard: |input| input.spec.jvm_sys_props().is_some(),
        build: jvm_properties,
    },
    StepRule {
        name: "heap-size",
        guard: |input| input.spec.heap_auto_size,
        build: heap_size,
    },
    StepRule {
        name: "additional-config",
        guard: |input| input.spec.additional_config().is_some(),
        build: additional_config,
    },
    StepRule {
        name: "engine-start",
        guard: always,
        build: engine_start,
    },
    StepRule {
        name: "dashboards",
        guard: |input| input.spec.dashboards_enabled(),
        build: dashboards,
    },
];

/// Composes bootstrap plans from injected templates.
#[derive(Debug, Clone)]
pub struct Composer<'a> {
    templates: &'a ConfigTemplates,
    options: ComposeOptions,
}

impl<'a> Composer<'a> {
    pub fn new(templates: &'a ConfigTemplates, options: ComposeOptions) -> Self {
        Self { templates, options }
    }

    pub fn options(&self) -> &ComposeOptions {
        &self.options
    }

    /// Compose the plan for one role group.
    ///
    /// Deterministic: identical inputs yield identical plans.
    pub fn compose(&self, group: &RoleGroup, spec: &ClusterSpec) -> Result<BootstrapPlan> {
        let input = StepInput {
            group,
            spec,
            templates: self.templates,
            options: &self.options,
        };

        let mut steps = Vec::new();
        for rule in RULES {
            if !(rule.guard)(&input) {
                trace!("{}: skipping {}", group.role, rule.name);
                continue;
            }
            for mut step in (rule.build)(&input)? {
                step.fatal = self.options.failure_policy.is_fatal(step.criticality);
                debug!("{}: {} ({})", group.role, step.id, step.kind());
                steps.push(step);
            }
        }

        Ok(BootstrapPlan::new(group.role, steps))
    }

    /// Compose plans for every group of a topology, in group order.
    pub fn compose_all(
        &self,
        topology: &TopologyPlan,
        spec: &ClusterSpec,
    ) -> Result<Vec<BootstrapPlan>> {
        topology
            .groups()
            .iter()
            .map(|group| self.compose(group, spec))
            .collect()
    }

    /// The engine config a role ends up with, base and overlay merged.
    pub fn config_document(&self, role: Role, spec: &ClusterSpec) -> Result<ConfigDocument> {
        let (base, overlay) = layered_config(self.templates, role, spec)?;
        Ok(match overlay {
            Some(overlay) => base.merged(&overlay),
            None => base,
        })
    }
}

/// Compose with default options.
pub fn compose(
    group: &RoleGroup,
    spec: &ClusterSpec,
    templates: &ConfigTemplates,
) -> Result<BootstrapPlan> {
    Composer::new(templates, ComposeOptions::default()).compose(group, spec)
}

fn layered_config(
    templates: &ConfigTemplates,
    role: Role,
    spec: &ClusterSpec,
) -> Result<(ConfigDocument, Option<ConfigDocument>)> {
    let single = role == Role::Single;
    let mut base = templates.base(single).clone();
    base.set("cluster.name", spec.cluster_name.as_str());

    // The multi-node base bootstraps the cluster from the node named here
    if role == Role::Seed {
        base.set("node.name", SEED_NODE_NAME);
    }

    let overlay = match templates.overlay(role).transpose()? {
        Some(overlay) if role == Role::Seed => Some(seed_overlay(templates, spec, overlay)?),
        Some(overlay) => Some(overlay.clone()),
        None => None,
    };
    Ok((base, overlay))
}

/// A seed carved from the data pool runs on a data instance and keeps the
/// data roles next to the manager ones.
fn seed_overlay(
    templates: &ConfigTemplates,
    spec: &ClusterSpec,
    manager: &ConfigDocument,
) -> Result<ConfigDocument> {
    let mut overlay = manager.clone();
    if spec.counts.manager > 0 {
        return Ok(overlay);
    }

    let Some(data) = templates.overlay(Role::Data).transpose()? else {
        return Ok(overlay);
    };
    let mut roles = node_roles(manager);
    for role in node_roles(data) {
        if !roles.contains(&role) {
            roles.push(role);
        }
    }
    overlay.set(NODE_ROLES, ConfigValue::List(roles));
    Ok(overlay)
}

fn node_roles(doc: &ConfigDocument) -> Vec<ConfigValue> {
    match doc.get(NODE_ROLES) {
        Some(ConfigValue::List(items)) => items.clone(),
        Some(other) => vec![other.clone()],
        None => Vec::new(),
    }
}

// ============================================================================
// Step builders
// ============================================================================

fn always(_: &StepInput<'_>) -> bool {
    true
}

fn step(
    id: impl Into<String>,
    description: impl Into<String>,
    action: StepAction,
    criticality: Criticality,
) -> BootstrapStep {
    BootstrapStep {
        id: id.into(),
        description: description.into(),
        action,
        criticality,
        fatal: criticality == Criticality::Fatal,
    }
}

fn run(command: String, cwd: Option<String>) -> StepAction {
    StepAction::RunCommand { command, cwd }
}

fn append(path: String, content: String) -> StepAction {
    StepAction::WriteFile {
        path,
        content,
        mode: WriteMode::Append,
    }
}

fn metrics_agent(input: &StepInput<'_>) -> Result<Vec<BootstrapStep>> {
    let layout = &input.options.layout;
    let agent_config = json!({
        "agent": {
            "metrics_collection_interval": 60,
            "logfile": "/opt/aws/amazon-cloudwatch-agent/logs/amazon-cloudwatch-agent.log"
        },
        "metrics": {
            "namespace": format!("{}/{}", input.spec.cluster_name, input.group.role),
            "append_dimensions": {
                "InstanceId": "${aws:InstanceId}"
            },
            "metrics_collected": {
                "cpu": {
                    "measurement": ["usage_active", "usage_iowait", "usage_system", "usage_user"],
                    "totalcpu": true
                },
                "mem": { "measurement": ["used_percent"] },
                "disk": {
                    "measurement": ["used_percent", "inodes_free"],
                    "resources": ["*"]
                },
                "diskio": { "measurement": ["io_time", "reads", "writes"] },
                "net": { "measurement": ["bytes_sent", "bytes_recv"] },
                "procstat": [{
                    "pattern": "opensearch",
                    "measurement": ["cpu_usage", "memory_rss", "read_bytes", "write_bytes"]
                }]
            }
        },
        "logs": {
            "logs_collected": {
                "files": {
                    "collect_list": [{
                        "file_path": layout.engine_log(&input.spec.cluster_name),
                        "log_group_name": input.spec.log_group,
                        "log_stream_name": "{instance_id}",
                        "auto_removal": true
                    }]
                }
            },
            "force_flush_interval": METRICS_FLUSH_INTERVAL_SECS
        }
    });

    Ok(vec![
        step(
            "metrics.install",
            "Install the metrics agent",
            StepAction::PackageInstall {
                package: METRICS_AGENT_PACKAGE.to_string(),
            },
            Criticality::Fatal,
        ),
        step(
            "metrics.configure",
            "Write the metrics agent config",
            StepAction::WriteFile {
                path: METRICS_AGENT_CONFIG.to_string(),
                content: format!("{agent_config:#}\n"),
                mode: WriteMode::Overwrite,
            },
            Criticality::Fatal,
        ),
        step(
            "metrics.start",
            "Start the metrics agent",
            run(
                format!("{METRICS_AGENT_CTL} -a fetch-config -m ec2 -s -c file:{METRICS_AGENT_CONFIG}"),
                None,
            ),
            Criticality::Fatal,
        ),
    ])
}

fn kernel_params(_: &StepInput<'_>) -> Result<Vec<BootstrapStep>> {
    Ok(vec![step(
        "kernel.max-map-count",
        "Raise the memory-map limit",
        run(format!("sysctl -w vm.max_map_count={MAX_MAP_COUNT}"), None),
        Criticality::Fatal,
    )])
}

/// Download a tarball into `dir` under the home directory and hand it to
/// the install user.
fn download_command(url: &str, dir: &str, user: &str) -> String {
    let dir = quote(dir);
    let user = quote(user);
    format!(
        "mkdir -p {dir} && curl -fL {url} -o {dir}.tar.gz && \
         tar zxf {dir}.tar.gz -C {dir} --strip-components=1 && \
         chown -R {user}:{user} {dir}",
        url = quote(url),
    )
}

fn engine_download(input: &StepInput<'_>) -> Result<Vec<BootstrapStep>> {
    let layout = &input.options.layout;
    Ok(vec![step(
        "engine.download",
        "Download and unpack the engine",
        run(
            download_command(&input.spec.distribution.url, &layout.engine_dir, &layout.user),
            Some(layout.home.clone()),
        ),
        Criticality::Fatal,
    )])
}

fn engine_config(input: &StepInput<'_>) -> Result<Vec<BootstrapStep>> {
    let path = input.options.layout.engine_config();
    let (base, overlay) = layered_config(input.templates, input.group.role, input.spec)?;

    // Base entries the overlay redefines are left to the overlay phase so
    // the file never carries a key twice.
    let base_phase = match &overlay {
        Some(overlay) => base.without_keys(overlay),
        None => base,
    };

    let mut steps = vec![step(
        "config.base",
        "Write the base engine config",
        StepAction::WriteFile {
            path: path.clone(),
            content: base_phase.render(),
            mode: WriteMode::Overwrite,
        },
        Criticality::Fatal,
    )];

    if let Some(overlay) = overlay.filter(|o| !o.is_empty()) {
        steps.push(step(
            "config.overlay",
            format!("Append the {} role config", input.group.role),
            append(path, overlay.render()),
            Criticality::Fatal,
        ));
    }

    Ok(steps)
}

fn discovery_plugin(input: &StepInput<'_>) -> Result<Vec<BootstrapStep>> {
    let layout = &input.options.layout;
    let dist = &input.spec.distribution;

    let source = if dist.is_public_artifact() && !dist.minimal {
        DISCOVERY_PLUGIN.to_string()
    } else {
        quote(&format!(
            "{}/{version}/latest/linux/{arch}/tar/builds/opensearch/core-plugins/{DISCOVERY_PLUGIN}-{version}.zip",
            dist.plugin_mirror.trim_end_matches('/'),
            version = dist.version,
            arch = dist.cpu_arch.artifact_name(),
        ))
    };

    Ok(vec![step(
        "plugin.discovery",
        "Install the cluster discovery plugin",
        run(
            format!(
                "sudo -u {} bin/opensearch-plugin install {source} --batch",
                quote(&layout.user)
            ),
            Some(layout.engine_home()),
        ),
        Criticality::Fatal,
    )])
}

fn security_disable(input: &StepInput<'_>) -> Result<Vec<BootstrapStep>> {
    Ok(vec![step(
        "security.disable",
        "Disable the security plugin",
        append(
            input.options.layout.engine_config(),
            "plugins.security.disabled: true\n".to_string(),
        ),
        Criticality::Optional,
    )])
}

fn jvm_properties(input: &StepInput<'_>) -> Result<Vec<BootstrapStep>> {
    let props = input.spec.jvm_sys_props().unwrap_or_default();
    let path = input.options.layout.jvm_options();

    Ok(props
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .enumerate()
        .map(|(i, prop)| {
            step(
                format!("jvm.property.{}", i + 1),
                format!("Add JVM system property {prop}"),
                append(path.clone(), format!("-D{prop}\n")),
                Criticality::Optional,
            )
        })
        .collect())
}

fn heap_size(input: &StepInput<'_>) -> Result<Vec<BootstrapStep>> {
    let fixed = input.options.total_memory_gib.map(heap::heap_size_gib);
    let description = match fixed {
        Some(gib) => format!("Set the JVM heap to {gib} GiB"),
        None => "Set the JVM heap to half of instance memory".to_string(),
    };

    Ok(vec![step(
        "heap.size",
        description,
        run(
            heap::rewrite_command(fixed),
            Some(input.options.layout.engine_home()),
        ),
        Criticality::Optional,
    )])
}

fn additional_config(input: &StepInput<'_>) -> Result<Vec<BootstrapStep>> {
    let mut content = input.spec.additional_config().unwrap_or_default().to_string();
    if !content.ends_with('\n') {
        content.push('\n');
    }

    Ok(vec![step(
        "config.additional",
        "Append additional engine config",
        append(input.options.layout.engine_config(), content),
        Criticality::Optional,
    )])
}

fn engine_start(input: &StepInput<'_>) -> Result<Vec<BootstrapStep>> {
    let layout = &input.options.layout;
    // Minimal builds ship no tar-install launcher
    let launcher = if input.spec.distribution.minimal {
        "./bin/opensearch"
    } else {
        "./opensearch-tar-install.sh"
    };

    Ok(vec![step(
        "engine.start",
        "Start the engine in the background",
        run(
            format!(
                "sudo -u {} nohup {launcher} >> install.log 2>&1 &",
                quote(&layout.user)
            ),
            Some(layout.engine_home()),
        ),
        Criticality::Fatal,
    )])
}

fn dashboards(input: &StepInput<'_>) -> Result<Vec<BootstrapStep>> {
    let layout = &input.options.layout;
    let Some(dashboards) = input.spec.dashboards() else {
        return Ok(Vec::new());
    };

    let mut steps = vec![
        step(
            "dashboards.download",
            "Download and unpack dashboards",
            run(
                download_command(&dashboards.url, &layout.dashboards_dir, &layout.user),
                Some(layout.home.clone()),
            ),
            Criticality::Fatal,
        ),
        step(
            "dashboards.bind-host",
            "Bind dashboards on all interfaces",
            append(layout.dashboards_config(), "server.host: 0.0.0.0\n".to_string()),
            Criticality::Optional,
        ),
    ];

    if input.spec.strips_security() {
        steps.push(step(
            "dashboards.security-strip",
            "Remove the dashboards security plugin",
            run(
                "./bin/opensearch-dashboards-plugin remove securityDashboards --allow-root\n\
                 sed -i /^opensearch_security/d config/opensearch_dashboards.yml\n\
                 sed -i 's/https/http/' config/opensearch_dashboards.yml"
                    .to_string(),
                Some(layout.dashboards_home()),
            ),
            Criticality::Optional,
        ));
    }

    steps.push(step(
        "dashboards.start",
        "Start dashboards in the background",
        run(
            format!(
                "sudo -u {} nohup ./bin/opensearch-dashboards > dashboards_install.log 2>&1 &",
                quote(&layout.user)
            ),
            Some(layout.dashboards_home()),
        ),
        Criticality::Fatal,
    ));

    Ok(steps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FailurePolicy, StepKind};
    use topology::{DashboardsSpec, NodeCounts};

    fn templates() -> ConfigTemplates {
        ConfigTemplates::builtin().unwrap()
    }

    fn multi_node_spec() -> ClusterSpec {
        ClusterSpec {
            cluster_name: "logs-prod".to_string(),
            ..ClusterSpec::with_counts(NodeCounts {
                manager: 3,
                data: 4,
                ..NodeCounts::default()
            })
        }
    }

    fn group_for(spec: &ClusterSpec, role: Role) -> RoleGroup {
        topology::plan(spec).unwrap().group(role).unwrap().clone()
    }

    fn write_content(plan: &BootstrapPlan, id: &str) -> String {
        match &plan.step(id).unwrap().action {
            StepAction::WriteFile { content, .. } => content.clone(),
            other => panic!("{id} is not a file write: {other:?}"),
        }
    }

    fn command(plan: &BootstrapPlan, id: &str) -> String {
        match &plan.step(id).unwrap().action {
            StepAction::RunCommand { command, .. } => command.clone(),
            other => panic!("{id} is not a command: {other:?}"),
        }
    }

    #[test]
    fn test_data_group_full_step_order() {
        let spec = ClusterSpec {
            security_disabled: true,
            heap_auto_size: true,
            jvm_sys_props: Some("a=1,b=2".to_string()),
            ..multi_node_spec()
        };
        let templates = templates();
        let plan = compose(&group_for(&spec, Role::Data), &spec, &templates).unwrap();

        assert_eq!(
            plan.ids(),
            vec![
                "metrics.install",
                "metrics.configure",
                "metrics.start",
                "kernel.max-map-count",
                "engine.download",
                "config.base",
                "config.overlay",
                "plugin.discovery",
                "security.disable",
                "jvm.property.1",
                "jvm.property.2",
                "heap.size",
                "engine.start",
            ]
        );
        assert_eq!(plan.steps()[0].kind(), StepKind::PackageInstall);
        assert_eq!(write_content(&plan, "jvm.property.1"), "-Da=1\n");
        assert_eq!(write_content(&plan, "jvm.property.2"), "-Db=2\n");
        assert!(command(&plan, "engine.start").contains("nohup ./opensearch-tar-install.sh"));
        assert!(plan.steps().iter().all(|s| !s.id.starts_with("dashboards")));
    }

    #[test]
    fn test_minimal_build_keeps_security_and_uses_own_binary() {
        let mut spec = ClusterSpec {
            security_disabled: true,
            ..multi_node_spec()
        };
        spec.distribution.minimal = true;
        let templates = templates();
        let plan = compose(&group_for(&spec, Role::Data), &spec, &templates).unwrap();

        assert!(plan.step("security.disable").is_none());
        let start = command(&plan, "engine.start");
        assert!(start.contains("nohup ./bin/opensearch >> install.log 2>&1 &"));
        assert!(!start.contains("tar-install"));
    }

    #[test]
    fn test_discovery_plugin_source() {
        let templates = templates();
        let spec = multi_node_spec();
        let plan = compose(&group_for(&spec, Role::Seed), &spec, &templates).unwrap();
        assert_eq!(
            command(&plan, "plugin.discovery"),
            "sudo -u ec2-user bin/opensearch-plugin install discovery-ec2 --batch"
        );

        let mut spec = multi_node_spec();
        spec.distribution.minimal = true;
        spec.distribution.cpu_arch = topology::CpuArch::Arm64;
        spec.distribution.version = "2.12.0".to_string();
        let plan = compose(&group_for(&spec, Role::Seed), &spec, &templates).unwrap();
        assert_eq!(
            command(&plan, "plugin.discovery"),
            "sudo -u ec2-user bin/opensearch-plugin install \
             https://ci.opensearch.org/ci/dbc/distribution-build-opensearch/2.12.0/latest/linux/arm64/tar/builds/opensearch/core-plugins/discovery-ec2-2.12.0.zip \
             --batch"
        );
    }

    #[test]
    fn test_private_artifact_fetches_pinned_plugin() {
        let mut spec = multi_node_spec();
        spec.distribution.url = "https://builds.example.com/opensearch-2.11.0.tar.gz".to_string();
        let templates = templates();
        let plan = compose(&group_for(&spec, Role::Data), &spec, &templates).unwrap();

        let cmd = command(&plan, "plugin.discovery");
        assert!(cmd.contains("/2.11.0/latest/linux/x64/tar/"));
        assert!(plan.step("plugin.discovery").unwrap().fatal);
    }

    #[test]
    fn test_single_node_writes_only_base_config() {
        let spec = ClusterSpec {
            cluster_name: "solo".to_string(),
            ..ClusterSpec::single()
        };
        let templates = templates();
        let plan = compose(&group_for(&spec, Role::Single), &spec, &templates).unwrap();

        assert!(plan.step("config.overlay").is_none());
        let base = write_content(&plan, "config.base");
        assert!(base.starts_with("cluster.name: solo\n"));
        assert!(base.contains("discovery.type: single-node\n"));
    }

    #[test]
    fn test_two_phase_config_has_no_duplicate_keys() {
        let mut templates = templates();
        templates
            .overlays
            .get_mut("data")
            .unwrap()
            .set("network.host", "_site_");

        let spec = multi_node_spec();
        let composer = Composer::new(&templates, ComposeOptions::default());
        let plan = composer
            .compose(&group_for(&spec, Role::Data), &spec)
            .unwrap();

        let base = write_content(&plan, "config.base");
        let overlay = write_content(&plan, "config.overlay");
        assert!(!base.contains("network.host"));
        assert!(overlay.contains("network.host: _site_\n"));
        assert!(overlay.contains("node.roles: [data, ingest]\n"));

        let merged = composer.config_document(Role::Data, &spec).unwrap();
        assert_eq!(
            merged.get("network.host"),
            Some(&ConfigValue::from("_site_"))
        );
        assert_eq!(
            merged.get("cluster.name"),
            Some(&ConfigValue::from("logs-prod"))
        );
    }

    #[test]
    fn test_seed_and_manager_share_overlay() {
        let spec = multi_node_spec();
        let templates = templates();
        let seed = compose(&group_for(&spec, Role::Seed), &spec, &templates).unwrap();
        let manager = compose(&group_for(&spec, Role::Manager), &spec, &templates).unwrap();

        assert_eq!(
            write_content(&seed, "config.overlay"),
            write_content(&manager, "config.overlay")
        );
    }

    #[test]
    fn test_seed_is_named_for_cluster_bootstrap() {
        let spec = multi_node_spec();
        let templates = templates();
        let composer = Composer::new(&templates, ComposeOptions::default());

        let seed = composer.config_document(Role::Seed, &spec).unwrap();
        assert_eq!(seed.get("node.name"), Some(&ConfigValue::from(SEED_NODE_NAME)));
        assert_eq!(
            seed.get("cluster.initial_cluster_manager_nodes"),
            Some(&ConfigValue::List(vec![ConfigValue::from(SEED_NODE_NAME)]))
        );

        let plan = composer.compose(&group_for(&spec, Role::Seed), &spec).unwrap();
        let base = write_content(&plan, "config.base");
        assert!(base.contains("node.name: seed\n"));
        assert!(base.contains("cluster.initial_cluster_manager_nodes: [seed]\n"));

        // Every other node discovers the seed instead of naming itself
        let manager = composer.config_document(Role::Manager, &spec).unwrap();
        assert!(!manager.contains_key("node.name"));
        assert!(manager.contains_key("cluster.initial_cluster_manager_nodes"));
    }

    #[test]
    fn test_data_pool_seed_keeps_data_roles() {
        let spec = ClusterSpec {
            counts: NodeCounts {
                data: 3,
                ..NodeCounts::default()
            },
            ..multi_node_spec()
        };
        let templates = templates();
        let plan = compose(&group_for(&spec, Role::Seed), &spec, &templates).unwrap();

        assert_eq!(
            write_content(&plan, "config.overlay"),
            "node.roles: [cluster_manager, data, ingest]\n"
        );

        // Seeded from the manager pool, the seed is a pure manager
        let spec = multi_node_spec();
        let plan = compose(&group_for(&spec, Role::Seed), &spec, &templates).unwrap();
        assert_eq!(
            write_content(&plan, "config.overlay"),
            "node.roles: [cluster_manager]\n"
        );
    }

    #[test]
    fn test_missing_overlay_fails_composition() {
        let mut templates = templates();
        templates.overlays.remove("ml");
        let spec = ClusterSpec {
            counts: NodeCounts {
                manager: 1,
                data: 2,
                ml: 1,
                ..NodeCounts::default()
            },
            ..multi_node_spec()
        };
        let err = compose(&group_for(&spec, Role::Ml), &spec, &templates).unwrap_err();
        assert!(matches!(err, crate::Error::MissingOverlay { .. }));
    }

    #[test]
    fn test_additional_config_is_last_config_write() {
        let spec = ClusterSpec {
            additional_config: Some("indices.query.bool.max_clause_count: 4096".to_string()),
            heap_auto_size: true,
            ..multi_node_spec()
        };
        let templates = templates();
        let plan = compose(&group_for(&spec, Role::Data), &spec, &templates).unwrap();

        let ids = plan.ids();
        let heap = ids.iter().position(|id| *id == "heap.size").unwrap();
        let additional = ids.iter().position(|id| *id == "config.additional").unwrap();
        let start = ids.iter().position(|id| *id == "engine.start").unwrap();
        assert!(heap < additional && additional < start);
        assert_eq!(
            write_content(&plan, "config.additional"),
            "indices.query.bool.max_clause_count: 4096\n"
        );
    }

    #[test]
    fn test_jvm_props_skip_empty_entries() {
        let spec = ClusterSpec {
            jvm_sys_props: Some(" a=1, ,b=2,".to_string()),
            ..multi_node_spec()
        };
        let templates = templates();
        let plan = compose(&group_for(&spec, Role::Data), &spec, &templates).unwrap();
        let jvm: Vec<&str> = plan
            .ids()
            .into_iter()
            .filter(|id| id.starts_with("jvm."))
            .collect();
        assert_eq!(jvm, vec!["jvm.property.1", "jvm.property.2"]);
    }

    #[test]
    fn test_known_memory_fixes_heap() {
        let spec = ClusterSpec {
            heap_auto_size: true,
            ..multi_node_spec()
        };
        let templates = templates();
        let options = ComposeOptions {
            total_memory_gib: Some(70),
            ..ComposeOptions::default()
        };
        let plan = Composer::new(&templates, options)
            .compose(&group_for(&spec, Role::Data), &spec)
            .unwrap();

        assert!(command(&plan, "heap.size").starts_with("heap_gib=32\n"));
    }

    #[test]
    fn test_dashboards_steps() {
        let spec = ClusterSpec {
            security_disabled: true,
            dashboards: Some(DashboardsSpec {
                url: "https://artifacts.opensearch.org/dashboards-2.11.0.tar.gz".to_string(),
            }),
            ..multi_node_spec()
        };
        let templates = templates();
        let plan = compose(&group_for(&spec, Role::Data), &spec, &templates).unwrap();

        let ids = plan.ids();
        assert_eq!(
            &ids[ids.len() - 4..],
            &[
                "dashboards.download",
                "dashboards.bind-host",
                "dashboards.security-strip",
                "dashboards.start"
            ]
        );
        assert_eq!(
            write_content(&plan, "dashboards.bind-host"),
            "server.host: 0.0.0.0\n"
        );
        let strip = command(&plan, "dashboards.security-strip");
        assert!(strip.contains("remove securityDashboards"));
        assert!(strip.contains("sed -i 's/https/http/'"));

        // Security on: the dashboards plugin stays
        let secured = ClusterSpec {
            security_disabled: false,
            ..spec
        };
        let plan = compose(&group_for(&secured, Role::Data), &secured, &templates).unwrap();
        assert!(plan.step("dashboards.security-strip").is_none());
        assert!(plan.step("dashboards.start").is_some());
    }

    #[test]
    fn test_failure_policy_resolves_fatal_flags() {
        let spec = ClusterSpec {
            heap_auto_size: true,
            ..multi_node_spec()
        };
        let templates = templates();
        let group = group_for(&spec, Role::Data);

        let strict = compose(&group, &spec, &templates).unwrap();
        assert!(strict.steps().iter().all(|s| s.fatal));

        let lenient = Composer::new(
            &templates,
            ComposeOptions {
                failure_policy: FailurePolicy::Lenient,
                ..ComposeOptions::default()
            },
        )
        .compose(&group, &spec)
        .unwrap();
        assert!(!lenient.step("heap.size").unwrap().fatal);
        assert!(lenient.step("engine.download").unwrap().fatal);
        assert!(lenient.step("kernel.max-map-count").unwrap().fatal);
    }

    #[test]
    fn test_compose_is_deterministic() {
        let spec = multi_node_spec();
        let topology = topology::plan(&spec).unwrap();
        let templates = templates();
        let composer = Composer::new(&templates, ComposeOptions::default());

        let first = composer.compose_all(&topology, &spec).unwrap();
        let second = composer.compose_all(&topology, &spec).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), topology.groups().len());
        assert_eq!(first[0].digest(), second[0].digest());
    }

    #[test]
    fn test_metrics_agent_config_ships_engine_log() {
        let spec = ClusterSpec {
            log_group: "logs-prod/engine".to_string(),
            ..multi_node_spec()
        };
        let templates = templates();
        let plan = compose(&group_for(&spec, Role::Seed), &spec, &templates).unwrap();

        let config: serde_json::Value =
            serde_json::from_str(&write_content(&plan, "metrics.configure")).unwrap();
        let file = &config["logs"]["logs_collected"]["files"]["collect_list"][0];
        assert_eq!(file["file_path"], "/home/ec2-user/opensearch/logs/logs-prod.log");
        assert_eq!(file["log_group_name"], "logs-prod/engine");
        assert_eq!(config["logs"]["force_flush_interval"], 5);
    }
}
