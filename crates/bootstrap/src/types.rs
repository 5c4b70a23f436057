//! Core types for bootstrap plans

use serde::{Deserialize, Serialize};
use std::fmt;

use topology::Role;

/// Kind of action a step performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepKind {
    PackageInstall,
    WriteFile,
    RunCommand,
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PackageInstall => write!(f, "package-install"),
            Self::WriteFile => write!(f, "write-file"),
            Self::RunCommand => write!(f, "run-command"),
        }
    }
}

/// How a file write treats existing content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    Overwrite,
    Append,
}

/// What a step does on the instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum StepAction {
    /// Install an OS package.
    PackageInstall { package: String },
    /// Write or append exact content to a file.
    WriteFile {
        path: String,
        content: String,
        mode: WriteMode,
    },
    /// Run a shell command, optionally from a working directory.
    RunCommand {
        command: String,
        cwd: Option<String>,
    },
}

impl StepAction {
    pub fn kind(&self) -> StepKind {
        match self {
            Self::PackageInstall { .. } => StepKind::PackageInstall,
            Self::WriteFile { .. } => StepKind::WriteFile,
            Self::RunCommand { .. } => StepKind::RunCommand,
        }
    }
}

/// Whether a step's failure must abort the bootstrap regardless of policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Criticality {
    /// The engine cannot run safely if this step fails.
    Fatal,
    /// Applies optional configuration.
    Optional,
}

/// How failures of optional steps are treated.
///
/// A partially applied config silently produces a misconfigured node, so
/// the default treats every step as fatal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Every step is fatal.
    #[default]
    Strict,
    /// Optional steps warn and continue.
    Lenient,
}

impl FailurePolicy {
    /// Resolve the effective fatal flag for a step.
    pub fn is_fatal(&self, criticality: Criticality) -> bool {
        match self {
            Self::Strict => true,
            Self::Lenient => criticality == Criticality::Fatal,
        }
    }
}

/// One action of a bootstrap plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapStep {
    /// Stable identifier, e.g. `engine.download`.
    pub id: String,
    pub description: String,
    pub action: StepAction,
    pub criticality: Criticality,
    /// Effective flag after applying the failure policy.
    pub fatal: bool,
}

impl BootstrapStep {
    pub fn kind(&self) -> StepKind {
        self.action.kind()
    }
}

/// Ordered, immutable list of first-boot steps for one role group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapPlan {
    role: Role,
    steps: Vec<BootstrapStep>,
}

impl BootstrapPlan {
    pub(crate) fn new(role: Role, steps: Vec<BootstrapStep>) -> Self {
        Self { role, steps }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn steps(&self) -> &[BootstrapStep] {
        &self.steps
    }

    /// Step ids in execution order.
    pub fn ids(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.id.as_str()).collect()
    }

    /// Find a step by id.
    pub fn step(&self, id: &str) -> Option<&BootstrapStep> {
        self.steps.iter().find(|s| s.id == id)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Content hash of the rendered script.
    ///
    /// Identical inputs always produce the same digest, so the provisioning
    /// platform can tell whether a group's instances need replacing.
    pub fn digest(&self) -> String {
        blake3::hash(crate::script::render(self).as_bytes())
            .to_hex()
            .to_string()
    }
}

/// Where things live on the instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallLayout {
    /// Unprivileged user the engine runs as.
    pub user: String,
    /// Home directory the distributions are unpacked into.
    pub home: String,
    pub engine_dir: String,
    pub dashboards_dir: String,
    /// Package manager install command.
    pub package_manager: String,
}

impl Default for InstallLayout {
    fn default() -> Self {
        Self {
            user: "ec2-user".to_string(),
            home: "/home/ec2-user".to_string(),
            engine_dir: "opensearch".to_string(),
            dashboards_dir: "opensearch-dashboards".to_string(),
            package_manager: "yum install -y".to_string(),
        }
    }
}

impl InstallLayout {
    /// Absolute engine install directory.
    pub fn engine_home(&self) -> String {
        format!("{}/{}", self.home, self.engine_dir)
    }

    /// Absolute dashboards install directory.
    pub fn dashboards_home(&self) -> String {
        format!("{}/{}", self.home, self.dashboards_dir)
    }

    pub fn engine_config(&self) -> String {
        format!("{}/config/opensearch.yml", self.engine_home())
    }

    pub fn jvm_options(&self) -> String {
        format!("{}/config/jvm.options", self.engine_home())
    }

    pub fn dashboards_config(&self) -> String {
        format!("{}/config/opensearch_dashboards.yml", self.dashboards_home())
    }

    /// Engine log file shipped by the metrics agent.
    pub fn engine_log(&self, cluster_name: &str) -> String {
        format!("{}/logs/{cluster_name}.log", self.engine_home())
    }
}

/// Options applied to every composed plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposeOptions {
    pub failure_policy: FailurePolicy,
    pub layout: InstallLayout,
    /// Instance memory when known up front; heap sizing then uses a fixed
    /// value instead of measuring on the instance.
    pub total_memory_gib: Option<u64>,
}
