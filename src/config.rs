use anyhow::{Context, Result};
use bootstrap::templates::{MULTI_NODE_FILE, ROLES_FILE, SINGLE_NODE_FILE};
use bootstrap::{ComposeOptions, ConfigTemplates};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use topology::ClusterSpec;

/// Get the config directory path
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("searchform"))
}

/// Default cluster file location
pub fn default_cluster_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("cluster.toml"))
}

/// Expand `~` in a user-supplied path
pub fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(&raw).as_ref())
}

// ============================================================================
// Cluster file
// ============================================================================

/// Contents of a cluster file.
///
/// ```toml
/// templates = "~/.config/searchform/templates"
///
/// [cluster]
/// cluster_name = "logs"
///
/// [cluster.counts]
/// manager = 3
/// data = 4
///
/// [bootstrap]
/// failure_policy = "lenient"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterFile {
    /// Template directory; built-in templates when unset
    pub templates: Option<String>,
    pub cluster: ClusterSpec,
    pub bootstrap: ComposeOptions,
}

impl ClusterFile {
    /// Load a cluster file. A missing file is an error, unlike the
    /// application config: there is no sensible default cluster.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read cluster file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Invalid cluster file: {}", path.display()))
    }

    /// Parse cluster file text, normalising blank optional strings.
    pub fn parse(content: &str) -> Result<Self> {
        let mut file: Self = toml::from_str(content).context("Invalid TOML format")?;
        file.cluster = file.cluster.normalized();
        file.templates = file.templates.filter(|t| !t.trim().is_empty());
        Ok(file)
    }

    /// Load the templates this file points at, with a CLI override taking
    /// precedence.
    pub fn load_templates(&self, override_dir: Option<&Path>) -> Result<ConfigTemplates> {
        let dir = match (override_dir, &self.templates) {
            (Some(dir), _) => expand_path(dir),
            (None, Some(dir)) => expand_path(Path::new(dir)),
            (None, None) => {
                log::debug!("using built-in templates");
                return ConfigTemplates::builtin().context("Built-in templates are invalid");
            }
        };
        load_template_dir(&dir)
    }
}

/// Load a template directory holding the three template files.
pub fn load_template_dir(dir: &Path) -> Result<ConfigTemplates> {
    log::debug!("loading templates from {}", dir.display());

    let read = |name: &str| -> Result<String> {
        let path = dir.join(name);
        fs::read_to_string(&path)
            .with_context(|| format!("Could not read template: {}", path.display()))
    };

    let single = read(SINGLE_NODE_FILE)?;
    let multi = read(MULTI_NODE_FILE)?;
    let roles = read(ROLES_FILE)?;

    ConfigTemplates::from_sources(&single, &multi, &roles)
        .with_context(|| format!("Invalid templates in {}", dir.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bootstrap::FailurePolicy;
    use tempfile::TempDir;

    const CLUSTER: &str = r#"
[cluster]
cluster_name = "logs"
jvm_sys_props = "   "
additional_config = "indices.query.bool.max_clause_count: 2048"

[cluster.counts]
manager = 3
data = 4
client = 2

[cluster.distribution]
url = "https://artifacts.opensearch.org/releases/bundle/opensearch/2.11.0/opensearch-2.11.0-linux-x64.tar.gz"
version = "2.11.0"
cpu_arch = "x64"

[bootstrap]
failure_policy = "lenient"
total_memory_gib = 16
"#;

    #[test]
    fn test_parse_cluster_file() {
        let file = ClusterFile::parse(CLUSTER).unwrap();

        assert_eq!(file.cluster.cluster_name, "logs");
        assert_eq!(file.cluster.counts.manager, 3);
        assert_eq!(file.cluster.counts.client, 2);
        assert_eq!(file.cluster.counts.ml, 0);
        assert!(file.cluster.jvm_sys_props.is_none());
        assert!(file.cluster.additional_config.is_some());
        assert_eq!(file.bootstrap.failure_policy, FailurePolicy::Lenient);
        assert_eq!(file.bootstrap.total_memory_gib, Some(16));
        assert!(file.templates.is_none());
    }

    #[test]
    fn test_parse_rejects_bad_toml() {
        assert!(ClusterFile::parse("[cluster\n").is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let tmp = TempDir::new().unwrap();
        let err = ClusterFile::load(&tmp.path().join("nope.toml")).unwrap_err();
        assert!(err.to_string().contains("Could not read cluster file"));
    }

    #[test]
    fn test_load_from_disk() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("cluster.toml");
        fs::write(&path, CLUSTER).unwrap();

        let file = ClusterFile::load(&path).unwrap();
        assert_eq!(file.cluster.counts.data, 4);
    }

    #[test]
    fn test_builtin_templates_when_unset() {
        let file = ClusterFile::default();
        let templates = file.load_templates(None).unwrap();
        assert_eq!(templates, ConfigTemplates::builtin().unwrap());
    }

    #[test]
    fn test_template_dir_override() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(SINGLE_NODE_FILE), "discovery.type = \"single-node\"\n").unwrap();
        fs::write(tmp.path().join(MULTI_NODE_FILE), "network.host = \"0.0.0.0\"\n").unwrap();
        fs::write(
            tmp.path().join(ROLES_FILE),
            "[manager]\n\"node.roles\" = [\"cluster_manager\"]\n[data]\n[client]\n[ml]\n",
        )
        .unwrap();

        let file = ClusterFile {
            templates: Some("/does/not/exist".to_string()),
            ..ClusterFile::default()
        };
        let templates = file.load_templates(Some(tmp.path())).unwrap();
        assert_eq!(templates.multi_node.len(), 1);
        assert_eq!(templates.overlays.len(), 4);
    }

    #[test]
    fn test_template_dir_missing_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(SINGLE_NODE_FILE), "").unwrap();

        let err = load_template_dir(tmp.path()).unwrap_err();
        assert!(err.to_string().contains(MULTI_NODE_FILE));
    }

    #[test]
    fn test_expand_path_tilde() {
        let expanded = expand_path(Path::new("~/x.toml"));
        assert!(!expanded.to_string_lossy().starts_with('~'));
    }
}
