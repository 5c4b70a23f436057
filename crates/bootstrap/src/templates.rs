//! Config templates injected into the composer.
//!
//! The composer never reads templates from disk. Callers load them (or use
//! [`ConfigTemplates::builtin`]) and hand the parsed documents over.

use std::collections::BTreeMap;

use topology::Role;

use crate::document::ConfigDocument;
use crate::error::{Error, Result};

const BUILTIN_SINGLE_NODE: &str = include_str!("../templates/single-node.toml");
const BUILTIN_MULTI_NODE: &str = include_str!("../templates/multi-node.toml");
const BUILTIN_ROLES: &str = include_str!("../templates/roles.toml");

/// File names of a template directory.
pub const SINGLE_NODE_FILE: &str = "single-node.toml";
pub const MULTI_NODE_FILE: &str = "multi-node.toml";
pub const ROLES_FILE: &str = "roles.toml";

/// Base documents plus per-role overlays.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigTemplates {
    pub single_node: ConfigDocument,
    pub multi_node: ConfigDocument,
    pub overlays: BTreeMap<String, ConfigDocument>,
}

impl ConfigTemplates {
    /// Templates shipped with the crate.
    pub fn builtin() -> Result<Self> {
        Self::from_sources(BUILTIN_SINGLE_NODE, BUILTIN_MULTI_NODE, BUILTIN_ROLES)
    }

    /// Parse templates from TOML text.
    ///
    /// `roles` holds one table per overlay key (`[manager]`, `[data]`, ...).
    pub fn from_sources(single_node: &str, multi_node: &str, roles: &str) -> Result<Self> {
        let single_node = ConfigDocument::from_toml(SINGLE_NODE_FILE, single_node)?;
        let multi_node = ConfigDocument::from_toml(MULTI_NODE_FILE, multi_node)?;

        let table: toml::Table = toml::from_str(roles).map_err(|e| Error::InvalidTemplate {
            name: ROLES_FILE.to_string(),
            message: e.to_string(),
        })?;

        let mut overlays = BTreeMap::new();
        for (key, value) in table {
            let toml::Value::Table(overlay) = value else {
                return Err(Error::InvalidTemplate {
                    name: ROLES_FILE.to_string(),
                    message: format!("'{key}' must be a table of config entries"),
                });
            };
            overlays.insert(key, ConfigDocument::from_table(overlay));
        }

        Ok(Self {
            single_node,
            multi_node,
            overlays,
        })
    }

    /// Base document for a cluster shape.
    pub fn base(&self, single_node: bool) -> &ConfigDocument {
        if single_node {
            &self.single_node
        } else {
            &self.multi_node
        }
    }

    /// Overlay for a role, or `None` for the single-node role.
    pub fn overlay(&self, role: Role) -> Option<Result<&ConfigDocument>> {
        let key = overlay_key(role)?;
        Some(self.overlays.get(key).ok_or_else(|| Error::MissingOverlay {
            key: key.to_string(),
            role: role.to_string(),
        }))
    }
}

/// Overlay table a role reads from.
pub fn overlay_key(role: Role) -> Option<&'static str> {
    match role {
        Role::Single => None,
        Role::Seed | Role::Manager => Some("manager"),
        Role::Data => Some("data"),
        Role::Client => Some("client"),
        Role::Ml => Some("ml"),
    }
}
