// src/config.rs

//! Registry configuration file (TOML)
//!
//! The configuration file is a declarative front end to
//! [`RegistryBuilder`]; each entry is replayed through the same
//! registration calls a build script would make.
//!
//! ```toml
//! [settings]
//! duplicates = "warn"
//!
//! [[module]]
//! archive = "commons-cli-1.4.jar"
//! name = "org.apache.commons.cli"
//! exports = ["org.apache.commons.cli"]
//! requires = [{ name = "java.sql", transitive = true }]
//!
//! [[automatic]]
//! archive = "jsr305-3.0.2.jar"
//! name = "jsr305"
//! ```

use crate::descriptor::Requirement;
use crate::error::Result;
use crate::registry::{DescriptorRegistry, DuplicatePolicy, RegistryBuilder};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root of the configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryConfig {
    #[serde(default)]
    pub settings: Settings,

    #[serde(default, rename = "module")]
    pub modules: Vec<ModuleEntry>,

    #[serde(default, rename = "automatic")]
    pub automatic: Vec<AutomaticEntry>,
}

/// Global settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Duplicate registration policy
    #[serde(default)]
    pub duplicates: DuplicatePolicy,

    /// Extension marker for name inference (default ".jar")
    #[serde(default)]
    pub extension: Option<String>,
}

/// One `[[module]]` table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleEntry {
    /// Archive file name
    pub archive: String,

    /// Module name; inferred from the archive name when absent
    #[serde(default)]
    pub name: Option<String>,

    /// Module version; inferred along with the name when absent
    #[serde(default)]
    pub version: Option<String>,

    #[serde(default)]
    pub exports: Vec<String>,

    #[serde(default)]
    pub requires: Vec<Requirement>,
}

/// One `[[automatic]]` table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AutomaticEntry {
    pub archive: String,
    pub name: String,
}

impl RegistryConfig {
    /// Load from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse from a TOML string
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Replay the configuration into a registry builder
    pub fn apply(&self, builder: &mut RegistryBuilder) {
        for entry in &self.modules {
            let customize = |m: &mut crate::descriptor::ModuleDescriptor| {
                if let Some(version) = &entry.version {
                    m.set_version(version.clone());
                }
                for package in &entry.exports {
                    m.exports_package(package.clone());
                }
                for r in &entry.requires {
                    m.requires_with(r.name.clone(), r.optional, r.transitive);
                }
            };

            match &entry.name {
                Some(name) => {
                    builder.register(
                        entry.archive.clone(),
                        Some(name.clone()),
                        entry.version.clone(),
                        customize,
                    );
                }
                None => {
                    builder.infer_module(entry.archive.clone(), customize);
                }
            }
        }

        for entry in &self.automatic {
            builder.automatic_module(entry.archive.clone(), entry.name.clone());
        }
    }

    /// Build a frozen registry from this configuration
    pub fn build_registry(&self) -> DescriptorRegistry {
        let mut builder = RegistryBuilder::new().with_policy(self.settings.duplicates);
        if let Some(extension) = &self.settings.extension {
            builder = builder.with_extension(extension.clone());
        }
        self.apply(&mut builder);
        builder.build()
    }
}
