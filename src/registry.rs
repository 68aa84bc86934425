// src/registry.rs

//! Descriptor registry
//!
//! Maps archive identifiers (file names) to the module metadata that should
//! be synthesized into them. The registry is assembled with a
//! [`RegistryBuilder`] while configuration is evaluated and then frozen into
//! an immutable [`DescriptorRegistry`], which transforms share through an
//! `Arc` without locking.
//!
//! Every registration shape funnels into [`RegistryBuilder::register`].
//! Registering an archive again replaces the earlier entry; what else
//! happens is governed by the [`DuplicatePolicy`].

use crate::descriptor::ModuleDescriptor;
use crate::error::{Error, Result};
use crate::inference::{self, DEFAULT_EXTENSION};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// How repeated or conflicting registrations are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Last registration wins, nothing is reported
    #[default]
    Overwrite,
    /// Last registration wins, each duplicate is logged as a warning
    Warn,
    /// Last registration wins in the builder, but transforming the
    /// archive fails with [`Error::AmbiguousRegistration`]
    Strict,
}

impl std::fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Overwrite => write!(f, "overwrite"),
            Self::Warn => write!(f, "warn"),
            Self::Strict => write!(f, "strict"),
        }
    }
}

/// Mutable registry used during configuration
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    modules: BTreeMap<String, ModuleDescriptor>,
    automatic: BTreeMap<String, String>,
    ambiguous: BTreeMap<String, String>,
    policy: DuplicatePolicy,
    extension: Option<String>,
}

impl RegistryBuilder {
    /// Create an empty builder with the default overwrite policy
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the duplicate policy
    pub fn with_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the extension marker used by name inference
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = Some(extension.into());
        self
    }

    fn extension(&self) -> &str {
        self.extension.as_deref().unwrap_or(DEFAULT_EXTENSION)
    }

    /// Register full module information for an archive
    pub fn module(
        &mut self,
        archive: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> &mut Self {
        self.register(archive, Some(name.into()), Some(version.into()), |_| {})
    }

    /// Register module information and customize exports and requires
    pub fn module_with<F>(
        &mut self,
        archive: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
        customize: F,
    ) -> &mut Self
    where
        F: FnOnce(&mut ModuleDescriptor),
    {
        self.register(archive, Some(name.into()), Some(version.into()), customize)
    }

    /// Register module information, guessing name and version from the
    /// archive file name
    ///
    /// Inference failures are logged and leave the values unset; `customize`
    /// may still fill them in.
    pub fn infer_module<F>(&mut self, archive: impl Into<String>, customize: F) -> &mut Self
    where
        F: FnOnce(&mut ModuleDescriptor),
    {
        let archive = archive.into();
        let (name, version) = match inference::infer_coordinates_with(&archive, self.extension()) {
            Ok(coords) => (Some(coords.name), Some(coords.version)),
            Err(failure) => {
                warn!(
                    "Unable to parse module or version: {} in archive name [{}]",
                    failure, archive
                );
                (None, None)
            }
        };
        self.register(archive, name, version, customize)
    }

    /// Register an automatic module name for an archive
    pub fn automatic_module(
        &mut self,
        archive: impl Into<String>,
        name: impl Into<String>,
    ) -> &mut Self {
        let archive = archive.into();
        let name = name.into();
        info!("Registering automatic module: [archive: {}, name: {}]", archive, name);

        if self.automatic.contains_key(&archive) {
            self.note_conflict(&archive, "registered as an automatic module more than once");
        }
        if self.modules.contains_key(&archive) {
            self.note_conflict(
                &archive,
                "registered both with a module descriptor and as an automatic module",
            );
        }
        self.automatic.insert(archive, name);
        self
    }

    /// Register a descriptor; every registration shape ends here
    pub fn register<F>(
        &mut self,
        archive: impl Into<String>,
        name: Option<String>,
        version: Option<String>,
        customize: F,
    ) -> &mut Self
    where
        F: FnOnce(&mut ModuleDescriptor),
    {
        let archive = archive.into();
        info!(
            "Registering module: [archive: {}, name: {}, version: {}]",
            archive,
            name.as_deref().unwrap_or("<unset>"),
            version.as_deref().unwrap_or("<unset>")
        );

        let mut descriptor = ModuleDescriptor::new(name, version);
        customize(&mut descriptor);

        if self.modules.contains_key(&archive) {
            self.note_conflict(&archive, "registered with a module descriptor more than once");
        }
        if self.automatic.contains_key(&archive) {
            self.note_conflict(
                &archive,
                "registered both with a module descriptor and as an automatic module",
            );
        }
        self.modules.insert(archive, descriptor);
        self
    }

    fn note_conflict(&mut self, archive: &str, detail: &str) {
        match self.policy {
            DuplicatePolicy::Overwrite => {
                debug!("Archive {} {}; last registration wins", archive, detail);
            }
            DuplicatePolicy::Warn => {
                warn!("Archive {} {}; last registration wins", archive, detail);
            }
            DuplicatePolicy::Strict => {
                warn!("Archive {} {}; it will not be transformed", archive, detail);
                self.ambiguous.insert(archive.to_string(), detail.to_string());
            }
        }
    }

    /// Freeze into an immutable registry
    pub fn build(self) -> DescriptorRegistry {
        DescriptorRegistry {
            extension: self.extension().to_string(),
            modules: self.modules,
            automatic: self.automatic,
            ambiguous: self.ambiguous,
            policy: self.policy,
        }
    }
}

/// What the registry knows about one archive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryEntry<'a> {
    /// Full descriptor registered
    Explicit(&'a ModuleDescriptor),
    /// Automatic module name override registered
    Automatic(&'a str),
    /// Nothing registered; fall back to the file name
    Unregistered,
}

impl RegistryEntry<'_> {
    /// Whether the archive becomes an automatic module
    pub fn is_automatic(&self) -> bool {
        !matches!(self, Self::Explicit(_))
    }

    /// Stable textual form used in cache keys
    pub fn fingerprint(&self) -> String {
        match self {
            Self::Explicit(descriptor) => format!("explicit\n{}", descriptor.fingerprint()),
            Self::Automatic(name) => format!("automatic\n{}", name),
            Self::Unregistered => "unregistered".to_string(),
        }
    }
}

/// Immutable registry handed to transforms
#[derive(Debug, Clone, Default)]
pub struct DescriptorRegistry {
    modules: BTreeMap<String, ModuleDescriptor>,
    automatic: BTreeMap<String, String>,
    ambiguous: BTreeMap<String, String>,
    policy: DuplicatePolicy,
    extension: String,
}

impl DescriptorRegistry {
    /// All explicit descriptors by archive identifier
    pub fn modules(&self) -> &BTreeMap<String, ModuleDescriptor> {
        &self.modules
    }

    /// All automatic module overrides by archive identifier
    pub fn automatic_modules(&self) -> &BTreeMap<String, String> {
        &self.automatic
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// Extension marker inference was configured with
    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn len(&self) -> usize {
        self.modules.len() + self.automatic.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty() && self.automatic.is_empty()
    }

    /// Look up an archive; explicit descriptors take precedence over
    /// automatic overrides
    pub fn lookup(&self, archive: &str) -> Result<RegistryEntry<'_>> {
        if let Some(detail) = self.ambiguous.get(archive) {
            return Err(Error::AmbiguousRegistration {
                archive: archive.to_string(),
                detail: detail.clone(),
            });
        }

        if let Some(descriptor) = self.modules.get(archive) {
            return Ok(RegistryEntry::Explicit(descriptor));
        }
        if let Some(name) = self.automatic.get(archive) {
            return Ok(RegistryEntry::Automatic(name));
        }
        Ok(RegistryEntry::Unregistered)
    }
}
