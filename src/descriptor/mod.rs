// src/descriptor/mod.rs

//! Module descriptor model
//!
//! A `ModuleDescriptor` holds the module metadata that will be synthesized
//! into a legacy archive: name, version, exported packages and required
//! modules. Name and version may be absent while the registry is being
//! built (inference can fail); the name becomes mandatory when the
//! descriptor is finalized for synthesis.

pub mod name;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub use name::{automatic_module_name, check_dotted_name, is_valid_module_name};

/// The module every other module reads implicitly
pub const JAVA_BASE: &str = "java.base";

/// A `requires` directive
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Requirement {
    /// Name of the required module
    pub name: String,
    /// `requires static`: needed at compile time, optional at run time
    #[serde(default)]
    pub optional: bool,
    /// `requires transitive`: readers of this module also read the dependency
    #[serde(default)]
    pub transitive: bool,
}

impl Requirement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            optional: false,
            transitive: false,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn transitive(mut self) -> Self {
        self.transitive = true;
        self
    }
}

/// Target module metadata for one archive
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    name: Option<String>,
    version: Option<String>,
    exports: BTreeSet<String>,
    requires: Vec<Requirement>,
}

impl ModuleDescriptor {
    /// Create a descriptor with the given (possibly unknown) name and version
    pub fn new(name: Option<String>, version: Option<String>) -> Self {
        Self {
            name,
            version,
            ..Default::default()
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Exported packages, sorted
    pub fn exports(&self) -> &BTreeSet<String> {
        &self.exports
    }

    /// Required modules in declaration order
    pub fn requires(&self) -> &[Requirement] {
        &self.requires
    }

    /// Set or replace the module name
    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = Some(name.into());
        self
    }

    /// Set or replace the module version
    pub fn set_version(&mut self, version: impl Into<String>) -> &mut Self {
        self.version = Some(version.into());
        self
    }

    /// Export a package
    pub fn exports_package(&mut self, package: impl Into<String>) -> &mut Self {
        self.exports.insert(package.into());
        self
    }

    /// Add a plain `requires`
    pub fn requires_module(&mut self, module: impl Into<String>) -> &mut Self {
        self.requires_with(module, false, false)
    }

    /// Add a `requires transitive`
    pub fn requires_transitive(&mut self, module: impl Into<String>) -> &mut Self {
        self.requires_with(module, false, true)
    }

    /// Add a `requires static`
    pub fn requires_static(&mut self, module: impl Into<String>) -> &mut Self {
        self.requires_with(module, true, false)
    }

    /// Add a requirement with explicit flags
    ///
    /// Requiring a module twice replaces the earlier flags in place.
    pub fn requires_with(
        &mut self,
        module: impl Into<String>,
        optional: bool,
        transitive: bool,
    ) -> &mut Self {
        let requirement = Requirement {
            name: module.into(),
            optional,
            transitive,
        };
        match self.requires.iter_mut().find(|r| r.name == requirement.name) {
            Some(existing) => *existing = requirement,
            None => self.requires.push(requirement),
        }
        self
    }

    /// Validate for synthesis and return the module name
    ///
    /// `archive` is only used for error reporting.
    pub fn finalize(&self, archive: &str) -> Result<&str> {
        let name = self.name.as_deref().ok_or_else(|| Error::MissingModuleName {
            archive: archive.to_string(),
        })?;

        check_dotted_name(name).map_err(|reason| Error::InvalidModuleName {
            archive: archive.to_string(),
            name: name.to_string(),
            reason,
        })?;

        for requirement in &self.requires {
            check_dotted_name(&requirement.name).map_err(|reason| Error::InvalidModuleName {
                archive: archive.to_string(),
                name: requirement.name.clone(),
                reason,
            })?;
        }

        for package in &self.exports {
            check_dotted_name(package).map_err(|reason| Error::InvalidPackageName {
                archive: archive.to_string(),
                package: package.clone(),
                reason,
            })?;
        }

        Ok(name)
    }

    /// Stable textual form used in cache keys
    pub fn fingerprint(&self) -> String {
        let mut out = String::new();
        out.push_str("name=");
        out.push_str(self.name.as_deref().unwrap_or(""));
        out.push_str("\nversion=");
        out.push_str(self.version.as_deref().unwrap_or(""));
        for package in &self.exports {
            out.push_str("\nexports=");
            out.push_str(package);
        }
        for r in &self.requires {
            out.push_str(&format!(
                "\nrequires={}:{}:{}",
                r.name, r.optional as u8, r.transitive as u8
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_methods() {
        let mut descriptor = ModuleDescriptor::new(Some("org.example".into()), Some("1.0".into()));
        descriptor
            .exports_package("org.example.api")
            .exports_package("org.example.spi")
            .requires_module("java.logging")
            .requires_transitive("java.sql")
            .requires_static("java.desktop");

        assert_eq!(descriptor.name(), Some("org.example"));
        assert_eq!(descriptor.version(), Some("1.0"));
        assert_eq!(descriptor.exports().len(), 2);
        assert_eq!(descriptor.requires().len(), 3);
        assert!(descriptor.requires()[1].transitive);
        assert!(descriptor.requires()[2].optional);
    }

    #[test]
    fn test_requires_replaces_in_place() {
        let mut descriptor = ModuleDescriptor::default();
        descriptor
            .requires_module("a.one")
            .requires_module("b.two")
            .requires_transitive("a.one");

        let names: Vec<_> = descriptor.requires().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a.one", "b.two"]);
        assert!(descriptor.requires()[0].transitive);
    }

    #[test]
    fn test_exports_are_sorted_and_unique() {
        let mut descriptor = ModuleDescriptor::default();
        descriptor
            .exports_package("z.pkg")
            .exports_package("a.pkg")
            .exports_package("z.pkg");
        let exports: Vec<_> = descriptor.exports().iter().cloned().collect();
        assert_eq!(exports, vec!["a.pkg", "z.pkg"]);
    }

    #[test]
    fn test_finalize_requires_name() {
        let descriptor = ModuleDescriptor::new(None, Some("1.0".into()));
        let err = descriptor.finalize("plain.jar").unwrap_err();
        assert!(matches!(err, Error::MissingModuleName { ref archive } if archive == "plain.jar"));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_finalize_rejects_bad_names() {
        let descriptor = ModuleDescriptor::new(Some("foo-bar".into()), None);
        assert!(matches!(
            descriptor.finalize("x.jar"),
            Err(Error::InvalidModuleName { .. })
        ));

        let mut descriptor = ModuleDescriptor::new(Some("foo.bar".into()), None);
        descriptor.exports_package("foo..impl");
        assert!(matches!(
            descriptor.finalize("x.jar"),
            Err(Error::InvalidPackageName { .. })
        ));
    }

    #[test]
    fn test_fingerprint_changes_with_content() {
        let mut a = ModuleDescriptor::new(Some("m".into()), None);
        let b = a.clone();
        assert_eq!(a.fingerprint(), b.fingerprint());
        a.requires_static("java.sql");
        assert_ne!(a.fingerprint(), b.fingerprint());
    }
}
