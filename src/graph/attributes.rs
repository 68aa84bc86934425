// src/graph/attributes.rs

//! Artifact attributes used for variant matching

use serde::Serialize;
use std::fmt;

/// Attribute naming the kind of artifact
pub const ARTIFACT_TYPE: &str = "artifactType";
/// Boolean attribute: is the artifact a module
pub const JAVA_MODULE: &str = "javaModule";
/// `artifactType` value for library archives
pub const JAR_TYPE: &str = "jar";

/// Value of the `javaModule` attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Modularity {
    NonModular,
    Modular,
}

impl Modularity {
    pub fn from_bool(modular: bool) -> Self {
        if modular { Self::Modular } else { Self::NonModular }
    }

    pub fn as_bool(&self) -> bool {
        matches!(self, Self::Modular)
    }
}

impl fmt::Display for Modularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_bool())
    }
}

/// Attributes of an artifact variant, or the attributes a view requests
///
/// An unset attribute on a request accepts any value. An unset attribute
/// on a candidate is compatible with any requested value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct AttributeSet {
    #[serde(rename = "artifactType", skip_serializing_if = "Option::is_none")]
    artifact_type: Option<String>,
    #[serde(rename = "javaModule", skip_serializing_if = "Option::is_none")]
    java_module: Option<Modularity>,
}

impl AttributeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attributes of a plain jar with no modularity marker yet
    pub fn jar() -> Self {
        Self::new().with_artifact_type(JAR_TYPE)
    }

    pub fn with_artifact_type(mut self, artifact_type: impl Into<String>) -> Self {
        self.artifact_type = Some(artifact_type.into());
        self
    }

    pub fn with_java_module(mut self, modularity: Modularity) -> Self {
        self.java_module = Some(modularity);
        self
    }

    pub fn artifact_type(&self) -> Option<&str> {
        self.artifact_type.as_deref()
    }

    pub fn java_module(&self) -> Option<Modularity> {
        self.java_module
    }

    pub fn set_java_module(&mut self, modularity: Modularity) {
        self.java_module = Some(modularity);
    }

    pub fn is_empty(&self) -> bool {
        self.artifact_type.is_none() && self.java_module.is_none()
    }

    /// Whether a candidate with these attributes satisfies `requested`
    pub fn satisfies(&self, requested: &AttributeSet) -> bool {
        fn compatible<T: PartialEq>(have: &Option<T>, want: &Option<T>) -> bool {
            match (have, want) {
                (Some(h), Some(w)) => h == w,
                _ => true,
            }
        }
        compatible(&self.artifact_type, &requested.artifact_type)
            && compatible(&self.java_module, &requested.java_module)
    }
}

impl fmt::Display for AttributeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(t) = &self.artifact_type {
            parts.push(format!("{}={}", ARTIFACT_TYPE, t));
        }
        if let Some(m) = self.java_module {
            parts.push(format!("{}={}", JAVA_MODULE, m));
        }
        write!(f, "{{{}}}", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modularity_bool() {
        assert!(Modularity::from_bool(true).as_bool());
        assert_eq!(Modularity::from_bool(false), Modularity::NonModular);
        assert_eq!(Modularity::Modular.to_string(), "true");
    }

    #[test]
    fn test_satisfies() {
        let request = AttributeSet::jar().with_java_module(Modularity::Modular);
        let legacy = AttributeSet::jar().with_java_module(Modularity::NonModular);
        let module = AttributeSet::jar().with_java_module(Modularity::Modular);
        let untagged = AttributeSet::jar();
        let zip = AttributeSet::new().with_artifact_type("zip");

        assert!(!legacy.satisfies(&request));
        assert!(module.satisfies(&request));
        assert!(untagged.satisfies(&request));
        assert!(!zip.satisfies(&request));
        assert!(legacy.satisfies(&AttributeSet::new()));
    }

    #[test]
    fn test_display() {
        let attrs = AttributeSet::jar().with_java_module(Modularity::NonModular);
        assert_eq!(attrs.to_string(), "{artifactType=jar, javaModule=false}");
        assert_eq!(AttributeSet::new().to_string(), "{}");
    }
}
