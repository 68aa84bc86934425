// src/graph/dispatch.rs

//! Transform dispatch table keyed by attribute edges

use super::attributes::{JAR_TYPE, Modularity};
use crate::error::Result;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A conversion between two values of `javaModule` for one artifact type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransformEdge {
    pub artifact_type: String,
    pub from: Modularity,
    pub to: Modularity,
}

impl TransformEdge {
    pub fn new(artifact_type: impl Into<String>, from: Modularity, to: Modularity) -> Self {
        Self {
            artifact_type: artifact_type.into(),
            from,
            to,
        }
    }

    /// `jar/false -> jar/true`
    pub fn legacy_jar() -> Self {
        Self::new(JAR_TYPE, Modularity::NonModular, Modularity::Modular)
    }
}

impl fmt::Display for TransformEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} -> {}/{}", self.artifact_type, self.from, self.artifact_type, self.to)
    }
}

/// A registered artifact conversion
///
/// Implementations must be pure with respect to their input file: the
/// same input yields the same output, and the input is never modified.
pub trait ArtifactTransform: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Convert the artifact at `input`, returning the output path
    fn transform(&self, input: &Path) -> Result<PathBuf>;
}

/// Transforms keyed by the edge they implement
#[derive(Default, Clone)]
pub struct TransformRegistry {
    transforms: HashMap<TransformEdge, Arc<dyn ArtifactTransform>>,
}

impl TransformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a transform, replacing any previous one for the edge
    pub fn register(&mut self, edge: TransformEdge, transform: Arc<dyn ArtifactTransform>) {
        self.transforms.insert(edge, transform);
    }

    pub fn get(&self, edge: &TransformEdge) -> Option<&Arc<dyn ArtifactTransform>> {
        self.transforms.get(edge)
    }

    pub fn has(&self, edge: &TransformEdge) -> bool {
        self.transforms.contains_key(edge)
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

impl fmt::Debug for TransformRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.transforms.iter().map(|(edge, t)| (edge.to_string(), t.name().to_string())))
            .finish()
    }
}
