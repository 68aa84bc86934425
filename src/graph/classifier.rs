// src/graph/classifier.rs

//! Modularity marking for artifacts and resolvable views
//!
//! Views that feed compilation, runtime or annotation processing ask for
//! modules. Every jar that does not say otherwise is assumed legacy, which
//! is what makes the `jar/false -> jar/true` transform fire for it.

use super::attributes::{AttributeSet, JAR_TYPE, Modularity};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// View name suffixes that request modules
///
/// Matched without the first letter so both `compileClasspath` and
/// `testCompileClasspath` qualify.
const MODULE_VIEW_SUFFIXES: &[&str] = &["ompileClasspath", "untimeClasspath", "nnotationProcessor"];

/// An artifact in the graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactNode {
    /// Archive identifier (the file name)
    pub id: String,
    pub path: PathBuf,
    pub attributes: AttributeSet,
}

impl ArtifactNode {
    /// A jar node for a file on disk, identified by its file name
    pub fn jar(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let id = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            id,
            path,
            attributes: AttributeSet::jar(),
        }
    }

    pub fn with_attributes(mut self, attributes: AttributeSet) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// A named selection of artifacts, e.g. `compileClasspath`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvableView {
    pub name: String,
    /// Only resolvable views request attributes
    pub resolvable: bool,
    /// Attributes requested from every artifact in the view
    pub attributes: AttributeSet,
    /// Artifact identifiers, in declaration order
    pub artifacts: Vec<String>,
}

impl ResolvableView {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            resolvable: true,
            attributes: AttributeSet::new(),
            artifacts: Vec::new(),
        }
    }

    /// A view that only declares dependencies and is never resolved itself
    pub fn declarable(name: impl Into<String>) -> Self {
        Self {
            resolvable: false,
            ..Self::new(name)
        }
    }

    /// Add an artifact; duplicates are ignored
    pub fn with_artifact(mut self, id: impl Into<String>) -> Self {
        let id = id.into();
        if !self.artifacts.contains(&id) {
            self.artifacts.push(id);
        }
        self
    }
}

/// Artifacts plus the views that select them
#[derive(Debug, Clone, Default)]
pub struct ArtifactGraph {
    artifacts: BTreeMap<String, ArtifactNode>,
    views: BTreeMap<String, ResolvableView>,
}

impl ArtifactGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an artifact, replacing one with the same identifier
    pub fn add_artifact(&mut self, node: ArtifactNode) {
        self.artifacts.insert(node.id.clone(), node);
    }

    pub fn add_view(&mut self, view: ResolvableView) {
        self.views.insert(view.name.clone(), view);
    }

    pub fn artifact(&self, id: &str) -> Option<&ArtifactNode> {
        self.artifacts.get(id)
    }

    pub fn artifacts(&self) -> impl Iterator<Item = &ArtifactNode> {
        self.artifacts.values()
    }

    pub fn view(&self, name: &str) -> Option<&ResolvableView> {
        self.views.get(name)
    }

    pub fn views(&self) -> impl Iterator<Item = &ResolvableView> {
        self.views.values()
    }
}

/// What a classification pass changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassificationSummary {
    /// Views newly marked as requesting modules
    pub views_marked: usize,
    /// Jars newly defaulted to non-modular
    pub artifacts_defaulted: usize,
}

/// Applies the modularity marking rules
#[derive(Debug, Clone, Copy, Default)]
pub struct AttributeClassifier;

impl AttributeClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Whether a view with this name requests modules
    pub fn requests_modules(view_name: &str) -> bool {
        MODULE_VIEW_SUFFIXES.iter().any(|s| view_name.ends_with(s))
    }

    /// Mark a view; returns whether anything changed
    pub fn classify_view(&self, view: &mut ResolvableView) -> bool {
        if !view.resolvable || !Self::requests_modules(&view.name) {
            return false;
        }
        if view.attributes.java_module() == Some(Modularity::Modular) {
            return false;
        }
        view.attributes.set_java_module(Modularity::Modular);
        true
    }

    /// Default an unmarked jar to non-modular; returns whether anything changed
    pub fn classify_artifact(&self, node: &mut ArtifactNode) -> bool {
        if node.attributes.artifact_type() != Some(JAR_TYPE) || node.attributes.java_module().is_some() {
            return false;
        }
        node.attributes.set_java_module(Modularity::NonModular);
        true
    }

    /// Mark every view and artifact in the graph
    pub fn classify(&self, graph: &mut ArtifactGraph) -> ClassificationSummary {
        let mut summary = ClassificationSummary::default();
        for view in graph.views.values_mut() {
            if self.classify_view(view) {
                summary.views_marked += 1;
            }
        }
        for node in graph.artifacts.values_mut() {
            if self.classify_artifact(node) {
                summary.artifacts_defaulted += 1;
            }
        }
        summary
    }
}
