// src/graph/resolve.rs

//! View resolution
//!
//! Resolving a view returns, for each of its artifacts, a variant that
//! satisfies the view's requested attributes. Artifacts that already match
//! are returned untouched; the rest go through the transform registered
//! for their edge. Transforms run in parallel and a failure only affects
//! its own artifact.

use super::attributes::{AttributeSet, JAR_TYPE, Modularity};
use super::classifier::{ArtifactGraph, ArtifactNode};
use super::dispatch::{TransformEdge, TransformRegistry};
use crate::error::{Error, Result};
use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One artifact as seen by a resolved view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArtifact {
    pub id: String,
    pub path: PathBuf,
    pub attributes: AttributeSet,
    /// Whether a transform produced this variant
    pub transformed: bool,
}

/// An artifact that could not be resolved
#[derive(Debug)]
pub struct ResolutionFailure {
    pub id: String,
    pub error: Error,
}

/// Result of resolving one view
#[derive(Debug)]
pub struct ViewResolution {
    pub view: String,
    /// Resolved artifacts in view order
    pub artifacts: Vec<ResolvedArtifact>,
    pub failures: Vec<ResolutionFailure>,
}

impl ViewResolution {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn transformed_count(&self) -> usize {
        self.artifacts.iter().filter(|a| a.transformed).count()
    }
}

/// Resolves views against a transform registry
#[derive(Debug, Clone)]
pub struct ViewResolver {
    transforms: Arc<TransformRegistry>,
}

impl ViewResolver {
    pub fn new(transforms: Arc<TransformRegistry>) -> Self {
        Self { transforms }
    }

    /// Resolve a view by name
    ///
    /// Fails only when the view does not exist or cannot be resolved;
    /// per-artifact problems are reported in [`ViewResolution::failures`].
    pub fn resolve(&self, graph: &ArtifactGraph, view_name: &str) -> Result<ViewResolution> {
        let view = graph
            .view(view_name)
            .ok_or_else(|| Error::UnknownView(view_name.to_string()))?;
        if !view.resolvable {
            return Err(Error::UnknownView(format!("{} (not resolvable)", view_name)));
        }

        let requested = &view.attributes;
        debug!(
            "Resolving view {} with {} artifact(s), requesting {}",
            view.name,
            view.artifacts.len(),
            requested
        );

        let results: Vec<std::result::Result<ResolvedArtifact, ResolutionFailure>> = view
            .artifacts
            .par_iter()
            .map(|id| {
                self.resolve_artifact(graph, id, requested)
                    .map_err(|error| ResolutionFailure {
                        id: id.clone(),
                        error,
                    })
            })
            .collect();

        let mut artifacts = Vec::new();
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(artifact) => artifacts.push(artifact),
                Err(failure) => {
                    warn!("Failed to resolve {} for view {}: {}", failure.id, view.name, failure.error);
                    failures.push(failure);
                }
            }
        }

        let resolution = ViewResolution {
            view: view.name.clone(),
            artifacts,
            failures,
        };
        info!(
            "Resolved view {}: {} artifact(s), {} transformed, {} failed",
            resolution.view,
            resolution.artifacts.len(),
            resolution.transformed_count(),
            resolution.failures.len()
        );
        Ok(resolution)
    }

    fn resolve_artifact(
        &self,
        graph: &ArtifactGraph,
        id: &str,
        requested: &AttributeSet,
    ) -> Result<ResolvedArtifact> {
        let node = graph.artifact(id).ok_or_else(|| Error::NoMatchingVariant {
            artifact: id.to_string(),
            requested: requested.to_string(),
        })?;

        if node.attributes.satisfies(requested) {
            return Ok(ResolvedArtifact {
                id: node.id.clone(),
                path: node.path.clone(),
                attributes: node.attributes.clone(),
                transformed: false,
            });
        }

        let edge = self.edge_for(node, requested).ok_or_else(|| no_match(node, requested))?;
        let transform = self.transforms.get(&edge).ok_or_else(|| no_match(node, requested))?;

        debug!("Transforming {} via {} ({})", node.id, transform.name(), edge);
        let path = transform.transform(&node.path)?;

        let mut attributes = node.attributes.clone();
        attributes.set_java_module(edge.to);
        Ok(ResolvedArtifact {
            id: node.id.clone(),
            path,
            attributes,
            transformed: true,
        })
    }

    fn edge_for(&self, node: &ArtifactNode, requested: &AttributeSet) -> Option<TransformEdge> {
        let artifact_type = node
            .attributes
            .artifact_type()
            .or(requested.artifact_type())
            .unwrap_or(JAR_TYPE);
        let from = node.attributes.java_module().unwrap_or(Modularity::NonModular);
        let to = requested.java_module()?;
        Some(TransformEdge::new(artifact_type, from, to))
    }
}

fn no_match(node: &ArtifactNode, requested: &AttributeSet) -> Error {
    Error::NoMatchingVariant {
        artifact: format!("{} {}", node.id, node.attributes),
        requested: requested.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::classifier::{AttributeClassifier, ResolvableView};
    use crate::graph::dispatch::ArtifactTransform;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Rename {
        calls: AtomicUsize,
    }

    impl ArtifactTransform for Rename {
        fn name(&self) -> &str {
            "rename"
        }

        fn transform(&self, input: &Path) -> Result<PathBuf> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if input.to_string_lossy().contains("broken") {
                return Err(Error::malformed("broken.jar", "test failure"));
            }
            Ok(input.with_extension("module.jar"))
        }
    }

    fn classified_graph() -> ArtifactGraph {
        let mut graph = ArtifactGraph::new();
        graph.add_artifact(ArtifactNode::jar("/libs/legacy-1.0.jar"));
        graph.add_artifact(ArtifactNode::jar("/libs/broken-1.0.jar"));
        graph.add_artifact(
            ArtifactNode::jar("/libs/modular-2.0.jar")
                .with_attributes(AttributeSet::jar().with_java_module(Modularity::Modular)),
        );
        graph.add_view(
            ResolvableView::new("compileClasspath")
                .with_artifact("legacy-1.0.jar")
                .with_artifact("modular-2.0.jar"),
        );
        graph.add_view(ResolvableView::new("runtimeClasspath").with_artifact("broken-1.0.jar"));
        graph.add_view(ResolvableView::new("implementation").with_artifact("legacy-1.0.jar"));
        graph.add_view(ResolvableView::declarable("api"));
        AttributeClassifier::new().classify(&mut graph);
        graph
    }

    fn resolver() -> (ViewResolver, Arc<Rename>) {
        let rename = Arc::new(Rename {
            calls: AtomicUsize::new(0),
        });
        let mut registry = TransformRegistry::new();
        registry.register(TransformEdge::legacy_jar(), rename.clone());
        (ViewResolver::new(Arc::new(registry)), rename)
    }

    #[test]
    fn test_only_legacy_artifacts_transformed() {
        let (resolver, rename) = resolver();
        let resolution = resolver.resolve(&classified_graph(), "compileClasspath").unwrap();

        assert!(resolution.is_complete());
        assert_eq!(resolution.artifacts.len(), 2);
        assert_eq!(resolution.transformed_count(), 1);
        assert_eq!(rename.calls.load(Ordering::SeqCst), 1);

        let legacy = &resolution.artifacts[0];
        assert_eq!(legacy.id, "legacy-1.0.jar");
        assert_eq!(legacy.path, PathBuf::from("/libs/legacy-1.0.module.jar"));
        assert_eq!(legacy.attributes.java_module(), Some(Modularity::Modular));

        let modular = &resolution.artifacts[1];
        assert!(!modular.transformed);
        assert_eq!(modular.path, PathBuf::from("/libs/modular-2.0.jar"));
    }

    #[test]
    fn test_unmarked_view_never_transforms() {
        let (resolver, rename) = resolver();
        let resolution = resolver.resolve(&classified_graph(), "implementation").unwrap();
        assert_eq!(resolution.transformed_count(), 0);
        assert_eq!(rename.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_failure_is_per_artifact() {
        let (resolver, _) = resolver();
        let resolution = resolver.resolve(&classified_graph(), "runtimeClasspath").unwrap();
        assert!(!resolution.is_complete());
        assert_eq!(resolution.failures[0].id, "broken-1.0.jar");
        assert!(resolution.artifacts.is_empty());
    }

    #[test]
    fn test_missing_transform_is_no_matching_variant() {
        let resolver = ViewResolver::new(Arc::new(TransformRegistry::new()));
        let resolution = resolver.resolve(&classified_graph(), "compileClasspath").unwrap();
        assert_eq!(resolution.failures.len(), 1);
        assert!(matches!(resolution.failures[0].error, Error::NoMatchingVariant { .. }));
        // the already-modular artifact still resolves
        assert_eq!(resolution.artifacts.len(), 1);
    }

    #[test]
    fn test_unknown_and_declarable_views() {
        let (resolver, _) = resolver();
        let graph = classified_graph();
        assert!(matches!(resolver.resolve(&graph, "nope"), Err(Error::UnknownView(_))));
        assert!(matches!(resolver.resolve(&graph, "api"), Err(Error::UnknownView(_))));
    }
}
