// src/graph/mod.rs

//! Dependency graph attribute contract
//!
//! Artifacts and views carry an [`AttributeSet`]. The classifier marks them,
//! the dispatch table maps attribute edges to transforms, and the resolver
//! runs whichever transforms a view needs.

pub mod attributes;
pub mod classifier;
pub mod dispatch;
pub mod resolve;

pub use attributes::{ARTIFACT_TYPE, AttributeSet, JAR_TYPE, JAVA_MODULE, Modularity};
pub use classifier::{
    ArtifactGraph, ArtifactNode, AttributeClassifier, ClassificationSummary, ResolvableView,
};
pub use dispatch::{ArtifactTransform, TransformEdge, TransformRegistry};
pub use resolve::{ResolutionFailure, ResolvedArtifact, ViewResolution, ViewResolver};
