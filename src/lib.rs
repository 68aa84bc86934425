// src/lib.rs

//! Legacy module retrofitting
//!
//! Turns plain library jars into modules so they can take part in a
//! name-based module graph. Each legacy archive either gets a synthesized
//! `module-info.class` (when module metadata is registered for it) or an
//! `Automatic-Module-Name` manifest attribute.
//!
//! # Architecture
//!
//! - Registry: archive file name -> module descriptor or automatic name,
//!   built once and frozen
//! - Inference: name and version guessed from `<name>-<version>.jar`
//! - Graph: artifacts and views carry attributes; views that feed the
//!   compiler request modules, and legacy jars are routed through the
//!   transform registered for the `jar/false -> jar/true` edge
//! - Transform: deterministic rewrite that keeps original entries
//!   byte-for-byte, with a content-addressed cache in front

pub mod archive;
pub mod cache;
pub mod classfile;
pub mod config;
pub mod descriptor;
mod error;
pub mod graph;
pub mod inference;
pub mod registry;
pub mod transform;

pub use cache::TransformCache;
pub use config::RegistryConfig;
pub use descriptor::{ModuleDescriptor, Requirement};
pub use error::{Error, Result};
pub use graph::{
    ArtifactGraph, ArtifactNode, ArtifactTransform, AttributeClassifier, AttributeSet,
    Modularity, ResolvableView, TransformEdge, TransformRegistry, ViewResolver,
};
pub use inference::{InferenceFailure, InferredCoordinates, infer_coordinates};
pub use registry::{DescriptorRegistry, DuplicatePolicy, RegistryBuilder, RegistryEntry};
pub use transform::{LegacyModuleTransform, TransformOutcome, TransformResult};
