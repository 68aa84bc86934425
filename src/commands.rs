// src/commands.rs
//! Command handlers for the legacymod CLI

use anyhow::{Context, Result, bail};
use legacymod::archive::{AUTOMATIC_MODULE_NAME, Jar, MODULE_INFO};
use legacymod::classfile::ModuleInfo;
use legacymod::descriptor::{automatic_module_name, check_dotted_name};
use legacymod::inference::infer_coordinates_with;
use legacymod::transform::TransformResult;
use legacymod::{
    ArtifactGraph, ArtifactNode, AttributeClassifier, LegacyModuleTransform, RegistryConfig,
    ResolvableView, TransformCache, TransformEdge, TransformRegistry, ViewResolver,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

fn load_config(path: Option<&Path>) -> Result<RegistryConfig> {
    match path {
        Some(path) => RegistryConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration {}", path.display())),
        None => Ok(RegistryConfig::default()),
    }
}

/// Transform a set of jars for one view
pub fn cmd_transform(
    config: Option<&Path>,
    output: &Path,
    cache_dir: Option<&Path>,
    view: &str,
    jars: &[PathBuf],
) -> Result<()> {
    let registry = Arc::new(load_config(config)?.build_registry());
    info!(
        "Loaded registry: {} module(s), {} automatic module(s)",
        registry.modules().len(),
        registry.automatic_modules().len()
    );

    let cache: TransformCache<TransformResult> = match cache_dir {
        Some(dir) => TransformCache::with_dir(dir)
            .with_context(|| format!("Failed to open cache directory {}", dir.display()))?,
        None => TransformCache::new(),
    };
    let transform = LegacyModuleTransform::new(registry, output).with_cache(Arc::new(cache));

    let mut transforms = TransformRegistry::new();
    transforms.register(TransformEdge::legacy_jar(), Arc::new(transform));

    let mut graph = ArtifactGraph::new();
    let mut selection = ResolvableView::new(view);
    for jar in jars {
        let node = ArtifactNode::jar(jar);
        selection = selection.with_artifact(node.id.clone());
        graph.add_artifact(node);
    }
    graph.add_view(selection);

    if !AttributeClassifier::requests_modules(view) {
        warn!("View {} does not request modules; jars will be left as they are", view);
    }
    AttributeClassifier::new().classify(&mut graph);

    let resolution = ViewResolver::new(Arc::new(transforms)).resolve(&graph, view)?;

    for artifact in &resolution.artifacts {
        if artifact.transformed {
            println!("{} -> {}", artifact.id, artifact.path.display());
        } else {
            println!("{} (unchanged)", artifact.id);
        }
    }
    for failure in &resolution.failures {
        eprintln!("{}: {}", failure.id, failure.error);
    }

    if !resolution.is_complete() {
        bail!(
            "{} of {} jar(s) failed to transform",
            resolution.failures.len(),
            resolution.failures.len() + resolution.artifacts.len()
        );
    }
    Ok(())
}

/// Print inferred coordinates for archive names
pub fn cmd_infer(ids: &[String], extension: &str) -> Result<()> {
    for id in ids {
        match infer_coordinates_with(id, extension) {
            Ok(coords) => println!("{}: name={} version={}", id, coords.name, coords.version),
            Err(failure) => println!("{}: unable to infer ({})", id, failure),
        }
        match automatic_module_name(id) {
            Ok(name) => println!("  automatic module name: {}", name),
            Err(reason) => println!("  no automatic module name: {}", reason),
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct InspectReport {
    archive: String,
    entries: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    marker: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    automatic_module_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    module: Option<ModuleInfo>,
    packages: Vec<String>,
}

/// Show module information for one jar
pub fn cmd_inspect(path: &Path, json: bool) -> Result<()> {
    let jar = Jar::open(path).with_context(|| format!("Failed to open {}", path.display()))?;

    let module = match jar.read(MODULE_INFO)? {
        Some(bytes) => Some(ModuleInfo::parse(&bytes)?),
        None => None,
    };
    let automatic_module_name = jar
        .manifest()?
        .and_then(|m| m.main_attribute(AUTOMATIC_MODULE_NAME).map(str::to_string));

    let report = InspectReport {
        archive: jar.name().to_string(),
        entries: jar.entries().len(),
        marker: jar.module_marker()?.map(|m| m.to_string()),
        automatic_module_name,
        module,
        packages: jar.packages().into_iter().collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Archive: {} ({} entries)", report.archive, report.entries);
    match &report.marker {
        Some(marker) => println!("Modular: yes ({})", marker),
        None => println!("Modular: no"),
    }
    if let Some(module) = &report.module {
        println!("Module: {}", module.name);
        if let Some(version) = &module.version {
            println!("  Version: {}", version);
        }
        for r in &module.requires {
            let mut modifiers = Vec::new();
            if r.is_transitive() {
                modifiers.push("transitive");
            }
            if r.is_static() {
                modifiers.push("static");
            }
            if r.is_mandated() {
                modifiers.push("mandated");
            }
            if modifiers.is_empty() {
                println!("  requires {}", r.name);
            } else {
                println!("  requires {} ({})", r.name, modifiers.join(", "));
            }
        }
        for package in &module.exports {
            println!("  exports {}", package);
        }
    }
    if !report.packages.is_empty() {
        println!("Packages:");
        for package in &report.packages {
            println!("  {}", package);
        }
    }
    Ok(())
}

/// Validate a configuration file the way a transform would use it
pub fn cmd_check_config(path: &Path) -> Result<()> {
    let config = RegistryConfig::from_file(path)
        .with_context(|| format!("Failed to load configuration {}", path.display()))?;
    let registry = config.build_registry();

    let mut problems = 0;
    for (archive, descriptor) in registry.modules() {
        if let Err(e) = registry.lookup(archive) {
            eprintln!("{}", e);
            problems += 1;
            continue;
        }
        match descriptor.finalize(archive) {
            Ok(name) => println!("{}: module {}", archive, name),
            Err(e) => {
                eprintln!("{}", e);
                problems += 1;
            }
        }
    }
    for (archive, name) in registry.automatic_modules() {
        if registry.modules().contains_key(archive) {
            continue;
        }
        if let Err(e) = registry.lookup(archive) {
            eprintln!("{}", e);
            problems += 1;
            continue;
        }
        match check_dotted_name(name) {
            Ok(()) => println!("{}: automatic module {}", archive, name),
            Err(reason) => {
                eprintln!("Invalid automatic module name '{}' for archive '{}': {}", name, archive, reason);
                problems += 1;
            }
        }
    }

    if problems > 0 {
        bail!("{} problem(s) in {}", problems, path.display());
    }
    println!(
        "Configuration OK: {} module(s), {} automatic module(s), duplicates = {}",
        registry.modules().len(),
        registry.automatic_modules().len(),
        registry.policy()
    );
    Ok(())
}
