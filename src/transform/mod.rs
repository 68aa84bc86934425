// src/transform/mod.rs

//! Legacy archive to module transform
//!
//! Registered for the `jar/false -> jar/true` edge. For each input archive:
//!
//! 1. Archives that already declare a module (root or versioned
//!    `module-info.class`, or an `Automatic-Module-Name`) are returned as-is.
//! 2. An explicit registry descriptor becomes a synthesized
//!    `module-info.class`.
//! 3. An automatic-module override becomes an `Automatic-Module-Name`
//!    manifest attribute.
//! 4. Otherwise the automatic name is derived from the file name.
//!
//! Rewritten archives keep every original entry byte for byte; only the
//! added or replaced entries are new, and those use a fixed timestamp.

use crate::archive::{AUTOMATIC_MODULE_NAME, Jar, Manifest};
use crate::cache::{TransformCache, cache_key, write_atomically};
use crate::classfile;
use crate::descriptor::{automatic_module_name, check_dotted_name};
use crate::error::{Error, Result};
use crate::graph::ArtifactTransform;
use crate::registry::{DescriptorRegistry, RegistryEntry};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Appended to the file stem of rewritten archives
pub const OUTPUT_SUFFIX: &str = "-module";

/// What the transform did to an archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum TransformOutcome {
    /// Already a module; returned unchanged
    PassThrough { marker: String },
    /// `module-info.class` synthesized from a registered descriptor
    Descriptor { name: String },
    /// `Automatic-Module-Name` from a registered override
    AutomaticOverride { name: String },
    /// `Automatic-Module-Name` derived from the file name
    AutomaticFromFileName { name: String },
}

impl TransformOutcome {
    /// Module name the output is known by, when the transform set one
    pub fn module_name(&self) -> Option<&str> {
        match self {
            Self::PassThrough { .. } => None,
            Self::Descriptor { name }
            | Self::AutomaticOverride { name }
            | Self::AutomaticFromFileName { name } => Some(name),
        }
    }

    pub fn is_pass_through(&self) -> bool {
        matches!(self, Self::PassThrough { .. })
    }
}

impl fmt::Display for TransformOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PassThrough { marker } => write!(f, "already modular ({})", marker),
            Self::Descriptor { name } => write!(f, "module-info.class for {}", name),
            Self::AutomaticOverride { name } => write!(f, "automatic module {} (registered)", name),
            Self::AutomaticFromFileName { name } => {
                write!(f, "automatic module {} (from file name)", name)
            }
        }
    }
}

/// Output of one transform
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransformResult {
    pub input: PathBuf,
    pub output: PathBuf,
    pub outcome: TransformOutcome,
}

/// The edit a rewrite applies
enum Edit {
    ModuleInfo { name: String, class_bytes: Vec<u8> },
    AutomaticName(TransformOutcome),
}

impl Edit {
    fn outcome(&self) -> TransformOutcome {
        match self {
            Self::ModuleInfo { name, .. } => TransformOutcome::Descriptor { name: name.clone() },
            Self::AutomaticName(outcome) => outcome.clone(),
        }
    }
}

/// Turns legacy archives into modules using a frozen registry
pub struct LegacyModuleTransform {
    registry: Arc<DescriptorRegistry>,
    output_dir: PathBuf,
    cache: Arc<TransformCache<TransformResult>>,
}

impl LegacyModuleTransform {
    pub fn new(registry: Arc<DescriptorRegistry>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            registry,
            output_dir: output_dir.into(),
            cache: Arc::new(TransformCache::new()),
        }
    }

    /// Share a cache between transforms (or reuse an on-disk one)
    pub fn with_cache(mut self, cache: Arc<TransformCache<TransformResult>>) -> Self {
        self.cache = cache;
        self
    }

    pub fn registry(&self) -> &DescriptorRegistry {
        &self.registry
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Where the rewritten form of `archive` is written
    pub fn output_path(&self, archive: &str) -> PathBuf {
        let stem = Path::new(archive)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| archive.to_string());
        self.output_dir.join(format!("{}{}.jar", stem, OUTPUT_SUFFIX))
    }

    /// Transform one archive
    pub fn apply(&self, input: &Path) -> Result<TransformResult> {
        let archive = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| input.display().to_string());

        let data = std::fs::read(input)?;
        let jar = Jar::from_bytes(archive.as_str(), &data)?;

        if let Some(marker) = jar.module_marker()? {
            info!("{} is already modular ({}), passing through", archive, marker);
            return Ok(TransformResult {
                input: input.to_path_buf(),
                output: input.to_path_buf(),
                outcome: TransformOutcome::PassThrough {
                    marker: marker.to_string(),
                },
            });
        }

        let entry = self.registry.lookup(&archive)?;
        let key = cache_key(&archive, &data, &entry.fingerprint());
        // results carry output paths, so memoize per output directory
        let slot = format!("{}:{}", key, self.output_dir.display());

        self.cache.get_or_compute(&slot, &archive, || {
            let result = self.rewrite(input, &archive, jar, entry, &key)?;
            info!("Transformed {}: {}", archive, result.outcome);
            Ok(result)
        })
    }

    fn rewrite(
        &self,
        input: &Path,
        archive: &str,
        mut jar: Jar,
        entry: RegistryEntry<'_>,
        key: &str,
    ) -> Result<TransformResult> {
        let edit = plan(archive, entry)?;
        let outcome = edit.outcome();

        let bytes = match self.cache.load(key)? {
            Some(bytes) => bytes,
            None => {
                match &edit {
                    Edit::ModuleInfo { class_bytes, .. } => jar.put_module_info(class_bytes)?,
                    Edit::AutomaticName(outcome) => {
                        let name = outcome.module_name().unwrap_or_default();
                        let mut manifest = jar.manifest()?.unwrap_or_else(Manifest::new);
                        manifest.set_main_attribute(AUTOMATIC_MODULE_NAME, name);
                        jar.put_manifest(&manifest)?;
                    }
                }
                let bytes = jar.to_bytes()?;
                self.cache.store(key, &bytes)?;
                bytes
            }
        };

        std::fs::create_dir_all(&self.output_dir)?;
        let output = self.output_path(archive);
        write_atomically(&output, &bytes)?;
        debug!("Wrote {} ({} bytes)", output.display(), bytes.len());

        Ok(TransformResult {
            input: input.to_path_buf(),
            output,
            outcome,
        })
    }
}

/// Decide what to write for an archive without touching it
fn plan(archive: &str, entry: RegistryEntry<'_>) -> Result<Edit> {
    match entry {
        RegistryEntry::Explicit(descriptor) => {
            let class_bytes = classfile::synthesize(descriptor, archive)?;
            let name = descriptor.finalize(archive)?.to_string();
            Ok(Edit::ModuleInfo { name, class_bytes })
        }
        RegistryEntry::Automatic(name) => {
            check_dotted_name(name).map_err(|reason| Error::InvalidModuleName {
                archive: archive.to_string(),
                name: name.to_string(),
                reason,
            })?;
            Ok(Edit::AutomaticName(TransformOutcome::AutomaticOverride {
                name: name.to_string(),
            }))
        }
        RegistryEntry::Unregistered => {
            let name = automatic_module_name(archive).map_err(|reason| Error::UnnameableArchive {
                archive: archive.to_string(),
                reason,
            })?;
            Ok(Edit::AutomaticName(TransformOutcome::AutomaticFromFileName { name }))
        }
    }
}

impl ArtifactTransform for LegacyModuleTransform {
    fn name(&self) -> &str {
        "legacy-module-info"
    }

    fn transform(&self, input: &Path) -> Result<PathBuf> {
        self.apply(input).map(|result| result.output)
    }
}
