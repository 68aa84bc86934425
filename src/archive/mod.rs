// src/archive/mod.rs

//! JAR archive access
//!
//! `Jar` wraps a parsed zip container with the JAR-specific questions the
//! transform asks: does it already declare a module, and what does its
//! manifest say.

pub mod manifest;
pub mod zip;

pub use manifest::{AUTOMATIC_MODULE_NAME, MANIFEST_PATH, Manifest};
pub use zip::{ZipArchive, ZipEntry, ZipError};

use crate::error::{Error, Result};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

pub const MODULE_INFO: &str = "module-info.class";
const VERSIONS_PREFIX: &str = "META-INF/versions/";

/// Evidence that an archive is already a module
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleMarker {
    /// `module-info.class` at the root
    ModuleInfo,
    /// `META-INF/versions/<release>/module-info.class`
    VersionedModuleInfo(u32),
    /// `Automatic-Module-Name` in the main manifest section
    AutomaticModuleName(String),
}

impl fmt::Display for ModuleMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ModuleInfo => write!(f, "{}", MODULE_INFO),
            Self::VersionedModuleInfo(release) => {
                write!(f, "{}{}/{}", VERSIONS_PREFIX, release, MODULE_INFO)
            }
            Self::AutomaticModuleName(name) => write!(f, "{}: {}", AUTOMATIC_MODULE_NAME, name),
        }
    }
}

/// A JAR held in memory
#[derive(Debug, Clone)]
pub struct Jar {
    name: String,
    zip: ZipArchive,
}

impl Jar {
    /// Read and parse an archive from disk
    pub fn open(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let data = std::fs::read(path)?;
        Self::from_bytes(name, &data)
    }

    /// Parse an archive; `name` is its identifier, used in errors
    pub fn from_bytes(name: impl Into<String>, data: &[u8]) -> Result<Self> {
        let name = name.into();
        let zip = ZipArchive::parse(data).map_err(|e| zip_error(&name, e))?;
        Ok(Self { name, zip })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entries(&self) -> &[ZipEntry] {
        &self.zip.entries
    }

    /// Decompressed contents of an entry, if present
    pub fn read(&self, entry: &str) -> Result<Option<Vec<u8>>> {
        match self.zip.entry(entry) {
            Some(e) => e.contents().map(Some).map_err(|err| zip_error(&self.name, err)),
            None => Ok(None),
        }
    }

    /// The manifest, if the archive has one
    pub fn manifest(&self) -> Result<Option<Manifest>> {
        Ok(self.read(MANIFEST_PATH)?.map(|data| Manifest::parse(&data)))
    }

    /// First module marker found, checking the root descriptor, then
    /// versioned descriptors, then the manifest
    pub fn module_marker(&self) -> Result<Option<ModuleMarker>> {
        if self.zip.entry(MODULE_INFO).is_some() {
            return Ok(Some(ModuleMarker::ModuleInfo));
        }

        let versioned = self
            .zip
            .entries
            .iter()
            .filter_map(|e| versioned_release(&e.name()))
            .min();
        if let Some(release) = versioned {
            return Ok(Some(ModuleMarker::VersionedModuleInfo(release)));
        }

        let automatic = self
            .manifest()?
            .and_then(|m| m.main_attribute(AUTOMATIC_MODULE_NAME).map(|v| v.trim().to_string()))
            .filter(|v| !v.is_empty());
        Ok(automatic.map(ModuleMarker::AutomaticModuleName))
    }

    /// Packages that contain at least one class, dotted and sorted
    pub fn packages(&self) -> BTreeSet<String> {
        self.zip
            .entries
            .iter()
            .map(|e| e.name())
            .filter(|n| n.ends_with(".class") && !n.starts_with("META-INF/"))
            .filter_map(|n| n.rsplit_once('/').map(|(dir, _)| dir.replace('/', ".")))
            .collect()
    }

    /// Add or replace the root `module-info.class`
    pub fn put_module_info(&mut self, class_bytes: &[u8]) -> Result<()> {
        let entry = ZipEntry::deflated(MODULE_INFO, class_bytes).map_err(|e| zip_error(&self.name, e))?;
        self.zip.upsert(entry);
        Ok(())
    }

    /// Write `manifest`, replacing an existing one in place or inserting it
    /// as the first entry
    pub fn put_manifest(&mut self, manifest: &Manifest) -> Result<()> {
        let entry = ZipEntry::deflated(MANIFEST_PATH, &manifest.to_bytes())
            .map_err(|e| zip_error(&self.name, e))?;
        match self.zip.position(MANIFEST_PATH) {
            Some(index) => self.zip.entries[index] = entry,
            None => self.zip.entries.insert(0, entry),
        }
        Ok(())
    }

    /// Serialize the archive
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.zip.to_bytes().map_err(|e| zip_error(&self.name, e))
    }
}

fn versioned_release(entry: &str) -> Option<u32> {
    let rest = entry.strip_prefix(VERSIONS_PREFIX)?;
    let (release, file) = rest.split_once('/')?;
    if file != MODULE_INFO {
        return None;
    }
    release.parse().ok()
}

fn zip_error(archive: &str, err: ZipError) -> Error {
    match err {
        ZipError::Io(e) => Error::Io(e),
        e if e.is_unsupported() => Error::UnsupportedArchive {
            archive: archive.to_string(),
            reason: e.to_string(),
        },
        e => Error::malformed(archive, e.to_string()),
    }
}
