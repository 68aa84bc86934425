// src/classfile/mod.rs

//! `module-info.class` codec
//!
//! Writes the smallest class file the module system accepts: version 53.0,
//! `ACC_MODULE`, no members, and a single `Module` attribute. The reader
//! goes the other way for any class file and is used for inspection.

pub mod pool;
mod reader;

use crate::descriptor::{JAVA_BASE, ModuleDescriptor, name::to_internal_form};
use crate::error::{Error, Result};
use pool::ConstantPool;
use serde::Serialize;

pub const MAGIC: u32 = 0xCAFE_BABE;
/// Java 9, the first release with modules
pub const MAJOR_VERSION: u16 = 53;
pub const MINOR_VERSION: u16 = 0;

pub const ACC_MODULE: u16 = 0x8000;
pub const ACC_TRANSITIVE: u16 = 0x0020;
pub const ACC_STATIC_PHASE: u16 = 0x0040;
pub const ACC_MANDATED: u16 = 0x8000;

const MODULE_INFO_CLASS: &str = "module-info";
const MODULE_ATTRIBUTE: &str = "Module";

/// One `requires` entry of a `Module` attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleRequire {
    pub name: String,
    pub flags: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl ModuleRequire {
    pub fn is_transitive(&self) -> bool {
        self.flags & ACC_TRANSITIVE != 0
    }

    pub fn is_static(&self) -> bool {
        self.flags & ACC_STATIC_PHASE != 0
    }

    pub fn is_mandated(&self) -> bool {
        self.flags & ACC_MANDATED != 0
    }
}

/// Contents of a `Module` attribute
///
/// Exports are held in dotted form; the class file stores them with
/// slashes. Opens, uses and provides are not modelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleInfo {
    pub name: String,
    pub flags: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub requires: Vec<ModuleRequire>,
    pub exports: Vec<String>,
}

impl ModuleInfo {
    /// Build the attribute for a finalized descriptor
    ///
    /// `java.base` comes first, mandated, unless the descriptor lists it.
    pub fn from_descriptor(descriptor: &ModuleDescriptor, name: &str) -> Self {
        let mut requires = Vec::with_capacity(descriptor.requires().len() + 1);
        if !descriptor.requires().iter().any(|r| r.name == JAVA_BASE) {
            requires.push(ModuleRequire {
                name: JAVA_BASE.to_string(),
                flags: ACC_MANDATED,
                version: None,
            });
        }
        for r in descriptor.requires() {
            let mut flags = 0;
            if r.transitive {
                flags |= ACC_TRANSITIVE;
            }
            if r.optional {
                flags |= ACC_STATIC_PHASE;
            }
            requires.push(ModuleRequire {
                name: r.name.clone(),
                flags,
                version: None,
            });
        }

        Self {
            name: name.to_string(),
            flags: 0,
            version: descriptor.version().map(str::to_string),
            requires,
            exports: descriptor.exports().iter().cloned().collect(),
        }
    }

    /// Encode as a complete class file
    pub fn to_class_bytes(&self) -> Result<Vec<u8>> {
        let mut pool = ConstantPool::new();
        let this_class = pool.class(MODULE_INFO_CLASS)?;
        let attribute_name = pool.utf8(MODULE_ATTRIBUTE)?;

        let mut attribute = Vec::new();
        put_u16(&mut attribute, pool.module(&self.name)?);
        put_u16(&mut attribute, self.flags);
        put_u16(&mut attribute, optional_utf8(&mut pool, self.version.as_deref())?);

        put_u16(&mut attribute, to_u16(self.requires.len(), "requires")?);
        for r in &self.requires {
            put_u16(&mut attribute, pool.module(&r.name)?);
            put_u16(&mut attribute, r.flags);
            put_u16(&mut attribute, optional_utf8(&mut pool, r.version.as_deref())?);
        }

        put_u16(&mut attribute, to_u16(self.exports.len(), "exports")?);
        for package in &self.exports {
            put_u16(&mut attribute, pool.package(&to_internal_form(package))?);
            put_u16(&mut attribute, 0); // exports_flags
            put_u16(&mut attribute, 0); // exports_to_count
        }

        put_u16(&mut attribute, 0); // opens_count
        put_u16(&mut attribute, 0); // uses_count
        put_u16(&mut attribute, 0); // provides_count

        let pool_count = to_u16(pool.count(), "constant pool")?;

        let mut out = Vec::with_capacity(64 + attribute.len());
        out.extend_from_slice(&MAGIC.to_be_bytes());
        put_u16(&mut out, MINOR_VERSION);
        put_u16(&mut out, MAJOR_VERSION);
        put_u16(&mut out, pool_count);
        pool.write(&mut out);
        put_u16(&mut out, ACC_MODULE);
        put_u16(&mut out, this_class);
        put_u16(&mut out, 0); // super_class
        put_u16(&mut out, 0); // interfaces_count
        put_u16(&mut out, 0); // fields_count
        put_u16(&mut out, 0); // methods_count
        put_u16(&mut out, 1); // attributes_count
        put_u16(&mut out, attribute_name);
        let attribute_len = u32::try_from(attribute.len())
            .map_err(|_| Error::MalformedClassFile("Module attribute too large".to_string()))?;
        out.extend_from_slice(&attribute_len.to_be_bytes());
        out.extend_from_slice(&attribute);
        Ok(out)
    }

    /// Recover the `Module` attribute from a class file
    pub fn parse(data: &[u8]) -> Result<Self> {
        reader::parse_module_info(data)
    }
}

/// Synthesize `module-info.class` for a descriptor
///
/// Fails when the descriptor has no usable name or carries invalid
/// module or package names.
pub fn synthesize(descriptor: &ModuleDescriptor, archive: &str) -> Result<Vec<u8>> {
    let name = descriptor.finalize(archive)?;
    ModuleInfo::from_descriptor(descriptor, name).to_class_bytes()
}

fn put_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_be_bytes());
}

/// Pool index of an optional string; 0 when absent
fn optional_utf8(pool: &mut ConstantPool, value: Option<&str>) -> Result<u16> {
    value.map_or(Ok(0), |v| pool.utf8(v))
}

fn to_u16(value: usize, what: &str) -> Result<u16> {
    u16::try_from(value).map_err(|_| Error::MalformedClassFile(format!("too many {} entries", what)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_descriptor() -> ModuleDescriptor {
        let mut descriptor =
            ModuleDescriptor::new(Some("org.apache.commons.cli".into()), Some("1.4".into()));
        descriptor
            .exports_package("org.apache.commons.cli")
            .requires_transitive("java.sql")
            .requires_static("java.desktop");
        descriptor
    }

    #[test]
    fn test_header() {
        let bytes = synthesize(&sample_descriptor(), "commons-cli-1.4.jar").unwrap();
        assert_eq!(&bytes[0..4], &[0xCA, 0xFE, 0xBA, 0xBE]);
        assert_eq!(u16::from_be_bytes([bytes[4], bytes[5]]), 0);
        assert_eq!(u16::from_be_bytes([bytes[6], bytes[7]]), 53);
    }

    #[test]
    fn test_synthesized_parses_back() {
        let bytes = synthesize(&sample_descriptor(), "commons-cli-1.4.jar").unwrap();
        let info = ModuleInfo::parse(&bytes).unwrap();

        assert_eq!(info.name, "org.apache.commons.cli");
        assert_eq!(info.version.as_deref(), Some("1.4"));
        assert_eq!(info.exports, vec!["org.apache.commons.cli"]);

        let names: Vec<_> = info.requires.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["java.base", "java.sql", "java.desktop"]);
        assert!(info.requires[0].is_mandated());
        assert!(info.requires[1].is_transitive());
        assert!(!info.requires[1].is_static());
        assert!(info.requires[2].is_static());
    }

    #[test]
    fn test_explicit_java_base_not_duplicated() {
        let mut descriptor = ModuleDescriptor::new(Some("m".into()), None);
        descriptor.requires_module("java.logging").requires_module(JAVA_BASE);
        let info = ModuleInfo::from_descriptor(&descriptor, "m");
        let names: Vec<_> = info.requires.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["java.logging", "java.base"]);
        assert!(!info.requires[1].is_mandated());
    }

    #[test]
    fn test_no_version() {
        let descriptor = ModuleDescriptor::new(Some("m".into()), None);
        let info = ModuleInfo::parse(&synthesize(&descriptor, "m.jar").unwrap()).unwrap();
        assert_eq!(info.version, None);
        assert!(info.exports.is_empty());
    }

    #[test]
    fn test_deterministic() {
        let a = synthesize(&sample_descriptor(), "x.jar").unwrap();
        let b = synthesize(&sample_descriptor(), "x.jar").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_exports_use_internal_form() {
        let bytes = synthesize(&sample_descriptor(), "x.jar").unwrap();
        let needle = b"org/apache/commons/cli";
        assert!(bytes.windows(needle.len()).any(|w| w == needle));
    }

    #[test]
    fn test_unnamed_descriptor_rejected() {
        let err = synthesize(&ModuleDescriptor::default(), "plain.jar").unwrap_err();
        assert!(matches!(err, Error::MissingModuleName { .. }));
    }

    #[test]
    fn test_oversized_version_rejected() {
        let descriptor = ModuleDescriptor::new(Some("m".into()), Some("1".repeat(70_000)));
        let err = synthesize(&descriptor, "m.jar").unwrap_err();
        assert!(matches!(err, Error::MalformedClassFile(ref reason) if reason.contains("limit")));
    }
}
