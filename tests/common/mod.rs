// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use legacymod::archive::zip::{METHOD_STORED, ZipArchive, ZipEntry};
use legacymod::archive::MANIFEST_PATH;
use std::path::{Path, PathBuf};

/// A stored (uncompressed) entry with a non-synthetic timestamp, the way
/// a third-party build tool would have written it.
pub fn foreign_entry(name: &str, content: &[u8]) -> ZipEntry {
    ZipEntry {
        raw_name: name.as_bytes().to_vec(),
        version_made_by: 0x031E,
        version_needed: 10,
        flags: 0,
        method: METHOD_STORED,
        dos_time: 0x6C21,
        dos_date: 0x5A8F,
        crc32: crc32fast::hash(content),
        uncompressed_size: content.len() as u32,
        local_extra: vec![0xFE, 0xCA, 0x00, 0x00],
        central_extra: Vec::new(),
        comment: Vec::new(),
        internal_attributes: 0,
        external_attributes: 0o644 << 16,
        raw_data: content.to_vec(),
    }
}

/// Bytes of a typical legacy library jar: a manifest without module
/// information and a couple of classes.
pub fn legacy_jar_bytes() -> Vec<u8> {
    ZipArchive {
        entries: vec![
            foreign_entry(
                MANIFEST_PATH,
                b"Manifest-Version: 1.0\r\nCreated-By: 1.8.0_292 (Oracle)\r\n\r\n",
            ),
            foreign_entry("org/example/lib/Api.class", b"\xCA\xFE\xBA\xBE\x00\x00\x00\x34"),
            ZipEntry::deflated("org/example/lib/impl/Impl.class", b"\xCA\xFE\xBA\xBE\x00\x00\x00\x34")
                .unwrap(),
        ],
        comment: Vec::new(),
    }
    .to_bytes()
    .unwrap()
}

/// Write a jar built from `entries` into `dir`
pub fn write_jar(dir: &Path, name: &str, entries: Vec<ZipEntry>) -> PathBuf {
    let bytes = ZipArchive {
        entries,
        comment: Vec::new(),
    }
    .to_bytes()
    .unwrap();
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

/// Write the standard legacy jar under `name`
pub fn write_legacy_jar(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, legacy_jar_bytes()).unwrap();
    path
}
