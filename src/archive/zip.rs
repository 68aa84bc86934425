// src/archive/zip.rs

//! Minimal zip container codec for JAR files
//!
//! Reads the central directory and keeps every entry's compressed bytes
//! as-is, so an archive can be rewritten with entries added or replaced
//! without recompressing (and therefore without changing) the rest.
//! Output is fully determined by the entry list: no clocks, no host data.
//!
//! ZIP64 and multi-disk archives are rejected.

use flate2::Compression;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use std::io::{Read, Write};
use thiserror::Error;

const LOCAL_HEADER_SIG: u32 = 0x0403_4b50;
const CENTRAL_HEADER_SIG: u32 = 0x0201_4b50;
const EOCD_SIG: u32 = 0x0605_4b50;
const ZIP64_LOCATOR_SIG: u32 = 0x0706_4b50;

const LOCAL_HEADER_LEN: usize = 30;
const CENTRAL_HEADER_LEN: usize = 46;
const EOCD_LEN: usize = 22;
const ZIP64_LOCATOR_LEN: usize = 20;
const MAX_COMMENT_LEN: usize = 0xFFFF;

pub const METHOD_STORED: u16 = 0;
pub const METHOD_DEFLATED: u16 = 8;

const FLAG_ENCRYPTED: u16 = 0x0001;
const FLAG_DATA_DESCRIPTOR: u16 = 0x0008;
const FLAG_UTF8: u16 = 0x0800;

/// "Version needed to extract" for deflated entries (2.0)
const VERSION_DEFLATE: u16 = 20;
/// "Version needed to extract" for stored entries and directories (1.0)
const VERSION_STORED: u16 = 10;

/// MS-DOS directory attribute
const DOS_DIRECTORY_ATTR: u32 = 0x10;

/// DOS date for synthesized entries: 1980-02-01
pub const FIXED_DOS_DATE: u16 = (2 << 5) | 1;
/// DOS time for synthesized entries: 00:00:00
pub const FIXED_DOS_TIME: u16 = 0;

/// Compression level for synthesized entries
const DEFLATE_LEVEL: u32 = 6;

#[derive(Error, Debug)]
pub enum ZipError {
    #[error("archive is truncated at offset {0}")]
    Truncated(usize),

    #[error("end of central directory record not found")]
    NoCentralDirectory,

    #[error("bad signature {found:#010x} at offset {offset}")]
    BadSignature { offset: usize, found: u32 },

    #[error("ZIP64 archives are not supported")]
    Zip64,

    #[error("multi-disk archives are not supported")]
    MultiDisk,

    #[error("entry '{name}' is encrypted")]
    Encrypted { name: String },

    #[error("entry '{name}' uses unsupported compression method {method}")]
    UnsupportedMethod { name: String, method: u16 },

    #[error("entry '{name}' is corrupt: {reason}")]
    CorruptEntry { name: String, reason: String },

    #[error("archive too large for a non-ZIP64 container: {0}")]
    TooLarge(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ZipError {
    /// Whether the error is about an unsupported feature rather than corruption
    pub fn is_unsupported(&self) -> bool {
        matches!(
            self,
            Self::Zip64 | Self::MultiDisk | Self::Encrypted { .. } | Self::UnsupportedMethod { .. }
        )
    }
}

fn le_u16(data: &[u8], at: usize) -> Result<u16, ZipError> {
    data.get(at..at + 2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
        .ok_or(ZipError::Truncated(at))
}

fn le_u32(data: &[u8], at: usize) -> Result<u32, ZipError> {
    data.get(at..at + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or(ZipError::Truncated(at))
}

fn slice(data: &[u8], at: usize, len: usize) -> Result<&[u8], ZipError> {
    let end = at.checked_add(len).ok_or(ZipError::Truncated(at))?;
    data.get(at..end).ok_or(ZipError::Truncated(at))
}

/// One entry of a zip archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZipEntry {
    /// Entry name bytes exactly as stored
    pub raw_name: Vec<u8>,
    pub version_made_by: u16,
    pub version_needed: u16,
    pub flags: u16,
    pub method: u16,
    pub dos_time: u16,
    pub dos_date: u16,
    pub crc32: u32,
    pub uncompressed_size: u32,
    pub local_extra: Vec<u8>,
    pub central_extra: Vec<u8>,
    pub comment: Vec<u8>,
    pub internal_attributes: u16,
    pub external_attributes: u32,
    /// Compressed data exactly as stored
    pub raw_data: Vec<u8>,
}

impl ZipEntry {
    /// Create a deflated file entry with the fixed synthesized timestamp
    pub fn deflated(name: &str, content: &[u8]) -> Result<Self, ZipError> {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::new(DEFLATE_LEVEL));
        encoder.write_all(content)?;
        let raw_data = encoder.finish()?;

        Ok(Self {
            raw_name: name.as_bytes().to_vec(),
            version_made_by: VERSION_DEFLATE,
            version_needed: VERSION_DEFLATE,
            flags: utf8_flag(name),
            method: METHOD_DEFLATED,
            dos_time: FIXED_DOS_TIME,
            dos_date: FIXED_DOS_DATE,
            crc32: crc32fast::hash(content),
            uncompressed_size: u32::try_from(content.len())
                .map_err(|_| ZipError::TooLarge(name.to_string()))?,
            local_extra: Vec::new(),
            central_extra: Vec::new(),
            comment: Vec::new(),
            internal_attributes: 0,
            external_attributes: 0,
            raw_data,
        })
    }

    /// Create a directory entry with the fixed synthesized timestamp
    pub fn directory(name: &str) -> Self {
        let name = if name.ends_with('/') {
            name.to_string()
        } else {
            format!("{}/", name)
        };
        Self {
            flags: utf8_flag(&name),
            raw_name: name.into_bytes(),
            version_made_by: VERSION_DEFLATE,
            version_needed: VERSION_STORED,
            method: METHOD_STORED,
            dos_time: FIXED_DOS_TIME,
            dos_date: FIXED_DOS_DATE,
            crc32: 0,
            uncompressed_size: 0,
            local_extra: Vec::new(),
            central_extra: Vec::new(),
            comment: Vec::new(),
            internal_attributes: 0,
            external_attributes: DOS_DIRECTORY_ATTR,
            raw_data: Vec::new(),
        }
    }

    /// Entry name, lossily decoded
    pub fn name(&self) -> String {
        String::from_utf8_lossy(&self.raw_name).into_owned()
    }

    pub fn is_dir(&self) -> bool {
        self.raw_name.last() == Some(&b'/')
    }

    pub fn compressed_size(&self) -> usize {
        self.raw_data.len()
    }

    /// Decompress the entry and verify its CRC-32
    pub fn contents(&self) -> Result<Vec<u8>, ZipError> {
        if self.flags & FLAG_ENCRYPTED != 0 {
            return Err(ZipError::Encrypted { name: self.name() });
        }

        let data = match self.method {
            METHOD_STORED => self.raw_data.clone(),
            METHOD_DEFLATED => {
                // header sizes are untrusted until the CRC check below
                let declared = self.uncompressed_size as usize;
                let mut out = Vec::with_capacity(declared.min(self.raw_data.len().saturating_mul(4)));
                DeflateDecoder::new(self.raw_data.as_slice())
                    .take(self.uncompressed_size as u64 + 1)
                    .read_to_end(&mut out)
                    .map_err(|e| ZipError::CorruptEntry {
                        name: self.name(),
                        reason: e.to_string(),
                    })?;
                out
            }
            method => {
                return Err(ZipError::UnsupportedMethod {
                    name: self.name(),
                    method,
                });
            }
        };

        if data.len() != self.uncompressed_size as usize {
            return Err(ZipError::CorruptEntry {
                name: self.name(),
                reason: format!(
                    "expected {} bytes, inflated {}",
                    self.uncompressed_size,
                    data.len()
                ),
            });
        }
        if crc32fast::hash(&data) != self.crc32 {
            return Err(ZipError::CorruptEntry {
                name: self.name(),
                reason: "CRC-32 mismatch".to_string(),
            });
        }
        Ok(data)
    }
}

fn utf8_flag(name: &str) -> u16 {
    if name.is_ascii() { 0 } else { FLAG_UTF8 }
}

/// A parsed zip archive
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZipArchive {
    pub entries: Vec<ZipEntry>,
    pub comment: Vec<u8>,
}

impl ZipArchive {
    /// Parse an archive held in memory
    pub fn parse(data: &[u8]) -> Result<Self, ZipError> {
        let eocd = find_eocd(data)?;

        if eocd >= ZIP64_LOCATOR_LEN && le_u32(data, eocd - ZIP64_LOCATOR_LEN)? == ZIP64_LOCATOR_SIG {
            return Err(ZipError::Zip64);
        }

        let disk = le_u16(data, eocd + 4)?;
        let cd_disk = le_u16(data, eocd + 6)?;
        let disk_entries = le_u16(data, eocd + 8)?;
        let total_entries = le_u16(data, eocd + 10)?;
        let cd_size = le_u32(data, eocd + 12)?;
        let cd_offset = le_u32(data, eocd + 16)?;
        let comment_len = le_u16(data, eocd + 20)? as usize;

        if total_entries == 0xFFFF || cd_size == u32::MAX || cd_offset == u32::MAX {
            return Err(ZipError::Zip64);
        }
        if disk != 0 || cd_disk != 0 || disk_entries != total_entries {
            return Err(ZipError::MultiDisk);
        }

        let comment = slice(data, eocd + EOCD_LEN, comment_len)?.to_vec();

        let mut entries = Vec::with_capacity(total_entries as usize);
        let mut pos = cd_offset as usize;
        for _ in 0..total_entries {
            let (entry, next) = read_central_entry(data, pos)?;
            entries.push(entry);
            pos = next;
        }

        Ok(Self { entries, comment })
    }

    /// Find an entry by exact name
    pub fn entry(&self, name: &str) -> Option<&ZipEntry> {
        self.entries.iter().find(|e| e.raw_name == name.as_bytes())
    }

    /// Index of an entry by exact name
    pub fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.raw_name == name.as_bytes())
    }

    /// Replace an entry with the same name in place, or append it
    pub fn upsert(&mut self, entry: ZipEntry) {
        match self.entries.iter().position(|e| e.raw_name == entry.raw_name) {
            Some(index) => self.entries[index] = entry,
            None => self.entries.push(entry),
        }
    }

    /// Serialize the archive
    pub fn to_bytes(&self) -> Result<Vec<u8>, ZipError> {
        let entry_count = u16::try_from(self.entries.len())
            .ok()
            .filter(|n| *n != 0xFFFF)
            .ok_or_else(|| ZipError::TooLarge(format!("{} entries", self.entries.len())))?;

        let mut out = Vec::new();
        let mut offsets = Vec::with_capacity(self.entries.len());

        for entry in &self.entries {
            offsets.push(to_u32(out.len(), "local header offset")?);
            write_local_header(&mut out, entry)?;
            out.extend_from_slice(&entry.raw_data);
        }

        let cd_offset = to_u32(out.len(), "central directory offset")?;
        for (entry, offset) in self.entries.iter().zip(offsets) {
            write_central_header(&mut out, entry, offset)?;
        }
        let cd_size = to_u32(out.len() - cd_offset as usize, "central directory size")?;

        put_u32(&mut out, EOCD_SIG);
        put_u16(&mut out, 0);
        put_u16(&mut out, 0);
        put_u16(&mut out, entry_count);
        put_u16(&mut out, entry_count);
        put_u32(&mut out, cd_size);
        put_u32(&mut out, cd_offset);
        put_u16(&mut out, to_u16(self.comment.len(), "archive comment")?);
        out.extend_from_slice(&self.comment);

        Ok(out)
    }
}

fn find_eocd(data: &[u8]) -> Result<usize, ZipError> {
    if data.len() < EOCD_LEN {
        return Err(ZipError::NoCentralDirectory);
    }

    let last = data.len() - EOCD_LEN;
    let first = last.saturating_sub(MAX_COMMENT_LEN);
    let mut fallback = None;

    for pos in (first..=last).rev() {
        if le_u32(data, pos)? != EOCD_SIG {
            continue;
        }
        let comment_len = le_u16(data, pos + 20)? as usize;
        if pos + EOCD_LEN + comment_len == data.len() {
            return Ok(pos);
        }
        if fallback.is_none() {
            fallback = Some(pos);
        }
    }

    fallback.ok_or(ZipError::NoCentralDirectory)
}

fn read_central_entry(data: &[u8], pos: usize) -> Result<(ZipEntry, usize), ZipError> {
    let sig = le_u32(data, pos)?;
    if sig != CENTRAL_HEADER_SIG {
        return Err(ZipError::BadSignature { offset: pos, found: sig });
    }

    let version_made_by = le_u16(data, pos + 4)?;
    let version_needed = le_u16(data, pos + 6)?;
    let flags = le_u16(data, pos + 8)?;
    let method = le_u16(data, pos + 10)?;
    let dos_time = le_u16(data, pos + 12)?;
    let dos_date = le_u16(data, pos + 14)?;
    let crc32 = le_u32(data, pos + 16)?;
    let compressed_size = le_u32(data, pos + 20)?;
    let uncompressed_size = le_u32(data, pos + 24)?;
    let name_len = le_u16(data, pos + 28)? as usize;
    let extra_len = le_u16(data, pos + 30)? as usize;
    let comment_len = le_u16(data, pos + 32)? as usize;
    let disk_start = le_u16(data, pos + 34)?;
    let internal_attributes = le_u16(data, pos + 36)?;
    let external_attributes = le_u32(data, pos + 38)?;
    let local_offset = le_u32(data, pos + 42)?;

    if compressed_size == u32::MAX || uncompressed_size == u32::MAX || local_offset == u32::MAX {
        return Err(ZipError::Zip64);
    }
    if disk_start != 0 {
        return Err(ZipError::MultiDisk);
    }

    let mut at = pos + CENTRAL_HEADER_LEN;
    let raw_name = slice(data, at, name_len)?.to_vec();
    at += name_len;
    let central_extra = slice(data, at, extra_len)?.to_vec();
    at += extra_len;
    let comment = slice(data, at, comment_len)?.to_vec();
    at += comment_len;

    let local = local_offset as usize;
    let local_sig = le_u32(data, local)?;
    if local_sig != LOCAL_HEADER_SIG {
        return Err(ZipError::BadSignature {
            offset: local,
            found: local_sig,
        });
    }
    let local_name_len = le_u16(data, local + 26)? as usize;
    let local_extra_len = le_u16(data, local + 28)? as usize;
    let local_extra = slice(data, local + LOCAL_HEADER_LEN + local_name_len, local_extra_len)?.to_vec();
    let data_start = local + LOCAL_HEADER_LEN + local_name_len + local_extra_len;
    let raw_data = slice(data, data_start, compressed_size as usize)?.to_vec();

    let entry = ZipEntry {
        raw_name,
        version_made_by,
        version_needed,
        flags,
        method,
        dos_time,
        dos_date,
        crc32,
        uncompressed_size,
        local_extra,
        central_extra,
        comment,
        internal_attributes,
        external_attributes,
        raw_data,
    };
    Ok((entry, at))
}

fn write_local_header(out: &mut Vec<u8>, entry: &ZipEntry) -> Result<(), ZipError> {
    let name = entry.name();
    put_u32(out, LOCAL_HEADER_SIG);
    put_u16(out, entry.version_needed);
    // sizes are always written inline
    put_u16(out, entry.flags & !FLAG_DATA_DESCRIPTOR);
    put_u16(out, entry.method);
    put_u16(out, entry.dos_time);
    put_u16(out, entry.dos_date);
    put_u32(out, entry.crc32);
    put_u32(out, to_u32(entry.raw_data.len(), &name)?);
    put_u32(out, entry.uncompressed_size);
    put_u16(out, to_u16(entry.raw_name.len(), &name)?);
    put_u16(out, to_u16(entry.local_extra.len(), &name)?);
    out.extend_from_slice(&entry.raw_name);
    out.extend_from_slice(&entry.local_extra);
    Ok(())
}

fn write_central_header(out: &mut Vec<u8>, entry: &ZipEntry, offset: u32) -> Result<(), ZipError> {
    let name = entry.name();
    put_u32(out, CENTRAL_HEADER_SIG);
    put_u16(out, entry.version_made_by);
    put_u16(out, entry.version_needed);
    put_u16(out, entry.flags & !FLAG_DATA_DESCRIPTOR);
    put_u16(out, entry.method);
    put_u16(out, entry.dos_time);
    put_u16(out, entry.dos_date);
    put_u32(out, entry.crc32);
    put_u32(out, to_u32(entry.raw_data.len(), &name)?);
    put_u32(out, entry.uncompressed_size);
    put_u16(out, to_u16(entry.raw_name.len(), &name)?);
    put_u16(out, to_u16(entry.central_extra.len(), &name)?);
    put_u16(out, to_u16(entry.comment.len(), &name)?);
    put_u16(out, 0);
    put_u16(out, entry.internal_attributes);
    put_u32(out, entry.external_attributes);
    put_u32(out, offset);
    out.extend_from_slice(&entry.raw_name);
    out.extend_from_slice(&entry.central_extra);
    out.extend_from_slice(&entry.comment);
    Ok(())
}

fn put_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn put_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn to_u16(value: usize, what: &str) -> Result<u16, ZipError> {
    u16::try_from(value).map_err(|_| ZipError::TooLarge(what.to_string()))
}

fn to_u32(value: usize, what: &str) -> Result<u32, ZipError> {
    u32::try_from(value)
        .ok()
        .filter(|v| *v != u32::MAX)
        .ok_or_else(|| ZipError::TooLarge(what.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_archive() -> ZipArchive {
        ZipArchive {
            entries: vec![
                ZipEntry::directory("META-INF"),
                ZipEntry::deflated("META-INF/MANIFEST.MF", b"Manifest-Version: 1.0\r\n\r\n").unwrap(),
                ZipEntry::deflated("com/example/Foo.class", &[0xCA, 0xFE, 0xBA, 0xBE, 0, 0, 0, 52])
                    .unwrap(),
            ],
            comment: b"built for tests".to_vec(),
        }
    }

    #[test]
    fn test_write_then_parse() {
        let archive = sample_archive();
        let bytes = archive.to_bytes().unwrap();
        let parsed = ZipArchive::parse(&bytes).unwrap();

        assert_eq!(parsed, archive);
        assert!(parsed.entries[0].is_dir());
        assert_eq!(parsed.entry("META-INF/MANIFEST.MF").unwrap().contents().unwrap(),
            b"Manifest-Version: 1.0\r\n\r\n");
    }

    #[test]
    fn test_output_is_deterministic() {
        let a = sample_archive().to_bytes().unwrap();
        let b = sample_archive().to_bytes().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_reserialize_is_identity() {
        let bytes = sample_archive().to_bytes().unwrap();
        let again = ZipArchive::parse(&bytes).unwrap().to_bytes().unwrap();
        assert_eq!(bytes, again);
    }

    #[test]
    fn test_stored_entry_contents() {
        let content = b"plain text".to_vec();
        let entry = ZipEntry {
            method: METHOD_STORED,
            crc32: crc32fast::hash(&content),
            uncompressed_size: content.len() as u32,
            raw_data: content.clone(),
            ..ZipEntry::directory("ignored")
        };
        assert_eq!(entry.contents().unwrap(), content);
    }

    #[test]
    fn test_inflate_stops_past_declared_size() {
        let mut entry = ZipEntry::deflated("bomb.bin", &vec![0u8; 1 << 20]).unwrap();
        entry.uncompressed_size = 16;
        match entry.contents() {
            Err(ZipError::CorruptEntry { reason, .. }) => {
                assert!(reason.contains("expected 16 bytes, inflated 17"), "{}", reason)
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_huge_declared_size_is_an_error() {
        let mut entry = ZipEntry::deflated("a.txt", b"hello").unwrap();
        entry.uncompressed_size = u32::MAX;
        assert!(matches!(entry.contents(), Err(ZipError::CorruptEntry { .. })));
    }

    #[test]
    fn test_crc_mismatch_detected() {
        let mut entry = ZipEntry::deflated("a.txt", b"hello").unwrap();
        entry.crc32 ^= 1;
        assert!(matches!(entry.contents(), Err(ZipError::CorruptEntry { .. })));
    }

    #[test]
    fn test_encrypted_entry_rejected() {
        let mut entry = ZipEntry::deflated("a.txt", b"hello").unwrap();
        entry.flags |= FLAG_ENCRYPTED;
        let err = entry.contents().unwrap_err();
        assert!(err.is_unsupported());
    }

    #[test]
    fn test_not_a_zip() {
        assert!(matches!(ZipArchive::parse(b"not a zip"), Err(ZipError::NoCentralDirectory)));
        assert!(ZipArchive::parse(&[0u8; 100]).is_err());
    }

    #[test]
    fn test_truncated_archive() {
        let bytes = sample_archive().to_bytes().unwrap();
        // drop the first local header so offsets point past the data
        let truncated = &bytes[bytes.len() / 2..];
        assert!(ZipArchive::parse(truncated).is_err());
    }

    #[test]
    fn test_zip64_marker_rejected() {
        let mut bytes = ZipArchive::default().to_bytes().unwrap();
        // total entries = 0xFFFF signals ZIP64
        let eocd = bytes.len() - EOCD_LEN;
        bytes[eocd + 8] = 0xFF;
        bytes[eocd + 9] = 0xFF;
        bytes[eocd + 10] = 0xFF;
        bytes[eocd + 11] = 0xFF;
        let err = ZipArchive::parse(&bytes).unwrap_err();
        assert!(matches!(err, ZipError::Zip64));
        assert!(err.is_unsupported());
    }

    #[test]
    fn test_data_descriptor_flag_cleared() {
        let mut archive = sample_archive();
        archive.entries[1].flags |= FLAG_DATA_DESCRIPTOR;
        let parsed = ZipArchive::parse(&archive.to_bytes().unwrap()).unwrap();
        assert_eq!(parsed.entries[1].flags & FLAG_DATA_DESCRIPTOR, 0);
    }

    #[test]
    fn test_upsert() {
        let mut archive = sample_archive();
        archive.upsert(ZipEntry::deflated("META-INF/MANIFEST.MF", b"x").unwrap());
        assert_eq!(archive.entries.len(), 3);
        assert_eq!(archive.position("META-INF/MANIFEST.MF"), Some(1));
        archive.upsert(ZipEntry::deflated("module-info.class", b"y").unwrap());
        assert_eq!(archive.entries.len(), 4);
    }

    #[test]
    fn test_empty_archive() {
        let bytes = ZipArchive::default().to_bytes().unwrap();
        assert_eq!(bytes.len(), EOCD_LEN);
        assert!(ZipArchive::parse(&bytes).unwrap().entries.is_empty());
    }

    #[test]
    fn test_non_ascii_name_sets_utf8_flag() {
        let entry = ZipEntry::deflated("données.txt", b"x").unwrap();
        assert_eq!(entry.flags & FLAG_UTF8, FLAG_UTF8);
        assert_eq!(entry.name(), "données.txt");
    }
}
