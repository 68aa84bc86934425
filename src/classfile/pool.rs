// src/classfile/pool.rs

//! Constant pool builder and modified UTF-8 codec

use crate::error::{Error, Result};
use std::collections::HashMap;

pub const TAG_UTF8: u8 = 1;
pub const TAG_INTEGER: u8 = 3;
pub const TAG_FLOAT: u8 = 4;
pub const TAG_LONG: u8 = 5;
pub const TAG_DOUBLE: u8 = 6;
pub const TAG_CLASS: u8 = 7;
pub const TAG_STRING: u8 = 8;
pub const TAG_FIELDREF: u8 = 9;
pub const TAG_METHODREF: u8 = 10;
pub const TAG_INTERFACE_METHODREF: u8 = 11;
pub const TAG_NAME_AND_TYPE: u8 = 12;
pub const TAG_METHOD_HANDLE: u8 = 15;
pub const TAG_METHOD_TYPE: u8 = 16;
pub const TAG_DYNAMIC: u8 = 17;
pub const TAG_INVOKE_DYNAMIC: u8 = 18;
pub const TAG_MODULE: u8 = 19;
pub const TAG_PACKAGE: u8 = 20;

/// Longest encoded string a `CONSTANT_Utf8` entry can hold
pub const MAX_UTF8_LEN: usize = u16::MAX as usize;

/// Encode a string as modified UTF-8
///
/// NUL is written as the two-byte form and supplementary characters as
/// surrogate pairs of three bytes each.
pub fn encode_modified_utf8(s: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len());
    for unit in s.encode_utf16() {
        match unit {
            0x0001..=0x007F => out.push(unit as u8),
            0x0000 | 0x0080..=0x07FF => {
                out.push(0xC0 | (unit >> 6) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
            _ => {
                out.push(0xE0 | (unit >> 12) as u8);
                out.push(0x80 | ((unit >> 6) & 0x3F) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
        }
    }
    out
}

/// Decode modified UTF-8, returning `None` on malformed input
pub fn decode_modified_utf8(bytes: &[u8]) -> Option<String> {
    let mut units = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        let unit = if b & 0x80 == 0 {
            if b == 0 {
                return None;
            }
            i += 1;
            b as u16
        } else if b & 0xE0 == 0xC0 {
            let b2 = *bytes.get(i + 1)?;
            if b2 & 0xC0 != 0x80 {
                return None;
            }
            i += 2;
            ((b as u16 & 0x1F) << 6) | (b2 as u16 & 0x3F)
        } else if b & 0xF0 == 0xE0 {
            let b2 = *bytes.get(i + 1)?;
            let b3 = *bytes.get(i + 2)?;
            if b2 & 0xC0 != 0x80 || b3 & 0xC0 != 0x80 {
                return None;
            }
            i += 3;
            ((b as u16 & 0x0F) << 12) | ((b2 as u16 & 0x3F) << 6) | (b3 as u16 & 0x3F)
        } else {
            return None;
        };
        units.push(unit);
    }
    String::from_utf16(&units).ok()
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Constant {
    Utf8(String),
    Class(u16),
    Module(u16),
    Package(u16),
}

/// Append-only constant pool with deduplication
///
/// Index 0 is unused, so the first constant gets index 1.
#[derive(Debug, Default)]
pub struct ConstantPool {
    entries: Vec<Constant>,
    index: HashMap<Constant, u16>,
}

impl ConstantPool {
    pub fn new() -> Self {
        Self::default()
    }

    fn add(&mut self, constant: Constant) -> Result<u16> {
        if let Some(&existing) = self.index.get(&constant) {
            return Ok(existing);
        }
        // constant_pool_count is entries + 1 and must fit in a u16
        let idx = u16::try_from(self.entries.len() + 1)
            .ok()
            .filter(|idx| *idx < u16::MAX)
            .ok_or_else(|| Error::MalformedClassFile("constant pool is full".to_string()))?;
        self.entries.push(constant.clone());
        self.index.insert(constant, idx);
        Ok(idx)
    }

    /// Fails when the encoded string is longer than a `CONSTANT_Utf8` can hold
    pub fn utf8(&mut self, value: &str) -> Result<u16> {
        let len = encode_modified_utf8(value).len();
        if len > MAX_UTF8_LEN {
            return Err(Error::MalformedClassFile(format!(
                "constant of {} bytes exceeds the {}-byte limit",
                len, MAX_UTF8_LEN
            )));
        }
        self.add(Constant::Utf8(value.to_string()))
    }

    /// `CONSTANT_Class` for an internal (slash-separated) name
    pub fn class(&mut self, internal_name: &str) -> Result<u16> {
        let name = self.utf8(internal_name)?;
        self.add(Constant::Class(name))
    }

    pub fn module(&mut self, name: &str) -> Result<u16> {
        let name = self.utf8(name)?;
        self.add(Constant::Module(name))
    }

    /// `CONSTANT_Package` for an internal (slash-separated) name
    pub fn package(&mut self, internal_name: &str) -> Result<u16> {
        let name = self.utf8(internal_name)?;
        self.add(Constant::Package(name))
    }

    /// `constant_pool_count`: number of entries plus one
    pub fn count(&self) -> usize {
        self.entries.len() + 1
    }

    /// Serialize all entries (without the count)
    pub fn write(&self, out: &mut Vec<u8>) {
        for constant in &self.entries {
            match constant {
                Constant::Utf8(value) => {
                    let bytes = encode_modified_utf8(value);
                    out.push(TAG_UTF8);
                    // length bounded by MAX_UTF8_LEN in `utf8`
                    out.extend_from_slice(&(bytes.len() as u16).to_be_bytes());
                    out.extend_from_slice(&bytes);
                }
                Constant::Class(name) => {
                    out.push(TAG_CLASS);
                    out.extend_from_slice(&name.to_be_bytes());
                }
                Constant::Module(name) => {
                    out.push(TAG_MODULE);
                    out.extend_from_slice(&name.to_be_bytes());
                }
                Constant::Package(name) => {
                    out.push(TAG_PACKAGE);
                    out.extend_from_slice(&name.to_be_bytes());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_is_unchanged() {
        assert_eq!(encode_modified_utf8("java.base"), b"java.base");
    }

    #[test]
    fn test_nul_uses_two_bytes() {
        assert_eq!(encode_modified_utf8("a\0b"), vec![b'a', 0xC0, 0x80, b'b']);
        assert_eq!(decode_modified_utf8(&[b'a', 0xC0, 0x80, b'b']).unwrap(), "a\0b");
        assert_eq!(decode_modified_utf8(&[b'a', 0, b'b']), None);
    }

    #[test]
    fn test_supplementary_uses_surrogates() {
        let encoded = encode_modified_utf8("\u{1F600}");
        assert_eq!(encoded.len(), 6);
        assert_eq!(decode_modified_utf8(&encoded).unwrap(), "\u{1F600}");
    }

    #[test]
    fn test_two_and_three_byte_chars() {
        for s in ["é", "ü.ö", "日本"] {
            let encoded = encode_modified_utf8(s);
            assert_eq!(encoded, s.as_bytes());
            assert_eq!(decode_modified_utf8(&encoded).unwrap(), s);
        }
    }

    #[test]
    fn test_pool_deduplicates() {
        let mut pool = ConstantPool::new();
        let a = pool.module("java.base").unwrap();
        let b = pool.module("java.base").unwrap();
        let utf = pool.utf8("java.base").unwrap();
        assert_eq!(a, b);
        assert_eq!(utf, 1);
        assert_eq!(a, 2);
        assert_eq!(pool.count(), 3);
    }

    #[test]
    fn test_same_name_different_kinds() {
        let mut pool = ConstantPool::new();
        let module = pool.module("foo").unwrap();
        let package = pool.package("foo").unwrap();
        assert_ne!(module, package);
        assert_eq!(pool.count(), 4);
    }

    #[test]
    fn test_utf8_length_limit() {
        let mut pool = ConstantPool::new();
        assert!(pool.utf8(&"a".repeat(MAX_UTF8_LEN)).is_ok());
        assert!(matches!(
            pool.utf8(&"a".repeat(MAX_UTF8_LEN + 1)),
            Err(Error::MalformedClassFile(_))
        ));
        // limit applies to the encoded form: NUL takes two bytes
        assert!(pool.utf8(&"\0".repeat(MAX_UTF8_LEN / 2 + 1)).is_err());
        assert_eq!(pool.count(), 2);
    }

    #[test]
    fn test_pool_index_limit() {
        let mut pool = ConstantPool::new();
        for i in 0..(u16::MAX as usize - 1) {
            pool.utf8(&i.to_string()).unwrap();
        }
        assert_eq!(pool.count(), u16::MAX as usize);
        assert!(pool.utf8("one more").is_err());
        // existing constants still resolve
        assert_eq!(pool.utf8("0").unwrap(), 1);
    }
}
