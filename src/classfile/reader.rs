// src/classfile/reader.rs

use super::pool::*;
use super::{MAGIC, MODULE_ATTRIBUTE, ModuleInfo, ModuleRequire};
use crate::error::{Error, Result};

/// Constant pool entries the reader needs to resolve; everything else is
/// skipped over
#[derive(Debug, Clone)]
enum Entry {
    Utf8(String),
    Module(u16),
    Package(u16),
    Other,
}

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| Error::MalformedClassFile(format!("truncated at offset {}", self.pos)))?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.bytes(1)?[0])
    }

    fn u16(&mut self) -> Result<u16> {
        let b = self.bytes(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32> {
        let b = self.bytes(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn skip(&mut self, len: usize) -> Result<()> {
        self.bytes(len).map(|_| ())
    }
}

struct Pool(Vec<Entry>);

impl Pool {
    fn read(cursor: &mut Cursor<'_>) -> Result<Self> {
        let count = cursor.u16()? as usize;
        let mut entries = vec![Entry::Other; count.max(1)];
        let mut index = 1;

        while index < count {
            let tag = cursor.u8()?;
            let mut width = 1;
            entries[index] = match tag {
                TAG_UTF8 => {
                    let len = cursor.u16()? as usize;
                    let raw = cursor.bytes(len)?;
                    let text = decode_modified_utf8(raw).ok_or_else(|| {
                        Error::MalformedClassFile(format!("invalid modified UTF-8 at pool index {}", index))
                    })?;
                    Entry::Utf8(text)
                }
                TAG_MODULE => Entry::Module(cursor.u16()?),
                TAG_PACKAGE => Entry::Package(cursor.u16()?),
                TAG_CLASS | TAG_STRING | TAG_METHOD_TYPE => {
                    cursor.skip(2)?;
                    Entry::Other
                }
                TAG_METHOD_HANDLE => {
                    cursor.skip(3)?;
                    Entry::Other
                }
                TAG_INTEGER
                | TAG_FLOAT
                | TAG_FIELDREF
                | TAG_METHODREF
                | TAG_INTERFACE_METHODREF
                | TAG_NAME_AND_TYPE
                | TAG_DYNAMIC
                | TAG_INVOKE_DYNAMIC => {
                    cursor.skip(4)?;
                    Entry::Other
                }
                TAG_LONG | TAG_DOUBLE => {
                    cursor.skip(8)?;
                    width = 2;
                    Entry::Other
                }
                other => {
                    return Err(Error::MalformedClassFile(format!(
                        "unknown constant tag {} at pool index {}",
                        other, index
                    )));
                }
            };
            index += width;
        }

        Ok(Self(entries))
    }

    fn utf8(&self, index: u16) -> Result<&str> {
        match self.0.get(index as usize) {
            Some(Entry::Utf8(s)) if index != 0 => Ok(s.as_str()),
            _ => Err(Error::MalformedClassFile(format!(
                "pool index {} is not a Utf8 constant",
                index
            ))),
        }
    }

    fn optional_utf8(&self, index: u16) -> Result<Option<String>> {
        if index == 0 {
            Ok(None)
        } else {
            self.utf8(index).map(|s| Some(s.to_string()))
        }
    }

    fn module(&self, index: u16) -> Result<String> {
        match self.0.get(index as usize) {
            Some(Entry::Module(name)) => Ok(self.utf8(*name)?.to_string()),
            _ => Err(Error::MalformedClassFile(format!(
                "pool index {} is not a Module constant",
                index
            ))),
        }
    }

    fn package(&self, index: u16) -> Result<String> {
        match self.0.get(index as usize) {
            Some(Entry::Package(name)) => Ok(self.utf8(*name)?.replace('/', ".")),
            _ => Err(Error::MalformedClassFile(format!(
                "pool index {} is not a Package constant",
                index
            ))),
        }
    }
}

fn skip_members(cursor: &mut Cursor<'_>) -> Result<()> {
    let count = cursor.u16()?;
    for _ in 0..count {
        cursor.skip(6)?; // access_flags, name_index, descriptor_index
        skip_attributes(cursor)?;
    }
    Ok(())
}

fn skip_attributes(cursor: &mut Cursor<'_>) -> Result<()> {
    let count = cursor.u16()?;
    for _ in 0..count {
        cursor.skip(2)?;
        let len = cursor.u32()? as usize;
        cursor.skip(len)?;
    }
    Ok(())
}

pub(super) fn parse_module_info(data: &[u8]) -> Result<ModuleInfo> {
    let mut cursor = Cursor::new(data);

    if cursor.u32()? != MAGIC {
        return Err(Error::MalformedClassFile("bad magic number".to_string()));
    }
    cursor.skip(4)?; // minor, major
    let pool = Pool::read(&mut cursor)?;

    cursor.skip(6)?; // access_flags, this_class, super_class
    let interfaces = cursor.u16()? as usize;
    cursor.skip(interfaces * 2)?;
    skip_members(&mut cursor)?; // fields
    skip_members(&mut cursor)?; // methods

    let attributes = cursor.u16()?;
    for _ in 0..attributes {
        let name = pool.utf8(cursor.u16()?)?;
        let len = cursor.u32()? as usize;
        let body = cursor.bytes(len)?;
        if name == MODULE_ATTRIBUTE {
            return read_module_attribute(&pool, body);
        }
    }

    Err(Error::MalformedClassFile("no Module attribute".to_string()))
}

fn read_module_attribute(pool: &Pool, body: &[u8]) -> Result<ModuleInfo> {
    let mut cursor = Cursor::new(body);

    let name = pool.module(cursor.u16()?)?;
    let flags = cursor.u16()?;
    let version = pool.optional_utf8(cursor.u16()?)?;

    let requires_count = cursor.u16()?;
    let mut requires = Vec::with_capacity(requires_count as usize);
    for _ in 0..requires_count {
        requires.push(ModuleRequire {
            name: pool.module(cursor.u16()?)?,
            flags: cursor.u16()?,
            version: pool.optional_utf8(cursor.u16()?)?,
        });
    }

    let exports_count = cursor.u16()?;
    let mut exports = Vec::with_capacity(exports_count as usize);
    for _ in 0..exports_count {
        exports.push(pool.package(cursor.u16()?)?);
        cursor.skip(2)?; // exports_flags
        let targets = cursor.u16()? as usize;
        cursor.skip(targets * 2)?;
    }

    Ok(ModuleInfo {
        name,
        flags,
        version,
        requires,
        exports,
    })
}
