// src/archive/manifest.rs

//! JAR manifest (`META-INF/MANIFEST.MF`) handling
//!
//! Only the main section is modelled. Per-entry sections that follow it
//! are kept as opaque bytes and written back untouched.

use std::fmt::Write as _;

pub const MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";
pub const MANIFEST_VERSION: &str = "Manifest-Version";
pub const AUTOMATIC_MODULE_NAME: &str = "Automatic-Module-Name";

/// Maximum line length in bytes, line break excluded
const LINE_WIDTH: usize = 72;

/// A parsed manifest
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    main: Vec<(String, String)>,
    sections: Vec<u8>,
}

impl Manifest {
    /// A fresh manifest containing only `Manifest-Version: 1.0`
    pub fn new() -> Self {
        Self {
            main: vec![(MANIFEST_VERSION.to_string(), "1.0".to_string())],
            sections: Vec::new(),
        }
    }

    /// Parse manifest bytes
    ///
    /// Malformed header lines in the main section are skipped rather than
    /// rejected; legacy archives carry all sorts of hand-written manifests.
    pub fn parse(data: &[u8]) -> Self {
        let mut main: Vec<(String, String)> = Vec::new();
        let mut pos = 0;

        while pos < data.len() {
            let (line, next) = next_line(data, pos);
            pos = next;

            if line.is_empty() {
                break;
            }

            if line[0] == b' ' {
                if let Some((_, value)) = main.last_mut() {
                    value.push_str(&String::from_utf8_lossy(&line[1..]));
                }
                continue;
            }

            let text = String::from_utf8_lossy(line);
            if let Some((name, value)) = text.split_once(": ") {
                main.push((name.to_string(), value.to_string()));
            } else if let Some(name) = text.strip_suffix(':') {
                main.push((name.to_string(), String::new()));
            }
        }

        Self {
            main,
            sections: data[pos..].to_vec(),
        }
    }

    /// Look up a main attribute; names compare case-insensitively
    pub fn main_attribute(&self, name: &str) -> Option<&str> {
        self.main
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Main attributes in file order
    pub fn main_attributes(&self) -> &[(String, String)] {
        &self.main
    }

    /// Set a main attribute, replacing an existing value in place
    pub fn set_main_attribute(&mut self, name: &str, value: &str) {
        match self.main.iter_mut().find(|(key, _)| key.eq_ignore_ascii_case(name)) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.main.push((name.to_string(), value.to_string())),
        }
    }

    /// Serialize with CRLF line endings and 72-byte line wrapping
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = String::new();
        for (name, value) in &self.main {
            let header = format!("{}: {}", name, value);
            write_wrapped(&mut out, &header);
        }
        out.push_str("\r\n");

        let mut bytes = out.into_bytes();
        bytes.extend_from_slice(&self.sections);
        bytes
    }
}

/// Return the line starting at `pos` (without terminator) and the offset
/// of the following line. Accepts CRLF, LF and lone CR.
fn next_line(data: &[u8], pos: usize) -> (&[u8], usize) {
    let mut end = pos;
    while end < data.len() && data[end] != b'\n' && data[end] != b'\r' {
        end += 1;
    }
    let line = &data[pos..end];
    let next = match data.get(end) {
        Some(b'\r') if data.get(end + 1) == Some(&b'\n') => end + 2,
        Some(_) => end + 1,
        None => end,
    };
    (line, next)
}

fn write_wrapped(out: &mut String, header: &str) {
    let mut rest = header;
    let mut width = LINE_WIDTH;
    let mut first = true;

    while !rest.is_empty() {
        let mut cut = rest.len().min(width);
        // never split a multi-byte character
        while !rest.is_char_boundary(cut) {
            cut -= 1;
        }
        if !first {
            out.push(' ');
        }
        let _ = write!(out, "{}\r\n", &rest[..cut]);
        rest = &rest[cut..];
        first = false;
        width = LINE_WIDTH - 1;
    }
}
