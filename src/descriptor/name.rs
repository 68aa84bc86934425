// src/descriptor/name.rs

//! Module and package name rules
//!
//! Module and package names are dotted sequences of Java identifiers, none
//! of which may be a reserved word. Automatic module names are derived from
//! a file name the same way the platform module finder does it:
//!
//! 1. Drop the `.jar` extension
//! 2. Cut at the first `-<digits>` followed by `.` or end (the version)
//! 3. Replace every non-alphanumeric character with `.`
//! 4. Collapse repeated dots, trim leading and trailing dots

use regex::Regex;
use std::sync::LazyLock;

/// Reserved words that may not appear as a name segment
const RESERVED: &[&str] = &[
    "_", "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class",
    "const", "continue", "default", "do", "double", "else", "enum", "extends", "false", "final",
    "finally", "float", "for", "goto", "if", "implements", "import", "instanceof", "int",
    "interface", "long", "native", "new", "null", "package", "private", "protected", "public",
    "return", "short", "static", "strictfp", "super", "switch", "synchronized", "this", "throw",
    "throws", "transient", "true", "try", "void", "volatile", "while",
];

static VERSION_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-(\d+(\.|$))").unwrap());
static NON_ALPHANUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9]").unwrap());
static REPEATED_DOTS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.{2,}").unwrap());

fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_identifier_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Check a dotted name, returning the reason it is unusable
///
/// Shared by module names and package names; both use the same grammar.
pub fn check_dotted_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("name is empty".to_string());
    }

    for segment in name.split('.') {
        let mut chars = segment.chars();
        match chars.next() {
            None => return Err("name contains an empty segment".to_string()),
            Some(first) if !is_identifier_start(first) => {
                return Err(format!("segment '{}' does not start with a letter", segment));
            }
            Some(_) => {}
        }
        if let Some(bad) = chars.find(|c| !is_identifier_part(*c)) {
            return Err(format!("segment '{}' contains '{}'", segment, bad));
        }
        if RESERVED.contains(&segment) {
            return Err(format!("segment '{}' is a reserved word", segment));
        }
    }

    Ok(())
}

/// Whether `name` is a legal module name
pub fn is_valid_module_name(name: &str) -> bool {
    check_dotted_name(name).is_ok()
}

/// Derive an automatic module name from an archive file name
///
/// Returns the reason when the file name cannot be turned into a legal name,
/// e.g. `"1234.jar"` or `"foo-1bar.jar"`.
pub fn automatic_module_name(file_name: &str) -> Result<String, String> {
    let stem = file_name.strip_suffix(".jar").unwrap_or(file_name);

    let without_version = match VERSION_SUFFIX.find(stem) {
        Some(m) => &stem[..m.start()],
        None => stem,
    };

    let dotted = NON_ALPHANUMERIC.replace_all(without_version, ".");
    let collapsed = REPEATED_DOTS.replace_all(&dotted, ".");
    let name = collapsed.trim_matches('.');

    if name.is_empty() {
        return Err(format!("'{}' leaves no name once the version is removed", file_name));
    }

    check_dotted_name(name).map_err(|reason| format!("derived name '{}' is invalid: {}", name, reason))?;
    Ok(name.to_string())
}

/// Convert a dotted package name to the slash-separated internal form
pub fn to_internal_form(package: &str) -> String {
    package.replace('.', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        assert!(is_valid_module_name("java.base"));
        assert!(is_valid_module_name("com.google.common"));
        assert!(is_valid_module_name("a"));
        assert!(is_valid_module_name("org.example$inner"));
        assert!(is_valid_module_name("jsr305"));
    }

    #[test]
    fn test_invalid_names() {
        assert!(!is_valid_module_name(""));
        assert!(!is_valid_module_name("a..b"));
        assert!(!is_valid_module_name(".a"));
        assert!(!is_valid_module_name("a."));
        assert!(!is_valid_module_name("a.1b"));
        assert!(!is_valid_module_name("a-b"));
        assert!(!is_valid_module_name("com.example.class"));
    }

    #[test]
    fn test_reserved_reason() {
        let reason = check_dotted_name("my.package.name").unwrap_err();
        assert!(reason.contains("reserved"));
    }

    #[test]
    fn test_automatic_name_strips_version() {
        assert_eq!(
            automatic_module_name("commons-lang3-3.12.0.jar").unwrap(),
            "commons.lang3"
        );
        assert_eq!(automatic_module_name("guava-31.1-jre.jar").unwrap(), "guava");
        assert_eq!(automatic_module_name("jsr305-3.0.2.jar").unwrap(), "jsr305");
    }

    #[test]
    fn test_automatic_name_without_version() {
        assert_eq!(automatic_module_name("foo_bar.jar").unwrap(), "foo.bar");
        assert_eq!(automatic_module_name("--foo--bar--.jar").unwrap(), "foo.bar");
    }

    #[test]
    fn test_automatic_name_version_at_end() {
        // "-2" followed by end of stem counts as a version
        assert_eq!(automatic_module_name("myapp-2.jar").unwrap(), "myapp");
    }

    #[test]
    fn test_automatic_name_failures() {
        assert!(automatic_module_name("1.0.jar").is_err());
        assert!(automatic_module_name("-1.0.jar").is_err());
        assert!(automatic_module_name("foo-1bar.jar").is_err());
        assert!(automatic_module_name("static-utils.jar").is_err());
    }

    #[test]
    fn test_internal_form() {
        assert_eq!(to_internal_form("org.apache.commons.cli"), "org/apache/commons/cli");
        assert_eq!(to_internal_form("single"), "single");
    }
}
