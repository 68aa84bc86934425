// src/inference.rs

//! Module name and version inference from archive file names
//!
//! Conventional archive names look like `<artifact>-<version>.jar`. Only the
//! last dash is significant: everything before it is the name (dashes become
//! dots), everything between it and the extension is the version.
//!
//! ```text
//! google-cloud-storage-2.4.1.jar  ->  google.cloud.storage / 2.4.1
//! ```
//!
//! Inference never fails hard. When the file name does not follow the
//! convention the caller gets an [`InferenceFailure`] and carries on with
//! unset values.

use std::fmt;

/// Default archive extension marker
pub const DEFAULT_EXTENSION: &str = ".jar";

/// Name and version guessed from an archive identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferredCoordinates {
    pub name: String,
    pub version: String,
}

/// Why a file name could not be split into name and version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InferenceFailure {
    /// No dash past the first character
    NoDash,
    /// The extension marker does not occur at all
    NoExtension,
    /// The last extension marker sits before the last dash
    ExtensionBeforeDash,
}

impl InferenceFailure {
    pub fn description(&self) -> &'static str {
        match self {
            Self::NoDash => "no dash found",
            Self::NoExtension => "no extension found",
            Self::ExtensionBeforeDash => "last dash comes after the extension",
        }
    }
}

impl fmt::Display for InferenceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Infer name and version using the default `.jar` extension
pub fn infer_coordinates(archive: &str) -> Result<InferredCoordinates, InferenceFailure> {
    infer_coordinates_with(archive, DEFAULT_EXTENSION)
}

/// Infer name and version using a custom extension marker
pub fn infer_coordinates_with(
    archive: &str,
    extension: &str,
) -> Result<InferredCoordinates, InferenceFailure> {
    let last_dash = archive.rfind('-');
    let last_ext = archive.rfind(extension);

    match (last_dash, last_ext) {
        (Some(dash), Some(ext)) if dash > 0 && ext > dash => Ok(InferredCoordinates {
            name: archive[..dash].replace('-', "."),
            version: archive[dash + 1..ext].to_string(),
        }),
        (None, _) | (Some(0), _) => Err(InferenceFailure::NoDash),
        (_, None) => Err(InferenceFailure::NoExtension),
        _ => Err(InferenceFailure::ExtensionBeforeDash),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conventional_name() {
        let coords = infer_coordinates("google-cloud-storage-2.4.1.jar").unwrap();
        assert_eq!(coords.name, "google.cloud.storage");
        assert_eq!(coords.version, "2.4.1");
    }

    #[test]
    fn test_only_last_dash_splits() {
        let coords = infer_coordinates("a-b-1.2.3.jar").unwrap();
        assert_eq!(coords.name, "a.b");
        assert_eq!(coords.version, "1.2.3");
    }

    #[test]
    fn test_single_dash() {
        let coords = infer_coordinates("commons-1.4.jar").unwrap();
        assert_eq!(coords.name, "commons");
        assert_eq!(coords.version, "1.4");
    }

    #[test]
    fn test_no_dash() {
        assert_eq!(infer_coordinates("plainname.jar"), Err(InferenceFailure::NoDash));
        assert_eq!(infer_coordinates("plainname"), Err(InferenceFailure::NoDash));
    }

    #[test]
    fn test_leading_dash_counts_as_no_dash() {
        assert_eq!(infer_coordinates("-1.0.jar"), Err(InferenceFailure::NoDash));
    }

    #[test]
    fn test_no_extension() {
        assert_eq!(infer_coordinates("name-1.0"), Err(InferenceFailure::NoExtension));
    }

    #[test]
    fn test_extension_before_dash() {
        assert_eq!(
            infer_coordinates("name.jar-backup"),
            Err(InferenceFailure::ExtensionBeforeDash)
        );
    }

    #[test]
    fn test_custom_extension() {
        let coords = infer_coordinates_with("native-lib-0.9.zip", ".zip").unwrap();
        assert_eq!(coords.name, "native.lib");
        assert_eq!(coords.version, "0.9");
        assert_eq!(
            infer_coordinates_with("native-lib-0.9.zip", ".jar"),
            Err(InferenceFailure::NoExtension)
        );
    }

    #[test]
    fn test_failures_are_distinguishable() {
        let failures = [
            InferenceFailure::NoDash,
            InferenceFailure::NoExtension,
            InferenceFailure::ExtensionBeforeDash,
        ];
        for (i, a) in failures.iter().enumerate() {
            for b in &failures[i + 1..] {
                assert_ne!(a.description(), b.description());
            }
        }
    }
}
