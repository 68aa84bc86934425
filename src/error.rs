// src/error.rs

//! Error types for the legacy module transform pipeline
//!
//! Inference failures are not errors; they are reported as
//! [`InferenceFailure`](crate::inference::InferenceFailure) values and logged.
//! Everything here is fatal to the single transform or registration that
//! produced it.

use thiserror::Error;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// A descriptor reached synthesis without a module name
    #[error("No module name for archive '{archive}': register one explicitly or use a conventional '<name>-<version>.jar' file name")]
    MissingModuleName { archive: String },

    /// Module name is not a dotted sequence of Java identifiers
    #[error("Invalid module name '{name}' for archive '{archive}': {reason}")]
    InvalidModuleName {
        archive: String,
        name: String,
        reason: String,
    },

    /// Exported package name is not a dotted sequence of Java identifiers
    #[error("Invalid package name '{package}' for archive '{archive}': {reason}")]
    InvalidPackageName {
        archive: String,
        package: String,
        reason: String,
    },

    /// Archive was registered more than once under a strict duplicate policy
    #[error("Ambiguous registration for archive '{archive}': {detail}")]
    AmbiguousRegistration { archive: String, detail: String },

    /// Registry configuration file could not be parsed
    #[error("Configuration error: {0}")]
    Config(String),

    /// Archive is truncated, corrupt or not a zip file
    #[error("Malformed archive '{archive}': {reason}")]
    MalformedArchive { archive: String, reason: String },

    /// Archive uses a zip feature the codec does not handle
    #[error("Unsupported archive '{archive}': {reason}")]
    UnsupportedArchive { archive: String, reason: String },

    /// Class file could not be parsed
    #[error("Malformed class file: {0}")]
    MalformedClassFile(String),

    /// No registry entry and the file name does not yield a usable module name
    #[error("Cannot derive a module name for archive '{archive}': {reason}. Register explicit module metadata or an automatic module name for it")]
    UnnameableArchive { archive: String, reason: String },

    /// Artifact does not match the requested attributes and no transform applies
    #[error("No variant of '{artifact}' matches the requested attributes {requested}")]
    NoMatchingVariant { artifact: String, requested: String },

    /// Requested view does not exist in the graph
    #[error("Unknown view: {0}")]
    UnknownView(String),

    /// Transform failed in another thread sharing the same cache key
    #[error("Transform of '{archive}' failed: {message}")]
    TransformFailed { archive: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a malformed archive error
    pub fn malformed(archive: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedArchive {
            archive: archive.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error stems from user-supplied configuration
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::MissingModuleName { .. }
                | Self::InvalidModuleName { .. }
                | Self::InvalidPackageName { .. }
                | Self::AmbiguousRegistration { .. }
                | Self::Config(_)
        )
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Self::Config(e.to_string())
    }
}
