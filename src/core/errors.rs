//! EXP-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, ExpectError>;

/// Top-level error type for expect_patch.
///
/// Every variant is terminal for the assertion that produced it: the harness
/// fails the current test and nothing is retried.
#[derive(Debug, Error)]
pub enum ExpectError {
    #[error("[EXP-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[EXP-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[EXP-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[EXP-2001] expected one or two values, got {given}")]
    ArgumentCount { given: usize },

    #[error("[EXP-2002] could not resolve caller source file {file}: {details}")]
    CallerResolution { file: String, details: String },

    #[error("[EXP-2003] line {line} is outside {path} ({line_count} lines)")]
    LineRange {
        path: PathBuf,
        line: u32,
        line_count: usize,
    },

    #[error("[EXP-2004] unsupported edit shape at {path}:{line}: {shape}")]
    UnsupportedEditShape {
        path: PathBuf,
        line: u32,
        shape: String,
    },

    #[error("[EXP-2005] {kind} values have no literal form; {hint}")]
    UnsupportedLiteral {
        kind: &'static str,
        hint: &'static str,
    },

    #[error("[EXP-2006] named scalar {type_name} has unsupported base kind {kind}")]
    UnsupportedKind {
        type_name: String,
        kind: &'static str,
    },

    #[error("[EXP-2101] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[EXP-3002] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExpectError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "EXP-1001",
            Self::MissingConfig { .. } => "EXP-1002",
            Self::ConfigParse { .. } => "EXP-1003",
            Self::ArgumentCount { .. } => "EXP-2001",
            Self::CallerResolution { .. } => "EXP-2002",
            Self::LineRange { .. } => "EXP-2003",
            Self::UnsupportedEditShape { .. } => "EXP-2004",
            Self::UnsupportedLiteral { .. } => "EXP-2005",
            Self::UnsupportedKind { .. } => "EXP-2006",
            Self::Serialization { .. } => "EXP-2101",
            Self::Io { .. } => "EXP-3002",
        }
    }

    /// Whether the failure points at a broken internal invariant rather than
    /// at the caller's input or environment.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::UnsupportedKind { .. })
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Convenience constructor for edit-shape rejections.
    #[must_use]
    pub fn shape(path: impl AsRef<Path>, line: u32, shape: impl Into<String>) -> Self {
        Self::UnsupportedEditShape {
            path: path.as_ref().to_path_buf(),
            line,
            shape: shape.into(),
        }
    }
}

impl From<serde_json::Error> for ExpectError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for ExpectError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}
