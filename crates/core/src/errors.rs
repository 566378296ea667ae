//! Error types for the patchmerge core library.
//!
//! The merge operations themselves never fail. Errors only arise at the
//! edges: validating a user's choice in a [`MergeSession`](crate::session::MergeSession),
//! applying a merged patch list to a document, and loading configuration.
//! Each of those has its own `thiserror` enum, and [`CoreError`] unifies them.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the entire core library.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Conflict(#[from] ConflictError),

    #[error(transparent)]
    Apply(#[from] ApplyError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Conflict errors
// ---------------------------------------------------------------------------

/// Errors raised when recording a resolution against a session.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConflictError {
    /// No conflict exists for the given path.
    #[error("no conflict at path '{0}'")]
    NotFound(String),

    /// The chosen hash is not one of the conflict's candidate options.
    #[error("invalid resolution for '{path}': hash '{hash}' is not a candidate")]
    InvalidResolution { path: String, hash: String },
}

// ---------------------------------------------------------------------------
// Apply errors
// ---------------------------------------------------------------------------

/// Errors from applying a patch list to a JSON document.
#[derive(Debug, Error)]
pub enum ApplyError {
    /// An `add` or `replace` patch carried no value.
    #[error("{op} patch at '{path}' has no value")]
    MissingValue { op: String, path: String },

    /// The patch list could not be converted to RFC 6902 operations.
    #[error("invalid patch: {0}")]
    InvalidPatch(String),

    /// An operation failed against the document (missing path, bad index).
    #[error("patch application failed: {0}")]
    Failed(String),
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors related to loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue { field: String, detail: String },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
