//! Error types and error code constants for sharpdom.
//!
//! This module provides the unified error type (`DomError`) raised by the
//! model layer (build, rebuild, container edits, copying) and the non-fatal
//! `ResolveError` that symbol resolution records on a node.
//!
//! ## Error Code Mapping
//!
//! Exit codes used by the `sharpdom` binary:
//! - `2`: Invalid arguments (bad input from caller)
//! - `3`: Unsupported input (no factory, malformed fragment, file not found)
//! - `4`: Model errors (illegal container edits, missing clone support)
//! - `10`: Internal errors (IO, configuration, unexpected state)
//!
//! ## Design
//!
//! - **Fatal vs. non-fatal**: every `DomError` aborts the operation that raised
//!   it. `ResolveError` never does: it is stored on the node, which is then
//!   reported as degraded.
//! - **Code mapping**: `OutputErrorCode` provides stable integer codes for JSON

use std::fmt;

use thiserror::Error;

// ============================================================================
// Output Error Codes
// ============================================================================

/// Error codes for JSON output.
///
/// These codes map to CLI exit codes and appear in JSON error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputErrorCode {
    /// Invalid arguments from caller (bad flags, unreadable config).
    InvalidArguments = 2,
    /// Input the model cannot represent (no factory, malformed fragment).
    UnsupportedInput = 3,
    /// Illegal model operation (bad container edit, missing clone support).
    ModelError = 4,
    /// Internal errors (bugs, IO, unexpected state).
    InternalError = 10,
}

impl OutputErrorCode {
    /// Get the numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for OutputErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Unified error type for the model layer.
#[derive(Debug, Error)]
pub enum DomError {
    /// No registered factory accepts a syntax fragment.
    #[error("unsupported construct {kind} at {line}:{col}: `{snippet}`")]
    UnsupportedConstruct {
        kind: String,
        line: u32,
        col: u32,
        snippet: String,
    },

    /// A factory accepted a fragment whose shape it cannot handle.
    #[error("malformed input in {factory}: {message}")]
    MalformedInput { factory: String, message: String },

    /// A node variant declined to be copied.
    #[error("{kind} does not support copying")]
    MissingCloneSupport { kind: String },

    /// No registered factory can regenerate syntax for a node.
    #[error("no factory can rebuild {kind} nodes")]
    UnsupportedNode { kind: String },

    /// The owner's variant has no container with this name.
    #[error("{owner} has no {slot} slot")]
    NoSuchSlot { owner: String, slot: String },

    /// The container does not accept members of this variant.
    #[error("{owner}.{slot} cannot hold a {member}")]
    InvalidMember {
        owner: String,
        slot: String,
        member: String,
    },

    /// Moving a node under itself or one of its descendants.
    #[error("cannot move {member} under its own subtree")]
    CyclicMove { member: String },

    /// A facet edit on a variant that does not expose that facet.
    #[error("{kind} has no {facet} facet")]
    MissingFacet { kind: String, facet: String },

    /// Text handed to a fragment builder did not parse cleanly.
    #[error("invalid {expected} fragment: {message}")]
    InvalidFragment { expected: String, message: String },

    /// Invalid configuration value or file.
    #[error("invalid configuration: {message}")]
    Config { message: String },

    /// Invalid arguments from the caller.
    #[error("invalid arguments: {message}")]
    InvalidArguments { message: String },

    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound { path: String },

    /// IO failure while reading input.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encode/decode failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Non-fatal Resolution Errors
// ============================================================================

/// Why the semantic service could not resolve a fragment.
///
/// Stored on the node; never propagated as a `DomError`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The fragment was never registered with the resolver.
    #[error("fragment is not part of an analyzed syntax tree")]
    UnknownFragment,

    /// The declaration is missing its identifier (error recovery).
    #[error("declaration has no identifier")]
    MissingIdentifier,

    /// The fragment does not declare anything.
    #[error("{kind} does not declare a symbol")]
    NotADeclaration { kind: String },

    /// The static type of an expression could not be determined.
    #[error("cannot determine the type of `{expression}`")]
    UnknownType { expression: String },
}

// ============================================================================
// Error Code Mapping
// ============================================================================

impl From<&DomError> for OutputErrorCode {
    fn from(err: &DomError) -> Self {
        match err {
            DomError::UnsupportedConstruct { .. } => OutputErrorCode::UnsupportedInput,
            DomError::MalformedInput { .. } => OutputErrorCode::UnsupportedInput,
            DomError::UnsupportedNode { .. } => OutputErrorCode::UnsupportedInput,
            DomError::InvalidFragment { .. } => OutputErrorCode::UnsupportedInput,
            DomError::FileNotFound { .. } => OutputErrorCode::UnsupportedInput,
            DomError::MissingCloneSupport { .. } => OutputErrorCode::ModelError,
            DomError::NoSuchSlot { .. } => OutputErrorCode::ModelError,
            DomError::InvalidMember { .. } => OutputErrorCode::ModelError,
            DomError::CyclicMove { .. } => OutputErrorCode::ModelError,
            DomError::MissingFacet { .. } => OutputErrorCode::ModelError,
            DomError::InvalidArguments { .. } => OutputErrorCode::InvalidArguments,
            DomError::Config { .. } => OutputErrorCode::InvalidArguments,
            DomError::Io(_) => OutputErrorCode::InternalError,
            DomError::Json(_) => OutputErrorCode::InternalError,
        }
    }
}

impl From<DomError> for OutputErrorCode {
    fn from(err: DomError) -> Self {
        OutputErrorCode::from(&err)
    }
}

// ============================================================================
// Convenience Constructors
// ============================================================================

impl DomError {
    /// Create a malformed input error for the named factory.
    pub fn malformed(factory: impl Into<String>, message: impl Into<String>) -> Self {
        DomError::MalformedInput {
            factory: factory.into(),
            message: message.into(),
        }
    }

    /// Create an invalid arguments error.
    pub fn invalid_args(message: impl Into<String>) -> Self {
        DomError::InvalidArguments {
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        DomError::Config {
            message: message.into(),
        }
    }

    /// Create a file not found error.
    pub fn file_not_found(path: impl Into<String>) -> Self {
        DomError::FileNotFound { path: path.into() }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> OutputErrorCode {
        OutputErrorCode::from(self)
    }
}

// ============================================================================
// Tests
// ============================================================================
