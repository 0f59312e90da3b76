//! Error types for viewmerge.
//!
//! Defines the main error enum used throughout the crate.

use thiserror::Error;

/// Main error type for viewmerge operations.
#[derive(Error, Debug)]
pub enum ViewmergeError {
    /// Invalid caller input (missing categories, bad query template, etc.)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Failures surfaced by the query engine (auth, quota, malformed query,
    /// transport). Propagated verbatim, never retried.
    #[error("Engine error: {0}")]
    Engine(String),

    /// Schema mismatches: missing expected columns, incompatible column sets
    /// during concatenation, unresolvable column-order names.
    #[error("Schema error: {0}")]
    Schema(String),

    /// Configuration errors (invalid config file, missing required fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ViewmergeError {
    /// Creates an invalid-argument error with the given message.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Creates an engine error with the given message.
    pub fn engine(msg: impl Into<String>) -> Self {
        Self::Engine(msg.into())
    }

    /// Creates a schema error with the given message.
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "Invalid Argument",
            Self::Engine(_) => "Engine Error",
            Self::Schema(_) => "Schema Error",
            Self::Config(_) => "Configuration Error",
            Self::Internal(_) => "Internal Error",
        }
    }
}

/// Result type alias using ViewmergeError.
pub type Result<T> = std::result::Result<T, ViewmergeError>;
