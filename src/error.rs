//! Error types for Deployflow.
//!
//! All errors are represented by the `DeployflowError` enum. The first three
//! variants form the core taxonomy callers are expected to branch on; the rest
//! cover configuration, conversion and engine plumbing.

use std::io::ErrorKind;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for all Deployflow operations.
#[derive(Deserialize, Serialize, Error, Debug, Clone, PartialEq)]
pub enum DeployflowError {
    /// A referenced workflow, node, run or run log entry does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A command carries an argument that is invalid for its target,
    /// such as a provider type that the node type does not register.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The target exists but is in a state that forbids the operation,
    /// such as a run that already reached a terminal status.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Configuration or catalog seed parsing and validation errors.
    #[error("{0}")]
    Config(String),

    /// Data conversion errors (JSON, TOML).
    #[error("{0}")]
    Convert(String),

    /// Engine-level errors (startup, shutdown, execution).
    #[error("{0}")]
    Engine(String),

    /// Message queue errors.
    #[error("{0}")]
    Queue(String),

    /// I/O operation errors.
    #[error("{0}")]
    IoError(String),
}

impl DeployflowError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, DeployflowError::NotFound(_))
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, DeployflowError::InvalidArgument(_))
    }

    pub fn is_invalid_state(&self) -> bool {
        matches!(self, DeployflowError::InvalidState(_))
    }
}

impl From<DeployflowError> for String {
    fn from(val: DeployflowError) -> Self {
        val.to_string()
    }
}

impl From<std::io::Error> for DeployflowError {
    fn from(error: std::io::Error) -> Self {
        DeployflowError::IoError(error.to_string())
    }
}

impl From<DeployflowError> for std::io::Error {
    fn from(val: DeployflowError) -> Self {
        #[allow(clippy::io_other_error)]
        std::io::Error::new(ErrorKind::Other, val.to_string())
    }
}

impl From<serde_json::Error> for DeployflowError {
    fn from(error: serde_json::Error) -> Self {
        DeployflowError::Convert(error.to_string())
    }
}

impl From<toml::de::Error> for DeployflowError {
    fn from(error: toml::de::Error) -> Self {
        DeployflowError::Config(error.to_string())
    }
}
