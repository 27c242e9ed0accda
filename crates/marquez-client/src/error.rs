// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for marquez-client.

use thiserror::Error;

/// Result type using ClientError.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when talking to the lineage service.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Configuration error (missing file, missing host descriptor, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// A job or run operation was issued before a namespace was bound.
    #[error("no namespace bound: call bind_namespace first")]
    NotBound,

    /// Job run not found.
    #[error("job run not found: {0}")]
    RunNotFound(String),

    /// Dataset not found.
    #[error("dataset not found: {0}")]
    DatasetNotFound(String),

    /// Service answered with a non-success status.
    #[error("remote call failed [{status}]: {message}")]
    Remote { status: u16, message: String },

    /// The request never produced a response (connect, DNS, timeout, I/O).
    #[error("transport error: {0}")]
    Transport(String),

    /// Unexpected response from server.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl ClientError {
    /// Whether the error came from the remote call itself rather than local state.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            ClientError::Remote { .. }
                | ClientError::Transport(_)
                | ClientError::UnexpectedResponse(_)
        )
    }

    /// Whether the service rejected a run state transition.
    ///
    /// The service answers illegal transitions with 409 or 400; the error is
    /// still surfaced as `Remote`, this only classifies it.
    pub fn is_invalid_transition(&self) -> bool {
        matches!(self, ClientError::Remote { status: 400 | 409, .. })
    }

    /// Whether the error is any of the not-found variants.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ClientError::RunNotFound(_) | ClientError::DatasetNotFound(_)
        )
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for ClientError {
    fn from(err: serde_yaml::Error) -> Self {
        ClientError::Config(err.to_string())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::Transport(err.to_string())
    }
}
