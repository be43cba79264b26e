//! Error types for the mediagrid control plane.
//!
//! Failures that are part of normal cluster life (a module that is configured
//! but not running, an endpoint with no directory entry) are *not* errors;
//! they surface as `Ok(None)` or as a [`Liveness`](crate::messaging::Liveness)
//! variant. `GridError` is reserved for conditions the caller must see:
//! store failures, bad configuration, and deliveries that failed after the
//! target was believed live.

use thiserror::Error;
use uuid::Uuid;

/// Main error type for the mediagrid control plane.
#[derive(Debug, Error)]
pub enum GridError {
    // Store errors
    #[error("database error: {message}")]
    Database { message: String },

    #[error("unknown procedure: {name}")]
    UnknownProcedure { name: String },

    // Transport errors
    #[error("transport error: {message}")]
    Transport { message: String },

    #[error("connect timeout to {endpoint}")]
    ConnectTimeout { endpoint: String },

    #[error("endpoint {endpoint} does not expose the '{interface}' interface")]
    ProxyCast { endpoint: String, interface: String },

    /// A send was attempted against a target believed live and it failed.
    #[error("failed to deliver message {message} to module {module}: {cause}")]
    NotificationFailed {
        module: Uuid,
        message: Uuid,
        cause: String,
    },

    // Registry errors
    #[error("unknown host: {name}")]
    HostNotFound { name: String },

    #[error("unknown module: {name}")]
    ModuleNotFound { name: String },

    #[error("application '{name}' is already activated")]
    AlreadyActivated { name: String },

    // Configuration errors
    #[error("configuration error: {message}")]
    Config { message: String },

    // RPC dispatch errors
    #[error("method not found: {method}")]
    MethodNotFound { method: String },

    #[error("invalid params: {message}")]
    InvalidParams { message: String },

    // Validation errors
    #[error("validation error for {field}: {message}")]
    Validation { field: String, message: String },

    // File system errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Generic errors
    #[error("{0}")]
    Other(String),
}

/// Result type alias for mediagrid operations.
pub type Result<T> = std::result::Result<T, GridError>;

impl From<std::io::Error> for GridError {
    fn from(err: std::io::Error) -> Self {
        GridError::Io {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for GridError {
    fn from(err: serde_json::Error) -> Self {
        GridError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl GridError {
    /// Shorthand for a store-level failure.
    pub fn database(message: impl Into<String>) -> Self {
        GridError::Database {
            message: message.into(),
        }
    }

    /// Shorthand for a transport-level failure.
    pub fn transport(message: impl Into<String>) -> Self {
        GridError::Transport {
            message: message.into(),
        }
    }

    /// Convert to a JSON-RPC error code.
    ///
    /// Standard JSON-RPC error codes:
    /// - -32700: Parse error
    /// - -32600: Invalid Request
    /// - -32601: Method not found
    /// - -32602: Invalid params
    /// - -32603: Internal error
    ///
    /// Custom error codes (application-defined, -32000 to -32099):
    /// - -32000: Transport/connectivity error
    /// - -32001: Unknown host or module
    /// - -32002: Delivery failure
    /// - -32005: Validation error
    pub fn to_rpc_error_code(&self) -> i32 {
        match self {
            GridError::MethodNotFound { .. } => -32601,

            GridError::InvalidParams { .. } => -32602,

            GridError::Transport { .. }
            | GridError::ConnectTimeout { .. }
            | GridError::ProxyCast { .. } => -32000,

            GridError::HostNotFound { .. } | GridError::ModuleNotFound { .. } => -32001,

            GridError::NotificationFailed { .. } => -32002,

            GridError::Validation { .. } => -32005,

            // All other errors are internal errors
            _ => -32603,
        }
    }
}
