//! Client-side error types

use thiserror::Error;

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors raised by the transport and capability layer
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection, TLS or timeout failure from the HTTP layer
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success HTTP status with the response body
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// JSON-RPC error member in a response envelope
    #[error("JSON-RPC {code}: {message}")]
    Rpc { code: i64, message: String },

    /// Response that is not a JSON-RPC envelope at all
    #[error("invalid JSON-RPC response for {method}")]
    InvalidEnvelope { method: String },

    /// Body that failed to parse as JSON
    #[error("malformed response body: {0}")]
    Json(#[from] serde_json::Error),

    /// Credential acquisition failure
    #[error("authentication failed: {0}")]
    Auth(String),
}
