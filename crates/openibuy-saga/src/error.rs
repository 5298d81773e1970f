//! Saga error taxonomy
//!
//! Every variant is fatal: the first one raised aborts the entire run.
//! Soft gaps (a pending transaction request with no supplied hash) are
//! summary entries, not errors.

use thiserror::Error;

use openibuy_client::ClientError;
use openibuy_types::FormatError;

use crate::stage::Stage;

/// Result type for saga operations
pub type Result<T> = std::result::Result<T, SagaError>;

/// Fatal saga failures
#[derive(Debug, Error)]
pub enum SagaError {
    /// Tool invocation failed at the transport or protocol layer
    #[error(transparent)]
    Transport(#[from] ClientError),

    /// A tool result carried an explicit failure signal
    #[error("{stage} failed: {message}")]
    Business { stage: Stage, message: String },

    /// A required entity or identifier could not be resolved
    #[error("{stage}: cannot resolve {what}")]
    Resolution { stage: Stage, what: &'static str },

    /// Supplied evidence failed format validation
    #[error(transparent)]
    Format(#[from] FormatError),
}
