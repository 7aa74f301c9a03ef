//! Watch Service Error Hierarchy
//!
//! Errors are grouped by the layer that raises them: infrastructure
//! (network, io), configuration, and per-session watch failures.

use config::ConfigError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Infrastructure-level failures (network, io, tls)
    #[error(transparent)]
    System(#[from] SystemError),

    /// Configuration source or parse failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Configuration values that parsed but are not usable
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Failures that end a watch session
    #[error(transparent)]
    Watch(#[from] WatchError),
}

#[derive(Debug, thiserror::Error)]
pub enum SystemError {
    /// RPC server failed to bind or serve
    #[error("RPC server unavailable")]
    ServerUnavailable,

    /// gRPC transport layer errors
    #[error(transparent)]
    Transport(#[from] tonic::transport::Error),

    /// Certificate or key file failures
    #[error("Error occurred at path: {path}")]
    PathError {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    /// Self-signed certificate generation failures
    #[error(transparent)]
    Certificate(#[from] rcgen::Error),
}

/// Failures of a single subscriber session.
///
/// Every variant is sticky: once recorded the session stops sending and
/// the error is handed back to whoever drives the session.
#[derive(Debug, Clone, thiserror::Error)]
pub enum WatchError {
    /// The subscriber channel rejected an operation
    #[error("send error: {0}")]
    SendFailed(String),

    /// A value handed to the diff engine could not be serialized
    #[error("encode error: {0}")]
    Encode(#[from] prost::EncodeError),
}

impl From<WatchError> for tonic::Status {
    fn from(err: WatchError) -> Self {
        match err {
            WatchError::SendFailed(_) => tonic::Status::aborted(err.to_string()),
            WatchError::Encode(_) => tonic::Status::internal(err.to_string()),
        }
    }
}
