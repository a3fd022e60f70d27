//! Error types for the chainsig pipeline

use thiserror::Error;

/// Result type alias for chainsig operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the signing pipeline
#[derive(Error, Debug)]
pub enum Error {
    // ============ Derivation Errors ============
    #[error("derivation failure: {0}")]
    DerivationFailure(String),

    // ============ Transaction Errors ============
    #[error("build failure: {0}")]
    BuildFailure(String),

    // ============ Signing Errors ============
    #[error("signing rejected: {0}")]
    SigningRejected(String),

    #[error("signature invalid: {0}")]
    SignatureInvalid(String),

    // ============ Session Errors ============
    #[error("no pending signing session")]
    NoPendingSession,

    #[error("session storage error: {0}")]
    Storage(String),

    // ============ Network Errors ============
    #[error("relay failure: {0}")]
    RelayFailure(String),

    #[error("RPC error: {0}")]
    Rpc(String),

    // ============ Configuration Errors ============
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // ============ Serialization Errors ============
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("deserialization error: {0}")]
    Deserialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<hex::FromHexError> for Error {
    fn from(e: hex::FromHexError) -> Self {
        Error::Deserialization(e.to_string())
    }
}
