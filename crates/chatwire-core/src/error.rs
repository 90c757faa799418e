//! Shared error type across chatwire crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Invalid input / malformed event.
    BadRequest,
    /// Requested entity does not exist.
    NotFound,
    /// Presence store unreachable (degraded visibility, not fatal).
    StoreUnavailable,
    /// Message could not be durably persisted.
    PersistFailed,
    /// Unsupported config/protocol version.
    UnsupportedVersion,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::NotFound => "NOT_FOUND",
            ClientCode::StoreUnavailable => "STORE_UNAVAILABLE",
            ClientCode::PersistFailed => "PERSIST_FAILED",
            ClientCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, ChatWireError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Error)]
pub enum ChatWireError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("presence store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("message persistence failed: {0}")]
    PersistFailed(String),
    #[error("unsupported version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl ChatWireError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            ChatWireError::BadRequest(_) => ClientCode::BadRequest,
            ChatWireError::NotFound(_) => ClientCode::NotFound,
            ChatWireError::StoreUnavailable(_) => ClientCode::StoreUnavailable,
            ChatWireError::PersistFailed(_) => ClientCode::PersistFailed,
            ChatWireError::UnsupportedVersion => ClientCode::UnsupportedVersion,
            ChatWireError::Internal(_) => ClientCode::Internal,
        }
    }
}
