//! Error types for the order board.
//!
//! Uses `thiserror` for typed errors covering configuration, the broker
//! transport, and inbound payload decoding. None of them are fatal once the
//! board is running: the connection manager logs and continues.

/// Errors that can occur while configuring or running the board.
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    /// Configuration is invalid or missing.
    #[error("config error: {0}")]
    Config(String),

    /// The broker transport rejected a request or is gone.
    #[error("transport error: {0}")]
    Transport(String),

    /// An inbound payload was not valid UTF-8.
    #[error("payload decode error: {0}")]
    Decode(#[from] std::str::Utf8Error),

    /// An inbound payload was not a valid food event.
    #[error("payload parse error: {0}")]
    Parse(String),

    /// Serialization of an outbound payload failed.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
}
