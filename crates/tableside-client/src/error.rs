//! Error types for the terminal client.

use tableside_board::BoardError;

/// Errors that can occur while running the client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The board or its broker connection failed.
    #[error(transparent)]
    Board(#[from] BoardError),

    /// Reading from stdin failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A typed command could not be understood.
    #[error("bad command: {0}")]
    Command(String),
}
