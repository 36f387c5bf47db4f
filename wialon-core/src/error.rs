//! Closed error taxonomy for the protocol codec and durable storage.
//!
//! Matches the taxonomy a connection task is expected to recover from:
//! every variant here is something a read loop, write loop, or session can
//! log and continue past rather than crash on.

use thiserror::Error;

/// Errors raised while encoding or decoding a wire frame.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    #[error("CRC mismatch: expected {expected}, computed {computed}")]
    CrcMismatch { expected: String, computed: String },

    #[error("non-ASCII byte in frame")]
    NotAscii,
}

/// Errors raised by the BlackBox's durable-storage layer.
///
/// In-memory state is always authoritative; a `StorageError` never blocks a
/// producer, it is logged and the next mutation retries the disk mirror.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to read blackbox file: {0}")]
    Read(#[source] std::io::Error),

    #[error("failed to write blackbox file: {0}")]
    Write(#[source] std::io::Error),

    #[error("failed to parse blackbox file: {0}")]
    Parse(#[source] serde_json::Error),
}
