//! Top-level error type shared across crates.

use thiserror::Error;

/// Errors raised while constructing or parsing the fundamental types.
#[derive(Debug, Error)]
pub enum AgoraError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}
