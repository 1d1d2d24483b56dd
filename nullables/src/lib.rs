//! Nullable infrastructure for deterministic testing.
//!
//! The governance engine reaches the outside world through the clock it is
//! handed and the `agora-host` traits. This crate provides in-memory
//! implementations of those that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Record what was asked of them
//!
//! Usage: construct the engine over nullables in tests and embeddings that
//! have no real ledger.

pub mod clock;
pub mod host;
pub mod token;

pub use clock::NullClock;
pub use host::{NullHost, Storage, TargetFn};
pub use token::NullToken;
