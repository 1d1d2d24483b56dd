//! Fundamental types for the Agora governance engine.
//!
//! This crate defines the core types shared across every other crate in the
//! workspace: account addresses, proposal identities, logical timestamps and
//! the shared parse error.

pub mod address;
pub mod error;
pub mod hash;
pub mod time;

pub use address::Address;
pub use error::AgoraError;
pub use hash::{DescriptionHash, ProposalId};
pub use time::Timestamp;
