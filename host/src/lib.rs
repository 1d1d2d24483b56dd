//! Abstract interfaces to the world outside the governance engine.
//!
//! The engine never custodies value or runs target code itself. It talks
//! to two collaborators through the traits defined here:
//!
//! - [`TokenLedger`]: the fungible balance ledger that holds escrowed stake.
//! - [`CallHost`]: the environment that invokes target accounts with a
//!   payload and a value, and can roll its own state back to a checkpoint.
//!
//! Production embeddings implement these against their ledger and VM; the
//! `agora-nullables` crate provides deterministic in-memory versions.

pub mod call;
pub mod error;
pub mod token;

pub use call::{CallHost, CallRecord};
pub use error::{CallError, TokenError};
pub use token::TokenLedger;
