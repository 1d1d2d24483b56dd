//! Hashing primitives for the Agora governance engine.
//!
//! Everything content-addressed in Agora goes through Blake2b-256:
//! description digests and the deterministic proposal identity.

pub mod hash;
pub mod proposal;

pub use hash::blake2b_256;
pub use proposal::{description_hash, proposal_id, PROPOSAL_DOMAIN};
