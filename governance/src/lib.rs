//! Token-weighted governance.
//!
//! An administrator registers proposals (ordered lists of external calls),
//! depositors vote on them with escrowed stake, and once a proposal's debate
//! window has passed and quorum is met it is either executed, atomically, or
//! defeated.
//!
//! Key principle: one unit of deposit = one unit of voting weight, and each
//! account votes at most once per proposal.
//!
//! [`Governance`] is the entry point; the component types are public for
//! embeddings that manage state themselves.

pub mod access;
pub mod config;
pub mod deposit;
pub mod engine;
pub mod error;
pub mod events;
pub mod execution;
pub mod proposal;
pub mod registry;
pub mod snapshot;
pub mod voting;

pub use access::AccessGate;
pub use config::{GovernanceConfig, LoggingConfig};
pub use deposit::DepositLedger;
pub use engine::Governance;
pub use error::GovernanceError;
pub use events::{EventBus, EventLog, EventRecord, GovernanceEvent, Listener};
pub use execution::{ExecutionEngine, FinalizationOutcome, Verdict};
pub use proposal::{Proposal, ProposalCalls, ProposalState};
pub use registry::ProposalRegistry;
pub use snapshot::GovernanceSnapshot;
pub use voting::{VoteReceipt, VotingEngine};
