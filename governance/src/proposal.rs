//! Proposals and their lifecycle.

use crate::error::GovernanceError;
use agora_crypto::{description_hash, proposal_id};
use agora_types::{Address, DescriptionHash, ProposalId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Lifecycle state of a proposal.
///
/// `Debated` is the only non-terminal state; a proposal leaves it exactly
/// once, for `Executed` or `Defeated`, and never changes again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProposalState {
    /// Open for votes until `end`, then awaiting finalization.
    Debated,
    /// Majority in favour; every call succeeded.
    Executed,
    /// Quorum met but `yes <= no`; no calls were made.
    Defeated,
}

impl ProposalState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Debated)
    }
}

impl fmt::Display for ProposalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Debated => write!(f, "debated"),
            Self::Executed => write!(f, "executed"),
            Self::Defeated => write!(f, "defeated"),
        }
    }
}

/// The actions a proposal performs, as three parallel sequences.
///
/// Call `i` invokes `recipients[i]` with `payloads[i]`, transferring
/// `values[i]`. Calls run in index order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalCalls {
    pub recipients: Vec<Address>,
    pub payloads: Vec<Vec<u8>>,
    pub values: Vec<u128>,
}

impl ProposalCalls {
    pub fn new(recipients: Vec<Address>, payloads: Vec<Vec<u8>>, values: Vec<u128>) -> Self {
        Self {
            recipients,
            payloads,
            values,
        }
    }

    /// A proposal with a single call.
    pub fn single(recipient: Address, payload: Vec<u8>, value: u128) -> Self {
        Self::new(vec![recipient], vec![payload], vec![value])
    }

    /// Append a call.
    pub fn with_call(mut self, recipient: Address, payload: Vec<u8>, value: u128) -> Self {
        self.recipients.push(recipient);
        self.payloads.push(payload);
        self.values.push(value);
        self
    }

    /// Check that the sequences are parallel and non-empty.
    ///
    /// Length agreement is checked first: `([], [p], [v])` is
    /// `InvalidLength`, and only three empty sequences are `EmptyProposal`.
    pub fn validate(&self) -> Result<(), GovernanceError> {
        let (r, p, v) = (self.recipients.len(), self.payloads.len(), self.values.len());
        if r != p || r != v {
            return Err(GovernanceError::InvalidLength {
                recipients: r,
                payloads: p,
                values: v,
            });
        }
        if r == 0 {
            return Err(GovernanceError::EmptyProposal);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.recipients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipients.is_empty()
    }

    /// Iterate calls as `(recipient, payload, value)` in execution order.
    pub fn iter(&self) -> impl Iterator<Item = (&Address, &[u8], u128)> {
        self.recipients
            .iter()
            .zip(&self.payloads)
            .zip(&self.values)
            .map(|((r, p), v)| (r, p.as_slice(), *v))
    }

    /// Identity of a proposal with these calls and a pre-hashed description.
    pub fn id_with_hash(&self, description_hash: &DescriptionHash) -> ProposalId {
        proposal_id(&self.recipients, &self.payloads, &self.values, description_hash)
    }

    /// Identity of a proposal with these calls and `description`.
    pub fn id(&self, description: &str) -> ProposalId {
        self.id_with_hash(&description_hash(description))
    }
}

/// A governance proposal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    /// Content hash of `calls` and `description_hash`.
    pub id: ProposalId,
    pub calls: ProposalCalls,
    pub description: String,
    pub description_hash: DescriptionHash,
    /// Creation time.
    pub start: Timestamp,
    /// Voting closes at `end` (exclusive); finalization opens at `end`.
    pub end: Timestamp,
    /// Weight in favour, seeded with the administrator's deposit.
    pub yes: u128,
    /// Weight against.
    pub no: u128,
    pub state: ProposalState,
    /// Accounts that have cast a vote. The administrator's implicit seed
    /// vote does not add it here.
    pub voters: BTreeSet<Address>,
}

impl Proposal {
    /// Whether `now` is still inside the debate window.
    pub fn is_open(&self, now: Timestamp) -> bool {
        self.state == ProposalState::Debated && !self.end.has_passed(now)
    }

    pub fn has_voted(&self, account: &Address) -> bool {
        self.voters.contains(account)
    }
}
