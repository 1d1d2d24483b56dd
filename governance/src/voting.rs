//! Weighted voting against registry entries.

use crate::deposit::DepositLedger;
use crate::error::GovernanceError;
use crate::registry::ProposalRegistry;
use agora_types::{Address, ProposalId, Timestamp};
use tracing::debug;

/// What a successful vote changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VoteReceipt {
    pub id: ProposalId,
    pub voter: Address,
    pub weight: u128,
    pub support: bool,
    /// Tallies after the vote.
    pub yes: u128,
    pub no: u128,
}

/// Validates and records votes.
pub struct VotingEngine;

impl VotingEngine {
    /// Record `voter`'s vote of `weight` on `id`.
    ///
    /// Checks run in a fixed order: existence, then the debate window, then
    /// the voter's live deposit, then prior participation. On success the
    /// weight is added to one side of the tally and locked against
    /// withdrawal until the proposal is finalized.
    #[allow(clippy::too_many_arguments)]
    pub fn cast_vote(
        &self,
        registry: &mut ProposalRegistry,
        ledger: &mut DepositLedger,
        voter: &Address,
        id: &ProposalId,
        weight: u128,
        support: bool,
        now: Timestamp,
    ) -> Result<VoteReceipt, GovernanceError> {
        let available = ledger.balance_of(voter);
        let proposal = registry.require_mut(id)?;

        if !proposal.is_open(now) {
            return Err(GovernanceError::DebateEnded);
        }
        if weight > available {
            return Err(GovernanceError::InsufficientDeposit {
                needed: weight,
                available,
            });
        }
        if proposal.has_voted(voter) {
            return Err(GovernanceError::AlreadyVoted(*voter));
        }

        let (yes, no) = if support {
            let yes = proposal
                .yes
                .checked_add(weight)
                .ok_or(GovernanceError::Overflow)?;
            (yes, proposal.no)
        } else {
            let no = proposal
                .no
                .checked_add(weight)
                .ok_or(GovernanceError::Overflow)?;
            (proposal.yes, no)
        };
        proposal.yes = yes;
        proposal.no = no;
        proposal.voters.insert(*voter);
        ledger.lock(voter, id, weight);

        debug!(%id, %voter, weight, support, yes, no, "vote recorded");
        Ok(VoteReceipt {
            id: *id,
            voter: *voter,
            weight,
            support,
            yes,
            no,
        })
    }
}
