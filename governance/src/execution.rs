//! Finalization: quorum and majority checks, then atomic execution.
//!
//! Finalization is split in three steps so the facade can release its state
//! lock while target code runs:
//!
//! 1. [`ExecutionEngine::assess`] decides, without mutating anything,
//!    whether the proposal is approved or rejected;
//! 2. [`ExecutionEngine::execute`] performs an approved proposal's calls
//!    inside one host checkpoint;
//! 3. [`ExecutionEngine::conclude`] records the terminal state and releases
//!    the voters' locks.

use crate::deposit::DepositLedger;
use crate::error::GovernanceError;
use crate::proposal::{ProposalCalls, ProposalState};
use crate::registry::ProposalRegistry;
use agora_host::CallHost;
use agora_types::{Address, ProposalId, Timestamp};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Decision reached once the debate is over and quorum is met.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// `yes > no`; the calls to perform.
    Approve(ProposalCalls),
    /// `yes <= no`.
    Reject,
}

/// Result of a successful finalization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinalizationOutcome {
    /// Every call succeeded.
    Executed { calls: usize },
    /// Rejected by majority; nothing was called.
    Defeated,
}

impl FinalizationOutcome {
    pub fn state(&self) -> ProposalState {
        match self {
            Self::Executed { .. } => ProposalState::Executed,
            Self::Defeated => ProposalState::Defeated,
        }
    }
}

pub struct ExecutionEngine;

impl ExecutionEngine {
    /// Check that `id` may be finalized at `now` and decide its outcome.
    ///
    /// Fails, in order, with `ProposalNotFound`, `DebateNotFinished`,
    /// `DebateAlreadyFinalized` or `QuorumNotReached`. A tie is a rejection.
    pub fn assess(
        &self,
        registry: &ProposalRegistry,
        id: &ProposalId,
        quorum: u128,
        now: Timestamp,
    ) -> Result<Verdict, GovernanceError> {
        let proposal = registry.require(id)?;
        if !proposal.end.has_passed(now) {
            return Err(GovernanceError::DebateNotFinished {
                end: proposal.end.as_ticks(),
                now: now.as_ticks(),
            });
        }
        if proposal.state.is_terminal() {
            return Err(GovernanceError::DebateAlreadyFinalized);
        }
        // Saturating: an overflowing tally exceeds any quorum.
        let cast = proposal.yes.saturating_add(proposal.no);
        if cast < quorum {
            return Err(GovernanceError::QuorumNotReached { cast, quorum });
        }

        debug!(%id, yes = proposal.yes, no = proposal.no, quorum, "proposal assessed");
        if proposal.yes > proposal.no {
            Ok(Verdict::Approve(proposal.calls.clone()))
        } else {
            Ok(Verdict::Reject)
        }
    }

    /// Perform `calls` from `from`, in order, as one all-or-nothing unit.
    ///
    /// The first failing call rolls the host back to the state before the
    /// first call and is reported as `ExternalCallFailed` with its index.
    /// Returns the number of calls made.
    pub fn execute<H: CallHost + ?Sized>(
        &self,
        host: &H,
        from: &Address,
        calls: &ProposalCalls,
    ) -> Result<usize, GovernanceError> {
        let checkpoint = host.checkpoint();
        for (index, (target, payload, value)) in calls.iter().enumerate() {
            if let Err(err) = host.call(from, target, payload, value) {
                host.revert_to(checkpoint);
                warn!(index, %target, value, error = %err, "proposal call failed, reverted");
                return Err(GovernanceError::ExternalCallFailed {
                    index,
                    target: *target,
                    reason: err.to_string(),
                });
            }
            debug!(index, %target, value, "proposal call succeeded");
        }
        host.commit(checkpoint);
        Ok(calls.len())
    }

    /// Move `id` to `outcome`'s terminal state and release its vote locks.
    pub fn conclude(
        &self,
        registry: &mut ProposalRegistry,
        ledger: &mut DepositLedger,
        id: &ProposalId,
        outcome: FinalizationOutcome,
    ) -> Result<(), GovernanceError> {
        let proposal = registry.finalize(id, outcome.state())?;
        ledger.release(id, &proposal.voters);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voting::VotingEngine;
    use agora_host::CallError;
    use agora_nullables::{NullHost, NullToken};

    const CUSTODY: Address = Address::repeat_byte(0xdd);
    const TARGET: Address = Address::repeat_byte(0x99);

    fn setup(votes: &[(u8, u128, bool)]) -> (ProposalRegistry, DepositLedger, ProposalId) {
        let token = NullToken::new(Address::repeat_byte(0x70));
        let mut ledger = DepositLedger::new();
        let mut registry = ProposalRegistry::new();
        let calls = ProposalCalls::single(TARGET, b"changeValue".to_vec(), 0);
        let id = registry
            .create(calls, "Test description", 0, Timestamp::new(0), 100)
            .unwrap()
            .id;
        for &(who, weight, support) in votes {
            let voter = Address::repeat_byte(who);
            token.mint(&voter, weight);
            token.approve(&voter, &CUSTODY, weight);
            ledger.deposit(&token, &CUSTODY, &voter, weight).unwrap();
            VotingEngine
                .cast_vote(&mut registry, &mut ledger, &voter, &id, weight, support, Timestamp::new(1))
                .unwrap();
        }
        (registry, ledger, id)
    }

    #[test]
    fn before_end_not_finished() {
        let (registry, _, id) = setup(&[(1, 500, true)]);
        assert_eq!(
            ExecutionEngine.assess(&registry, &id, 100, Timestamp::new(99)),
            Err(GovernanceError::DebateNotFinished { end: 100, now: 99 })
        );
    }

    #[test]
    fn quorum_not_reached() {
        let (registry, _, id) = setup(&[(1, 40, true), (2, 59, false)]);
        assert_eq!(
            ExecutionEngine.assess(&registry, &id, 100, Timestamp::new(100)),
            Err(GovernanceError::QuorumNotReached {
                cast: 99,
                quorum: 100
            })
        );
    }

    #[test]
    fn majority_approves() {
        let (registry, _, id) = setup(&[(1, 60, true), (2, 40, false)]);
        assert!(matches!(
            ExecutionEngine.assess(&registry, &id, 100, Timestamp::new(100)),
            Ok(Verdict::Approve(_))
        ));
    }

    #[test]
    fn tie_rejects() {
        let (registry, _, id) = setup(&[(1, 50, true), (2, 50, false)]);
        assert_eq!(
            ExecutionEngine.assess(&registry, &id, 100, Timestamp::new(100)),
            Ok(Verdict::Reject)
        );
    }

    #[test]
    fn conclude_releases_locks_and_blocks_refinalization() {
        let (mut registry, mut ledger, id) = setup(&[(1, 60, true), (2, 40, false)]);
        assert_eq!(ledger.locked_of(&Address::repeat_byte(1)), 60);

        ExecutionEngine
            .conclude(&mut registry, &mut ledger, &id, FinalizationOutcome::Defeated)
            .unwrap();
        assert_eq!(ledger.locked_of(&Address::repeat_byte(1)), 0);
        assert_eq!(ledger.locked_of(&Address::repeat_byte(2)), 0);
        assert_eq!(registry.require(&id).unwrap().state, ProposalState::Defeated);
        assert_eq!(
            ExecutionEngine.assess(&registry, &id, 100, Timestamp::new(200)),
            Err(GovernanceError::DebateAlreadyFinalized)
        );
    }

    #[test]
    fn execute_runs_calls_in_order() {
        let host = NullHost::new();
        let a = Address::repeat_byte(0xa1);
        let b = Address::repeat_byte(0xb1);
        host.deploy_value_store(a);
        host.deploy_value_store(b);
        let calls = ProposalCalls::single(a, NullHost::set_value_payload(1), 0)
            .with_call(b, NullHost::set_value_payload(2), 0);

        assert_eq!(ExecutionEngine.execute(&host, &CUSTODY, &calls), Ok(2));
        assert_eq!(host.value_of(&a), Some(1));
        assert_eq!(host.value_of(&b), Some(2));
        let order: Vec<_> = host.call_log().iter().map(|c| c.target).collect();
        assert_eq!(order, vec![a, b]);
    }

    #[test]
    fn failed_call_reverts_earlier_calls() {
        let host = NullHost::new();
        let a = Address::repeat_byte(0xa1);
        let bad = Address::repeat_byte(0xbb);
        host.deploy_value_store(a);
        host.deploy_failing(bad, "nope");
        let calls = ProposalCalls::single(a, NullHost::set_value_payload(7), 0)
            .with_call(bad, vec![], 0);

        let err = ExecutionEngine.execute(&host, &CUSTODY, &calls).unwrap_err();
        assert_eq!(
            err,
            GovernanceError::ExternalCallFailed {
                index: 1,
                target: bad,
                reason: CallError::Reverted("nope".into()).to_string(),
            }
        );
        assert_eq!(host.value_of(&a), None);
        assert!(host.call_log().is_empty());
        assert_eq!(host.attempts().len(), 2);
    }

    #[test]
    fn missing_target_fails() {
        let host = NullHost::new();
        let calls = ProposalCalls::single(TARGET, vec![], 0);
        assert!(matches!(
            ExecutionEngine.execute(&host, &CUSTODY, &calls),
            Err(GovernanceError::ExternalCallFailed { index: 0, .. })
        ));
    }
}
