//! Persisted governance state.

use crate::deposit::DepositLedger;
use crate::error::GovernanceError;
use crate::events::EventLog;
use crate::registry::ProposalRegistry;
use serde::{Deserialize, Serialize};

/// Registry, ledger and event log of one instance.
///
/// The configuration is not included; it is supplied again on restore.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GovernanceSnapshot {
    pub registry: ProposalRegistry,
    pub ledger: DepositLedger,
    pub events: EventLog,
}

impl GovernanceSnapshot {
    /// Encode with bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>, GovernanceError> {
        bincode::serialize(self).map_err(|e| GovernanceError::Snapshot(e.to_string()))
    }

    /// Decode and validate bytes produced by [`to_bytes`](Self::to_bytes).
    pub fn from_bytes(data: &[u8]) -> Result<Self, GovernanceError> {
        let snapshot: Self =
            bincode::deserialize(data).map_err(|e| GovernanceError::Snapshot(e.to_string()))?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Reject snapshots whose parts disagree with each other.
    pub fn validate(&self) -> Result<(), GovernanceError> {
        let sum = self
            .ledger
            .accounts()
            .try_fold(0u128, |acc, (_, balance)| acc.checked_add(balance))
            .ok_or(GovernanceError::Overflow)?;
        if sum != self.ledger.total_custodied() {
            return Err(GovernanceError::Snapshot(format!(
                "deposits sum to {sum} but {} is custodied",
                self.ledger.total_custodied()
            )));
        }
        self.registry.validate()?;
        for (account, id, weight) in self.ledger.locks() {
            let proposal = self.registry.get(id).ok_or_else(|| {
                GovernanceError::Snapshot(format!("{account} holds a lock on unknown proposal {id}"))
            })?;
            if proposal.state.is_terminal() {
                return Err(GovernanceError::Snapshot(format!(
                    "{account} holds a lock on finalized proposal {id}"
                )));
            }
            if !proposal.has_voted(account) {
                return Err(GovernanceError::Snapshot(format!(
                    "{account} holds a lock on {id} without a vote"
                )));
            }
            let balance = self.ledger.balance_of(account);
            if weight > balance {
                return Err(GovernanceError::Snapshot(format!(
                    "{account} has {weight} locked on {id} but only {balance} deposited"
                )));
            }
        }
        if let Some((i, record)) = self
            .events
            .records()
            .iter()
            .enumerate()
            .find(|(i, r)| r.seq != *i as u64)
        {
            return Err(GovernanceError::Snapshot(format!(
                "event {i} carries sequence number {}",
                record.seq
            )));
        }
        Ok(())
    }
}
