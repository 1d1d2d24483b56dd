//! Content-addressed proposal store.

use crate::error::GovernanceError;
use crate::proposal::{Proposal, ProposalCalls, ProposalState};
use agora_crypto::description_hash;
use agora_types::{ProposalId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Owns every proposal ever created, keyed by identity.
///
/// Records are never removed; terminal proposals stay as history.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProposalRegistry {
    proposals: HashMap<ProposalId, Proposal>,
    /// Identities in creation order.
    order: Vec<ProposalId>,
}

impl ProposalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, id: &ProposalId) -> bool {
        self.proposals.contains_key(id)
    }

    pub fn get(&self, id: &ProposalId) -> Option<&Proposal> {
        self.proposals.get(id)
    }

    /// Like [`get`](Self::get) but fails with `ProposalNotFound`.
    pub fn require(&self, id: &ProposalId) -> Result<&Proposal, GovernanceError> {
        self.proposals
            .get(id)
            .ok_or_else(|| GovernanceError::ProposalNotFound(id.to_string()))
    }

    pub(crate) fn require_mut(&mut self, id: &ProposalId) -> Result<&mut Proposal, GovernanceError> {
        self.proposals
            .get_mut(id)
            .ok_or_else(|| GovernanceError::ProposalNotFound(id.to_string()))
    }

    /// Identities in creation order.
    pub fn ids(&self) -> &[ProposalId] {
        &self.order
    }

    /// Proposals in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Proposal> {
        self.order.iter().filter_map(|id| self.proposals.get(id))
    }

    /// Register a new proposal in the `Debated` state.
    ///
    /// `yes_seed` becomes the initial `yes` tally. Fails without touching
    /// the registry if the calls are malformed, the debate window overflows
    /// the clock, or the identity already exists.
    pub fn create(
        &mut self,
        calls: ProposalCalls,
        description: &str,
        yes_seed: u128,
        now: Timestamp,
        debate_window: u64,
    ) -> Result<&Proposal, GovernanceError> {
        calls.validate()?;
        let description_hash = description_hash(description);
        let id = calls.id_with_hash(&description_hash);
        if self.proposals.contains_key(&id) {
            return Err(GovernanceError::DuplicateProposal(id.to_string()));
        }
        let end = now
            .checked_add(debate_window)
            .ok_or(GovernanceError::Overflow)?;

        let proposal = Proposal {
            id,
            calls,
            description: description.to_string(),
            description_hash,
            start: now,
            end,
            yes: yes_seed,
            no: 0,
            state: ProposalState::Debated,
            voters: BTreeSet::new(),
        };
        self.order.push(id);
        Ok(self.proposals.entry(id).or_insert(proposal))
    }

    /// Check that the creation order lists every proposal exactly once and
    /// that each proposal is stored under its own identity.
    pub fn validate(&self) -> Result<(), GovernanceError> {
        let mut seen = BTreeSet::new();
        for id in &self.order {
            if !seen.insert(*id) {
                return Err(GovernanceError::Snapshot(format!(
                    "proposal {id} listed twice"
                )));
            }
            if !self.proposals.contains_key(id) {
                return Err(GovernanceError::Snapshot(format!(
                    "proposal {id} listed but not stored"
                )));
            }
        }
        if seen.len() != self.proposals.len() {
            return Err(GovernanceError::Snapshot(
                "stored proposals missing from the creation order".into(),
            ));
        }
        if let Some((key, proposal)) = self.proposals.iter().find(|(key, p)| **key != p.id) {
            return Err(GovernanceError::Snapshot(format!(
                "proposal {} stored under {key}",
                proposal.id
            )));
        }
        Ok(())
    }

    /// Move a `Debated` proposal to a terminal state.
    pub(crate) fn finalize(
        &mut self,
        id: &ProposalId,
        outcome: ProposalState,
    ) -> Result<&Proposal, GovernanceError> {
        debug_assert!(outcome.is_terminal());
        let proposal = self.require_mut(id)?;
        if proposal.state.is_terminal() {
            return Err(GovernanceError::DebateAlreadyFinalized);
        }
        proposal.state = outcome;
        Ok(proposal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_types::Address;

    fn calls() -> ProposalCalls {
        ProposalCalls::single(Address::repeat_byte(7), vec![1, 2, 3], 10)
    }

    #[test]
    fn create_sets_window_and_seed() {
        let mut registry = ProposalRegistry::new();
        let p = registry
            .create(calls(), "Test description", 1000, Timestamp::new(5), 100)
            .unwrap();
        assert_eq!(p.start, Timestamp::new(5));
        assert_eq!(p.end, Timestamp::new(105));
        assert_eq!(p.yes, 1000);
        assert_eq!(p.no, 0);
        assert_eq!(p.state, ProposalState::Debated);
        assert!(p.voters.is_empty());
        assert_eq!(p.id, calls().id("Test description"));
    }

    #[test]
    fn duplicate_rejected() {
        let mut registry = ProposalRegistry::new();
        registry.create(calls(), "d", 0, Timestamp::new(1), 10).unwrap();
        let err = registry.create(calls(), "d", 0, Timestamp::new(2), 10).unwrap_err();
        assert!(matches!(err, GovernanceError::DuplicateProposal(_)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn same_calls_new_description_is_distinct() {
        let mut registry = ProposalRegistry::new();
        registry.create(calls(), "a", 0, Timestamp::new(1), 10).unwrap();
        registry.create(calls(), "b", 0, Timestamp::new(1), 10).unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn window_overflow_rejected() {
        let mut registry = ProposalRegistry::new();
        let err = registry
            .create(calls(), "d", 0, Timestamp::new(u64::MAX), 1)
            .unwrap_err();
        assert_eq!(err, GovernanceError::Overflow);
        assert!(registry.is_empty());
    }

    #[test]
    fn finalize_once() {
        let mut registry = ProposalRegistry::new();
        let id = registry.create(calls(), "d", 0, Timestamp::new(1), 10).unwrap().id;
        registry.finalize(&id, ProposalState::Defeated).unwrap();
        assert_eq!(
            registry.finalize(&id, ProposalState::Executed).unwrap_err(),
            GovernanceError::DebateAlreadyFinalized
        );
        assert_eq!(registry.require(&id).unwrap().state, ProposalState::Defeated);
    }

    #[test]
    fn iteration_in_creation_order() {
        let mut registry = ProposalRegistry::new();
        let a = registry.create(calls(), "a", 0, Timestamp::new(1), 10).unwrap().id;
        let b = registry.create(calls(), "b", 0, Timestamp::new(1), 10).unwrap().id;
        assert_eq!(registry.ids(), &[a, b]);
        let seen: Vec<_> = registry.iter().map(|p| p.id).collect();
        assert_eq!(seen, vec![a, b]);
    }

    #[test]
    fn missing_proposal() {
        let registry = ProposalRegistry::new();
        assert!(matches!(
            registry.require(&ProposalId::ZERO),
            Err(GovernanceError::ProposalNotFound(_))
        ));
    }

    #[test]
    fn validate_accepts_created_proposals() {
        let mut registry = ProposalRegistry::new();
        registry.create(calls(), "a", 0, Timestamp::new(1), 10).unwrap();
        registry.create(calls(), "b", 0, Timestamp::new(1), 10).unwrap();
        assert_eq!(registry.validate(), Ok(()));
    }

    #[test]
    fn validate_rejects_repeated_order_entry() {
        let mut registry = ProposalRegistry::new();
        let a = registry.create(calls(), "a", 0, Timestamp::new(1), 10).unwrap().id;
        registry.create(calls(), "b", 0, Timestamp::new(1), 10).unwrap();
        // Same length as the table, but `b` is never listed.
        registry.order = vec![a, a];
        assert!(matches!(registry.validate(), Err(GovernanceError::Snapshot(_))));
    }

    #[test]
    fn validate_rejects_unlisted_or_unstored() {
        let mut registry = ProposalRegistry::new();
        let a = registry.create(calls(), "a", 0, Timestamp::new(1), 10).unwrap().id;
        registry.order.clear();
        assert!(matches!(registry.validate(), Err(GovernanceError::Snapshot(_))));

        registry.order = vec![a, ProposalId::new([9; 32])];
        assert!(matches!(registry.validate(), Err(GovernanceError::Snapshot(_))));
    }

    #[test]
    fn validate_rejects_misfiled_proposal() {
        let mut registry = ProposalRegistry::new();
        let a = registry.create(calls(), "a", 0, Timestamp::new(1), 10).unwrap().id;
        let ghost = ProposalId::new([9; 32]);
        let proposal = registry.proposals.remove(&a).unwrap();
        registry.proposals.insert(ghost, proposal);
        registry.order = vec![ghost];
        assert!(matches!(registry.validate(), Err(GovernanceError::Snapshot(_))));
    }
}
