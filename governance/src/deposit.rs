//! Deposit ledger: escrowed stake that backs voting weight.
//!
//! Deposits move from the depositor's token balance into the governance
//! custody account and are credited here. An entry is both the account's
//! voting power and its withdrawable claim, except that weight committed to
//! a proposal still under debate is locked until that proposal is finalized.
//!
//! Locking is enforced at withdrawal time only. A vote is checked against
//! the live entry, so one deposit may back votes on several proposals; the
//! lock is the largest weight cast on any open proposal, not their sum.

use crate::error::GovernanceError;
use agora_host::TokenLedger;
use agora_types::{Address, ProposalId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DepositLedger {
    balances: HashMap<Address, u128>,
    /// Always equal to the sum of `balances`.
    total_custodied: u128,
    /// account → (open proposal → weight cast).
    locks: HashMap<Address, HashMap<ProposalId, u128>>,
}

impl DepositLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Escrowed amount credited to `account`.
    pub fn balance_of(&self, account: &Address) -> u128 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    /// Sum of every entry.
    pub fn total_custodied(&self) -> u128 {
        self.total_custodied
    }

    /// Weight of `account`'s deposit held by votes on open proposals.
    pub fn locked_of(&self, account: &Address) -> u128 {
        self.locks
            .get(account)
            .and_then(|votes| votes.values().max().copied())
            .unwrap_or(0)
    }

    /// Part of `account`'s deposit that may be withdrawn right now.
    pub fn withdrawable_of(&self, account: &Address) -> u128 {
        self.balance_of(account)
            .saturating_sub(self.locked_of(account))
    }

    /// Accounts with a non-zero entry.
    pub fn accounts(&self) -> impl Iterator<Item = (&Address, u128)> {
        self.balances.iter().map(|(a, b)| (a, *b))
    }

    /// Every vote lock as (account, proposal, weight).
    pub fn locks(&self) -> impl Iterator<Item = (&Address, &ProposalId, u128)> {
        self.locks
            .iter()
            .flat_map(|(account, votes)| votes.iter().map(move |(id, w)| (account, id, *w)))
    }

    /// Pull `amount` from `account` into `custody` and credit it.
    ///
    /// The token transfer is the last fallible step, so a rejected transfer
    /// leaves the ledger untouched. Returns the new entry.
    pub fn deposit<T: TokenLedger + ?Sized>(
        &mut self,
        token: &T,
        custody: &Address,
        account: &Address,
        amount: u128,
    ) -> Result<u128, GovernanceError> {
        if amount == 0 {
            return Err(GovernanceError::ZeroAmount);
        }
        let balance = self
            .balance_of(account)
            .checked_add(amount)
            .ok_or(GovernanceError::Overflow)?;
        let total = self
            .total_custodied
            .checked_add(amount)
            .ok_or(GovernanceError::Overflow)?;

        token.transfer_from(custody, account, custody, amount)?;

        self.balances.insert(*account, balance);
        self.total_custodied = total;
        info!(%account, amount, balance, "deposit credited");
        Ok(balance)
    }

    /// Return `amount` from `custody` to `account` and debit it.
    ///
    /// Fails with `InsufficientDeposit` if the entry is too small and with
    /// `DepositLocked` if the excess is held by open votes. Returns the new
    /// entry.
    pub fn withdraw<T: TokenLedger + ?Sized>(
        &mut self,
        token: &T,
        custody: &Address,
        account: &Address,
        amount: u128,
    ) -> Result<u128, GovernanceError> {
        if amount == 0 {
            return Err(GovernanceError::ZeroAmount);
        }
        let available = self.balance_of(account);
        if amount > available {
            return Err(GovernanceError::InsufficientDeposit {
                needed: amount,
                available,
            });
        }
        let locked = self.locked_of(account);
        let withdrawable = available.saturating_sub(locked);
        if amount > withdrawable {
            return Err(GovernanceError::DepositLocked {
                locked,
                withdrawable,
                requested: amount,
            });
        }

        token.transfer(custody, account, amount)?;

        let balance = available - amount;
        if balance == 0 {
            self.balances.remove(account);
        } else {
            self.balances.insert(*account, balance);
        }
        self.total_custodied -= amount;
        info!(%account, amount, balance, "deposit withdrawn");
        Ok(balance)
    }

    /// Record that `account` committed `weight` to open proposal `id`.
    pub(crate) fn lock(&mut self, account: &Address, id: &ProposalId, weight: u128) {
        self.locks.entry(*account).or_default().insert(*id, weight);
    }

    /// Drop every lock held on `id` by `voters`.
    pub(crate) fn release<'a>(&mut self, id: &ProposalId, voters: impl IntoIterator<Item = &'a Address>) {
        for voter in voters {
            if let Some(votes) = self.locks.get_mut(voter) {
                votes.remove(id);
                if votes.is_empty() {
                    self.locks.remove(voter);
                }
            }
        }
    }
}
