//! Nullable token ledger: thread-safe in-memory balances and allowances.

use agora_host::{TokenError, TokenLedger};
use agora_types::Address;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Default)]
struct Books {
    balances: HashMap<Address, u128>,
    /// (owner, spender) → remaining allowance.
    allowances: HashMap<(Address, Address), u128>,
}

/// An in-memory fungible token for testing.
///
/// Balances are created with [`mint`](Self::mint) and allowances with
/// [`approve`](Self::approve); there is no total supply cap.
#[derive(Debug)]
pub struct NullToken {
    address: Address,
    books: Mutex<Books>,
}

impl NullToken {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            books: Mutex::new(Books::default()),
        }
    }

    /// Credit `amount` to `account` out of thin air.
    pub fn mint(&self, account: &Address, amount: u128) {
        let mut books = self.books.lock().unwrap_or_else(PoisonError::into_inner);
        let balance = books.balances.entry(*account).or_insert(0);
        *balance = balance.saturating_add(amount);
    }

    /// Let `spender` move up to `amount` of `owner`'s balance, replacing any
    /// previous allowance.
    pub fn approve(&self, owner: &Address, spender: &Address, amount: u128) {
        self.books
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .allowances
            .insert((*owner, *spender), amount);
    }

    /// Sum of all balances.
    pub fn total_supply(&self) -> u128 {
        self.books
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .balances
            .values()
            .fold(0u128, |acc, b| acc.saturating_add(*b))
    }
}

impl Books {
    fn move_balance(&mut self, from: &Address, to: &Address, amount: u128) -> Result<(), TokenError> {
        let available = self.balances.get(from).copied().unwrap_or(0);
        if amount > available {
            return Err(TokenError::InsufficientBalance {
                needed: amount,
                available,
            });
        }
        if from == to {
            return Ok(());
        }
        let credited = self
            .balances
            .get(to)
            .copied()
            .unwrap_or(0)
            .checked_add(amount)
            .ok_or(TokenError::Overflow)?;
        self.balances.insert(*from, available - amount);
        self.balances.insert(*to, credited);
        Ok(())
    }
}

impl TokenLedger for NullToken {
    fn ledger_address(&self) -> Address {
        self.address
    }

    fn balance_of(&self, account: &Address) -> u128 {
        self.books
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .balances
            .get(account)
            .copied()
            .unwrap_or(0)
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> u128 {
        self.books
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(0)
    }

    fn transfer(&self, from: &Address, to: &Address, amount: u128) -> Result<(), TokenError> {
        self.books
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .move_balance(from, to, amount)
    }

    fn transfer_from(
        &self,
        spender: &Address,
        owner: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), TokenError> {
        let mut books = self.books.lock().unwrap_or_else(PoisonError::into_inner);
        let allowed = books
            .allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(0);
        if amount > allowed {
            return Err(TokenError::InsufficientAllowance {
                needed: amount,
                available: allowed,
            });
        }
        books.move_balance(owner, to, amount)?;
        books.allowances.insert((*owner, *spender), allowed - amount);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(b: u8) -> Address {
        Address::repeat_byte(b)
    }

    #[test]
    fn mint_and_transfer() {
        let token = NullToken::new(addr(0x70));
        token.mint(&addr(1), 100);
        token.transfer(&addr(1), &addr(2), 30).unwrap();
        assert_eq!(token.balance_of(&addr(1)), 70);
        assert_eq!(token.balance_of(&addr(2)), 30);
        assert_eq!(token.total_supply(), 100);
    }

    #[test]
    fn transfer_beyond_balance_fails() {
        let token = NullToken::new(addr(0x70));
        token.mint(&addr(1), 10);
        assert_eq!(
            token.transfer(&addr(1), &addr(2), 11),
            Err(TokenError::InsufficientBalance {
                needed: 11,
                available: 10
            })
        );
        assert_eq!(token.balance_of(&addr(1)), 10);
    }

    #[test]
    fn transfer_from_spends_allowance() {
        let token = NullToken::new(addr(0x70));
        token.mint(&addr(1), 100);
        token.approve(&addr(1), &addr(9), 60);
        token.transfer_from(&addr(9), &addr(1), &addr(9), 50).unwrap();
        assert_eq!(token.allowance(&addr(1), &addr(9)), 10);
        assert_eq!(token.balance_of(&addr(9)), 50);
    }

    #[test]
    fn allowance_checked_before_balance() {
        let token = NullToken::new(addr(0x70));
        assert_eq!(
            token.transfer_from(&addr(9), &addr(1), &addr(9), 5),
            Err(TokenError::InsufficientAllowance {
                needed: 5,
                available: 0
            })
        );
    }

    #[test]
    fn failed_transfer_from_keeps_allowance() {
        let token = NullToken::new(addr(0x70));
        token.approve(&addr(1), &addr(9), 60);
        assert!(token.transfer_from(&addr(9), &addr(1), &addr(9), 50).is_err());
        assert_eq!(token.allowance(&addr(1), &addr(9)), 60);
    }
}
