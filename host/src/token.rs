//! Token ledger capability.

use crate::error::TokenError;
use agora_types::Address;

/// Escrow-style access to a fungible balance ledger.
///
/// Methods take `&self`: implementations own their synchronisation so the
/// same ledger can be shared between the governance engine and the code that
/// funds accounts.
pub trait TokenLedger: Send + Sync {
    /// Address under which this ledger is deployed.
    fn ledger_address(&self) -> Address;

    /// Spendable balance of `account`.
    fn balance_of(&self, account: &Address) -> u128;

    /// Amount `spender` may still move out of `owner`'s balance.
    fn allowance(&self, owner: &Address, spender: &Address) -> u128;

    /// Move `amount` from `from` to `to`, authorised by `from` itself.
    fn transfer(&self, from: &Address, to: &Address, amount: u128) -> Result<(), TokenError>;

    /// Move `amount` from `owner` to `to`, spending `spender`'s allowance.
    ///
    /// The allowance is checked before the balance, so a caller with neither
    /// sees `InsufficientAllowance`.
    fn transfer_from(
        &self,
        spender: &Address,
        owner: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), TokenError>;
}
