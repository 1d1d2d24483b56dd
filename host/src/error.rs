use agora_types::Address;
use thiserror::Error;

/// Failures reported by a [`crate::TokenLedger`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("insufficient balance: need {needed}, available {available}")]
    InsufficientBalance { needed: u128, available: u128 },

    #[error("insufficient allowance: need {needed}, available {available}")]
    InsufficientAllowance { needed: u128, available: u128 },

    #[error("arithmetic overflow in token ledger")]
    Overflow,

    #[error("{0}")]
    Other(String),
}

/// Failures reported by a [`crate::CallHost`] for a single call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    #[error("no code deployed at {0}")]
    NoSuchTarget(Address),

    #[error("insufficient value: need {needed}, available {available}")]
    InsufficientValue { needed: u128, available: u128 },

    #[error("call reverted: {0}")]
    Reverted(String),
}
