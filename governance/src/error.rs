use agora_host::TokenError;
use agora_types::Address;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GovernanceError {
    #[error("caller {0} is not the administrator")]
    AccessDenied(Address),

    #[error("address can't be zero: {0}")]
    ZeroAddress(&'static str),

    #[error("empty proposal")]
    EmptyProposal,

    #[error("invalid proposal length: {recipients} recipients, {payloads} payloads, {values} values")]
    InvalidLength {
        recipients: usize,
        payloads: usize,
        values: usize,
    },

    #[error("proposal {0} is already created")]
    DuplicateProposal(String),

    #[error("no such proposal: {0}")]
    ProposalNotFound(String),

    #[error("proposal debate is not finished: ends at {end}, now {now}")]
    DebateNotFinished { end: u64, now: u64 },

    #[error("proposal debate has ended")]
    DebateEnded,

    #[error("proposal is already finalized")]
    DebateAlreadyFinalized,

    #[error("{0} has already voted on this proposal")]
    AlreadyVoted(Address),

    #[error("not enough deposit: have {available}, need {needed}")]
    InsufficientDeposit { needed: u128, available: u128 },

    #[error("deposit is locked by open votes: locked {locked}, withdrawable {withdrawable}, requested {requested}")]
    DepositLocked {
        locked: u128,
        withdrawable: u128,
        requested: u128,
    },

    #[error("insufficient external balance: need {needed}, available {available}")]
    InsufficientExternalBalance { needed: u128, available: u128 },

    #[error("insufficient allowance: need {needed}, available {available}")]
    InsufficientAllowance { needed: u128, available: u128 },

    #[error("minimum quorum has not been reached: {cast} < {quorum}")]
    QuorumNotReached { cast: u128, quorum: u128 },

    #[error("call {index} to {target} failed: {reason}")]
    ExternalCallFailed {
        index: usize,
        target: Address,
        reason: String,
    },

    #[error("operation rejected while proposal {0} is executing")]
    ReentrantCall(String),

    #[error("amount must be non-zero")]
    ZeroAmount,

    #[error("arithmetic overflow")]
    Overflow,

    #[error("token ledger error: {0}")]
    Ledger(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("snapshot error: {0}")]
    Snapshot(String),
}

impl From<TokenError> for GovernanceError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::InsufficientBalance { needed, available } => {
                Self::InsufficientExternalBalance { needed, available }
            }
            TokenError::InsufficientAllowance { needed, available } => {
                Self::InsufficientAllowance { needed, available }
            }
            TokenError::Overflow => Self::Overflow,
            TokenError::Other(msg) => Self::Ledger(msg),
        }
    }
}
