//! Call host capability.

use crate::error::CallError;
use agora_types::Address;
use serde::{Deserialize, Serialize};

/// One external invocation, as attempted by the host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRecord {
    pub from: Address,
    pub target: Address,
    pub payload: Vec<u8>,
    pub value: u128,
}

/// The environment that runs target code.
///
/// Targets are untrusted: a call may fail, and it may have side effects on
/// host state (storage, native balances) before failing. To let a caller
/// group several calls into one all-or-nothing unit the host exposes
/// checkpoints:
///
/// 1. `checkpoint()` before the first call;
/// 2. `revert_to(cp)` to undo every effect since `cp`, or
/// 3. `commit(cp)` to keep them.
///
/// Each checkpoint must be consumed by exactly one of `revert_to` / `commit`.
pub trait CallHost: Send + Sync {
    type Checkpoint;

    /// Capture the host state.
    fn checkpoint(&self) -> Self::Checkpoint;

    /// Invoke `target` with `payload`, transferring `value` native units from
    /// `from`. Returns the target's return data.
    fn call(
        &self,
        from: &Address,
        target: &Address,
        payload: &[u8],
        value: u128,
    ) -> Result<Vec<u8>, CallError>;

    /// Undo every effect since `checkpoint`.
    fn revert_to(&self, checkpoint: Self::Checkpoint);

    /// Keep every effect since `checkpoint`.
    fn commit(&self, checkpoint: Self::Checkpoint);
}
