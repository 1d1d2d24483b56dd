//! Administrator gate for proposal creation and finalization.

use crate::error::GovernanceError;
use agora_types::Address;
use tracing::warn;

/// Admits only the configured administrator.
#[derive(Clone, Copy, Debug)]
pub struct AccessGate {
    administrator: Address,
}

impl AccessGate {
    pub fn new(administrator: Address) -> Self {
        Self { administrator }
    }

    pub fn administrator(&self) -> &Address {
        &self.administrator
    }

    /// Fail with `AccessDenied` unless `caller` is the administrator.
    pub fn ensure_administrator(&self, caller: &Address, action: &str) -> Result<(), GovernanceError> {
        if *caller != self.administrator {
            warn!(%caller, action, "access denied");
            return Err(GovernanceError::AccessDenied(*caller));
        }
        Ok(())
    }
}
