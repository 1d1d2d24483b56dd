//! Nullable call host: scripted targets with checkpoint/revert.

use agora_host::{CallError, CallHost, CallRecord};
use agora_types::Address;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Per-target key/value storage.
pub type Storage = BTreeMap<Vec<u8>, Vec<u8>>;

/// Code deployed at a target address.
///
/// Receives the call and a working copy of the target's storage. The copy is
/// written back only if the function returns `Ok`, so a failing target never
/// leaves partial writes behind. The host lock is not held while the function
/// runs; targets may call back into whatever they captured.
pub type TargetFn = Arc<dyn Fn(&CallRecord, &mut Storage) -> Result<Vec<u8>, CallError> + Send + Sync>;

/// Storage key used by [`NullHost::deploy_value_store`].
const VALUE_KEY: &[u8] = b"value";

#[derive(Clone, Debug, Default)]
struct World {
    /// Native balances used for call values.
    balances: HashMap<Address, u128>,
    storage: HashMap<Address, Storage>,
    /// Successful calls since creation, rolled back with the world.
    call_log: Vec<CallRecord>,
}

/// Host state captured by [`CallHost::checkpoint`].
#[derive(Debug)]
pub struct NullCheckpoint(World);

/// An in-memory call host for testing.
///
/// Targets are plain closures registered with [`deploy`](Self::deploy).
/// Two logs are kept: [`call_log`](Self::call_log) holds the calls whose
/// effects are currently live and is rolled back by `revert_to`, while
/// [`attempts`](Self::attempts) records every call ever tried.
pub struct NullHost {
    targets: Mutex<HashMap<Address, TargetFn>>,
    world: Mutex<World>,
    attempts: Mutex<Vec<CallRecord>>,
}

impl NullHost {
    pub fn new() -> Self {
        Self {
            targets: Mutex::new(HashMap::new()),
            world: Mutex::new(World::default()),
            attempts: Mutex::new(Vec::new()),
        }
    }

    fn world(&self) -> MutexGuard<'_, World> {
        self.world.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Install `code` at `target`, replacing anything already there.
    pub fn deploy<F>(&self, target: Address, code: F)
    where
        F: Fn(&CallRecord, &mut Storage) -> Result<Vec<u8>, CallError> + Send + Sync + 'static,
    {
        let code: TargetFn = Arc::new(code);
        self.targets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(target, code);
    }

    /// Remove the code at `target`; later calls fail with `NoSuchTarget`.
    pub fn undeploy(&self, target: &Address) {
        self.targets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(target);
    }

    /// Deploy a target that stores the `u128` carried by a
    /// [`set_value_payload`](Self::set_value_payload) payload.
    pub fn deploy_value_store(&self, target: Address) {
        self.deploy(target, |call, storage| {
            let bytes: [u8; 16] = call
                .payload
                .as_slice()
                .try_into()
                .map_err(|_| CallError::Reverted("malformed payload".into()))?;
            storage.insert(VALUE_KEY.to_vec(), bytes.to_vec());
            Ok(Vec::new())
        });
    }

    /// Deploy a target that always reverts with `reason`.
    pub fn deploy_failing(&self, target: Address, reason: &str) {
        let reason = reason.to_string();
        self.deploy(target, move |_, _| Err(CallError::Reverted(reason.clone())));
    }

    /// Payload understood by [`deploy_value_store`](Self::deploy_value_store)
    /// targets.
    pub fn set_value_payload(value: u128) -> Vec<u8> {
        value.to_le_bytes().to_vec()
    }

    /// Value held by a value-store target, if it was ever set.
    pub fn value_of(&self, target: &Address) -> Option<u128> {
        let world = self.world();
        let bytes = world.storage.get(target)?.get(VALUE_KEY)?;
        let bytes: [u8; 16] = bytes.as_slice().try_into().ok()?;
        Some(u128::from_le_bytes(bytes))
    }

    /// Give `account` native units to attach to calls.
    pub fn fund(&self, account: &Address, amount: u128) {
        let mut world = self.world();
        let balance = world.balances.entry(*account).or_insert(0);
        *balance = balance.saturating_add(amount);
    }

    pub fn balance_of(&self, account: &Address) -> u128 {
        self.world().balances.get(account).copied().unwrap_or(0)
    }

    /// Calls whose effects are live.
    pub fn call_log(&self) -> Vec<CallRecord> {
        self.world().call_log.clone()
    }

    /// Every call attempted, including failed and reverted ones.
    pub fn attempts(&self) -> Vec<CallRecord> {
        self.attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for NullHost {
    fn default() -> Self {
        Self::new()
    }
}

impl CallHost for NullHost {
    type Checkpoint = NullCheckpoint;

    fn checkpoint(&self) -> NullCheckpoint {
        NullCheckpoint(self.world().clone())
    }

    fn call(
        &self,
        from: &Address,
        target: &Address,
        payload: &[u8],
        value: u128,
    ) -> Result<Vec<u8>, CallError> {
        let record = CallRecord {
            from: *from,
            target: *target,
            payload: payload.to_vec(),
            value,
        };
        self.attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());

        let code = self
            .targets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(target)
            .cloned()
            .ok_or(CallError::NoSuchTarget(*target))?;

        let mut storage = {
            let world = self.world();
            let available = world.balances.get(from).copied().unwrap_or(0);
            if value > available {
                return Err(CallError::InsufficientValue {
                    needed: value,
                    available,
                });
            }
            world.storage.get(target).cloned().unwrap_or_default()
        };

        // Lock released: the target may re-enter.
        let output = code(&record, &mut storage)?;

        let mut world = self.world();
        let available = world.balances.get(from).copied().unwrap_or(0);
        if value > available {
            return Err(CallError::InsufficientValue {
                needed: value,
                available,
            });
        }
        if value > 0 && from != target {
            world.balances.insert(*from, available - value);
            let credited = world.balances.entry(*target).or_insert(0);
            *credited = credited.saturating_add(value);
        }
        world.storage.insert(*target, storage);
        world.call_log.push(record);
        Ok(output)
    }

    fn revert_to(&self, checkpoint: NullCheckpoint) {
        *self.world() = checkpoint.0;
    }

    fn commit(&self, _checkpoint: NullCheckpoint) {}
}
