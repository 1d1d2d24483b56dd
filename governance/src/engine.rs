//! Governance facade: owns the stores and serializes every operation.

use crate::access::AccessGate;
use crate::config::GovernanceConfig;
use crate::deposit::DepositLedger;
use crate::error::GovernanceError;
use crate::events::{EventBus, EventLog, EventOutbox, EventRecord, GovernanceEvent};
use crate::execution::{ExecutionEngine, FinalizationOutcome, Verdict};
use crate::proposal::{Proposal, ProposalCalls, ProposalState};
use crate::registry::ProposalRegistry;
use crate::snapshot::GovernanceSnapshot;
use crate::voting::{VoteReceipt, VotingEngine};
use agora_crypto::description_hash;
use agora_host::{CallHost, TokenLedger};
use agora_types::{Address, DescriptionHash, ProposalId, Timestamp};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, RwLock};
use std::thread::{self, ThreadId};
use tracing::{debug, info, warn};

/// A proposal whose calls are running, and the thread running them.
#[derive(Clone, Copy, Debug)]
struct Execution {
    id: ProposalId,
    thread: ThreadId,
}

/// Everything guarded by the state lock.
struct GovernanceState {
    registry: ProposalRegistry,
    ledger: DepositLedger,
    events: EventLog,
    /// While set, mutating operations from `thread` fail with
    /// `ReentrantCall` and those from any other thread wait.
    executing: Option<Execution>,
}

/// Clears the in-flight marker and wakes waiting callers when dropped,
/// including on unwind.
///
/// Must be dropped while the state lock is not held by the same thread.
struct InFlight<'a> {
    state: &'a Mutex<GovernanceState>,
    idle: &'a Condvar,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .executing = None;
        self.idle.notify_all();
    }
}

/// A token-weighted governance instance.
///
/// All operations take `&self` and are serialized by one internal lock, so
/// an instance can be shared behind an `Arc`. Callers identify themselves
/// with `caller` and supply the current time with `now`.
///
/// The token ledger is invoked with the state lock held and must not call
/// back into the instance. Call targets run with the lock released: any
/// mutating operation they attempt on their own thread fails with
/// `ReentrantCall`, while other threads block until the calls finish. A
/// target must not wait on another thread that mutates the instance.
///
/// Listeners receive every committed event exactly once, in sequence order,
/// across all callers. An event committed by an operation called from
/// inside a listener is delivered after that listener returns.
pub struct Governance<T: TokenLedger, H: CallHost> {
    config: GovernanceConfig,
    access: AccessGate,
    token: Arc<T>,
    host: Arc<H>,
    state: Mutex<GovernanceState>,
    /// Signalled when the in-flight marker clears.
    idle: Condvar,
    outbox: EventOutbox,
    bus: RwLock<EventBus>,
}

impl<T: TokenLedger, H: CallHost> Governance<T, H> {
    /// Create an empty instance.
    ///
    /// Fails with `ZeroAddress` for a zero administrator, ledger or account
    /// and with `Config` if `token` is not the ledger named by `config`.
    pub fn new(config: GovernanceConfig, token: Arc<T>, host: Arc<H>) -> Result<Self, GovernanceError> {
        Self::restore(config, token, host, GovernanceSnapshot::default())
    }

    /// Rebuild an instance from a snapshot taken with [`snapshot`](Self::snapshot).
    pub fn restore(
        config: GovernanceConfig,
        token: Arc<T>,
        host: Arc<H>,
        snapshot: GovernanceSnapshot,
    ) -> Result<Self, GovernanceError> {
        config.validate()?;
        let ledger_address = token.ledger_address();
        if ledger_address != config.ledger {
            return Err(GovernanceError::Config(format!(
                "token ledger is {ledger_address}, configuration names {}",
                config.ledger
            )));
        }
        snapshot.validate()?;

        info!(
            administrator = %config.administrator,
            ledger = %config.ledger,
            account = %config.account,
            minimum_quorum = config.minimum_quorum,
            debate_window = config.debate_window,
            proposals = snapshot.registry.len(),
            "governance initialised"
        );
        Ok(Self {
            access: AccessGate::new(config.administrator),
            config,
            token,
            host,
            state: Mutex::new(GovernanceState {
                registry: snapshot.registry,
                ledger: snapshot.ledger,
                events: snapshot.events,
                executing: None,
            }),
            idle: Condvar::new(),
            outbox: EventOutbox::new(),
            bus: RwLock::new(EventBus::new()),
        })
    }

    /// Rebuild an instance from bytes produced by [`save_state`](Self::save_state).
    pub fn load_state(
        config: GovernanceConfig,
        token: Arc<T>,
        host: Arc<H>,
        bytes: &[u8],
    ) -> Result<Self, GovernanceError> {
        Self::restore(config, token, host, GovernanceSnapshot::from_bytes(bytes)?)
    }

    fn state(&self) -> MutexGuard<'_, GovernanceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Lock the state for a mutating operation, waiting out any execution
    /// running on another thread.
    fn lock_idle(&self, action: &str) -> Result<MutexGuard<'_, GovernanceState>, GovernanceError> {
        let mut state = self.state();
        while let Some(running) = state.executing {
            if running.thread == thread::current().id() {
                warn!(id = %running.id, action, "rejected reentrant call");
                return Err(GovernanceError::ReentrantCall(running.id.to_string()));
            }
            debug!(id = %running.id, action, "waiting for execution to finish");
            state = self
                .idle
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        Ok(state)
    }

    /// Append `event` to the log and queue it for delivery. Call with the
    /// state locked so delivery order is log order.
    fn commit(&self, state: &mut GovernanceState, event: GovernanceEvent) {
        self.outbox.push(state.events.append(event));
    }

    /// Deliver queued records to listeners. Call with the state unlocked.
    fn publish(&self) {
        self.outbox.drain(|record| {
            self.bus
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .emit(record)
        });
    }

    // ── Deposit ledger ─────────────────────────────────────────────────

    /// Escrow `amount` of `caller`'s tokens. Returns the new deposit.
    pub fn deposit(&self, caller: &Address, amount: u128) -> Result<u128, GovernanceError> {
        let balance = {
            let mut state = self.lock_idle("deposit")?;
            let balance = state
                .ledger
                .deposit(&*self.token, &self.config.account, caller, amount)?;
            self.commit(
                &mut state,
                GovernanceEvent::Deposited {
                    account: *caller,
                    amount,
                },
            );
            balance
        };
        self.publish();
        Ok(balance)
    }

    /// Return `amount` of `caller`'s deposit. Returns the new deposit.
    pub fn withdraw(&self, caller: &Address, amount: u128) -> Result<u128, GovernanceError> {
        let balance = {
            let mut state = self.lock_idle("withdraw")?;
            let balance = state
                .ledger
                .withdraw(&*self.token, &self.config.account, caller, amount)?;
            self.commit(
                &mut state,
                GovernanceEvent::Withdrawn {
                    account: *caller,
                    amount,
                },
            );
            balance
        };
        self.publish();
        Ok(balance)
    }

    // ── Proposals ──────────────────────────────────────────────────────

    /// Register a proposal. Administrator only.
    ///
    /// The administrator's current deposit is counted as `yes` without
    /// marking the administrator as a voter or locking the stake.
    pub fn create_proposal(
        &self,
        caller: &Address,
        calls: ProposalCalls,
        description: &str,
        now: Timestamp,
    ) -> Result<ProposalId, GovernanceError> {
        let id = {
            let mut state = self.lock_idle("create_proposal")?;
            self.access.ensure_administrator(caller, "create_proposal")?;
            let seed = state.ledger.balance_of(&self.config.administrator);
            let proposal =
                state
                    .registry
                    .create(calls, description, seed, now, self.config.debate_window)?;
            let id = proposal.id;
            let event = GovernanceEvent::ProposalCreated {
                id,
                recipients: proposal.calls.recipients.clone(),
                payloads: proposal.calls.payloads.clone(),
                values: proposal.calls.values.clone(),
                description: proposal.description.clone(),
                start: proposal.start,
                end: proposal.end,
            };
            info!(%id, calls = proposal.calls.len(), yes = seed, end = %proposal.end, "proposal created");
            self.commit(&mut state, event);
            id
        };
        self.publish();
        Ok(id)
    }

    /// Vote on an open proposal with up to `caller`'s current deposit.
    pub fn cast_vote(
        &self,
        caller: &Address,
        id: &ProposalId,
        weight: u128,
        support: bool,
        now: Timestamp,
    ) -> Result<VoteReceipt, GovernanceError> {
        let receipt = {
            let mut state = self.lock_idle("cast_vote")?;
            let GovernanceState {
                registry, ledger, ..
            } = &mut *state;
            let receipt = VotingEngine.cast_vote(registry, ledger, caller, id, weight, support, now)?;
            self.commit(
                &mut state,
                GovernanceEvent::VoteCast {
                    id: *id,
                    voter: *caller,
                    weight,
                    support,
                },
            );
            receipt
        };
        self.publish();
        Ok(receipt)
    }

    /// Finalize the proposal identified by `calls` and `description`.
    /// Administrator only.
    pub fn finish_proposal(
        &self,
        caller: &Address,
        calls: &ProposalCalls,
        description: &str,
        now: Timestamp,
    ) -> Result<FinalizationOutcome, GovernanceError> {
        self.finish_proposal_by_hash(caller, calls, &description_hash(description), now)
    }

    /// Finalize the proposal identified by `calls` and a description hash.
    /// Administrator only.
    ///
    /// An approved proposal's calls run with the state lock released and the
    /// in-flight marker set. If any call fails, every call's effect is
    /// rolled back, the proposal stays `Debated` and the error is returned;
    /// finalization may be retried.
    pub fn finish_proposal_by_hash(
        &self,
        caller: &Address,
        calls: &ProposalCalls,
        description_hash: &DescriptionHash,
        now: Timestamp,
    ) -> Result<FinalizationOutcome, GovernanceError> {
        let (id, approved) = {
            let mut state = self.lock_idle("finish_proposal")?;
            self.access.ensure_administrator(caller, "finish_proposal")?;
            let id = calls.id_with_hash(description_hash);
            match ExecutionEngine.assess(&state.registry, &id, self.config.quorum(), now)? {
                Verdict::Reject => {
                    let GovernanceState {
                        registry, ledger, ..
                    } = &mut *state;
                    ExecutionEngine.conclude(registry, ledger, &id, FinalizationOutcome::Defeated)?;
                    self.commit(&mut state, GovernanceEvent::ProposalDefeated { id });
                    drop(state);
                    info!(%id, "proposal defeated");
                    self.publish();
                    return Ok(FinalizationOutcome::Defeated);
                }
                Verdict::Approve(approved) => {
                    state.executing = Some(Execution {
                        id,
                        thread: thread::current().id(),
                    });
                    (id, approved)
                }
            }
        };

        let in_flight = InFlight {
            state: &self.state,
            idle: &self.idle,
        };
        debug!(%id, calls = approved.len(), "executing proposal");
        let count = ExecutionEngine.execute(&*self.host, &self.config.account, &approved)?;
        let outcome = FinalizationOutcome::Executed { calls: count };
        {
            let mut state = self.state();
            let GovernanceState {
                registry, ledger, ..
            } = &mut *state;
            ExecutionEngine.conclude(registry, ledger, &id, outcome)?;
            self.commit(&mut state, GovernanceEvent::ProposalExecuted { id });
        }
        drop(in_flight);

        info!(%id, calls = count, "proposal executed");
        self.publish();
        Ok(outcome)
    }

    // ── Views ──────────────────────────────────────────────────────────

    pub fn configuration(&self) -> &GovernanceConfig {
        &self.config
    }

    pub fn token(&self) -> &Arc<T> {
        &self.token
    }

    pub fn host(&self) -> &Arc<H> {
        &self.host
    }

    pub fn proposal_state(&self, id: &ProposalId) -> Option<ProposalState> {
        self.state().registry.get(id).map(|p| p.state)
    }

    pub fn proposal(&self, id: &ProposalId) -> Option<Proposal> {
        self.state().registry.get(id).cloned()
    }

    /// Identities in creation order.
    pub fn proposal_ids(&self) -> Vec<ProposalId> {
        self.state().registry.ids().to_vec()
    }

    pub fn has_voted(&self, id: &ProposalId, account: &Address) -> bool {
        self.state()
            .registry
            .get(id)
            .is_some_and(|p| p.has_voted(account))
    }

    pub fn deposit_of(&self, account: &Address) -> u128 {
        self.state().ledger.balance_of(account)
    }

    /// Part of `account`'s deposit held by votes on open proposals.
    pub fn locked_of(&self, account: &Address) -> u128 {
        self.state().ledger.locked_of(account)
    }

    pub fn total_custodied(&self) -> u128 {
        self.state().ledger.total_custodied()
    }

    /// Proposal whose calls are running right now, if any.
    pub fn executing(&self) -> Option<ProposalId> {
        self.state().executing.map(|running| running.id)
    }

    pub fn events(&self) -> Vec<EventRecord> {
        self.state().events.records().to_vec()
    }

    /// Events with sequence number `from` or later.
    pub fn events_since(&self, from: u64) -> Vec<EventRecord> {
        self.state().events.since(from).to_vec()
    }

    // ── Listeners and persistence ──────────────────────────────────────

    /// Register `listener` for every event committed from now on.
    pub fn subscribe(&self, listener: impl Fn(&EventRecord) + Send + Sync + 'static) {
        self.bus
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .subscribe(Box::new(listener));
    }

    /// Copy of the registry, ledger and event log.
    pub fn snapshot(&self) -> GovernanceSnapshot {
        let state = self.state();
        GovernanceSnapshot {
            registry: state.registry.clone(),
            ledger: state.ledger.clone(),
            events: state.events.clone(),
        }
    }

    /// [`snapshot`](Self::snapshot) encoded with bincode.
    pub fn save_state(&self) -> Result<Vec<u8>, GovernanceError> {
        self.snapshot().to_bytes()
    }
}
