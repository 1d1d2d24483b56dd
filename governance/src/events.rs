//! Governance events: an append-only log plus synchronous fan-out.

use agora_types::{Address, ProposalId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;

/// Externally observable state changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GovernanceEvent {
    /// A proposal entered the `Debated` state.
    ProposalCreated {
        id: ProposalId,
        recipients: Vec<Address>,
        payloads: Vec<Vec<u8>>,
        values: Vec<u128>,
        description: String,
        start: Timestamp,
        end: Timestamp,
    },
    /// A vote was counted.
    VoteCast {
        id: ProposalId,
        voter: Address,
        weight: u128,
        support: bool,
    },
    /// Every call of an approved proposal succeeded.
    ProposalExecuted { id: ProposalId },
    /// A proposal was rejected by majority.
    ProposalDefeated { id: ProposalId },
    /// Stake moved into custody.
    Deposited { account: Address, amount: u128 },
    /// Stake returned from custody.
    Withdrawn { account: Address, amount: u128 },
}

impl GovernanceEvent {
    /// Proposal the event concerns, if any.
    pub fn proposal_id(&self) -> Option<&ProposalId> {
        match self {
            Self::ProposalCreated { id, .. }
            | Self::VoteCast { id, .. }
            | Self::ProposalExecuted { id }
            | Self::ProposalDefeated { id } => Some(id),
            Self::Deposited { .. } | Self::Withdrawn { .. } => None,
        }
    }
}

/// An event with its position in the log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Starts at 0 and increases by one per event.
    pub seq: u64,
    pub event: GovernanceEvent,
}

/// Append-only event history.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EventLog {
    records: Vec<EventRecord>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `event` and return its record.
    pub fn append(&mut self, event: GovernanceEvent) -> EventRecord {
        let record = EventRecord {
            seq: self.records.len() as u64,
            event,
        };
        self.records.push(record.clone());
        record
    }

    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    /// Records with `seq >= from`.
    pub fn since(&self, from: u64) -> &[EventRecord] {
        let start = usize::try_from(from)
            .unwrap_or(usize::MAX)
            .min(self.records.len());
        &self.records[start..]
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

pub type Listener = Box<dyn Fn(&EventRecord) + Send + Sync>;

/// Synchronous fan-out to event listeners.
///
/// Listeners are invoked inline on the committing thread, after the
/// operation's state changes are visible. They may query or call the engine
/// but must not subscribe from inside a callback.
pub struct EventBus {
    listeners: Vec<Listener>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: Listener) {
        self.listeners.push(listener);
    }

    pub fn emit(&self, record: &EventRecord) {
        for listener in &self.listeners {
            listener(record);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Committed records waiting for delivery.
///
/// Records are pushed in sequence order and handed out by a single drainer
/// at a time, so listeners never see them out of order. A drain that finds
/// another drain running returns at once; the running one delivers the
/// newly queued records too.
#[derive(Default)]
pub(crate) struct EventOutbox {
    inner: Mutex<Outbox>,
}

#[derive(Default)]
struct Outbox {
    queue: VecDeque<EventRecord>,
    draining: bool,
}

/// Releases the drainer role if a listener panics.
struct Draining<'a>(&'a EventOutbox);

impl Drop for Draining<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.0.lock().draining = false;
        }
    }
}

impl EventOutbox {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Outbox> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn push(&self, record: EventRecord) {
        self.lock().queue.push_back(record);
    }

    /// Hand every queued record to `deliver`, oldest first.
    pub(crate) fn drain(&self, deliver: impl Fn(&EventRecord)) {
        {
            let mut outbox = self.lock();
            if outbox.draining {
                return;
            }
            outbox.draining = true;
        }
        let _draining = Draining(self);
        loop {
            let next = {
                let mut outbox = self.lock();
                let next = outbox.queue.pop_front();
                if next.is_none() {
                    outbox.draining = false;
                }
                next
            };
            match next {
                Some(record) => deliver(&record),
                None => return,
            }
        }
    }
}
