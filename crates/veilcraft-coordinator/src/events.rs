// crates/veilcraft-coordinator/src/events.rs
//
// Append-only, strictly ordered log of coordinator events.

use serde::{Deserialize, Serialize};

use veilcraft_core::event::CoordinatorEvent;

/// One entry of the event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Position in the log, starting at 0 with no gaps.
    pub sequence: u64,
    /// Substrate time of the call that produced the event.
    pub timestamp: u64,
    pub event: CoordinatorEvent,
}

/// The coordinator's event stream.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    records: Vec<EventRecord>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event. Returns its sequence number.
    pub fn emit(&mut self, timestamp: u64, event: CoordinatorEvent) -> u64 {
        let sequence = self.records.len() as u64;
        tracing::info!(sequence, event = event.name(), "{:?}", event);
        self.records.push(EventRecord {
            sequence,
            timestamp,
            event,
        });
        sequence
    }

    /// All events, oldest first.
    pub fn events(&self) -> &[EventRecord] {
        &self.records
    }

    /// Events with `sequence >= from`.
    pub fn since(&self, from: u64) -> &[EventRecord] {
        let start = usize::try_from(from)
            .unwrap_or(usize::MAX)
            .min(self.records.len());
        &self.records[start..]
    }

    pub fn last(&self) -> Option<&EventRecord> {
        self.records.last()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
