//! Event persistence
//!
//! The lifecycle engine does no I/O; callers persist its results through an
//! [`EventStore`]. Stores must reproduce an event's fields, ledger order and
//! open/closed status of every entry on load.
//!
//! The core assumes a single writer per event. [`SqliteEventStore`] groups the
//! writes of one transition in a database transaction.

mod memory;
mod sqlite;

pub use memory::MemoryEventStore;
pub use sqlite::SqliteEventStore;

use crate::event::{Event, Magnitude, TimeSeries};
use crate::ledger::StateChange;
use crate::lifecycle::Transition;
use crate::types::{EventId, Result, ReviewError, Timestamp};

/// Durable storage for events and their ledgers
pub trait EventStore {
    /// Load an event with its full ledger and series payload
    fn load_event(&mut self, id: EventId) -> Result<Option<Event>>;

    /// Insert or update the event's scalar fields and current state
    ///
    /// Does not write ledger entries or series.
    fn save_event(&mut self, event: &Event) -> Result<()>;

    /// Append one ledger entry
    fn append_state_change(&mut self, event_id: EventId, entry: &StateChange) -> Result<()>;

    /// Set the end time of the event's open ledger entry, if any
    fn close_open_state_change(&mut self, event_id: EventId, ended_at: Timestamp) -> Result<()>;

    /// Replace the event's time series payload
    fn save_series(&mut self, event_id: EventId, series: &[TimeSeries]) -> Result<()>;

    /// Ids of all stored events, ascending
    fn event_ids(&mut self) -> Result<Vec<EventId>>;

    /// Persist the outcome of one transition
    fn persist_transition(&mut self, event: &Event, transition: &Transition) -> Result<()> {
        self.save_event(event)?;
        if let Some(closed) = &transition.closed {
            if let Some(ended_at) = closed.ended_at {
                self.close_open_state_change(event.id(), ended_at)?;
            }
        }
        self.append_state_change(event.id(), &transition.opened)
    }

    /// Persist a new event: scalar fields, any seeded ledger entries and series
    fn insert_event(&mut self, event: &Event) -> Result<()> {
        self.save_event(event)?;
        for entry in event.ledger() {
            self.append_state_change(event.id(), entry)?;
        }
        self.save_series(event.id(), event.series())
    }

    /// Persist a batch of new events, all or nothing
    ///
    /// The default checks every event before writing the first one; stores
    /// with transactions should override it.
    fn insert_events(&mut self, events: &[Event]) -> Result<()> {
        for event in events {
            check_storable(event)?;
        }
        for event in events {
            self.insert_event(event)?;
        }
        Ok(())
    }

    /// Persist a cancelled review: the reset state and the closed ledger row
    fn persist_cancel(&mut self, event: &Event, closed: Option<&StateChange>) -> Result<()> {
        self.save_event(event)?;
        if let Some(ended_at) = closed.and_then(|entry| entry.ended_at) {
            self.close_open_state_change(event.id(), ended_at)?;
        }
        Ok(())
    }
}

/// Reject values a store could not reproduce on load
///
/// SQLite reads a NaN `REAL` back as NULL, which would turn a measured
/// magnitude into `Unset`.
pub(crate) fn check_storable(event: &Event) -> Result<()> {
    if let Magnitude::Measured { value, .. } = event.magnitude() {
        if !value.is_finite() {
            return Err(ReviewError::Validation(format!(
                "event {}: magnitude must be a finite number, got {}",
                event.id(),
                value
            )));
        }
    }
    Ok(())
}
