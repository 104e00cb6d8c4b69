//! In-memory event store
//!
//! Keeps rows in the same shape the SQLite store does (event fields, ledger
//! rows, series), so events are rebuilt on load rather than handed back.

use super::{check_storable, EventStore};
use crate::event::{Event, TimeSeries};
use crate::ledger::{Ledger, StateChange};
use crate::types::{EventId, Result, Timestamp};
use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub struct MemoryEventStore {
    events: BTreeMap<EventId, Event>,
    ledgers: BTreeMap<EventId, Vec<StateChange>>,
    series: BTreeMap<EventId, Vec<TimeSeries>>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl EventStore for MemoryEventStore {
    fn load_event(&mut self, id: EventId) -> Result<Option<Event>> {
        let Some(stored) = self.events.get(&id) else {
            return Ok(None);
        };

        let ledger = Ledger::from_entries(self.ledgers.get(&id).cloned().unwrap_or_default());
        let series = self.series.get(&id).cloned().unwrap_or_default();
        let event = stored.clone().restore(
            stored.state(),
            stored.state_description().to_string(),
            ledger,
            series,
        );
        Ok(Some(event))
    }

    fn save_event(&mut self, event: &Event) -> Result<()> {
        check_storable(event)?;
        // Only scalar fields belong to the event row
        let row = event.clone().restore(
            event.state(),
            event.state_description().to_string(),
            Ledger::new(),
            Vec::new(),
        );
        self.events.insert(event.id(), row);
        Ok(())
    }

    fn append_state_change(&mut self, event_id: EventId, entry: &StateChange) -> Result<()> {
        self.ledgers.entry(event_id).or_default().push(entry.clone());
        Ok(())
    }

    fn close_open_state_change(&mut self, event_id: EventId, ended_at: Timestamp) -> Result<()> {
        if let Some(entries) = self.ledgers.get_mut(&event_id) {
            for entry in entries.iter_mut().filter(|entry| entry.is_open()) {
                entry.ended_at = Some(ended_at);
            }
        }
        Ok(())
    }

    fn save_series(&mut self, event_id: EventId, series: &[TimeSeries]) -> Result<()> {
        self.series.insert(event_id, series.to_vec());
        Ok(())
    }

    fn event_ids(&mut self) -> Result<Vec<EventId>> {
        Ok(self.events.keys().copied().collect())
    }
}
