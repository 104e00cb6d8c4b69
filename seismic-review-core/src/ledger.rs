//! State history ledger
//!
//! Each event carries an append-only list of [`StateChange`] records. An entry
//! is *open* while its `ended_at` is unset; at most one entry is open at a time
//! and, when present, it is the last one.

use crate::state::EventState;
use crate::types::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One period of state occupancy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateChange {
    /// When the event entered the state
    pub started_at: Timestamp,
    /// When the state was superseded (None while current)
    pub ended_at: Option<Timestamp>,
    /// State entered
    pub state: EventState,
    /// Free-text annotation
    pub description: String,
    /// Analyst who triggered the change, if recorded
    #[serde(default)]
    pub actor: Option<String>,
}

impl StateChange {
    /// Create a new open entry
    pub fn open(
        started_at: Timestamp,
        state: EventState,
        description: impl Into<String>,
        actor: Option<String>,
    ) -> Self {
        Self {
            started_at,
            ended_at: None,
            state,
            description: description.into(),
            actor,
        }
    }

    /// True while this entry describes the current state
    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }
}

impl fmt::Display for StateChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let start = self.started_at.format("%Y-%m-%d %H:%M:%S");
        match self.ended_at {
            Some(end) => write!(
                f,
                "{} from {} until {}",
                self.state,
                start,
                end.format("%Y-%m-%d %H:%M:%S")
            ),
            None => write!(f, "{} from {} (current)", self.state, start),
        }
    }
}

/// Ordered history of state changes for one event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ledger {
    entries: Vec<StateChange>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a ledger from persisted entries, kept in the given order
    pub fn from_entries(entries: Vec<StateChange>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[StateChange] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&StateChange> {
        self.entries.last()
    }

    /// The last entry, if it is still open
    pub fn open_entry(&self) -> Option<&StateChange> {
        self.entries.last().filter(|entry| entry.is_open())
    }

    /// Number of entries without an end time
    pub fn open_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_open()).count()
    }

    /// Close the open entry, returning a copy of it as closed
    pub(crate) fn close_open(&mut self, at: Timestamp) -> Option<StateChange> {
        match self.entries.last_mut() {
            Some(entry) if entry.is_open() => {
                entry.ended_at = Some(at);
                Some(entry.clone())
            }
            _ => None,
        }
    }

    pub(crate) fn append(&mut self, entry: StateChange) {
        self.entries.push(entry);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StateChange> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a Ledger {
    type Item = &'a StateChange;
    type IntoIter = std::slice::Iter<'a, StateChange>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn at(minute: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2025, 5, 29, 10, minute, 0).unwrap()
    }

    #[test]
    fn test_open_entry_is_last_open() {
        let mut ledger = Ledger::new();
        assert!(ledger.open_entry().is_none());

        ledger.append(StateChange::open(at(0), EventState::LockedForReview, "locked", None));
        assert_eq!(ledger.open_entry().unwrap().state, EventState::LockedForReview);

        let closed = ledger.close_open(at(5)).unwrap();
        assert_eq!(closed.ended_at, Some(at(5)));
        assert!(ledger.open_entry().is_none());
        assert_eq!(ledger.open_count(), 0);
    }

    #[test]
    fn test_close_without_open_entry() {
        let mut ledger = Ledger::new();
        assert!(ledger.close_open(at(1)).is_none());

        ledger.append(StateChange::open(at(0), EventState::Rejected, "done", None));
        ledger.close_open(at(1));
        // Already closed: the end time is not overwritten
        assert!(ledger.close_open(at(9)).is_none());
        assert_eq!(ledger.last().unwrap().ended_at, Some(at(1)));
    }

    #[test]
    fn test_display() {
        let mut entry = StateChange::open(at(15), EventState::Confirmed, "ok", None);
        assert_eq!(entry.to_string(), "Confirmed from 2025-05-29 10:15:00 (current)");

        entry.ended_at = Some(at(20));
        assert_eq!(
            entry.to_string(),
            "Confirmed from 2025-05-29 10:15:00 until 2025-05-29 10:20:00"
        );
    }
}
