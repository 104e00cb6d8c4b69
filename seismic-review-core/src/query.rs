//! Read-only helpers over events

use crate::event::Event;
use crate::ledger::StateChange;
use crate::state::EventState;

/// True while the event has not been taken for review
pub fn is_unreviewed(event: &Event) -> bool {
    event.state() == EventState::AutoDetected
}

/// The ledger's last entry, if it has no end time
pub fn current_open_entry(event: &Event) -> Option<&StateChange> {
    event.ledger().open_entry()
}

/// Number of ledger entries without an end time (0 or 1 for a healthy event)
pub fn open_entry_count(event: &Event) -> usize {
    event.ledger().open_count()
}

/// Events still waiting for review, in input order
pub fn pending_review<'a, I>(events: I) -> Vec<&'a Event>
where
    I: IntoIterator<Item = &'a Event>,
{
    events.into_iter().filter(|event| is_unreviewed(event)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Actor, Location};
    use crate::lifecycle::ReviewEngine;
    use chrono::{TimeZone, Utc};

    fn event(id: i64) -> Event {
        let occurred = Utc.with_ymd_and_hms(2025, 5, 30, 12, 5, 0).unwrap();
        Event::new(id, occurred, Location::new(12.345, -45.678, 8.9).unwrap())
    }

    #[test]
    fn test_pending_review_filter() {
        let engine = ReviewEngine::new();
        let mut locked = event(2);
        engine.lock_for_review(&mut locked, &Actor::analyst("Maria")).unwrap();

        let events = vec![event(1), locked, event(3)];
        let ids: Vec<_> = pending_review(&events).iter().map(|e| e.id()).collect();

        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_current_open_entry() {
        let engine = ReviewEngine::new();
        let mut e = event(4);
        assert!(current_open_entry(&e).is_none());

        engine.lock_for_review(&mut e, &Actor::analyst("Maria")).unwrap();
        assert_eq!(current_open_entry(&e).unwrap().state, EventState::LockedForReview);
        assert!(!is_unreviewed(&e));

        engine.cancel(&mut e);
        assert!(current_open_entry(&e).is_none());
        assert_eq!(open_entry_count(&e), 0);
        assert!(is_unreviewed(&e));
    }
}
