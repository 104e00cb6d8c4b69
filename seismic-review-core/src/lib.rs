//! Seismic Review Core Library
//!
//! Lifecycle engine and state history for the manual review of automatically
//! detected seismic events.
//!
//! # Architecture
//!
//! - An [`Event`] carries its measurements, its current [`EventState`] and a
//!   [`Ledger`] of state changes (at most one open entry at any time)
//! - The [`ReviewEngine`] is the only code that changes state; it validates
//!   first, mutates second and never performs I/O
//! - Persistence goes through the [`EventStore`] trait (SQLite or in-memory)
//! - [`ReviewService`] is the thin gateway a UI or CLI drives
//!
//! The library does NOT:
//! - Compute magnitudes, locations or waveforms
//! - Coordinate concurrent analysts (single writer per event is assumed)
//! - Render anything
//!
//! # Example Usage
//!
//! ```no_run
//! use seismic_review_core::{Actor, ReviewEngine, ReviewService, SqliteEventStore};
//! use std::path::Path;
//!
//! let store = SqliteEventStore::open(Path::new("seismic.db")).unwrap();
//! let mut service = ReviewService::new(ReviewEngine::new(), store);
//! let analyst = Actor::analyst("Maria Perez");
//!
//! for event in service.pending_events().unwrap() {
//!     println!("{}", event);
//! }
//!
//! let event = service.select_event(23, &analyst).unwrap();
//! println!("Locked: {}", event.state());
//! service.register_action(23, "Rechazar", &analyst).unwrap();
//! ```

// Public modules
pub mod config;
pub mod event;
pub mod ledger;
pub mod lifecycle;
pub mod query;
pub mod service;
pub mod state;
pub mod store;
pub mod types;

// Re-export main types for convenience
pub use config::ReviewConfig;
pub use event::{
    Actor, Classification, DetectedEvent, Event, Location, Magnitude, Origin, Role, Scope,
    SeismicSample, TimeSeries,
};
pub use ledger::{Ledger, StateChange};
pub use lifecycle::{
    Clock, EventEdits, ManualClock, ReviewAction, ReviewEngine, SystemClock, Transition,
};
pub use query::{current_open_entry, is_unreviewed, pending_review};
pub use service::{EditInput, ImportSummary, ReviewService};
pub use state::EventState;
pub use store::{EventStore, MemoryEventStore, SqliteEventStore};
pub use types::{EventId, Result, ReviewError, Timestamp};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_basics() {
        // Smoke test: a fresh store has nothing pending
        let mut service = ReviewService::new(ReviewEngine::new(), MemoryEventStore::new());
        assert!(service.pending_events().unwrap().is_empty());
    }
}
