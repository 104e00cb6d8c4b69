//! Review gateway
//!
//! Ties a [`ReviewEngine`] to an [`EventStore`]: loads the selected event,
//! runs the engine operation and persists what it produced. This is the layer
//! a UI or CLI drives; it holds no session state of its own, the acting
//! analyst is passed to every call.

use crate::event::{Actor, DetectedEvent, Event, Magnitude, Origin, Scope};
use crate::ledger::Ledger;
use crate::lifecycle::{EventEdits, ReviewEngine};
use crate::query;
use crate::store::EventStore;
use crate::types::{EventId, Result, ReviewError};
use std::collections::BTreeSet;

/// Unit recorded for magnitudes entered as plain numbers
pub const DEFAULT_MAGNITUDE_UNIT: &str = "Richter";

/// Analyst form input for the edit step; every field is required
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditInput {
    pub magnitude: String,
    pub scope: String,
    pub origin: String,
}

impl EditInput {
    pub fn new(
        magnitude: impl Into<String>,
        scope: impl Into<String>,
        origin: impl Into<String>,
    ) -> Self {
        Self {
            magnitude: magnitude.into(),
            scope: scope.into(),
            origin: origin.into(),
        }
    }

    /// Validate and convert into engine edits
    fn into_edits(self) -> Result<EventEdits> {
        let magnitude = self.magnitude.trim();
        let scope = self.scope.trim();
        let origin = self.origin.trim();

        let missing: Vec<&str> = [("magnitude", magnitude), ("scope", scope), ("origin", origin)]
            .iter()
            .filter(|(_, value)| value.is_empty())
            .map(|(field, _)| *field)
            .collect();
        if !missing.is_empty() {
            return Err(ReviewError::Validation(format!(
                "required fields are empty: {}",
                missing.join(", ")
            )));
        }

        let magnitude = match magnitude.parse::<f64>() {
            Ok(value) if value.is_finite() => {
                Magnitude::measured(value, String::new(), DEFAULT_MAGNITUDE_UNIT)
            }
            _ => Magnitude::raw(magnitude),
        };

        Ok(EventEdits::new()
            .magnitude(magnitude)
            .scope(Scope::new(scope, scope))
            .origin(Origin::new(origin, String::new())))
    }
}

/// Outcome of an import run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: Vec<EventId>,
    pub skipped: Vec<EventId>,
}

pub struct ReviewService<S: EventStore> {
    engine: ReviewEngine,
    store: S,
}

impl<S: EventStore> ReviewService<S> {
    pub fn new(engine: ReviewEngine, store: S) -> Self {
        Self { engine, store }
    }

    pub fn engine(&self) -> &ReviewEngine {
        &self.engine
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Load an event or fail with `NotFound`
    pub fn event(&mut self, id: EventId) -> Result<Event> {
        self.store.load_event(id)?.ok_or(ReviewError::NotFound(id))
    }

    /// All stored events still waiting for review
    pub fn pending_events(&mut self) -> Result<Vec<Event>> {
        let mut pending = Vec::new();
        for id in self.store.event_ids()? {
            if let Some(event) = self.store.load_event(id)? {
                if query::is_unreviewed(&event) {
                    pending.push(event);
                }
            }
        }
        Ok(pending)
    }

    /// Open an event for review, locking it if nobody has yet
    pub fn select_event(&mut self, id: EventId, actor: &Actor) -> Result<Event> {
        let mut event = self.event(id)?;

        if query::is_unreviewed(&event) {
            let transition = self.engine.lock_for_review(&mut event, actor)?;
            self.store.persist_transition(&event, &transition)?;
        } else {
            log::debug!("Event {} already in state {}, not locking", id, event.state());
        }
        Ok(event)
    }

    /// Replace magnitude, scope and origin from analyst input
    pub fn update_event_data(&mut self, id: EventId, input: EditInput) -> Result<Event> {
        let mut event = self.event(id)?;
        let edits = input.into_edits()?;

        self.engine.apply_edits(&mut event, edits);
        self.store.save_event(&event)?;
        log::info!("Event {}: review data updated", id);
        Ok(event)
    }

    /// Apply arbitrary edits (absent fields untouched)
    pub fn apply_edits(&mut self, id: EventId, edits: EventEdits) -> Result<Event> {
        let mut event = self.event(id)?;
        self.engine.apply_edits(&mut event, edits);
        self.store.save_event(&event)?;
        Ok(event)
    }

    /// Register a terminal decision given as an action token
    pub fn register_action(&mut self, id: EventId, action: &str, actor: &Actor) -> Result<Event> {
        let mut event = self.event(id)?;
        let transition = self.engine.register_action(&mut event, action, actor)?;
        self.store.persist_transition(&event, &transition)?;
        Ok(event)
    }

    /// Abandon the review of an event
    pub fn cancel(&mut self, id: EventId) -> Result<Event> {
        let mut event = self.event(id)?;
        let closed = self.engine.cancel(&mut event);
        self.store.persist_cancel(&event, closed.as_ref())?;
        Ok(event)
    }

    /// Full state history of an event
    pub fn history(&mut self, id: EventId) -> Result<Ledger> {
        Ok(self.event(id)?.ledger().clone())
    }

    /// Store newly detected events; ids already present are skipped
    ///
    /// Every record is converted before anything is written, and the batch
    /// is stored as a unit: one invalid record leaves the store untouched.
    pub fn import_events<I>(&mut self, records: I) -> Result<ImportSummary>
    where
        I: IntoIterator<Item = DetectedEvent>,
    {
        let mut summary = ImportSummary::default();
        let mut seen = BTreeSet::new();
        let mut events = Vec::new();

        for record in records {
            let id = record.id;
            if !seen.insert(id) || self.store.load_event(id)?.is_some() {
                log::debug!("Event {} already stored, skipping", id);
                summary.skipped.push(id);
                continue;
            }

            let mut event = record.into_event()?;
            self.engine.admit(&mut event);
            events.push(event);
            summary.imported.push(id);
        }

        self.store.insert_events(&events)?;
        log::info!(
            "Imported {} event(s), skipped {}",
            summary.imported.len(),
            summary.skipped.len()
        );
        Ok(summary)
    }
}
