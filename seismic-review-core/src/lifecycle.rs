//! Lifecycle engine
//!
//! [`ReviewEngine`] is the only component that changes an event's state or
//! appends to its ledger. It never performs I/O: each transition returns a
//! [`Transition`] describing exactly what the caller must persist.
//!
//! Every operation validates first and mutates afterwards, so a failed call
//! leaves the event untouched.

use crate::config::ReviewConfig;
use crate::event::{Actor, Event, Magnitude, Origin, Scope};
use crate::ledger::StateChange;
use crate::state::EventState;
use crate::types::{Result, ReviewError, Timestamp};
use chrono::Utc;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

/// Source of transition timestamps
pub trait Clock {
    fn now(&self) -> Timestamp;
}

/// Wall clock (UTC)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }
}

/// Clock that only moves when told to
///
/// Clones share the same time, so a test can keep a handle while the engine
/// owns another.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<Timestamp>>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
        }
    }

    pub fn set(&self, at: Timestamp) {
        self.now.set(at);
    }

    pub fn advance(&self, by: chrono::Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.get()
    }
}

/// Ledger writes produced by one transition
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// Previously open entry, now closed
    pub closed: Option<StateChange>,
    /// Newly appended open entry
    pub opened: StateChange,
}

/// Terminal dispositions an analyst can register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReviewAction {
    Confirm,
    Reject,
    RequestExpert,
}

impl ReviewAction {
    pub const ALL: [ReviewAction; 3] = [
        ReviewAction::Confirm,
        ReviewAction::Reject,
        ReviewAction::RequestExpert,
    ];

    /// Canonical action token
    pub fn token(&self) -> &'static str {
        match self {
            ReviewAction::Confirm => "Confirmar",
            ReviewAction::Reject => "Rechazar",
            ReviewAction::RequestExpert => "SolicitarExperto",
        }
    }

    /// State the event ends up in
    pub fn target_state(&self) -> EventState {
        match self {
            ReviewAction::Confirm => EventState::Confirmed,
            ReviewAction::Reject => EventState::Rejected,
            ReviewAction::RequestExpert => EventState::EscalatedToExpert,
        }
    }
}

impl fmt::Display for ReviewAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for ReviewAction {
    type Err = ReviewError;

    /// Accepts the canonical tokens and the short form used by forms
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Confirmar" | "confirm" => Ok(ReviewAction::Confirm),
            "Rechazar" | "reject" => Ok(ReviewAction::Reject),
            "SolicitarExperto" | "expert" => Ok(ReviewAction::RequestExpert),
            other => Err(ReviewError::InvalidAction(other.to_string())),
        }
    }
}

/// Analyst corrections; `None` leaves a field untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventEdits {
    pub magnitude: Option<Magnitude>,
    pub scope: Option<Scope>,
    pub origin: Option<Origin>,
}

impl EventEdits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn magnitude(mut self, magnitude: Magnitude) -> Self {
        self.magnitude = Some(magnitude);
        self
    }

    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn origin(mut self, origin: Origin) -> Self {
        self.origin = Some(origin);
        self
    }
}

/// The review state machine
pub struct ReviewEngine {
    config: ReviewConfig,
    clock: Box<dyn Clock>,
}

impl ReviewEngine {
    /// Create an engine with default descriptions and the system clock
    pub fn new() -> Self {
        Self::with_config(ReviewConfig::default())
    }

    pub fn with_config(config: ReviewConfig) -> Self {
        Self {
            config,
            clock: Box::new(SystemClock),
        }
    }

    /// Builder method: replace the clock
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn config(&self) -> &ReviewConfig {
        &self.config
    }

    /// Prepare a newly ingested event, seeding the creation entry if configured
    pub fn admit(&self, event: &mut Event) -> Option<StateChange> {
        if !self.config.seed_creation_entry
            || !event.ledger().is_empty()
            || event.state() != EventState::AutoDetected
        {
            return None;
        }

        let entry = StateChange::open(
            self.clock.now(),
            EventState::AutoDetected,
            self.config.creation_description.clone(),
            None,
        );
        event.ledger_mut().append(entry.clone());
        log::debug!("Event {}: seeded creation entry", event.id());
        Some(entry)
    }

    /// Lock an unreviewed event for manual review
    ///
    /// # Errors
    /// `InvalidState` if the event is not `AutoDetected`; the event is not modified.
    pub fn lock_for_review(&self, event: &mut Event, actor: &Actor) -> Result<Transition> {
        if event.state() != EventState::AutoDetected {
            return Err(ReviewError::InvalidState {
                expected: EventState::AutoDetected.to_string(),
                actual: event.state().to_string(),
            });
        }

        Ok(self.record(
            event,
            EventState::LockedForReview,
            self.config.lock_description.clone(),
            Some(actor.name.clone()),
        ))
    }

    /// Move the event to `new_state` unconditionally
    ///
    /// Calling this twice with the same state appends two entries.
    pub fn transition(
        &self,
        event: &mut Event,
        new_state: EventState,
        description: impl Into<String>,
    ) -> Transition {
        self.record(event, new_state, description.into(), None)
    }

    /// Same as [`transition`](Self::transition), attributed to `actor`
    pub fn transition_as(
        &self,
        event: &mut Event,
        new_state: EventState,
        description: impl Into<String>,
        actor: &Actor,
    ) -> Transition {
        self.record(event, new_state, description.into(), Some(actor.name.clone()))
    }

    pub fn reject(&self, event: &mut Event) -> Transition {
        self.transition(event, EventState::Rejected, self.config.reject_description.clone())
    }

    pub fn request_confirmation(&self, event: &mut Event) -> Transition {
        self.transition(event, EventState::Confirmed, self.config.confirm_description.clone())
    }

    pub fn request_expert_review(&self, event: &mut Event) -> Transition {
        self.transition(
            event,
            EventState::EscalatedToExpert,
            self.config.expert_description.clone(),
        )
    }

    /// Register an analyst decision given as an action token
    ///
    /// # Errors
    /// - `Validation` if magnitude, scope or origin is missing (checked first)
    /// - `InvalidAction` if the token is not a recognized action
    pub fn register_action(&self, event: &mut Event, action: &str, actor: &Actor) -> Result<Transition> {
        Self::require_review_data(event)?;
        let action: ReviewAction = action.parse()?;
        self.perform(event, action, actor)
    }

    /// Register an analyst decision
    pub fn perform(&self, event: &mut Event, action: ReviewAction, actor: &Actor) -> Result<Transition> {
        Self::require_review_data(event)?;

        let description = match action {
            ReviewAction::Confirm => &self.config.confirm_description,
            ReviewAction::Reject => &self.config.reject_description,
            ReviewAction::RequestExpert => &self.config.expert_description,
        };

        Ok(self.transition_as(event, action.target_state(), description.clone(), actor))
    }

    /// Overwrite the provided fields; the ledger is not touched
    ///
    /// Returns the number of fields updated.
    pub fn apply_edits(&self, event: &mut Event, edits: EventEdits) -> usize {
        let mut updated = 0;

        if let Some(magnitude) = edits.magnitude.filter(Magnitude::is_set) {
            event.set_magnitude(magnitude);
            updated += 1;
        }
        if let Some(scope) = edits.scope {
            event.set_scope(scope);
            updated += 1;
        }
        if let Some(origin) = edits.origin {
            event.set_origin(origin);
            updated += 1;
        }

        log::debug!("Event {}: {} field(s) edited", event.id(), updated);
        updated
    }

    /// Abandon a review and return the event to `AutoDetected`
    ///
    /// Closes the open entry (if any) without appending a new one, so the
    /// ledger has no open entry until the next lock. Returns the closed entry.
    pub fn cancel(&self, event: &mut Event) -> Option<StateChange> {
        let closed = event.ledger_mut().close_open(self.clock.now());
        event.set_state(EventState::AutoDetected, self.config.cancel_description.clone());
        log::info!("Event {}: review cancelled", event.id());
        closed
    }

    fn require_review_data(event: &Event) -> Result<()> {
        let missing = event.missing_review_data();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ReviewError::Validation(format!(
                "missing minimum data: {}",
                missing.join(", ")
            )))
        }
    }

    fn record(
        &self,
        event: &mut Event,
        new_state: EventState,
        description: String,
        actor: Option<String>,
    ) -> Transition {
        let now = self.clock.now();
        let closed = event.ledger_mut().close_open(now);
        let opened = StateChange::open(now, new_state, description.clone(), actor);

        event.set_state(new_state, description);
        event.ledger_mut().append(opened.clone());

        log::info!(
            "Event {}: {} -> {}",
            event.id(),
            closed.as_ref().map_or("-", |entry| entry.state.name()),
            new_state
        );

        Transition { closed, opened }
    }
}

impl Default for ReviewEngine {
    fn default() -> Self {
        Self::new()
    }
}
