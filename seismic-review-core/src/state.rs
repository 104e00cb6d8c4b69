//! Lifecycle states of a seismic event
//!
//! `AutoDetected` is the initial state, `LockedForReview` the working state of
//! an analyst, and the remaining three are terminal dispositions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Review status of an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventState {
    /// Detected by the automatic pipeline, not yet reviewed
    AutoDetected,
    /// Taken by an analyst for manual review
    LockedForReview,
    /// Confirmed by manual analysis
    Confirmed,
    /// Rejected by manual analysis
    Rejected,
    /// Handed over to an expert
    EscalatedToExpert,
}

impl EventState {
    /// All states, in lifecycle order
    pub const ALL: [EventState; 5] = [
        EventState::AutoDetected,
        EventState::LockedForReview,
        EventState::Confirmed,
        EventState::Rejected,
        EventState::EscalatedToExpert,
    ];

    /// Stable name used for storage and display
    pub fn name(&self) -> &'static str {
        match self {
            EventState::AutoDetected => "AutoDetected",
            EventState::LockedForReview => "LockedForReview",
            EventState::Confirmed => "Confirmed",
            EventState::Rejected => "Rejected",
            EventState::EscalatedToExpert => "EscalatedToExpert",
        }
    }

    /// Terminal states have no outgoing transition in the review workflow
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            EventState::Confirmed | EventState::Rejected | EventState::EscalatedToExpert
        )
    }
}

impl fmt::Display for EventState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EventState {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        EventState::ALL
            .iter()
            .copied()
            .find(|state| state.name() == s)
            .ok_or_else(|| format!("unknown event state '{}'", s))
    }
}
