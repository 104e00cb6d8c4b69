//! Seismic event entity and its measurement payload
//!
//! Measurement types are plain data carriers; no seismological computation
//! happens here. State and ledger fields are private: they change only through
//! [`crate::ReviewEngine`].

use crate::ledger::Ledger;
use crate::state::EventState;
use crate::types::{EventId, Result, ReviewError, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Description given to freshly detected events
pub const DETECTED_DESCRIPTION: &str = "Automatically detected";

/// Event magnitude as supplied by detection or by an analyst
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Magnitude {
    /// No magnitude recorded yet
    #[default]
    Unset,
    /// Free-form value entered without structure
    Raw { text: String },
    /// Numeric value with its scale
    Measured {
        value: f64,
        description: String,
        unit: String,
    },
}

impl Magnitude {
    pub fn measured(value: f64, description: impl Into<String>, unit: impl Into<String>) -> Self {
        Magnitude::Measured {
            value,
            description: description.into(),
            unit: unit.into(),
        }
    }

    pub fn raw(text: impl Into<String>) -> Self {
        Magnitude::Raw { text: text.into() }
    }

    pub fn is_set(&self) -> bool {
        !matches!(self, Magnitude::Unset)
    }

    /// Numeric value, if one is known
    pub fn value(&self) -> Option<f64> {
        match self {
            Magnitude::Measured { value, .. } => Some(*value),
            Magnitude::Raw { text } => text.trim().parse().ok(),
            Magnitude::Unset => None,
        }
    }
}

impl fmt::Display for Magnitude {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Magnitude::Unset => write!(f, "-"),
            Magnitude::Raw { text } => write!(f, "{}", text),
            Magnitude::Measured { value, description, unit } if description.is_empty() => {
                write!(f, "{} {}", value, unit)
            }
            Magnitude::Measured { value, description, unit } => {
                write!(f, "{} {} - {}", value, unit, description)
            }
        }
    }
}

/// Geographic extent in which the event was perceptible
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scope {
    pub name: String,
    pub description: String,
}

impl Scope {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.name, self.description)
    }
}

/// Depth band classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub depth_from_km: f64,
    pub depth_to_km: f64,
    pub name: String,
}

impl Classification {
    pub fn new(depth_from_km: f64, depth_to_km: f64, name: impl Into<String>) -> Self {
        Self {
            depth_from_km,
            depth_to_km,
            name: name.into(),
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} - {} km", self.name, self.depth_from_km, self.depth_to_km)
    }
}

/// Physical origin of the event (tectonic, volcanic, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Origin {
    pub name: String,
    pub description: String,
}

impl Origin {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.description.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}: {}", self.name, self.description)
        }
    }
}

/// Epicenter and hypocenter depth
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub depth_km: f64,
}

impl Location {
    /// Create a location, rejecting negative or non-finite depths
    pub fn new(latitude: f64, longitude: f64, depth_km: f64) -> Result<Self> {
        if !depth_km.is_finite() || depth_km < 0.0 {
            return Err(ReviewError::Validation(format!(
                "hypocenter depth must be a non-negative number, got {}",
                depth_km
            )));
        }
        Ok(Self {
            latitude,
            longitude,
            depth_km,
        })
    }

    pub fn epicenter(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Epicenter: ({}, {}) | Hypocenter: {} km",
            self.latitude, self.longitude, self.depth_km
        )
    }
}

/// A single sample of a station recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeismicSample {
    pub sampled_at: Timestamp,
    pub wave_velocity: f64,
    pub frequency: f64,
    pub wavelength: f64,
}

impl fmt::Display for SeismicSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Sample @ {} | Velocity: {} | Frequency: {} | Wavelength: {}",
            self.sampled_at.format("%Y-%m-%d %H:%M:%S"),
            self.wave_velocity,
            self.frequency,
            self.wavelength
        )
    }
}

/// Recording of one station attached to an event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub station: String,
    pub registered_at: Timestamp,
    #[serde(default)]
    pub alarm_condition: Option<String>,
    #[serde(default)]
    pub sampling_rate_hz: Option<f64>,
    #[serde(default)]
    pub samples: Vec<SeismicSample>,
}

impl TimeSeries {
    pub fn new(station: impl Into<String>, registered_at: Timestamp) -> Self {
        Self {
            station: station.into(),
            registered_at,
            alarm_condition: None,
            sampling_rate_hz: None,
            samples: Vec::new(),
        }
    }

    pub fn with_sample(mut self, sample: SeismicSample) -> Self {
        self.samples.push(sample);
        self
    }
}

/// Capability of an actor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Analyst,
    Supervisor,
}

/// The analyst performing a review action (recorded for audit only)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Role,
}

impl Actor {
    pub fn analyst(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: None,
            role: Role::Analyst,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }
}

/// A detected seismic event under review
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    id: EventId,
    occurred_at: Timestamp,
    location: Location,
    magnitude: Magnitude,
    scope: Option<Scope>,
    classification: Option<Classification>,
    origin: Option<Origin>,
    state: EventState,
    state_description: String,
    ledger: Ledger,
    series: Vec<TimeSeries>,
}

impl Event {
    /// Create a freshly detected event with an empty ledger
    pub fn new(id: EventId, occurred_at: Timestamp, location: Location) -> Self {
        Self {
            id,
            occurred_at,
            location,
            magnitude: Magnitude::Unset,
            scope: None,
            classification: None,
            origin: None,
            state: EventState::AutoDetected,
            state_description: DETECTED_DESCRIPTION.to_string(),
            ledger: Ledger::new(),
            series: Vec::new(),
        }
    }

    pub fn with_magnitude(mut self, magnitude: Magnitude) -> Self {
        self.magnitude = magnitude;
        self
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn with_classification(mut self, classification: Classification) -> Self {
        self.classification = Some(classification);
        self
    }

    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = Some(origin);
        self
    }

    pub fn with_series(mut self, series: TimeSeries) -> Self {
        self.series.push(series);
        self
    }

    /// Rebuild an event from persisted state (storage boundary only)
    pub(crate) fn restore(
        mut self,
        state: EventState,
        state_description: String,
        ledger: Ledger,
        series: Vec<TimeSeries>,
    ) -> Self {
        self.state = state;
        self.state_description = state_description;
        self.ledger = ledger;
        self.series = series;
        self
    }

    pub fn id(&self) -> EventId {
        self.id
    }

    pub fn occurred_at(&self) -> Timestamp {
        self.occurred_at
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn magnitude(&self) -> &Magnitude {
        &self.magnitude
    }

    pub fn scope(&self) -> Option<&Scope> {
        self.scope.as_ref()
    }

    pub fn classification(&self) -> Option<&Classification> {
        self.classification.as_ref()
    }

    pub fn origin(&self) -> Option<&Origin> {
        self.origin.as_ref()
    }

    pub fn state(&self) -> EventState {
        self.state
    }

    pub fn state_description(&self) -> &str {
        &self.state_description
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn series(&self) -> &[TimeSeries] {
        &self.series
    }

    /// Names of the fields required before a terminal disposition
    pub fn missing_review_data(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if !self.magnitude.is_set() {
            missing.push("magnitude");
        }
        if self.scope.is_none() {
            missing.push("scope");
        }
        if self.origin.is_none() {
            missing.push("origin");
        }
        missing
    }

    pub(crate) fn set_state(&mut self, state: EventState, description: String) {
        self.state = state;
        self.state_description = description;
    }

    pub(crate) fn ledger_mut(&mut self) -> &mut Ledger {
        &mut self.ledger
    }

    pub(crate) fn set_magnitude(&mut self, magnitude: Magnitude) {
        self.magnitude = magnitude;
    }

    pub(crate) fn set_scope(&mut self, scope: Scope) {
        self.scope = Some(scope);
    }

    pub(crate) fn set_origin(&mut self, origin: Origin) {
        self.origin = Some(origin);
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Event {} @ {} | Hypocenter: {} km | Magnitude: {} | State: {}",
            self.id,
            self.occurred_at.format("%Y-%m-%d %H:%M"),
            self.location.depth_km,
            self.magnitude,
            self.state
        )
    }
}

/// Event record as supplied by detection or seeding
///
/// Carries no lifecycle data: every imported event starts in
/// [`EventState::AutoDetected`] with an empty ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedEvent {
    pub id: EventId,
    pub occurred_at: Timestamp,
    pub location: Location,
    #[serde(default)]
    pub magnitude: Magnitude,
    #[serde(default)]
    pub scope: Option<Scope>,
    #[serde(default)]
    pub classification: Option<Classification>,
    #[serde(default)]
    pub origin: Option<Origin>,
    #[serde(default)]
    pub series: Vec<TimeSeries>,
}

impl DetectedEvent {
    /// Convert into an event, validating the location
    pub fn into_event(self) -> Result<Event> {
        let location = Location::new(
            self.location.latitude,
            self.location.longitude,
            self.location.depth_km,
        )?;

        let mut event = Event::new(self.id, self.occurred_at, location).with_magnitude(self.magnitude);
        event.scope = self.scope;
        event.classification = self.classification;
        event.origin = self.origin;
        event.series = self.series;
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn occurred() -> Timestamp {
        Utc.with_ymd_and_hms(2025, 5, 29, 10, 15, 0).unwrap()
    }

    #[test]
    fn test_new_event_is_auto_detected() {
        let location = Location::new(24.123, -65.987, 10.5).unwrap();
        let event = Event::new(101, occurred(), location);

        assert_eq!(event.state(), EventState::AutoDetected);
        assert_eq!(event.state_description(), DETECTED_DESCRIPTION);
        assert!(event.ledger().is_empty());
        assert_eq!(event.missing_review_data(), vec!["magnitude", "scope", "origin"]);
    }

    #[test]
    fn test_negative_depth_rejected() {
        assert!(matches!(
            Location::new(0.0, 0.0, -1.0),
            Err(ReviewError::Validation(_))
        ));
        assert!(Location::new(0.0, 0.0, f64::NAN).is_err());
        assert!(Location::new(0.0, 0.0, 0.0).is_ok());
    }

    #[test]
    fn test_magnitude_variants() {
        assert!(!Magnitude::Unset.is_set());
        assert!(Magnitude::raw("4.2").is_set());
        assert_eq!(Magnitude::raw(" 4.2 ").value(), Some(4.2));
        assert_eq!(Magnitude::raw("strong").value(), None);
        assert_eq!(Magnitude::measured(5.1, "Moderate", "Richter").value(), Some(5.1));

        assert_eq!(Magnitude::measured(4.2, "", "Richter").to_string(), "4.2 Richter");
        assert_eq!(
            Magnitude::measured(4.2, "Light", "Richter").to_string(),
            "4.2 Richter - Light"
        );
    }

    #[test]
    fn test_detected_event_deserialization() {
        let json = r#"{
            "id": 24,
            "occurred_at": "2025-05-30T11:20:00Z",
            "location": { "latitude": 35.678, "longitude": -58.345, "depth_km": 15.2 },
            "magnitude": { "kind": "measured", "value": 5.1, "description": "", "unit": "Richter" },
            "scope": { "name": "Local", "description": "Locally perceptible" },
            "origin": { "name": "Volcanic", "description": "Eruption" }
        }"#;

        let detected: DetectedEvent = serde_json::from_str(json).unwrap();
        let event = detected.into_event().unwrap();

        assert_eq!(event.id(), 24);
        assert_eq!(event.magnitude().value(), Some(5.1));
        assert!(event.classification().is_none());
        assert!(event.missing_review_data().is_empty());
        assert_eq!(event.state(), EventState::AutoDetected);
    }

    #[test]
    fn test_detected_event_bad_depth() {
        let json = r#"{
            "id": 1,
            "occurred_at": "2025-05-30T11:20:00Z",
            "location": { "latitude": 0.0, "longitude": 0.0, "depth_km": -3.0 }
        }"#;
        let detected: DetectedEvent = serde_json::from_str(json).unwrap();
        assert!(detected.into_event().is_err());
    }
}
