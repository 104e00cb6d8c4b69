//! SQLite-backed event store
//!
//! One row per event in `events`, one row per ledger entry in `state_changes`
//! (insertion order = ledger order), and the series payload in
//! `time_series` / `seismic_samples`. [`Magnitude`] is resolved here, once:
//! `magnitude_raw` set means `Raw`, `magnitude_value` set means `Measured`,
//! neither means `Unset`.

use super::{check_storable, EventStore};
use crate::event::{
    Classification, Event, Location, Magnitude, Origin, Scope, SeismicSample, TimeSeries,
};
use crate::ledger::{Ledger, StateChange};
use crate::lifecycle::Transition;
use crate::state::EventState;
use crate::types::{EventId, Result, ReviewError, Timestamp};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

/// Schema SQL embedded at compile time
const SCHEMA_SQL: &str = include_str!("schema.sql");

pub struct SqliteEventStore {
    conn: Connection,
}

impl SqliteEventStore {
    /// Open (or create) a database file and apply the schema
    pub fn open(path: &Path) -> Result<Self> {
        log::debug!("Opening event database: {:?}", path);
        Self::init(Connection::open(path)?)
    }

    /// Private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self { conn })
    }

    fn load_ledger(&self, event_id: EventId) -> Result<Ledger> {
        let mut stmt = self.conn.prepare(
            "SELECT started_at, ended_at, state_name, state_description, actor
             FROM state_changes WHERE event_id = ?1 ORDER BY id ASC",
        )?;

        let rows = stmt.query_map(params![event_id], |row| {
            Ok((
                row.get::<_, Timestamp>(0)?,
                row.get::<_, Option<Timestamp>>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<String>>(4)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (started_at, ended_at, state_name, description, actor) = row?;
            entries.push(StateChange {
                started_at,
                ended_at,
                state: parse_state(&state_name)?,
                description: description.unwrap_or_default(),
                actor,
            });
        }
        Ok(Ledger::from_entries(entries))
    }

    fn load_series(&self, event_id: EventId) -> Result<Vec<TimeSeries>> {
        let mut series_stmt = self.conn.prepare(
            "SELECT id, station, registered_at, alarm_condition, sampling_rate_hz
             FROM time_series WHERE event_id = ?1 ORDER BY id ASC",
        )?;
        let mut sample_stmt = self.conn.prepare(
            "SELECT sampled_at, wave_velocity, frequency, wavelength
             FROM seismic_samples WHERE series_id = ?1 ORDER BY id ASC",
        )?;

        let headers = series_stmt
            .query_map(params![event_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    TimeSeries {
                        station: row.get(1)?,
                        registered_at: row.get(2)?,
                        alarm_condition: row.get(3)?,
                        sampling_rate_hz: row.get(4)?,
                        samples: Vec::new(),
                    },
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut series = Vec::with_capacity(headers.len());
        for (series_id, mut entry) in headers {
            entry.samples = sample_stmt
                .query_map(params![series_id], |row| {
                    Ok(SeismicSample {
                        sampled_at: row.get(0)?,
                        wave_velocity: row.get(1)?,
                        frequency: row.get(2)?,
                        wavelength: row.get(3)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            series.push(entry);
        }
        Ok(series)
    }
}

impl EventStore for SqliteEventStore {
    fn load_event(&mut self, id: EventId) -> Result<Option<Event>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, occurred_at, epicenter_lat, epicenter_lng, depth_km,
                        magnitude_value, magnitude_description, magnitude_unit, magnitude_raw,
                        scope_name, scope_description,
                        classification_from_km, classification_to_km, classification_name,
                        origin_name, origin_description,
                        state_name, state_description
                 FROM events WHERE id = ?1",
                params![id],
                EventRow::from_row,
            )
            .optional()?;

        let Some(row) = row else {
            return Ok(None);
        };

        let ledger = self.load_ledger(id)?;
        let series = self.load_series(id)?;
        let event = row.into_event(ledger, series)?;
        log::debug!("Loaded event {} ({} ledger entries)", id, event.ledger().len());
        Ok(Some(event))
    }

    fn save_event(&mut self, event: &Event) -> Result<()> {
        write_event(&self.conn, event)
    }

    fn append_state_change(&mut self, event_id: EventId, entry: &StateChange) -> Result<()> {
        write_state_change(&self.conn, event_id, entry)
    }

    fn close_open_state_change(&mut self, event_id: EventId, ended_at: Timestamp) -> Result<()> {
        write_close(&self.conn, event_id, ended_at)
    }

    fn save_series(&mut self, event_id: EventId, series: &[TimeSeries]) -> Result<()> {
        let tx = self.conn.transaction()?;
        write_series(&tx, event_id, series)?;
        tx.commit()?;
        Ok(())
    }

    fn event_ids(&mut self) -> Result<Vec<EventId>> {
        let mut stmt = self.conn.prepare("SELECT id FROM events ORDER BY id ASC")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<EventId>>>()?;
        Ok(ids)
    }

    fn persist_transition(&mut self, event: &Event, transition: &Transition) -> Result<()> {
        let tx = self.conn.transaction()?;
        write_event(&tx, event)?;
        if let Some(ended_at) = transition.closed.as_ref().and_then(|closed| closed.ended_at) {
            write_close(&tx, event.id(), ended_at)?;
        }
        write_state_change(&tx, event.id(), &transition.opened)?;
        tx.commit()?;
        Ok(())
    }

    fn insert_event(&mut self, event: &Event) -> Result<()> {
        self.insert_events(std::slice::from_ref(event))
    }

    fn insert_events(&mut self, events: &[Event]) -> Result<()> {
        let tx = self.conn.transaction()?;
        for event in events {
            write_event(&tx, event)?;
            for entry in event.ledger() {
                write_state_change(&tx, event.id(), entry)?;
            }
            write_series(&tx, event.id(), event.series())?;
        }
        tx.commit()?;
        log::debug!("Inserted {} event(s)", events.len());
        Ok(())
    }

    fn persist_cancel(&mut self, event: &Event, closed: Option<&StateChange>) -> Result<()> {
        let tx = self.conn.transaction()?;
        write_event(&tx, event)?;
        if let Some(ended_at) = closed.and_then(|entry| entry.ended_at) {
            write_close(&tx, event.id(), ended_at)?;
        }
        tx.commit()?;
        Ok(())
    }
}

fn parse_state(name: &str) -> Result<EventState> {
    name.parse().map_err(ReviewError::Corrupt)
}

fn write_event(conn: &Connection, event: &Event) -> Result<()> {
    check_storable(event)?;
    let (mag_value, mag_description, mag_unit, mag_raw) = match event.magnitude() {
        Magnitude::Unset => (None, None, None, None),
        Magnitude::Raw { text } => (None, None, None, Some(text.as_str())),
        Magnitude::Measured { value, description, unit } => (
            Some(*value),
            Some(description.as_str()),
            Some(unit.as_str()),
            None,
        ),
    };
    let scope = event.scope();
    let classification = event.classification();
    let origin = event.origin();
    let location = event.location();

    conn.execute(
        "INSERT INTO events (
            id, occurred_at, epicenter_lat, epicenter_lng, depth_km,
            magnitude_value, magnitude_description, magnitude_unit, magnitude_raw,
            scope_name, scope_description,
            classification_from_km, classification_to_km, classification_name,
            origin_name, origin_description,
            state_name, state_description
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
        ON CONFLICT(id) DO UPDATE SET
            occurred_at = excluded.occurred_at,
            epicenter_lat = excluded.epicenter_lat,
            epicenter_lng = excluded.epicenter_lng,
            depth_km = excluded.depth_km,
            magnitude_value = excluded.magnitude_value,
            magnitude_description = excluded.magnitude_description,
            magnitude_unit = excluded.magnitude_unit,
            magnitude_raw = excluded.magnitude_raw,
            scope_name = excluded.scope_name,
            scope_description = excluded.scope_description,
            classification_from_km = excluded.classification_from_km,
            classification_to_km = excluded.classification_to_km,
            classification_name = excluded.classification_name,
            origin_name = excluded.origin_name,
            origin_description = excluded.origin_description,
            state_name = excluded.state_name,
            state_description = excluded.state_description",
        params![
            event.id(),
            event.occurred_at(),
            location.latitude,
            location.longitude,
            location.depth_km,
            mag_value,
            mag_description,
            mag_unit,
            mag_raw,
            scope.map(|s| s.name.as_str()),
            scope.map(|s| s.description.as_str()),
            classification.map(|c| c.depth_from_km),
            classification.map(|c| c.depth_to_km),
            classification.map(|c| c.name.as_str()),
            origin.map(|o| o.name.as_str()),
            origin.map(|o| o.description.as_str()),
            event.state().name(),
            event.state_description(),
        ],
    )?;
    log::debug!("Saved event {} in state {}", event.id(), event.state());
    Ok(())
}

fn write_state_change(conn: &Connection, event_id: EventId, entry: &StateChange) -> Result<()> {
    conn.execute(
        "INSERT INTO state_changes (event_id, started_at, ended_at, state_name, state_description, actor)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            event_id,
            entry.started_at,
            entry.ended_at,
            entry.state.name(),
            entry.description,
            entry.actor,
        ],
    )?;
    Ok(())
}

fn write_close(conn: &Connection, event_id: EventId, ended_at: Timestamp) -> Result<()> {
    let closed = conn.execute(
        "UPDATE state_changes SET ended_at = ?1 WHERE event_id = ?2 AND ended_at IS NULL",
        params![ended_at, event_id],
    )?;
    if closed > 1 {
        log::warn!("Event {}: closed {} open ledger rows", event_id, closed);
    }
    Ok(())
}

fn write_series(conn: &Connection, event_id: EventId, series: &[TimeSeries]) -> Result<()> {
    conn.execute("DELETE FROM time_series WHERE event_id = ?1", params![event_id])?;

    for entry in series {
        conn.execute(
            "INSERT INTO time_series (event_id, station, registered_at, alarm_condition, sampling_rate_hz)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                event_id,
                entry.station,
                entry.registered_at,
                entry.alarm_condition,
                entry.sampling_rate_hz,
            ],
        )?;
        let series_id = conn.last_insert_rowid();

        for sample in &entry.samples {
            conn.execute(
                "INSERT INTO seismic_samples (series_id, sampled_at, wave_velocity, frequency, wavelength)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    series_id,
                    sample.sampled_at,
                    sample.wave_velocity,
                    sample.frequency,
                    sample.wavelength,
                ],
            )?;
        }
    }
    Ok(())
}

/// Raw `events` row, converted to an [`Event`] outside the rusqlite closure
struct EventRow {
    id: EventId,
    occurred_at: Timestamp,
    latitude: f64,
    longitude: f64,
    depth_km: f64,
    magnitude_value: Option<f64>,
    magnitude_description: Option<String>,
    magnitude_unit: Option<String>,
    magnitude_raw: Option<String>,
    scope_name: Option<String>,
    scope_description: Option<String>,
    classification_from_km: Option<f64>,
    classification_to_km: Option<f64>,
    classification_name: Option<String>,
    origin_name: Option<String>,
    origin_description: Option<String>,
    state_name: String,
    state_description: Option<String>,
}

impl EventRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            occurred_at: row.get(1)?,
            latitude: row.get(2)?,
            longitude: row.get(3)?,
            depth_km: row.get(4)?,
            magnitude_value: row.get(5)?,
            magnitude_description: row.get(6)?,
            magnitude_unit: row.get(7)?,
            magnitude_raw: row.get(8)?,
            scope_name: row.get(9)?,
            scope_description: row.get(10)?,
            classification_from_km: row.get(11)?,
            classification_to_km: row.get(12)?,
            classification_name: row.get(13)?,
            origin_name: row.get(14)?,
            origin_description: row.get(15)?,
            state_name: row.get(16)?,
            state_description: row.get(17)?,
        })
    }

    fn into_event(self, ledger: Ledger, series: Vec<TimeSeries>) -> Result<Event> {
        let location = Location::new(self.latitude, self.longitude, self.depth_km)
            .map_err(|e| ReviewError::Corrupt(format!("event {}: {}", self.id, e)))?;

        let magnitude = match (self.magnitude_raw, self.magnitude_value) {
            (Some(text), _) => Magnitude::Raw { text },
            (None, Some(value)) => Magnitude::Measured {
                value,
                description: self.magnitude_description.unwrap_or_default(),
                unit: self.magnitude_unit.unwrap_or_default(),
            },
            (None, None) => Magnitude::Unset,
        };

        let mut event = Event::new(self.id, self.occurred_at, location).with_magnitude(magnitude);
        if let Some(name) = self.scope_name {
            event = event.with_scope(Scope::new(name, self.scope_description.unwrap_or_default()));
        }
        if let (Some(name), Some(from), Some(to)) = (
            self.classification_name,
            self.classification_from_km,
            self.classification_to_km,
        ) {
            event = event.with_classification(Classification::new(from, to, name));
        }
        if let Some(name) = self.origin_name {
            event = event.with_origin(Origin::new(name, self.origin_description.unwrap_or_default()));
        }

        let state = parse_state(&self.state_name)?;
        Ok(event.restore(
            state,
            self.state_description.unwrap_or_default(),
            ledger,
            series,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Actor;
    use crate::lifecycle::{EventEdits, ManualClock, ReviewEngine};
    use chrono::{Duration, TimeZone, Utc};

    fn start() -> Timestamp {
        Utc.with_ymd_and_hms(2025, 5, 29, 10, 15, 0).unwrap()
    }

    fn sample_event() -> Event {
        Event::new(23, start(), Location::new(24.123, -65.987, 10.5).unwrap())
            .with_classification(Classification::new(61.0, 300.0, "Intermediate"))
            .with_series(
                TimeSeries::new("Station A", start()).with_sample(SeismicSample {
                    sampled_at: start(),
                    wave_velocity: 5.2,
                    frequency: 1.2,
                    wavelength: 0.4,
                }),
            )
    }

    #[test]
    fn test_missing_event_is_none() {
        let mut store = SqliteEventStore::open_in_memory().unwrap();
        assert!(store.load_event(1).unwrap().is_none());
        assert!(store.event_ids().unwrap().is_empty());
    }

    #[test]
    fn test_insert_and_reload_payload() {
        let mut store = SqliteEventStore::open_in_memory().unwrap();
        let event = sample_event();
        store.insert_event(&event).unwrap();

        let loaded = store.load_event(23).unwrap().unwrap();
        assert_eq!(loaded, event);
        assert_eq!(loaded.series()[0].samples.len(), 1);
        assert_eq!(loaded.magnitude(), &Magnitude::Unset);
    }

    #[test]
    fn test_magnitude_resolution() {
        let mut store = SqliteEventStore::open_in_memory().unwrap();

        for (id, magnitude) in [
            (1, Magnitude::Unset),
            (2, Magnitude::raw("4.2")),
            (3, Magnitude::measured(5.1, "Moderate", "Richter")),
        ] {
            let event = Event::new(id, start(), Location::new(0.0, 0.0, 1.0).unwrap())
                .with_magnitude(magnitude.clone());
            store.save_event(&event).unwrap();
            assert_eq!(store.load_event(id).unwrap().unwrap().magnitude(), &magnitude);
        }
        assert_eq!(store.event_ids().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_upsert_updates_fields() {
        let mut store = SqliteEventStore::open_in_memory().unwrap();
        let engine = ReviewEngine::new();
        let mut event = sample_event();
        store.save_event(&event).unwrap();

        engine.apply_edits(&mut event, EventEdits::new().origin(Origin::new("Tectonic", "")));
        store.save_event(&event).unwrap();

        let loaded = store.load_event(23).unwrap().unwrap();
        assert_eq!(loaded.origin().unwrap().name, "Tectonic");
        assert_eq!(store.event_ids().unwrap().len(), 1);
    }

    #[test]
    fn test_persist_transition_closes_previous_row() {
        let clock = ManualClock::new(start());
        let engine = ReviewEngine::new().with_clock(clock.clone());
        let mut store = SqliteEventStore::open_in_memory().unwrap();
        let mut event = sample_event();
        store.insert_event(&event).unwrap();

        let lock = engine.lock_for_review(&mut event, &Actor::analyst("Maria")).unwrap();
        store.persist_transition(&event, &lock).unwrap();
        clock.advance(Duration::minutes(5));
        let escalate = engine.request_expert_review(&mut event);
        store.persist_transition(&event, &escalate).unwrap();

        let loaded = store.load_event(23).unwrap().unwrap();
        let entries = loaded.ledger().entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].ended_at, Some(start() + Duration::minutes(5)));
        assert_eq!(entries[0].actor.as_deref(), Some("Maria"));
        assert!(entries[1].is_open());
        assert_eq!(loaded.state(), EventState::EscalatedToExpert);
    }

    #[test]
    fn test_non_finite_magnitude_rejected() {
        let mut store = SqliteEventStore::open_in_memory().unwrap();

        for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let event = sample_event().with_magnitude(Magnitude::measured(value, "", "Richter"));
            let err = store.save_event(&event).unwrap_err();
            assert!(matches!(err, ReviewError::Validation(_)));
        }
        assert!(store.event_ids().unwrap().is_empty());
    }

    #[test]
    fn test_insert_events_rolls_back_whole_batch() {
        let mut store = SqliteEventStore::open_in_memory().unwrap();
        let good = sample_event();
        let bad = Event::new(24, start(), Location::new(0.0, 0.0, 1.0).unwrap())
            .with_magnitude(Magnitude::measured(f64::NAN, "", "Richter"));

        assert!(store.insert_events(&[good.clone(), bad]).is_err());
        assert!(store.event_ids().unwrap().is_empty());
        let series: i64 = store
            .conn
            .query_row("SELECT COUNT(*) FROM time_series", [], |row| row.get(0))
            .unwrap();
        assert_eq!(series, 0);

        store.insert_events(&[good]).unwrap();
        assert_eq!(store.event_ids().unwrap(), vec![23]);
    }

    #[test]
    fn test_persist_cancel_closes_row_with_state() {
        let clock = ManualClock::new(start());
        let engine = ReviewEngine::new().with_clock(clock.clone());
        let mut store = SqliteEventStore::open_in_memory().unwrap();
        let mut event = sample_event();
        store.insert_event(&event).unwrap();

        let lock = engine.lock_for_review(&mut event, &Actor::analyst("Maria")).unwrap();
        store.persist_transition(&event, &lock).unwrap();
        clock.advance(Duration::minutes(3));
        let closed = engine.cancel(&mut event);
        store.persist_cancel(&event, closed.as_ref()).unwrap();

        let loaded = store.load_event(23).unwrap().unwrap();
        assert_eq!(loaded.state(), EventState::AutoDetected);
        assert_eq!(loaded.state_description(), "Reverted to unreviewed");
        assert_eq!(loaded.ledger().len(), 1);
        assert_eq!(loaded.ledger().open_count(), 0);
        assert_eq!(loaded.ledger().entries()[0].ended_at, Some(start() + Duration::minutes(3)));
    }

    #[test]
    fn test_unknown_state_name_is_corrupt() {
        let mut store = SqliteEventStore::open_in_memory().unwrap();
        store.save_event(&sample_event()).unwrap();
        store
            .conn
            .execute("UPDATE events SET state_name = 'Archivado' WHERE id = 23", [])
            .unwrap();

        assert!(matches!(store.load_event(23), Err(ReviewError::Corrupt(_))));
    }

    #[test]
    fn test_save_series_replaces_payload() {
        let mut store = SqliteEventStore::open_in_memory().unwrap();
        let event = sample_event();
        store.insert_event(&event).unwrap();

        store
            .save_series(23, &[TimeSeries::new("Station B", start())])
            .unwrap();

        let loaded = store.load_event(23).unwrap().unwrap();
        assert_eq!(loaded.series().len(), 1);
        assert_eq!(loaded.series()[0].station, "Station B");
        assert!(loaded.series()[0].samples.is_empty());
    }
}
