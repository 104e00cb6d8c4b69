//! Plain-text reports for the terminal

use seismic_review_core::{Event, ImportSummary, Ledger};
use std::fmt::Write;

const RULE: &str = "───────────────────────────────────────────────";

/// One line per event waiting for review
pub fn pending_list(events: &[Event]) -> String {
    if events.is_empty() {
        return "No events pending review.\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(out, "Events pending review ({}):", events.len());
    let _ = writeln!(out, "{}", RULE);
    for event in events {
        let _ = writeln!(
            out,
            "  #{:<6} {}  M {:<16} depth {} km",
            event.id(),
            event.occurred_at().format("%Y-%m-%d %H:%M"),
            event.magnitude().to_string(),
            event.location().depth_km
        );
    }
    out
}

/// Full description of one event, including its series payload
pub fn event_detail(event: &Event) -> String {
    let mut out = String::new();
    let missing = |value: Option<String>| value.unwrap_or_else(|| "-".to_string());

    let _ = writeln!(out, "Event #{}", event.id());
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "  Occurred:       {}", event.occurred_at().format("%Y-%m-%d %H:%M:%S"));
    let _ = writeln!(out, "  Location:       {}", event.location());
    let _ = writeln!(out, "  Magnitude:      {}", event.magnitude());
    let _ = writeln!(out, "  Scope:          {}", missing(event.scope().map(|s| s.to_string())));
    let _ = writeln!(
        out,
        "  Classification: {}",
        missing(event.classification().map(|c| c.to_string()))
    );
    let _ = writeln!(out, "  Origin:         {}", missing(event.origin().map(|o| o.to_string())));
    let _ = writeln!(out, "  State:          {} ({})", event.state(), event.state_description());

    if !event.series().is_empty() {
        let _ = writeln!(out, "\n  Time series:");
        for series in event.series() {
            let _ = writeln!(
                out,
                "    {} @ {} ({} samples)",
                series.station,
                series.registered_at.format("%Y-%m-%d %H:%M"),
                series.samples.len()
            );
            for sample in &series.samples {
                let _ = writeln!(out, "      {}", sample);
            }
        }
    }
    out
}

/// State history, oldest first
pub fn history(event_id: i64, ledger: &Ledger) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "State history of event #{}", event_id);
    let _ = writeln!(out, "{}", RULE);

    if ledger.is_empty() {
        let _ = writeln!(out, "  (no state changes recorded)");
        return out;
    }

    for (index, entry) in ledger.iter().enumerate() {
        let _ = write!(out, "  {}. {}", index + 1, entry);
        if let Some(actor) = &entry.actor {
            let _ = write!(out, " by {}", actor);
        }
        if !entry.description.is_empty() {
            let _ = write!(out, " - {}", entry.description);
        }
        out.push('\n');
    }
    out
}

pub fn import_summary(summary: &ImportSummary) -> String {
    let mut out = format!("Imported {} event(s)", summary.imported.len());
    if !summary.skipped.is_empty() {
        let skipped: Vec<String> = summary.skipped.iter().map(|id| id.to_string()).collect();
        let _ = write!(out, ", skipped existing: {}", skipped.join(", "));
    }
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use seismic_review_core::{Actor, Location, Magnitude, ReviewEngine};

    fn event() -> Event {
        let occurred = Utc.with_ymd_and_hms(2025, 5, 29, 10, 15, 0).unwrap();
        Event::new(23, occurred, Location::new(24.123, -65.987, 10.5).unwrap())
            .with_magnitude(Magnitude::measured(4.2, "", "Richter"))
    }

    #[test]
    fn test_pending_list() {
        assert_eq!(pending_list(&[]), "No events pending review.\n");

        let text = pending_list(&[event()]);
        assert!(text.contains("Events pending review (1)"));
        assert!(text.contains("#23"));
        assert!(text.contains("4.2 Richter"));
    }

    #[test]
    fn test_event_detail_marks_missing_fields() {
        let text = event_detail(&event());
        assert!(text.contains("Scope:          -"));
        assert!(text.contains("State:          AutoDetected (Automatically detected)"));
    }

    #[test]
    fn test_history_lists_actor() {
        let mut event = event();
        ReviewEngine::new()
            .lock_for_review(&mut event, &Actor::analyst("Maria Perez"))
            .unwrap();

        let text = history(event.id(), event.ledger());
        assert!(text.contains("1. LockedForReview from"));
        assert!(text.contains("(current) by Maria Perez - Locked for manual review"));

        let empty = history(1, &Ledger::new());
        assert!(empty.contains("no state changes recorded"));
    }

    #[test]
    fn test_import_summary() {
        let summary = ImportSummary {
            imported: vec![23, 24],
            skipped: vec![25],
        };
        assert_eq!(import_summary(&summary), "Imported 2 event(s), skipped existing: 25\n");
    }
}
