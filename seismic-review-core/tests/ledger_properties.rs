//! Ledger invariants over arbitrary operation sequences

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use seismic_review_core::{
    Actor, Event, EventEdits, EventState, Location, Magnitude, ManualClock, Origin, ReviewConfig,
    ReviewEngine, Scope,
};

#[derive(Debug, Clone)]
enum Op {
    Lock,
    Transition(usize),
    Reject,
    Register(&'static str),
    Edit,
    Cancel,
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Lock),
        (0..EventState::ALL.len()).prop_map(Op::Transition),
        Just(Op::Reject),
        prop::sample::select(vec!["Confirmar", "Rechazar", "SolicitarExperto", "Archivar"])
            .prop_map(Op::Register),
        Just(Op::Edit),
        Just(Op::Cancel),
    ]
}

proptest! {
    /// At most one open entry, and if present it is the last one
    #[test]
    fn test_single_open_entry(ops in prop::collection::vec(arb_op(), 0..40), seeded in any::<bool>()) {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let clock = ManualClock::new(start);
        let engine = ReviewEngine::with_config(ReviewConfig::new().with_creation_entry(seeded))
            .with_clock(clock.clone());
        let actor = Actor::analyst("Prop Analyst");
        let mut event = Event::new(1, start, Location::new(0.0, 0.0, 5.0).unwrap());
        engine.admit(&mut event);

        for op in ops {
            clock.advance(Duration::seconds(1));
            let before = event.ledger().len();
            match op {
                Op::Lock => {
                    let unreviewed = event.state() == EventState::AutoDetected;
                    let result = engine.lock_for_review(&mut event, &actor);
                    prop_assert_eq!(result.is_ok(), unreviewed);
                }
                Op::Transition(index) => {
                    engine.transition(&mut event, EventState::ALL[index], "prop");
                    prop_assert_eq!(event.ledger().len(), before + 1);
                    prop_assert_eq!(event.state(), EventState::ALL[index]);
                }
                Op::Reject => {
                    engine.reject(&mut event);
                }
                Op::Register(token) => {
                    let snapshot = event.clone();
                    if engine.register_action(&mut event, token, &actor).is_err() {
                        prop_assert_eq!(&event, &snapshot);
                    }
                }
                Op::Edit => {
                    engine.apply_edits(&mut event, EventEdits::new()
                        .magnitude(Magnitude::raw("4.0"))
                        .scope(Scope::new("Local", ""))
                        .origin(Origin::new("Tectonic", "")));
                    prop_assert_eq!(event.ledger().len(), before);
                }
                Op::Cancel => {
                    engine.cancel(&mut event);
                    prop_assert_eq!(event.ledger().len(), before);
                }
            }

            let entries = event.ledger().entries();
            prop_assert!(event.ledger().open_count() <= 1);
            if let Some(position) = entries.iter().position(|entry| entry.is_open()) {
                prop_assert_eq!(position, entries.len() - 1);
            }
        }
    }
}
