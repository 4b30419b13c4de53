use headsync::config::{SCHEDULE_START_DELAY, SCHEDULE_TAIL_BUFFER};
use headsync::core::input::{Lane, Level};
use headsync::game::schedule::generate;
use proptest::prelude::*;

#[test]
fn default_track_opens_with_center_low_then_accent() {
    let events = generate(60.0, 0.5);
    assert_eq!(events[0].time, 2.5);
    assert_eq!((events[0].lane, events[0].level), (Lane::Center, Level::Low));
    assert_eq!((events[1].lane, events[1].level), (Lane::Center, Level::High));
    // First accent sits halfway to the next beat.
    assert_eq!(events[2].time, 3.25);
    assert_eq!((events[2].lane, events[2].level), (Lane::Center, Level::Low));
    assert_eq!((events[3].lane, events[3].level), (Lane::Left, Level::Low));
}

#[test]
fn too_short_track_has_no_events() {
    assert!(generate(3.9, 0.5).is_empty());
    assert!(generate(0.0, 0.5).is_empty());
}

#[test]
fn long_tracks_keep_beats_on_the_grid() {
    let interval = 0.1f32;
    let events = generate(4000.0, interval);
    let half = f64::from(interval) * 0.5;
    for event in &events {
        let steps = (f64::from(event.time) - 2.5) / half;
        let expected = 2.5 + steps.round() * half;
        assert!(
            (f64::from(event.time) - expected).abs() < 1e-3,
            "{} drifted from {}",
            event.time,
            expected
        );
    }
    // Step 29975 is exactly 3000 s in.
    assert!(events.iter().any(|e| (e.time - 3000.0).abs() < 1e-3));
}

#[test]
fn oversized_schedule_is_refused_instead_of_looping() {
    assert!(generate(40000.0, 0.0015).is_empty());
}

#[test]
fn degenerate_interval_is_refused() {
    assert!(generate(60.0, 0.0).is_empty());
    assert!(generate(60.0, -1.0).is_empty());
    assert!(generate(60.0, f32::NAN).is_empty());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn schedule_is_deterministic(duration in 0.0f32..180.0, interval in 0.05f32..2.0) {
        prop_assert_eq!(generate(duration, interval), generate(duration, interval));
    }

    #[test]
    fn schedule_is_sorted_and_bounded(duration in 5.0f32..180.0, interval in 0.05f32..2.0) {
        let events = generate(duration, interval);
        for pair in events.windows(2) {
            prop_assert!(pair[0].time <= pair[1].time);
        }
        if let Some(first) = events.first() {
            prop_assert!(first.time >= SCHEDULE_START_DELAY);
        }
        // Accents may trail the last primary beat by half an interval.
        let limit = duration - SCHEDULE_TAIL_BUFFER + interval * 0.5;
        for event in &events {
            prop_assert!(event.time < limit + 1e-3);
        }
    }
}
