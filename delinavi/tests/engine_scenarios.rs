//! End-to-end guidance scenarios.
//!
//! These tests drive a `GuidanceEngine` the way a host app does: load a
//! route, set a leg or load stops, feed fixes and watch the bus.
//!
//! Run with: `cargo test --test engine_scenarios`

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use proptest::prelude::*;

use delinavi::config::GuidanceConfig;
use delinavi::engine::GuidanceEngine;
use delinavi::events::{EventKind, GuidanceEvent, ListenerError};
use delinavi::geo::Coordinate;
use delinavi::guidance::{Stage, TrackerState};
use delinavi::maneuver::{ManeuverExtractor, ManeuverKind};
use delinavi::position::Fix;
use delinavi::route::RouteModel;
use delinavi::stops::{ArrivalPolicy, Stop};

// ============================================================================
// Helper Functions
// ============================================================================

/// Degrees per 5 m at the equator.
const STEP: f64 = 5.0 / 111_194.93;

/// 100 segments east, then 20 south. Right turn at index 100, 500 m in.
fn right_turn_route() -> RouteModel {
    let mut pts: Vec<Coordinate> = (0..=100).map(|k| Coordinate::new(0.0, k as f64 * STEP)).collect();
    pts.extend((1..=20).map(|k| Coordinate::new(-(k as f64) * STEP, 100.0 * STEP)));
    RouteModel::new(pts)
}

fn fix_at(route: &RouteModel, index: usize, secs: u64) -> Fix {
    Fix::new(*route.point(index).unwrap(), Duration::from_secs(secs))
}

/// Subscribe a recorder for the given kinds.
fn record(engine: &mut GuidanceEngine, kinds: &[EventKind]) -> Arc<Mutex<Vec<GuidanceEvent>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    engine.bus_mut().subscribe_many(kinds, move |event| {
        sink.lock().push(event.clone());
        Ok(())
    });
    seen
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_straight_route_has_only_arrival() {
    let route = RouteModel::new([
        Coordinate::new(0.0, 0.0),
        Coordinate::new(0.0, 0.001),
        Coordinate::new(0.0, 0.002),
    ]);
    let mut engine = GuidanceEngine::with_defaults(route);

    let events = engine.set_leg(None, Some(Coordinate::new(0.0, 0.002)));
    assert!(events.is_empty());

    let leg = engine.tracker().leg().unwrap();
    assert_eq!(leg.maneuvers().len(), 1);
    assert_eq!(leg.maneuvers()[0].kind, ManeuverKind::Arrive);
}

#[test]
fn test_left_corner_classified() {
    let mut pts: Vec<Coordinate> = (0..=5).map(|k| Coordinate::new(0.0, k as f64 * STEP)).collect();
    pts.extend((1..=5).map(|k| Coordinate::new(k as f64 * STEP, 5.0 * STEP)));
    let route = RouteModel::new(pts);

    let maneuvers = ManeuverExtractor::default().extract(&route, 0, route.len() - 1);
    let left = maneuvers.iter().find(|m| m.kind == ManeuverKind::Left).unwrap();
    assert_eq!(left.route_index, 5);
    assert!((left.angle_deg + 90.0).abs() < 1.0, "angle {}", left.angle_deg);
}

#[test]
fn test_staged_approach_to_right_turn() {
    let route = right_turn_route();
    let start = *route.point(0).unwrap();
    let end = *route.point(120).unwrap();
    let fixes: Vec<Fix> = [40, 60, 88, 96, 98]
        .iter()
        .enumerate()
        .map(|(t, &i)| fix_at(&route, i, t as u64))
        .collect();

    let mut engine = GuidanceEngine::with_defaults(route);
    let seen = record(&mut engine, &[EventKind::StageEntered, EventKind::ManeuverReached]);
    engine.set_leg(Some(start), Some(end));

    for fix in &fixes {
        engine.on_fix(fix);
    }

    let seen = seen.lock();
    let stages: Vec<(ManeuverKind, Stage)> = seen
        .iter()
        .filter_map(|e| match e {
            GuidanceEvent::StageEntered { maneuver, stage, .. } if maneuver.route_index == 100 => {
                Some((maneuver.kind, *stage))
            }
            _ => None,
        })
        .collect();
    assert_eq!(
        stages,
        vec![
            (ManeuverKind::Right, Stage::Far),
            (ManeuverKind::Right, Stage::Mid),
            (ManeuverKind::Right, Stage::Near),
            (ManeuverKind::Right, Stage::Immediate),
        ]
    );
    let reached: Vec<_> = seen
        .iter()
        .filter(|e| e.kind() == EventKind::ManeuverReached)
        .collect();
    assert!(matches!(
        reached.as_slice(),
        [GuidanceEvent::ManeuverReached { maneuver }] if maneuver.kind == ManeuverKind::Right
    ));
    // The reached fix also opens the approach to the destination
    assert!(matches!(
        seen.last(),
        Some(GuidanceEvent::StageEntered { maneuver, .. }) if maneuver.kind == ManeuverKind::Arrive
    ));
    assert_eq!(
        engine.tracker().next_maneuver().map(|m| m.kind),
        Some(ManeuverKind::Arrive)
    );
}

#[test]
fn test_invalid_target_goes_idle_once() {
    let route = right_turn_route();
    let end = *route.point(120).unwrap();
    let mut engine = GuidanceEngine::with_defaults(route);
    engine.set_leg(None, Some(end));
    assert_eq!(engine.state(), TrackerState::Active);

    let idles = record(&mut engine, &[EventKind::Idle]);
    let events = engine.set_leg(None, Some(Coordinate::new(0.0, f64::NAN)));

    assert_eq!(events, vec![GuidanceEvent::Idle]);
    assert_eq!(idles.lock().len(), 1);
    assert_eq!(engine.state(), TrackerState::Idle);
}

#[test]
fn test_idle_engine_ignores_leg_events() {
    let route = right_turn_route();
    let fix = fix_at(&route, 98, 0);
    let mut engine = GuidanceEngine::with_defaults(route);
    engine.set_leg(None, None);

    let seen = record(
        &mut engine,
        &[
            EventKind::StageEntered,
            EventKind::ManeuverReached,
            EventKind::Arrived,
            EventKind::Idle,
        ],
    );
    engine.on_fix(&fix);
    assert!(seen.lock().is_empty());
}

#[test]
fn test_full_leg_reaches_arrival() {
    let route = right_turn_route();
    let start = *route.point(60).unwrap();
    let end = *route.point(120).unwrap();
    let fixes: Vec<Fix> = (60..=120).step_by(4).map(|i| fix_at(&route, i, i as u64)).collect();
    let mut engine = GuidanceEngine::with_defaults(route);
    engine.set_leg(Some(start), Some(end));

    let arrived = record(&mut engine, &[EventKind::Arrived]);
    for fix in &fixes {
        engine.on_fix(fix);
    }
    engine.on_fix(fixes.last().unwrap());

    assert_eq!(arrived.lock().len(), 1);
    assert_eq!(engine.state(), TrackerState::Arrived);
}

// ============================================================================
// Subscribers
// ============================================================================

#[test]
fn test_failing_listener_does_not_stop_others() {
    let route = right_turn_route();
    let end = *route.point(120).unwrap();
    let fix = fix_at(&route, 40, 0);
    let mut engine = GuidanceEngine::with_defaults(route);
    engine.set_leg(None, Some(end));

    engine
        .bus_mut()
        .subscribe(EventKind::StageEntered, |_| Err(ListenerError::Failed("speech offline".into())));
    let seen = record(&mut engine, &[EventKind::StageEntered]);

    engine.on_fix(&fix);
    assert_eq!(seen.lock().len(), 1);
    assert_eq!(engine.state(), TrackerState::Active);
}

#[test]
fn test_unsubscribed_listener_not_called() {
    let route = right_turn_route();
    let end = *route.point(120).unwrap();
    let fix = fix_at(&route, 40, 0);
    let mut engine = GuidanceEngine::with_defaults(route);
    engine.set_leg(None, Some(end));

    let calls = Arc::new(Mutex::new(0usize));
    let counter = calls.clone();
    let id = engine.bus_mut().subscribe_all(move |_| {
        *counter.lock() += 1;
        Ok(())
    });
    assert!(engine.bus_mut().unsubscribe(id));

    engine.on_fix(&fix);
    assert_eq!(*calls.lock(), 0);
}

// ============================================================================
// Stops
// ============================================================================

fn index_of(events: &[GuidanceEvent], pred: impl Fn(&GuidanceEvent) -> bool) -> usize {
    events
        .iter()
        .position(|e| pred(e))
        .unwrap_or_else(|| panic!("no matching event in {:?}", events))
}

fn two_stops(route: &RouteModel) -> Vec<Stop> {
    vec![
        Stop::new("b", "Suzuki").with_position(*route.point(120).unwrap()),
        Stop::new("a", "Yamada").with_position(*route.point(40).unwrap()),
    ]
}

#[test]
fn test_auto_advance_moves_to_next_stop() {
    let route = right_turn_route();
    let stops = two_stops(&route);
    let fixes = [fix_at(&route, 20, 0), fix_at(&route, 30, 1), fix_at(&route, 40, 2)];
    let mut engine = GuidanceEngine::with_defaults(route);

    let initial = engine.load_stops(stops);
    match &initial[0] {
        GuidanceEvent::StopChanged { previous, current } => {
            assert!(previous.is_none());
            assert_eq!(current.as_ref().map(|s| s.id.as_str()), Some("a"));
        }
        other => panic!("unexpected {:?}", other),
    }

    let changes = record(&mut engine, &[EventKind::StopChanged]);
    engine.on_fix(&fixes[0]);
    engine.on_fix(&fixes[1]);
    assert!(changes.lock().is_empty());

    engine.on_fix(&fixes[2]);
    let changes = changes.lock();
    assert_eq!(changes.len(), 1);
    match &changes[0] {
        GuidanceEvent::StopChanged { previous, current } => {
            assert_eq!(previous.as_ref().map(|s| s.id.as_str()), Some("a"));
            assert_eq!(current.as_ref().map(|s| s.id.as_str()), Some("b"));
        }
        other => panic!("unexpected {:?}", other),
    }
    let leg = engine.tracker().leg().unwrap();
    assert_eq!((leg.start_index(), leg.end_index()), (40, 120));
}

#[test]
fn test_stop_leg_arrives_before_next_stop() {
    let route = right_turn_route();
    let stops = two_stops(&route);
    let fixes: Vec<Fix> = (0..=45).map(|i| fix_at(&route, i, i as u64)).collect();
    let mut engine = GuidanceEngine::with_defaults(route);
    engine.load_stops(stops);

    let seen = record(&mut engine, &EventKind::ALL);
    for fix in &fixes {
        engine.on_fix(fix);
    }
    let seen = seen.lock();

    let immediate = index_of(&seen, |e| {
        matches!(e, GuidanceEvent::StageEntered { maneuver, stage: Stage::Immediate, .. }
            if maneuver.kind == ManeuverKind::Arrive && maneuver.route_index == 40)
    });
    let reached = index_of(&seen, |e| {
        matches!(e, GuidanceEvent::ManeuverReached { maneuver }
            if maneuver.kind == ManeuverKind::Arrive && maneuver.route_index == 40)
    });
    let arrived = index_of(&seen, |e| *e == GuidanceEvent::Arrived);
    let moved_on = index_of(&seen, |e| {
        matches!(e, GuidanceEvent::StopChanged { previous: Some(p), .. } if p.id == "a")
    });

    assert!(immediate < reached);
    assert!(reached < arrived);
    assert!(arrived < moved_on);
    assert_eq!(seen.iter().filter(|e| **e == GuidanceEvent::Arrived).count(), 1);

    let leg = engine.tracker().leg().unwrap();
    assert_eq!((leg.start_index(), leg.end_index()), (40, 120));
    assert_eq!(engine.state(), TrackerState::Active);
}

#[test]
fn test_confirm_finishes_open_leg() {
    let route = right_turn_route();
    let stops = two_stops(&route);
    let short_of_stop = fix_at(&route, 30, 0);
    let mut config = GuidanceConfig::default();
    config.stops.policy = ArrivalPolicy::ManualConfirm;
    let mut engine = GuidanceEngine::new(route, &config);
    engine.load_stops(stops);
    engine.on_fix(&short_of_stop);
    assert_eq!(engine.state(), TrackerState::Active);

    let events = engine.confirm_arrival();
    let kinds: Vec<EventKind> = events.iter().map(GuidanceEvent::kind).collect();
    assert_eq!(
        kinds,
        vec![EventKind::ManeuverReached, EventKind::Arrived, EventKind::StopChanged]
    );
    assert_eq!(engine.tracker().leg().map(|l| l.end_index()), Some(120));
}

#[test]
fn test_manual_confirm_waits_for_courier() {
    let route = right_turn_route();
    let stops = two_stops(&route);
    let at_stop = fix_at(&route, 40, 0);
    let mut config = GuidanceConfig::default();
    config.stops.policy = ArrivalPolicy::ManualConfirm;
    let mut engine = GuidanceEngine::new(route, &config);
    engine.load_stops(stops);

    let pending = engine.on_fix(&at_stop);
    assert!(pending
        .iter()
        .any(|e| matches!(e, GuidanceEvent::ArrivalPending { stop } if stop.id == "a")));
    assert!(engine
        .on_fix(&at_stop)
        .iter()
        .all(|e| e.kind() != EventKind::ArrivalPending));

    let confirmed = engine.confirm_arrival();
    assert!(matches!(
        confirmed.first(),
        Some(GuidanceEvent::StopChanged { current: Some(s), .. }) if s.id == "b"
    ));
    assert_eq!(engine.stops().unwrap().visited_count(), 1);
}

// ============================================================================
// Determinism
// ============================================================================

fn run(route: &RouteModel, fixes: &[Fix]) -> Vec<GuidanceEvent> {
    let mut engine = GuidanceEngine::with_defaults(route.clone());
    let seen = record(&mut engine, &EventKind::ALL);
    engine.set_leg(route.point(0).copied(), route.point(route.len() - 1).copied());
    for fix in fixes {
        engine.on_fix(fix);
    }
    let events = seen.lock().clone();
    events
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_engines_agree(
        offsets in prop::collection::vec((0usize..120, -3.0f64..3.0), 1..40)
    ) {
        let route = right_turn_route();
        let mut indices: Vec<(usize, f64)> = offsets;
        indices.sort_by_key(|(i, _)| *i);
        let fixes: Vec<Fix> = indices
            .iter()
            .enumerate()
            .map(|(t, (i, jitter))| {
                let p = route.point(*i).unwrap();
                Fix::new(
                    Coordinate::new(p.lat + jitter * STEP / 5.0, p.lng),
                    Duration::from_secs(t as u64),
                )
            })
            .collect();

        let first = run(&route, &fixes);
        let second = run(&route, &fixes);
        prop_assert_eq!(first, second);
    }
}
