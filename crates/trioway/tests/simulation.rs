//! End-to-end tests: scenarios in, completed runs out.
//!
//! Every run records the room event stream, and the checks replay it to
//! verify the admission rules across rooms and visitors.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc;
use trioway::prelude::*;

// =========================================================================
// Helpers
// =========================================================================

fn uniform(room_count: u32, visitors: u64, route: &[(u32, u32)]) -> Scenario {
    let steps: Vec<Step> = route.iter().map(|&(room, dwell)| Step::new(room, dwell)).collect();
    Scenario::new(
        room_count,
        (1..=visitors)
            .map(|id| VisitorPlan::new(id, 0, steps.clone()))
            .collect(),
    )
}

/// Runs `scenario` to completion and returns the report plus every room
/// event, in the order they were emitted.
async fn run_observed<D: Dwell>(
    scenario: Scenario,
    clock: D,
) -> (SimulationReport, Vec<RoomEvent>) {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let sim = Simulation::builder().events(tx).build(scenario).unwrap();

    let report = tokio::time::timeout(Duration::from_secs(30), sim.run(clock))
        .await
        .expect("simulation should finish")
        .unwrap();

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    (report, events)
}

/// Per-room replay: occupancy stays within a trio, admissions only into
/// an empty room, and every admission is a full trio.
fn assert_rooms_consistent(events: &[RoomEvent]) {
    let mut occupancy: HashMap<RoomId, usize> = HashMap::new();

    for event in events {
        match event {
            RoomEvent::Admitted { room, visitors, .. } => {
                let inside = occupancy.entry(*room).or_default();
                assert_eq!(*inside, 0, "trio admitted into occupied {room}");
                assert_eq!(visitors.len(), TRIO_SIZE);
                *inside = visitors.len();
            }
            RoomEvent::Left {
                room, remaining, ..
            } => {
                let inside = occupancy.entry(*room).or_default();
                assert!(*inside > 0, "exit from empty {room}");
                *inside -= 1;
                assert_eq!(*inside, *remaining);
            }
            RoomEvent::Queued { room, waiting, .. } => {
                assert_eq!(occupancy.get(room).copied().unwrap_or(0), 0);
                assert!(*waiting < TRIO_SIZE);
            }
            RoomEvent::Emptied { room, .. } => {
                assert_eq!(occupancy.get(room).copied(), Some(0));
            }
        }
        assert!(occupancy.values().all(|&n| n <= TRIO_SIZE));
    }
}

/// Per-visitor replay: a visitor holds at most two rooms, and once it
/// holds none it never enters again.
fn assert_overlap_bounded(events: &[RoomEvent]) {
    let mut held: HashMap<VisitorId, usize> = HashMap::new();
    let mut finished: Vec<VisitorId> = Vec::new();

    for event in events {
        match event {
            RoomEvent::Admitted { visitors, .. } => {
                for v in visitors {
                    assert!(!finished.contains(v), "{v} entered after finishing");
                    let count = held.entry(*v).or_default();
                    *count += 1;
                    assert!(*count <= 2, "{v} holds {count} rooms");
                }
            }
            RoomEvent::Left { visitor, .. } => {
                let count = held.entry(*visitor).or_default();
                *count -= 1;
                if *count == 0 {
                    finished.push(*visitor);
                }
            }
            _ => {}
        }
    }
    assert!(held.values().all(|&n| n == 0));
}

// =========================================================================
// Concrete scenarios
// =========================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_single_trio_single_room() {
    let scenario = uniform(1, 3, &[(0, 5)]);
    let (report, events) = run_observed(scenario, InstantClock).await;

    assert_eq!(report.visitors_completed(), 3);
    assert_eq!(report.total_batches(), 1);
    assert!(report.all_rooms_empty());

    let admitted: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            RoomEvent::Admitted { visitors, .. } => Some(visitors.len()),
            _ => None,
        })
        .collect();
    assert_eq!(admitted, vec![3]);
    assert_eq!(report.visits.iter().map(|v| v.trios_completed()).sum::<usize>(), 1);
    assert_rooms_consistent(&events);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_six_visitors_form_two_sequential_trios() {
    let scenario = uniform(1, 6, &[(0, 1)]);
    let (report, events) = run_observed(scenario, InstantClock).await;

    assert_eq!(report.visitors_completed(), 6);
    assert_eq!(report.rooms[0].batches_admitted, 2);

    // The room empties between the two batches.
    let order: Vec<&str> = events
        .iter()
        .filter_map(|e| match e {
            RoomEvent::Admitted { .. } => Some("admitted"),
            RoomEvent::Emptied { .. } => Some("emptied"),
            _ => None,
        })
        .collect();
    assert_eq!(order, vec!["admitted", "emptied", "admitted", "emptied"]);
    assert_rooms_consistent(&events);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_two_rooms_overlap_on_transition() {
    let scenario = uniform(2, 3, &[(0, 1), (1, 1)]);
    let (report, events) = run_observed(scenario, InstantClock).await;

    assert_eq!(report.visitors_completed(), 3);
    assert!(report.all_rooms_empty());

    // Every visitor leaves room 0 only after it is inside room 1.
    let admitted_r1 = events
        .iter()
        .position(|e| matches!(e, RoomEvent::Admitted { room: RoomId(1), .. }))
        .unwrap();
    for (i, event) in events.iter().enumerate() {
        if let RoomEvent::Left {
            room: RoomId(0), ..
        } = event
        {
            assert!(i > admitted_r1, "left room 0 before entering room 1");
        }
    }
    assert_rooms_consistent(&events);
    assert_overlap_bounded(&events);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_second_trio_waits_for_first_to_leave_room_zero() {
    let scenario = uniform(2, 6, &[(0, 1), (1, 1)]);
    let (report, events) = run_observed(scenario, InstantClock).await;

    assert_eq!(report.visitors_completed(), 6);
    assert_eq!(report.rooms[0].batches_admitted, 2);
    assert_eq!(report.rooms[1].batches_admitted, 2);

    let room0: Vec<_> = events
        .iter()
        .filter(|e| {
            matches!(
                e,
                RoomEvent::Admitted { room: RoomId(0), .. } | RoomEvent::Emptied { room: RoomId(0), .. }
            )
        })
        .collect();
    assert!(matches!(room0[0], RoomEvent::Admitted { batch: 0, .. }));
    assert!(matches!(room0[1], RoomEvent::Emptied { batch: 0, .. }));
    assert!(matches!(room0[2], RoomEvent::Admitted { batch: 1, .. }));
    assert_rooms_consistent(&events);
    assert_overlap_bounded(&events);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_independent_trios_with_revisits() {
    // One trio loops back through rooms 0 and 1 while a second trio
    // crosses rooms 3 and 4. Each room only ever serves one trio, so the
    // run can't wedge on mixed groups.
    let mut visitors = Vec::new();
    for id in 1..=3 {
        visitors.push(VisitorPlan::new(
            id,
            id as u32,
            vec![
                Step::new(0, 1),
                Step::new(1, 2),
                Step::new(2, 1),
                Step::new(0, 1),
                Step::new(1, 1),
            ],
        ));
    }
    for id in 4..=6 {
        visitors.push(VisitorPlan::new(id, 0, vec![Step::new(3, 2), Step::new(4, 1)]));
    }
    let scenario = Scenario::new(5, visitors);
    assert_eq!(scenario.visits_per_room(), vec![6, 6, 3, 3, 3]);

    let (report, events) = run_observed(scenario, InstantClock).await;

    assert_eq!(report.visitors_completed(), 6);
    assert_eq!(report.total_batches(), 7);
    assert!(report.all_rooms_empty());
    assert!(report.visits.iter().all(|v| v.admissions.len() == 5 || v.admissions.len() == 2));
    assert_rooms_consistent(&events);
    assert_overlap_bounded(&events);
}

// =========================================================================
// Timing
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_dwell_time_elapses_on_tokio_clock() {
    let scenario = uniform(2, 3, &[(0, 5), (1, 3)]);
    let clock = TokioClock::with_tick(Duration::from_millis(100));
    let sim = Simulation::builder().build(scenario).unwrap();

    let report = sim.run(clock).await.unwrap();

    assert!(report.elapsed >= Duration::from_millis(800));
    assert_eq!(report.visitors_completed(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_initial_delay_staggers_arrival() {
    // The trio can't form until the latest visitor shows up.
    let scenario = Scenario::new(
        1,
        vec![
            VisitorPlan::new(1, 0, vec![Step::new(0, 1)]),
            VisitorPlan::new(2, 10, vec![Step::new(0, 1)]),
            VisitorPlan::new(3, 40, vec![Step::new(0, 1)]),
        ],
    );
    let clock = TokioClock::with_tick(Duration::from_millis(100));
    let report = Simulation::builder()
        .build(scenario)
        .unwrap()
        .run(clock.clone())
        .await
        .unwrap();

    assert!(report.elapsed >= Duration::from_millis(4100));
    // Three lobby dwells plus three room dwells.
    assert_eq!(clock.stats().calls, 6);
}

#[tokio::test(start_paused = true)]
async fn test_unfinishable_room_blocks() {
    // Two visitors can never make a trio.
    let scenario = uniform(1, 2, &[(0, 1)]);
    let sim = Simulation::builder().build(scenario).unwrap();

    let outcome = tokio::time::timeout(Duration::from_secs(60), sim.run(InstantClock)).await;

    assert!(outcome.is_err(), "run should still be waiting for a third visitor");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_repeated_runs_terminate_identically() {
    let scenario = uniform(3, 9, &[(0, 1), (1, 1), (2, 1)]);

    let (first, _) = run_observed(scenario.clone(), InstantClock).await;
    let (second, _) = run_observed(scenario, InstantClock).await;

    assert_eq!(first.visitors_completed(), second.visitors_completed());
    assert_eq!(first.total_batches(), second.total_batches());
    assert_eq!(first.rooms, second.rooms);
}

// =========================================================================
// Construction-time rejection
// =========================================================================

#[test]
fn test_build_rejects_out_of_range_room() {
    let scenario = uniform(2, 3, &[(0, 1), (5, 1)]);
    let result = Simulation::builder().build(scenario);
    assert!(matches!(
        result,
        Err(TriowayError::Protocol(ProtocolError::RoomOutOfRange { .. }))
    ));
}

#[test]
fn test_build_rejects_empty_route() {
    let scenario = Scenario::new(1, vec![VisitorPlan::new(1, 0, vec![])]);
    assert!(Simulation::builder().build(scenario).is_err());
}

#[test]
fn test_runner_rejects_room_outside_table() {
    let table = RoomTable::new(1, RoomConfig::default());
    let plan = VisitorPlan::new(1, 0, vec![Step::new(0, 1), Step::new(1, 1)]);
    let err = RouteRunner::new(&plan, &table).unwrap_err();
    assert!(matches!(err, TriowayError::Room(RoomError::NotFound(RoomId(1)))));
}

#[tokio::test]
async fn test_table_handle_enters_and_exits() {
    let sim = Simulation::builder().build(uniform(2, 3, &[(1, 1)])).unwrap();
    let handle: RoomHandle = sim.table().handle(RoomId(1)).unwrap();
    assert_eq!(handle.room_id(), RoomId(1));

    let (a, b, c) = tokio::join!(
        handle.enter(VisitorId(1)),
        handle.enter(VisitorId(2)),
        handle.enter(VisitorId(3)),
    );
    assert_eq!([a.batch, b.batch, c.batch], [0, 0, 0]);
    assert_eq!([a.is_last, b.is_last, c.is_last].iter().filter(|l| **l).count(), 1);
    assert_eq!(handle.snapshot().await.occupancy, TRIO_SIZE);

    for id in 1..=3 {
        handle.exit(VisitorId(id)).await.unwrap();
    }
    assert_eq!(handle.snapshot().await.phase, RoomPhase::Empty);
}

#[test]
fn test_build_counts_visitors_and_rooms() {
    let sim = Simulation::builder().build(uniform(3, 6, &[(2, 1)])).unwrap();
    assert_eq!(sim.visitor_count(), 6);
    assert_eq!(sim.table().len(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_text_scenario_end_to_end() {
    let input = b"2 3\n\
        1 0 2 0 1 1 1\n\
        2 1 2 0 1 1 1\n\
        3 2 2 0 1 1 1\n";
    let scenario = TextCodec.decode(input).unwrap();

    let (report, events) = run_observed(scenario, InstantClock).await;

    assert_eq!(report.visitors_completed(), 3);
    assert_eq!(
        report.visits.iter().map(|v| v.visitor).collect::<Vec<_>>(),
        vec![VisitorId(1), VisitorId(2), VisitorId(3)]
    );
    assert_rooms_consistent(&events);
}
