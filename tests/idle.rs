//! Idle behavior timing while the controller waits

mod common;

use std::sync::Arc;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;

use common::{Call, RecordingRobot};
use parley_gateway::robot::color;
use parley_gateway::{
    Controller, ControllerSettings, IdleConfig, IdleScheduler, MemoryStore, PollConfig,
    SharedState, Turn, run_reactor,
};

fn engaged_controller(store: Arc<dyn SharedState>, robot: Arc<RecordingRobot>) -> Controller {
    Controller::new(
        store,
        robot,
        IdleScheduler::with_rng(IdleConfig::default(), StdRng::seed_from_u64(42)),
        ControllerSettings {
            wake_word: "Hey Dave".to_string(),
            require_wake_word: false,
        },
    )
}

fn near(actual: Duration, expected: Duration) -> bool {
    let tolerance = Duration::from_millis(150);
    actual + tolerance >= expected && actual <= expected + tolerance
}

#[tokio::test(start_paused = true)]
async fn test_look_away_fires_twice_in_ten_seconds() {
    let store = Arc::new(MemoryStore::new());
    let robot = Arc::new(RecordingRobot::new());
    let mut controller = engaged_controller(store, robot.clone());
    controller.prepare().await.unwrap();

    run_reactor(
        &mut controller,
        PollConfig::default(),
        tokio::time::sleep(Duration::from_millis(10_050)),
    )
    .await;

    let calls = robot.timed_calls();
    let look_aways: Vec<(Duration, f64, f64)> = calls
        .iter()
        .filter_map(|(at, c)| match c {
            Call::MoveHead(yaw, pitch) => Some((*at, *yaw, *pitch)),
            _ => None,
        })
        .collect();
    assert_eq!(look_aways.len(), 2, "{calls:?}");
    assert!(near(look_aways[0].0, Duration::from_secs(4)));
    assert!(near(look_aways[1].0, Duration::from_secs(8)));

    for (_, yaw, pitch) in &look_aways {
        assert!(yaw.abs() <= 1.0);
        assert!(pitch.abs() <= 0.3);
    }

    // Centering after startup marks the end of each hold
    let centers: Vec<Duration> = calls
        .iter()
        .filter(|(at, c)| *c == Call::CenterHead && !at.is_zero())
        .map(|(at, _)| *at)
        .collect();
    assert_eq!(centers.len(), 2);
    assert!(near(centers[0], Duration::from_secs(6)));
    assert!(near(centers[1], Duration::from_secs(10)));

    let thinking = calls
        .iter()
        .filter(|(_, c)| matches!(c, Call::Behavior(id) if id.ends_with("Thinking_1")))
        .count();
    assert_eq!(thinking, 2);
}

#[tokio::test(start_paused = true)]
async fn test_led_cue_tracks_wait_reason() {
    let store = Arc::new(MemoryStore::new());
    let robot = Arc::new(RecordingRobot::new());
    let mut controller = engaged_controller(store.clone(), robot.clone());
    controller.prepare().await.unwrap();

    run_reactor(
        &mut controller,
        PollConfig::default(),
        tokio::time::sleep(Duration::from_millis(2_500)),
    )
    .await;

    let leds = |robot: &RecordingRobot| -> Vec<u32> {
        robot
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Led(color) => Some(color),
                _ => None,
            })
            .collect()
    };

    let waiting_for_turn = leds(&robot);
    assert_eq!(waiting_for_turn.len(), 3);
    assert!(waiting_for_turn.iter().all(|c| *c == color::BLUE));

    store.set_turn(Turn::Respond).unwrap();
    run_reactor(
        &mut controller,
        PollConfig::default(),
        tokio::time::sleep(Duration::from_millis(500)),
    )
    .await;

    let all = leds(&robot);
    assert_eq!(all.last(), Some(&color::WHITE));
    assert!(robot.spoken().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_delivery_rearms_look_away_timer() {
    let store = Arc::new(MemoryStore::new());
    let robot = Arc::new(RecordingRobot::new());
    let mut controller = engaged_controller(store.clone(), robot.clone());
    controller.prepare().await.unwrap();

    run_reactor(
        &mut controller,
        PollConfig::default(),
        tokio::time::sleep(Duration::from_secs(3)),
    )
    .await;

    store.set_response("Here is your answer.").unwrap();
    store.set_turn(Turn::Respond).unwrap();

    run_reactor(
        &mut controller,
        PollConfig::default(),
        tokio::time::sleep(Duration::from_secs(3)),
    )
    .await;

    assert_eq!(robot.spoken().len(), 1);
    let moved = robot
        .calls()
        .iter()
        .filter(|c| matches!(c, Call::MoveHead(..)))
        .count();
    assert_eq!(moved, 0);
}
