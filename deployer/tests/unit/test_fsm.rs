//! Streamer FSM transition rules

use stack_deployer::stream::fsm::{StreamerEvent, StreamerFsm, StreamerState};

#[test]
fn test_fsm_cancel_before_start() {
    let mut fsm = StreamerFsm::new();
    fsm.process(StreamerEvent::Cancel).unwrap();
    assert!(fsm.is_stopped());
    assert!(fsm.error().is_none());
}

#[test]
fn test_fsm_stopped_is_final() {
    let mut fsm = StreamerFsm::new();
    fsm.process(StreamerEvent::Start).unwrap();
    fsm.process(StreamerEvent::Cancel).unwrap();

    assert!(fsm.process(StreamerEvent::Start).is_err());
    assert!(fsm.process(StreamerEvent::Complete).is_err());
    assert_eq!(fsm.state(), StreamerState::Stopped);
}

#[test]
fn test_fsm_invalid_transitions() {
    let mut fsm = StreamerFsm::new();

    // Cannot complete or fail before starting
    assert!(fsm.process(StreamerEvent::Complete).is_err());
    assert!(fsm.process(StreamerEvent::Fail("x".to_string())).is_err());
    assert_eq!(fsm.state(), StreamerState::Idle);

    fsm.process(StreamerEvent::Start).unwrap();
    // Cannot start twice
    assert!(fsm.process(StreamerEvent::Start).is_err());
}
