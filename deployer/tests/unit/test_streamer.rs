//! Stack streamer tests

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use stack_deployer::cfn::client::ClientError;
use stack_deployer::errors::DeployError;
use stack_deployer::stream::fsm::StreamerState;
use stack_deployer::stream::streamer::{Received, StackStreamer, Subscription};

use crate::fake::{event, ts, FakeClient};

const POLL: Duration = Duration::from_millis(10);

fn statuses(subscription: &mut Subscription) -> Vec<String> {
    let mut seen = Vec::new();
    while let Received::Event(event) = subscription.try_next() {
        seen.push(event.status.to_string());
    }
    seen
}

#[tokio::test]
async fn test_events_fan_out_oldest_first() {
    let client = FakeClient::new();
    client.with_events(
        "demo",
        vec![
            event("6", "demo", "demo", "UPDATE_COMPLETE", 6),
            event("5", "demo", "Queue", "CREATE_COMPLETE", 5),
            event("4", "demo", "Topic", "CREATE_IN_PROGRESS", 4),
            event("3", "demo", "Queue", "CREATE_IN_PROGRESS", 3),
            event("2", "demo", "demo", "UPDATE_IN_PROGRESS", 2),
            event("old", "demo", "Queue", "DELETE_COMPLETE", -30),
        ],
    );
    let streamer = StackStreamer::new(client.clone(), "demo", ts(0), POLL);
    let mut queue = streamer.subscribe("Queue");
    let mut queue_again = streamer.subscribe("Queue");
    let mut topic = streamer.subscribe("Topic");
    let mut stack = streamer.subscribe("demo");

    tokio_test::assert_ok!(streamer.run(CancellationToken::new()).await);

    assert_eq!(statuses(&mut queue), vec!["CREATE_IN_PROGRESS", "CREATE_COMPLETE"]);
    assert_eq!(statuses(&mut queue_again), vec!["CREATE_IN_PROGRESS", "CREATE_COMPLETE"]);
    assert_eq!(statuses(&mut topic), vec!["CREATE_IN_PROGRESS"]);
    assert_eq!(statuses(&mut stack), vec!["UPDATE_IN_PROGRESS", "UPDATE_COMPLETE"]);

    // Terminal status of the stack itself closes every subscription
    assert!(matches!(queue.try_next(), Received::Closed));
    assert!(matches!(stack.try_next(), Received::Closed));
    assert_eq!(streamer.state(), StreamerState::Stopped);
}

#[tokio::test]
async fn test_resource_terminal_status_does_not_stop_streaming() {
    let client = FakeClient::new();
    client.with_events("demo", vec![event("1", "demo", "Queue", "CREATE_COMPLETE", 1)]);
    let streamer = Arc::new(StackStreamer::new(client.clone(), "demo", ts(0), POLL));
    let mut queue = streamer.subscribe("Queue");

    let cancel = CancellationToken::new();
    let task = tokio::spawn({
        let streamer = streamer.clone();
        let cancel = cancel.clone();
        async move { streamer.run(cancel).await }
    });

    let first = queue.next().await.unwrap();
    assert_eq!(first.event_id, "1");
    tokio::time::sleep(POLL * 5).await;
    assert_eq!(streamer.state(), StreamerState::Streaming);
    // Already delivered events are not delivered again
    assert!(matches!(queue.try_next(), Received::Empty));

    cancel.cancel();
    tokio_test::assert_ok!(task.await.unwrap());
    assert!(queue.next().await.is_none());
}

#[tokio::test]
async fn test_new_events_are_picked_up_between_polls() {
    let client = FakeClient::new();
    client.with_events("demo", vec![event("1", "demo", "Queue", "CREATE_IN_PROGRESS", 1)]);
    let streamer = Arc::new(StackStreamer::new(client.clone(), "demo", ts(0), POLL));
    let mut queue = streamer.subscribe("Queue");

    let task = tokio::spawn({
        let streamer = streamer.clone();
        async move { streamer.run(CancellationToken::new()).await }
    });

    assert_eq!(queue.next().await.unwrap().event_id, "1");
    client.with_events(
        "demo",
        vec![
            event("3", "demo", "demo", "CREATE_COMPLETE", 3),
            event("2", "demo", "Queue", "CREATE_COMPLETE", 2),
            event("1", "demo", "Queue", "CREATE_IN_PROGRESS", 1),
        ],
    );
    assert_eq!(queue.next().await.unwrap().event_id, "2");
    assert!(queue.next().await.is_none());
    tokio_test::assert_ok!(task.await.unwrap());
}

#[tokio::test]
async fn test_fetch_error_stops_streamer() {
    let client = FakeClient::new();
    client.with_event_error("demo", ClientError::Service("throttled".to_string()));
    let streamer = StackStreamer::new(client.clone(), "demo", ts(0), POLL);
    let mut queue = streamer.subscribe("Queue");

    let err = tokio_test::assert_err!(streamer.run(CancellationToken::new()).await);
    assert!(matches!(err, DeployError::RemoteLookup { .. }));
    assert!(err.to_string().contains("demo"));
    assert_eq!(streamer.state(), StreamerState::Stopped);
    assert!(matches!(queue.try_next(), Received::Closed));
    assert_eq!(client.event_fetches("demo"), 1);
}

#[tokio::test]
async fn test_cancel_stops_polling() {
    let client = FakeClient::new();
    client.with_events("demo", vec![event("1", "demo", "demo", "UPDATE_IN_PROGRESS", 1)]);
    let streamer = StackStreamer::new(client.clone(), "demo", ts(0), POLL);

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(POLL * 3).await;
        trigger.cancel();
    });
    tokio_test::assert_ok!(streamer.run(cancel).await);

    let fetches = client.event_fetches("demo");
    assert!(fetches >= 1);
    tokio::time::sleep(POLL * 5).await;
    assert_eq!(client.event_fetches("demo"), fetches);
}

#[tokio::test]
async fn test_subscribe_after_stop_is_closed() {
    let client = FakeClient::new();
    client.with_events("demo", vec![event("1", "demo", "demo", "CREATE_COMPLETE", 1)]);
    let streamer = StackStreamer::new(client.clone(), "demo", ts(0), POLL);
    tokio_test::assert_ok!(streamer.run(CancellationToken::new()).await);

    let mut late = streamer.subscribe("Queue");
    assert!(matches!(late.try_next(), Received::Closed));
}

#[tokio::test]
async fn test_streamer_runs_once() {
    let client = FakeClient::new();
    client.with_events("demo", vec![event("1", "demo", "demo", "CREATE_COMPLETE", 1)]);
    let streamer = StackStreamer::new(client.clone(), "demo", ts(0), POLL);
    tokio_test::assert_ok!(streamer.run(CancellationToken::new()).await);

    let err = tokio_test::assert_err!(streamer.run(CancellationToken::new()).await);
    assert!(matches!(err, DeployError::Internal(_)));
}
