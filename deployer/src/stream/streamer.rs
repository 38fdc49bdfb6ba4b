//! Per-stack event streamer

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc::{self, error::TryRecvError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cfn::client::StackClient;
use crate::cfn::models::StackEvent;
use crate::errors::DeployError;
use crate::stream::fsm::{StreamerEvent, StreamerFsm, StreamerState};

/// Outcome of a non-blocking read from a [`Subscription`]
#[derive(Debug)]
pub enum Received {
    Event(StackEvent),
    Empty,
    Closed,
}

/// Receiving end of one subscriber.
///
/// The streamer is the only writer and the holder of the subscription the only
/// reader. Once the streamer stops, buffered events can still be read before
/// [`Received::Closed`] is reported.
#[derive(Debug)]
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<StackEvent>,
}

impl Subscription {
    pub fn try_next(&mut self) -> Received {
        match self.rx.try_recv() {
            Ok(event) => Received::Event(event),
            Err(TryRecvError::Empty) => Received::Empty,
            Err(TryRecvError::Disconnected) => Received::Closed,
        }
    }

    /// Waits for the next event, `None` once the streamer stopped.
    pub async fn next(&mut self) -> Option<StackEvent> {
        self.rx.recv().await
    }
}

struct Subscriber {
    logical_id: String,
    tx: mpsc::UnboundedSender<StackEvent>,
}

struct Inner {
    fsm: StreamerFsm,
    subscribers: Vec<Subscriber>,
    last_event_id: Option<String>,
}

/// Polls the events of one stack and fans them out to subscribers
pub struct StackStreamer {
    client: Arc<dyn StackClient>,
    stack_name: String,
    since: DateTime<Utc>,
    poll_interval: Duration,
    inner: Mutex<Inner>,
}

impl StackStreamer {
    /// Create a streamer that ignores events older than `since`
    pub fn new(
        client: Arc<dyn StackClient>,
        stack_name: impl Into<String>,
        since: DateTime<Utc>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            client,
            stack_name: stack_name.into(),
            since,
            poll_interval,
            inner: Mutex::new(Inner {
                fsm: StreamerFsm::new(),
                subscribers: Vec::new(),
                last_event_id: None,
            }),
        }
    }

    pub fn stack_name(&self) -> &str {
        &self.stack_name
    }

    pub fn since(&self) -> DateTime<Utc> {
        self.since
    }

    pub fn state(&self) -> StreamerState {
        self.lock().fsm.state()
    }

    /// Subscribe to the events of one logical resource.
    ///
    /// Pass the stack name to follow the stack's own status.
    pub fn subscribe(&self, logical_id: impl Into<String>) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.lock();
        if !inner.fsm.is_stopped() {
            inner.subscribers.push(Subscriber {
                logical_id: logical_id.into(),
                tx,
            });
        }
        Subscription { rx }
    }

    /// Poll until the stack reaches a terminal status, `cancel` fires, or a fetch fails.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), DeployError> {
        self.lock()
            .fsm
            .process(StreamerEvent::Start)
            .map_err(DeployError::Internal)?;
        info!("Streaming events for stack {}", self.stack_name);

        loop {
            let fetched = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    self.stop(StreamerEvent::Cancel);
                    return Ok(());
                }
                fetched = self.client.stack_events(&self.stack_name) => fetched,
            };

            let events = match fetched {
                Ok(events) => events,
                Err(e) => {
                    let err = DeployError::lookup(
                        format!("describe events for stack {}", self.stack_name),
                        e,
                    );
                    self.stop(StreamerEvent::Fail(err.to_string()));
                    return Err(err);
                }
            };

            if self.notify(events) {
                info!("Stack {} reached a terminal status", self.stack_name);
                self.stop(StreamerEvent::Complete);
                return Ok(());
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    self.stop(StreamerEvent::Cancel);
                    return Ok(());
                }
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }
    }

    /// Delivers events not seen yet. Returns true once the stack itself is terminal.
    fn notify(&self, events: Vec<StackEvent>) -> bool {
        let mut inner = self.lock();

        // Events arrive newest first.
        let mut fresh: Vec<StackEvent> = events
            .into_iter()
            .take_while(|event| {
                inner.last_event_id.as_deref() != Some(event.event_id.as_str())
                    && event.timestamp >= self.since
            })
            .collect();
        if fresh.is_empty() {
            return false;
        }
        fresh.reverse();
        inner.last_event_id = fresh.last().map(|event| event.event_id.clone());
        debug!(
            "Delivering {} new events for stack {}",
            fresh.len(),
            self.stack_name
        );

        let mut done = false;
        for event in fresh {
            inner.subscribers.retain(|subscriber| {
                if subscriber.logical_id != event.logical_id {
                    return true;
                }
                subscriber.tx.send(event.clone()).is_ok()
            });
            if event.logical_id == self.stack_name && event.status.is_terminal() {
                done = true;
            }
        }
        done
    }

    fn stop(&self, event: StreamerEvent) {
        let mut inner = self.lock();
        if let Err(e) = inner.fsm.process(event) {
            warn!("Streamer for stack {}: {}", self.stack_name, e);
        }
        // Dropping the senders closes every subscription.
        inner.subscribers.clear();
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl fmt::Debug for StackStreamer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StackStreamer")
            .field("stack_name", &self.stack_name)
            .field("since", &self.since)
            .field("state", &self.state())
            .finish()
    }
}
