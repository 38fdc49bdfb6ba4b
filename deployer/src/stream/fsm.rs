//! Finite State Machine for stack event streamers

use serde::{Deserialize, Serialize};

/// Streamer state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamerState {
    /// Constructed, not polling yet
    Idle,

    /// Polling the remote service for new events
    Streaming,

    /// No more events will be delivered
    Stopped,
}

/// Streamer event
#[derive(Debug, Clone)]
pub enum StreamerEvent {
    /// Start polling
    Start,

    /// The stack reached a terminal status
    Complete,

    /// The shared context was cancelled or hit its deadline
    Cancel,

    /// Fetching events failed
    Fail(String),
}

/// Streamer FSM
#[derive(Debug, Clone)]
pub struct StreamerFsm {
    state: StreamerState,
    error: Option<String>,
}

impl StreamerFsm {
    /// Create a new FSM in idle state
    pub fn new() -> Self {
        Self {
            state: StreamerState::Idle,
            error: None,
        }
    }

    pub fn state(&self) -> StreamerState {
        self.state
    }

    /// Error that stopped the streamer, if any
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_stopped(&self) -> bool {
        self.state == StreamerState::Stopped
    }

    /// Process an event and transition state
    pub fn process(&mut self, event: StreamerEvent) -> Result<(), String> {
        let new_state = match (&self.state, &event) {
            // From Idle
            (StreamerState::Idle, StreamerEvent::Start) => StreamerState::Streaming,
            (StreamerState::Idle, StreamerEvent::Cancel) => StreamerState::Stopped,

            // From Streaming
            (StreamerState::Streaming, StreamerEvent::Complete) => StreamerState::Stopped,
            (StreamerState::Streaming, StreamerEvent::Cancel) => StreamerState::Stopped,
            (StreamerState::Streaming, StreamerEvent::Fail(err)) => {
                self.error = Some(err.clone());
                StreamerState::Stopped
            }

            // Invalid transitions
            (state, event) => {
                return Err(format!("Invalid transition: {:?} -> {:?}", state, event));
            }
        };

        self.state = new_state;
        Ok(())
    }
}

impl Default for StreamerFsm {
    fn default() -> Self {
        Self::new()
    }
}
