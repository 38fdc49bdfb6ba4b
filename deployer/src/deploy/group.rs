//! Cancellable, deadline-bound task group

use std::future::Future;
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::errors::DeployError;

type Task = BoxFuture<'static, Result<(), DeployError>>;

/// Submits tasks to a [`TaskGroup`].
///
/// Tasks are queued until [`TaskGroup::wait`] runs; the group finishes once
/// every handle is dropped and no task is left.
#[derive(Clone)]
pub struct GroupHandle {
    cancel: CancellationToken,
    tx: mpsc::UnboundedSender<Task>,
}

impl GroupHandle {
    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = Result<(), DeployError>> + Send + 'static,
    {
        if self.tx.send(Box::pin(task)).is_err() {
            warn!("Task group already finished, dropping task");
        }
    }

    /// Token shared by every task of the group
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

/// Runs tasks concurrently under one cancellation token and one deadline.
///
/// The first failing task cancels the others and its error is the group's
/// error. Hitting the deadline cancels every task and yields
/// [`DeployError::DeploymentTimeout`].
pub struct TaskGroup {
    handle: GroupHandle,
    rx: mpsc::UnboundedReceiver<Task>,
    timeout: Duration,
    deadline: Instant,
}

impl TaskGroup {
    /// The deadline starts counting now, not when [`TaskGroup::wait`] is called.
    pub fn new(cancel: CancellationToken, timeout: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            handle: GroupHandle { cancel, tx },
            rx,
            timeout,
            deadline: Instant::now() + timeout,
        }
    }

    pub fn handle(&self) -> GroupHandle {
        self.handle.clone()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Run every submitted task to completion.
    pub async fn wait(self) -> Result<(), DeployError> {
        let TaskGroup {
            handle,
            mut rx,
            timeout,
            deadline,
        } = self;
        let cancel = handle.cancel.clone();
        drop(handle);

        let deadline = tokio::time::sleep_until(deadline);
        tokio::pin!(deadline);

        let mut tasks = JoinSet::new();
        let mut first_error: Option<DeployError> = None;
        let mut timed_out = false;
        let mut queue_closed = false;

        loop {
            if queue_closed && tasks.is_empty() {
                break;
            }

            tokio::select! {
                biased;
                task = rx.recv(), if !queue_closed => match task {
                    Some(_) if cancel.is_cancelled() => debug!("Group cancelled, dropping queued task"),
                    Some(task) => {
                        tasks.spawn(task);
                    }
                    None => queue_closed = true,
                },
                _ = &mut deadline, if !timed_out => {
                    timed_out = true;
                    warn!("Deadline of {:?} reached, cancelling all tasks", timeout);
                    first_error.get_or_insert(DeployError::DeploymentTimeout(timeout));
                    cancel.cancel();
                }
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    let result = joined.unwrap_or_else(|e| {
                        Err(DeployError::Internal(format!("task panicked: {}", e)))
                    });
                    if let Err(e) = result {
                        debug!("Task failed, cancelling group: {}", e);
                        first_error.get_or_insert(e);
                        cancel.cancel();
                    }
                }
            }
        }

        if let Some(e) = first_error {
            return Err(e);
        }
        if cancel.is_cancelled() {
            return Err(DeployError::Cancelled);
        }
        Ok(())
    }
}
