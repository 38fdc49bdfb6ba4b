//! Remote stack client contract

use async_trait::async_trait;
use thiserror::Error;

use crate::cfn::models::{ChangeSetDescription, ChangeSetRequest, StackDescription, StackEvent};

/// Errors reported by a [`StackClient`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("stack {0} already exists")]
    StackAlreadyExists(String),

    #[error("stack {0} does not exist")]
    StackNotFound(String),

    #[error("change set for stack {0} contains no changes to apply")]
    EmptyChangeSet(String),

    #[error("service error: {0}")]
    Service(String),
}

/// Calls against the orchestration service.
///
/// Implementations own transport, credentials and retry policy.
#[async_trait]
pub trait StackClient: Send + Sync {
    /// Creates a change set and waits until it is ready, returning its ID.
    async fn create_change_set(&self, request: &ChangeSetRequest) -> Result<String, ClientError>;

    async fn execute_change_set(&self, change_set_id: &str, stack_name: &str) -> Result<(), ClientError>;

    async fn describe_change_set(
        &self,
        change_set_id: &str,
        stack_name: &str,
    ) -> Result<ChangeSetDescription, ClientError>;

    async fn template_body_from_change_set(
        &self,
        change_set_id: &str,
        stack_name: &str,
    ) -> Result<String, ClientError>;

    async fn describe_stack(&self, stack_name: &str) -> Result<StackDescription, ClientError>;

    /// Events of a stack, newest first.
    async fn stack_events(&self, stack_name: &str) -> Result<Vec<StackEvent>, ClientError>;

    async fn delete_stack(&self, stack_name: &str) -> Result<(), ClientError>;
}
