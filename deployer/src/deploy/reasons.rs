//! Failure reasons of a stack

use std::sync::Arc;

use crate::cfn::client::StackClient;
use crate::errors::DeployError;

/// Status reasons end with this marker followed by request and error codes.
const SERVICE_DETAIL_MARKER: &str = ". (Service";

/// The part of a status reason worth showing to an operator.
pub fn human_reason(reason: &str) -> &str {
    reason.split(SERVICE_DETAIL_MARKER).next().unwrap_or(reason)
}

/// Collects human-readable reasons of failed resource events
#[derive(Clone)]
pub struct ErrorReasonAggregator {
    client: Arc<dyn StackClient>,
}

impl ErrorReasonAggregator {
    pub fn new(client: Arc<dyn StackClient>) -> Self {
        Self { client }
    }

    /// Reasons of every failed event of the stack, oldest first.
    pub async fn collect_failure_reasons(&self, stack_name: &str) -> Result<Vec<String>, DeployError> {
        let events = self.client.stack_events(stack_name).await.map_err(|e| {
            DeployError::lookup(format!("describe events for stack {}", stack_name), e)
        })?;

        // Events arrive newest first.
        Ok(events
            .iter()
            .rev()
            .filter(|event| event.status.is_failed_operation())
            .map(|event| human_reason(event.status_reason.as_deref().unwrap_or_default()).to_string())
            .collect())
    }
}
