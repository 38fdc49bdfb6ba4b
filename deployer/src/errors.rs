//! Error types for stack deployments

use std::time::Duration;

use thiserror::Error;

use crate::cfn::client::ClientError;
use crate::cfn::status::StackStatus;

/// Main error type for deployments
#[derive(Error, Debug)]
pub enum DeployError {
    #[error("create change set for stack {stack_name}: {source}")]
    ChangeSetCreation {
        stack_name: String,
        #[source]
        source: ClientError,
    },

    #[error("{operation}: {source}")]
    RemoteLookup {
        operation: String,
        #[source]
        source: ClientError,
    },

    #[error("parse template for resource descriptions: {0}")]
    TemplateParse(String),

    #[error("deployment did not finish within {0:?}")]
    DeploymentTimeout(Duration),

    #[error("{}", stack_failed_message(.stack_name, .status, .reasons))]
    StackFailed {
        stack_name: String,
        status: StackStatus,
        reasons: Vec<String>,
    },

    #[error("deployment cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DeployError {
    pub(crate) fn lookup(operation: impl Into<String>, source: ClientError) -> Self {
        DeployError::RemoteLookup {
            operation: operation.into(),
            source,
        }
    }

    /// True when the change set was rejected only because it had nothing to apply.
    /// Callers may treat this as success.
    pub fn is_empty_change_set(&self) -> bool {
        matches!(
            self,
            DeployError::ChangeSetCreation {
                source: ClientError::EmptyChangeSet(_),
                ..
            }
        )
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, DeployError::DeploymentTimeout(_))
    }
}

fn stack_failed_message(stack_name: &str, status: &StackStatus, reasons: &[String]) -> String {
    let mut message = format!(
        "stack {} did not complete successfully and exited with status {}",
        stack_name, status
    );
    if !reasons.is_empty() {
        message.push_str(": ");
        message.push_str(&reasons.join("; "));
    }
    message
}
