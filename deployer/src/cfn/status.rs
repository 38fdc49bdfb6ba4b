//! Stack and resource status tokens

use std::fmt;

use serde::{Deserialize, Serialize};

/// Every status token the orchestration service documents for stacks and resources.
const RECOGNIZED: &[&str] = &[
    "CREATE_IN_PROGRESS",
    "CREATE_FAILED",
    "CREATE_COMPLETE",
    "ROLLBACK_IN_PROGRESS",
    "ROLLBACK_FAILED",
    "ROLLBACK_COMPLETE",
    "DELETE_IN_PROGRESS",
    "DELETE_FAILED",
    "DELETE_COMPLETE",
    "DELETE_SKIPPED",
    "UPDATE_IN_PROGRESS",
    "UPDATE_COMPLETE_CLEANUP_IN_PROGRESS",
    "UPDATE_COMPLETE",
    "UPDATE_FAILED",
    "UPDATE_ROLLBACK_IN_PROGRESS",
    "UPDATE_ROLLBACK_FAILED",
    "UPDATE_ROLLBACK_COMPLETE_CLEANUP_IN_PROGRESS",
    "UPDATE_ROLLBACK_COMPLETE",
    "REVIEW_IN_PROGRESS",
    "IMPORT_IN_PROGRESS",
    "IMPORT_COMPLETE",
    "IMPORT_FAILED",
    "IMPORT_ROLLBACK_IN_PROGRESS",
    "IMPORT_ROLLBACK_FAILED",
    "IMPORT_ROLLBACK_COMPLETE",
];

/// Terminal states that mean the deployment did not go through.
const FAILURES: &[&str] = &[
    "CREATE_FAILED",
    "DELETE_FAILED",
    "UPDATE_FAILED",
    "IMPORT_FAILED",
    "ROLLBACK_FAILED",
    "ROLLBACK_COMPLETE",
    "UPDATE_ROLLBACK_FAILED",
    "UPDATE_ROLLBACK_COMPLETE",
    "IMPORT_ROLLBACK_FAILED",
    "IMPORT_ROLLBACK_COMPLETE",
];

/// A raw status token reported by the remote service.
///
/// Tokens are kept verbatim so that statuses this crate does not know about
/// still round-trip to the operator. Unknown tokens are never classified as
/// failures or as terminal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StackStatus(String);

impl StackStatus {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_recognized(&self) -> bool {
        RECOGNIZED.contains(&self.0.as_str())
    }

    /// Whether the status is a failure terminal state.
    pub fn failure(&self) -> bool {
        FAILURES.contains(&self.0.as_str())
    }

    pub fn in_progress(&self) -> bool {
        self.is_recognized() && self.0.ends_with("_IN_PROGRESS")
    }

    /// No further transition happens from a terminal status.
    pub fn is_terminal(&self) -> bool {
        self.is_recognized() && !self.in_progress()
    }

    pub fn success(&self) -> bool {
        self.is_terminal() && !self.failure()
    }

    /// An individual create, update, delete or import operation failed.
    pub fn is_failed_operation(&self) -> bool {
        self.is_recognized() && self.0.ends_with("_FAILED")
    }
}

impl fmt::Display for StackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StackStatus {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

impl From<String> for StackStatus {
    fn from(token: String) -> Self {
        Self(token)
    }
}
