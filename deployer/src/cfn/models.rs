//! Data exchanged with the orchestration service

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cfn::status::StackStatus;

/// A template parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub key: String,
    pub value: String,
}

/// Desired state of a stack, as supplied by the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackConfiguration {
    /// Stack name
    pub name: String,

    /// Template body
    pub template: String,

    /// Parameters, in submission order
    #[serde(default)]
    pub parameters: Vec<Parameter>,

    /// Tags, unique by key
    #[serde(default)]
    pub tags: BTreeMap<String, String>,

    /// Label of the root progress node, defaults to the stack name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl StackConfiguration {
    pub fn new(name: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            template: template.into(),
            parameters: Vec::new(),
            tags: BTreeMap::new(),
            description: None,
        }
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.push(Parameter {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or(&self.name)
    }
}

/// Change set submission handed to the remote client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeSetRequest {
    pub change_set_name: String,
    pub stack: StackConfiguration,
}

impl ChangeSetRequest {
    pub fn new(stack: StackConfiguration) -> Self {
        Self {
            change_set_name: format!("deploy-{}", uuid::Uuid::new_v4()),
            stack,
        }
    }
}

/// What a change does to its resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeAction {
    Add,
    Modify,
    Remove,
    Import,
    Dynamic,
}

/// One resource-level entry of a change set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    pub logical_id: String,
    pub action: ChangeAction,

    #[serde(default)]
    pub resource_type: Option<String>,

    /// Present iff the changed resource is itself a stack
    #[serde(default)]
    pub nested_change_set_id: Option<String>,

    /// Present once the resource physically exists
    #[serde(default)]
    pub physical_resource_id: Option<String>,
}

impl Change {
    pub fn new(logical_id: impl Into<String>, action: ChangeAction) -> Self {
        Self {
            logical_id: logical_id.into(),
            action,
            resource_type: None,
            nested_change_set_id: None,
            physical_resource_id: None,
        }
    }

    /// Name of the nested stack this change targets, once it exists.
    pub fn nested_stack_name(&self) -> Option<&str> {
        self.physical_resource_id
            .as_deref()
            .and_then(parse_stack_name_from_arn)
    }
}

/// A described change set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeSetDescription {
    pub id: String,
    pub creation_time: DateTime<Utc>,
    #[serde(default)]
    pub changes: Vec<Change>,
}

/// A described stack
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackDescription {
    pub name: String,
    #[serde(default)]
    pub id: Option<String>,
    pub status: StackStatus,
    #[serde(default)]
    pub status_reason: Option<String>,
}

/// A status event for one stack or resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackEvent {
    pub event_id: String,
    pub stack_name: String,
    pub logical_id: String,
    #[serde(default)]
    pub physical_resource_id: Option<String>,
    #[serde(default)]
    pub resource_type: String,
    pub status: StackStatus,
    #[serde(default)]
    pub status_reason: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Retrieves "my-nested-stack" from an identifier like
/// `arn:aws:cloudformation:us-west-2:123456789012:stack/my-nested-stack/d0a825a0-e4cd-xmpl-b9fb-061c69e99205`.
pub fn parse_stack_name_from_arn(stack_arn: &str) -> Option<&str> {
    stack_arn.split('/').nth(1).filter(|name| !name.is_empty())
}
