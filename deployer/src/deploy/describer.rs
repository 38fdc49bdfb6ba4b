//! Change set lookups

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::cfn::client::StackClient;
use crate::cfn::models::ChangeSetDescription;
use crate::cfn::template::parse_template_descriptions;
use crate::errors::DeployError;

/// Fetches what a change set does and how its resources are described
#[derive(Clone)]
pub struct ChangeSetDescriber {
    client: Arc<dyn StackClient>,
}

impl ChangeSetDescriber {
    pub fn new(client: Arc<dyn StackClient>) -> Self {
        Self { client }
    }

    /// Creation time and changes of an existing change set
    pub async fn describe(
        &self,
        change_set_id: &str,
        stack_name: &str,
    ) -> Result<ChangeSetDescription, DeployError> {
        debug!("Describing change set {} of stack {}", change_set_id, stack_name);
        self.client
            .describe_change_set(change_set_id, stack_name)
            .await
            .map_err(|e| {
                DeployError::lookup(format!("describe change set for stack {}", stack_name), e)
            })
    }

    /// Template body the change set was computed from
    pub async fn template_body(
        &self,
        change_set_id: &str,
        stack_name: &str,
    ) -> Result<String, DeployError> {
        self.client
            .template_body_from_change_set(change_set_id, stack_name)
            .await
            .map_err(|e| {
                DeployError::lookup(
                    format!("get template body from change set for stack {}", stack_name),
                    e,
                )
            })
    }

    /// Resource descriptions of the change set's template
    pub async fn descriptions(
        &self,
        change_set_id: &str,
        stack_name: &str,
    ) -> Result<HashMap<String, String>, DeployError> {
        let body = self.template_body(change_set_id, stack_name).await?;
        parse_template_descriptions(&body)
    }
}
