//! Renderer tree construction

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use tracing::{debug, info};

use crate::cfn::client::StackClient;
use crate::cfn::models::Change;
use crate::deploy::describer::ChangeSetDescriber;
use crate::deploy::group::GroupHandle;
use crate::errors::DeployError;
use crate::render::tree::{PendingStackNode, RendererNode, ResourceNode, StackNode};
use crate::stream::streamer::StackStreamer;

/// Builds stack nodes and registers their streamers with a task group
#[derive(Clone)]
pub struct TreeBuilder {
    client: Arc<dyn StackClient>,
    describer: ChangeSetDescriber,
    group: GroupHandle,
    poll_interval: Duration,
}

impl TreeBuilder {
    pub fn new(client: Arc<dyn StackClient>, group: GroupHandle, poll_interval: Duration) -> Self {
        Self {
            describer: ChangeSetDescriber::new(client.clone()),
            client,
            group,
            poll_interval,
        }
    }

    /// Describe the change set, build the children of the stack, and queue its streamer.
    pub fn stack_node<'a>(
        &'a self,
        change_set_id: &'a str,
        stack_name: &'a str,
        description: &'a str,
    ) -> BoxFuture<'a, Result<StackNode, DeployError>> {
        Box::pin(async move {
            let change_set = self.describer.describe(change_set_id, stack_name).await?;
            let descriptions = self.describer.descriptions(change_set_id, stack_name).await?;

            let streamer = Arc::new(StackStreamer::new(
                self.client.clone(),
                stack_name,
                change_set.creation_time,
                self.poll_interval,
            ));
            let children = self
                .change_nodes(&streamer, &change_set.changes, &descriptions)
                .await?;
            info!(
                "Following stack {} with {} described changes",
                stack_name,
                children.len()
            );

            let node = StackNode::new(streamer.clone(), description, children);
            let cancel = self.group.cancel_token();
            self.group.spawn(async move { streamer.run(cancel).await });
            Ok(node)
        })
    }

    /// One node per described change; undescribed changes are left out.
    async fn change_nodes(
        &self,
        streamer: &Arc<StackStreamer>,
        changes: &[Change],
        descriptions: &HashMap<String, String>,
    ) -> Result<Vec<RendererNode>, DeployError> {
        let mut nodes = Vec::new();
        for change in changes {
            let Some(description) = descriptions.get(&change.logical_id) else {
                debug!("Skipping undescribed resource {}", change.logical_id);
                continue;
            };

            let node = match (&change.nested_change_set_id, change.nested_stack_name()) {
                (Some(change_set_id), Some(stack_name)) => {
                    RendererNode::Stack(self.stack_node(change_set_id, stack_name, description).await?)
                }
                (Some(change_set_id), None) => {
                    debug!(
                        "Nested stack {} does not exist yet, resolving once it is created",
                        change.logical_id
                    );
                    RendererNode::PendingStack(PendingStackNode::new(
                        streamer,
                        &change.logical_id,
                        description,
                        change_set_id,
                    ))
                }
                (None, _) => RendererNode::Resource(ResourceNode::new(
                    streamer,
                    &change.logical_id,
                    description,
                )),
            };
            nodes.push(node);
        }
        Ok(nodes)
    }
}
