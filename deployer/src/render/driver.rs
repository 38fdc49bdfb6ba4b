//! Drives a renderer tree to a progress sink

use std::time::Duration;

use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::deploy::builder::TreeBuilder;
use crate::errors::DeployError;
use crate::render::sink::ProgressSink;
use crate::render::tree::{RendererNode, StackNode};

/// Render `root` until every node is done or `cancel` fires.
///
/// Pending nested stacks are resolved with `builder` as soon as their
/// identifier shows up.
pub async fn render<S: ProgressSink>(
    mut root: StackNode,
    mut sink: S,
    builder: TreeBuilder,
    refresh: Duration,
    cancel: CancellationToken,
) -> Result<(), DeployError> {
    loop {
        let mut changed = root.refresh();
        changed |= resolve_pending(&builder, &mut root.children, &cancel).await;

        if changed {
            sink.update(&root.view())?;
        }
        if root.is_done() {
            sink.finish(&root.view())?;
            info!("Finished rendering stack {}", root.name);
            return Ok(());
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Rendering of stack {} cancelled", root.name);
                return Ok(());
            }
            _ = tokio::time::sleep(refresh) => {}
        }
    }
}

fn resolve_pending<'a>(
    builder: &'a TreeBuilder,
    nodes: &'a mut [RendererNode],
    cancel: &'a CancellationToken,
) -> BoxFuture<'a, bool> {
    Box::pin(async move {
        let mut changed = false;
        for node in nodes.iter_mut() {
            let resolved = match node {
                RendererNode::Stack(stack) => {
                    changed |= resolve_pending(builder, &mut stack.children, cancel).await;
                    None
                }
                RendererNode::Resource(_) => None,
                RendererNode::PendingStack(pending) => {
                    let Some((change_set_id, stack_name)) = pending.resolvable() else {
                        continue;
                    };
                    let (change_set_id, stack_name) = (change_set_id.to_string(), stack_name.to_string());
                    let description = pending.description.clone();

                    let built = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return changed,
                        built = builder.stack_node(&change_set_id, &stack_name, &description) => built,
                    };
                    match built {
                        Ok(stack) => {
                            info!("Resolved nested stack {}", stack_name);
                            Some(stack)
                        }
                        Err(e) => {
                            warn!("Unable to follow nested stack {}: {}", stack_name, e);
                            pending.abandon();
                            None
                        }
                    }
                }
            };
            if let Some(stack) = resolved {
                *node = RendererNode::Stack(stack);
                changed = true;
            }
        }
        changed
    })
}
