//! Renderer tree nodes

use std::sync::Arc;

use serde::Serialize;

use crate::cfn::models::{parse_stack_name_from_arn, StackEvent};
use crate::cfn::status::StackStatus;
use crate::deploy::reasons::human_reason;
use crate::stream::streamer::{Received, StackStreamer, Subscription};

/// Latest known status of one node, fed by its subscription
#[derive(Debug)]
pub struct NodeProgress {
    subscription: Subscription,
    status: Option<StackStatus>,
    reason: Option<String>,
    closed: bool,
}

impl NodeProgress {
    fn new(subscription: Subscription) -> Self {
        Self {
            subscription,
            status: None,
            reason: None,
            closed: false,
        }
    }

    pub fn status(&self) -> Option<&StackStatus> {
        self.status.as_ref()
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// Applies every buffered event. Returns true if anything changed.
    fn drain(&mut self, mut on_event: impl FnMut(&StackEvent)) -> bool {
        let mut changed = false;
        loop {
            match self.subscription.try_next() {
                Received::Event(event) => {
                    on_event(&event);
                    self.reason = event
                        .status_reason
                        .as_deref()
                        .map(human_reason)
                        .filter(|reason| !reason.is_empty())
                        .map(str::to_string);
                    self.status = Some(event.status);
                    changed = true;
                }
                Received::Empty => break,
                Received::Closed => {
                    if !self.closed {
                        self.closed = true;
                        changed = true;
                    }
                    break;
                }
            }
        }
        changed
    }
}

/// A stack in the tree, following its own streamer
#[derive(Debug)]
pub struct StackNode {
    pub name: String,
    pub description: String,
    pub children: Vec<RendererNode>,
    streamer: Arc<StackStreamer>,
    progress: NodeProgress,
}

impl StackNode {
    /// Subscribes to the stack's own events; call before the streamer runs.
    pub fn new(
        streamer: Arc<StackStreamer>,
        description: impl Into<String>,
        children: Vec<RendererNode>,
    ) -> Self {
        let name = streamer.stack_name().to_string();
        let progress = NodeProgress::new(streamer.subscribe(name.clone()));
        Self {
            name,
            description: description.into(),
            children,
            streamer,
            progress,
        }
    }

    pub fn streamer(&self) -> &Arc<StackStreamer> {
        &self.streamer
    }

    pub fn progress(&self) -> &NodeProgress {
        &self.progress
    }

    /// Drains this node and all descendants.
    pub fn refresh(&mut self) -> bool {
        let mut changed = self.progress.drain(|_| {});
        for child in &mut self.children {
            changed |= child.refresh();
        }
        changed
    }

    /// The stack's streamer stopped and every child is done.
    pub fn is_done(&self) -> bool {
        self.progress.closed && self.children.iter().all(RendererNode::is_done)
    }

    pub fn view(&self) -> NodeView {
        NodeView {
            kind: NodeKind::Stack,
            label: self.description.clone(),
            status: self.progress.status.clone(),
            reason: self.progress.reason.clone(),
            children: self.children.iter().map(RendererNode::view).collect(),
        }
    }
}

/// A plain resource, following its parent stack's streamer
#[derive(Debug)]
pub struct ResourceNode {
    pub logical_id: String,
    pub description: String,
    progress: NodeProgress,
}

impl ResourceNode {
    pub fn new(
        parent: &StackStreamer,
        logical_id: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let logical_id = logical_id.into();
        let progress = NodeProgress::new(parent.subscribe(logical_id.clone()));
        Self {
            logical_id,
            description: description.into(),
            progress,
        }
    }

    pub fn progress(&self) -> &NodeProgress {
        &self.progress
    }
}

/// A nested stack that did not exist yet when the tree was built.
///
/// It is rendered from the parent's view of the resource until the nested
/// stack's identifier shows up in the parent's stream.
#[derive(Debug)]
pub struct PendingStackNode {
    pub logical_id: String,
    pub description: String,
    pub change_set_id: String,
    progress: NodeProgress,
    stack_name: Option<String>,
    abandoned: bool,
}

impl PendingStackNode {
    pub fn new(
        parent: &StackStreamer,
        logical_id: impl Into<String>,
        description: impl Into<String>,
        change_set_id: impl Into<String>,
    ) -> Self {
        let logical_id = logical_id.into();
        let progress = NodeProgress::new(parent.subscribe(logical_id.clone()));
        Self {
            logical_id,
            description: description.into(),
            change_set_id: change_set_id.into(),
            progress,
            stack_name: None,
            abandoned: false,
        }
    }

    pub fn progress(&self) -> &NodeProgress {
        &self.progress
    }

    /// Nested stack name, once observed.
    pub fn stack_name(&self) -> Option<&str> {
        self.stack_name.as_deref()
    }

    /// Change set ID and stack name, when the node can be resolved.
    pub fn resolvable(&self) -> Option<(&str, &str)> {
        if self.abandoned {
            return None;
        }
        Some((self.change_set_id.as_str(), self.stack_name.as_deref()?))
    }

    /// Stop trying to resolve this node.
    pub fn abandon(&mut self) {
        self.abandoned = true;
    }

    fn refresh(&mut self) -> bool {
        let PendingStackNode {
            progress,
            stack_name,
            ..
        } = self;
        progress.drain(|event| {
            if stack_name.is_none() {
                *stack_name = event
                    .physical_resource_id
                    .as_deref()
                    .and_then(parse_stack_name_from_arn)
                    .map(str::to_string);
            }
        })
    }
}

/// A node of the renderer tree
#[derive(Debug)]
pub enum RendererNode {
    Stack(StackNode),
    Resource(ResourceNode),
    PendingStack(PendingStackNode),
}

impl RendererNode {
    pub fn description(&self) -> &str {
        match self {
            RendererNode::Stack(node) => &node.description,
            RendererNode::Resource(node) => &node.description,
            RendererNode::PendingStack(node) => &node.description,
        }
    }

    pub fn children(&self) -> &[RendererNode] {
        match self {
            RendererNode::Stack(node) => &node.children,
            RendererNode::Resource(_) | RendererNode::PendingStack(_) => &[],
        }
    }

    pub fn refresh(&mut self) -> bool {
        match self {
            RendererNode::Stack(node) => node.refresh(),
            RendererNode::Resource(node) => node.progress.drain(|_| {}),
            RendererNode::PendingStack(node) => node.refresh(),
        }
    }

    pub fn is_done(&self) -> bool {
        match self {
            RendererNode::Stack(node) => node.is_done(),
            RendererNode::Resource(node) => node.progress.closed,
            RendererNode::PendingStack(node) => node.progress.closed,
        }
    }

    pub fn view(&self) -> NodeView {
        let (kind, progress, label) = match self {
            RendererNode::Stack(node) => return node.view(),
            RendererNode::Resource(node) => (NodeKind::Resource, &node.progress, &node.description),
            RendererNode::PendingStack(node) => {
                (NodeKind::PendingStack, &node.progress, &node.description)
            }
        };
        NodeView {
            kind,
            label: label.clone(),
            status: progress.status.clone(),
            reason: progress.reason.clone(),
            children: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Stack,
    Resource,
    PendingStack,
}

/// Owned snapshot of the tree handed to progress sinks
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeView {
    pub kind: NodeKind,
    pub label: String,
    pub status: Option<StackStatus>,
    pub reason: Option<String>,
    pub children: Vec<NodeView>,
}

impl NodeView {
    /// Number of nodes of `kind` in this subtree, including itself.
    pub fn count(&self, kind: NodeKind) -> usize {
        let own = usize::from(self.kind == kind);
        own + self.children.iter().map(|child| child.count(kind)).sum::<usize>()
    }

    /// Depth-first search by label.
    pub fn find(&self, label: &str) -> Option<&NodeView> {
        if self.label == label {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(label))
    }
}
