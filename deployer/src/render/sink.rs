//! Progress sinks

use std::collections::HashMap;
use std::io::{self, Write};

use colored::{ColoredString, Colorize};

use crate::cfn::status::StackStatus;
use crate::errors::DeployError;
use crate::render::tree::NodeView;

/// Receives snapshots of the renderer tree
pub trait ProgressSink: Send + 'static {
    /// Called whenever a node changed.
    fn update(&mut self, root: &NodeView) -> Result<(), DeployError>;

    /// Called once, after the last update.
    fn finish(&mut self, root: &NodeView) -> Result<(), DeployError> {
        self.update(root)
    }
}

/// Writes one indented line per node status change
pub struct LineSink<W: Write + Send + 'static> {
    writer: W,
    printed: HashMap<String, (Option<StackStatus>, Option<String>)>,
}

impl LineSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send + 'static> LineSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            printed: HashMap::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    /// `position` is the child index path from the root; labels need not be unique.
    fn write_node(&mut self, node: &NodeView, position: &str, depth: usize) -> io::Result<()> {
        let current = (node.status.clone(), node.reason.clone());
        if node.status.is_some() && self.printed.get(position) != Some(&current) {
            let indent = "  ".repeat(depth);
            match (&node.status, &node.reason) {
                (Some(status), Some(reason)) if status.failure() || status.is_failed_operation() => {
                    writeln!(self.writer, "{}{}  {}  {}", indent, node.label, colorize(status), reason)?;
                }
                (Some(status), _) => {
                    writeln!(self.writer, "{}{}  {}", indent, node.label, colorize(status))?;
                }
                (None, _) => {}
            }
            self.printed.insert(position.to_string(), current);
        }
        for (index, child) in node.children.iter().enumerate() {
            self.write_node(child, &format!("{}.{}", position, index), depth + 1)?;
        }
        Ok(())
    }
}

impl<W: Write + Send + 'static> ProgressSink for LineSink<W> {
    fn update(&mut self, root: &NodeView) -> Result<(), DeployError> {
        self.write_node(root, "0", 0)?;
        self.writer.flush()?;
        Ok(())
    }
}

fn colorize(status: &StackStatus) -> ColoredString {
    if status.failure() || status.is_failed_operation() {
        status.as_str().red()
    } else if status.success() {
        status.as_str().green()
    } else {
        status.as_str().yellow()
    }
}
