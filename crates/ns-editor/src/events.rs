//! Notifications from the controller to the UI layer.
//!
//! The controller queues events as it mutates the canvas; the UI drains them
//! after each call and updates toolbars, status lines, and dialogs.

use crate::tools::Mode;
use ns_core::{ItemRef, LinkHandle, NodeHandle, NodeName, TextHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DiagramEvent {
    ModeChanged(Mode),
    NodeInserted {
        node: NodeHandle,
        name: NodeName,
    },
    LinkCreated {
        link: LinkHandle,
        between: (NodeName, NodeName),
    },
    TextInserted(TextHandle),
    ItemsDeleted {
        nodes: Vec<NodeName>,
        links: usize,
        texts: usize,
    },
    SelectionChanged(Vec<ItemRef>),
    /// The whole canvas was replaced by a loaded or generated topology, or
    /// cleared.
    CanvasReplaced {
        nodes: usize,
        links: usize,
    },
    Notification {
        severity: Severity,
        message: String,
    },
}

impl DiagramEvent {
    pub fn info(message: impl Into<String>) -> Self {
        Self::Notification {
            severity: Severity::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::Notification {
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Notification {
            severity: Severity::Error,
            message: message.into(),
        }
    }
}
