//! Tool system for canvas interactions.
//!
//! Each editing mode has one tool. A tool turns pointer events (plus the
//! item under the pointer, resolved by the controller) into
//! `CanvasCommand`s; the controller applies them. Tools never touch the
//! canvas directly.
//!
//! | Mode | Press | Drag | Release |
//! |------|-------|------|---------|
//! | Select | select / start marquee | move selection / grow marquee | finish |
//! | InsertNode | insert node | | |
//! | InsertLink | anchor rubber band | stretch | connect if both ends hit distinct nodes |
//! | InsertText | insert empty text, start editing | | |

use crate::input::InputEvent;
use ns_core::{ItemRef, Line, NodeHandle, NodeKind, Point, Rect, Vec2};
use smallvec::SmallVec;
use std::fmt;

/// The controller's editing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Select,
    InsertNode(NodeKind),
    InsertLink,
    InsertText,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Select => f.write_str("select"),
            Mode::InsertNode(kind) => write!(f, "insert {kind}"),
            Mode::InsertLink => f.write_str("insert link"),
            Mode::InsertText => f.write_str("insert text"),
        }
    }
}

/// A canvas mutation requested by a tool.
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasCommand {
    /// Move nodes and texts by `delta`. Links follow their endpoints.
    Translate { items: Vec<ItemRef>, delta: Vec2 },
    /// Replace (or extend) the selection with everything touching `rect`.
    SelectRect { rect: Rect, extend: bool },
    /// Insert a new node with its top-left corner at `at`.
    InsertNode { kind: NodeKind, at: Point },
    /// Link two distinct nodes.
    Connect { from: NodeHandle, to: NodeHandle },
    /// Insert an empty text annotation at `at` and start editing it.
    InsertText { at: Point },
}

/// Trait for tools that handle input and produce canvas commands.
pub trait Tool {
    fn mode(&self) -> Mode;

    /// Handle an input event, returning zero or more commands.
    fn handle(&mut self, event: &InputEvent, hit: Option<ItemRef>) -> Vec<CanvasCommand>;

    /// Abandon any gesture in progress.
    fn cancel(&mut self) {}
}

// ─── Select Tool ─────────────────────────────────────────────────────────

pub type Selection = SmallVec<[ItemRef; 4]>;

#[derive(Debug, Default)]
pub struct SelectTool {
    pub selected: Selection,
    dragging: bool,
    last: Point,
    /// Marquee anchor, set when a press lands on empty canvas.
    marquee_start: Option<Point>,
    marquee_end: Option<Point>,
    marquee_extend: bool,
}

impl SelectTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn first_selected(&self) -> Option<ItemRef> {
        self.selected.first().copied()
    }

    /// Current marquee corners while box-selecting.
    pub fn marquee(&self) -> Option<(Point, Point)> {
        self.marquee_start.zip(self.marquee_end)
    }
}

impl Tool for SelectTool {
    fn mode(&self) -> Mode {
        Mode::Select
    }

    fn handle(&mut self, event: &InputEvent, hit: Option<ItemRef>) -> Vec<CanvasCommand> {
        let Some(pos) = event.position() else {
            return vec![];
        };
        match event {
            InputEvent::PointerDown { modifiers, .. } => {
                self.marquee_start = None;
                self.marquee_end = None;

                if let Some(item) = hit {
                    if modifiers.shift {
                        if let Some(i) = self.selected.iter().position(|s| *s == item) {
                            self.selected.remove(i);
                        } else {
                            self.selected.push(item);
                        }
                    } else if !self.selected.contains(&item) {
                        self.selected.clear();
                        self.selected.push(item);
                    }
                    // Pressing an already selected item keeps the selection for dragging.
                    self.dragging = true;
                    self.last = pos;
                } else {
                    if !modifiers.shift {
                        self.selected.clear();
                    }
                    self.dragging = false;
                    self.marquee_start = Some(pos);
                    self.marquee_end = Some(pos);
                    self.marquee_extend = modifiers.shift;
                }
                vec![]
            }
            InputEvent::PointerMove { .. } => {
                if self.dragging {
                    let delta = pos - self.last;
                    self.last = pos;
                    if delta != Vec2::ZERO && !self.selected.is_empty() {
                        return vec![CanvasCommand::Translate {
                            items: self.selected.to_vec(),
                            delta,
                        }];
                    }
                } else if self.marquee_start.is_some() {
                    self.marquee_end = Some(pos);
                }
                vec![]
            }
            InputEvent::PointerUp { .. } => {
                self.dragging = false;
                self.marquee_end = None;
                match self.marquee_start.take() {
                    Some(start) if start != pos => vec![CanvasCommand::SelectRect {
                        rect: Rect::from_points(start, pos),
                        extend: self.marquee_extend,
                    }],
                    _ => vec![],
                }
            }
            InputEvent::Key { .. } => vec![],
        }
    }

    fn cancel(&mut self) {
        self.dragging = false;
        self.marquee_start = None;
        self.marquee_end = None;
    }
}

// ─── Node Tool ───────────────────────────────────────────────────────────

/// Inserts one node per press. The mode stays active for repeated inserts.
#[derive(Debug)]
pub struct NodeTool {
    pub kind: NodeKind,
}

impl NodeTool {
    pub fn new(kind: NodeKind) -> Self {
        Self { kind }
    }
}

impl Tool for NodeTool {
    fn mode(&self) -> Mode {
        Mode::InsertNode(self.kind)
    }

    fn handle(&mut self, event: &InputEvent, _hit: Option<ItemRef>) -> Vec<CanvasCommand> {
        match event {
            InputEvent::PointerDown { x, y, .. } => vec![CanvasCommand::InsertNode {
                kind: self.kind,
                at: Point::new(*x, *y),
            }],
            _ => vec![],
        }
    }
}

// ─── Link Tool ───────────────────────────────────────────────────────────

/// Rubber-band link drawing. The controller resolves `hit` to nodes only
/// while this tool is active.
#[derive(Debug, Default)]
pub struct LinkTool {
    start: Option<NodeHandle>,
    anchor: Option<Point>,
    current: Option<Point>,
}

impl LinkTool {
    pub fn new() -> Self {
        Self::default()
    }

    /// The transient line between the press point and the pointer.
    pub fn rubber_band(&self) -> Option<Line> {
        Some(Line::new(self.anchor?, self.current?))
    }
}

impl Tool for LinkTool {
    fn mode(&self) -> Mode {
        Mode::InsertLink
    }

    fn handle(&mut self, event: &InputEvent, hit: Option<ItemRef>) -> Vec<CanvasCommand> {
        let Some(pos) = event.position() else {
            return vec![];
        };
        match event {
            InputEvent::PointerDown { .. } => {
                self.anchor = Some(pos);
                self.current = Some(pos);
                self.start = hit.and_then(ItemRef::as_node);
                vec![]
            }
            InputEvent::PointerMove { .. } => {
                if self.anchor.is_some() {
                    self.current = Some(pos);
                }
                vec![]
            }
            InputEvent::PointerUp { .. } => {
                if self.anchor.take().is_none() {
                    return vec![];
                }
                self.current = None;
                let end = hit.and_then(ItemRef::as_node);
                match (self.start.take(), end) {
                    (Some(from), Some(to)) if from != to => {
                        vec![CanvasCommand::Connect { from, to }]
                    }
                    (Some(_), Some(_)) => {
                        log::warn!("link gesture discarded: a node cannot link to itself");
                        vec![]
                    }
                    _ => {
                        log::warn!("link gesture discarded: both ends must land on a node");
                        vec![]
                    }
                }
            }
            InputEvent::Key { .. } => vec![],
        }
    }

    fn cancel(&mut self) {
        self.start = None;
        self.anchor = None;
        self.current = None;
    }
}

// ─── Text Tool ───────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct TextTool;

impl TextTool {
    pub fn new() -> Self {
        Self
    }
}

impl Tool for TextTool {
    fn mode(&self) -> Mode {
        Mode::InsertText
    }

    fn handle(&mut self, event: &InputEvent, _hit: Option<ItemRef>) -> Vec<CanvasCommand> {
        match event {
            InputEvent::PointerDown { x, y, .. } => vec![CanvasCommand::InsertText {
                at: Point::new(*x, *y),
            }],
            _ => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Modifiers;
    use ns_core::{Canvas, NodeItem};
    use pretty_assertions::assert_eq;

    fn two_nodes() -> (NodeHandle, NodeHandle) {
        let mut canvas = Canvas::new();
        let a = canvas
            .add_node(NodeItem::new("h1".parse().unwrap(), Point::ZERO))
            .unwrap();
        let b = canvas
            .add_node(NodeItem::new("s1".parse().unwrap(), Point::new(200.0, 0.0)))
            .unwrap();
        (a, b)
    }

    #[test]
    fn select_click_then_drag_translates() {
        let (a, _) = two_nodes();
        let mut tool = SelectTool::new();
        let hit = Some(ItemRef::Node(a));
        assert!(tool.handle(&InputEvent::down(10.0, 10.0), hit).is_empty());
        assert_eq!(tool.first_selected(), hit);

        let cmds = tool.handle(&InputEvent::moved(15.0, 30.0), hit);
        assert_eq!(
            cmds,
            vec![CanvasCommand::Translate {
                items: vec![ItemRef::Node(a)],
                delta: Vec2::new(5.0, 20.0),
            }]
        );
        assert!(tool.handle(&InputEvent::up(15.0, 30.0), hit).is_empty());
        assert!(tool.handle(&InputEvent::moved(50.0, 50.0), None).is_empty());
    }

    #[test]
    fn select_shift_click_toggles() {
        let (a, b) = two_nodes();
        let mut tool = SelectTool::new();
        let shift_down = |x, y| InputEvent::PointerDown {
            x,
            y,
            modifiers: Modifiers::SHIFT,
        };
        tool.handle(&InputEvent::down(0.0, 0.0), Some(ItemRef::Node(a)));
        tool.handle(&shift_down(200.0, 0.0), Some(ItemRef::Node(b)));
        assert_eq!(tool.selected.as_slice(), &[ItemRef::Node(a), ItemRef::Node(b)]);
        tool.handle(&shift_down(0.0, 0.0), Some(ItemRef::Node(a)));
        assert_eq!(tool.selected.as_slice(), &[ItemRef::Node(b)]);
    }

    #[test]
    fn select_press_on_empty_starts_marquee() {
        let (a, _) = two_nodes();
        let mut tool = SelectTool::new();
        tool.handle(&InputEvent::down(0.0, 0.0), Some(ItemRef::Node(a)));
        tool.handle(&InputEvent::up(0.0, 0.0), Some(ItemRef::Node(a)));

        tool.handle(&InputEvent::down(500.0, 500.0), None);
        assert!(tool.selected.is_empty());
        tool.handle(&InputEvent::moved(400.0, 450.0), None);
        assert_eq!(
            tool.marquee(),
            Some((Point::new(500.0, 500.0), Point::new(400.0, 450.0)))
        );
        let cmds = tool.handle(&InputEvent::up(300.0, 400.0), None);
        assert_eq!(
            cmds,
            vec![CanvasCommand::SelectRect {
                rect: Rect::new(300.0, 400.0, 500.0, 500.0),
                extend: false,
            }]
        );
        assert_eq!(tool.marquee(), None);
    }

    #[test]
    fn click_on_empty_canvas_emits_no_marquee() {
        let mut tool = SelectTool::new();
        tool.handle(&InputEvent::down(5.0, 5.0), None);
        assert!(tool.handle(&InputEvent::up(5.0, 5.0), None).is_empty());
    }

    #[test]
    fn node_tool_inserts_on_every_press() {
        let mut tool = NodeTool::new(NodeKind::Switch);
        for _ in 0..2 {
            assert_eq!(
                tool.handle(&InputEvent::down(1.0, 2.0), None),
                vec![CanvasCommand::InsertNode {
                    kind: NodeKind::Switch,
                    at: Point::new(1.0, 2.0),
                }]
            );
        }
        assert_eq!(tool.mode(), Mode::InsertNode(NodeKind::Switch));
    }

    #[test]
    fn link_tool_connects_distinct_nodes() {
        let (a, b) = two_nodes();
        let mut tool = LinkTool::new();
        tool.handle(&InputEvent::down(10.0, 10.0), Some(ItemRef::Node(a)));
        tool.handle(&InputEvent::moved(100.0, 10.0), None);
        assert_eq!(
            tool.rubber_band(),
            Some(Line::new((10.0, 10.0), (100.0, 10.0)))
        );
        let cmds = tool.handle(&InputEvent::up(210.0, 10.0), Some(ItemRef::Node(b)));
        assert_eq!(cmds, vec![CanvasCommand::Connect { from: a, to: b }]);
        assert_eq!(tool.rubber_band(), None);
    }

    #[test]
    fn link_tool_discards_invalid_gestures() {
        let (a, _) = two_nodes();
        let mut tool = LinkTool::new();

        // Empty canvas to node.
        tool.handle(&InputEvent::down(500.0, 500.0), None);
        assert!(tool.handle(&InputEvent::up(10.0, 10.0), Some(ItemRef::Node(a))).is_empty());

        // Node to itself.
        tool.handle(&InputEvent::down(10.0, 10.0), Some(ItemRef::Node(a)));
        assert!(tool.handle(&InputEvent::up(20.0, 20.0), Some(ItemRef::Node(a))).is_empty());

        // Node to empty canvas.
        tool.handle(&InputEvent::down(10.0, 10.0), Some(ItemRef::Node(a)));
        assert!(tool.handle(&InputEvent::up(900.0, 900.0), None).is_empty());

        // Release without press.
        assert!(tool.handle(&InputEvent::up(10.0, 10.0), Some(ItemRef::Node(a))).is_empty());
    }

    #[test]
    fn text_tool_inserts_at_press() {
        let mut tool = TextTool::new();
        assert_eq!(
            tool.handle(&InputEvent::down(7.0, 8.0), None),
            vec![CanvasCommand::InsertText {
                at: Point::new(7.0, 8.0)
            }]
        );
        assert!(tool.handle(&InputEvent::up(7.0, 8.0), None).is_empty());
    }
}
