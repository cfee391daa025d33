//! Canvas item model: nodes, links, and text annotations.
//!
//! Items live in the [`Canvas`](crate::canvas::Canvas) arena and are addressed
//! by opaque handles. A node's incident links are stored on the node itself
//! as handles, never as owning references, so deleting anything is plain
//! bookkeeping.

use crate::name::{NodeKind, NodeName};
use kurbo::{Line, Point, Rect, Size};
use petgraph::graph::{EdgeIndex, NodeIndex};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;
use std::fmt;

// ─── Geometry ────────────────────────────────────────────────────────────

/// Side length of a host/switch icon.
pub const NODE_SIZE: f64 = 80.0;

/// Z-value of every link (drawn behind nodes).
pub const LINK_Z: f64 = -1000.0;

/// Z-value of every text annotation (drawn above nodes).
pub const TEXT_Z: f64 = 1000.0;

/// Estimated glyph box used to hit-test text annotations.
pub const TEXT_CHAR_WIDTH: f64 = 8.0;
pub const TEXT_LINE_HEIGHT: f64 = 20.0;

// ─── Colors ──────────────────────────────────────────────────────────────

/// An opaque RGB display color. Serialized as `#RRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RGB` or `#RRGGBB`; the leading `#` is optional.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let digit = |i: usize| {
            hex.as_bytes()
                .get(i)
                .and_then(|c| (*c as char).to_digit(16))
                .map(|d| d as u8)
        };
        match hex.len() {
            3 => Some(Self::rgb(digit(0)? * 17, digit(1)? * 17, digit(2)? * 17)),
            6 => Some(Self::rgb(
                digit(0)? << 4 | digit(1)?,
                digit(2)? << 4 | digit(3)?,
                digit(4)? << 4 | digit(5)?,
            )),
            _ => None,
        }
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Color::from_hex(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid color {s:?}")))
    }
}

// ─── Handles ─────────────────────────────────────────────────────────────

/// Opaque handle to a node in the canvas arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeHandle(pub(crate) NodeIndex);

/// Opaque handle to a link in the canvas arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkHandle(pub(crate) EdgeIndex);

/// Opaque handle to a text annotation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextHandle(pub(crate) u32);

impl NodeHandle {
    pub fn index(self) -> usize {
        self.0.index()
    }
}

impl LinkHandle {
    pub fn index(self) -> usize {
        self.0.index()
    }
}

impl TextHandle {
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0.index())
    }
}

impl fmt::Debug for LinkHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "link#{}", self.0.index())
    }
}

impl fmt::Debug for TextHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "text#{}", self.0)
    }
}

/// Any item on the canvas. Behaviour that depends on the item type matches
/// on this exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ItemRef {
    Node(NodeHandle),
    Link(LinkHandle),
    Text(TextHandle),
}

impl ItemRef {
    pub fn as_node(self) -> Option<NodeHandle> {
        match self {
            ItemRef::Node(n) => Some(n),
            ItemRef::Link(_) | ItemRef::Text(_) => None,
        }
    }
}

// ─── Items ───────────────────────────────────────────────────────────────

/// A host or switch on the canvas.
#[derive(Debug, Clone)]
pub struct NodeItem {
    name: NodeName,
    label: String,
    /// Top-left corner of the icon.
    pub position: Point,
    pub z: f64,
    /// Incident links. Always the exact inverse of the link endpoints.
    pub(crate) links: SmallVec<[LinkHandle; 4]>,
}

impl NodeItem {
    pub fn new(name: NodeName, position: Point) -> Self {
        Self {
            name,
            label: name.to_string(),
            position,
            z: 0.0,
            links: SmallVec::new(),
        }
    }

    pub fn name(&self) -> NodeName {
        self.name
    }

    pub fn kind(&self) -> NodeKind {
        self.name.kind()
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Rename the node; the label follows.
    pub fn set_name(&mut self, name: NodeName) {
        self.name = name;
        self.label = name.to_string();
    }

    pub fn links(&self) -> &[LinkHandle] {
        &self.links
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(self.position, Size::new(NODE_SIZE, NODE_SIZE))
    }

    pub fn center(&self) -> Point {
        self.bounds().center()
    }
}

/// A visual, undirected connection between two distinct nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkItem {
    pub color: Color,
    /// Rendered segment between the endpoint centers. Recomputed whenever
    /// either endpoint moves; never persisted.
    pub(crate) line: Line,
}

impl LinkItem {
    pub fn new(color: Color) -> Self {
        Self {
            color,
            line: Line::new(Point::ZERO, Point::ZERO),
        }
    }

    pub fn line(&self) -> Line {
        self.line
    }
}

/// A free-floating text annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct TextItem {
    pub content: String,
    pub position: Point,
    pub color: Color,
    pub z: f64,
    /// Whether the annotation currently has keyboard focus for editing.
    pub editing: bool,
}

impl TextItem {
    pub fn new(position: Point, color: Color) -> Self {
        Self {
            content: String::new(),
            position,
            color,
            z: TEXT_Z,
            editing: false,
        }
    }

    pub fn bounds(&self) -> Rect {
        let widest = self
            .content
            .lines()
            .map(|l| l.chars().count())
            .max()
            .unwrap_or(0)
            .max(1);
        let lines = self.content.lines().count().max(1);
        Rect::from_origin_size(
            self.position,
            Size::new(
                widest as f64 * TEXT_CHAR_WIDTH,
                lines as f64 * TEXT_LINE_HEIGHT,
            ),
        )
    }
}
