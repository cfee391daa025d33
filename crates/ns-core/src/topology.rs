//! Persisted topology format: a JSON array of two-element id arrays.
//!
//! ```json
//! [
//!    ["h1", "s1"],
//!    ["h2", "s1"]
//! ]
//! ```
//!
//! Edges are undirected. The canonical form sorts the two ids of every edge,
//! collapses identical pairs, and sorts the edge list by `(first, second)`
//! using the textual id order. Saving always emits the canonical form, so
//! the same live graph produces byte-identical output regardless of the
//! order in which its links were drawn. Loading accepts any order.

use crate::canvas::Canvas;
use crate::error::FormatError;
use crate::name::NodeName;
use std::collections::BTreeSet;
use std::fmt;
use std::fmt::Write;

/// One undirected connection between two distinct node ids, as written.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Edge(NodeName, NodeName);

impl Edge {
    /// `None` if both ends are the same node.
    pub fn new(a: NodeName, b: NodeName) -> Option<Self> {
        (a != b).then_some(Self(a, b))
    }

    pub fn endpoints(&self) -> (NodeName, NodeName) {
        (self.0, self.1)
    }

    /// The same edge with its ids in textual order.
    pub fn canonical(self) -> Self {
        if self.1 < self.0 {
            Self(self.1, self.0)
        } else {
            self
        }
    }
}

impl fmt::Debug for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.0, self.1)
    }
}

/// An ordered edge sequence. Only the canonical form is meaningful for
/// comparison; see [`Topology::equivalent`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Topology {
    edges: Vec<Edge>,
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_edges(edges: Vec<Edge>) -> Self {
        Self { edges }
    }

    /// Build from the live links of a canvas, in canonical form.
    pub fn from_canvas(canvas: &Canvas) -> Self {
        let edges = canvas
            .link_names()
            .into_iter()
            .filter_map(|(a, b)| Edge::new(a, b))
            .collect();
        Self { edges }.canonicalize()
    }

    pub fn push(&mut self, edge: Edge) {
        self.edges.push(edge);
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Every node id mentioned by at least one edge.
    pub fn nodes(&self) -> BTreeSet<NodeName> {
        self.edges
            .iter()
            .flat_map(|e| [e.0, e.1])
            .collect()
    }

    /// Orient every edge, drop duplicate pairs, and sort.
    pub fn canonicalize(&self) -> Self {
        let edges: BTreeSet<Edge> = self.edges.iter().map(|e| e.canonical()).collect();
        Self {
            edges: edges.into_iter().collect(),
        }
    }

    pub fn is_canonical(&self) -> bool {
        self.edges
            .windows(2)
            .all(|w| w[0] < w[1])
            && self.edges.iter().all(|e| *e == e.canonical())
    }

    /// Equal as sets of undirected pairs.
    pub fn equivalent(&self, other: &Topology) -> bool {
        self.canonicalize() == other.canonicalize()
    }

    /// Canonical save text, one edge per line.
    pub fn to_canonical_string(&self) -> String {
        let canonical = self.canonicalize();
        let mut out = String::from("[\n");
        let last = canonical.edges.len().saturating_sub(1);
        for (i, Edge(a, b)) in canonical.edges.iter().enumerate() {
            let sep = if i == last { "" } else { "," };
            // Writing into a String cannot fail.
            let _ = writeln!(out, "   [\"{a}\", \"{b}\"]{sep}");
        }
        out.push_str("]\n");
        out
    }

    /// Parse and validate a persisted topology.
    ///
    /// Fails on malformed JSON, entries that are not pairs of strings, ids
    /// outside the `h<N>`/`s<N>` grammar, and self-loops.
    pub fn parse(bytes: &[u8]) -> Result<Self, FormatError> {
        let raw: Vec<Vec<String>> = serde_json::from_slice(bytes)?;
        let mut edges = Vec::with_capacity(raw.len());
        for (index, pair) in raw.into_iter().enumerate() {
            let [a, b]: [String; 2] = pair.try_into().map_err(|pair: Vec<String>| {
                FormatError::Arity {
                    index,
                    len: pair.len(),
                }
            })?;
            let parse = |id: String| {
                id.parse::<NodeName>()
                    .map_err(|_| FormatError::InvalidId { index, id })
            };
            let (a, b) = (parse(a)?, parse(b)?);
            let edge = Edge::new(a, b).ok_or_else(|| FormatError::SelfLoop {
                index,
                id: a.to_string(),
            })?;
            edges.push(edge);
        }
        Ok(Self { edges })
    }
}

/// Serialize a topology to its canonical bytes.
pub fn save(topology: &Topology) -> Vec<u8> {
    topology.to_canonical_string().into_bytes()
}

/// Parse persisted bytes back into a topology.
pub fn load(bytes: &[u8]) -> Result<Topology, FormatError> {
    Topology::parse(bytes)
}
