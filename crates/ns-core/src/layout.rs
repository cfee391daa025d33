//! Graph layout adapter.
//!
//! Wraps the `force_graph` spring simulation behind [`LayoutEngine`]: given a
//! node set and an edge set, return one 2-D position per node. Results are
//! normalized to `[-1, 1]` and then mapped into canvas space by
//! [`CanvasTransform`] (`canvas = coord * scale + offset`).
//!
//! Layout is the one potentially slow step of load/generate. It is a plain
//! synchronous function over owned inputs so callers may run it on a worker
//! thread; see `LayoutRequest` in the editor crate for superseding stale
//! requests.

use crate::name::NodeName;
use crate::topology::Topology;
use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData, SimulationParameters};
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::f64::consts::PI;

/// Affine map from normalized layout coordinates to canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasTransform {
    pub scale: f64,
    pub offset: f64,
}

impl Default for CanvasTransform {
    fn default() -> Self {
        Self {
            scale: 500.0,
            offset: 2500.0,
        }
    }
}

impl CanvasTransform {
    pub fn apply(&self, p: Point) -> Point {
        Point::new(p.x * self.scale + self.offset, p.y * self.scale + self.offset)
    }
}

/// Tuning for the spring simulation and the canvas mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Simulation steps per layout.
    pub iterations: usize,
    /// Seconds of simulated time per step.
    pub time_step: f32,
    /// Radius of the initial circle the nodes start on.
    pub initial_radius: f64,
    pub force_charge: f32,
    pub force_spring: f32,
    pub force_max: f32,
    pub node_speed: f32,
    pub damping_factor: f32,
    pub transform: CanvasTransform,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            iterations: 400,
            time_step: 0.035,
            initial_radius: 100.0,
            force_charge: 150.0,
            force_spring: 0.05,
            force_max: 100.0,
            node_speed: 3000.0,
            damping_factor: 0.9,
            transform: CanvasTransform::default(),
        }
    }
}

/// A layout algorithm: positions for every requested node, normalized so
/// the drawing fits in `[-1, 1]` on both axes.
pub trait LayoutEngine {
    fn layout(
        &self,
        nodes: &BTreeSet<NodeName>,
        edges: &[(NodeName, NodeName)],
    ) -> BTreeMap<NodeName, Point>;
}

/// Force-directed ("spring") layout backed by `force_graph`.
#[derive(Debug, Clone, Default)]
pub struct SpringLayout {
    pub config: LayoutConfig,
}

impl SpringLayout {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }
}

impl LayoutEngine for SpringLayout {
    fn layout(
        &self,
        nodes: &BTreeSet<NodeName>,
        edges: &[(NodeName, NodeName)],
    ) -> BTreeMap<NodeName, Point> {
        let cfg = &self.config;
        let mut graph: ForceGraph<(), ()> = ForceGraph::new(SimulationParameters {
            force_charge: cfg.force_charge,
            force_spring: cfg.force_spring,
            force_max: cfg.force_max,
            node_speed: cfg.node_speed,
            damping_factor: cfg.damping_factor,
        });

        // Deterministic start: nodes evenly spaced on a circle in id order.
        let count = nodes.len().max(1) as f64;
        let mut index: HashMap<NodeName, DefaultNodeIdx> = HashMap::with_capacity(nodes.len());
        let mut names: HashMap<DefaultNodeIdx, NodeName> = HashMap::with_capacity(nodes.len());
        for (i, name) in nodes.iter().enumerate() {
            let angle = i as f64 * 2.0 * PI / count;
            let idx = graph.add_node(NodeData {
                x: (cfg.initial_radius * angle.cos()) as f32,
                y: (cfg.initial_radius * angle.sin()) as f32,
                mass: 10.0,
                is_anchor: false,
                user_data: (),
            });
            index.insert(*name, idx);
            names.insert(idx, *name);
        }

        for (a, b) in edges {
            if let (Some(&ia), Some(&ib)) = (index.get(a), index.get(b)) {
                graph.add_edge(ia, ib, EdgeData::default());
            } else {
                log::warn!("layout edge {a}-{b} references a node outside the node set");
            }
        }

        for _ in 0..cfg.iterations {
            graph.update(cfg.time_step);
        }

        let mut raw = BTreeMap::new();
        graph.visit_nodes(|node| {
            if let Some(name) = names.get(&node.index()) {
                raw.insert(*name, Point::new(node.x() as f64, node.y() as f64));
            }
        });
        log::debug!(
            "spring layout: {} node(s), {} edge(s), {} step(s)",
            nodes.len(),
            edges.len(),
            cfg.iterations
        );
        normalize(raw)
    }
}

/// Center on the centroid and scale so the largest coordinate is 1.
fn normalize(mut positions: BTreeMap<NodeName, Point>) -> BTreeMap<NodeName, Point> {
    if positions.is_empty() {
        return positions;
    }
    let n = positions.len() as f64;
    let centroid = positions
        .values()
        .fold(Vec2::ZERO, |acc, p| acc + p.to_vec2())
        / n;
    let extent = positions
        .values()
        .map(|p| {
            let d = p.to_vec2() - centroid;
            d.x.abs().max(d.y.abs())
        })
        .fold(0.0_f64, f64::max);
    let scale = if extent > f64::EPSILON { 1.0 / extent } else { 0.0 };
    for p in positions.values_mut() {
        *p = ((p.to_vec2() - centroid) * scale).to_point();
    }
    positions
}

/// Lay out every node of `topology` and map the result into canvas space.
pub fn layout_topology(
    engine: &dyn LayoutEngine,
    topology: &Topology,
    transform: CanvasTransform,
) -> BTreeMap<NodeName, Point> {
    let nodes = topology.nodes();
    let edges: Vec<(NodeName, NodeName)> =
        topology.edges().iter().map(|e| e.endpoints()).collect();
    engine
        .layout(&nodes, &edges)
        .into_iter()
        .map(|(name, p)| (name, transform.apply(p)))
        .collect()
}
