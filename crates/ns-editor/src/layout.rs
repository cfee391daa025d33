//! Layout requests that can run off the interaction thread.
//!
//! The controller stamps every request with a generation number. A result is
//! applied only if no newer request (or canvas replacement) happened since,
//! so a slow layout can never overwrite a newer canvas with stale
//! coordinates.

use ns_core::{CanvasTransform, LayoutConfig, NodeName, Point, SpringLayout, Topology, layout_topology};
use std::collections::BTreeMap;

/// Everything needed to compute a layout, detached from the controller.
#[derive(Debug, Clone)]
pub struct LayoutRequest {
    generation: u64,
    topology: Topology,
    config: LayoutConfig,
}

impl LayoutRequest {
    pub(crate) fn new(generation: u64, topology: Topology, config: LayoutConfig) -> Self {
        Self {
            generation,
            topology,
            config,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Run the spring layout. Blocking; may be called from any thread.
    pub fn compute(self) -> LayoutResult {
        let transform: CanvasTransform = self.config.transform;
        let engine = SpringLayout::new(self.config);
        let positions = layout_topology(&engine, &self.topology, transform);
        LayoutResult {
            generation: self.generation,
            topology: self.topology,
            positions,
        }
    }
}

/// Canvas positions for a requested topology.
#[derive(Debug, Clone)]
pub struct LayoutResult {
    pub(crate) generation: u64,
    pub(crate) topology: Topology,
    pub(crate) positions: BTreeMap<NodeName, Point>,
}

impl LayoutResult {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn positions(&self) -> &BTreeMap<NodeName, Point> {
        &self.positions
    }
}
