pub mod canvas;
pub mod config;
pub mod emulator;
pub mod error;
pub mod generate;
pub mod id;
pub mod layout;
pub mod model;
pub mod name;
pub mod store;
pub mod topology;

pub use canvas::Canvas;
pub use config::{ConfigError, EditorConfig};
pub use emulator::{EmulatorConfig, launch};
pub use error::{Error, FormatError, LaunchError, Result, StateError, StoreError};
pub use generate::{
    MAX_FLAT_HOSTS, MAX_FLAT_SWITCHES, MAX_HOSTS_PER_SUBNET, MAX_SUBNETS, generate_flat,
    generate_subnet,
};
pub use id::{IdPool, NodeIdAllocator};
pub use layout::{CanvasTransform, LayoutConfig, LayoutEngine, SpringLayout, layout_topology};
pub use model::*;
pub use name::{InvalidName, NodeKind, NodeName};
pub use store::{load_topology, save_topology, with_json_extension};
pub use topology::{Edge, Topology};

// Re-export kurbo geometry so downstream crates don't need a direct dependency
pub use kurbo::{Line, Point, Rect, Vec2};
