pub mod display;
pub mod hit;

pub use display::{Overlay, Primitive, display_list, paint_order};
pub use hit::{hit_test, hit_test_node, hit_test_rect};
