pub mod controller;
pub mod events;
pub mod input;
pub mod layout;
pub mod shortcuts;
pub mod tools;

pub use controller::DiagramController;
pub use events::{DiagramEvent, Severity};
pub use input::{InputEvent, Modifiers};
pub use layout::{LayoutRequest, LayoutResult};
pub use shortcuts::{ShortcutAction, ShortcutMap};
pub use tools::{CanvasCommand, Mode, Tool};
