//! Debug visualisation
//!
//! [`DebugRenderer`] is the immediate-mode batcher; [`DebugDrawQueue`] keeps
//! timed and persistent shapes and feeds them to it once per frame.

pub mod draw;
pub mod renderer;

pub use draw::{DebugDrawQueue, DebugShape, DebugShapeKey};
pub use renderer::{DebugMode, DebugRenderFlags, DebugRenderer};
