//! Backend implementations for the render module
//!
//! `RecordingContext` is always available and needs no GPU. The OpenGL
//! backend is behind the `glow` feature.

/// Headless backend that records calls
pub mod recording;

/// OpenGL backend over glow
#[cfg(all(feature = "glow", not(target_arch = "wasm32")))]
pub mod opengl;

pub use recording::{GlCall, RecordingContext};

#[cfg(all(feature = "glow", not(target_arch = "wasm32")))]
pub use opengl::GlowContext;
