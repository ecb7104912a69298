//! # Draw Primitives
//!
//! Thin, explicit wrappers over an OpenGL-style API: meshes with amortised
//! buffer growth, fixed-capacity instance buffers, and an immediate-mode
//! debug renderer.
//!
//! ## Features
//!
//! - **GlMesh**: vertex/index storage that grows without shrinking and clamps
//!   draw ranges to the uploaded data
//! - **InstanceBuffer**: per-instance attributes with bounds-checked writes
//! - **DebugRenderer**: `begin`/`draw`/`finish` batching of points, lines and triangles
//! - **DebugDrawQueue**: timed and persistent debug shapes
//! - **Backends**: `glow` for real GL, and a recording context that needs no GPU
//!
//! ## Quick Start
//!
//! ```rust
//! use std::rc::Rc;
//! use draw_primitives::prelude::*;
//!
//! fn main() -> Result<(), RenderError> {
//!     let ctx: SharedContext = Rc::new(RecordingContext::new());
//!     let cube = MeshBuffers::<Vertex>::cube();
//!
//!     let mesh = GlMesh::new(ctx.clone(), Vertex::layout(), Some(&cube))?;
//!     mesh.draw(1, 0, 0, None);
//!
//!     let shader = ShaderProgram::new(ctx.clone(), ProgramHandle(1));
//!     let mut debug = DebugRenderer::new(ctx, shader, &DebugRendererConfig::default())?;
//!     debug.begin(DebugMode::Lines)?;
//!     debug.draw(&[Vertex::at([0.0, 0.0, 0.0]), Vertex::at([1.0, 0.0, 0.0])], &[], &Mat4::identity())?;
//!     debug.finish()?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod debug;
pub mod foundation;
pub mod render;

/// Common imports for library users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError, DebugRendererConfig},
        debug::{DebugDrawQueue, DebugMode, DebugRenderer, DebugShape, DebugShapeKey},
        foundation::math::{Mat4, Mat4Ext, Vec3, Vec4},
        render::{
            backends::RecordingContext, AttributeType, BlendFactor, GlMesh, GraphicsContext,
            InstanceAttribute, InstanceBuffer, MeshBuffers, MeshData, PrimitiveTopology,
            ProgramHandle, RenderError, RenderResult, ShaderProgram, SharedContext, Vertex,
            VertexAttribute, VertexLayout,
        },
    };

    #[cfg(all(feature = "glow", not(target_arch = "wasm32")))]
    pub use crate::render::backends::GlowContext;
}
