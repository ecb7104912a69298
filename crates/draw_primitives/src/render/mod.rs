//! # Rendering primitives
//!
//! Mesh and instance buffer management over an explicit [`GraphicsContext`].
//!
//! ## Architecture
//!
//! - **Context**: the native API boundary, passed explicitly as a [`SharedContext`]
//! - **Buffers**: RAII ownership of buffer and vertex array handles
//! - **Layouts**: validated per-vertex and per-instance attribute descriptions
//! - **GlMesh**: vertex/index storage with amortised growth and draw dispatch
//! - **InstanceBuffer**: fixed-capacity per-instance attribute storage
//! - **Backends**: a recording context for tests and tooling, and glow for real GL
//!
//! Everything here is single-threaded: handles hold an `Rc` to the context
//! and therefore never leave the thread that created them.

pub mod backends;
pub mod buffer;
pub mod context;
pub mod draw_call;
pub mod gl_mesh;
pub mod instance_buffer;
pub mod layout;
pub mod mesh;
pub mod shader;

pub use buffer::{GpuBuffer, VertexArray};
pub use context::{
    BlendFactor, BufferHandle, BufferTarget, BufferUsage, Capability, GraphicsContext, IndexType,
    PrimitiveTopology, ProgramHandle, SharedContext, UniformValue, VertexArrayHandle,
};
pub use draw_call::{DrawCall, DrawKind};
pub use gl_mesh::GlMesh;
pub use instance_buffer::InstanceBuffer;
pub use layout::{AttributeType, InstanceAttribute, VertexAttribute, VertexLayout};
pub use mesh::{MeshBuffers, MeshData, Vertex};
pub use shader::ShaderProgram;

use thiserror::Error;

/// Rendering error types
///
/// Draw ranges are clamped rather than reported; these cover the cases where
/// continuing would corrupt GPU state or hide a caller bug.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The backend could not create a GPU object
    #[error("Resource creation failed: {0}")]
    ResourceCreationFailed(String),

    /// Attribute layout violates size, stride or overlap rules
    #[error("Invalid vertex layout: {0}")]
    InvalidLayout(String),

    /// Write past the end of a fixed-capacity buffer
    #[error("Write of {size} bytes at offset {offset} exceeds buffer capacity {capacity}")]
    BufferOverflow {
        /// Byte offset of the write
        offset: usize,
        /// Bytes written
        size: usize,
        /// Allocated bytes
        capacity: usize,
    },

    /// Call made in the wrong renderer state
    #[error("Invalid renderer state: {0}")]
    InvalidState(String),

    /// Index refers to a vertex outside the submitted batch
    #[error("Index {index} out of range for {vertex_count} vertices")]
    InvalidIndex {
        /// Offending index
        index: u32,
        /// Vertices in the batch
        vertex_count: u32,
    },

    /// Backend-specific error occurred
    #[error("Backend error: {0}")]
    BackendError(String),
}

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;
