//! Graphics context abstraction
//!
//! Every GPU call made by this crate goes through a [`GraphicsContext`]. The
//! context is passed around explicitly as a [`SharedContext`] instead of living
//! in global state, which keeps the bind/unbind sequencing visible and lets the
//! same mesh code run against a real OpenGL context or the headless
//! [`RecordingContext`](crate::render::backends::RecordingContext).
//!
//! The trait mirrors the small slice of the OpenGL 3.3 API that meshes,
//! instance buffers and the debug renderer need. Methods take `&self`; backends
//! use interior mutability where they have to.

use std::rc::Rc;

use crate::render::layout::AttributeType;
use crate::render::RenderResult;

/// Handle to a GPU buffer object (VBO/EBO)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferHandle(pub u32);

/// Handle to a vertex array object (VAO)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexArrayHandle(pub u32);

/// Handle to a linked shader program
///
/// Programs are compiled and owned outside this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramHandle(pub u32);

/// Buffer binding point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    /// Vertex and instance attribute data
    Array,
    /// Index data
    ElementArray,
}

impl BufferTarget {
    /// OpenGL enum value
    pub const fn gl_enum(self) -> u32 {
        match self {
            Self::Array => 0x8892,
            Self::ElementArray => 0x8893,
        }
    }
}

/// Expected update frequency of a buffer's storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BufferUsage {
    /// Written once, drawn many times
    Static,
    /// Rewritten often, drawn many times
    #[default]
    Dynamic,
    /// Rewritten every draw
    Stream,
}

impl BufferUsage {
    /// OpenGL enum value
    pub const fn gl_enum(self) -> u32 {
        match self {
            Self::Static => 0x88E4,
            Self::Dynamic => 0x88E8,
            Self::Stream => 0x88E0,
        }
    }
}

/// How vertices assemble into primitives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveTopology {
    /// One point per vertex
    Points,
    /// Independent line segments
    Lines,
    /// Connected segments closed back to the first vertex
    LineLoop,
    /// Connected segments
    LineStrip,
    /// Independent triangles
    #[default]
    Triangles,
    /// Triangles sharing an edge with the previous one
    TriangleStrip,
    /// Triangles sharing the first vertex
    TriangleFan,
}

impl PrimitiveTopology {
    /// OpenGL enum value
    pub const fn gl_enum(self) -> u32 {
        match self {
            Self::Points => 0x0000,
            Self::Lines => 0x0001,
            Self::LineLoop => 0x0002,
            Self::LineStrip => 0x0003,
            Self::Triangles => 0x0004,
            Self::TriangleStrip => 0x0005,
            Self::TriangleFan => 0x0006,
        }
    }
}

/// Element type stored in an index buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexType {
    /// 8-bit indices
    UnsignedByte,
    /// 16-bit indices
    UnsignedShort,
    /// 32-bit indices
    UnsignedInt,
}

impl IndexType {
    /// OpenGL enum value
    pub const fn gl_enum(self) -> u32 {
        match self {
            Self::UnsignedByte => 0x1401,
            Self::UnsignedShort => 0x1403,
            Self::UnsignedInt => 0x1405,
        }
    }

    /// Size of one index in bytes
    pub const fn size_bytes(self) -> usize {
        match self {
            Self::UnsignedByte => 1,
            Self::UnsignedShort => 2,
            Self::UnsignedInt => 4,
        }
    }
}

/// Server-side capabilities toggled with glEnable/glDisable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Depth testing
    DepthTest,
    /// Colour blending
    Blend,
    /// Vertex shader controls point size
    ProgramPointSize,
}

impl Capability {
    /// OpenGL enum value
    pub const fn gl_enum(self) -> u32 {
        match self {
            Self::DepthTest => 0x0B71,
            Self::Blend => 0x0BE2,
            Self::ProgramPointSize => 0x8642,
        }
    }
}

/// Blend factor for source or destination colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum BlendFactor {
    /// (0, 0, 0, 0)
    Zero,
    /// (1, 1, 1, 1)
    One,
    /// Source colour
    SrcColor,
    /// One minus source colour
    OneMinusSrcColor,
    /// Source alpha
    SrcAlpha,
    /// One minus source alpha
    OneMinusSrcAlpha,
    /// Destination alpha
    DstAlpha,
    /// One minus destination alpha
    OneMinusDstAlpha,
    /// Destination colour
    DstColor,
    /// One minus destination colour
    OneMinusDstColor,
}

impl BlendFactor {
    /// OpenGL enum value
    pub const fn gl_enum(self) -> u32 {
        match self {
            Self::Zero => 0,
            Self::One => 1,
            Self::SrcColor => 0x0300,
            Self::OneMinusSrcColor => 0x0301,
            Self::SrcAlpha => 0x0302,
            Self::OneMinusSrcAlpha => 0x0303,
            Self::DstAlpha => 0x0304,
            Self::OneMinusDstAlpha => 0x0305,
            Self::DstColor => 0x0306,
            Self::OneMinusDstColor => 0x0307,
        }
    }
}

/// Value written to a named shader uniform
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    /// Boolean, uploaded as an integer
    Bool(bool),
    /// Scalar float
    Float(f32),
    /// Four-component float vector
    Vec4([f32; 4]),
    /// Column-major 4x4 matrix
    Mat4([[f32; 4]; 4]),
}

/// The native graphics API boundary
///
/// Implementations forward to a real driver or record the calls. All calls are
/// made from the thread that owns the context.
pub trait GraphicsContext {
    /// Generate a buffer object
    fn create_buffer(&self) -> RenderResult<BufferHandle>;

    /// Delete a buffer object
    fn delete_buffer(&self, buffer: BufferHandle);

    /// Generate a vertex array object
    fn create_vertex_array(&self) -> RenderResult<VertexArrayHandle>;

    /// Delete a vertex array object
    fn delete_vertex_array(&self, vertex_array: VertexArrayHandle);

    /// Bind a vertex array, or unbind with `None`
    fn bind_vertex_array(&self, vertex_array: Option<VertexArrayHandle>);

    /// Bind a buffer to `target`, or unbind with `None`
    fn bind_buffer(&self, target: BufferTarget, buffer: Option<BufferHandle>);

    /// (Re)allocate uninitialised storage for the buffer bound to `target`
    fn allocate_buffer(&self, target: BufferTarget, size: usize, usage: BufferUsage);

    /// Write `data` into the buffer bound to `target` starting at `offset` bytes
    fn write_buffer(&self, target: BufferTarget, offset: usize, data: &[u8]);

    /// Describe a floating-point attribute sourced from the bound array buffer
    fn vertex_attrib_pointer(
        &self,
        index: u32,
        size: u32,
        attribute_type: AttributeType,
        normalized: bool,
        stride: u32,
        offset: u32,
    );

    /// Describe an integer attribute sourced from the bound array buffer
    fn vertex_attrib_i_pointer(
        &self,
        index: u32,
        size: u32,
        attribute_type: AttributeType,
        stride: u32,
        offset: u32,
    );

    /// Set the instancing divisor of an attribute
    fn vertex_attrib_divisor(&self, index: u32, divisor: u32);

    /// Enable an attribute array
    fn enable_vertex_attrib_array(&self, index: u32);

    /// Disable an attribute array
    fn disable_vertex_attrib_array(&self, index: u32);

    /// Draw `count` vertices starting at `first`
    fn draw_arrays(&self, primitive: PrimitiveTopology, first: u32, count: u32);

    /// Draw `count` vertices starting at `first`, `instances` times
    fn draw_arrays_instanced(&self, primitive: PrimitiveTopology, first: u32, count: u32, instances: u32);

    /// Draw `count` indices starting `byte_offset` bytes into the bound index buffer
    fn draw_elements(&self, primitive: PrimitiveTopology, count: u32, index_type: IndexType, byte_offset: usize);

    /// Indexed draw repeated `instances` times
    fn draw_elements_instanced(
        &self,
        primitive: PrimitiveTopology,
        count: u32,
        index_type: IndexType,
        byte_offset: usize,
        instances: u32,
    );

    /// Enable or disable a server-side capability
    fn set_capability(&self, capability: Capability, enabled: bool);

    /// Set the blend function
    fn blend_func(&self, src: BlendFactor, dst: BlendFactor);

    /// Set the rasterised line width
    fn line_width(&self, width: f32);

    /// Make a program current, or clear it with `None`
    fn use_program(&self, program: Option<ProgramHandle>);

    /// Write a named uniform of the currently bound program
    ///
    /// Unknown names are ignored, matching GL's behaviour for location -1.
    fn set_uniform(&self, program: ProgramHandle, name: &str, value: UniformValue);
}

/// Explicit, reference-counted handle to the graphics context
///
/// `Rc` keeps every GPU object `!Send`, so they stay on the context's thread.
pub type SharedContext = Rc<dyn GraphicsContext>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_topologies_match_gl_constants() {
        assert_eq!(PrimitiveTopology::Points.gl_enum(), 0x0000);
        assert_eq!(PrimitiveTopology::Lines.gl_enum(), 0x0001);
        assert_eq!(PrimitiveTopology::Triangles.gl_enum(), 0x0004);
    }

    #[test]
    fn test_index_type_sizes() {
        assert_eq!(IndexType::UnsignedByte.size_bytes(), 1);
        assert_eq!(IndexType::UnsignedShort.size_bytes(), 2);
        assert_eq!(IndexType::UnsignedInt.size_bytes(), 4);
    }
}
