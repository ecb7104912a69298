//! Immediate-mode debug renderer
//!
//! Geometry is submitted between [`DebugRenderer::begin`] and
//! [`DebugRenderer::finish`]. `begin` picks one of three preallocated meshes
//! by topology, `draw` appends world-space geometry to a CPU batch, and
//! `finish` uploads the batch and draws it once through the debug shader with
//! the renderer-wide state (colour, sizes, depth/blend/lighting toggles).
//!
//! ```text
//! Idle --begin(mode)--> Drawing(mode) --draw()*--> Drawing(mode) --finish()--> Idle
//! ```
//!
//! Calls outside that bracket are rejected with [`RenderError::InvalidState`].

use bitflags::bitflags;

use crate::config::DebugRendererConfig;
use crate::foundation::math::{Mat4, Mat4Ext, Vec4};
use crate::render::{
    BlendFactor, Capability, GlMesh, MeshBuffers, PrimitiveTopology, RenderError, RenderResult,
    ShaderProgram, SharedContext, UniformValue, Vertex,
};

/// Uniform receiving the debug colour
pub const COLOUR_UNIFORM: &str = "u_colour";
/// Uniform toggling lighting in the debug shader
pub const LIGHTING_UNIFORM: &str = "u_lighting_enabled";
/// Uniform receiving the point size
pub const POINT_SIZE_UNIFORM: &str = "u_point_size";
/// Uniform receiving the model matrix; always identity since vertices are pre-transformed
pub const MODEL_UNIFORM: &str = "u_model";

/// Topology of a debug batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DebugMode {
    /// Each vertex is a point
    Points,
    /// Each index pair is a line segment
    Lines,
    /// Each index triple is a triangle
    Triangles,
}

impl DebugMode {
    /// Primitive topology of the mesh backing this mode
    pub const fn topology(self) -> PrimitiveTopology {
        match self {
            Self::Points => PrimitiveTopology::Points,
            Self::Lines => PrimitiveTopology::Lines,
            Self::Triangles => PrimitiveTopology::Triangles,
        }
    }
}

bitflags! {
    /// Render-state toggles applied when a batch is drawn
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DebugRenderFlags: u8 {
        /// Depth test against the scene
        const DEPTH = 1 << 0;
        /// Shade with scene lighting
        const LIGHTING = 1 << 1;
        /// Alpha blending
        const BLEND = 1 << 2;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RendererState {
    Idle,
    Drawing(DebugMode),
}

/// Batches debug geometry into point, line and triangle meshes
pub struct DebugRenderer {
    ctx: SharedContext,
    shader: ShaderProgram,
    point_mesh: GlMesh,
    line_mesh: GlMesh,
    triangle_mesh: GlMesh,

    colour: Vec4,
    line_size: f32,
    point_size: f32,
    flags: DebugRenderFlags,
    blend_src: BlendFactor,
    blend_dst: BlendFactor,

    state: RendererState,
    batch: MeshBuffers<Vertex>,
}

impl DebugRenderer {
    /// Create the three debug meshes and apply the initial state from `config`
    pub fn new(ctx: SharedContext, shader: ShaderProgram, config: &DebugRendererConfig) -> RenderResult<Self> {
        let vertex_bytes = capacity_bytes(config.initial_vertex_capacity, std::mem::size_of::<Vertex>())?;
        let index_bytes = capacity_bytes(config.initial_index_capacity, std::mem::size_of::<u32>())?;

        let mut batch = MeshBuffers::default();
        batch
            .vertices
            .try_reserve(config.initial_vertex_capacity)
            .map_err(|e| RenderError::ResourceCreationFailed(format!("debug vertex batch: {e}")))?;
        batch
            .indices
            .try_reserve(config.initial_index_capacity)
            .map_err(|e| RenderError::ResourceCreationFailed(format!("debug index batch: {e}")))?;

        let create = |mode: DebugMode| -> RenderResult<GlMesh> {
            let mut mesh = GlMesh::new(ctx.clone(), Vertex::layout(), None)?;
            mesh.reserve_buffers(vertex_bytes, index_bytes);
            mesh.set_primitive(mode.topology());
            Ok(mesh)
        };

        let point_mesh = create(DebugMode::Points)?;
        let line_mesh = create(DebugMode::Lines)?;
        let triangle_mesh = create(DebugMode::Triangles)?;

        let mut flags = DebugRenderFlags::empty();
        flags.set(DebugRenderFlags::DEPTH, config.depth_enabled);
        flags.set(DebugRenderFlags::LIGHTING, config.lighting_enabled);
        flags.set(DebugRenderFlags::BLEND, config.blend_enabled);

        log::debug!("Debug renderer ready with program {:?}", shader.handle());

        Ok(Self {
            ctx,
            shader,
            point_mesh,
            line_mesh,
            triangle_mesh,
            colour: Vec4::from(config.colour),
            line_size: config.line_size.max(1.0),
            point_size: config.point_size.max(1.0),
            flags,
            blend_src: config.blend_src,
            blend_dst: config.blend_dst,
            state: RendererState::Idle,
            batch,
        })
    }

    /// Set the colour of subsequently finished batches
    pub fn set_colour(&mut self, colour: Vec4) {
        self.colour = colour;
    }

    /// Set line width in pixels (minimum 1)
    pub fn set_line_size(&mut self, size: f32) {
        self.line_size = size.max(1.0);
    }

    /// Set point diameter in pixels (minimum 1)
    pub fn set_point_size(&mut self, size: f32) {
        self.point_size = size.max(1.0);
    }

    /// Toggle depth testing
    pub fn set_depth_enabled(&mut self, enabled: bool) {
        self.flags.set(DebugRenderFlags::DEPTH, enabled);
    }

    /// Toggle lighting
    pub fn set_lighting_enabled(&mut self, enabled: bool) {
        self.flags.set(DebugRenderFlags::LIGHTING, enabled);
    }

    /// Toggle alpha blending
    pub fn set_blend_enabled(&mut self, enabled: bool) {
        self.flags.set(DebugRenderFlags::BLEND, enabled);
    }

    /// Set the blend function used while blending is enabled
    pub fn set_blend(&mut self, src: BlendFactor, dst: BlendFactor) {
        self.blend_src = src;
        self.blend_dst = dst;
    }

    /// Start a batch of `mode` geometry
    pub fn begin(&mut self, mode: DebugMode) -> RenderResult<()> {
        if let RendererState::Drawing(current) = self.state {
            return Err(RenderError::InvalidState(format!(
                "begin({mode:?}) while a {current:?} batch is open"
            )));
        }
        self.state = RendererState::Drawing(mode);
        Ok(())
    }

    /// Append geometry to the open batch
    ///
    /// Positions are transformed by `model`, normals by its inverse-transpose.
    /// `indices` refer to `vertices`; an empty slice means draw them in order.
    pub fn draw(&mut self, vertices: &[Vertex], indices: &[u32], model: &Mat4) -> RenderResult<()> {
        if self.state == RendererState::Idle {
            return Err(RenderError::InvalidState("draw() outside begin()/finish()".to_string()));
        }

        let vertex_count = vertices.len() as u32;
        if let Some(&index) = indices.iter().find(|&&i| i >= vertex_count) {
            return Err(RenderError::InvalidIndex { index, vertex_count });
        }

        let base = self.batch.vertices.len() as u32;
        let identity = *model == Mat4::identity();
        self.batch.vertices.extend(vertices.iter().map(|v| {
            if identity {
                *v
            } else {
                Vertex::new(
                    model.transform_position(v.position),
                    model.transform_normal(v.normal),
                    v.tex_coord,
                )
            }
        }));

        if indices.is_empty() {
            self.batch.indices.extend(base..base + vertex_count);
        } else {
            self.batch.indices.extend(indices.iter().map(|i| base + i));
        }
        Ok(())
    }

    /// Close the batch, uploading and drawing it if it holds any geometry
    pub fn finish(&mut self) -> RenderResult<()> {
        let RendererState::Drawing(mode) = self.state else {
            return Err(RenderError::InvalidState("finish() without begin()".to_string()));
        };
        self.state = RendererState::Idle;

        if self.batch.is_empty() {
            log::warn!("Skipping empty {mode:?} debug batch");
            return Ok(());
        }

        let mesh = match mode {
            DebugMode::Points => &mut self.point_mesh,
            DebugMode::Lines => &mut self.line_mesh,
            DebugMode::Triangles => &mut self.triangle_mesh,
        };
        mesh.upload_mesh_data(&self.batch);

        log::debug!(
            "Flushing {:?} debug batch: {} vertices, {} indices",
            mode,
            self.batch.vertices.len(),
            self.batch.indices.len()
        );

        self.submit(self.mesh(mode));
        self.batch.clear();
        Ok(())
    }

    /// Draw an arbitrary mesh with the debug shader and current state
    pub fn render_mesh(&self, mesh: &GlMesh) -> RenderResult<()> {
        if let RendererState::Drawing(mode) = self.state {
            return Err(RenderError::InvalidState(format!(
                "render_mesh() while a {mode:?} batch is open"
            )));
        }
        self.submit(mesh);
        Ok(())
    }

    fn submit(&self, mesh: &GlMesh) {
        let ctx = self.ctx.as_ref();
        ctx.set_capability(Capability::DepthTest, self.flags.contains(DebugRenderFlags::DEPTH));
        ctx.set_capability(Capability::Blend, self.flags.contains(DebugRenderFlags::BLEND));
        if self.flags.contains(DebugRenderFlags::BLEND) {
            ctx.blend_func(self.blend_src, self.blend_dst);
        }
        ctx.set_capability(Capability::ProgramPointSize, true);
        ctx.line_width(self.line_size);

        self.shader.bind();
        self.shader.set_uniform(COLOUR_UNIFORM, UniformValue::Vec4(self.colour.into()));
        self.shader.set_uniform(
            LIGHTING_UNIFORM,
            UniformValue::Bool(self.flags.contains(DebugRenderFlags::LIGHTING)),
        );
        self.shader.set_uniform(POINT_SIZE_UNIFORM, UniformValue::Float(self.point_size));
        self.shader.set_uniform(MODEL_UNIFORM, UniformValue::Mat4(Mat4::identity().into()));

        mesh.draw_all();

        self.shader.unbind();
    }

    /// Mesh backing `mode`
    pub fn mesh(&self, mode: DebugMode) -> &GlMesh {
        match mode {
            DebugMode::Points => &self.point_mesh,
            DebugMode::Lines => &self.line_mesh,
            DebugMode::Triangles => &self.triangle_mesh,
        }
    }

    /// Whether a batch is open
    pub fn is_drawing(&self) -> bool {
        matches!(self.state, RendererState::Drawing(_))
    }

    /// Mode of the open batch
    pub fn current_mode(&self) -> Option<DebugMode> {
        match self.state {
            RendererState::Drawing(mode) => Some(mode),
            RendererState::Idle => None,
        }
    }

    /// Debug colour
    pub fn colour(&self) -> Vec4 {
        self.colour
    }

    /// Line width
    pub fn line_size(&self) -> f32 {
        self.line_size
    }

    /// Point diameter
    pub fn point_size(&self) -> f32 {
        self.point_size
    }

    /// Current render-state toggles
    pub fn flags(&self) -> DebugRenderFlags {
        self.flags
    }

    /// Blend function
    pub fn blend(&self) -> (BlendFactor, BlendFactor) {
        (self.blend_src, self.blend_dst)
    }

    /// Shader used for every debug draw
    pub fn debug_shader(&self) -> &ShaderProgram {
        &self.shader
    }
}

/// Byte size of `count` elements, bounded by what a GL size can express
fn capacity_bytes(count: usize, element_size: usize) -> RenderResult<usize> {
    count
        .checked_mul(element_size)
        .filter(|&bytes| isize::try_from(bytes).is_ok())
        .ok_or_else(|| {
            RenderError::ResourceCreationFailed(format!(
                "capacity of {count} elements of {element_size} bytes is too large"
            ))
        })
}
