//! GPU-resident mesh
//!
//! `GlMesh` owns a vertex array, a vertex buffer and an index buffer. Uploads
//! replace the contents in place and only reallocate storage when the new data
//! no longer fits; capacity grows and never shrinks, so a mesh that is refilled
//! every frame settles on its peak size and stops reallocating.
//!
//! Draws go through [`DrawCall::resolve`], which owns the edge-case policy:
//! zero instances or zero vertices draw nothing, and offset/count ranges are
//! clamped to the data actually uploaded.

use crate::render::buffer::{GpuBuffer, VertexArray};
use crate::render::context::{
    BufferHandle, BufferTarget, BufferUsage, PrimitiveTopology, SharedContext, VertexArrayHandle,
};
use crate::render::draw_call::DrawCall;
use crate::render::instance_buffer::InstanceBuffer;
use crate::render::layout::VertexLayout;
use crate::render::mesh::MeshData;
use crate::render::RenderResult;

/// Smallest storage allocated for either buffer
const MIN_BUFFER_BYTES: usize = 1;

/// Vertex/index buffers plus the vertex array describing them
pub struct GlMesh {
    ctx: SharedContext,
    vertex_array: VertexArray,
    vertex_buffer: GpuBuffer,
    index_buffer: GpuBuffer,
    layout: VertexLayout,
    vertex_count: u32,
    index_count: u32,
    allocated_vertex_bytes: usize,
    allocated_index_bytes: usize,
    primitive: PrimitiveTopology,
    reallocations: u32,
}

impl GlMesh {
    /// Create the GPU objects and optionally upload initial data
    ///
    /// With `mesh_data` the buffers are reserved at exactly its size; without
    /// it they start at the minimum and grow on the first upload.
    pub fn new(ctx: SharedContext, layout: VertexLayout, mesh_data: Option<&dyn MeshData>) -> RenderResult<Self> {
        let vertex_array = VertexArray::new(ctx.clone())?;
        vertex_array.bind();

        let vertex_buffer = GpuBuffer::new(ctx.clone(), BufferTarget::Array)?;
        let index_buffer = GpuBuffer::new(ctx.clone(), BufferTarget::ElementArray)?;

        vertex_buffer.bind();
        layout.bind(ctx.as_ref());
        vertex_buffer.unbind();

        let mut mesh = Self {
            ctx,
            vertex_array,
            vertex_buffer,
            index_buffer,
            layout,
            vertex_count: 0,
            index_count: 0,
            allocated_vertex_bytes: 0,
            allocated_index_bytes: 0,
            primitive: PrimitiveTopology::Triangles,
            reallocations: 0,
        };

        match mesh_data {
            Some(data) => {
                mesh.reserve_buffers(data.vertex_buffer_size(), data.index_buffer_size());
                mesh.upload_mesh_data(data);
            }
            None => mesh.reserve_buffers(MIN_BUFFER_BYTES, MIN_BUFFER_BYTES),
        }

        mesh.vertex_array.unbind();

        log::debug!(
            "Created mesh {:?} ({} vertices, {} indices)",
            mesh.vertex_array.handle(),
            mesh.vertex_count,
            mesh.index_count
        );

        Ok(mesh)
    }

    /// Replace the mesh contents, growing storage if the data no longer fits
    pub fn upload_mesh_data(&mut self, data: &dyn MeshData) {
        let vertex_bytes = data.vertex_buffer_size();
        let index_bytes = data.index_buffer_size();

        if vertex_bytes > self.allocated_vertex_bytes || index_bytes > self.allocated_index_bytes {
            self.reserve_buffers(
                vertex_bytes.max(self.allocated_vertex_bytes),
                index_bytes.max(self.allocated_index_bytes),
            );
        }

        self.vertex_count = data.vertex_count();
        self.index_count = data.index_count();

        // The element binding is VAO state, so write it with our VAO bound
        self.vertex_array.bind();

        if !data.vertex_bytes().is_empty() {
            self.vertex_buffer.bind();
            self.vertex_buffer.write(0, data.vertex_bytes());
            self.vertex_buffer.unbind();
        }

        if !data.index_bytes().is_empty() {
            self.index_buffer.bind();
            self.index_buffer.write(0, data.index_bytes());
        }

        self.vertex_array.unbind();
    }

    /// Reallocate both buffers with exactly the given sizes (at least one byte each)
    ///
    /// Previous contents are discarded, so the mesh is empty afterwards and
    /// draws nothing until the next [`upload_mesh_data`](Self::upload_mesh_data).
    pub fn reserve_buffers(&mut self, vertex_bytes: usize, index_bytes: usize) {
        let vertex_bytes = vertex_bytes.max(MIN_BUFFER_BYTES);
        let index_bytes = index_bytes.max(MIN_BUFFER_BYTES);

        self.vertex_count = 0;
        self.index_count = 0;

        log::info!("Reserving {vertex_bytes} vertex bytes and {index_bytes} index bytes");
        self.allocated_vertex_bytes = vertex_bytes;
        self.allocated_index_bytes = index_bytes;
        self.reallocations += 1;

        self.vertex_array.bind();

        self.vertex_buffer.bind();
        self.vertex_buffer.allocate(vertex_bytes, BufferUsage::Dynamic);
        self.vertex_buffer.unbind();

        self.index_buffer.bind();
        self.index_buffer.allocate(index_bytes, BufferUsage::Dynamic);

        self.vertex_array.unbind();
    }

    /// Draw `instances` copies of the range `offset..offset + count`
    ///
    /// `count == 0` draws to the end. Ranges are clamped to the uploaded data;
    /// an empty result issues no draw call. When given, `instance_buffer`
    /// supplies the per-instance attributes for the duration of the draw.
    pub fn draw(&self, instances: u32, offset: u32, count: u32, instance_buffer: Option<&InstanceBuffer>) {
        self.vertex_array.bind();
        self.layout.set_enabled(self.ctx.as_ref(), true);

        if let Some(call) = DrawCall::resolve(
            self.primitive,
            instances,
            offset,
            count,
            self.vertex_count,
            self.index_count,
        ) {
            if let Some(instances) = instance_buffer {
                instances.bind();
            }

            if self.index_count > 0 {
                self.index_buffer.bind();
            }
            call.issue(self.ctx.as_ref());

            if let Some(instances) = instance_buffer {
                instances.unbind();
            }
        }

        self.layout.set_enabled(self.ctx.as_ref(), false);
        self.vertex_array.unbind();
    }

    /// Draw everything once
    pub fn draw_all(&self) {
        self.draw(1, 0, 0, None);
    }

    /// Set primitive assembly used by subsequent draws
    pub fn set_primitive(&mut self, primitive: PrimitiveTopology) {
        self.primitive = primitive;
    }

    /// Primitive assembly used by draws
    pub fn primitive(&self) -> PrimitiveTopology {
        self.primitive
    }

    /// Vertex array handle
    pub fn vertex_array(&self) -> VertexArrayHandle {
        self.vertex_array.handle()
    }

    /// Vertex buffer handle
    pub fn vertex_buffer(&self) -> BufferHandle {
        self.vertex_buffer.handle()
    }

    /// Index buffer handle
    pub fn index_buffer(&self) -> BufferHandle {
        self.index_buffer.handle()
    }

    /// Vertices from the last upload
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Indices from the last upload
    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Current vertex buffer capacity in bytes
    pub fn allocated_vertex_bytes(&self) -> usize {
        self.allocated_vertex_bytes
    }

    /// Current index buffer capacity in bytes
    pub fn allocated_index_bytes(&self) -> usize {
        self.allocated_index_bytes
    }

    /// Number of times storage has been (re)allocated, including creation
    pub fn reallocations(&self) -> u32 {
        self.reallocations
    }

    /// Vertex attribute layout
    pub fn layout(&self) -> &VertexLayout {
        &self.layout
    }
}

impl std::fmt::Debug for GlMesh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlMesh")
            .field("vertex_array", &self.vertex_array)
            .field("vertex_count", &self.vertex_count)
            .field("index_count", &self.index_count)
            .field("allocated_vertex_bytes", &self.allocated_vertex_bytes)
            .field("allocated_index_bytes", &self.allocated_index_bytes)
            .field("primitive", &self.primitive)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backends::{GlCall, RecordingContext};
    use crate::render::context::IndexType;
    use crate::render::layout::{AttributeType, InstanceAttribute};
    use crate::render::mesh::{MeshBuffers, Vertex};
    use std::rc::Rc;

    fn recorder() -> (Rc<RecordingContext>, SharedContext) {
        let recorder = Rc::new(RecordingContext::new());
        let ctx: SharedContext = recorder.clone();
        (recorder, ctx)
    }

    fn points(n: usize) -> MeshBuffers {
        MeshBuffers::new(vec![Vertex::at([0.0, 0.0, 0.0]); n], Vec::new())
    }

    #[test]
    fn test_empty_mesh_reserves_minimum() {
        let (_, ctx) = recorder();
        let mesh = GlMesh::new(ctx, Vertex::layout(), None).unwrap();

        assert_eq!(mesh.vertex_count(), 0);
        assert_eq!(mesh.allocated_vertex_bytes(), 1);
        assert_eq!(mesh.allocated_index_bytes(), 1);
        assert_eq!(mesh.primitive(), PrimitiveTopology::Triangles);
    }

    #[test]
    fn test_initial_data_reserved_exactly() {
        let (recorder, ctx) = recorder();
        let cube = MeshBuffers::<Vertex>::cube();
        let mesh = GlMesh::new(ctx, Vertex::layout(), Some(&cube)).unwrap();

        assert_eq!(mesh.allocated_vertex_bytes(), 256);
        assert_eq!(mesh.allocated_index_bytes(), 144);
        assert_eq!(mesh.reallocations(), 1);
        assert_eq!(recorder.buffer_size(mesh.vertex_buffer()), Some(256));
        assert_eq!(recorder.buffer_size(mesh.index_buffer()), Some(144));
    }

    #[test]
    fn test_growth_reallocates_once_then_reuses() {
        let (recorder, ctx) = recorder();
        let mut mesh = GlMesh::new(ctx, Vertex::layout(), None).unwrap();
        recorder.take_calls();

        mesh.upload_mesh_data(&points(10));
        assert_eq!(recorder.allocation_count(), 2);
        assert_eq!(mesh.allocated_vertex_bytes(), 320);
        assert_eq!(mesh.reallocations(), 2);
        recorder.take_calls();

        mesh.upload_mesh_data(&points(10));
        mesh.upload_mesh_data(&points(4));
        assert_eq!(recorder.allocation_count(), 0);
        assert_eq!(mesh.allocated_vertex_bytes(), 320);
        assert_eq!(mesh.vertex_count(), 4);
    }

    #[test]
    fn test_capacity_never_shrinks() {
        let (_, ctx) = recorder();
        let cube = MeshBuffers::<Vertex>::cube();
        let mut mesh = GlMesh::new(ctx, Vertex::layout(), Some(&cube)).unwrap();

        // Vertex data grows while index data shrinks to nothing
        mesh.upload_mesh_data(&points(20));
        assert_eq!(mesh.allocated_vertex_bytes(), 640);
        assert_eq!(mesh.allocated_index_bytes(), 144);
        assert!(mesh.allocated_vertex_bytes() >= mesh.vertex_count() as usize * 32);
    }

    #[test]
    fn test_reserve_discards_uploaded_data() {
        let (recorder, ctx) = recorder();
        let cube = MeshBuffers::<Vertex>::cube();
        let mut mesh = GlMesh::new(ctx, Vertex::layout(), Some(&cube)).unwrap();

        mesh.reserve_buffers(1, 1);
        assert_eq!(mesh.vertex_count(), 0);
        assert_eq!(mesh.index_count(), 0);
        assert!(mesh.allocated_vertex_bytes() >= mesh.vertex_count() as usize * 32);
        assert!(mesh.allocated_index_bytes() >= mesh.index_count() as usize * 4);

        recorder.take_calls();
        mesh.draw_all();
        assert!(recorder.draw_calls().is_empty());

        // A fresh upload grows back and draws everything
        mesh.upload_mesh_data(&cube);
        assert_eq!(mesh.index_count(), 36);
        assert_eq!(mesh.allocated_index_bytes(), 144);
        mesh.draw_all();
        assert_eq!(recorder.draw_calls().len(), 1);
    }

    #[test]
    fn test_upload_writes_both_buffers() {
        let (recorder, ctx) = recorder();
        let mut mesh = GlMesh::new(ctx, Vertex::layout(), None).unwrap();
        recorder.take_calls();

        let cube = MeshBuffers::<Vertex>::cube();
        mesh.upload_mesh_data(&cube);

        let writes: Vec<_> = recorder
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                GlCall::WriteBuffer { target, offset, data } => Some((target, offset, data.len())),
                _ => None,
            })
            .collect();
        assert_eq!(
            writes,
            vec![(BufferTarget::Array, 0, 256), (BufferTarget::ElementArray, 0, 144)]
        );
    }

    #[test]
    fn test_draw_indexed_single() {
        let (recorder, ctx) = recorder();
        let cube = MeshBuffers::<Vertex>::cube();
        let mesh = GlMesh::new(ctx, Vertex::layout(), Some(&cube)).unwrap();
        recorder.take_calls();

        mesh.draw_all();
        assert_eq!(
            recorder.draw_calls(),
            vec![GlCall::DrawElements {
                primitive: PrimitiveTopology::Triangles,
                count: 36,
                index_type: IndexType::UnsignedInt,
                byte_offset: 0,
            }]
        );
    }

    #[test]
    fn test_draw_partial_range_clamped() {
        let (recorder, ctx) = recorder();
        let cube = MeshBuffers::<Vertex>::cube();
        let mesh = GlMesh::new(ctx, Vertex::layout(), Some(&cube)).unwrap();
        recorder.take_calls();

        mesh.draw(2, 30, 100, None);
        assert_eq!(
            recorder.draw_calls(),
            vec![GlCall::DrawElementsInstanced {
                primitive: PrimitiveTopology::Triangles,
                count: 6,
                index_type: IndexType::UnsignedInt,
                byte_offset: 120,
                instances: 2,
            }]
        );
    }

    #[test]
    fn test_draw_arrays_without_indices() {
        let (recorder, ctx) = recorder();
        let mut mesh = GlMesh::new(ctx, Vertex::layout(), Some(&points(6))).unwrap();
        mesh.set_primitive(PrimitiveTopology::Points);
        recorder.take_calls();

        mesh.draw(1, 0, 0, None);
        mesh.draw(5, 0, 0, None);
        assert_eq!(
            recorder.draw_calls(),
            vec![
                GlCall::DrawArrays { primitive: PrimitiveTopology::Points, first: 0, count: 6 },
                GlCall::DrawArraysInstanced {
                    primitive: PrimitiveTopology::Points,
                    first: 0,
                    count: 6,
                    instances: 5,
                },
            ]
        );
    }

    #[test]
    fn test_zero_instances_or_vertices_draw_nothing() {
        let (recorder, ctx) = recorder();
        let empty = GlMesh::new(ctx.clone(), Vertex::layout(), None).unwrap();
        let cube = MeshBuffers::<Vertex>::cube();
        let mesh = GlMesh::new(ctx, Vertex::layout(), Some(&cube)).unwrap();
        recorder.take_calls();

        mesh.draw(0, 0, 0, None);
        empty.draw(1, 0, 0, None);
        empty.draw(10, 0, 0, None);

        assert!(recorder.draw_calls().is_empty());
        // VAO is still bound and released symmetrically
        let calls = recorder.calls();
        assert_eq!(calls.first(), Some(&GlCall::BindVertexArray(Some(mesh.vertex_array()))));
        assert_eq!(calls.last(), Some(&GlCall::BindVertexArray(None)));
    }

    #[test]
    fn test_instance_buffer_bound_around_draw() {
        let (recorder, ctx) = recorder();
        let cube = MeshBuffers::<Vertex>::cube();
        let mesh = GlMesh::new(ctx.clone(), Vertex::layout(), Some(&cube)).unwrap();
        let offsets = InstanceBuffer::new(
            ctx,
            12,
            16,
            vec![InstanceAttribute::new(4, 3, AttributeType::Float, 0)],
        )
        .unwrap();
        recorder.take_calls();

        mesh.draw(16, 0, 0, Some(&offsets));

        let calls = recorder.calls();
        let divisor = calls
            .iter()
            .position(|c| *c == GlCall::VertexAttribDivisor { index: 4, divisor: 1 })
            .unwrap();
        let draw = calls.iter().position(GlCall::is_draw).unwrap();
        let disable = calls
            .iter()
            .rposition(|c| *c == GlCall::DisableVertexAttribArray(4))
            .unwrap();
        assert!(divisor < draw && draw < disable);
    }

    #[test]
    fn test_drop_releases_all_handles() {
        let (recorder, ctx) = recorder();
        {
            let cube = MeshBuffers::<Vertex>::cube();
            let _mesh = GlMesh::new(ctx, Vertex::layout(), Some(&cube)).unwrap();
            assert_eq!(recorder.live_buffers().len(), 2);
            assert_eq!(recorder.live_vertex_arrays().len(), 1);
        }
        assert!(recorder.live_buffers().is_empty());
        assert!(recorder.live_vertex_arrays().is_empty());
    }
}
