//! Buffer and vertex array ownership
//!
//! RAII wrappers over context handles: each value keeps the context alive and
//! deletes its handle on drop.

use crate::render::context::{BufferHandle, BufferTarget, BufferUsage, SharedContext, VertexArrayHandle};
use crate::render::RenderResult;

/// Owned GPU buffer object
pub struct GpuBuffer {
    ctx: SharedContext,
    handle: BufferHandle,
    target: BufferTarget,
    size: usize,
}

impl GpuBuffer {
    /// Generate a buffer for `target` without allocating storage
    pub fn new(ctx: SharedContext, target: BufferTarget) -> RenderResult<Self> {
        let handle = ctx.create_buffer()?;
        Ok(Self {
            ctx,
            handle,
            target,
            size: 0,
        })
    }

    /// Bind to this buffer's target
    pub fn bind(&self) {
        self.ctx.bind_buffer(self.target, Some(self.handle));
    }

    /// Clear this buffer's target
    pub fn unbind(&self) {
        self.ctx.bind_buffer(self.target, None);
    }

    /// Replace the storage with `size` uninitialised bytes
    ///
    /// Expects the buffer to be bound.
    pub fn allocate(&mut self, size: usize, usage: BufferUsage) {
        self.ctx.allocate_buffer(self.target, size, usage);
        self.size = size;
    }

    /// Write `data` at `offset`; expects the buffer to be bound
    pub fn write(&self, offset: usize, data: &[u8]) {
        self.ctx.write_buffer(self.target, offset, data);
    }

    /// Get buffer handle
    pub fn handle(&self) -> BufferHandle {
        self.handle
    }

    /// Binding target
    pub fn target(&self) -> BufferTarget {
        self.target
    }

    /// Allocated storage in bytes
    pub fn size(&self) -> usize {
        self.size
    }
}

impl Drop for GpuBuffer {
    fn drop(&mut self) {
        self.ctx.delete_buffer(self.handle);
    }
}

impl std::fmt::Debug for GpuBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuBuffer")
            .field("handle", &self.handle)
            .field("target", &self.target)
            .field("size", &self.size)
            .finish()
    }
}

/// Owned vertex array object
pub struct VertexArray {
    ctx: SharedContext,
    handle: VertexArrayHandle,
}

impl VertexArray {
    /// Generate a vertex array
    pub fn new(ctx: SharedContext) -> RenderResult<Self> {
        let handle = ctx.create_vertex_array()?;
        Ok(Self { ctx, handle })
    }

    /// Bind this vertex array
    pub fn bind(&self) {
        self.ctx.bind_vertex_array(Some(self.handle));
    }

    /// Unbind any vertex array
    pub fn unbind(&self) {
        self.ctx.bind_vertex_array(None);
    }

    /// Get vertex array handle
    pub fn handle(&self) -> VertexArrayHandle {
        self.handle
    }
}

impl Drop for VertexArray {
    fn drop(&mut self) {
        self.ctx.delete_vertex_array(self.handle);
    }
}

impl std::fmt::Debug for VertexArray {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VertexArray").field("handle", &self.handle).finish()
    }
}
