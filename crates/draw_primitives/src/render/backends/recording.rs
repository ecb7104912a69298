//! Headless context that records every call
//!
//! `RecordingContext` never touches a driver. It hands out sequential handles,
//! tracks which ones are still alive and keeps an ordered log of [`GlCall`]s,
//! which makes it the backend of choice for unit tests and for inspecting the
//! exact command stream a mesh produces.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashMap};

use crate::render::context::{
    BlendFactor, BufferHandle, BufferTarget, BufferUsage, Capability, GraphicsContext, IndexType,
    PrimitiveTopology, ProgramHandle, UniformValue, VertexArrayHandle,
};
use crate::render::layout::AttributeType;
use crate::render::RenderResult;

/// One recorded context call
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum GlCall {
    CreateBuffer(BufferHandle),
    DeleteBuffer(BufferHandle),
    CreateVertexArray(VertexArrayHandle),
    DeleteVertexArray(VertexArrayHandle),
    BindVertexArray(Option<VertexArrayHandle>),
    BindBuffer(BufferTarget, Option<BufferHandle>),
    AllocateBuffer { target: BufferTarget, size: usize, usage: BufferUsage },
    WriteBuffer { target: BufferTarget, offset: usize, data: Vec<u8> },
    VertexAttribPointer {
        index: u32,
        size: u32,
        attribute_type: AttributeType,
        normalized: bool,
        stride: u32,
        offset: u32,
    },
    VertexAttribIPointer {
        index: u32,
        size: u32,
        attribute_type: AttributeType,
        stride: u32,
        offset: u32,
    },
    VertexAttribDivisor { index: u32, divisor: u32 },
    EnableVertexAttribArray(u32),
    DisableVertexAttribArray(u32),
    DrawArrays { primitive: PrimitiveTopology, first: u32, count: u32 },
    DrawArraysInstanced { primitive: PrimitiveTopology, first: u32, count: u32, instances: u32 },
    DrawElements { primitive: PrimitiveTopology, count: u32, index_type: IndexType, byte_offset: usize },
    DrawElementsInstanced {
        primitive: PrimitiveTopology,
        count: u32,
        index_type: IndexType,
        byte_offset: usize,
        instances: u32,
    },
    SetCapability(Capability, bool),
    BlendFunc(BlendFactor, BlendFactor),
    LineWidth(f32),
    UseProgram(Option<ProgramHandle>),
    SetUniform { program: ProgramHandle, name: String, value: UniformValue },
}

impl GlCall {
    /// Whether this call submits geometry
    pub const fn is_draw(&self) -> bool {
        matches!(
            self,
            Self::DrawArrays { .. }
                | Self::DrawArraysInstanced { .. }
                | Self::DrawElements { .. }
                | Self::DrawElementsInstanced { .. }
        )
    }
}

/// Context that records calls instead of executing them
#[derive(Debug, Default)]
pub struct RecordingContext {
    calls: RefCell<Vec<GlCall>>,
    next_handle: Cell<u32>,
    live_buffers: RefCell<BTreeSet<BufferHandle>>,
    live_vertex_arrays: RefCell<BTreeSet<VertexArrayHandle>>,
    bound: RefCell<HashMap<BufferTarget, BufferHandle>>,
    buffer_sizes: RefCell<HashMap<BufferHandle, usize>>,
}

impl RecordingContext {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded calls
    pub fn calls(&self) -> Vec<GlCall> {
        self.calls.borrow().clone()
    }

    /// Drain recorded calls, leaving handle bookkeeping intact
    pub fn take_calls(&self) -> Vec<GlCall> {
        std::mem::take(&mut *self.calls.borrow_mut())
    }

    /// Only the draw calls, in order
    pub fn draw_calls(&self) -> Vec<GlCall> {
        self.calls.borrow().iter().filter(|c| c.is_draw()).cloned().collect()
    }

    /// Number of `AllocateBuffer` calls recorded
    pub fn allocation_count(&self) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| matches!(c, GlCall::AllocateBuffer { .. }))
            .count()
    }

    /// Buffers created and not yet deleted
    pub fn live_buffers(&self) -> Vec<BufferHandle> {
        self.live_buffers.borrow().iter().copied().collect()
    }

    /// Vertex arrays created and not yet deleted
    pub fn live_vertex_arrays(&self) -> Vec<VertexArrayHandle> {
        self.live_vertex_arrays.borrow().iter().copied().collect()
    }

    /// Last storage size allocated for `buffer`
    pub fn buffer_size(&self, buffer: BufferHandle) -> Option<usize> {
        self.buffer_sizes.borrow().get(&buffer).copied()
    }

    fn record(&self, call: GlCall) {
        log::trace!("{call:?}");
        self.calls.borrow_mut().push(call);
    }

    fn allocate_handle(&self) -> u32 {
        // Zero is reserved as "no object" in GL
        let handle = self.next_handle.get() + 1;
        self.next_handle.set(handle);
        handle
    }
}

impl GraphicsContext for RecordingContext {
    fn create_buffer(&self) -> RenderResult<BufferHandle> {
        let handle = BufferHandle(self.allocate_handle());
        self.live_buffers.borrow_mut().insert(handle);
        self.record(GlCall::CreateBuffer(handle));
        Ok(handle)
    }

    fn delete_buffer(&self, buffer: BufferHandle) {
        self.live_buffers.borrow_mut().remove(&buffer);
        self.buffer_sizes.borrow_mut().remove(&buffer);
        self.bound.borrow_mut().retain(|_, bound| *bound != buffer);
        self.record(GlCall::DeleteBuffer(buffer));
    }

    fn create_vertex_array(&self) -> RenderResult<VertexArrayHandle> {
        let handle = VertexArrayHandle(self.allocate_handle());
        self.live_vertex_arrays.borrow_mut().insert(handle);
        self.record(GlCall::CreateVertexArray(handle));
        Ok(handle)
    }

    fn delete_vertex_array(&self, vertex_array: VertexArrayHandle) {
        self.live_vertex_arrays.borrow_mut().remove(&vertex_array);
        self.record(GlCall::DeleteVertexArray(vertex_array));
    }

    fn bind_vertex_array(&self, vertex_array: Option<VertexArrayHandle>) {
        self.record(GlCall::BindVertexArray(vertex_array));
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: Option<BufferHandle>) {
        match buffer {
            Some(handle) => self.bound.borrow_mut().insert(target, handle),
            None => self.bound.borrow_mut().remove(&target),
        };
        self.record(GlCall::BindBuffer(target, buffer));
    }

    fn allocate_buffer(&self, target: BufferTarget, size: usize, usage: BufferUsage) {
        if let Some(handle) = self.bound.borrow().get(&target) {
            self.buffer_sizes.borrow_mut().insert(*handle, size);
        }
        self.record(GlCall::AllocateBuffer { target, size, usage });
    }

    fn write_buffer(&self, target: BufferTarget, offset: usize, data: &[u8]) {
        self.record(GlCall::WriteBuffer {
            target,
            offset,
            data: data.to_vec(),
        });
    }

    fn vertex_attrib_pointer(
        &self,
        index: u32,
        size: u32,
        attribute_type: AttributeType,
        normalized: bool,
        stride: u32,
        offset: u32,
    ) {
        self.record(GlCall::VertexAttribPointer {
            index,
            size,
            attribute_type,
            normalized,
            stride,
            offset,
        });
    }

    fn vertex_attrib_i_pointer(
        &self,
        index: u32,
        size: u32,
        attribute_type: AttributeType,
        stride: u32,
        offset: u32,
    ) {
        self.record(GlCall::VertexAttribIPointer {
            index,
            size,
            attribute_type,
            stride,
            offset,
        });
    }

    fn vertex_attrib_divisor(&self, index: u32, divisor: u32) {
        self.record(GlCall::VertexAttribDivisor { index, divisor });
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        self.record(GlCall::EnableVertexAttribArray(index));
    }

    fn disable_vertex_attrib_array(&self, index: u32) {
        self.record(GlCall::DisableVertexAttribArray(index));
    }

    fn draw_arrays(&self, primitive: PrimitiveTopology, first: u32, count: u32) {
        self.record(GlCall::DrawArrays { primitive, first, count });
    }

    fn draw_arrays_instanced(&self, primitive: PrimitiveTopology, first: u32, count: u32, instances: u32) {
        self.record(GlCall::DrawArraysInstanced {
            primitive,
            first,
            count,
            instances,
        });
    }

    fn draw_elements(&self, primitive: PrimitiveTopology, count: u32, index_type: IndexType, byte_offset: usize) {
        self.record(GlCall::DrawElements {
            primitive,
            count,
            index_type,
            byte_offset,
        });
    }

    fn draw_elements_instanced(
        &self,
        primitive: PrimitiveTopology,
        count: u32,
        index_type: IndexType,
        byte_offset: usize,
        instances: u32,
    ) {
        self.record(GlCall::DrawElementsInstanced {
            primitive,
            count,
            index_type,
            byte_offset,
            instances,
        });
    }

    fn set_capability(&self, capability: Capability, enabled: bool) {
        self.record(GlCall::SetCapability(capability, enabled));
    }

    fn blend_func(&self, src: BlendFactor, dst: BlendFactor) {
        self.record(GlCall::BlendFunc(src, dst));
    }

    fn line_width(&self, width: f32) {
        self.record(GlCall::LineWidth(width));
    }

    fn use_program(&self, program: Option<ProgramHandle>) {
        self.record(GlCall::UseProgram(program));
    }

    fn set_uniform(&self, program: ProgramHandle, name: &str, value: UniformValue) {
        self.record(GlCall::SetUniform {
            program,
            name: name.to_string(),
            value,
        });
    }
}
