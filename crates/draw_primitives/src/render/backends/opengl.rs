//! OpenGL backend over `glow`
//!
//! Forwards every [`GraphicsContext`] call to a `glow::Context`. The caller
//! creates the context (window and GL loader setup are not handled here) and
//! must keep it current on the calling thread.

use std::num::NonZeroU32;

use glow::HasContext;

use crate::render::context::{
    BlendFactor, BufferHandle, BufferTarget, BufferUsage, Capability, GraphicsContext, IndexType,
    PrimitiveTopology, ProgramHandle, UniformValue, VertexArrayHandle,
};
use crate::render::layout::AttributeType;
use crate::render::{RenderError, RenderResult};

/// OpenGL 3.3+ context
pub struct GlowContext {
    gl: glow::Context,
}

impl GlowContext {
    /// Wrap a loaded glow context
    pub fn new(gl: glow::Context) -> Self {
        log_driver_info(&gl);
        Self { gl }
    }

    /// Underlying glow context, for calls this crate does not wrap
    pub fn gl(&self) -> &glow::Context {
        &self.gl
    }

    /// Wrap a program object linked outside this crate
    pub fn program_handle(program: glow::Program) -> ProgramHandle {
        ProgramHandle(program.0.get())
    }
}

fn native_buffer(handle: BufferHandle) -> Option<glow::Buffer> {
    NonZeroU32::new(handle.0).map(glow::NativeBuffer)
}

fn native_vertex_array(handle: VertexArrayHandle) -> Option<glow::VertexArray> {
    NonZeroU32::new(handle.0).map(glow::NativeVertexArray)
}

fn native_program(handle: ProgramHandle) -> Option<glow::Program> {
    NonZeroU32::new(handle.0).map(glow::NativeProgram)
}

fn log_driver_info(gl: &glow::Context) {
    // SAFETY: string queries have no preconditions beyond a current context
    let (vendor, renderer, version) = unsafe {
        (
            gl.get_parameter_string(glow::VENDOR),
            gl.get_parameter_string(glow::RENDERER),
            gl.get_parameter_string(glow::VERSION),
        )
    };
    log::info!("OpenGL: {vendor} / {renderer} / {version}");
}

// SAFETY (all methods below): the handles passed in were created by this
// context, and buffer writes are bounded by the slice length.
impl GraphicsContext for GlowContext {
    fn create_buffer(&self) -> RenderResult<BufferHandle> {
        let buffer = unsafe { self.gl.create_buffer() }.map_err(RenderError::ResourceCreationFailed)?;
        Ok(BufferHandle(buffer.0.get()))
    }

    fn delete_buffer(&self, buffer: BufferHandle) {
        if let Some(native) = native_buffer(buffer) {
            unsafe { self.gl.delete_buffer(native) };
        }
    }

    fn create_vertex_array(&self) -> RenderResult<VertexArrayHandle> {
        let vao = unsafe { self.gl.create_vertex_array() }.map_err(RenderError::ResourceCreationFailed)?;
        Ok(VertexArrayHandle(vao.0.get()))
    }

    fn delete_vertex_array(&self, vertex_array: VertexArrayHandle) {
        if let Some(native) = native_vertex_array(vertex_array) {
            unsafe { self.gl.delete_vertex_array(native) };
        }
    }

    fn bind_vertex_array(&self, vertex_array: Option<VertexArrayHandle>) {
        unsafe { self.gl.bind_vertex_array(vertex_array.and_then(native_vertex_array)) };
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: Option<BufferHandle>) {
        unsafe { self.gl.bind_buffer(target.gl_enum(), buffer.and_then(native_buffer)) };
    }

    fn allocate_buffer(&self, target: BufferTarget, size: usize, usage: BufferUsage) {
        unsafe { self.gl.buffer_data_size(target.gl_enum(), size as i32, usage.gl_enum()) };
    }

    fn write_buffer(&self, target: BufferTarget, offset: usize, data: &[u8]) {
        unsafe { self.gl.buffer_sub_data_u8_slice(target.gl_enum(), offset as i32, data) };
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
        unsafe {
            self.gl.vertex_attrib_pointer_f32(
                index,
                size as i32,
                attribute_type.gl_enum(),
                normalized,
                stride as i32,
                offset as i32,
            );
        }
    }

    fn vertex_attrib_i_pointer(
        &self,
        index: u32,
        size: u32,
        attribute_type: AttributeType,
        stride: u32,
        offset: u32,
    ) {
        unsafe {
            self.gl.vertex_attrib_pointer_i32(
                index,
                size as i32,
                attribute_type.gl_enum(),
                stride as i32,
                offset as i32,
            );
        }
    }

    fn vertex_attrib_divisor(&self, index: u32, divisor: u32) {
        unsafe { self.gl.vertex_attrib_divisor(index, divisor) };
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        unsafe { self.gl.enable_vertex_attrib_array(index) };
    }

    fn disable_vertex_attrib_array(&self, index: u32) {
        unsafe { self.gl.disable_vertex_attrib_array(index) };
    }

    fn draw_arrays(&self, primitive: PrimitiveTopology, first: u32, count: u32) {
        unsafe { self.gl.draw_arrays(primitive.gl_enum(), first as i32, count as i32) };
    }

    fn draw_arrays_instanced(&self, primitive: PrimitiveTopology, first: u32, count: u32, instances: u32) {
        unsafe {
            self.gl
                .draw_arrays_instanced(primitive.gl_enum(), first as i32, count as i32, instances as i32);
        }
    }

    fn draw_elements(&self, primitive: PrimitiveTopology, count: u32, index_type: IndexType, byte_offset: usize) {
        unsafe {
            self.gl
                .draw_elements(primitive.gl_enum(), count as i32, index_type.gl_enum(), byte_offset as i32);
        }
    }

    fn draw_elements_instanced(
        &self,
        primitive: PrimitiveTopology,
        count: u32,
        index_type: IndexType,
        byte_offset: usize,
        instances: u32,
    ) {
        unsafe {
            self.gl.draw_elements_instanced(
                primitive.gl_enum(),
                count as i32,
                index_type.gl_enum(),
                byte_offset as i32,
                instances as i32,
            );
        }
    }

    fn set_capability(&self, capability: Capability, enabled: bool) {
        unsafe {
            if enabled {
                self.gl.enable(capability.gl_enum());
            } else {
                self.gl.disable(capability.gl_enum());
            }
        }
    }

    fn blend_func(&self, src: BlendFactor, dst: BlendFactor) {
        unsafe { self.gl.blend_func(src.gl_enum(), dst.gl_enum()) };
    }

    fn line_width(&self, width: f32) {
        unsafe { self.gl.line_width(width) };
    }

    fn use_program(&self, program: Option<ProgramHandle>) {
        unsafe { self.gl.use_program(program.and_then(native_program)) };
    }

    fn set_uniform(&self, program: ProgramHandle, name: &str, value: UniformValue) {
        let Some(native) = native_program(program) else {
            return;
        };

        unsafe {
            let Some(location) = self.gl.get_uniform_location(native, name) else {
                log::trace!("Uniform {name} not active in program {}", program.0);
                return;
            };
            match value {
                UniformValue::Bool(v) => self.gl.uniform_1_i32(Some(&location), i32::from(v)),
                UniformValue::Float(v) => self.gl.uniform_1_f32(Some(&location), v),
                UniformValue::Vec4([x, y, z, w]) => self.gl.uniform_4_f32(Some(&location), x, y, z, w),
                UniformValue::Mat4(m) => {
                    self.gl
                        .uniform_matrix_4_f32_slice(Some(&location), false, bytemuck::cast_slice(&m));
                }
            }
        }
    }
}
