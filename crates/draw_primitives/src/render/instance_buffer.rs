//! Per-instance attribute storage
//!
//! An [`InstanceBuffer`] is a fixed-capacity array buffer of
//! `instance_size_bytes * instance_count` bytes. Callers write sub-ranges of it
//! and pass it to [`GlMesh::draw`](crate::render::GlMesh::draw), which binds
//! its attributes with their instancing divisors for the duration of the draw.

use bytemuck::Pod;

use crate::render::buffer::GpuBuffer;
use crate::render::context::{BufferTarget, BufferUsage, SharedContext};
use crate::render::layout::{validate_attributes, InstanceAttribute};
use crate::render::{RenderError, RenderResult};

/// Fixed-capacity GPU buffer of instance records
pub struct InstanceBuffer {
    ctx: SharedContext,
    buffer: GpuBuffer,
    instance_size_bytes: u32,
    instance_count: u32,
    attributes: Vec<InstanceAttribute>,
}

impl InstanceBuffer {
    /// Allocate room for `instance_count` records of `instance_size_bytes` each
    ///
    /// Attributes are validated against the record size like a vertex layout.
    pub fn new(
        ctx: SharedContext,
        instance_size_bytes: u32,
        instance_count: u32,
        attributes: Vec<InstanceAttribute>,
    ) -> RenderResult<Self> {
        validate_attributes(attributes.iter().map(|a| &a.attribute), instance_size_bytes)?;

        let mut buffer = GpuBuffer::new(ctx.clone(), BufferTarget::Array)?;
        let capacity = instance_size_bytes as usize * instance_count as usize;

        buffer.bind();
        buffer.allocate(capacity, BufferUsage::Dynamic);
        buffer.unbind();

        log::debug!(
            "Created instance buffer {:?}: {} instances x {} bytes",
            buffer.handle(),
            instance_count,
            instance_size_bytes
        );

        Ok(Self {
            ctx,
            buffer,
            instance_size_bytes,
            instance_count,
            attributes,
        })
    }

    /// Write raw bytes at `offset`
    ///
    /// Writes that would run past the allocated capacity are rejected before
    /// reaching the context.
    pub fn upload_instance_data(&self, offset: usize, data: &[u8]) -> RenderResult<()> {
        let capacity = self.capacity_bytes();
        let fits = offset
            .checked_add(data.len())
            .is_some_and(|end| end <= capacity);
        if !fits {
            log::warn!(
                "Rejected instance write of {} bytes at offset {} (capacity {})",
                data.len(),
                offset,
                capacity
            );
            return Err(RenderError::BufferOverflow {
                offset,
                size: data.len(),
                capacity,
            });
        }

        self.buffer.bind();
        self.buffer.write(offset, data);
        self.buffer.unbind();
        Ok(())
    }

    /// Write typed records starting at instance `first_instance`
    pub fn upload_instances<T: Pod>(&self, first_instance: u32, instances: &[T]) -> RenderResult<()> {
        let offset = first_instance as usize * self.instance_size_bytes as usize;
        self.upload_instance_data(offset, bytemuck::cast_slice(instances))
    }

    /// Enable attributes, bind the buffer and point every attribute at it
    pub fn bind(&self) {
        self.enable_attributes(true);
        self.buffer.bind();
        for attribute in &self.attributes {
            attribute.apply(self.ctx.as_ref(), self.instance_size_bytes);
        }
    }

    /// Unbind the array buffer and disable the attributes
    pub fn unbind(&self) {
        self.buffer.unbind();
        self.enable_attributes(false);
    }

    /// Toggle the attribute arrays without touching buffer bindings
    pub fn enable_attributes(&self, enabled: bool) {
        for attribute in &self.attributes {
            if enabled {
                self.ctx.enable_vertex_attrib_array(attribute.index());
            } else {
                self.ctx.disable_vertex_attrib_array(attribute.index());
            }
        }
    }

    /// Bytes per instance record
    pub fn instance_size_bytes(&self) -> u32 {
        self.instance_size_bytes
    }

    /// Number of records the buffer holds
    pub fn instance_count(&self) -> u32 {
        self.instance_count
    }

    /// Total allocated bytes
    pub fn capacity_bytes(&self) -> usize {
        self.instance_size_bytes as usize * self.instance_count as usize
    }

    /// Attribute slots fed by this buffer
    pub fn attributes(&self) -> &[InstanceAttribute] {
        &self.attributes
    }

    /// Underlying buffer
    pub fn buffer(&self) -> &GpuBuffer {
        &self.buffer
    }
}

impl std::fmt::Debug for InstanceBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceBuffer")
            .field("buffer", &self.buffer)
            .field("instance_size_bytes", &self.instance_size_bytes)
            .field("instance_count", &self.instance_count)
            .field("attributes", &self.attributes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backends::{GlCall, RecordingContext};
    use crate::render::layout::AttributeType;
    use std::rc::Rc;

    fn matrix_attributes() -> Vec<InstanceAttribute> {
        (0..4)
            .map(|column| InstanceAttribute::new(3 + column, 4, AttributeType::Float, column * 16))
            .collect()
    }

    fn setup(count: u32) -> (Rc<RecordingContext>, InstanceBuffer) {
        let recorder = Rc::new(RecordingContext::new());
        let ctx: SharedContext = recorder.clone();
        let buffer = InstanceBuffer::new(ctx, 64, count, matrix_attributes()).unwrap();
        (recorder, buffer)
    }

    #[test]
    fn test_allocates_full_capacity() {
        let (recorder, buffer) = setup(10);
        assert_eq!(buffer.capacity_bytes(), 640);
        assert_eq!(recorder.buffer_size(buffer.buffer().handle()), Some(640));
    }

    #[test]
    fn test_upload_within_capacity() {
        let (recorder, buffer) = setup(4);
        recorder.take_calls();

        let records = [[1.0f32; 16]; 2];
        buffer.upload_instances(2, &records).unwrap();

        let writes: Vec<_> = recorder
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                GlCall::WriteBuffer { offset, data, .. } => Some((offset, data.len())),
                _ => None,
            })
            .collect();
        assert_eq!(writes, vec![(128, 128)]);
    }

    #[test]
    fn test_upload_past_capacity_rejected() {
        let (recorder, buffer) = setup(2);
        recorder.take_calls();

        let result = buffer.upload_instance_data(100, &[0u8; 64]);
        assert!(matches!(
            result,
            Err(RenderError::BufferOverflow { offset: 100, size: 64, capacity: 128 })
        ));
        assert!(recorder.calls().is_empty());
    }

    #[test]
    fn test_bind_sets_divisors_and_stride() {
        let (recorder, buffer) = setup(1);
        recorder.take_calls();

        buffer.bind();
        let calls = recorder.calls();
        assert!(calls.contains(&GlCall::VertexAttribDivisor { index: 3, divisor: 1 }));
        assert!(calls.contains(&GlCall::VertexAttribPointer {
            index: 6,
            size: 4,
            attribute_type: AttributeType::Float,
            normalized: false,
            stride: 64,
            offset: 48,
        }));
    }

    #[test]
    fn test_integer_attribute_uses_i_pointer() {
        let recorder = Rc::new(RecordingContext::new());
        let ctx: SharedContext = recorder.clone();
        let attributes = vec![InstanceAttribute::new(5, 1, AttributeType::UnsignedInt, 0).with_divisor(2)];
        let buffer = InstanceBuffer::new(ctx, 4, 8, attributes).unwrap();
        recorder.take_calls();

        buffer.bind();
        let calls = recorder.calls();
        assert!(calls.contains(&GlCall::VertexAttribIPointer {
            index: 5,
            size: 1,
            attribute_type: AttributeType::UnsignedInt,
            stride: 4,
            offset: 0,
        }));
        assert!(calls.contains(&GlCall::VertexAttribDivisor { index: 5, divisor: 2 }));
    }

    #[test]
    fn test_unbind_disables_attributes() {
        let (recorder, buffer) = setup(1);
        buffer.bind();
        recorder.take_calls();

        buffer.unbind();
        let disabled = recorder
            .calls()
            .iter()
            .filter(|c| matches!(c, GlCall::DisableVertexAttribArray(_)))
            .count();
        assert_eq!(disabled, 4);
    }

    #[test]
    fn test_attribute_past_record_size_rejected() {
        let ctx: SharedContext = Rc::new(RecordingContext::new());
        let attributes = vec![InstanceAttribute::new(3, 4, AttributeType::Float, 8)];
        assert!(InstanceBuffer::new(ctx, 16, 4, attributes).is_err());
    }
}
