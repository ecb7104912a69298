//! Draw range resolution
//!
//! Turns the loosely specified `(instances, offset, count)` triple a caller
//! passes to [`GlMesh::draw`](crate::render::GlMesh::draw) into at most one
//! concrete draw command. Out-of-range requests are clamped, never rejected.

use crate::render::context::{GraphicsContext, IndexType, PrimitiveTopology};

/// Which GL entry point a draw uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawKind {
    /// glDrawArrays / glDrawArraysInstanced
    Arrays,
    /// glDrawElements / glDrawElementsInstanced with 32-bit indices
    Elements,
}

/// A fully resolved draw command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawCall {
    /// Indexed or not
    pub kind: DrawKind,
    /// Primitive assembly
    pub primitive: PrimitiveTopology,
    /// First vertex or index
    pub first: u32,
    /// Number of vertices or indices
    pub count: u32,
    /// Instance count, at least 1
    pub instances: u32,
}

impl DrawCall {
    /// Resolve a draw request against the mesh's current contents
    ///
    /// `count == 0` means "to the end". Returns `None` when there is nothing to
    /// draw: zero instances, zero vertices, or an offset at or past the end.
    /// Indexed meshes are clamped to `index_count`, others to `vertex_count`.
    pub fn resolve(
        primitive: PrimitiveTopology,
        instances: u32,
        offset: u32,
        count: u32,
        vertex_count: u32,
        index_count: u32,
    ) -> Option<Self> {
        if instances == 0 || vertex_count == 0 {
            return None;
        }

        let (kind, limit) = if index_count > 0 {
            (DrawKind::Elements, index_count)
        } else {
            (DrawKind::Arrays, vertex_count)
        };

        if offset >= limit {
            return None;
        }

        let requested = if count > 0 { count } else { limit };
        let end = offset.saturating_add(requested).min(limit);

        Some(Self {
            kind,
            primitive,
            first: offset,
            count: end - offset,
            instances,
        })
    }

    /// One past the last vertex or index touched
    pub const fn end(&self) -> u32 {
        self.first + self.count
    }

    /// Byte offset into the index buffer for element draws
    pub const fn index_byte_offset(&self) -> usize {
        self.first as usize * IndexType::UnsignedInt.size_bytes()
    }

    /// Submit through `ctx`, picking the instanced entry point when needed
    pub fn issue(&self, ctx: &dyn GraphicsContext) {
        log::trace!(
            "draw {:?} {:?} first={} count={} instances={}",
            self.kind,
            self.primitive,
            self.first,
            self.count,
            self.instances
        );

        match (self.kind, self.instances) {
            (DrawKind::Elements, 1) => ctx.draw_elements(
                self.primitive,
                self.count,
                IndexType::UnsignedInt,
                self.index_byte_offset(),
            ),
            (DrawKind::Elements, instances) => ctx.draw_elements_instanced(
                self.primitive,
                self.count,
                IndexType::UnsignedInt,
                self.index_byte_offset(),
                instances,
            ),
            (DrawKind::Arrays, 1) => ctx.draw_arrays(self.primitive, self.first, self.count),
            (DrawKind::Arrays, instances) => {
                ctx.draw_arrays_instanced(self.primitive, self.first, self.count, instances);
            }
        }
    }
}
