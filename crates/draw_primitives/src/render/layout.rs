//! Vertex and instance attribute layouts
//!
//! A [`VertexLayout`] describes how one interleaved vertex buffer feeds the
//! shader's attribute slots. Layouts are validated once on construction so the
//! bind path can trust offsets and stride.

use crate::render::context::GraphicsContext;
use crate::render::{RenderError, RenderResult};

/// Component type of a vertex attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeType {
    /// Signed 8-bit integer
    Byte,
    /// Unsigned 8-bit integer
    UnsignedByte,
    /// Signed 16-bit integer
    Short,
    /// Unsigned 16-bit integer
    UnsignedShort,
    /// Signed 32-bit integer
    Int,
    /// Unsigned 32-bit integer
    UnsignedInt,
    /// 16-bit float
    HalfFloat,
    /// 32-bit float
    Float,
    /// 64-bit float
    Double,
}

impl AttributeType {
    /// OpenGL enum value
    pub const fn gl_enum(self) -> u32 {
        match self {
            Self::Byte => 0x1400,
            Self::UnsignedByte => 0x1401,
            Self::Short => 0x1402,
            Self::UnsignedShort => 0x1403,
            Self::Int => 0x1404,
            Self::UnsignedInt => 0x1405,
            Self::Float => 0x1406,
            Self::Double => 0x140A,
            Self::HalfFloat => 0x140B,
        }
    }

    /// Size of one component in bytes
    pub const fn size_bytes(self) -> u32 {
        match self {
            Self::Byte | Self::UnsignedByte => 1,
            Self::Short | Self::UnsignedShort | Self::HalfFloat => 2,
            Self::Int | Self::UnsignedInt | Self::Float => 4,
            Self::Double => 8,
        }
    }

    /// Floating types go through glVertexAttribPointer, integers through glVertexAttribIPointer
    pub const fn is_floating_point(self) -> bool {
        matches!(self, Self::HalfFloat | Self::Float | Self::Double)
    }
}

/// One per-vertex attribute slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    /// Shader attribute location
    pub index: u32,
    /// Number of components (1-4)
    pub size: u32,
    /// Component type
    pub attribute_type: AttributeType,
    /// Byte offset from the start of the vertex
    pub offset: u32,
    /// Map integer data into [0, 1] / [-1, 1] when read as float
    pub normalized: bool,
}

impl VertexAttribute {
    /// Create an attribute
    pub const fn new(index: u32, size: u32, attribute_type: AttributeType, offset: u32) -> Self {
        Self {
            index,
            size,
            attribute_type,
            offset,
            normalized: false,
        }
    }

    /// Create a float attribute, the common case for positions and normals
    pub const fn float(index: u32, size: u32, offset: u32) -> Self {
        Self::new(index, size, AttributeType::Float, offset)
    }

    /// Mark integer data as normalized
    #[must_use]
    pub const fn normalized(mut self) -> Self {
        self.normalized = true;
        self
    }

    /// Bytes occupied by this attribute within a vertex
    pub const fn size_bytes(&self) -> u32 {
        self.size * self.attribute_type.size_bytes()
    }

    /// One past the last byte of this attribute
    pub const fn end(&self) -> u32 {
        self.offset + self.size_bytes()
    }

    fn apply(&self, ctx: &dyn GraphicsContext, stride: u32) {
        if self.attribute_type.is_floating_point() {
            ctx.vertex_attrib_pointer(
                self.index,
                self.size,
                self.attribute_type,
                self.normalized,
                stride,
                self.offset,
            );
        } else {
            ctx.vertex_attrib_i_pointer(self.index, self.size, self.attribute_type, stride, self.offset);
        }
    }
}

/// Ordered attributes sharing one interleaved buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexLayout {
    attributes: Vec<VertexAttribute>,
    stride: u32,
}

impl VertexLayout {
    /// Create a layout, checking that no attributes overlap and all fit inside `stride`
    pub fn new(attributes: Vec<VertexAttribute>, stride: u32) -> RenderResult<Self> {
        validate_attributes(attributes.iter(), stride)?;
        Ok(Self { attributes, stride })
    }

    /// Build a tightly packed layout from `(index, size, type)` triples
    ///
    /// Offsets follow declaration order and the stride is the summed size.
    pub fn packed(slots: &[(u32, u32, AttributeType)]) -> RenderResult<Self> {
        let mut offset = 0;
        let mut attributes = Vec::with_capacity(slots.len());
        for &(index, size, attribute_type) in slots {
            let attribute = VertexAttribute::new(index, size, attribute_type, offset);
            offset += attribute.size_bytes();
            attributes.push(attribute);
        }
        Self::new(attributes, offset)
    }

    /// Attributes in declaration order
    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }

    /// Bytes between consecutive vertices
    pub fn stride(&self) -> u32 {
        self.stride
    }

    /// Point every attribute at the currently bound array buffer
    pub fn bind(&self, ctx: &dyn GraphicsContext) {
        for attribute in &self.attributes {
            attribute.apply(ctx, self.stride);
        }
    }

    /// Enable or disable every attribute array
    pub fn set_enabled(&self, ctx: &dyn GraphicsContext, enabled: bool) {
        for attribute in &self.attributes {
            if enabled {
                ctx.enable_vertex_attrib_array(attribute.index);
            } else {
                ctx.disable_vertex_attrib_array(attribute.index);
            }
        }
    }
}

/// One per-instance attribute slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceAttribute {
    /// Layout within one instance record
    pub attribute: VertexAttribute,
    /// Instances drawn before the attribute advances
    pub divisor: u32,
}

impl InstanceAttribute {
    /// Create an attribute that advances once per instance
    pub const fn new(index: u32, size: u32, attribute_type: AttributeType, offset: u32) -> Self {
        Self {
            attribute: VertexAttribute::new(index, size, attribute_type, offset),
            divisor: 1,
        }
    }

    /// Override the divisor
    #[must_use]
    pub const fn with_divisor(mut self, divisor: u32) -> Self {
        self.divisor = divisor;
        self
    }

    /// Shader attribute location
    pub const fn index(&self) -> u32 {
        self.attribute.index
    }

    pub(crate) fn apply(&self, ctx: &dyn GraphicsContext, stride: u32) {
        self.attribute.apply(ctx, stride);
        ctx.vertex_attrib_divisor(self.attribute.index, self.divisor);
    }
}

/// Check size range, stride bounds, byte overlap and duplicate locations
pub(crate) fn validate_attributes<'a>(
    attributes: impl Iterator<Item = &'a VertexAttribute> + Clone,
    stride: u32,
) -> RenderResult<()> {
    for (i, a) in attributes.clone().enumerate() {
        if !(1..=4).contains(&a.size) {
            return Err(RenderError::InvalidLayout(format!(
                "attribute {} has {} components, expected 1-4",
                a.index, a.size
            )));
        }
        if a.end() > stride {
            return Err(RenderError::InvalidLayout(format!(
                "attribute {} spans bytes {}..{} past stride {}",
                a.index,
                a.offset,
                a.end(),
                stride
            )));
        }
        for b in attributes.clone().skip(i + 1) {
            if a.index == b.index {
                return Err(RenderError::InvalidLayout(format!(
                    "attribute location {} declared twice",
                    a.index
                )));
            }
            if a.offset < b.end() && b.offset < a.end() {
                return Err(RenderError::InvalidLayout(format!(
                    "attributes {} and {} overlap",
                    a.index, b.index
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packed_layout_offsets_and_stride() {
        let layout = VertexLayout::packed(&[
            (0, 3, AttributeType::Float),
            (1, 3, AttributeType::Float),
            (2, 2, AttributeType::Float),
        ])
        .unwrap();

        let offsets: Vec<u32> = layout.attributes().iter().map(|a| a.offset).collect();
        assert_eq!(offsets, vec![0, 12, 24]);
        assert_eq!(layout.stride(), 32);
    }

    #[test]
    fn test_overlapping_attributes_rejected() {
        let result = VertexLayout::new(
            vec![VertexAttribute::float(0, 3, 0), VertexAttribute::float(1, 2, 8)],
            20,
        );
        assert!(matches!(result, Err(RenderError::InvalidLayout(_))));
    }

    #[test]
    fn test_attribute_past_stride_rejected() {
        let result = VertexLayout::new(vec![VertexAttribute::float(0, 4, 0)], 12);
        assert!(matches!(result, Err(RenderError::InvalidLayout(_))));
    }

    #[test]
    fn test_duplicate_location_rejected() {
        let result = VertexLayout::new(
            vec![VertexAttribute::float(0, 2, 0), VertexAttribute::float(0, 2, 8)],
            16,
        );
        assert!(matches!(result, Err(RenderError::InvalidLayout(_))));
    }

    #[test]
    fn test_component_count_range() {
        assert!(VertexLayout::new(vec![VertexAttribute::float(0, 0, 0)], 16).is_err());
        assert!(VertexLayout::new(vec![VertexAttribute::float(0, 5, 0)], 32).is_err());
    }

    #[test]
    fn test_padding_between_attributes_allowed() {
        let layout = VertexLayout::new(
            vec![
                VertexAttribute::float(0, 3, 0),
                VertexAttribute::new(1, 4, AttributeType::UnsignedByte, 16).normalized(),
            ],
            20,
        );
        assert!(layout.is_ok());
    }

    #[test]
    fn test_attribute_type_dispatch() {
        assert!(AttributeType::Float.is_floating_point());
        assert!(AttributeType::Double.is_floating_point());
        assert!(!AttributeType::Int.is_floating_point());
        assert!(!AttributeType::UnsignedByte.is_floating_point());
    }
}
