//! CPU-side mesh data
//!
//! [`MeshData`] is the read-only view [`GlMesh`](crate::render::GlMesh) uploads
//! from. The caller owns the bytes; the mesh only reads them for the duration
//! of an upload. [`MeshBuffers`] is the owned implementation used by the debug
//! renderer and by applications that build geometry in code.

use bytemuck::{Pod, Zeroable};

use crate::render::layout::{AttributeType, VertexAttribute, VertexLayout};

/// Shader location of [`Vertex::position`]
pub const POSITION_LOCATION: u32 = 0;
/// Shader location of [`Vertex::normal`]
pub const NORMAL_LOCATION: u32 = 1;
/// Shader location of [`Vertex::tex_coord`]
pub const TEX_COORD_LOCATION: u32 = 2;

/// Standard interleaved vertex: position, normal, texture coordinate
///
/// The `#[repr(C)]` attribute keeps the field order and offsets identical to
/// [`Vertex::layout`], which is what the GPU sees.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Vertex {
    /// Position in 3D space
    pub position: [f32; 3],

    /// Normal vector
    pub normal: [f32; 3],

    /// Texture coordinates
    pub tex_coord: [f32; 2],
}

impl Vertex {
    /// Create a new vertex
    pub const fn new(position: [f32; 3], normal: [f32; 3], tex_coord: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            tex_coord,
        }
    }

    /// Vertex with only a position; normal points up and UV is zero
    pub const fn at(position: [f32; 3]) -> Self {
        Self::new(position, [0.0, 1.0, 0.0], [0.0, 0.0])
    }

    /// Attribute layout matching the struct: locations 0, 1, 2 at offsets 0, 12, 24
    pub fn layout() -> VertexLayout {
        let attributes = vec![
            VertexAttribute::new(POSITION_LOCATION, 3, AttributeType::Float, 0),
            VertexAttribute::new(NORMAL_LOCATION, 3, AttributeType::Float, 12),
            VertexAttribute::new(TEX_COORD_LOCATION, 2, AttributeType::Float, 24),
        ];
        VertexLayout::new(attributes, std::mem::size_of::<Self>() as u32)
            .unwrap_or_else(|e| unreachable!("built-in vertex layout is valid: {e}"))
    }
}

/// Raw geometry read by a mesh upload
///
/// Indices are always 32-bit.
pub trait MeshData {
    /// Interleaved vertex bytes
    fn vertex_bytes(&self) -> &[u8];

    /// Index bytes (`u32` elements)
    fn index_bytes(&self) -> &[u8];

    /// Number of vertices
    fn vertex_count(&self) -> u32;

    /// Number of indices; zero means the mesh is drawn as arrays
    fn index_count(&self) -> u32;

    /// Size of the vertex data in bytes
    fn vertex_buffer_size(&self) -> usize {
        self.vertex_bytes().len()
    }

    /// Size of the index data in bytes
    fn index_buffer_size(&self) -> usize {
        self.index_bytes().len()
    }
}

/// Owned vertex and index arrays
#[derive(Debug, Clone, PartialEq)]
pub struct MeshBuffers<V: Pod = Vertex> {
    /// Vertex data
    pub vertices: Vec<V>,

    /// Index data
    pub indices: Vec<u32>,
}

impl<V: Pod> MeshBuffers<V> {
    /// Create a new mesh
    pub fn new(vertices: Vec<V>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Mesh with preallocated space for `vertices` and `indices` elements
    pub fn with_capacity(vertices: usize, indices: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertices),
            indices: Vec::with_capacity(indices),
        }
    }

    /// Empty both arrays, keeping their allocations
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
    }

    /// True when there is no vertex data
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

impl<V: Pod> Default for MeshBuffers<V> {
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new())
    }
}

impl<V: Pod> MeshData for MeshBuffers<V> {
    fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }

    fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }
}

impl MeshBuffers<Vertex> {
    /// Unit cube centered at the origin, 8 vertices and 36 indices
    ///
    /// Vertices sit at ±1.0 on each axis with face normals for front and back;
    /// good enough for tests and debug visualisation.
    pub fn cube() -> Self {
        let vertices = vec![
            // Front face
            Vertex::new([-1.0, -1.0, 1.0], [0.0, 0.0, 1.0], [0.0, 0.0]),
            Vertex::new([1.0, -1.0, 1.0], [0.0, 0.0, 1.0], [1.0, 0.0]),
            Vertex::new([1.0, 1.0, 1.0], [0.0, 0.0, 1.0], [1.0, 1.0]),
            Vertex::new([-1.0, 1.0, 1.0], [0.0, 0.0, 1.0], [0.0, 1.0]),
            // Back face
            Vertex::new([-1.0, -1.0, -1.0], [0.0, 0.0, -1.0], [1.0, 0.0]),
            Vertex::new([-1.0, 1.0, -1.0], [0.0, 0.0, -1.0], [1.0, 1.0]),
            Vertex::new([1.0, 1.0, -1.0], [0.0, 0.0, -1.0], [0.0, 1.0]),
            Vertex::new([1.0, -1.0, -1.0], [0.0, 0.0, -1.0], [0.0, 0.0]),
        ];

        let indices = vec![
            // Front
            0, 1, 2, 2, 3, 0,
            // Back
            4, 5, 6, 6, 7, 4,
            // Left
            4, 0, 3, 3, 5, 4,
            // Right
            1, 7, 6, 6, 2, 1,
            // Top
            3, 2, 6, 6, 5, 3,
            // Bottom
            4, 7, 1, 1, 0, 4,
        ];

        Self::new(vertices, indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_layout_matches_struct() {
        let layout = Vertex::layout();
        assert_eq!(layout.stride(), 32);
        assert_eq!(layout.attributes().len(), 3);
        assert_eq!(layout.attributes()[2].offset, 24);
    }

    #[test]
    fn test_mesh_buffer_sizes() {
        let cube = MeshBuffers::<Vertex>::cube();
        assert_eq!(cube.vertex_count(), 8);
        assert_eq!(cube.index_count(), 36);
        assert_eq!(cube.vertex_buffer_size(), 8 * 32);
        assert_eq!(cube.index_buffer_size(), 36 * 4);
    }

    #[test]
    fn test_cube_indices_in_range() {
        let cube = MeshBuffers::<Vertex>::cube();
        assert!(cube.indices.iter().all(|&i| i < cube.vertex_count()));
    }

    #[test]
    fn test_clear_keeps_allocation() {
        let mut mesh: MeshBuffers = MeshBuffers::with_capacity(16, 32);
        mesh.vertices.push(Vertex::at([0.0, 0.0, 0.0]));
        mesh.indices.push(0);
        mesh.clear();
        assert!(mesh.is_empty());
        assert!(mesh.vertices.capacity() >= 16);
    }
}
