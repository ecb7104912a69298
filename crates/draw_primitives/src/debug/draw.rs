//! Retained debug shapes
//!
//! Shapes are queued with a lifetime and turned into [`DebugRenderer`]
//! batches on [`DebugDrawQueue::flush`], one batch per topology and colour.
//! Temporary shapes expire as [`DebugDrawQueue::update`] ticks them down;
//! persistent shapes stay until removed by key.

use slotmap::{new_key_type, SlotMap};

use crate::debug::renderer::{DebugMode, DebugRenderer};
use crate::foundation::math::{Mat4, Vec3, Vec4};
use crate::render::{RenderResult, Vertex};

new_key_type! {
    /// Key of a persistent debug shape
    pub struct DebugShapeKey;
}

/// Edges of a box as pairs of corner indices
const BOX_EDGES: [u32; 24] = [
    0, 1, 1, 3, 3, 2, 2, 0, // -z face
    4, 5, 5, 7, 7, 6, 6, 4, // +z face
    0, 4, 1, 5, 2, 6, 3, 7,
];

/// Debug shape primitives that can be rendered for visualization
#[derive(Clone, Debug, PartialEq)]
pub enum DebugShape {
    /// Line segment from start to end
    Line {
        /// Start point
        start: Vec3,
        /// End point
        end: Vec3,
        /// RGBA colour
        colour: Vec4,
        /// Seconds left
        duration: f32,
    },

    /// Single point
    Point {
        /// Position
        position: Vec3,
        /// RGBA colour
        colour: Vec4,
        /// Seconds left
        duration: f32,
    },

    /// Filled triangle with counter-clockwise winding
    Triangle {
        /// Corners
        corners: [Vec3; 3],
        /// RGBA colour
        colour: Vec4,
        /// Seconds left
        duration: f32,
    },

    /// Axis-aligned wire box at center with half-extents
    Box {
        /// Center
        center: Vec3,
        /// Half-extents
        extents: Vec3,
        /// RGBA colour
        colour: Vec4,
        /// Seconds left
        duration: f32,
    },
}

impl DebugShape {
    /// Get remaining duration
    pub fn duration(&self) -> f32 {
        match self {
            Self::Line { duration, .. }
            | Self::Point { duration, .. }
            | Self::Triangle { duration, .. }
            | Self::Box { duration, .. } => *duration,
        }
    }

    /// Set duration (returns modified shape)
    pub fn with_duration(mut self, new_duration: f32) -> Self {
        *self.duration_mut() = new_duration;
        self
    }

    /// Decrease duration by delta_time, returns true if expired
    pub fn tick(&mut self, delta_time: f32) -> bool {
        let duration = self.duration_mut();
        *duration -= delta_time;
        *duration <= 0.0
    }

    fn duration_mut(&mut self) -> &mut f32 {
        match self {
            Self::Line { duration, .. }
            | Self::Point { duration, .. }
            | Self::Triangle { duration, .. }
            | Self::Box { duration, .. } => duration,
        }
    }

    /// Shape colour
    pub fn colour(&self) -> Vec4 {
        match self {
            Self::Line { colour, .. }
            | Self::Point { colour, .. }
            | Self::Triangle { colour, .. }
            | Self::Box { colour, .. } => *colour,
        }
    }

    /// Batch topology the shape is drawn with
    pub fn mode(&self) -> DebugMode {
        match self {
            Self::Point { .. } => DebugMode::Points,
            Self::Line { .. } | Self::Box { .. } => DebugMode::Lines,
            Self::Triangle { .. } => DebugMode::Triangles,
        }
    }

    /// Append world-space vertices and indices relative to `vertices.len()`
    pub fn append_geometry(&self, vertices: &mut Vec<Vertex>, indices: &mut Vec<u32>) {
        let base = vertices.len() as u32;
        match self {
            Self::Line { start, end, .. } => {
                vertices.extend([Vertex::at((*start).into()), Vertex::at((*end).into())]);
                indices.extend([base, base + 1]);
            }
            Self::Point { position, .. } => {
                vertices.push(Vertex::at((*position).into()));
                indices.push(base);
            }
            Self::Triangle { corners: [a, b, c], .. } => {
                let normal = (b - a).cross(&(c - a)).try_normalize(f32::EPSILON).unwrap_or_else(Vec3::y);
                vertices.extend(
                    [a, b, c]
                        .into_iter()
                        .map(|p| Vertex::new((*p).into(), normal.into(), [0.0, 0.0])),
                );
                indices.extend([base, base + 1, base + 2]);
            }
            Self::Box { center, extents, .. } => {
                for corner in 0..8u32 {
                    let sign = |bit: u32| if corner & bit == 0 { -1.0 } else { 1.0 };
                    let offset = Vec3::new(sign(1) * extents.x, sign(2) * extents.y, sign(4) * extents.z);
                    vertices.push(Vertex::at((center + offset).into()));
                }
                indices.extend(BOX_EDGES.iter().map(|i| base + i));
            }
        }
    }
}

/// Debug drawing queue for rendering debug shapes
///
/// Temporary shapes expire after their duration; persistent shapes remain
/// until explicitly removed.
pub struct DebugDrawQueue {
    /// Temporary shapes that expire after their duration
    temporary_shapes: Vec<DebugShape>,

    /// Persistent shapes that remain until manually removed
    persistent_shapes: SlotMap<DebugShapeKey, DebugShape>,

    /// Master enable/disable flag
    pub enabled: bool,
}

impl DebugDrawQueue {
    /// Create an empty, enabled queue
    pub fn new() -> Self {
        Self {
            temporary_shapes: Vec::new(),
            persistent_shapes: SlotMap::with_key(),
            enabled: true,
        }
    }

    fn push(&mut self, shape: DebugShape) {
        if self.enabled {
            self.temporary_shapes.push(shape);
        }
    }

    /// Draw a line segment (temporary)
    pub fn draw_line(&mut self, start: Vec3, end: Vec3, colour: Vec4, duration: f32) {
        self.push(DebugShape::Line { start, end, colour, duration });
    }

    /// Draw a point (temporary)
    pub fn draw_point(&mut self, position: Vec3, colour: Vec4, duration: f32) {
        self.push(DebugShape::Point { position, colour, duration });
    }

    /// Draw a triangle (temporary)
    pub fn draw_triangle(&mut self, corners: [Vec3; 3], colour: Vec4, duration: f32) {
        self.push(DebugShape::Triangle { corners, colour, duration });
    }

    /// Draw an axis-aligned wire box (temporary)
    pub fn draw_box(&mut self, center: Vec3, extents: Vec3, colour: Vec4, duration: f32) {
        self.push(DebugShape::Box { center, extents, colour, duration });
    }

    /// Draw a persistent shape that remains until explicitly removed
    ///
    /// Returns `None` while the queue is disabled.
    pub fn draw_persistent(&mut self, shape: DebugShape) -> Option<DebugShapeKey> {
        self.enabled.then(|| self.persistent_shapes.insert(shape))
    }

    /// Remove a persistent shape
    pub fn remove_persistent(&mut self, key: DebugShapeKey) -> Option<DebugShape> {
        self.persistent_shapes.remove(key)
    }

    /// Clear all persistent shapes
    pub fn clear_all_persistent(&mut self) {
        self.persistent_shapes.clear();
    }

    /// Update shape lifetimes and remove expired temporary shapes
    pub fn update(&mut self, delta_time: f32) {
        if !self.enabled {
            return;
        }

        self.temporary_shapes.retain_mut(|shape| !shape.tick(delta_time));
    }

    /// All live shapes, temporary first
    pub fn shapes(&self) -> impl Iterator<Item = &DebugShape> {
        self.temporary_shapes.iter().chain(self.persistent_shapes.values())
    }

    /// Get the number of active shapes
    pub fn shape_count(&self) -> usize {
        self.temporary_shapes.len() + self.persistent_shapes.len()
    }

    /// Clear all shapes (temporary and persistent)
    pub fn clear(&mut self) {
        self.temporary_shapes.clear();
        self.persistent_shapes.clear();
    }

    /// Draw every shape through `renderer`, one batch per topology and colour
    ///
    /// The renderer's colour is restored afterwards, also when a batch fails.
    /// Returns the number of batches drawn.
    pub fn flush(&self, renderer: &mut DebugRenderer) -> RenderResult<usize> {
        if !self.enabled {
            return Ok(0);
        }

        let mut batches: Vec<(DebugMode, Vec4, Vec<Vertex>, Vec<u32>)> = Vec::new();
        for shape in self.shapes() {
            let (mode, colour) = (shape.mode(), shape.colour());
            let position = batches.iter().position(|(m, c, _, _)| *m == mode && *c == colour);
            let index = position.unwrap_or_else(|| {
                batches.push((mode, colour, Vec::new(), Vec::new()));
                batches.len() - 1
            });
            let (_, _, vertices, indices) = &mut batches[index];
            shape.append_geometry(vertices, indices);
        }

        let previous_colour = renderer.colour();
        let result = batches.iter().try_for_each(|(mode, colour, vertices, indices)| {
            renderer.set_colour(*colour);
            renderer.begin(*mode)?;
            renderer.draw(vertices, indices, &Mat4::identity())?;
            renderer.finish()
        });
        renderer.set_colour(previous_colour);
        result?;

        log::trace!("Flushed {} debug shapes in {} batches", self.shape_count(), batches.len());
        Ok(batches.len())
    }
}

impl Default for DebugDrawQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DebugRendererConfig;
    use crate::render::backends::{GlCall, RecordingContext};
    use crate::render::{PrimitiveTopology, ProgramHandle, ShaderProgram, SharedContext, UniformValue};
    use approx::assert_relative_eq;
    use std::rc::Rc;

    fn red() -> Vec4 {
        Vec4::new(1.0, 0.0, 0.0, 1.0)
    }

    fn blue() -> Vec4 {
        Vec4::new(0.0, 0.0, 1.0, 1.0)
    }

    fn renderer() -> (Rc<RecordingContext>, DebugRenderer) {
        crate::foundation::logging::try_init();
        let recorder = Rc::new(RecordingContext::new());
        let ctx: SharedContext = recorder.clone();
        let shader = ShaderProgram::new(ctx.clone(), ProgramHandle(7));
        let renderer = DebugRenderer::new(ctx, shader, &DebugRendererConfig::default()).unwrap();
        recorder.take_calls();
        (recorder, renderer)
    }

    #[test]
    fn test_temporary_shape_expiration() {
        let mut queue = DebugDrawQueue::new();

        // Add a shape with 1 second duration
        queue.draw_line(Vec3::zeros(), Vec3::x(), red(), 1.0);
        assert_eq!(queue.shape_count(), 1);

        queue.update(0.5);
        assert_eq!(queue.shape_count(), 1);

        // Total 1.1 seconds
        queue.update(0.6);
        assert_eq!(queue.shape_count(), 0);
    }

    #[test]
    fn test_zero_duration_lasts_one_update() {
        let mut queue = DebugDrawQueue::new();
        queue.draw_point(Vec3::zeros(), red(), 0.0);
        assert_eq!(queue.shape_count(), 1);
        queue.update(0.016);
        assert_eq!(queue.shape_count(), 0);
    }

    #[test]
    fn test_persistent_shapes() {
        let mut queue = DebugDrawQueue::new();

        let key = queue
            .draw_persistent(DebugShape::Box {
                center: Vec3::zeros(),
                extents: Vec3::new(1.0, 1.0, 1.0),
                colour: red(),
                duration: 0.0,
            })
            .unwrap();
        assert_eq!(queue.shape_count(), 1);

        for _ in 0..100 {
            queue.update(1.0);
        }
        assert_eq!(queue.shape_count(), 1);

        assert!(queue.remove_persistent(key).is_some());
        assert!(queue.remove_persistent(key).is_none());
        assert_eq!(queue.shape_count(), 0);
    }

    #[test]
    fn test_disabled_queue_ignores_shapes() {
        let mut queue = DebugDrawQueue::new();
        queue.enabled = false;
        queue.draw_line(Vec3::zeros(), Vec3::x(), red(), 1.0);
        let key = queue.draw_persistent(DebugShape::Point { position: Vec3::zeros(), colour: red(), duration: 1.0 });
        assert!(key.is_none());
        assert_eq!(queue.shape_count(), 0);
    }

    #[test]
    fn test_box_geometry() {
        let shape = DebugShape::Box {
            center: Vec3::new(0.0, 2.0, 0.0),
            extents: Vec3::new(1.0, 1.0, 1.0),
            colour: red(),
            duration: 1.0,
        };
        let (mut vertices, mut indices) = (vec![Vertex::default()], Vec::new());
        shape.append_geometry(&mut vertices, &mut indices);

        assert_eq!(vertices.len(), 9);
        assert_eq!(indices.len(), 24);
        assert!(indices.iter().all(|&i| (1..9).contains(&i)));
        assert_relative_eq!(vertices[1].position[1], 1.0);
        assert_relative_eq!(vertices[8].position[1], 3.0);
    }

    #[test]
    fn test_triangle_normal() {
        let shape = DebugShape::Triangle {
            corners: [Vec3::zeros(), Vec3::x(), Vec3::y()],
            colour: red(),
            duration: 1.0,
        };
        let (mut vertices, mut indices) = (Vec::new(), Vec::new());
        shape.append_geometry(&mut vertices, &mut indices);
        assert_eq!(indices, vec![0, 1, 2]);
        assert_relative_eq!(vertices[0].normal[2], 1.0);
    }

    #[test]
    fn test_flush_groups_by_mode_and_colour() {
        let (recorder, mut renderer) = renderer();
        let mut queue = DebugDrawQueue::new();
        queue.draw_line(Vec3::zeros(), Vec3::x(), red(), 1.0);
        queue.draw_box(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0), red(), 1.0);
        queue.draw_line(Vec3::zeros(), Vec3::y(), blue(), 1.0);
        queue.draw_point(Vec3::zeros(), red(), 1.0);

        assert_eq!(queue.flush(&mut renderer).unwrap(), 3);

        let draws = recorder.draw_calls();
        assert_eq!(draws.len(), 3);
        assert!(matches!(
            draws[0],
            GlCall::DrawElements { primitive: PrimitiveTopology::Lines, count: 26, .. }
        ));
        assert!(matches!(
            draws[2],
            GlCall::DrawElements { primitive: PrimitiveTopology::Points, count: 1, .. }
        ));

        let colours: Vec<UniformValue> = recorder
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                GlCall::SetUniform { name, value, .. } if name == "u_colour" => Some(value),
                _ => None,
            })
            .collect();
        assert_eq!(
            colours,
            vec![
                UniformValue::Vec4([1.0, 0.0, 0.0, 1.0]),
                UniformValue::Vec4([0.0, 0.0, 1.0, 1.0]),
                UniformValue::Vec4([1.0, 0.0, 0.0, 1.0]),
            ]
        );
        assert_eq!(renderer.colour(), Vec4::new(1.0, 1.0, 1.0, 1.0));
    }

    #[test]
    fn test_flush_disabled_draws_nothing() {
        let (recorder, mut renderer) = renderer();
        let mut queue = DebugDrawQueue::new();
        queue.draw_point(Vec3::zeros(), red(), 1.0);
        queue.enabled = false;

        assert_eq!(queue.flush(&mut renderer).unwrap(), 0);
        assert!(recorder.calls().is_empty());
    }

    #[test]
    fn test_flush_inside_open_batch_fails() {
        let (_, mut renderer) = renderer();
        let mut queue = DebugDrawQueue::new();
        queue.draw_point(Vec3::zeros(), red(), 1.0);

        renderer.set_colour(blue());
        renderer.begin(DebugMode::Lines).unwrap();
        assert!(queue.flush(&mut renderer).is_err());
        assert_eq!(renderer.colour(), blue());
        assert_eq!(renderer.current_mode(), Some(DebugMode::Lines));
    }
}
