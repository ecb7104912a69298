//! Math utilities and types
//!
//! Provides the nalgebra aliases used by vertex data and debug drawing.

pub use nalgebra::{
    Vector2, Vector3, Vector4,
    Matrix3, Matrix4,
};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Extension trait for Mat4 with the transforms debug geometry needs
pub trait Mat4Ext {
    /// Transform a position, applying translation and the perspective divide
    fn transform_position(&self, position: [f32; 3]) -> [f32; 3];

    /// Transform a direction with the inverse-transpose of the upper 3x3 and normalize it
    ///
    /// Zero-length input and singular matrices leave the direction untransformed.
    fn transform_normal(&self, normal: [f32; 3]) -> [f32; 3];

    /// Inverse-transpose of the upper 3x3 block, if it is invertible
    fn normal_matrix(&self) -> Option<Mat3>;
}

impl Mat4Ext for Mat4 {
    fn transform_position(&self, position: [f32; 3]) -> [f32; 3] {
        let p = self.transform_point(&Point3::new(position[0], position[1], position[2]));
        [p.x, p.y, p.z]
    }

    fn transform_normal(&self, normal: [f32; 3]) -> [f32; 3] {
        let n = Vec3::new(normal[0], normal[1], normal[2]);
        let Some(matrix) = self.normal_matrix() else {
            return normal;
        };

        let transformed = matrix * n;
        let length = transformed.norm();
        if length <= f32::EPSILON {
            return normal;
        }
        let unit = transformed / length;
        [unit.x, unit.y, unit.z]
    }

    fn normal_matrix(&self) -> Option<Mat3> {
        let upper: Mat3 = self.fixed_view::<3, 3>(0, 0).into_owned();
        upper.try_inverse().map(|inverse| inverse.transpose())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-6;

    #[test]
    fn test_transform_position_applies_translation() {
        let m = Mat4::new_translation(&Vec3::new(1.0, 2.0, 3.0));
        let p = m.transform_position([1.0, 1.0, 1.0]);
        assert_relative_eq!(p[0], 2.0, epsilon = EPSILON);
        assert_relative_eq!(p[1], 3.0, epsilon = EPSILON);
        assert_relative_eq!(p[2], 4.0, epsilon = EPSILON);
    }

    #[test]
    fn test_transform_normal_ignores_translation_and_scale() {
        let m = Mat4::new_translation(&Vec3::new(5.0, 0.0, 0.0))
            * Mat4::new_nonuniform_scaling(&Vec3::new(2.0, 4.0, 1.0));
        let n = m.transform_normal([0.0, 1.0, 0.0]);
        assert_relative_eq!(n[0], 0.0, epsilon = EPSILON);
        assert_relative_eq!(n[1], 1.0, epsilon = EPSILON);
        assert_relative_eq!(n[2], 0.0, epsilon = EPSILON);
    }

    #[test]
    fn test_singular_matrix_keeps_normal() {
        let m = Mat4::zeros();
        assert_eq!(m.normal_matrix(), None);
        assert_eq!(m.transform_normal([0.0, 0.0, 1.0]), [0.0, 0.0, 1.0]);
    }
}
