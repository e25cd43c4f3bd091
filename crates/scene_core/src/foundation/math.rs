//! Math utilities and types
//!
//! Provides fundamental math types for the transform hierarchy and spatial index.
//! Matrices follow nalgebra's column-vector convention: a point is transformed
//! as `M * p`, so a node's world matrix is `parent_world * local`.

pub use nalgebra::{Matrix3, Matrix4, Quaternion, Unit, UnitQuaternion, Vector3, Vector4};

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

/// Quaternion type for rotations
pub type Quat = UnitQuaternion<f32>;

/// Transform representing position, rotation, and scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Position in 3D space
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform from all three components
    pub const fn new(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a transform with position and rotation
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            ..Default::default()
        }
    }

    /// Builder pattern: Set scale (uniform)
    pub fn with_uniform_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::repeat(scale);
        self
    }

    /// Builder pattern: Set scale (non-uniform)
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Convert to a transformation matrix
    ///
    /// Scale is applied first, then rotation, then translation.
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Create a transform from a transformation matrix
    ///
    /// Assumes the matrix carries no shear. Axes with zero scale decompose to
    /// an identity rotation on that axis.
    pub fn from_matrix(matrix: &Mat4) -> Self {
        let position = Vec3::new(matrix.m14, matrix.m24, matrix.m34);

        let scale_x = Vec3::new(matrix.m11, matrix.m21, matrix.m31).magnitude();
        let scale_y = Vec3::new(matrix.m12, matrix.m22, matrix.m32).magnitude();
        let scale_z = Vec3::new(matrix.m13, matrix.m23, matrix.m33).magnitude();
        let scale = Vec3::new(scale_x, scale_y, scale_z);

        let safe = |s: f32| if s > f32::EPSILON { s } else { 1.0 };
        let (sx, sy, sz) = (safe(scale_x), safe(scale_y), safe(scale_z));
        let rotation_matrix = Mat3::new(
            matrix.m11 / sx, matrix.m12 / sy, matrix.m13 / sz,
            matrix.m21 / sx, matrix.m22 / sy, matrix.m23 / sz,
            matrix.m31 / sx, matrix.m32 / sy, matrix.m33 / sz,
        );
        let rotation = Quat::from_matrix(&rotation_matrix);

        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Apply this transform to a point
    pub fn transform_point(&self, point: &Point3) -> Point3 {
        self.to_matrix().transform_point(point)
    }
}

/// Math utility functions
pub mod utils {
    use super::Mat4;

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees.to_radians()
    }

    /// Convert radians to degrees
    pub fn rad_to_deg(radians: f32) -> f32 {
        radians.to_degrees()
    }

    /// Largest absolute element-wise difference between two matrices
    pub fn max_abs_diff(a: &Mat4, b: &Mat4) -> f32 {
        a.iter()
            .zip(b.iter())
            .map(|(x, y)| (x - y).abs())
            .fold(0.0, f32::max)
    }

    /// Element-wise matrix comparison within `epsilon`
    pub fn approx_eq_mat4(a: &Mat4, b: &Mat4, epsilon: f32) -> bool {
        max_abs_diff(a, b) <= epsilon
    }
}
