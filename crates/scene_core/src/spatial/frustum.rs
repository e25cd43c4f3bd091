//! View frustum for visibility culling

use super::aabb::AABB;
use crate::foundation::math::{Mat4, Vec3, Vec4};

/// Plane defined by normal and distance from origin
///
/// Points with a non-negative signed distance are on the inner side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Normal vector (unit length)
    pub normal: Vec3,
    /// Distance from origin along the normal
    pub distance: f32,
}

impl Plane {
    /// Create a new plane from normal and distance, normalizing both
    pub fn new(normal: Vec3, distance: f32) -> Self {
        Self::from_coefficients(Vec4::new(normal.x, normal.y, normal.z, distance))
    }

    /// Plane `ax + by + cz + d = 0` from `(a, b, c, d)`, normalized
    pub fn from_coefficients(coefficients: Vec4) -> Self {
        let normal = coefficients.xyz();
        let length = normal.magnitude();
        if length <= f32::EPSILON {
            return Self {
                normal: Vec3::zeros(),
                distance: coefficients.w,
            };
        }
        Self {
            normal: normal / length,
            distance: coefficients.w / length,
        }
    }

    /// Calculate signed distance from plane to point
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(&point) + self.distance
    }
}

/// Frustum for visibility culling
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    /// Six planes defining the frustum (left, right, bottom, top, near, far)
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Create a frustum from six planes
    pub const fn new(planes: [Plane; 6]) -> Self {
        Self { planes }
    }

    /// Extract frustum planes from a view-projection matrix
    ///
    /// Gribb-Hartmann extraction for column-vector matrices with a `[0, 1]`
    /// clip-space depth range.
    pub fn from_matrix(vp_matrix: &Mat4) -> Self {
        let row = |i: usize| -> Vec4 { vp_matrix.row(i).transpose() };
        let (r0, r1, r2, r3) = (row(0), row(1), row(2), row(3));

        Self {
            planes: [
                Plane::from_coefficients(r3 + r0), // left
                Plane::from_coefficients(r3 - r0), // right
                Plane::from_coefficients(r3 + r1), // bottom
                Plane::from_coefficients(r3 - r1), // top
                Plane::from_coefficients(r2),      // near
                Plane::from_coefficients(r3 - r2), // far
            ],
        }
    }

    /// Check if an AABB is inside or intersects the frustum
    ///
    /// Conservative: boxes near a frustum corner may be reported as
    /// intersecting when they are not. Empty boxes never intersect.
    pub fn intersects_aabb(&self, aabb: &AABB) -> bool {
        if aabb.is_empty() {
            return false;
        }

        for plane in &self.planes {
            // Corner of the box furthest along the plane normal
            let mut p = aabb.min;
            if plane.normal.x >= 0.0 { p.x = aabb.max.x; }
            if plane.normal.y >= 0.0 { p.y = aabb.max.y; }
            if plane.normal.z >= 0.0 { p.z = aabb.max.z; }

            // If this point is outside the plane, the entire AABB is outside
            if plane.distance_to_point(p) < 0.0 {
                return false;
            }
        }

        true
    }

    /// Check if a point lies inside the frustum
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.distance_to_point(point) >= 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn cube(center: Vec3, half: f32) -> AABB {
        AABB::from_center_extents(center, Vec3::repeat(half))
    }

    #[test]
    fn test_plane_normalizes() {
        let plane = Plane::new(Vec3::new(0.0, 2.0, 0.0), 4.0);
        assert_relative_eq!(plane.normal, Vec3::y());
        assert_relative_eq!(plane.distance, 2.0);
        assert_relative_eq!(plane.distance_to_point(Vec3::new(0.0, 1.0, 0.0)), 3.0);
    }

    #[test]
    fn test_identity_matrix_frustum_is_clip_volume() {
        // Identity view-projection: x, y in [-1, 1], z in [0, 1]
        let frustum = Frustum::from_matrix(&Mat4::identity());

        assert!(frustum.contains_point(Vec3::new(0.0, 0.0, 0.5)));
        assert!(!frustum.contains_point(Vec3::new(0.0, 0.0, -0.5)));
        assert!(!frustum.contains_point(Vec3::new(1.5, 0.0, 0.5)));

        assert!(frustum.intersects_aabb(&cube(Vec3::new(0.0, 0.0, 0.5), 0.1)));
        assert!(frustum.intersects_aabb(&cube(Vec3::new(1.0, 0.0, 0.5), 0.25)));
        assert!(!frustum.intersects_aabb(&cube(Vec3::new(3.0, 0.0, 0.5), 0.25)));
        assert!(!frustum.intersects_aabb(&cube(Vec3::new(0.0, 0.0, 2.0), 0.25)));
        assert!(!frustum.intersects_aabb(&AABB::EMPTY));
    }

    #[test]
    fn test_translated_view_moves_frustum() {
        // Camera moved +10 on X: view matrix translates the world by -10
        let view = Mat4::new_translation(&Vec3::new(-10.0, 0.0, 0.0));
        let frustum = Frustum::from_matrix(&view);

        assert!(frustum.intersects_aabb(&cube(Vec3::new(10.0, 0.0, 0.5), 0.1)));
        assert!(!frustum.intersects_aabb(&cube(Vec3::new(0.0, 0.0, 0.5), 0.1)));
    }
}
