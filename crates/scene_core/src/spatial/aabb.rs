//! Axis-aligned bounding box
//!
//! Value type with an explicit empty sentinel (`min = +inf`, `max = -inf`),
//! so encapsulating anything into an empty box yields that thing.

use crate::foundation::math::{Mat4, Point3, Vec3};

/// Coordinate axis a bounding tree node splits along
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SplitAxis {
    /// X axis
    #[default]
    X,
    /// Y axis
    Y,
    /// Z axis
    Z,
}

impl SplitAxis {
    /// All axes in tie-break order
    pub const ALL: [Self; 3] = [Self::X, Self::Y, Self::Z];

    /// Component index of this axis
    pub const fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
        }
    }
}

/// Axis-Aligned Bounding Box for spatial queries
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl Default for AABB {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl AABB {
    /// The empty box: identity element of [`encapsulate`](Self::encapsulate)
    pub const EMPTY: Self = Self {
        min: Vec3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY),
        max: Vec3::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
    };

    /// Create a new AABB from min and max points
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// The empty box
    pub const fn empty() -> Self {
        Self::EMPTY
    }

    /// Create an AABB centered at a point with given extents
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        Self {
            min: center - extents,
            max: center + extents,
        }
    }

    /// Smallest box containing every point (empty for no points)
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vec3>) -> Self {
        let mut aabb = Self::EMPTY;
        for point in points {
            aabb.grow_to_include(*point);
        }
        aabb
    }

    /// Whether the box contains no points
    ///
    /// True for the sentinel and for boxes inverted by a negative
    /// [`modify`](Self::modify).
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Full size along each axis (`max - min`)
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Get the extents (half-size) of the AABB
    pub fn extents(&self) -> Vec3 {
        self.size() * 0.5
    }

    /// Get the centre of the AABB
    pub fn centre(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Enclosed volume (zero for empty boxes)
    pub fn volume(&self) -> f32 {
        if self.is_empty() {
            return 0.0;
        }
        let size = self.size();
        size.x * size.y * size.z
    }

    /// Size along `axis`
    pub fn axis_extent(&self, axis: SplitAxis) -> f32 {
        self.max[axis.index()] - self.min[axis.index()]
    }

    /// Centre coordinate along `axis`
    pub fn axis_centre(&self, axis: SplitAxis) -> f32 {
        (self.min[axis.index()] + self.max[axis.index()]) * 0.5
    }

    /// Axis with the greatest extent, ties resolved X, then Y, then Z
    pub fn longest_axis(&self) -> SplitAxis {
        let size = self.size();
        if size.x >= size.y && size.x >= size.z {
            SplitAxis::X
        } else if size.y >= size.z {
            SplitAxis::Y
        } else {
            SplitAxis::Z
        }
    }

    /// Component-wise union of two boxes
    pub fn encapsulate(&self, other: &Self) -> Self {
        Self {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    /// Grow in place to include `point`
    pub fn grow_to_include(&mut self, point: Vec3) {
        self.min = self.min.inf(&point);
        self.max = self.max.sup(&point);
    }

    /// Inflate in place by `amount` on every side
    ///
    /// A negative `amount` shrinks the box and may invert it; callers that
    /// shrink must check [`is_empty`](Self::is_empty) themselves.
    pub fn modify(&mut self, amount: f32) {
        let delta = Vec3::repeat(amount);
        self.min -= delta;
        self.max += delta;
    }

    /// Check if this AABB contains a point
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y &&
        point.z >= self.min.z && point.z <= self.max.z
    }

    /// Check if `other` lies entirely inside this box (empty boxes are contained everywhere)
    pub fn contains(&self, other: &Self) -> bool {
        other.is_empty()
            || (self.contains_point(other.min) && self.contains_point(other.max))
    }

    /// Check if this AABB intersects another AABB (touching faces count)
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x &&
        self.min.y <= other.max.y && self.max.y >= other.min.y &&
        self.min.z <= other.max.z && self.max.z >= other.min.z
    }

    /// Test ray intersection with this AABB using slab method
    /// Returns the distance to the entry point if the ray intersects, None otherwise
    ///
    /// A ray parallel to a slab hits only if its origin lies within that slab,
    /// faces included.
    pub fn intersect_ray(&self, ray_origin: Vec3, ray_dir: Vec3) -> Option<f32> {
        if self.is_empty() {
            return None;
        }

        let mut tmin = f32::NEG_INFINITY;
        let mut tmax = f32::INFINITY;
        for axis in 0..3 {
            let (origin, dir) = (ray_origin[axis], ray_dir[axis]);
            let (lo, hi) = (self.min[axis], self.max[axis]);

            if dir == 0.0 {
                if origin < lo || origin > hi {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / dir;
            let (t1, t2) = ((lo - origin) * inv, (hi - origin) * inv);
            tmin = tmin.max(t1.min(t2));
            tmax = tmax.min(t1.max(t2));
        }

        // Entry distance, or 0 when the origin is already inside
        if tmax >= tmin && tmax >= 0.0 {
            Some(tmin.max(0.0))
        } else {
            None
        }
    }

    /// Bounds of this box after transformation by `matrix`
    ///
    /// Evaluates the eight corners under the affine transform. Empty stays empty.
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        if self.is_empty() {
            return Self::EMPTY;
        }

        let (lo, hi) = (self.min, self.max);
        let mut out = Self::EMPTY;
        for corner in 0..8 {
            let point = Point3::new(
                if corner & 1 == 0 { lo.x } else { hi.x },
                if corner & 2 == 0 { lo.y } else { hi.y },
                if corner & 4 == 0 { lo.z } else { hi.z },
            );
            out.grow_to_include(matrix.transform_point(&point).coords);
        }
        out
    }
}

impl FromIterator<AABB> for AABB {
    fn from_iter<I: IntoIterator<Item = AABB>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::EMPTY, |acc, aabb| acc.encapsulate(&aabb))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    fn unit_box_at(x: f32, y: f32, z: f32) -> AABB {
        AABB::from_center_extents(Vec3::new(x, y, z), Vec3::repeat(0.5))
    }

    #[test]
    fn test_aabb_contains_point() {
        let aabb = AABB::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0));

        assert!(aabb.contains_point(Vec3::zeros()));
        assert!(aabb.contains_point(Vec3::new(0.5, 0.5, 0.5)));
        assert!(!aabb.contains_point(Vec3::new(2.0, 0.0, 0.0)));
    }

    #[test]
    fn test_aabb_intersects() {
        let aabb1 = AABB::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(2.0, 2.0, 2.0));
        let aabb2 = AABB::new(Vec3::new(1.0, 1.0, 1.0), Vec3::new(3.0, 3.0, 3.0));
        let aabb3 = AABB::new(Vec3::new(5.0, 5.0, 5.0), Vec3::new(7.0, 7.0, 7.0));
        let touching = AABB::new(Vec3::new(2.0, 0.0, 0.0), Vec3::new(4.0, 2.0, 2.0));

        assert!(aabb1.intersects(&aabb2));
        assert!(!aabb1.intersects(&aabb3));
        assert!(aabb1.intersects(&touching));
        assert!(!aabb1.intersects(&AABB::EMPTY));
        assert!(!AABB::EMPTY.intersects(&AABB::EMPTY));
    }

    #[test]
    fn test_derived_quantities() {
        let aabb = AABB::new(Vec3::new(-2.0, 0.0, 1.0), Vec3::new(4.0, 2.0, 2.0));
        assert_relative_eq!(aabb.size(), Vec3::new(6.0, 2.0, 1.0));
        assert_relative_eq!(aabb.extents(), Vec3::new(3.0, 1.0, 0.5));
        assert_relative_eq!(aabb.centre(), Vec3::new(1.0, 1.0, 1.5));
        assert_relative_eq!(aabb.volume(), 12.0);
        assert_eq!(AABB::EMPTY.volume(), 0.0);
    }

    #[test]
    fn test_modify_inflates_symmetrically() {
        let mut aabb = AABB::new(Vec3::new(-6.3, -2.5, -2.0), Vec3::new(12.6, 3.46, 8.1));
        let size_before = aabb.size();
        aabb.modify(5.3);

        assert_relative_eq!(aabb.min, Vec3::new(-11.6, -7.8, -7.3), epsilon = EPSILON);
        assert_relative_eq!(aabb.max, Vec3::new(17.9, 8.76, 13.4), epsilon = EPSILON);
        assert!(aabb.size().iter().zip(size_before.iter()).all(|(a, b)| a >= b));
    }

    #[test]
    fn test_modify_negative_may_invert() {
        let mut aabb = unit_box_at(0.0, 0.0, 0.0);
        aabb.modify(-1.0);
        assert!(aabb.is_empty());
    }

    #[test]
    fn test_encapsulate_known_boxes() {
        let a = AABB::new(Vec3::new(-22.33, -5.25, -9.0), Vec3::new(22.223, 1.53, 5.4));
        let b = AABB::new(Vec3::new(-10.5, -16.6, -8.2), Vec3::new(8.43, 3.5, 12.43));

        let mut aabb = a;
        aabb = aabb.encapsulate(&b);

        assert_relative_eq!(aabb.min, Vec3::new(-22.33, -16.6, -9.0), epsilon = EPSILON);
        assert_relative_eq!(aabb.max, Vec3::new(22.223, 3.5, 12.43), epsilon = EPSILON);
    }

    #[test]
    fn test_encapsulate_algebra() {
        let a = unit_box_at(0.0, 0.0, 0.0);
        let b = AABB::new(Vec3::new(3.0, -1.0, 2.0), Vec3::new(4.0, 5.0, 2.5));
        let c = unit_box_at(-7.0, 2.0, 9.0);

        assert_eq!(AABB::EMPTY.encapsulate(&a), a);
        assert_eq!(a.encapsulate(&AABB::EMPTY), a);
        assert_eq!(a.encapsulate(&b), b.encapsulate(&a));
        assert_eq!(a.encapsulate(&b).encapsulate(&c), a.encapsulate(&b.encapsulate(&c)));

        let ab = a.encapsulate(&b);
        assert!(ab.volume() >= a.volume());
        assert!(ab.volume() >= b.volume());
        assert!(ab.contains(&a) && ab.contains(&b));
    }

    #[test]
    fn test_grow_to_include_matches_zero_size_box() {
        let mut grown = unit_box_at(0.0, 0.0, 0.0);
        let point = Vec3::new(3.0, -4.0, 0.25);
        let expected = grown.encapsulate(&AABB::new(point, point));

        grown.grow_to_include(point);
        assert_eq!(grown, expected);

        let mut from_empty = AABB::empty();
        from_empty.grow_to_include(point);
        assert_eq!(from_empty, AABB::new(point, point));
    }

    #[test]
    fn test_longest_axis_tie_breaks() {
        assert_eq!(AABB::new(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0)).longest_axis(), SplitAxis::X);
        assert_eq!(AABB::new(Vec3::zeros(), Vec3::new(1.0, 2.0, 2.0)).longest_axis(), SplitAxis::Y);
        assert_eq!(AABB::new(Vec3::zeros(), Vec3::new(1.0, 1.0, 3.0)).longest_axis(), SplitAxis::Z);
    }

    #[test]
    fn test_transformed_by_translation_and_rotation() {
        let aabb = AABB::new(Vec3::new(-1.0, -2.0, -3.0), Vec3::new(1.0, 2.0, 3.0));
        let matrix = Mat4::new_translation(&Vec3::new(10.0, 0.0, 0.0))
            * Mat4::from_axis_angle(&Vec3::z_axis(), std::f32::consts::FRAC_PI_2);

        let out = aabb.transformed(&matrix);
        assert_relative_eq!(out.min, Vec3::new(8.0, -1.0, -3.0), epsilon = EPSILON);
        assert_relative_eq!(out.max, Vec3::new(12.0, 1.0, 3.0), epsilon = EPSILON);
        assert!(AABB::EMPTY.transformed(&matrix).is_empty());
    }

    #[test]
    fn test_ray_intersection() {
        let aabb = unit_box_at(5.0, 0.0, 0.0);
        let hit = aabb.intersect_ray(Vec3::zeros(), Vec3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(hit.unwrap(), 4.5, epsilon = EPSILON);
        assert!(aabb.intersect_ray(Vec3::zeros(), Vec3::new(-1.0, 0.0, 0.0)).is_none());
        assert!(AABB::EMPTY.intersect_ray(Vec3::zeros(), Vec3::x()).is_none());
    }

    #[test]
    fn test_ray_grazing_a_face_hits() {
        let aabb = AABB::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(2.0, 2.0, 2.0));

        // Travels along the y = 0 face
        let along_face = aabb.intersect_ray(Vec3::new(-1.0, 0.0, 1.0), Vec3::x());
        assert_relative_eq!(along_face.unwrap(), 1.0, epsilon = EPSILON);

        // Travels along an edge
        let along_edge = aabb.intersect_ray(Vec3::new(1.0, 2.0, -3.0), Vec3::z());
        assert_relative_eq!(along_edge.unwrap(), 3.0, epsilon = EPSILON);

        // Parallel but just outside the slab
        assert!(aabb.intersect_ray(Vec3::new(-1.0, -0.01, 1.0), Vec3::x()).is_none());
    }

    #[test]
    fn test_collect_boxes() {
        let boxes = [unit_box_at(0.0, 0.0, 0.0), unit_box_at(4.0, 0.0, 0.0)];
        let union: AABB = boxes.iter().copied().collect();
        assert_relative_eq!(union.min, Vec3::new(-0.5, -0.5, -0.5));
        assert_relative_eq!(union.max, Vec3::new(4.5, 0.5, 0.5));

        let none: AABB = std::iter::empty::<AABB>().collect();
        assert!(none.is_empty());
    }
}
