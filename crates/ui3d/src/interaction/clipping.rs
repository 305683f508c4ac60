//! Half-space planes and ancestor clip rectangles.

use glam::{Mat3, Mat4, Vec2, Vec3};

/// Determinants below this are treated as singular transforms.
const SINGULAR_EPSILON: f32 = 1e-12;

/// Plane in Hessian normal form: points `p` with `normal · p + constant == 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Unit normal pointing into the kept half-space.
    pub normal: Vec3,
    /// Signed offset from the origin.
    pub constant: f32,
}

impl Plane {
    /// Plane through `point` with the given normal.
    pub fn from_normal_and_point(normal: Vec3, point: Vec3) -> Self {
        let normal = normal.normalize_or_zero();
        Self {
            normal,
            constant: -point.dot(normal),
        }
    }

    /// Signed distance from the plane; positive on the side the normal points to.
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.constant
    }

    /// Transform the plane by `matrix`. Returns `None` for singular transforms.
    pub fn transformed(&self, matrix: &Mat4) -> Option<Self> {
        let linear = Mat3::from_mat4(*matrix);
        if linear.determinant().abs() < SINGULAR_EPSILON {
            return None;
        }
        let normal_matrix = linear.inverse().transpose();
        let reference = matrix.transform_point3(self.normal * -self.constant);
        let normal = (normal_matrix * self.normal).try_normalize()?;
        Some(Self {
            normal,
            constant: -reference.dot(normal),
        })
    }

    /// Intersection of a ray with the plane, as the ray parameter `t >= 0`.
    pub fn intersect_ray(&self, origin: Vec3, direction: Vec3) -> Option<f32> {
        let denom = self.normal.dot(direction);
        if denom.abs() < f32::EPSILON {
            return None;
        }
        let t = -(self.distance_to_point(origin)) / denom;
        (t >= 0.0).then_some(t)
    }
}

/// The four edges of the unit square centred on the origin, normals pointing inwards.
///
/// Order: left, right, bottom, top.
pub fn unit_square_sides() -> [Plane; 4] {
    [
        Plane::from_normal_and_point(Vec3::X, Vec3::new(-0.5, 0.0, 0.0)),
        Plane::from_normal_and_point(Vec3::NEG_X, Vec3::new(0.5, 0.0, 0.0)),
        Plane::from_normal_and_point(Vec3::Y, Vec3::new(0.0, -0.5, 0.0)),
        Plane::from_normal_and_point(Vec3::NEG_Y, Vec3::new(0.0, 0.5, 0.0)),
    ]
}

/// Visible region contributed by clipping ancestors, expressed in the root group's
/// local frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipRect {
    /// Lower-left corner.
    pub min: Vec2,
    /// Upper-right corner.
    pub max: Vec2,
}

impl ClipRect {
    /// Rectangle from two corners in any order.
    pub fn from_corners(a: Vec2, b: Vec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Bounds of a panel of `size` placed by `local_matrix` (relative to the root group).
    pub fn from_panel(size: Vec2, local_matrix: &Mat4) -> Self {
        let half = size * 0.5;
        let corners = [
            Vec3::new(-half.x, -half.y, 0.0),
            Vec3::new(half.x, -half.y, 0.0),
            Vec3::new(half.x, half.y, 0.0),
            Vec3::new(-half.x, half.y, 0.0),
        ];
        let mut min = Vec2::splat(f32::INFINITY);
        let mut max = Vec2::splat(f32::NEG_INFINITY);
        for corner in corners {
            let p = local_matrix.transform_point3(corner).truncate();
            min = min.min(p);
            max = max.max(p);
        }
        Self { min, max }
    }

    /// Region visible through both rectangles. Disjoint inputs give an empty rectangle.
    pub fn intersection(&self, other: &ClipRect) -> ClipRect {
        let min = self.min.max(other.min);
        let max = self.max.min(other.max).max(min);
        ClipRect { min, max }
    }

    /// Narrow `self` by an optional parent clip rectangle.
    pub fn within(self, parent: Option<&ClipRect>) -> ClipRect {
        match parent {
            Some(parent) => self.intersection(parent),
            None => self,
        }
    }

    /// Size of the rectangle.
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    /// Returns true when the rectangle has no area.
    pub fn is_empty(&self) -> bool {
        let size = self.size();
        size.x <= 0.0 || size.y <= 0.0
    }

    /// Whether a point (root-local frame, z ignored) lies inside or on the boundary.
    pub fn contains(&self, point: Vec2) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Bounding half-spaces in the root-local frame. Order: left, right, bottom, top.
    pub fn planes(&self) -> [Plane; 4] {
        [
            Plane::from_normal_and_point(Vec3::X, self.min.extend(0.0)),
            Plane::from_normal_and_point(Vec3::NEG_X, self.max.extend(0.0)),
            Plane::from_normal_and_point(Vec3::Y, self.min.extend(0.0)),
            Plane::from_normal_and_point(Vec3::NEG_Y, self.max.extend(0.0)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plane_transform_keeps_distances_in_world_units() {
        let left = unit_square_sides()[0];
        let scaled = Mat4::from_scale(Vec3::new(4.0, 1.0, 1.0));
        let world = left.transformed(&scaled).unwrap();
        // Left edge now sits at x = -2.
        assert!(world.distance_to_point(Vec3::new(-2.0, 0.0, 0.0)).abs() < 1e-5);
        assert!((world.distance_to_point(Vec3::ZERO) - 2.0).abs() < 1e-5);
    }

    #[test]
    fn singular_transform_is_rejected() {
        let flat = Mat4::from_scale(Vec3::new(1.0, 0.0, 1.0));
        assert!(unit_square_sides()[2].transformed(&flat).is_none());
    }

    #[test]
    fn clip_rect_from_panel_and_intersection() {
        let outer = ClipRect::from_panel(Vec2::new(4.0, 2.0), &Mat4::IDENTITY);
        assert_eq!(outer.min, Vec2::new(-2.0, -1.0));
        let inner = ClipRect::from_panel(
            Vec2::new(2.0, 2.0),
            &Mat4::from_translation(Vec3::new(2.0, 0.0, 0.0)),
        );
        let visible = inner.within(Some(&outer));
        assert_eq!(visible.min, Vec2::new(1.0, -1.0));
        assert_eq!(visible.max, Vec2::new(2.0, 1.0));
        assert!(visible.contains(Vec2::new(1.5, 0.0)));
        assert!(!visible.contains(Vec2::new(2.5, 0.0)));
    }

    #[test]
    fn disjoint_rects_are_empty() {
        let a = ClipRect::from_corners(Vec2::ZERO, Vec2::ONE);
        let b = ClipRect::from_corners(Vec2::splat(2.0), Vec2::splat(3.0));
        assert!(a.intersection(&b).is_empty());
    }

    #[test]
    fn planes_agree_with_contains() {
        let rect = ClipRect::from_corners(Vec2::new(-1.0, -1.0), Vec2::new(1.0, 2.0));
        let inside = Vec3::new(0.5, 1.5, 0.0);
        let outside = Vec3::new(0.5, 2.5, 0.0);
        assert!(rect.planes().iter().all(|p| p.distance_to_point(inside) >= 0.0));
        assert!(rect.planes().iter().any(|p| p.distance_to_point(outside) < 0.0));
    }
}
