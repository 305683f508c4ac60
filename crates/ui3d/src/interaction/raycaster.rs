//! UI Raycasting - clipped ray intersection against flat UI panels

use std::cmp::Ordering;

use glam::{Mat4, Vec2, Vec3};
use meshui_core::{ElementId, OrderInfo};

use super::clipping::{unit_square_sides, ClipRect, Plane};

/// Distance bias per major index.
pub const HIT_BIAS_MAJOR: f32 = 0.01;
/// Distance bias per element type tier (tiers 0-5).
pub const HIT_BIAS_ELEMENT_TYPE: f32 = 0.001;
/// Distance bias per minor index.
pub const HIT_BIAS_MINOR: f32 = 0.00001;

/// A ray in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Start of the ray.
    pub origin: Vec3,
    /// Direction of travel; need not be normalized.
    pub direction: Vec3,
}

impl Ray {
    /// Create a ray.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }
}

/// Result of intersecting a ray with one panel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelHit {
    /// Distance from the ray origin, possibly reduced by the order bias
    pub distance: f32,
    /// World-space intersection point
    pub point: Vec3,
    /// Position on the panel, (0, 0) top-left to (1, 1) bottom-right
    pub uv: Vec2,
    /// World-space panel normal
    pub normal: Vec3,
}

/// A hit attributed to a UI element
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    /// Element that was hit
    pub element: ElementId,
    /// Geometry of the hit
    pub hit: PanelHit,
}

/// Convert screen coordinates to a ray in world space
pub fn screen_to_ray(
    screen_pos: (f32, f32),
    screen_size: (u32, u32),
    view_matrix: &Mat4,
    projection_matrix: &Mat4,
) -> Ray {
    // Normalized device coordinates (-1 to 1), Y flipped
    let x = (2.0 * screen_pos.0) / screen_size.0.max(1) as f32 - 1.0;
    let y = 1.0 - (2.0 * screen_pos.1) / screen_size.1.max(1) as f32;

    let ray_eye = projection_matrix
        .inverse()
        .project_point3(Vec3::new(x, y, -1.0));
    let ray_eye = Vec3::new(ray_eye.x, ray_eye.y, -1.0);

    let inv_view = view_matrix.inverse();
    Ray {
        origin: inv_view.transform_point3(Vec3::ZERO),
        direction: inv_view.transform_vector3(ray_eye).normalize_or_zero(),
    }
}

/// Intersect a ray with the unit panel (local XY square, centred, facing +Z) placed by
/// `matrix_world`.
///
/// Misses, parallel rays, rays starting behind the panel and degenerate transforms all
/// return `None`.
pub fn intersect_panel(ray: &Ray, matrix_world: &Mat4) -> Option<PanelHit> {
    let front = Plane {
        normal: Vec3::Z,
        constant: 0.0,
    }
    .transformed(matrix_world)?;
    if front.distance_to_point(ray.origin) <= 0.0 {
        return None;
    }
    let t = front.intersect_ray(ray.origin, ray.direction)?;
    let point = ray.origin + ray.direction * t;

    let mut distances = [0.0f32; 4];
    for (slot, side) in distances.iter_mut().zip(unit_square_sides()) {
        let side = side.transformed(matrix_world)?;
        *slot = side.distance_to_point(point);
        if *slot < 0.0 {
            return None;
        }
    }
    let [left, right, bottom, top] = distances;
    let width = left + right;
    let height = bottom + top;
    if width <= f32::EPSILON || height <= f32::EPSILON {
        return None;
    }

    Some(PanelHit {
        distance: point.distance(ray.origin),
        point,
        uv: Vec2::new(left / width, top / height),
        normal: front.normal,
    })
}

/// Distance bias that lets later-painted elements win ties between coincident panels.
pub fn order_distance_bias(order: &OrderInfo) -> f32 {
    order.major_index as f32 * HIT_BIAS_MAJOR
        + order.element_type.tier() as f32 * HIT_BIAS_ELEMENT_TYPE
        + order.minor_index as f32 * HIT_BIAS_MINOR
}

/// Post-process the hits appended since `first_new`: apply the order bias and drop hits
/// outside the ancestor clip rectangle (given in the frame of `root_matrix`).
pub fn filter_and_adjust(
    intersections: &mut Vec<Intersection>,
    first_new: usize,
    order: &OrderInfo,
    clip: Option<&ClipRect>,
    root_matrix: &Mat4,
) {
    let bias = order_distance_bias(order);
    let world_planes: Option<Vec<Option<Plane>>> = clip.map(|rect| {
        rect.planes()
            .iter()
            .map(|plane| plane.transformed(root_matrix))
            .collect()
    });

    for i in (first_new..intersections.len()).rev() {
        intersections[i].hit.distance -= bias;
        let Some(planes) = &world_planes else {
            continue;
        };
        let point = intersections[i].hit.point;
        let outside = planes.iter().any(|plane| match plane {
            Some(plane) => plane.distance_to_point(point) < 0.0,
            // A collapsed root cannot show anything.
            None => true,
        });
        if outside {
            intersections.remove(i);
        }
    }
}

/// A panel registered for hit-testing
#[derive(Debug, Clone)]
pub struct ClippedPanel {
    /// Element reported in hits
    pub element: ElementId,
    /// Paint order of the panel
    pub order: OrderInfo,
    /// Panel transform; the unit square is scaled to the panel size
    pub matrix_world: Mat4,
    /// Visible region of clipping ancestors, in the root frame
    pub clip: Option<ClipRect>,
    /// World transform of the UI root
    pub root_matrix: Mat4,
}

impl ClippedPanel {
    /// Append a hit for `ray` if it meets the visible part of the panel.
    pub fn raycast(&self, ray: &Ray, intersections: &mut Vec<Intersection>) {
        let first_new = intersections.len();
        if let Some(hit) = intersect_panel(ray, &self.matrix_world) {
            intersections.push(Intersection {
                element: self.element,
                hit,
            });
        }
        filter_and_adjust(
            intersections,
            first_new,
            &self.order,
            self.clip.as_ref(),
            &self.root_matrix,
        );
    }
}

/// Order hits nearest first. Equal distances go to the later element, which paints on
/// top of earlier siblings sharing its order.
pub fn sort_intersections(intersections: &mut [Intersection]) {
    intersections.sort_by(|a, b| {
        a.hit
            .distance
            .partial_cmp(&b.hit.distance)
            .unwrap_or(Ordering::Equal)
            .then(b.element.cmp(&a.element))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshui_core::{resolve_order, ElementType, ZIndexOffset};

    fn forward_ray(x: f32, y: f32) -> Ray {
        Ray::new(Vec3::new(x, y, 1.0), Vec3::NEG_Z)
    }

    #[test]
    fn center_hit_has_center_uv() {
        let hit = intersect_panel(&forward_ray(0.0, 0.0), &Mat4::IDENTITY).unwrap();
        assert!((hit.distance - 1.0).abs() < 1e-6);
        assert!((hit.uv - Vec2::splat(0.5)).length() < 1e-6);
        assert_eq!(hit.normal, Vec3::Z);
    }

    #[test]
    fn uv_follows_non_uniform_scale() {
        let matrix = Mat4::from_scale(Vec3::new(4.0, 2.0, 1.0));
        let hit = intersect_panel(&forward_ray(1.0, -0.5), &matrix).unwrap();
        assert!((hit.uv.x - 0.75).abs() < 1e-5);
        // v grows downwards: the point sits a quarter above the bottom edge.
        assert!((hit.uv.y - 0.75).abs() < 1e-5);
    }

    #[test]
    fn misses_are_rejected() {
        assert!(intersect_panel(&forward_ray(0.6, 0.0), &Mat4::IDENTITY).is_none());
        // Behind the panel.
        let behind = Ray::new(Vec3::new(0.0, 0.0, -1.0), Vec3::Z);
        assert!(intersect_panel(&behind, &Mat4::IDENTITY).is_none());
        // Parallel.
        let parallel = Ray::new(Vec3::new(0.0, 0.0, 1.0), Vec3::X);
        assert!(intersect_panel(&parallel, &Mat4::IDENTITY).is_none());
        // Degenerate transform.
        let flat = Mat4::from_scale(Vec3::new(0.0, 1.0, 1.0));
        assert!(intersect_panel(&forward_ray(0.0, 0.0), &flat).is_none());
        // Missing direction.
        let still = Ray::new(Vec3::new(0.0, 0.0, 1.0), Vec3::ZERO);
        assert!(intersect_panel(&still, &Mat4::IDENTITY).is_none());
    }

    #[test]
    fn bias_prefers_later_painted_element() {
        let background = resolve_order(None, ElementType::Panel, ZIndexOffset::NONE, None);
        let label = resolve_order(Some(&background), ElementType::Text, ZIndexOffset::NONE, None);
        let ray = forward_ray(0.0, 0.0);
        let mut hits = Vec::new();
        for (id, order) in [(1, background), (2, label)] {
            ClippedPanel {
                element: ElementId(id),
                order,
                matrix_world: Mat4::IDENTITY,
                clip: None,
                root_matrix: Mat4::IDENTITY,
            }
            .raycast(&ray, &mut hits);
        }
        sort_intersections(&mut hits);
        assert_eq!(hits[0].element, ElementId(2));
        assert!((hits[0].hit.distance - (1.0 - 5.0 * HIT_BIAS_ELEMENT_TYPE)).abs() < 1e-6);
    }

    #[test]
    fn equal_distance_goes_to_later_element() {
        let hit = intersect_panel(&forward_ray(0.0, 0.0), &Mat4::IDENTITY).unwrap();
        let mut hits: Vec<Intersection> = [3, 9, 5]
            .into_iter()
            .map(|id| Intersection {
                element: ElementId(id),
                hit,
            })
            .collect();
        sort_intersections(&mut hits);
        let ids: Vec<u64> = hits.iter().map(|h| h.element.0).collect();
        assert_eq!(ids, vec![9, 5, 3]);
    }

    #[test]
    fn clipped_hits_are_removed() {
        let panel = ClippedPanel {
            element: ElementId(7),
            order: OrderInfo::default(),
            matrix_world: Mat4::from_scale(Vec3::new(4.0, 4.0, 1.0)),
            clip: Some(ClipRect::from_corners(Vec2::splat(-1.0), Vec2::splat(1.0))),
            root_matrix: Mat4::IDENTITY,
        };
        let mut hits = Vec::new();
        panel.raycast(&forward_ray(0.5, 0.5), &mut hits);
        assert_eq!(hits.len(), 1);
        panel.raycast(&forward_ray(1.5, 0.0), &mut hits);
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn filter_only_touches_new_hits() {
        let existing = Intersection {
            element: ElementId(1),
            hit: PanelHit {
                distance: 3.0,
                point: Vec3::new(10.0, 0.0, 0.0),
                uv: Vec2::ZERO,
                normal: Vec3::Z,
            },
        };
        let mut hits = vec![existing];
        let order = OrderInfo {
            major_index: 2,
            ..OrderInfo::default()
        };
        let clip = ClipRect::from_corners(Vec2::splat(-1.0), Vec2::splat(1.0));
        filter_and_adjust(&mut hits, 1, &order, Some(&clip), &Mat4::IDENTITY);
        assert_eq!(hits, vec![existing]);
    }

    #[test]
    fn screen_center_ray_points_forward() {
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);
        let proj = Mat4::perspective_rh(60f32.to_radians(), 16.0 / 9.0, 0.1, 100.0);
        let ray = screen_to_ray((640.0, 360.0), (1280, 720), &view, &proj);
        assert!((ray.origin - Vec3::new(0.0, 0.0, 5.0)).length() < 1e-4);
        assert!((ray.direction - Vec3::NEG_Z).length() < 1e-4);
        let hit = intersect_panel(&ray, &Mat4::IDENTITY).unwrap();
        assert!((hit.uv - Vec2::splat(0.5)).length() < 1e-4);
    }
}
