//! Scrollbar thumb geometry.

use glam::{Mat4, Vec2, Vec3};
use serde::Serialize;

use super::node::{Axis, Inset, MaxScroll};

/// Default scrollbar thickness in pixels.
pub const DEFAULT_SCROLLBAR_WIDTH: f32 = 10.0;

/// Thumb of one scrollbar, relative to the element centre (+Y up), in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ScrollbarGeometry {
    /// Centre of the thumb.
    pub position: Vec2,
    /// Thumb size; zero when the axis does not scroll.
    pub size: Vec2,
}

impl ScrollbarGeometry {
    /// Whether the thumb has any area.
    pub fn is_visible(&self) -> bool {
        self.size.x > 0.0 && self.size.y > 0.0
    }
}

/// Thumb geometry for the scrollbar along `axis`.
///
/// The thumb shrinks as content grows but never below `thickness`, and slides linearly
/// along the track inside the border. The bar sits at the bottom edge for `X` and the
/// right edge for `Y`.
pub fn compute_scrollbar_geometry(
    axis: Axis,
    thickness: f32,
    size: Vec2,
    max_scroll: MaxScroll,
    border_inset: Inset,
    position: Vec2,
) -> ScrollbarGeometry {
    let main = axis.index();
    let cross = axis.other().index();
    let Some(max) = max_scroll[main] else {
        return ScrollbarGeometry::default();
    };

    let track = size[main] - border_inset[cross] - border_inset[cross + 2];
    let thumb = thickness.max(track * track / (max + track));
    let travel = track - thumb;
    let progress = if max > 0.0 {
        (position[main] / max).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let mut center = Vec2::ZERO;
    center[main] =
        size[main] * 0.5 - thumb * 0.5 - border_inset[(main + 3) % 4] - travel * progress;
    center[cross] = size[cross] * 0.5 - thickness * 0.5 - border_inset[cross + 1];
    if axis == Axis::X {
        center = -center;
    }

    let mut extent = Vec2::ZERO;
    extent[main] = thumb;
    extent[cross] = thickness;
    ScrollbarGeometry {
        position: center,
        size: extent,
    }
}

/// Transform of scrolled content: shifts by the scroll position (pixels, +Y down) scaled
/// to world units, then applies the element's global transform.
pub fn scroll_matrix(position: Vec2, pixel_size: f32, global: &Mat4) -> Mat4 {
    *global
        * Mat4::from_translation(Vec3::new(
            -position.x * pixel_size,
            position.y * pixel_size,
            0.0,
        ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIZE: Vec2 = Vec2::new(200.0, 100.0);

    #[test]
    fn test_thumb_at_start_of_vertical_track() {
        let bar = compute_scrollbar_geometry(
            Axis::Y,
            10.0,
            SIZE,
            [None, Some(100.0)],
            [0.0; 4],
            Vec2::ZERO,
        );
        // Track 100, content 200: half-size thumb at the top right.
        assert_eq!(bar.size, Vec2::new(10.0, 50.0));
        assert_eq!(bar.position, Vec2::new(95.0, 25.0));
    }

    #[test]
    fn test_thumb_at_end_of_vertical_track() {
        let bar = compute_scrollbar_geometry(
            Axis::Y,
            10.0,
            SIZE,
            [None, Some(100.0)],
            [0.0; 4],
            Vec2::new(0.0, 250.0),
        );
        assert_eq!(bar.position, Vec2::new(95.0, -25.0));
    }

    #[test]
    fn test_horizontal_thumb_sits_on_bottom_edge() {
        let bar = compute_scrollbar_geometry(
            Axis::X,
            10.0,
            SIZE,
            [Some(200.0), None],
            [0.0; 4],
            Vec2::ZERO,
        );
        assert_eq!(bar.size, Vec2::new(100.0, 10.0));
        assert_eq!(bar.position, Vec2::new(-50.0, -45.0));
    }

    #[test]
    fn test_thumb_never_thinner_than_thickness() {
        let bar = compute_scrollbar_geometry(
            Axis::Y,
            10.0,
            SIZE,
            [None, Some(1.0e6)],
            [0.0; 4],
            Vec2::ZERO,
        );
        assert_eq!(bar.size.y, 10.0);
    }

    #[test]
    fn test_border_shrinks_track() {
        let bar = compute_scrollbar_geometry(
            Axis::Y,
            10.0,
            SIZE,
            [None, Some(80.0)],
            [10.0, 5.0, 10.0, 0.0],
            Vec2::ZERO,
        );
        // Track 80 with 80 overflow.
        assert_eq!(bar.size.y, 40.0);
        assert_eq!(bar.position, Vec2::new(90.0, 20.0));
    }

    #[test]
    fn test_unscrollable_axis_has_no_thumb() {
        let bar = compute_scrollbar_geometry(Axis::X, 10.0, SIZE, [None, None], [0.0; 4], Vec2::ZERO);
        assert!(!bar.is_visible());
    }

    #[test]
    fn test_scroll_matrix_moves_content_up() {
        let m = scroll_matrix(Vec2::new(10.0, 20.0), 0.01, &Mat4::IDENTITY);
        let p = m.transform_point3(Vec3::ZERO);
        assert!((p - Vec3::new(-0.1, 0.2, 0.0)).length() < 1e-6);
    }
}
