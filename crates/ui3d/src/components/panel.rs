//! 3D Panel Component - Background quad for UI elements

use super::Transform3D;
use glam::{Mat4, Vec2, Vec3};
use meshui_core::{ElementType, InstancedGroupKey, ZIndexOffset};

/// Material used when none is set
pub const DEFAULT_MATERIAL: &str = "basic";

/// 3D Panel - A flat rectangle that can parent and clip other elements
#[derive(Debug, Clone)]
pub struct Panel3D {
    /// Panel transform relative to its parent
    pub transform: Transform3D,

    /// Panel size (width, height) in the parent's units
    pub size: Vec2,

    /// Background color
    pub color: [f32; 4],

    /// Whether the panel is visible and hittable
    pub visible: bool,

    /// Whether descendants are clipped to the panel bounds
    pub clip_children: bool,

    /// Explicit paint order offset
    pub z_index: ZIndexOffset,

    /// Material name; panels sharing a material batch together
    pub material: String,
}

impl Default for Panel3D {
    fn default() -> Self {
        Self {
            transform: Transform3D::default(),
            size: Vec2::new(2.0, 1.0),
            color: [0.1, 0.1, 0.1, 0.8], // Dark semi-transparent
            visible: true,
            clip_children: false,
            z_index: ZIndexOffset::NONE,
            material: DEFAULT_MATERIAL.to_string(),
        }
    }
}

impl Panel3D {
    /// Create a new 3D panel
    pub fn new(position: Vec3, width: f32, height: f32) -> Self {
        Self {
            transform: Transform3D::new(position),
            size: Vec2::new(width, height),
            ..Default::default()
        }
    }

    /// Builder: Set background color
    pub fn with_color(mut self, color: [f32; 4]) -> Self {
        self.color = color;
        self
    }

    /// Builder: Clip children to the panel
    pub fn with_clipping(mut self, clip_children: bool) -> Self {
        self.clip_children = clip_children;
        self
    }

    /// Builder: Set the paint order offset
    pub fn with_z_index(mut self, z_index: impl Into<ZIndexOffset>) -> Self {
        self.z_index = z_index.into();
        self
    }

    /// Builder: Set the material
    pub fn with_material(mut self, material: impl Into<String>) -> Self {
        self.material = material.into();
        self
    }

    /// Element type used for ordering
    pub fn element_type(&self) -> ElementType {
        ElementType::Panel
    }

    /// Batching key: panels only share a draw call with the same material
    pub fn group_key(&self) -> InstancedGroupKey {
        InstancedGroupKey::new().with("material", &self.material)
    }

    /// Matrix placing the unit quad, given the panel's frame
    pub fn mesh_matrix(&self, frame: &Mat4) -> Mat4 {
        *frame * Mat4::from_scale(self.size.extend(1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panel_creation() {
        let panel = Panel3D::new(Vec3::ZERO, 2.0, 1.0);
        assert_eq!(panel.size, Vec2::new(2.0, 1.0));
        assert!(panel.visible);
        assert!(!panel.clip_children);
    }

    #[test]
    fn test_panel_builder() {
        let panel = Panel3D::new(Vec3::ZERO, 2.0, 1.0)
            .with_color([1.0, 0.0, 0.0, 1.0])
            .with_clipping(true)
            .with_z_index(3)
            .with_material("glass");

        assert_eq!(panel.color, [1.0, 0.0, 0.0, 1.0]);
        assert!(panel.clip_children);
        assert_eq!(panel.z_index.major, 3);
        assert_eq!(panel.group_key().get("material"), Some("glass"));
    }

    #[test]
    fn test_group_key_compares_by_value() {
        let a = Panel3D::default();
        let b = Panel3D::new(Vec3::ONE, 1.0, 1.0);
        assert_eq!(a.group_key(), b.group_key());
        assert_ne!(a.group_key(), b.with_material("glass").group_key());
    }

    #[test]
    fn test_mesh_matrix_scales_unit_quad() {
        let panel = Panel3D::new(Vec3::ZERO, 4.0, 2.0);
        let corner = panel.mesh_matrix(&Mat4::IDENTITY).transform_point3(Vec3::new(0.5, 0.5, 0.0));
        assert_eq!(corner, Vec3::new(2.0, 1.0, 0.0));
    }
}
