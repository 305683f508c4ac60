//! 3D UI Components
//!
//! Descriptors of the elements a [`UiScene`](crate::UiScene) can hold.

pub mod panel;
pub mod text3d;

pub use panel::Panel3D;
pub use text3d::Text3D;

use glam::{Mat4, Quat, Vec3};

/// Transform relative to the parent element (or the UI root)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform3D {
    /// Translation
    pub position: Vec3,
    /// Rotation
    pub rotation: Quat,
    /// Scale
    pub scale: Vec3,
}

impl Default for Transform3D {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform3D {
    /// Pure translation
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Builder: Set scale
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Builder: Set rotation
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Scale, then rotate, then translate
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}
