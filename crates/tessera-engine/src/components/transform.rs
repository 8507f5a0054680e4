use glam::{Vec2, Vec3};

/// World transform of an entity as the batcher sees it.
///
/// `position.z` is the world Z used for depth ordering of transparent sprites.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    /// Rotation in radians.
    pub rotation: f32,
    /// World-space rendered size.
    pub scale: Vec2,
    /// Static entities never move after they are batched.
    pub is_static: bool,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: 0.0,
            scale: Vec2::ONE,
            is_static: false,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn z(&self) -> f32 {
        self.position.z
    }
}
