use bytemuck::{Pod, Zeroable};

use crate::components::sprite::SpriteComponent;
use crate::components::transform::Transform;

/// Per-instance data uploaded to a batch's instance buffer.
/// 12 floats = 48 bytes stride; each instance is expanded to a 6-vertex quad.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct SpriteInstance {
    /// World position.
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Rotation in radians.
    pub rotation: f32,
    /// World-space rendered size.
    pub scale_x: f32,
    pub scale_y: f32,
    /// Atlas column.
    pub sprite_col: f32,
    /// Atlas row.
    pub atlas_row: f32,
    /// UV cell span (1.0 = single cell, 2.0 = 2x2 block).
    pub cell_span: f32,
    /// Opacity (0.0 = invisible, 1.0 = opaque, >1.0 for HDR).
    pub alpha: f32,
    _pad: [f32; 2],
}

impl SpriteInstance {
    pub const FLOATS: usize = 12;
    pub const STRIDE_BYTES: usize = Self::FLOATS * 4;
    /// Vertices drawn per instance (two triangles).
    pub const VERTICES: u32 = 6;

    pub fn from_parts(transform: &Transform, sprite: &SpriteComponent) -> Self {
        Self {
            x: transform.position.x,
            y: transform.position.y,
            z: transform.position.z,
            rotation: transform.rotation,
            scale_x: transform.scale.x,
            scale_y: transform.scale.y,
            sprite_col: sprite.col,
            atlas_row: sprite.row,
            cell_span: sprite.cell_span,
            alpha: sprite.alpha,
            _pad: [0.0; 2],
        }
    }

    /// Raw bytes for upload.
    pub fn as_bytes(instances: &[SpriteInstance]) -> &[u8] {
        bytemuck::cast_slice(instances)
    }
}
