use crate::api::types::TextureId;
use crate::components::layer::RenderLayer;
use crate::components::material::{Material, SharedMaterial};

/// Sprite component: defines how an entity appears visually.
#[derive(Debug, Clone)]
pub struct SpriteComponent {
    /// Texture (atlas) this sprite samples from.
    pub texture: TextureId,
    /// Material instance; decides pipeline, render order and transparency.
    pub material: SharedMaterial,
    /// Layer the sprite is drawn in.
    pub layer: RenderLayer,
    /// Column in the atlas grid.
    pub col: f32,
    /// Row in the atlas grid.
    pub row: f32,
    /// Number of cells this sprite spans (1.0 = single cell, 2.0 = 2x2 block).
    pub cell_span: f32,
    /// Opacity (0.0 = invisible, 1.0 = opaque, >1.0 for HDR glow).
    pub alpha: f32,
    /// Disabled sprites are never batched.
    pub enabled: bool,
}

impl SpriteComponent {
    pub fn new(texture: TextureId, material: SharedMaterial) -> Self {
        Self {
            texture,
            material,
            layer: RenderLayer::default(),
            col: 0.0,
            row: 0.0,
            cell_span: 1.0,
            alpha: 1.0,
            enabled: true,
        }
    }

    pub fn with_layer(mut self, layer: RenderLayer) -> Self {
        self.layer = layer;
        self
    }

    pub fn with_cell(mut self, col: f32, row: f32) -> Self {
        self.col = col;
        self.row = row;
        self
    }

    /// Snapshot of the fields that decide batch membership.
    ///
    /// Take one before changing texture, material or layer and hand it to
    /// `SpriteBatchSystem::update_sprite_batch`.
    pub fn identity(&self) -> SpriteIdentity {
        SpriteIdentity {
            layer: self.layer,
            texture: self.texture,
            material: self.material.clone(),
        }
    }
}

/// The batch-relevant identity of a sprite at some point in time.
#[derive(Debug, Clone)]
pub struct SpriteIdentity {
    pub layer: RenderLayer,
    pub texture: TextureId,
    pub material: SharedMaterial,
}

impl SpriteIdentity {
    pub fn material(&self) -> &Material {
        &self.material
    }
}
