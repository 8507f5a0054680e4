use std::fmt;

use crate::api::types::{BatchTag, MaterialId, TextureId};
use crate::components::layer::RenderLayer;
use crate::components::material::Material;
use crate::components::sprite::{SpriteComponent, SpriteIdentity};
use crate::components::transform::Transform;

/// World Z quantized to a fixed number of steps per unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ZKey(pub i64);

impl ZKey {
    pub fn quantize(z: f32, steps_per_unit: f32) -> Self {
        ZKey((z * steps_per_unit).round() as i64)
    }
}

/// Composite key deciding which sprites share one draw call.
///
/// Two sprites batch together iff layer, texture, material instance,
/// staticness and tag are equal and, for transparent materials, their
/// quantized world Z is equal too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BatchKey {
    pub layer: RenderLayer,
    pub texture: TextureId,
    pub material: MaterialId,
    pub is_static: bool,
    /// Present only when the material's pipeline is transparent.
    pub z: Option<ZKey>,
    pub tag: BatchTag,
}

impl BatchKey {
    pub fn new(
        layer: RenderLayer,
        texture: TextureId,
        material: &Material,
        transform: &Transform,
        tag: BatchTag,
        z_steps_per_unit: f32,
    ) -> Self {
        let z = material
            .is_transparent()
            .then(|| ZKey::quantize(transform.z(), z_steps_per_unit));
        Self {
            layer,
            texture,
            material: material.instance_id,
            is_static: transform.is_static,
            z,
            tag,
        }
    }

    pub fn for_sprite(transform: &Transform, sprite: &SpriteComponent, tag: BatchTag, z_steps_per_unit: f32) -> Self {
        Self::new(sprite.layer, sprite.texture, &sprite.material, transform, tag, z_steps_per_unit)
    }

    pub fn for_identity(transform: &Transform, identity: &SpriteIdentity, tag: BatchTag, z_steps_per_unit: f32) -> Self {
        Self::new(identity.layer, identity.texture, identity.material(), transform, tag, z_steps_per_unit)
    }
}

impl fmt::Display for BatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}_{}",
            self.layer.0,
            self.texture.0,
            self.material.0,
            u8::from(self.is_static)
        )?;
        if let Some(z) = self.z {
            write!(f, "_{}", z.0)?;
        }
        if self.tag != BatchTag::NONE {
            write!(f, "_{}", self.tag.0)?;
        }
        Ok(())
    }
}
