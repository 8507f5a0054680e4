use std::collections::HashMap;

use crate::api::error::EngineError;
use crate::api::types::{MaterialId, PipelineId, ResourceSetId, TextureId};
use crate::assets::manifest::{AssetManifest, ClipLayout, TextureDescriptor};
use crate::components::animation::{AnimationClip, SharedClip};
use crate::components::layer::RenderLayer;
use crate::components::material::{Material, PipelineAsset, SharedMaterial};
use crate::components::sprite::SpriteComponent;

/// Registry of named assets, built from an AssetManifest.
///
/// Handles are assigned in manifest order: the first texture is
/// `TextureId(0)`, the first pipeline `PipelineId(0)`, and so on.
#[derive(Debug, Default)]
pub struct AssetRegistry {
    textures: HashMap<String, TextureId>,
    atlases: Vec<TextureDescriptor>,
    pipelines: HashMap<String, PipelineAsset>,
    materials: HashMap<String, SharedMaterial>,
    clips: HashMap<String, SharedClip>,
    sprites: HashMap<String, SpriteComponent>,
}

impl AssetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a parsed AssetManifest, resolving every
    /// cross-reference by name.
    pub fn from_manifest(manifest: &AssetManifest) -> Result<Self, EngineError> {
        let mut registry = Self::new();

        for (index, desc) in manifest.textures.iter().enumerate() {
            registry.textures.insert(desc.name.clone(), TextureId(index as u32));
        }
        registry.atlases = manifest.textures.clone();

        for (index, desc) in manifest.pipelines.iter().enumerate() {
            registry
                .pipelines
                .insert(desc.name.clone(), PipelineAsset::new(PipelineId(index as u32), desc.blend));
        }

        for (index, desc) in manifest.materials.iter().enumerate() {
            let pipeline = registry.pipeline(&desc.pipeline)?;
            let mut material = Material::new(MaterialId(index as u32), pipeline);
            if let Some(order) = desc.render_order {
                material = material.with_render_order(order);
            }
            for set in &desc.resource_sets {
                material = material.with_resource_set(ResourceSetId(*set));
            }
            registry.materials.insert(desc.name.clone(), material.into_shared());
        }

        for (name, desc) in &manifest.clips {
            let clip = match &desc.layout {
                ClipLayout::Horizontal { row, start_col, count } => {
                    AnimationClip::horizontal_strip(name.clone(), *row as f32, *start_col as f32, *count, desc.fps)
                }
                ClipLayout::Vertical { col, start_row, count } => {
                    AnimationClip::vertical_strip(name.clone(), *col as f32, *start_row as f32, *count, desc.fps)
                }
                ClipLayout::Frames { frames } => AnimationClip::from_frames(
                    name.clone(),
                    frames.iter().map(|[c, r]| (*c as f32, *r as f32)).collect(),
                    desc.fps,
                ),
            };
            if clip.frame_count() == 0 || !(clip.sample_rate > 0.0) {
                return Err(EngineError::EmptyClip(name.clone()));
            }
            registry.clips.insert(name.clone(), clip.into_shared());
        }

        for (name, desc) in &manifest.sprites {
            let mut sprite = SpriteComponent::new(registry.texture(&desc.texture)?, registry.material(&desc.material)?)
                .with_layer(RenderLayer(desc.layer))
                .with_cell(desc.col as f32, desc.row as f32);
            sprite.cell_span = desc.span as f32;
            registry.sprites.insert(name.clone(), sprite);
        }

        log::debug!(
            "asset registry: {} textures, {} pipelines, {} materials, {} clips",
            registry.textures.len(),
            registry.pipelines.len(),
            registry.materials.len(),
            registry.clips.len()
        );
        Ok(registry)
    }

    /// Parse a manifest and build the registry in one step.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        Self::from_manifest(&AssetManifest::from_json(json)?)
    }

    pub fn texture(&self, name: &str) -> Result<TextureId, EngineError> {
        self.textures
            .get(name)
            .copied()
            .ok_or_else(|| EngineError::UnknownTexture(name.to_string()))
    }

    /// Atlas layout of a texture handle.
    pub fn atlas(&self, id: TextureId) -> Option<&TextureDescriptor> {
        self.atlases.get(id.0 as usize)
    }

    pub fn pipeline(&self, name: &str) -> Result<PipelineAsset, EngineError> {
        self.pipelines
            .get(name)
            .copied()
            .ok_or_else(|| EngineError::UnknownPipeline(name.to_string()))
    }

    pub fn material(&self, name: &str) -> Result<SharedMaterial, EngineError> {
        self.materials
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::UnknownMaterial(name.to_string()))
    }

    pub fn clip(&self, name: &str) -> Result<SharedClip, EngineError> {
        self.clips
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::UnknownClip(name.to_string()))
    }

    /// Look up a named sprite. Returns None if not found.
    pub fn sprite(&self, name: &str) -> Option<&SpriteComponent> {
        self.sprites.get(name)
    }

    /// Register a clip built in code.
    pub fn insert_clip(&mut self, clip: AnimationClip) -> SharedClip {
        let shared = clip.into_shared();
        self.clips.insert(shared.name.clone(), shared.clone());
        shared
    }
}
