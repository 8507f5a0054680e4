use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::types::{MaterialId, PipelineId, ResourceSetId};

/// Blend state of a pipeline asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    /// Depth-tested, no blending. Draw order inside a bucket is irrelevant.
    #[default]
    Opaque,
    /// Standard alpha blending (src-alpha, one-minus-src-alpha).
    Alpha,
    /// Additive blending for glow effects (src-alpha, one).
    Additive,
}

impl BlendMode {
    /// Blended pipelines must be drawn back-to-front.
    pub fn is_transparent(self) -> bool {
        !matches!(self, BlendMode::Opaque)
    }
}

/// A pipeline asset: a shader plus blend state, bound once per group of batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PipelineAsset {
    pub id: PipelineId,
    pub blend: BlendMode,
}

impl PipelineAsset {
    pub fn new(id: PipelineId, blend: BlendMode) -> Self {
        Self { id, blend }
    }

    pub fn is_transparent(&self) -> bool {
        self.blend.is_transparent()
    }
}

/// Well-known render order values carried by materials.
pub struct RenderOrder;

impl RenderOrder {
    pub const BACKGROUND: i32 = 1000;
    pub const GEOMETRY: i32 = 2000;
    pub const TRANSPARENT: i32 = 3000;
    pub const OVERLAY: i32 = 4000;
    /// Orders at or above this value are drawn in the post-process phase.
    pub const POST_PROCESS: i32 = 5000;
}

/// A material instance as seen by the batcher.
///
/// Only the identity, render order, pipeline and extra resource sets matter
/// here; shader parameters live with the rendering backend.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub instance_id: MaterialId,
    pub pipeline: PipelineAsset,
    pub render_order: i32,
    /// Bound after the texture set, in slot order starting at 1.
    pub resource_sets: Vec<ResourceSetId>,
}

impl Material {
    pub fn new(instance_id: MaterialId, pipeline: PipelineAsset) -> Self {
        let render_order = if pipeline.is_transparent() {
            RenderOrder::TRANSPARENT
        } else {
            RenderOrder::GEOMETRY
        };
        Self {
            instance_id,
            pipeline,
            render_order,
            resource_sets: Vec::new(),
        }
    }

    pub fn with_render_order(mut self, render_order: i32) -> Self {
        self.render_order = render_order;
        self
    }

    pub fn with_resource_set(mut self, set: ResourceSetId) -> Self {
        self.resource_sets.push(set);
        self
    }

    pub fn is_transparent(&self) -> bool {
        self.pipeline.is_transparent()
    }

    pub fn into_shared(self) -> SharedMaterial {
        Arc::new(self)
    }
}

/// Materials are shared between many sprites.
pub type SharedMaterial = Arc<Material>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_modes_classify_transparency() {
        assert!(!BlendMode::Opaque.is_transparent());
        assert!(BlendMode::Alpha.is_transparent());
        assert!(BlendMode::Additive.is_transparent());
    }

    #[test]
    fn default_render_order_follows_pipeline() {
        let opaque = Material::new(MaterialId(1), PipelineAsset::new(PipelineId(1), BlendMode::Opaque));
        let alpha = Material::new(MaterialId(2), PipelineAsset::new(PipelineId(2), BlendMode::Alpha));
        assert_eq!(opaque.render_order, RenderOrder::GEOMETRY);
        assert_eq!(alpha.render_order, RenderOrder::TRANSPARENT);
        assert!(alpha.render_order < RenderOrder::POST_PROCESS);
    }
}
