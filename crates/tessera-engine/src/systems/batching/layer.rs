use std::collections::BTreeMap;

use crate::components::layer::RenderLayer;
use crate::components::material::PipelineAsset;
use crate::renderer::traits::RenderPhase;

use super::key::{BatchKey, ZKey};
use super::order::OrderRender;

/// Render-order space of one layer.
///
/// Buckets below the post-process threshold live in `order_keys` and draw in
/// the main phase; the rest live in `post_keys`. Both iterate ascending.
#[derive(Debug, Clone)]
pub struct LayerContext {
    pub layer: RenderLayer,
    post_process_threshold: i32,
    order_keys: BTreeMap<i32, OrderRender>,
    post_keys: BTreeMap<i32, OrderRender>,
}

impl LayerContext {
    pub fn new(layer: RenderLayer, post_process_threshold: i32) -> Self {
        Self {
            layer,
            post_process_threshold,
            order_keys: BTreeMap::new(),
            post_keys: BTreeMap::new(),
        }
    }

    pub fn phase_of(&self, render_order: i32) -> RenderPhase {
        if render_order >= self.post_process_threshold {
            RenderPhase::PostProcess
        } else {
            RenderPhase::Main
        }
    }

    fn buckets(&self, phase: RenderPhase) -> &BTreeMap<i32, OrderRender> {
        match phase {
            RenderPhase::Main => &self.order_keys,
            RenderPhase::PostProcess => &self.post_keys,
        }
    }

    fn buckets_mut(&mut self, render_order: i32) -> &mut BTreeMap<i32, OrderRender> {
        match self.phase_of(render_order) {
            RenderPhase::Main => &mut self.order_keys,
            RenderPhase::PostProcess => &mut self.post_keys,
        }
    }

    /// Buckets of `phase` in ascending render order.
    pub fn orders(&self, phase: RenderPhase) -> impl Iterator<Item = &OrderRender> {
        self.buckets(phase).values()
    }

    /// Render-order values of `phase`, ascending.
    pub fn keys(&self, phase: RenderPhase) -> impl Iterator<Item = i32> + '_ {
        self.buckets(phase).keys().copied()
    }

    pub fn order(&self, render_order: i32) -> Option<&OrderRender> {
        self.buckets(self.phase_of(render_order)).get(&render_order)
    }

    pub fn is_empty(&self) -> bool {
        self.order_keys.is_empty() && self.post_keys.is_empty()
    }

    pub fn insert_batch(&mut self, render_order: i32, pipeline: PipelineAsset, z: f32, z_key: Option<ZKey>, key: BatchKey) {
        let layer = self.layer;
        self.buckets_mut(render_order)
            .entry(render_order)
            .or_insert_with(|| OrderRender::new(render_order))
            .insert_batch(layer, pipeline, z, z_key, key);
    }

    /// Remove `key`, dropping its bucket if it empties.
    /// Returns true when the whole layer became empty.
    pub fn remove_batch(&mut self, render_order: i32, pipeline: &PipelineAsset, z_key: Option<ZKey>, key: &BatchKey) -> bool {
        let buckets = self.buckets_mut(render_order);
        let emptied = buckets
            .get_mut(&render_order)
            .map(|order| order.remove_batch(pipeline, z_key, key))
            .unwrap_or(false);
        if emptied {
            buckets.remove(&render_order);
        }
        self.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{BatchTag, MaterialId, PipelineId, TextureId};
    use crate::components::material::{BlendMode, RenderOrder};

    fn key(texture: u32) -> BatchKey {
        BatchKey {
            layer: RenderLayer(0),
            texture: TextureId(texture),
            material: MaterialId(1),
            is_static: false,
            z: None,
            tag: BatchTag::NONE,
        }
    }

    #[test]
    fn orders_partitioned_by_threshold() {
        let mut ctx = LayerContext::new(RenderLayer(0), RenderOrder::POST_PROCESS);
        let p = PipelineAsset::new(PipelineId(1), BlendMode::Opaque);
        ctx.insert_batch(RenderOrder::GEOMETRY, p, 0.0, None, key(1));
        ctx.insert_batch(RenderOrder::POST_PROCESS, p, 0.0, None, key(2));
        ctx.insert_batch(RenderOrder::BACKGROUND, p, 0.0, None, key(3));

        let main: Vec<_> = ctx.keys(RenderPhase::Main).collect();
        let post: Vec<_> = ctx.keys(RenderPhase::PostProcess).collect();
        assert_eq!(main, vec![RenderOrder::BACKGROUND, RenderOrder::GEOMETRY]);
        assert_eq!(post, vec![RenderOrder::POST_PROCESS]);
    }

    #[test]
    fn removing_everything_empties_layer() {
        let mut ctx = LayerContext::new(RenderLayer(0), RenderOrder::POST_PROCESS);
        let p = PipelineAsset::new(PipelineId(1), BlendMode::Opaque);
        ctx.insert_batch(RenderOrder::GEOMETRY, p, 0.0, None, key(1));
        ctx.insert_batch(RenderOrder::OVERLAY, p, 0.0, None, key(2));

        assert!(!ctx.remove_batch(RenderOrder::GEOMETRY, &p, None, &key(1)));
        assert!(ctx.order(RenderOrder::GEOMETRY).is_none());
        assert!(ctx.remove_batch(RenderOrder::OVERLAY, &p, None, &key(2)));
        assert!(ctx.is_empty());
    }
}
