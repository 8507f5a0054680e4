use crate::components::layer::RenderLayer;
use crate::components::material::PipelineAsset;

use super::key::{BatchKey, ZKey};
use super::pair::AssetBatchPair;

/// All pipeline groups sharing one render-order value inside a layer.
///
/// Opaque-only buckets keep insertion order. Once a transparent pair joins,
/// the bucket becomes sorted for good: opaque pairs first, then transparent
/// pairs by ascending Z (painter's order).
#[derive(Debug, Clone)]
pub struct OrderRender {
    pub render_order: i32,
    pairs: Vec<AssetBatchPair>,
    is_sorted: bool,
}

impl OrderRender {
    pub fn new(render_order: i32) -> Self {
        Self {
            render_order,
            pairs: Vec::new(),
            is_sorted: false,
        }
    }

    pub fn pairs(&self) -> &[AssetBatchPair] {
        &self.pairs
    }

    pub fn is_sorted(&self) -> bool {
        self.is_sorted
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Thread `key` into the pair for (`pipeline`, `z_key`), creating the pair if needed.
    pub fn insert_batch(&mut self, layer: RenderLayer, pipeline: PipelineAsset, z: f32, z_key: Option<ZKey>, key: BatchKey) {
        if let Some(pair) = self.pairs.iter_mut().find(|p| p.accepts(&pipeline, z_key)) {
            pair.push(key);
            return;
        }

        let mut pair = AssetBatchPair::new(layer, pipeline, self.render_order, z, z_key);
        pair.push(key);
        if pair.is_transparent() {
            self.is_sorted = true;
        }
        self.pairs.push(pair);
        if self.is_sorted {
            self.sort();
        }
    }

    /// Remove `key` from its pair, dropping the pair if it empties.
    /// Returns true when the bucket itself became empty.
    pub fn remove_batch(&mut self, pipeline: &PipelineAsset, z_key: Option<ZKey>, key: &BatchKey) -> bool {
        if let Some(index) = self.pairs.iter().position(|p| p.accepts(pipeline, z_key)) {
            if self.pairs[index].remove(key) {
                self.pairs.remove(index);
            }
        }
        self.pairs.is_empty()
    }

    fn sort(&mut self) {
        self.pairs.sort_by(|a, b| {
            a.is_transparent()
                .cmp(&b.is_transparent())
                .then_with(|| a.z.total_cmp(&b.z))
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{BatchTag, MaterialId, PipelineId, TextureId};
    use crate::components::material::BlendMode;

    fn key(texture: u32, z: Option<i64>) -> BatchKey {
        BatchKey {
            layer: RenderLayer(0),
            texture: TextureId(texture),
            material: MaterialId(1),
            is_static: false,
            z: z.map(ZKey),
            tag: BatchTag::NONE,
        }
    }

    #[test]
    fn opaque_bucket_keeps_insertion_order() {
        let mut order = OrderRender::new(2000);
        let a = PipelineAsset::new(PipelineId(2), BlendMode::Opaque);
        let b = PipelineAsset::new(PipelineId(1), BlendMode::Opaque);
        order.insert_batch(RenderLayer(0), a, 0.0, None, key(1, None));
        order.insert_batch(RenderLayer(0), b, 0.0, None, key(2, None));
        assert!(!order.is_sorted());
        let ids: Vec<_> = order.pairs().iter().map(|p| p.pipeline.id).collect();
        assert_eq!(ids, vec![PipelineId(2), PipelineId(1)]);
    }

    #[test]
    fn transparent_pairs_sorted_by_z() {
        let mut order = OrderRender::new(3000);
        let alpha = PipelineAsset::new(PipelineId(1), BlendMode::Alpha);
        for (i, z) in [5.0_f32, -1.0, 3.0, 0.5].into_iter().enumerate() {
            let zk = ZKey::quantize(z, 1000.0);
            order.insert_batch(RenderLayer(0), alpha, z, Some(zk), key(i as u32, Some(zk.0)));
            let zs: Vec<f32> = order.pairs().iter().map(|p| p.z).collect();
            assert!(zs.windows(2).all(|w| w[0] <= w[1]), "not sorted: {:?}", zs);
        }
        assert!(order.is_sorted());
        assert_eq!(order.pairs().len(), 4);
    }

    #[test]
    fn batches_share_pair_by_pipeline() {
        let mut order = OrderRender::new(2000);
        let p = PipelineAsset::new(PipelineId(1), BlendMode::Opaque);
        order.insert_batch(RenderLayer(0), p, 0.0, None, key(1, None));
        order.insert_batch(RenderLayer(0), p, 0.0, None, key(2, None));
        assert_eq!(order.pairs().len(), 1);
        assert_eq!(order.pairs()[0].len(), 2);
    }

    #[test]
    fn removing_last_batch_empties_bucket() {
        let mut order = OrderRender::new(2000);
        let p = PipelineAsset::new(PipelineId(1), BlendMode::Opaque);
        order.insert_batch(RenderLayer(0), p, 0.0, None, key(1, None));
        order.insert_batch(RenderLayer(0), p, 0.0, None, key(2, None));

        assert!(!order.remove_batch(&p, None, &key(1, None)));
        assert_eq!(order.pairs().len(), 1);
        assert!(order.remove_batch(&p, None, &key(2, None)));
        assert!(order.is_empty());
    }
}
