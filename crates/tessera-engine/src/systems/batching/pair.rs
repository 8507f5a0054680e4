use crate::components::layer::RenderLayer;
use crate::components::material::PipelineAsset;

use super::key::{BatchKey, ZKey};

/// Batches sharing one pipeline asset inside a render-order bucket.
///
/// The pipeline is bound once for all member batches. Transparent pairs are
/// additionally split by Z so the bucket can order them back-to-front.
#[derive(Debug, Clone)]
pub struct AssetBatchPair {
    pub layer: RenderLayer,
    pub pipeline: PipelineAsset,
    pub render_order: i32,
    /// World Z shared by the member batches (0.0 for opaque pairs).
    pub z: f32,
    z_key: Option<ZKey>,
    batches: Vec<BatchKey>,
}

impl AssetBatchPair {
    pub fn new(layer: RenderLayer, pipeline: PipelineAsset, render_order: i32, z: f32, z_key: Option<ZKey>) -> Self {
        Self {
            layer,
            pipeline,
            render_order,
            z: if z_key.is_some() { z } else { 0.0 },
            z_key,
            batches: Vec::new(),
        }
    }

    pub fn is_transparent(&self) -> bool {
        self.pipeline.is_transparent()
    }

    /// Whether a batch with this pipeline and Z belongs in this pair.
    pub fn accepts(&self, pipeline: &PipelineAsset, z_key: Option<ZKey>) -> bool {
        self.pipeline.id == pipeline.id && self.z_key == z_key
    }

    pub fn batches(&self) -> &[BatchKey] {
        &self.batches
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn push(&mut self, key: BatchKey) {
        if !self.batches.contains(&key) {
            self.batches.push(key);
        }
    }

    /// Drop `key`; returns true when the pair became empty.
    pub fn remove(&mut self, key: &BatchKey) -> bool {
        self.batches.retain(|k| k != key);
        self.batches.is_empty()
    }
}
