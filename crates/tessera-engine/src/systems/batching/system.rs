use std::collections::{BTreeMap, HashMap};

use crate::api::types::{BatchTag, BufferHandle, EntityId};
use crate::components::layer::RenderLayer;
use crate::components::material::RenderOrder;
use crate::components::sprite::{SpriteComponent, SpriteIdentity};
use crate::components::transform::Transform;
use crate::renderer::instance::SpriteInstance;
use crate::renderer::traits::{DrawStats, RenderBackend, RenderPhase};

use super::batch::{InstanceSource, SpriteBatch};
use super::key::BatchKey;
use super::layer::LayerContext;

/// Tunables for the batcher.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchSettings {
    /// Render orders at or above this value draw in the post-process phase.
    pub post_process_threshold: i32,
    /// Quantization of world Z in transparent batch keys.
    pub z_steps_per_unit: f32,
    /// Minimum instance capacity of a new buffer.
    pub initial_capacity: usize,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            post_process_threshold: RenderOrder::POST_PROCESS,
            z_steps_per_unit: 1000.0,
            initial_capacity: 16,
        }
    }
}

/// Groups sprites into instanced draw calls and resolves their draw order.
///
/// Owns the `layer → LayerContext → OrderRender → AssetBatchPair` tree and a
/// flat key index owning every `SpriteBatch`. A batch that loses its last
/// member is removed from the index and unthreaded from the tree; each
/// ancestor that empties on the way up is removed too.
///
/// Mutation before `start()` is ignored: component callbacks fired while a
/// scene is still being deserialized are replayed by `start` instead.
#[derive(Debug, Default)]
pub struct SpriteBatchSystem {
    settings: BatchSettings,
    layers: BTreeMap<RenderLayer, LayerContext>,
    batches: HashMap<BatchKey, SpriteBatch>,
    pending_release: Vec<BufferHandle>,
    started: bool,
}

impl SpriteBatchSystem {
    pub fn new(settings: BatchSettings) -> Self {
        Self {
            settings,
            ..Default::default()
        }
    }

    pub fn settings(&self) -> &BatchSettings {
        &self.settings
    }

    pub fn start(&mut self) {
        self.started = true;
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn key_for(&self, transform: &Transform, sprite: &SpriteComponent, tag: BatchTag) -> BatchKey {
        BatchKey::for_sprite(transform, sprite, tag, self.settings.z_steps_per_unit)
    }

    pub fn batch(&self, key: &BatchKey) -> Option<&SpriteBatch> {
        self.batches.get(key)
    }

    pub fn batch_mut(&mut self, key: &BatchKey) -> Option<&mut SpriteBatch> {
        self.batches.get_mut(key)
    }

    pub fn batches(&self) -> impl Iterator<Item = &SpriteBatch> {
        self.batches.values()
    }

    pub fn batch_count(&self) -> usize {
        self.batches.len()
    }

    pub fn layer(&self, layer: RenderLayer) -> Option<&LayerContext> {
        self.layers.get(&layer)
    }

    pub fn layers(&self) -> impl Iterator<Item = &LayerContext> {
        self.layers.values()
    }

    /// Number of pipeline groups across all layers and phases.
    pub fn pair_count(&self) -> usize {
        self.layers
            .values()
            .flat_map(|l| l.orders(RenderPhase::Main).chain(l.orders(RenderPhase::PostProcess)))
            .map(|o| o.pairs().len())
            .sum()
    }

    /// Add an entity's sprite to the batch matching its key, creating the
    /// batch and any missing ancestors. Returns the batch it landed in.
    pub fn add_sprite_to_batch(
        &mut self,
        entity: EntityId,
        transform: &Transform,
        sprite: &SpriteComponent,
        tag: BatchTag,
    ) -> Option<&SpriteBatch> {
        if !self.started || !sprite.enabled {
            return None;
        }
        let key = self.key_for(transform, sprite, tag);
        let batch = self.get_or_create(key, transform, sprite);
        batch.add(entity);
        Some(batch)
    }

    /// Lookup-or-create for `sprite`'s key without adding a member.
    ///
    /// A batch created here and never filled is reaped by the next `update`.
    pub fn create_sprite_batch(&mut self, transform: &Transform, sprite: &SpriteComponent, tag: BatchTag) -> Option<&mut SpriteBatch> {
        if !self.started {
            return None;
        }
        let key = self.key_for(transform, sprite, tag);
        Some(self.get_or_create(key, transform, sprite))
    }

    /// The batch `sprite` would join, if it exists.
    pub fn batch_for_sprite(&self, transform: &Transform, sprite: &SpriteComponent, tag: BatchTag) -> Option<&SpriteBatch> {
        self.batches.get(&self.key_for(transform, sprite, tag))
    }

    fn get_or_create(&mut self, key: BatchKey, transform: &Transform, sprite: &SpriteComponent) -> &mut SpriteBatch {
        let threshold = self.settings.post_process_threshold;
        let layers = &mut self.layers;
        self.batches.entry(key).or_insert_with(|| {
            let batch = SpriteBatch::new(key, transform, sprite);
            layers
                .entry(key.layer)
                .or_insert_with(|| LayerContext::new(key.layer, threshold))
                .insert_batch(batch.render_order, sprite.material.pipeline, batch.z, key.z, key);
            log::debug!("created sprite batch {}", key);
            batch
        })
    }

    /// Remove `entity` from the batch keyed by its previous identity.
    ///
    /// Returns the number of members left, `Some(0)` when the batch was
    /// deleted, or `None` when no such batch or member exists.
    pub fn remove_sprite(
        &mut self,
        entity: EntityId,
        transform: &Transform,
        old: &SpriteIdentity,
        tag: BatchTag,
    ) -> Option<usize> {
        if !self.started {
            return None;
        }
        let key = BatchKey::for_identity(transform, old, tag, self.settings.z_steps_per_unit);
        self.remove_by_key(entity, &key)
    }

    /// Remove `entity` from the batch with `key`.
    pub fn remove_by_key(&mut self, entity: EntityId, key: &BatchKey) -> Option<usize> {
        let batch = self.batches.get_mut(key)?;
        if !batch.remove(entity) {
            return None;
        }
        let remaining = batch.len();
        if remaining == 0 {
            self.delete_batch(key);
        }
        Some(remaining)
    }

    /// Move an entity whose texture, material or layer changed.
    pub fn update_sprite_batch(
        &mut self,
        entity: EntityId,
        transform: &Transform,
        old: &SpriteIdentity,
        sprite: &SpriteComponent,
        tag: BatchTag,
    ) -> Option<&SpriteBatch> {
        self.remove_sprite(entity, transform, old, tag);
        self.add_sprite_to_batch(entity, transform, sprite, tag)
    }

    fn delete_batch(&mut self, key: &BatchKey) {
        let Some(mut batch) = self.batches.remove(key) else {
            return;
        };
        if let Some(buffer) = batch.take_buffer() {
            self.pending_release.push(buffer);
        }
        let layer_emptied = self
            .layers
            .get_mut(&key.layer)
            .map(|layer| layer.remove_batch(batch.render_order, &batch.material.pipeline, key.z, key))
            .unwrap_or(false);
        if layer_emptied {
            self.layers.remove(&key.layer);
        }
        log::debug!("deleted sprite batch {}", key);
    }

    /// Refresh every batch that needs it and upload its instance buffer.
    ///
    /// Also releases buffers of batches deleted since the last call and
    /// reaps batches that were created but never filled.
    pub fn update<S, B>(&mut self, source: &S, backend: &mut B)
    where
        S: InstanceSource + ?Sized,
        B: RenderBackend + ?Sized,
    {
        let empty: Vec<BatchKey> = self
            .batches
            .iter()
            .filter(|(_, b)| b.is_empty())
            .map(|(k, _)| *k)
            .collect();
        for key in &empty {
            self.delete_batch(key);
        }
        self.release_buffers(backend);

        let min_capacity = self.settings.initial_capacity;
        for layer in self.layers.values() {
            let orders = layer
                .orders(RenderPhase::Main)
                .chain(layer.orders(RenderPhase::PostProcess));
            for order in orders {
                for pair in order.pairs() {
                    for key in pair.batches() {
                        let Some(batch) = self.batches.get_mut(key) else {
                            continue;
                        };
                        if batch.needs_refresh() {
                            batch.rebuild(source);
                            batch.upload(backend, min_capacity);
                        }
                    }
                }
            }
        }
    }

    /// Draw the main phase of `layer`.
    pub fn render<B: RenderBackend + ?Sized>(&self, backend: &mut B, layer: RenderLayer) -> DrawStats {
        self.render_phase(backend, layer, RenderPhase::Main)
    }

    /// Draw the post-process phase of `layer`.
    pub fn render_post_process<B: RenderBackend + ?Sized>(&self, backend: &mut B, layer: RenderLayer) -> DrawStats {
        self.render_phase(backend, layer, RenderPhase::PostProcess)
    }

    fn render_phase<B: RenderBackend + ?Sized>(&self, backend: &mut B, layer: RenderLayer, phase: RenderPhase) -> DrawStats {
        let mut stats = DrawStats::default();
        let Some(context) = self.layers.get(&layer) else {
            log::trace!("render requested for empty layer {}", layer.0);
            return stats;
        };
        backend.begin_phase(phase, layer.as_u8());

        for order in context.orders(phase) {
            for pair in order.pairs() {
                let mut pipeline_bound = false;
                for key in pair.batches() {
                    let Some(batch) = self.batches.get(key) else {
                        continue;
                    };
                    let count = batch.active_count();
                    let Some(buffer) = batch.buffer().filter(|_| count > 0) else {
                        continue;
                    };
                    if !pipeline_bound {
                        backend.bind_pipeline(pair.pipeline.id);
                        pipeline_bound = true;
                        stats.pipeline_binds += 1;
                    }
                    backend.bind_texture(batch.texture);
                    for (slot, set) in batch.material.resource_sets.iter().enumerate() {
                        backend.bind_resource_set(slot as u32 + 1, *set);
                    }
                    backend.bind_instance_buffer(buffer);
                    backend.draw_instanced(SpriteInstance::VERTICES, count);
                    stats.draw_calls += 1;
                    stats.instances += count;
                }
            }
        }
        stats
    }

    /// Drop every batch and layer, e.g. on scene reload.
    ///
    /// Buffers are released by the next `update`; the system must be started
    /// again before it accepts sprites.
    pub fn clear(&mut self) {
        for batch in self.batches.values_mut() {
            if let Some(buffer) = batch.take_buffer() {
                self.pending_release.push(buffer);
            }
        }
        self.batches.clear();
        self.layers.clear();
        self.started = false;
    }

    /// Release pending buffers without refreshing anything.
    pub fn release_buffers<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) {
        for buffer in self.pending_release.drain(..) {
            backend.destroy_buffer(buffer);
        }
    }
}
