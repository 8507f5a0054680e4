use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::api::error::EngineError;
use crate::api::types::{AnimationEvent, BatchTag, EntityId};
use crate::components::entity::Entity;
use crate::components::layer::RenderLayer;
use crate::components::material::RenderOrder;
use crate::components::sprite::SpriteComponent;
use crate::components::transform::Transform;
use crate::core::scene::Scene;
use crate::core::signature::{SystemKind, SystemTable};
use crate::core::time::{FixedTimestep, GameClock};
use crate::renderer::traits::{DrawStats, RenderBackend};
use crate::systems::animation::tick_animations;
use crate::systems::batching::{BatchSettings, SpriteBatchSystem};

/// Configuration for the engine, provided by the game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Fixed timestep in seconds (default: 1/60).
    pub fixed_dt: f32,
    /// Render orders at or above this draw in the post-process phase (default: 5000).
    pub post_process_threshold: i32,
    /// Z quantization of transparent batch keys, in steps per world unit (default: 1000).
    pub z_steps_per_unit: f32,
    /// Minimum instance capacity of a new batch buffer (default: 16).
    pub initial_batch_capacity: usize,
    /// Entity slots reserved up front (default: 256).
    pub entity_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            post_process_threshold: RenderOrder::POST_PROCESS,
            z_steps_per_unit: 1000.0,
            initial_batch_capacity: 16,
            entity_capacity: 256,
        }
    }
}

impl EngineConfig {
    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn batch_settings(&self) -> BatchSettings {
        BatchSettings {
            post_process_threshold: self.post_process_threshold,
            z_steps_per_unit: self.z_steps_per_unit,
            initial_capacity: self.initial_batch_capacity,
        }
    }
}

/// The core contract every game must fulfill.
pub trait Game {
    /// Return engine configuration. Called once before init.
    fn config(&self) -> EngineConfig {
        EngineConfig::default()
    }

    /// Setup initial state, spawn entities, configure the scene.
    fn init(&mut self, ctx: &mut EngineContext);

    /// The fixed-rate game tick. Move entities, set animator parameters, spawn/despawn.
    fn update(&mut self, ctx: &mut EngineContext);
}

/// Mutable access to engine state, passed to Game::init and Game::update.
///
/// All sprite mutations go through the context so the batch system sees
/// every identity change. Editing `scene` directly is fine for components
/// that do not affect batching (animator parameters, tags, rotation).
#[derive(Debug)]
pub struct EngineContext {
    pub scene: Scene,
    pub batches: SpriteBatchSystem,
    pub systems: SystemTable,
    pub events: Vec<AnimationEvent>,
    config: EngineConfig,
    timestep: FixedTimestep,
    clock: GameClock,
    last_stats: DrawStats,
    next_id: u32,
}

impl EngineContext {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            scene: Scene::with_capacity(config.entity_capacity),
            batches: SpriteBatchSystem::new(config.batch_settings()),
            systems: SystemTable::engine_defaults(),
            events: Vec::new(),
            timestep: FixedTimestep::new(config.fixed_dt),
            clock: GameClock::new(),
            last_stats: DrawStats::default(),
            next_id: 1,
            config,
        }
    }

    /// Build a context for `game`: config, init, then start.
    pub fn for_game<G: Game + ?Sized>(game: &mut G) -> Self {
        let mut ctx = Self::new(game.config());
        game.init(&mut ctx);
        ctx.start();
        ctx
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn clock(&self) -> &GameClock {
        &self.clock
    }

    /// Generate the next unique entity ID.
    pub fn next_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    fn batched(&self, entity: &Entity) -> bool {
        entity.active && self.systems.is_interested(entity.signature(), SystemKind::SpriteBatch)
    }

    /// Add an entity to the scene. An entity with the same id is replaced.
    pub fn spawn(&mut self, entity: Entity) -> EntityId {
        let id = entity.id;
        if self.scene.get(id).is_some() {
            self.despawn(id);
        }
        if self.batched(&entity) {
            if let Some(sprite) = entity.sprite.as_ref() {
                self.batches
                    .add_sprite_to_batch(id, &entity.transform, sprite, BatchTag::NONE);
            }
        }
        self.scene.spawn(entity);
        id
    }

    pub fn despawn(&mut self, id: EntityId) -> Option<Entity> {
        let entity = self.scene.despawn(id)?;
        if let Some(sprite) = entity.sprite.as_ref() {
            self.batches
                .remove_sprite(id, &entity.transform, &sprite.identity(), BatchTag::NONE);
        }
        Some(entity)
    }

    /// Replace an entity's sprite, moving it between batches as needed.
    pub fn set_sprite(&mut self, id: EntityId, sprite: SpriteComponent) {
        let Some(entity) = self.scene.get_mut(id) else {
            log::warn!("set_sprite on unknown entity {:?}", id);
            return;
        };
        let old = entity.sprite.replace(sprite);
        let transform = entity.transform;
        let active = entity.active;
        let Some(entity) = self.scene.get(id) else {
            return;
        };
        let Some(sprite) = entity.sprite.as_ref() else {
            return;
        };

        match (old, active) {
            (Some(old), true) => {
                self.batches
                    .update_sprite_batch(id, &transform, &old.identity(), sprite, BatchTag::NONE);
            }
            (None, true) => {
                self.batches
                    .add_sprite_to_batch(id, &transform, sprite, BatchTag::NONE);
            }
            // Inactive entities are never batched.
            (_, false) => {}
        }
    }

    /// Detach an entity's sprite and remove it from its batch.
    pub fn remove_sprite(&mut self, id: EntityId) -> Option<SpriteComponent> {
        let entity = self.scene.get_mut(id)?;
        let sprite = entity.sprite.take()?;
        let transform = entity.transform;
        self.batches
            .remove_sprite(id, &transform, &sprite.identity(), BatchTag::NONE);
        Some(sprite)
    }

    /// Replace an entity's transform. Rebatches when the batch key changes
    /// (static flag, or quantized Z of a transparent sprite).
    pub fn set_transform(&mut self, id: EntityId, transform: Transform) {
        let Some(entity) = self.scene.get_mut(id) else {
            log::warn!("set_transform on unknown entity {:?}", id);
            return;
        };
        let old = std::mem::replace(&mut entity.transform, transform);
        let Some(sprite) = entity.sprite.as_ref() else {
            return;
        };
        if !entity.active {
            return;
        }

        let old_key = self.batches.key_for(&old, sprite, BatchTag::NONE);
        let new_key = self.batches.key_for(&transform, sprite, BatchTag::NONE);
        if old_key == new_key {
            if let Some(batch) = self.batches.batch_mut(&new_key) {
                batch.mark_dirty();
            }
            return;
        }
        self.batches.remove_by_key(id, &old_key);
        self.batches
            .add_sprite_to_batch(id, &transform, sprite, BatchTag::NONE);
    }

    pub fn set_position(&mut self, id: EntityId, position: Vec3) {
        let Some(mut transform) = self.scene.get(id).map(|e| e.transform) else {
            return;
        };
        transform.position = position;
        self.set_transform(id, transform);
    }

    /// Activate or deactivate an entity. Inactive entities are neither
    /// animated nor batched.
    pub fn set_active(&mut self, id: EntityId, active: bool) {
        let Some(entity) = self.scene.get_mut(id) else {
            return;
        };
        if entity.active == active {
            return;
        }
        entity.active = active;
        let Some(entity) = self.scene.get(id) else {
            return;
        };
        let Some(sprite) = entity.sprite.as_ref() else {
            return;
        };
        if active {
            if self.batched(entity) {
                self.batches
                    .add_sprite_to_batch(id, &entity.transform, sprite, BatchTag::NONE);
            }
        } else {
            self.batches
                .remove_sprite(id, &entity.transform, &sprite.identity(), BatchTag::NONE);
        }
    }

    /// Scene build: batch every existing sprite and accept mutations from now on.
    pub fn start(&mut self) {
        if self.batches.is_started() {
            return;
        }
        self.batches.start();
        let mut batched = 0;
        for entity in self.scene.iter() {
            if !self.batched(entity) {
                continue;
            }
            if let Some(sprite) = entity.sprite.as_ref() {
                if self
                    .batches
                    .add_sprite_to_batch(entity.id, &entity.transform, sprite, BatchTag::NONE)
                    .is_some()
                {
                    batched += 1;
                }
            }
        }
        log::info!(
            "engine started: {} entities, {} sprites in {} batches",
            self.scene.len(),
            batched,
            self.batches.batch_count()
        );
    }

    pub fn is_started(&self) -> bool {
        self.batches.is_started()
    }

    /// Advance the game by `dt` seconds of wall time.
    ///
    /// Runs as many fixed `Game::update` ticks as have accumulated, then
    /// advances the game clock and every animator. Returns the tick count.
    pub fn frame<G: Game + ?Sized>(&mut self, game: &mut G, dt: f32) -> u32 {
        let steps = self.timestep.accumulate(dt);
        for _ in 0..steps {
            game.update(self);
        }
        self.clock.advance(dt);
        let changed = tick_animations(&mut self.scene, &self.systems, &self.clock, &mut self.events);
        for id in changed {
            self.mark_sprite_dirty(id);
        }
        steps
    }

    /// Flag the batch holding `id` for a refresh on the next `render`.
    fn mark_sprite_dirty(&mut self, id: EntityId) {
        let Some(entity) = self.scene.get(id) else {
            return;
        };
        let Some(sprite) = entity.sprite.as_ref() else {
            return;
        };
        if !entity.transform.is_static {
            return;
        }
        let key = self.batches.key_for(&entity.transform, sprite, BatchTag::NONE);
        if let Some(batch) = self.batches.batch_mut(&key) {
            batch.mark_dirty();
        }
    }

    /// Refresh batch buffers, then draw every layer's main phase followed
    /// by every layer's post-process phase, layers in ascending order.
    pub fn render<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) -> DrawStats {
        self.batches.update(&self.scene, backend);

        let layers: Vec<RenderLayer> = self.batches.layers().map(|l| l.layer).collect();
        let mut stats = DrawStats::default();
        for layer in &layers {
            stats.merge(self.batches.render(backend, *layer));
        }
        for layer in &layers {
            stats.merge(self.batches.render_post_process(backend, *layer));
        }
        self.last_stats = stats;
        stats
    }

    /// Draw statistics of the last `render`.
    pub fn last_stats(&self) -> DrawStats {
        self.last_stats
    }

    /// Take the animation events raised since the last call.
    pub fn drain_events(&mut self) -> Vec<AnimationEvent> {
        std::mem::take(&mut self.events)
    }

    /// Tear down the scene and every batch. The context must be started
    /// again after the new scene is built; buffers are released by the next
    /// `render`.
    pub fn reload(&mut self) {
        self.batches.clear();
        self.scene.clear();
        self.events.clear();
        self.clock.reset();
        self.timestep = FixedTimestep::new(self.config.fixed_dt);
        self.last_stats = DrawStats::default();
        log::info!("engine reloaded");
    }
}

impl Default for EngineContext {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{AnimationEventKind, MaterialId, PipelineId, TextureId};
    use crate::components::animation::{AnimationClip, AnimationState};
    use crate::components::animator::{AnimationTransition, Animator, StateId};
    use crate::components::material::{BlendMode, Material, PipelineAsset, SharedMaterial};
    use crate::renderer::recording::{DrawCommand, RecordingBackend};
    use crate::components::parameters::{Comparator, Condition};
    use crate::renderer::traits::RenderPhase;

    fn opaque() -> SharedMaterial {
        Material::new(MaterialId(1), PipelineAsset::new(PipelineId(1), BlendMode::Opaque)).into_shared()
    }

    fn alpha() -> SharedMaterial {
        Material::new(MaterialId(2), PipelineAsset::new(PipelineId(2), BlendMode::Alpha)).into_shared()
    }

    struct Spinner {
        ticks: u32,
    }

    impl Game for Spinner {
        fn config(&self) -> EngineConfig {
            EngineConfig {
                fixed_dt: 0.25,
                ..Default::default()
            }
        }

        fn init(&mut self, ctx: &mut EngineContext) {
            let clip = AnimationClip::horizontal_strip("spin", 0.0, 0.0, 4, 4.0).into_shared();
            let id = ctx.next_id();
            ctx.spawn(
                Entity::new(id)
                    .with_sprite(SpriteComponent::new(TextureId(1), opaque()))
                    .with_animator(Animator::new(AnimationState::new("spin", clip))),
            );
        }

        fn update(&mut self, _ctx: &mut EngineContext) {
            self.ticks += 1;
        }
    }

    #[test]
    fn config_from_json_fills_defaults() {
        let config = EngineConfig::from_json(r#"{ "post_process_threshold": 9000 }"#).unwrap();
        assert_eq!(config.post_process_threshold, 9000);
        assert_eq!(config.z_steps_per_unit, 1000.0);
        assert_eq!(config.batch_settings().post_process_threshold, 9000);
        assert!(EngineConfig::from_json("[").is_err());
    }

    #[test]
    fn sprites_spawned_before_start_are_batched_on_start() {
        let mut ctx = EngineContext::default();
        ctx.spawn(Entity::new(EntityId(1)).with_sprite(SpriteComponent::new(TextureId(1), opaque())));
        assert_eq!(ctx.batches.batch_count(), 0);

        ctx.start();
        assert_eq!(ctx.batches.batch_count(), 1);
        ctx.spawn(Entity::new(EntityId(2)).with_sprite(SpriteComponent::new(TextureId(1), opaque())));
        let batch = ctx.batches.batches().next().unwrap();
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn despawn_tears_down_batches() {
        let mut ctx = EngineContext::default();
        ctx.start();
        ctx.spawn(Entity::new(EntityId(1)).with_sprite(SpriteComponent::new(TextureId(1), alpha())));
        assert!(ctx.despawn(EntityId(1)).is_some());
        assert_eq!(ctx.batches.batch_count(), 0);
        assert_eq!(ctx.batches.layers().count(), 0);
        assert!(ctx.despawn(EntityId(1)).is_none());
    }

    #[test]
    fn set_sprite_moves_between_batches() {
        let mut ctx = EngineContext::default();
        ctx.start();
        ctx.spawn(Entity::new(EntityId(1)).with_sprite(SpriteComponent::new(TextureId(1), opaque())));
        ctx.set_sprite(EntityId(1), SpriteComponent::new(TextureId(2), opaque()).with_layer(RenderLayer::UI));

        assert_eq!(ctx.batches.batch_count(), 1);
        let batch = ctx.batches.batches().next().unwrap();
        assert_eq!(batch.texture, TextureId(2));
        assert_eq!(batch.layer, RenderLayer::UI);
        assert!(ctx.batches.layer(RenderLayer::default()).is_none());
    }

    #[test]
    fn moving_transparent_sprite_rebatches_by_z() {
        let mut ctx = EngineContext::default();
        ctx.start();
        let sprite = SpriteComponent::new(TextureId(1), alpha());
        ctx.spawn(Entity::new(EntityId(1)).with_sprite(sprite.clone()));
        ctx.spawn(Entity::new(EntityId(2)).with_sprite(sprite));
        assert_eq!(ctx.batches.batch_count(), 1);

        ctx.set_position(EntityId(2), Vec3::new(5.0, 0.0, 0.0));
        assert_eq!(ctx.batches.batch_count(), 1);

        ctx.set_position(EntityId(2), Vec3::new(5.0, 0.0, 2.0));
        assert_eq!(ctx.batches.batch_count(), 2);

        ctx.set_position(EntityId(2), Vec3::ZERO);
        assert_eq!(ctx.batches.batch_count(), 1);
        assert_eq!(ctx.batches.batches().next().unwrap().len(), 2);
    }

    #[test]
    fn inactive_entities_leave_their_batch() {
        let mut ctx = EngineContext::default();
        ctx.start();
        ctx.spawn(Entity::new(EntityId(1)).with_sprite(SpriteComponent::new(TextureId(1), opaque())));
        ctx.set_active(EntityId(1), false);
        assert_eq!(ctx.batches.batch_count(), 0);
        ctx.set_active(EntityId(1), true);
        assert_eq!(ctx.batches.batch_count(), 1);
    }

    #[test]
    fn frame_runs_fixed_ticks_and_animation() {
        let mut game = Spinner { ticks: 0 };
        let mut ctx = EngineContext::for_game(&mut game);
        assert!(ctx.is_started());

        let steps = ctx.frame(&mut game, 0.5);
        assert_eq!(steps, 2);
        assert_eq!(game.ticks, 2);

        let events = ctx.drain_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, AnimationEventKind::Started);
        assert!(ctx.drain_events().is_empty());

        ctx.frame(&mut game, 0.5);
        let sprite = ctx.scene.get(EntityId(1)).unwrap().sprite.as_ref().unwrap();
        assert_eq!(sprite.col, 2.0);
    }

    #[test]
    fn zero_duration_trigger_fires_transition_within_frame() {
        let mut game = Spinner { ticks: 0 };
        let mut ctx = EngineContext::for_game(&mut game);
        let clip = AnimationClip::horizontal_strip("attack", 1.0, 0.0, 4, 4.0).into_shared();
        let mut animator = Animator::new(AnimationState::new("idle", clip.clone()));
        let attack = animator.add_state(AnimationState::new("attack", clip));
        animator.add_transition(
            StateId(0),
            AnimationTransition::when(attack).with_condition(Condition::new("attack", Comparator::Equal, 1.0)),
        );
        ctx.spawn(
            Entity::new(EntityId(7))
                .with_sprite(SpriteComponent::new(TextureId(1), opaque()))
                .with_animator(animator),
        );
        ctx.frame(&mut game, 0.016);

        let animator = ctx.scene.get_mut(EntityId(7)).unwrap().animator.as_mut().unwrap();
        animator.set_trigger("attack", 1.0, 0.0, 0.0);
        ctx.frame(&mut game, 0.016);

        let animator = ctx.scene.get(EntityId(7)).unwrap().animator.as_ref().unwrap();
        assert_eq!(animator.current(), attack);
        assert_eq!(animator.get_float("attack"), 0.0);
    }

    #[test]
    fn animated_static_sprite_uploads_new_frames() {
        let mut game = Spinner { ticks: 0 };
        let mut ctx = EngineContext::for_game(&mut game);
        let mut transform = ctx.scene.get(EntityId(1)).unwrap().transform;
        transform.is_static = true;
        ctx.set_transform(EntityId(1), transform);

        let mut backend = RecordingBackend::new();
        ctx.frame(&mut game, 0.5);
        ctx.render(&mut backend);
        ctx.frame(&mut game, 0.5);
        ctx.render(&mut backend);

        let sprite = ctx.scene.get(EntityId(1)).unwrap().sprite.as_ref().unwrap();
        assert_eq!(sprite.col, 2.0);
        let batch = ctx.batches.batches().next().unwrap();
        assert!(batch.is_static);
        let uploaded = backend.buffer(batch.buffer().unwrap()).unwrap();
        assert_eq!(uploaded[0].sprite_col, 2.0);
    }

    #[test]
    fn reactivation_respects_system_table() {
        let mut ctx = EngineContext::default();
        ctx.systems = SystemTable::new();
        ctx.start();
        ctx.spawn(Entity::new(EntityId(1)).with_sprite(SpriteComponent::new(TextureId(1), opaque())));
        assert_eq!(ctx.batches.batch_count(), 0);

        ctx.set_active(EntityId(1), false);
        ctx.set_active(EntityId(1), true);
        assert_eq!(ctx.batches.batch_count(), 0);
    }

    #[test]
    fn render_draws_main_then_post_process() {
        let mut ctx = EngineContext::default();
        ctx.start();
        let post = Material::new(MaterialId(3), PipelineAsset::new(PipelineId(3), BlendMode::Opaque))
            .with_render_order(RenderOrder::POST_PROCESS)
            .into_shared();
        ctx.spawn(Entity::new(EntityId(1)).with_sprite(SpriteComponent::new(TextureId(1), post)));
        ctx.spawn(
            Entity::new(EntityId(2)).with_sprite(SpriteComponent::new(TextureId(2), opaque()).with_layer(RenderLayer::UI)),
        );

        let mut backend = RecordingBackend::new();
        let stats = ctx.render(&mut backend);
        assert_eq!(stats.draw_calls, 2);
        assert_eq!(ctx.last_stats(), stats);

        let phases: Vec<_> = backend
            .commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::BeginPhase { phase, layer } => Some((*phase, *layer)),
                _ => None,
            })
            .collect();
        assert_eq!(
            phases,
            vec![
                (RenderPhase::Main, 0),
                (RenderPhase::Main, 5),
                (RenderPhase::PostProcess, 0),
                (RenderPhase::PostProcess, 5),
            ]
        );
        let textures: Vec<_> = backend
            .commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::BindTexture(t) => Some(*t),
                _ => None,
            })
            .collect();
        assert_eq!(textures, vec![TextureId(2), TextureId(1)]);
    }

    #[test]
    fn reload_tears_down_and_releases_buffers() {
        let mut ctx = EngineContext::default();
        ctx.start();
        ctx.spawn(Entity::new(EntityId(1)).with_sprite(SpriteComponent::new(TextureId(1), opaque())));
        let mut backend = RecordingBackend::new();
        ctx.render(&mut backend);
        assert_eq!(backend.live_buffers(), 1);

        ctx.reload();
        assert!(ctx.scene.is_empty());
        assert!(!ctx.is_started());
        ctx.render(&mut backend);
        assert_eq!(backend.live_buffers(), 0);
    }
}
