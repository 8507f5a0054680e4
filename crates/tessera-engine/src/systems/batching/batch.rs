use crate::api::types::{BufferHandle, EntityId, TextureId};
use crate::components::layer::RenderLayer;
use crate::components::material::SharedMaterial;
use crate::components::sprite::SpriteComponent;
use crate::components::transform::Transform;
use crate::renderer::instance::SpriteInstance;
use crate::renderer::traits::RenderBackend;

use super::key::BatchKey;

/// Supplies the current instance data of an entity when a batch rebuilds.
///
/// Batches store entity ids, not component references; the world is queried
/// on every refresh.
pub trait InstanceSource {
    fn instance(&self, id: EntityId) -> Option<SpriteInstance>;
}

/// One instance buffer for a homogeneous group of sprites.
#[derive(Debug)]
pub struct SpriteBatch {
    key: BatchKey,
    pub texture: TextureId,
    pub material: SharedMaterial,
    pub layer: RenderLayer,
    pub render_order: i32,
    pub is_static: bool,
    /// World Z of the members; only meaningful for transparent materials.
    pub z: f32,
    members: Vec<EntityId>,
    instances: Vec<SpriteInstance>,
    dirty: bool,
    active_count: u32,
    buffer: Option<BufferHandle>,
    capacity: usize,
}

impl SpriteBatch {
    pub fn new(key: BatchKey, transform: &Transform, sprite: &SpriteComponent) -> Self {
        Self {
            key,
            texture: sprite.texture,
            material: sprite.material.clone(),
            layer: sprite.layer,
            render_order: sprite.material.render_order,
            is_static: transform.is_static,
            z: transform.z(),
            members: Vec::new(),
            instances: Vec::new(),
            dirty: true,
            active_count: 0,
            buffer: None,
            capacity: 0,
        }
    }

    pub fn key(&self) -> &BatchKey {
        &self.key
    }

    pub fn is_transparent(&self) -> bool {
        self.material.is_transparent()
    }

    pub fn members(&self) -> &[EntityId] {
        &self.members
    }

    pub fn contains(&self, entity: EntityId) -> bool {
        self.members.contains(&entity)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Instances written by the last upload.
    pub fn active_count(&self) -> u32 {
        self.active_count
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn buffer(&self) -> Option<BufferHandle> {
        self.buffer
    }

    pub fn instances(&self) -> &[SpriteInstance] {
        &self.instances
    }

    /// Add a member. Membership changes force a full rebuild.
    pub fn add(&mut self, entity: EntityId) -> bool {
        if self.contains(entity) {
            return false;
        }
        self.members.push(entity);
        self.dirty = true;
        true
    }

    /// Remove a member, keeping the order of the rest.
    pub fn remove(&mut self, entity: EntityId) -> bool {
        match self.members.iter().position(|&m| m == entity) {
            Some(index) => {
                self.members.remove(index);
                self.dirty = true;
                true
            }
            None => false,
        }
    }

    /// Static batches only refresh after a membership change; dynamic ones every frame.
    pub fn needs_refresh(&self) -> bool {
        self.dirty || !self.is_static
    }

    /// Recollect instance data for every member from `source`.
    pub fn rebuild(&mut self, source: &(impl InstanceSource + ?Sized)) {
        self.instances.clear();
        self.instances
            .extend(self.members.iter().filter_map(|&id| source.instance(id)));
    }

    /// Write the collected instances to the GPU, growing the buffer if needed.
    pub fn upload<B: RenderBackend + ?Sized>(&mut self, backend: &mut B, min_capacity: usize) {
        let needed = self.instances.len().max(1);
        if self.buffer.is_none() || self.capacity < needed {
            if let Some(old) = self.buffer.take() {
                backend.destroy_buffer(old);
            }
            let capacity = needed.next_power_of_two().max(min_capacity);
            log::trace!("batch {} instance buffer -> capacity {}", self.key, capacity);
            self.buffer = Some(backend.create_instance_buffer(capacity));
            self.capacity = capacity;
        }
        if let Some(buffer) = self.buffer {
            backend.write_instance_buffer(buffer, &self.instances);
        }
        self.active_count = self.instances.len() as u32;
        self.dirty = false;
    }

    /// Detach the GPU buffer so the owner can release it.
    pub fn take_buffer(&mut self) -> Option<BufferHandle> {
        self.capacity = 0;
        self.active_count = 0;
        self.buffer.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{BatchTag, MaterialId, PipelineId};
    use crate::components::material::{BlendMode, Material, PipelineAsset};
    use crate::renderer::recording::RecordingBackend;
    use glam::Vec3;
    use std::collections::HashMap;

    struct Positions(HashMap<EntityId, f32>);

    impl InstanceSource for Positions {
        fn instance(&self, id: EntityId) -> Option<SpriteInstance> {
            self.0.get(&id).map(|&x| {
                let mut instance = SpriteInstance::default();
                instance.x = x;
                instance
            })
        }
    }

    fn batch(is_static: bool) -> SpriteBatch {
        let material = Material::new(MaterialId(1), PipelineAsset::new(PipelineId(1), BlendMode::Opaque)).into_shared();
        let sprite = SpriteComponent::new(TextureId(1), material);
        let mut transform = Transform::from_position(Vec3::ZERO);
        transform.is_static = is_static;
        let key = BatchKey::for_sprite(&transform, &sprite, BatchTag::NONE, 1000.0);
        SpriteBatch::new(key, &transform, &sprite)
    }

    #[test]
    fn add_is_idempotent_per_entity() {
        let mut b = batch(false);
        assert!(b.add(EntityId(1)));
        assert!(!b.add(EntityId(1)));
        assert_eq!(b.len(), 1);
    }

    #[test]
    fn static_batch_refreshes_only_when_dirty() {
        let mut backend = RecordingBackend::new();
        let source = Positions(HashMap::from([(EntityId(1), 4.0)]));
        let mut b = batch(true);
        b.add(EntityId(1));
        assert!(b.needs_refresh());

        b.rebuild(&source);
        b.upload(&mut backend, 1);
        assert!(!b.needs_refresh());
        assert_eq!(b.active_count(), 1);

        b.remove(EntityId(1));
        assert!(b.needs_refresh());
    }

    #[test]
    fn dynamic_batch_always_refreshes() {
        let mut backend = RecordingBackend::new();
        let mut b = batch(false);
        b.add(EntityId(1));
        b.rebuild(&Positions(HashMap::new()));
        b.upload(&mut backend, 1);
        assert!(b.needs_refresh());
        assert_eq!(b.active_count(), 0);
    }

    #[test]
    fn upload_grows_buffer() {
        let mut backend = RecordingBackend::new();
        let source = Positions((1..=5).map(|i| (EntityId(i), i as f32)).collect());
        let mut b = batch(false);
        b.add(EntityId(1));
        b.rebuild(&source);
        b.upload(&mut backend, 2);
        let first = b.buffer().unwrap();
        assert_eq!(backend.capacity(first), Some(2));

        for i in 2..=5 {
            b.add(EntityId(i));
        }
        b.rebuild(&source);
        b.upload(&mut backend, 2);
        let second = b.buffer().unwrap();
        assert_ne!(first, second);
        assert_eq!(backend.capacity(second), Some(8));
        assert_eq!(backend.live_buffers(), 1);
        assert_eq!(backend.buffer(second).unwrap().len(), 5);
        assert_eq!(b.instances()[4].x, 5.0);
    }
}
