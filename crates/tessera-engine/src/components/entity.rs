use glam::{Vec2, Vec3};

use crate::api::types::EntityId;
use crate::components::animator::Animator;
use crate::components::sprite::SpriteComponent;
use crate::components::state_match::StateMatchAnimator;
use crate::components::transform::Transform;
use crate::core::signature::{ComponentKind, ComponentSignature};

/// Fat Entity: a single struct with optional components.
#[derive(Debug)]
pub struct Entity {
    /// Unique identifier.
    pub id: EntityId,
    /// String tag for finding entities by name.
    pub tag: String,
    /// Whether this entity is active (inactive entities are skipped).
    pub active: bool,
    pub transform: Transform,
    /// Sprite component (optional; entities without sprites are invisible).
    pub sprite: Option<SpriteComponent>,
    /// Edge-walking animation state machine.
    pub animator: Option<Animator>,
    /// Condition-matching animation state machine.
    pub state_match: Option<StateMatchAnimator>,
}

impl Entity {
    /// Create a new entity with the given ID at the origin.
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            tag: String::new(),
            active: true,
            transform: Transform::default(),
            sprite: None,
            animator: None,
            state_match: None,
        }
    }

    /// Components present on this entity, used to route lifecycle events.
    pub fn signature(&self) -> ComponentSignature {
        let mut signature = ComponentSignature::from(ComponentKind::Transform);
        if self.sprite.is_some() {
            signature = signature.with(ComponentKind::Sprite);
        }
        if self.animator.is_some() {
            signature = signature.with(ComponentKind::Animator);
        }
        if self.state_match.is_some() {
            signature = signature.with(ComponentKind::StateMatch);
        }
        signature
    }

    // -- Builder pattern --

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    pub fn with_pos(mut self, pos: Vec3) -> Self {
        self.transform.position = pos;
        self
    }

    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.transform.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec2) -> Self {
        self.transform.scale = scale;
        self
    }

    pub fn with_static(mut self, is_static: bool) -> Self {
        self.transform.is_static = is_static;
        self
    }

    pub fn with_sprite(mut self, sprite: SpriteComponent) -> Self {
        self.sprite = Some(sprite);
        self
    }

    pub fn with_animator(mut self, animator: Animator) -> Self {
        self.animator = Some(animator);
        self
    }

    pub fn with_state_match(mut self, state_match: StateMatchAnimator) -> Self {
        self.state_match = Some(state_match);
        self
    }
}
