pub mod api;
pub mod assets;
pub mod components;
pub mod core;
pub mod renderer;
pub mod systems;

// Re-export key types at crate root for convenience
pub use api::error::EngineError;
pub use api::game::{EngineConfig, EngineContext, Game};
pub use api::types::{
    AnimationEvent, AnimationEventKind, BatchTag, BufferHandle, EntityId, MaterialId, PipelineId,
    ResourceSetId, TextureId,
};
pub use assets::manifest::AssetManifest;
pub use assets::registry::AssetRegistry;
pub use components::animation::{AnimationClip, AnimationState, SharedClip};
pub use components::animator::{AnimationTransition, Animator, StateId};
pub use components::entity::Entity;
pub use components::layer::RenderLayer;
pub use components::material::{BlendMode, Material, PipelineAsset, RenderOrder, SharedMaterial};
pub use components::parameters::{Comparator, Condition, Parameters};
pub use components::sprite::{SpriteComponent, SpriteIdentity};
pub use components::state_match::{AnimationMatch, MatchId, MatchStateId, StateMatchAnimator};
pub use components::transform::Transform;
pub use crate::core::scene::Scene;
pub use crate::core::time::{FixedTimestep, GameClock};
pub use renderer::{DrawCommand, DrawStats, RecordingBackend, RenderBackend, RenderPhase, SpriteInstance};
pub use systems::animation::tick_animations;
pub use systems::batching::{
    AssetBatchPair, BatchKey, BatchSettings, InstanceSource, LayerContext, OrderRender, SpriteBatch,
    SpriteBatchSystem,
};
pub use systems::definition::{AnimatorDef, StateMatchDef};
