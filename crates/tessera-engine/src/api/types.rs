/// Unique identifier for an entity in the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u32);

/// Stable identity of a texture in the asset cache.
/// Batch keys are built from this, never from the texture object itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TextureId(pub u32);

/// Stable identity of a material instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct MaterialId(pub u32);

/// Identity of a pipeline asset (shader + blend state).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct PipelineId(pub u32);

/// Identity of an extra resource set a material binds next to its texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ResourceSetId(pub u32);

/// Backend-issued handle to a GPU instance buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u32);

/// Discriminator appended to a batch key.
///
/// Manually batched systems (particles) pass their own tag so their instances
/// never share a batch with scene sprites. Scene sprites use `BatchTag::NONE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BatchTag(pub u32);

impl BatchTag {
    pub const NONE: BatchTag = BatchTag(0);
}

/// Playback edge raised while advancing an animation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationEventKind {
    Started,
    Finished,
}

/// Animation event emitted by the animation system during a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationEvent {
    pub entity: EntityId,
    /// Name of the state (or match) that started or finished.
    pub state: String,
    pub kind: AnimationEventKind,
}
