use thiserror::Error;

/// Errors raised while loading content (manifests, animation definitions).
///
/// The per-frame paths never produce these; they degrade silently instead.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown texture '{0}'")]
    UnknownTexture(String),

    #[error("unknown pipeline '{0}'")]
    UnknownPipeline(String),

    #[error("unknown material '{0}'")]
    UnknownMaterial(String),

    #[error("unknown clip '{0}'")]
    UnknownClip(String),

    #[error("unknown state '{0}'")]
    UnknownState(String),

    #[error("unknown match state '{0}'")]
    UnknownMatchState(String),

    #[error("definition has no entry state")]
    MissingEntry,

    #[error("match state '{0}' declares both conditions and an inverse")]
    AmbiguousMatchState(String),

    #[error("clip '{0}' has no frames or a non-positive sample rate")]
    EmptyClip(String),
}
