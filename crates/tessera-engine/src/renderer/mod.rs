pub mod instance;
pub mod recording;
pub mod traits;

// Re-export key types for convenient access
pub use instance::SpriteInstance;
pub use recording::{DrawCommand, RecordingBackend};
pub use traits::{DrawStats, RenderBackend, RenderPhase, RenderTier};
