//! Sprite batching and draw-order resolution.
//!
//! Tree shape: `layer → LayerContext → OrderRender → AssetBatchPair → SpriteBatch`.
//! Batches are owned by `SpriteBatchSystem` and referenced from pairs by key.

pub mod batch;
pub mod key;
pub mod layer;
pub mod order;
pub mod pair;
pub mod system;

pub use batch::{InstanceSource, SpriteBatch};
pub use key::{BatchKey, ZKey};
pub use layer::LayerContext;
pub use order::OrderRender;
pub use pair::AssetBatchPair;
pub use system::{BatchSettings, SpriteBatchSystem};
