pub mod animation;
pub mod animator;
pub mod entity;
pub mod layer;
pub mod material;
pub mod parameters;
pub mod sprite;
pub mod state_match;
pub mod transform;
