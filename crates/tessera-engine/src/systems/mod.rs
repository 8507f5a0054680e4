pub mod animation;
pub mod batching;
pub mod definition;
