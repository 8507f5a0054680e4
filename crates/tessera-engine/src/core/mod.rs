pub mod scene;
pub mod signature;
pub mod time;
