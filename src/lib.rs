pub mod autoplay;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod policy;
pub mod preload;
pub mod render;
pub mod slides;
