//! Render pipelines used by the scene: lit textured models and camera-facing
//! label sprites.

pub mod basic;
pub mod light;
pub mod sprite;
