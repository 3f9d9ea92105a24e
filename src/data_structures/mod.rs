//! Engine data structures: models, textures, bounds and instances.
//!
//! - `model` contains mesh and material definitions, GPU resources for 3D models
//! - `texture` contains GPU texture wrapper and creation utilities
//! - `instance` holds per-instance transformation data
//! - `bounds` computes bounding volumes and fits models to a target height

pub mod bounds;
pub mod instance;
pub mod model;
pub mod texture;
