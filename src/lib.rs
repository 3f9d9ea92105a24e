//! name-tree
//!
//! A rotating 3D tree decorated with the names visitors leave on it. Names
//! live in a remote PostgREST table; the scene renders them as camera-facing
//! labels scattered over a glTF model. Runs natively and in the browser.
//!
//! High-level modules
//! - `app`: the shared model, custom events and flow wiring
//! - `audio`: background audio armed until the first pointer press
//! - `camera`: projection, orbit controls and the camera uniform
//! - `config`: defaults and environment overrides
//! - `context`: window, surface and GPU device
//! - `data_structures`: textures, instances, meshes and bounds
//! - `flow`: the event loop and the `GraphicsFlow` trait
//! - `names`: the name type and the remote name store
//! - `pipelines`: model and label sprite pipelines, light uniform
//! - `render`: per-flow draw composition
//! - `resources`: asset loading (glTF models, textures)
//! - `scene`: scene sessions, labels and their renderer
//! - `view`: the name form
//!

pub mod app;
pub mod audio;
pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod flow;
pub mod names;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod scene;
pub mod view;

pub use app::run;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    run().map_err(|e| JsValue::from_str(&format!("{e:#}")))
}
