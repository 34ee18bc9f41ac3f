//! WebGPU rendering module
//!
//! CPU-side camera projection plus a fullscreen SDF fragment shader that
//! composites the whole scene from screen-space discs and segments.

pub mod camera;
pub mod scene_pipeline;

pub use camera::{Camera, pick_block};
pub use scene_pipeline::SceneRenderState;
