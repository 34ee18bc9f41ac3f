//! Dagscape - a cosmetic blockchain DAG visualizer
//!
//! Core modules:
//! - `sim`: Deterministic fake-DAG growth simulation (clock, generator, history)
//! - `renderer`: WebGPU rendering pipeline
//! - `audio`: Web Audio notification cues per block category
//! - `chain`: One-shot chain-height fetch with fallback
//! - `theme`: Per-skin configuration (Kaspa / Sui)
//! - `settings`: Viewer preferences persisted to LocalStorage

#[cfg(target_arch = "wasm32")]
pub mod audio;
pub mod chain;
pub mod renderer;
pub mod settings;
pub mod sim;
pub mod theme;

pub use settings::Settings;
pub use theme::{Theme, ThemeConfig};
