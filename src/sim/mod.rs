//! Deterministic simulation module
//!
//! The fake-DAG growth core lives here. This module must be pure and
//! deterministic:
//! - Wall-clock timestamps are passed in, never read
//! - Seeded RNG only
//! - Stable iteration order (by block id)
//! - No rendering or platform dependencies

pub mod block;
pub mod clock;
pub mod generate;
pub mod history;
pub mod selection;
pub mod state;
pub mod tick;

pub use block::{Block, BlockKind};
pub use clock::GrowthClock;
pub use generate::{kind_for_draw, next_block};
pub use history::BoundedHistory;
pub use selection::Selection;
pub use state::{SimPhase, SimState};
pub use tick::{Notifier, StatsSink, tick};
