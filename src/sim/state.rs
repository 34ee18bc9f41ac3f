//! Simulation state and phase machine
//!
//! `SimState` is the single owner of all mutable simulation state. The
//! shell holds one and passes it by reference to the tick, the renderer,
//! and the input handlers; nothing in here is a module-level singleton.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::block::Block;
use super::clock::GrowthClock;
use super::generate::synth_hash;
use super::history::BoundedHistory;
use super::selection::Selection;
use crate::theme::{Theme, ThemeConfig};

/// Lifecycle of the simulation.
///
/// `Idle → Syncing → Running ⇄ Paused`, driven externally by the start
/// control and the pause toggle. The growth clock only acts in Running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimPhase {
    /// Before the user starts the visualization.
    Idle,
    /// Started, but the height fetch has not resolved yet.
    Syncing,
    Running,
    Paused,
}

/// Complete simulation state for one skin.
pub struct SimState {
    pub theme: Theme,
    pub phase: SimPhase,
    pub history: BoundedHistory,
    pub selection: Selection,
    pub clock: GrowthClock,
    pub rng: Pcg32,
    /// Run seed, kept for logging/reproduction.
    pub seed: u64,
    /// Blocks produced by the clock (genesis excluded).
    pub generated: u64,
    /// Fetched chain height, or the fallback once the fetch settles.
    pub base_height: Option<u64>,
    next_id: u64,
}

impl SimState {
    pub fn new(theme: Theme, seed: u64) -> Self {
        let cfg = theme.config();
        Self {
            theme,
            phase: SimPhase::Idle,
            history: BoundedHistory::new(cfg.history_cap),
            selection: Selection::new(),
            clock: GrowthClock::new(cfg.spawn_interval_ms),
            rng: Pcg32::seed_from_u64(seed),
            seed,
            generated: 0,
            base_height: None,
            next_id: 0,
        }
    }

    pub fn config(&self) -> &'static ThemeConfig {
        self.theme.config()
    }

    /// Whether the one-shot height fetch has settled (either branch).
    pub fn chain_ready(&self) -> bool {
        self.base_height.is_some()
    }

    /// User pressed start. Runs immediately if the fetch already settled,
    /// otherwise waits in Syncing until it does.
    pub fn start(&mut self, now_ms: f64) {
        if self.phase != SimPhase::Idle {
            return;
        }
        if self.chain_ready() {
            self.begin_running(now_ms);
        } else {
            self.phase = SimPhase::Syncing;
        }
    }

    /// Fetch resolved with a real height.
    pub fn on_chain_height(&mut self, height: u64, now_ms: f64) {
        self.base_height = Some(height);
        if self.phase == SimPhase::Syncing {
            self.begin_running(now_ms);
        }
    }

    /// Fetch failed; substitute the skin's fallback and proceed.
    pub fn on_chain_failed(&mut self, now_ms: f64) {
        let fallback = self.config().fallback_height;
        log::warn!(
            "height fetch failed, using fallback {} for {}",
            fallback,
            self.config().name
        );
        self.on_chain_height(fallback, now_ms);
    }

    /// Toggle between Running and Paused; no-op in other phases.
    pub fn toggle_pause(&mut self, now_ms: f64) {
        match self.phase {
            SimPhase::Running => {
                self.phase = SimPhase::Paused;
                log::info!("paused at {} blocks", self.history.len());
            }
            SimPhase::Paused => {
                self.phase = SimPhase::Running;
                // Re-arm so a long pause does not spawn on the next frame.
                self.clock.reset(now_ms);
                log::info!("resumed");
            }
            _ => {}
        }
    }

    /// Allocate the next block id.
    pub fn next_block_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Count shown in the HUD: base height plus everything we generated.
    pub fn display_height(&self) -> u64 {
        self.base_height.unwrap_or(self.config().fallback_height) + self.generated
    }

    fn begin_running(&mut self, now_ms: f64) {
        self.spawn_genesis(now_ms);
        self.clock.reset(now_ms);
        self.phase = SimPhase::Running;
        log::info!(
            "{} visualization running (seed {})",
            self.config().name,
            self.seed
        );
    }

    /// Pre-seed the origin block. Generated ids then start at 1.
    fn spawn_genesis(&mut self, now_ms: f64) {
        let id = self.next_block_id();
        debug_assert_eq!(id, 0);
        let hash = synth_hash(&mut self.rng);
        let work = 1.0e12;
        self.history.push(Block::genesis(now_ms, hash, work));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_flow_with_early_fetch() {
        let mut s = SimState::new(Theme::Kaspa, 1);
        assert_eq!(s.phase, SimPhase::Idle);

        s.on_chain_height(1000, 0.0);
        // Fetch settling alone never starts the run.
        assert_eq!(s.phase, SimPhase::Idle);

        s.start(10.0);
        assert_eq!(s.phase, SimPhase::Running);
        assert_eq!(s.history.len(), 1);
        assert_eq!(s.history.newest().unwrap().id, 0);
    }

    #[test]
    fn test_phase_flow_with_slow_fetch() {
        let mut s = SimState::new(Theme::Sui, 1);
        s.start(0.0);
        assert_eq!(s.phase, SimPhase::Syncing);
        assert!(s.history.is_empty());

        s.on_chain_height(5000, 50.0);
        assert_eq!(s.phase, SimPhase::Running);
        assert_eq!(s.history.len(), 1);
        assert_eq!(s.display_height(), 5000);
    }

    #[test]
    fn test_fetch_failure_uses_fallback() {
        let mut s = SimState::new(Theme::Kaspa, 1);
        s.start(0.0);
        s.on_chain_failed(10.0);
        assert_eq!(s.phase, SimPhase::Running);
        assert_eq!(s.base_height, Some(Theme::Kaspa.config().fallback_height));
    }

    #[test]
    fn test_pause_toggle() {
        let mut s = SimState::new(Theme::Kaspa, 1);
        s.on_chain_height(0, 0.0);
        s.start(0.0);

        s.toggle_pause(100.0);
        assert_eq!(s.phase, SimPhase::Paused);
        s.toggle_pause(200.0);
        assert_eq!(s.phase, SimPhase::Running);
    }

    #[test]
    fn test_pause_ignored_before_running() {
        let mut s = SimState::new(Theme::Kaspa, 1);
        s.toggle_pause(0.0);
        assert_eq!(s.phase, SimPhase::Idle);
        s.start(0.0);
        s.toggle_pause(0.0);
        assert_eq!(s.phase, SimPhase::Syncing);
    }

    #[test]
    fn test_start_is_idempotent() {
        let mut s = SimState::new(Theme::Kaspa, 1);
        s.on_chain_height(0, 0.0);
        s.start(0.0);
        s.start(10.0);
        assert_eq!(s.history.len(), 1);
    }
}
