//! Per-frame simulation tick
//!
//! The shell calls [`tick`] exactly once per rendered frame. Everything
//! that can change outside of user input happens here: the growth clock
//! is polled, at most one block is generated and appended, and the two
//! injected collaborators (stats sink, notifier) are invoked for the
//! spawn. Selection is never touched by the tick.

use super::block::BlockKind;
use super::generate::next_block;
use super::state::{SimPhase, SimState};
use crate::theme::RateMode;
use rand::Rng;

/// Display-counter write target, injected by the shell so the core never
/// touches the DOM and nothing re-renders reactively per tick.
pub trait StatsSink {
    fn report(&mut self, rate: f32, height: u64);
}

/// Fire-and-forget notification collaborator, keyed by block category.
pub trait Notifier {
    fn notify(&mut self, kind: BlockKind);
}

impl StatsSink for () {
    fn report(&mut self, _rate: f32, _height: u64) {}
}

impl Notifier for () {
    fn notify(&mut self, _kind: BlockKind) {}
}

/// Advance the simulation by one frame.
///
/// No-op unless the phase is Running and the clock interval has elapsed.
/// At most one block is produced per call regardless of how late the
/// frame is; there is no catch-up.
pub fn tick<S: StatsSink, N: Notifier>(
    state: &mut SimState,
    now_ms: f64,
    stats: &mut S,
    notifier: &mut N,
) {
    if state.phase != SimPhase::Running {
        return;
    }
    if !state.clock.should_fire(now_ms) {
        return;
    }

    let elapsed_ms = state.clock.fire(now_ms);
    let cfg = state.theme.config();

    let id = state.next_block_id();
    let block = next_block(&state.history, id, now_ms, cfg, &mut state.rng);
    let kind = block.kind;
    state.history.push(block);
    state.generated += 1;

    let rate = match cfg.rate {
        RateMode::Measured => (1000.0 / elapsed_ms) as f32,
        RateMode::Synthetic { lo, hi } => state.rng.random_range(lo..hi),
    };
    stats.report(rate, state.display_height());
    notifier.notify(kind);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::Theme;
    use proptest::prelude::*;

    #[derive(Default)]
    struct RecordingSink {
        reports: Vec<(f32, u64)>,
    }

    impl StatsSink for RecordingSink {
        fn report(&mut self, rate: f32, height: u64) {
            self.reports.push((rate, height));
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        kinds: Vec<BlockKind>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&mut self, kind: BlockKind) {
            self.kinds.push(kind);
        }
    }

    fn running_state(theme: Theme, seed: u64) -> SimState {
        let mut s = SimState::new(theme, seed);
        s.on_chain_height(1_000_000, 0.0);
        s.start(0.0);
        s
    }

    fn run_ticks(state: &mut SimState, count: usize) -> (RecordingSink, RecordingNotifier) {
        let interval = state.config().spawn_interval_ms;
        let mut sink = RecordingSink::default();
        let mut notifier = RecordingNotifier::default();
        for i in 0..count {
            let now = (i as f64 + 1.0) * interval;
            tick(state, now, &mut sink, &mut notifier);
        }
        (sink, notifier)
    }

    #[test]
    fn test_ids_increase_by_one_from_genesis() {
        let mut s = running_state(Theme::Kaspa, 5);
        run_ticks(&mut s, 20);
        let ids: Vec<u64> = s.history.iter().map(|b| b.id).collect();
        assert_eq!(ids, (0..=20).collect::<Vec<u64>>());
    }

    #[test]
    fn test_below_interval_mutates_nothing() {
        let mut s = running_state(Theme::Kaspa, 5);
        s.selection.set(Some(0));
        let mut sink = RecordingSink::default();
        let mut notifier = RecordingNotifier::default();

        // Clock armed at 0.0; interval is 300ms.
        tick(&mut s, 299.0, &mut sink, &mut notifier);

        assert_eq!(s.history.len(), 1);
        assert_eq!(s.generated, 0);
        assert_eq!(s.selection.get(), Some(0));
        assert!(sink.reports.is_empty());
        assert!(notifier.kinds.is_empty());
    }

    #[test]
    fn test_no_spawn_unless_running() {
        let mut sink = RecordingSink::default();
        let mut notifier = RecordingNotifier::default();

        let mut idle = SimState::new(Theme::Kaspa, 5);
        tick(&mut idle, 10_000.0, &mut sink, &mut notifier);
        assert!(idle.history.is_empty());

        let mut paused = running_state(Theme::Kaspa, 5);
        paused.toggle_pause(100.0);
        tick(&mut paused, 10_000.0, &mut sink, &mut notifier);
        assert_eq!(paused.history.len(), 1);
        assert!(sink.reports.is_empty());
    }

    #[test]
    fn test_one_block_per_frame_no_catchup() {
        let mut s = running_state(Theme::Kaspa, 5);
        let mut sink = RecordingSink::default();
        let mut notifier = RecordingNotifier::default();
        // Ten intervals pass before the next frame; only one block spawns.
        tick(&mut s, 3000.0, &mut sink, &mut notifier);
        assert_eq!(s.generated, 1);
        assert_eq!(sink.reports.len(), 1);
    }

    #[test]
    fn test_cap_and_eviction_order() {
        let mut s = running_state(Theme::Kaspa, 5);
        run_ticks(&mut s, 200);
        let cap = s.config().history_cap;
        assert_eq!(s.history.len(), cap);
        // 200 generated + genesis, minus cap survivors.
        let expected_oldest = 200 + 1 - cap as u64;
        assert_eq!(s.history.oldest().unwrap().id, expected_oldest);
    }

    #[test]
    fn test_stats_report_height_and_count() {
        let mut s = running_state(Theme::Sui, 5);
        let (sink, notifier) = run_ticks(&mut s, 3);
        assert_eq!(sink.reports.len(), 3);
        assert_eq!(notifier.kinds.len(), 3);
        let heights: Vec<u64> = sink.reports.iter().map(|r| r.1).collect();
        assert_eq!(heights, vec![1_000_001, 1_000_002, 1_000_003]);
    }

    #[test]
    fn test_measured_rate_tracks_gap() {
        let mut s = running_state(Theme::Kaspa, 5);
        let mut sink = RecordingSink::default();
        let mut notifier = RecordingNotifier::default();
        // Armed at 0, fired at 500ms: 2 blocks/sec.
        tick(&mut s, 500.0, &mut sink, &mut notifier);
        let (rate, _) = sink.reports[0];
        assert!((rate - 2.0).abs() < 1.0e-3);
    }

    #[test]
    fn test_synthetic_rate_within_range() {
        let mut s = running_state(Theme::Sui, 5);
        let (sink, _) = run_ticks(&mut s, 10);
        for (rate, _) in sink.reports {
            assert!((1800.0..2600.0).contains(&rate));
        }
    }

    proptest! {
        #[test]
        fn prop_growth_invariants(seed in any::<u64>(), ticks in 0usize..300) {
            for theme in [Theme::Kaspa, Theme::Sui] {
                let mut s = running_state(theme, seed);
                run_ticks(&mut s, ticks);

                let cap = s.config().history_cap;
                prop_assert!(s.history.len() <= cap);

                let ids: Vec<u64> = s.history.iter().map(|b| b.id).collect();
                prop_assert!(ids.windows(2).all(|w| w[1] == w[0] + 1));

                for b in s.history.iter() {
                    if b.id != 0 {
                        prop_assert!(!b.parents.is_empty());
                    }
                    for &p in &b.parents {
                        prop_assert!(p < b.id);
                    }
                }
            }
        }
    }
}
