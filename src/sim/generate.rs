//! Block generator
//!
//! Produces one new block from the current history and a seeded RNG.
//! The draw order is fixed and load-bearing for reproducibility:
//! position x, y → parent coin flip per candidate → category → hash →
//! work. Reordering the draws changes every skin's visual output for a
//! given seed.

use glam::Vec3;
use rand::Rng;

use super::block::{Block, BlockKind};
use super::history::BoundedHistory;
use crate::theme::ThemeConfig;

/// Map a uniform [0,1) draw to a category. Checked gold-first; on the Sui
/// skin the anomaly threshold sits above gold, leaving that branch dead.
pub fn kind_for_draw(draw: f64, cfg: &ThemeConfig) -> BlockKind {
    if draw > cfg.gold_threshold {
        BlockKind::Gold
    } else if draw > cfg.anomaly_threshold {
        BlockKind::Anomaly
    } else {
        BlockKind::Normal
    }
}

/// Generate the next block.
///
/// Pure aside from the RNG draws; `now_ms` is supplied by the caller.
/// Parent candidates are the most recent `parent_window` blocks, each
/// included independently; if every flip misses and the history is
/// non-empty, the newest block is force-included so nothing but genesis
/// ever floats free.
pub fn next_block<R: Rng>(
    history: &BoundedHistory,
    id: u64,
    now_ms: f64,
    cfg: &ThemeConfig,
    rng: &mut R,
) -> Block {
    let x = rng.random_range(-cfg.spread..cfg.spread);
    let y = rng.random_range(-cfg.spread..cfg.spread);
    let pos = Vec3::new(x, y, id as f32 * cfg.layer_spacing);

    let skip = history.len().saturating_sub(cfg.parent_window);
    let mut parents: Vec<u64> = Vec::new();
    for candidate in history.iter().skip(skip) {
        if rng.random_bool(cfg.parent_chance) {
            parents.push(candidate.id);
        }
    }
    if parents.is_empty() {
        if let Some(newest) = history.newest() {
            parents.push(newest.id);
        }
    }

    let kind = kind_for_draw(rng.random::<f64>(), cfg);

    Block {
        id,
        pos,
        parents,
        kind,
        created_at_ms: now_ms,
        hash: synth_hash(rng),
        work: rng.random_range(1.0e12..9.0e12),
    }
}

/// Random 64-char hex string. Looks like a hash, is not one.
pub fn synth_hash<R: Rng>(rng: &mut R) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    (0..64)
        .map(|_| HEX[rng.random_range(0..16usize)] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::{KASPA, RateMode, SUI};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn custom(parent_chance: f64) -> ThemeConfig {
        ThemeConfig {
            name: "Test",
            ticker: "TST",
            rate_label: "BPS",
            spawn_interval_ms: 300.0,
            history_cap: 20,
            parent_window: 4,
            parent_chance,
            gold_threshold: 0.95,
            anomaly_threshold: 0.90,
            spread: 10.0,
            layer_spacing: 2.0,
            rate: RateMode::Measured,
            height_endpoint: "",
            height_field: "",
            fallback_height: 0,
        }
    }

    fn seeded_history(cfg: &ThemeConfig, count: u64) -> BoundedHistory {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut h = BoundedHistory::new(cfg.history_cap);
        h.push(Block::genesis(0.0, synth_hash(&mut rng), 1.0));
        for id in 1..count {
            let b = next_block(&h, id, id as f64 * 100.0, cfg, &mut rng);
            h.push(b);
        }
        h
    }

    #[test]
    fn test_kind_thresholds_kaspa() {
        assert_eq!(kind_for_draw(0.97, &KASPA), BlockKind::Gold);
        assert_eq!(kind_for_draw(0.92, &KASPA), BlockKind::Anomaly);
        assert_eq!(kind_for_draw(0.50, &KASPA), BlockKind::Normal);
        assert_eq!(kind_for_draw(0.90, &KASPA), BlockKind::Normal);
    }

    #[test]
    fn test_kind_thresholds_sui() {
        assert_eq!(kind_for_draw(0.97, &SUI), BlockKind::Gold);
        // The anomaly band starts above the gold threshold, so the gold
        // arm swallows everything; 0.92 falls through to Normal.
        assert_eq!(kind_for_draw(0.92, &SUI), BlockKind::Normal);
        assert_eq!(kind_for_draw(0.99, &SUI), BlockKind::Gold);
    }

    #[test]
    fn test_empty_history_no_parents() {
        let cfg = custom(0.5);
        let mut rng = Pcg32::seed_from_u64(1);
        let h = BoundedHistory::new(cfg.history_cap);
        let b = next_block(&h, 0, 0.0, &cfg, &mut rng);
        assert!(b.parents.is_empty());
    }

    #[test]
    fn test_forced_parent_when_flips_miss() {
        let cfg = custom(0.0);
        let mut rng = Pcg32::seed_from_u64(1);
        let h = seeded_history(&cfg, 5);
        let b = next_block(&h, 5, 500.0, &cfg, &mut rng);
        assert_eq!(b.parents, vec![h.newest().unwrap().id]);
    }

    #[test]
    fn test_all_candidates_included_at_certainty() {
        let cfg = custom(1.0);
        let mut rng = Pcg32::seed_from_u64(1);
        let h = seeded_history(&cfg, 10);
        let b = next_block(&h, 10, 1000.0, &cfg, &mut rng);
        assert_eq!(b.parents.len(), cfg.parent_window);
        // Candidates are visited oldest-to-newest.
        assert!(b.parents.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_parents_strictly_older() {
        let cfg = custom(0.5);
        let h = seeded_history(&cfg, 30);
        for b in h.iter() {
            for &p in &b.parents {
                assert!(p < b.id, "parent {p} not older than block {}", b.id);
            }
        }
    }

    #[test]
    fn test_non_genesis_always_has_parent() {
        let cfg = custom(0.5);
        let h = seeded_history(&cfg, 30);
        for b in h.iter().filter(|b| b.id != 0) {
            assert!(!b.parents.is_empty(), "block {} has no parents", b.id);
        }
    }

    #[test]
    fn test_position_progression() {
        let cfg = custom(0.5);
        let h = seeded_history(&cfg, 15);
        for b in h.iter() {
            assert_eq!(b.pos.z, b.id as f32 * cfg.layer_spacing);
            assert!(b.pos.x.abs() <= cfg.spread);
            assert!(b.pos.y.abs() <= cfg.spread);
        }
    }

    #[test]
    fn test_determinism_same_seed() {
        let cfg = custom(0.5);
        let h = seeded_history(&cfg, 8);
        let mut rng1 = Pcg32::seed_from_u64(42);
        let mut rng2 = Pcg32::seed_from_u64(42);
        let a = next_block(&h, 8, 800.0, &cfg, &mut rng1);
        let b = next_block(&h, 8, 800.0, &cfg, &mut rng2);
        assert_eq!(a.pos, b.pos);
        assert_eq!(a.parents, b.parents);
        assert_eq!(a.kind, b.kind);
        assert_eq!(a.hash, b.hash);
        assert_eq!(a.work, b.work);
    }

    #[test]
    fn test_synth_hash_shape() {
        let mut rng = Pcg32::seed_from_u64(3);
        let h = synth_hash(&mut rng);
        assert_eq!(h.len(), 64);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
