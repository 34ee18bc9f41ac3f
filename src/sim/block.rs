//! Block record and category types
//!
//! A block is immutable once generated; the only thing that ever happens
//! to it afterwards is eviction from the bounded history.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Visual/audio category of a block, drawn at generation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BlockKind {
    #[default]
    Normal,
    /// Rare high-roll block, rendered gold with a chime cue.
    Gold,
    /// Second rare tier. Unreachable on the Sui skin (threshold ordering).
    Anomaly,
}

impl BlockKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::Normal => "Normal",
            BlockKind::Gold => "Gold",
            BlockKind::Anomaly => "Anomaly",
        }
    }
}

/// One simulated block in the DAG.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    /// Monotonically increasing, unique, never reused. Genesis is 0.
    pub id: u64,
    /// World position; z grows with id, x/y are random within theme bounds.
    pub pos: Vec3,
    /// Ids of parent blocks, all strictly older than this block.
    pub parents: Vec<u64>,
    pub kind: BlockKind,
    /// Wall-clock ms at generation, supplied by the shell.
    pub created_at_ms: f64,
    /// Synthetic 64-char hex string; not derived from content.
    pub hash: String,
    /// Synthetic difficulty-like metric; no relation to any real network.
    pub work: f64,
}

impl Block {
    /// Pre-seeded origin block: id 0, centered, no parents.
    pub fn genesis(created_at_ms: f64, hash: String, work: f64) -> Self {
        Self {
            id: 0,
            pos: Vec3::ZERO,
            parents: Vec::new(),
            kind: BlockKind::Normal,
            created_at_ms,
            hash,
            work,
        }
    }

    /// Short display form of the hash for the details panel.
    pub fn short_hash(&self) -> String {
        if self.hash.len() <= 16 {
            self.hash.clone()
        } else {
            format!("{}…{}", &self.hash[..8], &self.hash[self.hash.len() - 8..])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genesis_shape() {
        let g = Block::genesis(0.0, "ab".repeat(32), 1.0);
        assert_eq!(g.id, 0);
        assert!(g.parents.is_empty());
        assert_eq!(g.kind, BlockKind::Normal);
        assert_eq!(g.pos, Vec3::ZERO);
    }

    #[test]
    fn test_short_hash() {
        let g = Block::genesis(0.0, "0123456789abcdef".repeat(4), 1.0);
        assert_eq!(g.short_hash(), "01234567…89abcdef");
    }
}
