//! Visual themes ("skins") and their fixed tuning constants.
//!
//! Each theme is a complete configuration surface for the simulation and
//! its presentation: spawn cadence, history cap, parent selection window,
//! category thresholds, spatial bounds, and the chain endpoint used for
//! the display-height base. Nothing here is runtime-tunable beyond
//! choosing the skin itself.

use serde::{Deserialize, Serialize};

/// How the HUD rate counter is produced each tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RateMode {
    /// Instantaneous rate derived from the measured gap between spawns.
    Measured,
    /// Uniform random draw from the given range (the counter is theater).
    Synthetic { lo: f32, hi: f32 },
}

/// Available skins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Theme {
    #[default]
    Kaspa,
    Sui,
}

impl Theme {
    /// Parse from a URL query string (`?theme=sui`), defaulting to Kaspa.
    pub fn from_query(query: &str) -> Self {
        let q = query.trim_start_matches('?').to_lowercase();
        for pair in q.split('&') {
            if let Some(value) = pair.strip_prefix("theme=") {
                return match value {
                    "sui" => Theme::Sui,
                    _ => Theme::Kaspa,
                };
            }
        }
        Theme::Kaspa
    }

    pub fn config(self) -> &'static ThemeConfig {
        match self {
            Theme::Kaspa => &KASPA,
            Theme::Sui => &SUI,
        }
    }
}

/// Fixed per-skin tuning. See module docs.
#[derive(Debug, Clone)]
pub struct ThemeConfig {
    /// Display name shown in the HUD header.
    pub name: &'static str,
    /// Ticker symbol for the details panel.
    pub ticker: &'static str,
    /// HUD label for the rate counter ("BPS" / "TPS").
    pub rate_label: &'static str,

    /// Minimum wall-clock gap between spawned blocks (ms).
    pub spawn_interval_ms: f64,
    /// Hard cap on retained blocks; oldest evicted first.
    pub history_cap: usize,

    /// How many most-recent blocks are parent candidates.
    pub parent_window: usize,
    /// Independent inclusion probability per candidate.
    pub parent_chance: f64,

    /// Category draw above this is Gold.
    pub gold_threshold: f64,
    /// Otherwise, a draw above this is an Anomaly. On Sui this sits above
    /// the gold threshold, which makes the branch unreachable; the source
    /// behaved this way and the skins must stay visually identical to it.
    pub anomaly_threshold: f64,

    /// Half-extent of the uniform x/y placement range (world units).
    pub spread: f32,
    /// World-space z advance per block id.
    pub layer_spacing: f32,

    /// How the HUD rate is produced.
    pub rate: RateMode,

    /// Endpoint for the one-shot height fetch.
    pub height_endpoint: &'static str,
    /// Field holding the integer-like height in the response object.
    pub height_field: &'static str,
    /// Substituted when the fetch fails in any way.
    pub fallback_height: u64,
}

pub const KASPA: ThemeConfig = ThemeConfig {
    name: "Kaspa",
    ticker: "KAS",
    rate_label: "BPS",
    spawn_interval_ms: 300.0,
    history_cap: 75,
    parent_window: 6,
    parent_chance: 0.5,
    gold_threshold: 0.95,
    anomaly_threshold: 0.90,
    spread: 14.0,
    layer_spacing: 3.0,
    rate: RateMode::Measured,
    height_endpoint: "https://api.kaspa.org/info/blockdag",
    height_field: "blockCount",
    fallback_height: 104_000_000,
};

pub const SUI: ThemeConfig = ThemeConfig {
    name: "Sui",
    ticker: "SUI",
    rate_label: "TPS",
    spawn_interval_ms: 600.0,
    history_cap: 40,
    parent_window: 8,
    parent_chance: 0.35,
    gold_threshold: 0.95,
    anomaly_threshold: 0.98,
    spread: 18.0,
    layer_spacing: 4.0,
    rate: RateMode::Synthetic {
        lo: 1800.0,
        hi: 2600.0,
    },
    height_endpoint: "https://api.suiscan.xyz/api/sui/checkpoints/latest",
    height_field: "sequenceNumber",
    fallback_height: 168_000_000,
};
