//! Explorer rank tiers and threshold lookup.

use serde::{Deserialize, Serialize};

use crate::progress::errors::ProgressError;

/// Rank tier identifiers, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum RankTier {
    #[default]
    Novice,
    Traveler,
    Explorer,
    Adventurer,
    Globetrotter,
    Legend,
}

impl RankTier {
    pub const ALL: [RankTier; 6] = [
        RankTier::Novice,
        RankTier::Traveler,
        RankTier::Explorer,
        RankTier::Adventurer,
        RankTier::Globetrotter,
        RankTier::Legend,
    ];

    /// Display name for the tier.
    pub fn name(&self) -> &'static str {
        match self {
            RankTier::Novice => "Novice",
            RankTier::Traveler => "Traveler",
            RankTier::Explorer => "Explorer",
            RankTier::Adventurer => "Adventurer",
            RankTier::Globetrotter => "Globetrotter",
            RankTier::Legend => "Legend",
        }
    }
}

/// One row of the rank table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankEntry {
    pub tier: RankTier,
    #[serde(default)]
    pub icon: String,
    pub required_points: u64,
}

impl RankEntry {
    pub fn new(tier: RankTier, icon: &str, required_points: u64) -> Self {
        Self {
            tier,
            icon: icon.to_string(),
            required_points,
        }
    }
}

/// Immutable, validated tier table ordered by strictly increasing threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankTable {
    entries: Vec<RankEntry>,
}

impl RankTable {
    /// Build a table, rejecting empty tables, a non-zero first threshold,
    /// thresholds that do not strictly increase, and repeated tiers.
    pub fn new(entries: Vec<RankEntry>) -> Result<Self, ProgressError> {
        let Some(first) = entries.first() else {
            return Err(ProgressError::content("rank table is empty"));
        };
        if first.required_points != 0 {
            return Err(ProgressError::content(format!(
                "lowest rank {} must start at 0 points, found {}",
                first.tier.name(),
                first.required_points
            )));
        }
        for pair in entries.windows(2) {
            if pair[1].required_points <= pair[0].required_points {
                return Err(ProgressError::content(format!(
                    "rank thresholds must strictly increase: {} ({}) after {} ({})",
                    pair[1].tier.name(),
                    pair[1].required_points,
                    pair[0].tier.name(),
                    pair[0].required_points
                )));
            }
            if entries.iter().filter(|e| e.tier == pair[1].tier).count() > 1 {
                return Err(ProgressError::content(format!(
                    "rank tier {} listed more than once",
                    pair[1].tier.name()
                )));
            }
        }
        Ok(Self { entries })
    }

    /// The built-in explorer ladder.
    pub fn explorer_default() -> Self {
        Self {
            entries: vec![
                RankEntry::new(RankTier::Novice, "🧭", 0),
                RankEntry::new(RankTier::Traveler, "🎒", 100),
                RankEntry::new(RankTier::Explorer, "🗺️", 300),
                RankEntry::new(RankTier::Adventurer, "🏔️", 600),
                RankEntry::new(RankTier::Globetrotter, "✈️", 1000),
                RankEntry::new(RankTier::Legend, "👑", 2000),
            ],
        }
    }

    pub fn entries(&self) -> &[RankEntry] {
        &self.entries
    }

    pub fn lowest(&self) -> RankTier {
        self.entries[0].tier
    }

    /// Highest tier whose threshold is at or below `points`. Scans from the
    /// top down; the first entry is always 0 so a tier is always found.
    pub fn rank_for(&self, points: u64) -> RankTier {
        self.entries
            .iter()
            .rev()
            .find(|e| e.required_points <= points)
            .map(|e| e.tier)
            .unwrap_or_else(|| self.lowest())
    }

    pub fn entry(&self, tier: RankTier) -> Option<&RankEntry> {
        self.entries.iter().find(|e| e.tier == tier)
    }

    /// Tier after `tier`, or `None` at the top of the ladder.
    pub fn next_rank(&self, tier: RankTier) -> Option<&RankEntry> {
        let idx = self.entries.iter().position(|e| e.tier == tier)?;
        self.entries.get(idx + 1)
    }

    /// Points still needed to reach the next tier (0 at the top).
    pub fn points_to_next(&self, points: u64) -> u64 {
        match self.next_rank(self.rank_for(points)) {
            Some(next) => next.required_points.saturating_sub(points),
            None => 0,
        }
    }
}

impl Default for RankTable {
    fn default() -> Self {
        Self::explorer_default()
    }
}
