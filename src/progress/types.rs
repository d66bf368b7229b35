/// Progress data model: the persisted record plus the read-only content
/// definitions the engine evaluates against.
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::progress::rank::RankTier;

/// Which progress counter an achievement rule is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RequirementType {
    VisitCount,
    CollectCount,
    PointsTotal,
}

/// Achievement rule definition (content, read-only to the engine)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub points: u32,
    pub requirement_type: RequirementType,
    pub requirement_value: u64,
}

impl Achievement {
    pub fn new(
        id: &str,
        title: &str,
        requirement_type: RequirementType,
        requirement_value: u64,
        points: u32,
    ) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            description: String::new(),
            icon: "🏆".to_string(),
            points,
            requirement_type,
            requirement_value,
        }
    }

    pub fn with_icon(mut self, icon: &str) -> Self {
        self.icon = icon.to_string();
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    /// Current value of the counter this rule is measured against.
    pub fn current_value(&self, state: &ProgressState) -> u64 {
        match self.requirement_type {
            RequirementType::VisitCount => state.visited_attractions.len() as u64,
            RequirementType::CollectCount => state.collected_items.len() as u64,
            RequirementType::PointsTotal => state.total_points,
        }
    }

    pub fn is_satisfied_by(&self, state: &ProgressState) -> bool {
        self.current_value(state) >= self.requirement_value
    }
}

/// Collectible rarity tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Rarity {
    #[default]
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

/// A collectible item hidden at an attraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collectible {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub points: u32,
    #[serde(default)]
    pub rarity: Rarity,
}

/// Persisted record of a user's accumulated progress.
///
/// `current_rank` is derived from `total_points` by the engine and never set
/// by callers. `unlocked_achievements` keeps unlock order and holds each id
/// at most once. Missing fields decode to their zero value so older or
/// partial records still load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ProgressState {
    pub total_points: u64,
    pub current_rank: RankTier,
    pub visited_attractions: BTreeSet<String>,
    pub collected_items: BTreeSet<String>,
    pub unlocked_achievements: Vec<String>,
}

impl ProgressState {
    pub fn has_visited(&self, attraction_id: &str) -> bool {
        self.visited_attractions.contains(attraction_id)
    }

    pub fn has_collected(&self, item_id: &str) -> bool {
        self.collected_items.contains(item_id)
    }

    pub fn is_unlocked(&self, achievement_id: &str) -> bool {
        self.unlocked_achievements.iter().any(|id| id == achievement_id)
    }
}

/// Produced once per newly unlocked achievement; never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnlockEvent {
    pub achievement: Achievement,
    pub points_awarded: u32,
}

/// Read-only overview for status displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressSummary {
    pub total_points: u64,
    pub rank: RankTier,
    pub rank_icon: String,
    pub next_rank: Option<RankTier>,
    pub points_to_next_rank: u64,
    pub visited_count: usize,
    pub collected_count: usize,
    pub unlocked_count: usize,
    pub achievement_count: usize,
}
