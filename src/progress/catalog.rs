//! Content loaders for achievement rules, collectibles and rank tables.
//!
//! Content is read once at startup from JSON files so curators can change the
//! rule set without recompiling. Any problem here is a `ContentLoad` error:
//! a broken catalog has no safe default.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::logutil::escape_log;
use crate::progress::errors::ProgressError;
use crate::progress::rank::{RankEntry, RankTable};
use crate::progress::types::{Achievement, Collectible, ProgressState};

/// Ordered, read-only set of achievement rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AchievementCatalog {
    achievements: Vec<Achievement>,
}

/// Per-rule progress row for browsers and status output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AchievementProgress<'a> {
    pub achievement: &'a Achievement,
    pub current: u64,
    pub target: u64,
    pub unlocked: bool,
}

impl AchievementCatalog {
    /// Validate and wrap a rule list. Ids must be non-empty and unique.
    pub fn new(achievements: Vec<Achievement>) -> Result<Self, ProgressError> {
        let mut seen = HashSet::new();
        for achievement in &achievements {
            if achievement.id.trim().is_empty() {
                return Err(ProgressError::content("achievement with empty id"));
            }
            if !seen.insert(achievement.id.as_str()) {
                return Err(ProgressError::content(format!(
                    "duplicate achievement id: {}",
                    achievement.id
                )));
            }
            if achievement.requirement_value == 0 {
                warn!(
                    "achievement '{}' has a zero requirement and unlocks on first evaluation",
                    escape_log(&achievement.id)
                );
            }
        }
        Ok(Self { achievements })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Achievement> {
        self.achievements.iter()
    }

    pub fn len(&self) -> usize {
        self.achievements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.achievements.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Achievement> {
        self.achievements.iter().find(|a| a.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Progress toward every rule, in catalog order.
    pub fn progress_for<'a>(&'a self, state: &ProgressState) -> Vec<AchievementProgress<'a>> {
        self.achievements
            .iter()
            .map(|achievement| AchievementProgress {
                achievement,
                current: achievement.current_value(state).min(achievement.requirement_value),
                target: achievement.requirement_value,
                unlocked: state.is_unlocked(&achievement.id),
            })
            .collect()
    }

    /// Resolve the state's unlocked ids to definitions, keeping unlock order.
    pub fn unlocked<'a>(&'a self, state: &ProgressState) -> Vec<&'a Achievement> {
        state
            .unlocked_achievements
            .iter()
            .filter_map(|id| self.get(id))
            .collect()
    }
}

/// Read-only collectible definitions, looked up by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectibleCatalog {
    collectibles: Vec<Collectible>,
}

impl CollectibleCatalog {
    pub fn new(collectibles: Vec<Collectible>) -> Result<Self, ProgressError> {
        let mut seen = HashSet::new();
        for item in &collectibles {
            if item.id.trim().is_empty() {
                return Err(ProgressError::content("collectible with empty id"));
            }
            if !seen.insert(item.id.as_str()) {
                return Err(ProgressError::content(format!(
                    "duplicate collectible id: {}",
                    item.id
                )));
            }
        }
        Ok(Self { collectibles })
    }

    pub fn get(&self, id: &str) -> Option<&Collectible> {
        self.collectibles.iter().find(|c| c.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Collectible> {
        self.collectibles.iter()
    }

    pub fn len(&self) -> usize {
        self.collectibles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collectibles.is_empty()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct AchievementsFile {
    achievements: Vec<Achievement>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CollectiblesFile {
    collectibles: Vec<Collectible>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RanksFile {
    ranks: Vec<RankEntry>,
}

fn read_content<P: AsRef<Path>>(path: P) -> Result<String, ProgressError> {
    let path = path.as_ref();
    fs::read_to_string(path).map_err(|e| {
        ProgressError::content(format!("failed to read {}: {}", path.display(), e))
    })
}

fn parse_content<T: serde::de::DeserializeOwned>(
    path: &Path,
    contents: &str,
) -> Result<T, ProgressError> {
    serde_json::from_str(contents).map_err(|e| {
        ProgressError::content(format!("failed to parse {}: {}", path.display(), e))
    })
}

/// Parse an achievements document (`{"achievements": [...]}`).
pub fn parse_achievements(json: &str) -> Result<AchievementCatalog, ProgressError> {
    let file: AchievementsFile = parse_content(Path::new("<achievements>"), json)?;
    AchievementCatalog::new(file.achievements)
}

/// Load achievements from a JSON content file.
pub fn load_achievements_from_json<P: AsRef<Path>>(
    path: P,
) -> Result<AchievementCatalog, ProgressError> {
    let path = path.as_ref();
    let contents = read_content(path)?;
    let file: AchievementsFile = parse_content(path, &contents)?;
    let catalog = AchievementCatalog::new(file.achievements)?;
    debug!("loaded {} achievements from {}", catalog.len(), path.display());
    Ok(catalog)
}

/// Load collectibles from a JSON content file.
pub fn load_collectibles_from_json<P: AsRef<Path>>(
    path: P,
) -> Result<CollectibleCatalog, ProgressError> {
    let path = path.as_ref();
    let contents = read_content(path)?;
    let file: CollectiblesFile = parse_content(path, &contents)?;
    let catalog = CollectibleCatalog::new(file.collectibles)?;
    debug!("loaded {} collectibles from {}", catalog.len(), path.display());
    Ok(catalog)
}

/// Load a rank table from a JSON content file.
pub fn load_ranks_from_json<P: AsRef<Path>>(path: P) -> Result<RankTable, ProgressError> {
    let path = path.as_ref();
    let contents = read_content(path)?;
    let file: RanksFile = parse_content(path, &contents)?;
    RankTable::new(file.ranks)
}

/// Starter rule set written by `wayfarer init`.
pub fn starter_achievements() -> Vec<Achievement> {
    use crate::progress::types::RequirementType::*;
    vec![
        Achievement::new("first_steps", "First Steps", VisitCount, 1, 10)
            .with_icon("👣")
            .with_description("Visit your first attraction"),
        Achievement::new("sightseer", "Sightseer", VisitCount, 10, 50)
            .with_icon("📸")
            .with_description("Visit 10 attractions"),
        Achievement::new("treasure_hunter", "Treasure Hunter", CollectCount, 1, 15)
            .with_icon("💎")
            .with_description("Find your first collectible"),
        Achievement::new("curator", "Curator", CollectCount, 10, 75)
            .with_icon("🏛️")
            .with_description("Collect 10 items"),
        Achievement::new("centurion", "Centurion", PointsTotal, 100, 25)
            .with_icon("💯")
            .with_description("Earn 100 XP"),
        Achievement::new("seasoned", "Seasoned Traveler", PointsTotal, 500, 100)
            .with_icon("🌍")
            .with_description("Earn 500 XP"),
    ]
}

/// Starter collectibles written by `wayfarer init`.
pub fn starter_collectibles() -> Vec<Collectible> {
    use crate::progress::types::Rarity;
    let item = |id: &str, name: &str, description: &str, points: u32, rarity: Rarity| Collectible {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        points,
        rarity,
    };
    vec![
        item("postcard", "Vintage Postcard", "A faded card from a corner kiosk", 10, Rarity::Common),
        item("metro_ticket", "Old Metro Ticket", "Punched decades ago", 20, Rarity::Uncommon),
        item("golden_key", "Golden Key", "Opens nothing, means everything", 50, Rarity::Rare),
        item("star_map", "Star Map", "Charts drawn by a long-gone navigator", 100, Rarity::Epic),
    ]
}

/// Serialize a rule list in the on-disk content layout.
pub fn achievements_to_json(achievements: &[Achievement]) -> Result<String, ProgressError> {
    Ok(serde_json::to_string_pretty(&AchievementsFile {
        achievements: achievements.to_vec(),
    })?)
}

/// Serialize collectibles in the on-disk content layout.
pub fn collectibles_to_json(collectibles: &[Collectible]) -> Result<String, ProgressError> {
    Ok(serde_json::to_string_pretty(&CollectiblesFile {
        collectibles: collectibles.to_vec(),
    })?)
}
