/// Progress mutation and achievement evaluation.
///
/// Every mutating call runs to completion in memory (points, rank and any
/// cascade of achievement unlocks), then delivers notifications, then saves
/// exactly once. A failed save is reported in the outcome and never rolls the
/// in-memory state back.
use std::sync::Arc;

use log::{debug, info, warn};

use crate::logutil::escape_log;
use crate::progress::catalog::AchievementCatalog;
use crate::progress::errors::ProgressError;
use crate::progress::notify::NotificationSink;
use crate::progress::rank::RankTable;
use crate::progress::storage::{BlobStore, ProgressStore};
use crate::progress::types::{ProgressState, ProgressSummary, UnlockEvent};

/// Result of one engine operation.
#[derive(Debug)]
pub struct Outcome {
    /// False when the call was an idempotent no-op.
    pub changed: bool,
    /// Newly unlocked achievements, in unlock order.
    pub unlocks: Vec<UnlockEvent>,
    /// Committed state after the operation.
    pub state: ProgressState,
    /// Set when the post-mutation save failed.
    pub persist_error: Option<ProgressError>,
}

impl Outcome {
    pub fn persisted(&self) -> bool {
        self.persist_error.is_none()
    }
}

pub struct ProgressEngine<B: BlobStore> {
    store: ProgressStore<B>,
    catalog: Arc<AchievementCatalog>,
    ranks: Arc<RankTable>,
    sink: Arc<dyn NotificationSink>,
}

impl<B: BlobStore> ProgressEngine<B> {
    /// Take ownership of a store and bring its loaded record in line with
    /// the catalog and rank table.
    ///
    /// Achievements are not evaluated here. A loaded record that already
    /// meets a rule it has not unlocked (new content, say) picks it up on the
    /// next accepted visit or collectible, with the usual notification.
    pub fn new(
        mut store: ProgressStore<B>,
        catalog: Arc<AchievementCatalog>,
        ranks: Arc<RankTable>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        store.normalize(&ranks, |id| catalog.contains(id));
        debug!(
            "progress engine ready: {} XP, rank {:?}, {} achievements unlocked",
            store.state().total_points,
            store.state().current_rank,
            store.state().unlocked_achievements.len()
        );
        Self {
            store,
            catalog,
            ranks,
            sink,
        }
    }

    pub fn state(&self) -> &ProgressState {
        self.store.state()
    }

    pub fn catalog(&self) -> &AchievementCatalog {
        &self.catalog
    }

    pub fn ranks(&self) -> &RankTable {
        &self.ranks
    }

    pub fn store(&self) -> &ProgressStore<B> {
        &self.store
    }

    /// Record a visit. Re-visiting a known attraction is a no-op.
    pub fn record_visit(&mut self, attraction_id: &str, points: u32) -> Outcome {
        if self.store.state().has_visited(attraction_id) {
            debug!("visit to '{}' already recorded", escape_log(attraction_id));
            return self.unchanged();
        }
        self.store
            .state_mut()
            .visited_attractions
            .insert(attraction_id.to_string());
        info!("visited '{}' (+{} XP)", escape_log(attraction_id), points);
        self.apply_points(points)
    }

    /// Record a collectible. Collecting a known item again is a no-op.
    pub fn record_collectible(&mut self, item_id: &str, points: u32) -> Outcome {
        if self.store.state().has_collected(item_id) {
            debug!("collectible '{}' already recorded", escape_log(item_id));
            return self.unchanged();
        }
        self.store
            .state_mut()
            .collected_items
            .insert(item_id.to_string());
        info!("collected '{}' (+{} XP)", escape_log(item_id), points);
        self.apply_points(points)
    }

    /// Replace progress with the zero state, notify once and persist.
    pub fn reset_progress(&mut self) -> Outcome {
        let fresh = ProgressState {
            current_rank: self.ranks.lowest(),
            ..ProgressState::default()
        };
        self.store.replace(fresh);
        info!("progress reset to zero");
        self.sink.on_reset();
        self.commit(Vec::new())
    }

    /// Retry persisting the current state.
    pub fn save(&self) -> Result<(), ProgressError> {
        self.store.save()
    }

    pub fn summary(&self) -> ProgressSummary {
        let state = self.store.state();
        let entry = self.ranks.entry(state.current_rank);
        let next = self.ranks.next_rank(state.current_rank);
        ProgressSummary {
            total_points: state.total_points,
            rank: state.current_rank,
            rank_icon: entry.map(|e| e.icon.clone()).unwrap_or_default(),
            next_rank: next.map(|e| e.tier),
            points_to_next_rank: self.ranks.points_to_next(state.total_points),
            visited_count: state.visited_attractions.len(),
            collected_count: state.collected_items.len(),
            unlocked_count: state.unlocked_achievements.len(),
            achievement_count: self.catalog.len(),
        }
    }

    fn unchanged(&self) -> Outcome {
        Outcome {
            changed: false,
            unlocks: Vec::new(),
            state: self.store.state().clone(),
            persist_error: None,
        }
    }

    fn apply_points(&mut self, points: u32) -> Outcome {
        self.add_points(points);
        let unlocks = self.evaluate_achievements();
        for event in &unlocks {
            self.sink.on_unlock(&event.achievement, event.points_awarded);
        }
        self.commit(unlocks)
    }

    fn add_points(&mut self, points: u32) {
        let state = self.store.state_mut();
        state.total_points = state.total_points.saturating_add(u64::from(points));
        let rank = self.ranks.rank_for(state.total_points);
        if rank != state.current_rank {
            info!("rank changed: {:?} -> {:?}", state.current_rank, rank);
            state.current_rank = rank;
        }
    }

    /// Fixed-point evaluation in catalog order. Each pass walks the whole
    /// catalog and sees points awarded earlier in the same pass; passes repeat
    /// until one unlocks nothing. Every productive pass unlocks at least one
    /// of a finite set of rules, so there are at most `catalog.len() + 1`
    /// passes.
    fn evaluate_achievements(&mut self) -> Vec<UnlockEvent> {
        let catalog = Arc::clone(&self.catalog);
        let mut unlocks = Vec::new();
        let max_passes = catalog.len() + 1;
        for pass in 0..max_passes {
            let mut unlocked_this_pass = false;
            for achievement in catalog.iter() {
                let state = self.store.state();
                if state.is_unlocked(&achievement.id) || !achievement.is_satisfied_by(state) {
                    continue;
                }
                self.store
                    .state_mut()
                    .unlocked_achievements
                    .push(achievement.id.clone());
                self.add_points(achievement.points);
                info!(
                    "achievement unlocked: '{}' (+{} XP)",
                    escape_log(&achievement.id),
                    achievement.points
                );
                unlocks.push(UnlockEvent {
                    achievement: achievement.clone(),
                    points_awarded: achievement.points,
                });
                unlocked_this_pass = true;
            }
            if !unlocked_this_pass {
                return unlocks;
            }
            debug!("achievement pass {} unlocked {} so far", pass + 1, unlocks.len());
        }
        unlocks
    }

    fn commit(&mut self, unlocks: Vec<UnlockEvent>) -> Outcome {
        let state = self.store.state().clone();
        self.sink.on_state_changed(&state);
        let persist_error = match self.store.save() {
            Ok(()) => None,
            Err(e) => {
                warn!("progress not persisted: {}", e);
                Some(e)
            }
        };
        Outcome {
            changed: true,
            unlocks,
            state,
            persist_error,
        }
    }
}
