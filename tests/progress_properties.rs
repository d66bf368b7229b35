/// Integration tests for progress recording, rank derivation and achievement unlocks.
/// Exercises the engine end to end against sled-backed and in-memory stores.
use std::sync::{Arc, Mutex};

use tempfile::tempdir;
use wayfarer::progress::{
    Achievement, AchievementCatalog, MemoryBlobStore, NotificationSink, ProgressEngine,
    ProgressState, ProgressStore, RankEntry, RankTable, RankTier, RequirementType, SledBlobStore,
    DEFAULT_PROGRESS_KEY,
};

#[derive(Default)]
struct CountingSink {
    unlocks: Mutex<Vec<(String, u32)>>,
    resets: Mutex<u32>,
}

impl NotificationSink for CountingSink {
    fn on_unlock(&self, achievement: &Achievement, points_awarded: u32) {
        self.unlocks
            .lock()
            .unwrap()
            .push((achievement.id.clone(), points_awarded));
    }

    fn on_reset(&self) {
        *self.resets.lock().unwrap() += 1;
    }
}

fn explorer_rules() -> Vec<Achievement> {
    vec![
        Achievement::new("first_steps", "First Steps", RequirementType::VisitCount, 1, 10),
        Achievement::new("sightseer", "Sightseer", RequirementType::VisitCount, 3, 30),
        Achievement::new("finder", "Finder", RequirementType::CollectCount, 2, 20),
        Achievement::new("centurion", "Centurion", RequirementType::PointsTotal, 100, 25),
        Achievement::new("veteran", "Veteran", RequirementType::PointsTotal, 300, 50),
    ]
}

fn memory_engine(
    rules: Vec<Achievement>,
) -> (ProgressEngine<MemoryBlobStore>, MemoryBlobStore, Arc<CountingSink>) {
    let blobs = MemoryBlobStore::new();
    let sink = Arc::new(CountingSink::default());
    let engine = ProgressEngine::new(
        ProgressStore::open(blobs.clone(), DEFAULT_PROGRESS_KEY),
        Arc::new(AchievementCatalog::new(rules).unwrap()),
        Arc::new(RankTable::explorer_default()),
        sink.clone(),
    );
    (engine, blobs, sink)
}

fn assert_rank_matches_points(engine: &ProgressEngine<MemoryBlobStore>) {
    let state = engine.state();
    assert_eq!(
        state.current_rank,
        engine.ranks().rank_for(state.total_points),
        "rank out of sync at {} XP",
        state.total_points
    );
}

#[test]
fn cascade_completeness_from_ninety_points() {
    let rules = vec![
        Achievement::new("A", "A", RequirementType::PointsTotal, 100, 50),
        Achievement::new("B", "B", RequirementType::PointsTotal, 140, 10),
    ];
    let (mut engine, _, sink) = memory_engine(rules);
    engine.record_collectible("warmup", 90);
    assert!(engine.state().unlocked_achievements.is_empty());

    let outcome = engine.record_visit("colosseum", 10);
    let ids: Vec<_> = outcome.unlocks.iter().map(|u| u.achievement.id.clone()).collect();
    assert_eq!(ids, vec!["A", "B"]);
    assert_eq!(outcome.unlocks[0].points_awarded, 50);
    assert_eq!(outcome.unlocks[1].points_awarded, 10);
    assert_eq!(engine.state().total_points, 160);
    assert_eq!(
        *sink.unlocks.lock().unwrap(),
        vec![("A".to_string(), 50), ("B".to_string(), 10)]
    );
}

#[test]
fn visiting_twice_equals_visiting_once() {
    let (mut once, _, _) = memory_engine(explorer_rules());
    once.record_visit("sagrada_familia", 40);

    let (mut twice, _, sink) = memory_engine(explorer_rules());
    twice.record_visit("sagrada_familia", 40);
    let second = twice.record_visit("sagrada_familia", 40);

    assert!(!second.changed);
    assert_eq!(once.state(), twice.state());
    assert_eq!(sink.unlocks.lock().unwrap().len(), 1);
}

#[test]
fn collecting_twice_equals_collecting_once() {
    let (mut engine, blobs, _) = memory_engine(explorer_rules());
    engine.record_collectible("golden_key", 50);
    let snapshot = engine.state().clone();
    let again = engine.record_collectible("golden_key", 50);
    assert!(!again.changed);
    assert_eq!(engine.state(), &snapshot);
    assert_eq!(blobs.write_count(), 1);
}

#[test]
fn points_never_decrease_and_rank_tracks_points() {
    let (mut engine, _, _) = memory_engine(explorer_rules());
    let mut last = 0;
    let events: [(&str, bool, u32); 9] = [
        ("louvre", true, 30),
        ("postcard", false, 10),
        ("louvre", true, 30),
        ("big_ben", true, 45),
        ("metro_ticket", false, 20),
        ("acropolis", true, 80),
        ("postcard", false, 10),
        ("star_map", false, 100),
        ("petra", true, 400),
    ];
    for (id, is_visit, points) in events {
        if is_visit {
            engine.record_visit(id, points);
        } else {
            engine.record_collectible(id, points);
        }
        let total = engine.state().total_points;
        assert!(total >= last, "points went from {} to {}", last, total);
        last = total;
        assert_rank_matches_points(&engine);
    }
    assert_eq!(engine.state().unlocked_achievements.len(), 5);
}

#[test]
fn unlocked_ids_are_unique_and_from_catalog() {
    let (mut engine, _, _) = memory_engine(explorer_rules());
    for i in 0..10 {
        engine.record_visit(&format!("spot_{}", i), 60);
        engine.record_collectible(&format!("item_{}", i), 15);
    }
    let unlocked = &engine.state().unlocked_achievements;
    let mut deduped = unlocked.clone();
    deduped.sort();
    deduped.dedup();
    assert_eq!(deduped.len(), unlocked.len());
    assert!(unlocked.iter().all(|id| engine.catalog().contains(id)));
}

#[test]
fn reset_returns_to_zero_with_one_notification() {
    let (mut engine, blobs, sink) = memory_engine(explorer_rules());
    engine.record_visit("a", 200);
    engine.record_visit("b", 200);
    engine.record_collectible("x", 20);
    assert_ne!(engine.state().current_rank, RankTier::Novice);

    let outcome = engine.reset_progress();
    assert!(outcome.persisted());
    let state = engine.state();
    assert_eq!(state.total_points, 0);
    assert!(state.visited_attractions.is_empty());
    assert!(state.collected_items.is_empty());
    assert!(state.unlocked_achievements.is_empty());
    assert_eq!(state.current_rank, RankTier::Novice);
    assert_eq!(*sink.resets.lock().unwrap(), 1);

    let stored: ProgressState =
        serde_json::from_slice(&blobs.raw(DEFAULT_PROGRESS_KEY).unwrap()).unwrap();
    assert_eq!(stored, ProgressState::default());
}

#[test]
fn progress_survives_restart_on_sled() {
    let dir = tempdir().unwrap();
    let catalog = Arc::new(AchievementCatalog::new(explorer_rules()).unwrap());
    let ranks = Arc::new(RankTable::explorer_default());
    let expected = {
        let blobs = SledBlobStore::open(dir.path()).unwrap();
        let mut engine = ProgressEngine::new(
            ProgressStore::open(blobs, DEFAULT_PROGRESS_KEY),
            catalog.clone(),
            ranks.clone(),
            Arc::new(CountingSink::default()),
        );
        engine.record_visit("machu_picchu", 120);
        engine.record_collectible("star_map", 100);
        let outcome = engine.record_visit("taj_mahal", 90);
        assert!(outcome.persisted());
        outcome.state
    };

    let blobs = SledBlobStore::open(dir.path()).unwrap();
    let engine = ProgressEngine::new(
        ProgressStore::open(blobs, DEFAULT_PROGRESS_KEY),
        catalog,
        ranks,
        Arc::new(CountingSink::default()),
    );
    assert_eq!(engine.state(), &expected);
    assert_eq!(
        engine.state().unlocked_achievements,
        vec!["first_steps", "centurion", "veteran"]
    );
}

#[test]
fn invalid_bytes_in_storage_start_fresh() {
    let blobs = MemoryBlobStore::new();
    blobs.insert_raw(DEFAULT_PROGRESS_KEY, b"\x00\x9f not json at all");
    let engine = ProgressEngine::new(
        ProgressStore::open(blobs, DEFAULT_PROGRESS_KEY),
        Arc::new(AchievementCatalog::new(explorer_rules()).unwrap()),
        Arc::new(RankTable::explorer_default()),
        Arc::new(CountingSink::default()),
    );
    assert_eq!(engine.state(), &ProgressState::default());
}

#[test]
fn stored_record_missing_fields_loads_with_defaults() {
    let blobs = MemoryBlobStore::new();
    blobs.insert_raw(
        DEFAULT_PROGRESS_KEY,
        br#"{"totalPoints": 350, "visitedAttractions": ["alhambra"]}"#,
    );
    let engine = ProgressEngine::new(
        ProgressStore::open(blobs, DEFAULT_PROGRESS_KEY),
        Arc::new(AchievementCatalog::new(explorer_rules()).unwrap()),
        Arc::new(RankTable::explorer_default()),
        Arc::new(CountingSink::default()),
    );
    let state = engine.state();
    assert_eq!(state.total_points, 350);
    assert_eq!(state.current_rank, RankTier::Explorer);
    assert!(state.collected_items.is_empty());
}

#[test]
fn persist_failure_is_reported_but_gain_stands() {
    let (mut engine, blobs, sink) = memory_engine(explorer_rules());
    blobs.set_fail_writes(true);
    let outcome = engine.record_visit("uluru", 100);
    assert!(!outcome.persisted());
    assert_eq!(engine.state().total_points, 135);
    assert_eq!(sink.unlocks.lock().unwrap().len(), 2);

    blobs.set_fail_writes(false);
    engine.save().unwrap();
    let stored: ProgressState =
        serde_json::from_slice(&blobs.raw(DEFAULT_PROGRESS_KEY).unwrap()).unwrap();
    assert_eq!(&stored, engine.state());
}

fn two_tier_ranks() -> RankTable {
    RankTable::new(vec![
        RankEntry::new(RankTier::Traveler, "🎒", 0),
        RankEntry::new(RankTier::Legend, "👑", 50),
    ])
    .unwrap()
}

fn custom_rank_engine(blobs: MemoryBlobStore) -> ProgressEngine<MemoryBlobStore> {
    ProgressEngine::new(
        ProgressStore::open(blobs, DEFAULT_PROGRESS_KEY),
        Arc::new(
            AchievementCatalog::new(vec![Achievement::new(
                "warmed_up",
                "Warmed Up",
                RequirementType::PointsTotal,
                40,
                20,
            )])
            .unwrap(),
        ),
        Arc::new(two_tier_ranks()),
        Arc::new(CountingSink::default()),
    )
}

#[test]
fn custom_rank_table_governs_fresh_cascade_and_reset_states() {
    let blobs = MemoryBlobStore::new();
    let mut engine = custom_rank_engine(blobs.clone());
    let ranks = two_tier_ranks();

    // A fresh record starts at the table's lowest tier, not the built-in one.
    assert_eq!(engine.state().current_rank, RankTier::Traveler);
    assert_eq!(engine.summary().rank_icon, "🎒");

    let outcome = engine.record_visit("harbour", 45);
    assert_eq!(outcome.unlocks.len(), 1);
    assert_eq!(outcome.state.total_points, 65);
    assert_eq!(outcome.state.current_rank, ranks.rank_for(65));
    assert_eq!(outcome.state.current_rank, RankTier::Legend);
    assert_eq!(engine.summary().next_rank, None);
    assert_eq!(engine.summary().points_to_next_rank, 0);

    let reset = engine.reset_progress();
    assert_eq!(reset.state.total_points, 0);
    assert_eq!(reset.state.current_rank, ranks.rank_for(0));
    assert_eq!(reset.state.current_rank, RankTier::Traveler);

    // The stored reset record reloads with the same tier.
    let reloaded = custom_rank_engine(blobs);
    assert_eq!(reloaded.state().current_rank, RankTier::Traveler);
}

#[test]
fn loaded_record_picks_up_pending_rule_on_next_mutation() {
    let blobs = MemoryBlobStore::new();
    blobs.insert_raw(
        DEFAULT_PROGRESS_KEY,
        br#"{"totalPoints": 350, "visitedAttractions": ["alhambra", "mezquita"]}"#,
    );
    let sink = Arc::new(CountingSink::default());
    let mut engine = ProgressEngine::new(
        ProgressStore::open(blobs.clone(), DEFAULT_PROGRESS_KEY),
        Arc::new(AchievementCatalog::new(explorer_rules()).unwrap()),
        Arc::new(RankTable::explorer_default()),
        sink.clone(),
    );
    // Loading evaluates nothing, notifies nothing and writes nothing.
    assert!(engine.state().unlocked_achievements.is_empty());
    assert!(sink.unlocks.lock().unwrap().is_empty());
    assert_eq!(blobs.write_count(), 0);

    let outcome = engine.record_collectible("postcard", 0);
    let ids: Vec<_> = outcome.unlocks.iter().map(|u| u.achievement.id.as_str()).collect();
    assert_eq!(ids, vec!["first_steps", "centurion", "veteran"]);
    assert_eq!(sink.unlocks.lock().unwrap().len(), 3);
    assert_eq!(outcome.state.total_points, 350 + 10 + 25 + 50);
}
