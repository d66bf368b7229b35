//! Progress tracking core: visits, collectibles, experience points, explorer
//! ranks and achievement unlocks.
//!
//! [`engine::ProgressEngine`] applies events and evaluates achievement rules,
//! [`storage::ProgressStore`] keeps the record durable in a key-value store,
//! and [`actor`] serializes every mutation through a single owner task.

pub mod actor;
pub mod catalog;
pub mod engine;
pub mod errors;
pub mod notify;
pub mod rank;
pub mod storage;
pub mod types;

pub use actor::{start_progress_actor, ProgressHandle};
pub use catalog::{
    load_achievements_from_json, load_collectibles_from_json, load_ranks_from_json,
    parse_achievements, AchievementCatalog, AchievementProgress, CollectibleCatalog,
};
pub use engine::{Outcome, ProgressEngine};
pub use errors::ProgressError;
pub use notify::{Banner, BannerPresenter, LogSink, NotificationSink, NullSink};
pub use rank::{RankEntry, RankTable, RankTier};
pub use storage::{
    progress_db_path, BlobStore, MemoryBlobStore, ProgressStore, SledBlobStore,
    DEFAULT_PROGRESS_KEY,
};
pub use types::*;
