//! # Wayfarer - progress and achievements for travel exploration
//!
//! Wayfarer tracks which attractions a traveler has visited and which
//! collectibles they have found, turns both into an experience-point total,
//! derives an explorer rank from it, and unlocks achievements as thresholds
//! are crossed.
//!
//! ## Features
//!
//! - **Idempotent recording**: visiting the same attraction twice never pays out twice.
//! - **Cascading achievements**: bonus points from one unlock can trigger the next, all within one call.
//! - **Durable progress**: the record is saved to a sled key-value store after every accepted mutation.
//! - **Fail-soft loading**: a missing or corrupt record starts the traveler fresh instead of erroring.
//! - **Single owner**: a tokio task serializes all mutations; observers subscribe to committed state.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use wayfarer::progress::{
//!     load_achievements_from_json, start_progress_actor, LogSink, ProgressEngine,
//!     ProgressStore, RankTable, SledBlobStore,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let catalog = Arc::new(load_achievements_from_json("content/achievements.json")?);
//!     let store = ProgressStore::open(SledBlobStore::open("data/progress")?, "userProgress");
//!     let engine = ProgressEngine::new(store, catalog, Arc::new(RankTable::default()), Arc::new(LogSink));
//!
//!     let progress = start_progress_actor(engine);
//!     let outcome = progress.record_visit("eiffel_tower", 50).await?;
//!     for unlock in &outcome.unlocks {
//!         println!("{} +{} XP", unlock.achievement.title, unlock.points_awarded);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`progress`] - engine, store, rank table, content catalogs, notifications
//! - [`config`] - TOML configuration for the binary
//! - [`logutil`] - log line sanitizing

pub mod config;
pub mod logutil;
pub mod progress;
