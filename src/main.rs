//! Binary entrypoint for the Wayfarer CLI.
//!
//! Commands:
//! - `init` - write a starter `wayfarer.toml` plus sample content files
//! - `visit <attraction> --points <n>` - record an attraction visit
//! - `collect <item> [--points <n>]` - record a found collectible
//! - `reset` - wipe progress back to zero
//! - `status` - print rank, points and achievement progress
//!
//! See the library crate docs for module-level details: `wayfarer::`.
use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};

use wayfarer::config::Config;
use wayfarer::progress::catalog::{
    achievements_to_json, collectibles_to_json, starter_achievements, starter_collectibles,
};
use wayfarer::progress::{
    load_achievements_from_json, load_collectibles_from_json, load_ranks_from_json,
    start_progress_actor, Achievement, AchievementCatalog, BannerPresenter, CollectibleCatalog, NotificationSink,
    Outcome, ProgressEngine, ProgressHandle, ProgressStore, RankTable, SledBlobStore,
};

#[derive(Parser)]
#[command(name = "wayfarer")]
#[command(about = "Track visits, collectibles, ranks and achievements")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "wayfarer.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration and starter content
    Init,
    /// Record a visit to an attraction
    Visit {
        /// Attraction id
        attraction: String,
        /// Experience points awarded for the visit
        #[arg(short, long)]
        points: u32,
    },
    /// Record a collectible find
    Collect {
        /// Collectible id
        item: String,
        /// Points to award; defaults to the collectible catalog value
        #[arg(short, long)]
        points: Option<u32>,
    },
    /// Reset all progress to zero
    Reset,
    /// Show rank, points and achievement progress
    Status,
}

/// Prints banners as they are raised and keeps the presenter in sync for
/// anything rendering it.
struct ConsoleSink {
    presenter: BannerPresenter,
}

impl NotificationSink for ConsoleSink {
    fn on_unlock(&self, achievement: &Achievement, points_awarded: u32) {
        println!(
            "{} Achievement Unlocked: {}  +{} XP",
            achievement.icon, achievement.title, points_awarded
        );
        self.presenter.on_unlock(achievement, points_awarded);
    }

    fn on_reset(&self) {
        println!("🔄 Progress reset");
        self.presenter.on_reset();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            init_logging(&None, cli.verbose);
            run_init(&cli.config).await
        }
        command => run_command(&cli.config, cli.verbose, command).await,
    }
}

async fn run_command(config_path: &str, verbose: u8, command: Commands) -> Result<()> {
    let config = Config::load(config_path).await?;
    init_logging(&Some(config.clone()), verbose);

    let collectibles = load_collectibles(&config)?;
    let (progress, catalog) = open_progress(&config)?;

    match command {
        Commands::Visit { attraction, points } => {
            let outcome = progress.record_visit(&attraction, points).await?;
            if !outcome.changed {
                println!("Already visited '{}'; nothing awarded.", attraction);
            }
            report(&outcome);
        }
        Commands::Collect { item, points } => {
            let points = match (points, collectibles.get(&item)) {
                (Some(p), _) => p,
                (None, Some(found)) => found.points,
                (None, None) => {
                    progress.shutdown().await;
                    return Err(anyhow!(
                        "unknown collectible '{}'; pass --points to award it anyway",
                        item
                    ));
                }
            };
            let outcome = progress.record_collectible(&item, points).await?;
            if !outcome.changed {
                println!("Already collected '{}'; nothing awarded.", item);
            }
            report(&outcome);
        }
        Commands::Reset => {
            let outcome = progress.reset_progress().await?;
            report(&outcome);
        }
        Commands::Status => print_status(&catalog, &progress).await?,
        Commands::Init => {}
    }

    progress.shutdown().await;
    Ok(())
}

async fn run_init(config_path: &str) -> Result<()> {
    info!("Initializing new Wayfarer configuration");
    let cfg = Config::default();
    if Config::create_default(config_path).await? {
        info!("Configuration file created at {}", config_path);
    } else {
        warn!("{} already exists; leaving it unchanged", config_path);
    }

    tokio::fs::create_dir_all(&cfg.content.dir).await?;
    let achievements_path = cfg.content.achievements_path();
    if !achievements_path.exists() {
        tokio::fs::write(&achievements_path, achievements_to_json(&starter_achievements())?)
            .await?;
    }
    let collectibles_path = cfg.content.collectibles_path();
    if !collectibles_path.exists() {
        tokio::fs::write(&collectibles_path, collectibles_to_json(&starter_collectibles())?)
            .await?;
    }
    tokio::fs::create_dir_all(&cfg.storage.data_dir).await?;
    info!("Starter content written to {}", cfg.content.dir);
    Ok(())
}

fn load_collectibles(config: &Config) -> Result<CollectibleCatalog> {
    let path = config.content.collectibles_path();
    if !path.exists() {
        warn!("no collectible catalog at {}; --points required for collect", path.display());
        return Ok(CollectibleCatalog::default());
    }
    Ok(load_collectibles_from_json(path)?)
}

/// Load content (fatal on failure), open the store and start the owner task.
fn open_progress(config: &Config) -> Result<(ProgressHandle, Arc<AchievementCatalog>)> {
    let catalog = load_achievements_from_json(config.content.achievements_path())
        .map(Arc::new)
        .map_err(|e| anyhow!("cannot start without achievements: {}", e))?;
    let ranks = match config.content.ranks_path() {
        Some(path) => load_ranks_from_json(path)?,
        None => RankTable::explorer_default(),
    };
    let blobs = SledBlobStore::open(config.storage.db_path())?;
    let store = ProgressStore::open(blobs, config.storage.progress_key.clone());
    let sink = ConsoleSink {
        presenter: BannerPresenter::new(config.notifications.dismiss_after()),
    };
    let engine = ProgressEngine::new(store, Arc::clone(&catalog), Arc::new(ranks), Arc::new(sink));
    Ok((start_progress_actor(engine), catalog))
}

fn report(outcome: &Outcome) {
    println!(
        "{} XP  rank {}",
        outcome.state.total_points,
        outcome.state.current_rank.name()
    );
    if let Some(err) = &outcome.persist_error {
        // The gain stands in memory; only durability is at risk.
        eprintln!("warning: progress not saved: {}", err);
    }
}

async fn print_status(catalog: &AchievementCatalog, progress: &ProgressHandle) -> Result<()> {
    let summary = progress.summary().await?;
    let state = progress.snapshot().await?;
    println!("{} {}  ({} XP)", summary.rank_icon, summary.rank.name(), summary.total_points);
    match summary.next_rank {
        Some(next) => println!("{} XP to {}", summary.points_to_next_rank, next.name()),
        None => println!("Top rank reached"),
    }
    println!("Attractions visited: {}", summary.visited_count);
    println!("Items collected:     {}", summary.collected_count);
    println!(
        "Achievements:        {}/{}",
        summary.unlocked_count, summary.achievement_count
    );

    for row in catalog.progress_for(&state) {
        let mark = if row.unlocked { "✔" } else { " " };
        println!(
            "  [{}] {} {:<24} {}/{}",
            mark, row.achievement.icon, row.achievement.title, row.current, row.target
        );
    }
    Ok(())
}

/// CLI verbosity overrides the configured level; with neither, `info`.
fn base_level(config: Option<&Config>, verbosity: u8) -> log::LevelFilter {
    match verbosity {
        0 => config
            .map(|c| c.logging.level_filter())
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    }
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    builder.filter_level(base_level(config.as_ref(), verbosity));

    let log_file = config
        .as_ref()
        .and_then(|c| c.logging.file.clone())
        .and_then(|path| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .ok()
        });

    if let Some(f) = log_file {
        let file = std::sync::Arc::new(std::sync::Mutex::new(f));
        // Echo to the console only when someone is watching it.
        let is_tty = atty::is(atty::Stream::Stderr);
        builder.format(move |fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            let line = format!("{} [{}] {}", ts, record.level(), record.args());
            if let Ok(mut guard) = file.lock() {
                let _ = writeln!(guard, "{}", line);
            }
            if is_tty {
                writeln!(fmt, "{}", line)
            } else {
                Ok(())
            }
        });
    } else {
        builder.format(|fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
        });
    }
    let _ = builder.try_init();
}
