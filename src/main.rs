//! Habitlink CLI
//!
//! Command-line interface for habit analysis:
//! - Check which habits are due
//! - Show completion and streak statistics
//! - Infer relations between habits
//! - Recommend habit chains

use anyhow::{bail, Context};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use habitlink::config::generate_default_config;
use habitlink::{
    compute_stats_at, is_due, ChainRecommender, Config, CsvCheckinImporter, HabitChain,
    LoggingConfig, Snapshot,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "habitlink")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Habit relationship analysis and chain recommendation")]
#[command(long_about = "Habitlink reads a snapshot of your habits and checkins,\nfinds how your habits relate to each other and suggests habit chains.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search standard locations)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,

    /// Extra checkins to merge from a CSV file
    #[arg(long, global = true)]
    pub checkins_csv: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List which habits are due on a date
    Due {
        /// Snapshot JSON file
        snapshot: PathBuf,
        /// Date to check (default: today)
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },

    /// Show completion and streak statistics
    Stats {
        /// Snapshot JSON file
        snapshot: PathBuf,
        /// Only this habit id
        #[arg(long)]
        habit: Option<String>,
        /// Reference date (default: today)
        #[arg(long)]
        today: Option<NaiveDate>,
    },

    /// Infer relations between every pair of habits
    Relations {
        /// Snapshot JSON file
        snapshot: PathBuf,
        /// Hide relations below this confidence
        #[arg(long, default_value = "0.0")]
        min_confidence: f64,
    },

    /// Recommend habit chains
    Recommend {
        /// Snapshot JSON file
        snapshot: PathBuf,
        /// Override the maximum chain length
        #[arg(long)]
        max_length: Option<usize>,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    init_logging(&config.logging);

    let json = match cli.format.as_str() {
        "json" => true,
        "table" => false,
        other => bail!("Unknown output format: {}", other),
    };

    match cli.command {
        Commands::Due { snapshot, date } => {
            let snapshot = load_snapshot(&snapshot, cli.checkins_csv.as_deref())?;
            let date = date.unwrap_or_else(|| Local::now().date_naive());

            if json {
                let rows: Vec<_> = snapshot
                    .habits
                    .iter()
                    .map(|h| serde_json::json!({ "id": h.id, "name": h.name, "due": is_due(h, date) }))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                println!("Due on {}:", date);
                for habit in snapshot.habits.iter().filter(|h| is_due(h, date)) {
                    println!("  {:<24} {}", habit.name, habit.frequency.kind);
                }
            }
        }

        Commands::Stats {
            snapshot,
            habit,
            today,
        } => {
            let snapshot = load_snapshot(&snapshot, cli.checkins_csv.as_deref())?;
            let today = today.unwrap_or_else(|| Local::now().date_naive());

            let habits: Vec<_> = match &habit {
                Some(id) => match snapshot.habit(id) {
                    Some(h) => vec![h],
                    None => bail!("Habit not found: {}", id),
                },
                None => snapshot.habits.iter().collect(),
            };

            let stats: Vec<_> = habits
                .iter()
                .map(|h| (*h, compute_stats_at(h, &snapshot.checkins, today)))
                .collect();

            if json {
                let rows: Vec<_> = stats
                    .iter()
                    .map(|(h, s)| serde_json::json!({ "habitId": h.id, "stats": s }))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                println!(
                    "{:<24} {:>6} {:>6} {:>6} {:>8} {:>8}  {}",
                    "HABIT", "DONE", "DUE", "RATE", "STREAK", "LONGEST", "LAST"
                );
                for (habit, s) in &stats {
                    println!(
                        "{:<24} {:>6} {:>6} {:>5}% {:>8} {:>8}  {}",
                        habit.name,
                        s.total_completions,
                        s.total_days,
                        s.completion_rate,
                        s.current_streak,
                        s.longest_streak,
                        s.last_completed_date
                            .map(|d| d.to_string())
                            .unwrap_or_else(|| "-".to_string())
                    );
                }
            }
        }

        Commands::Relations {
            snapshot,
            min_confidence,
        } => {
            let snapshot = load_snapshot(&snapshot, cli.checkins_csv.as_deref())?;
            let recommender = ChainRecommender::new(config.analysis.clone());
            let relations: Vec<_> = recommender
                .analyze_all(&snapshot.habits, &snapshot.checkins)
                .into_iter()
                .filter(|r| r.confidence >= min_confidence)
                .collect();

            if json {
                println!("{}", serde_json::to_string_pretty(&relations)?);
            } else {
                for r in &relations {
                    println!(
                        "{:<16} -> {:<16} {:<14} {:<7} {:.2}  {}",
                        r.source_habit_id,
                        r.target_habit_id,
                        r.relation_type,
                        r.strength,
                        r.confidence,
                        r.description
                    );
                }
            }
        }

        Commands::Recommend {
            snapshot,
            max_length,
        } => {
            let snapshot = load_snapshot(&snapshot, cli.checkins_csv.as_deref())?;
            if let Some(max) = max_length {
                config.analysis.max_chain_length = max;
            }

            let recommender = ChainRecommender::new(config.analysis.clone());
            let report = recommender.recommend_report(&snapshot.habits, &snapshot.checkins);

            if json {
                println!("{}", serde_json::to_string_pretty(&report.chains)?);
            } else if report.chains.is_empty() {
                println!("No chains found. Keep checking in to build up history.");
            } else {
                for (rank, chain) in report.chains.iter().enumerate() {
                    println!("{}. {}", rank + 1, render_chain(chain, &snapshot));
                }
            }
        }

        Commands::Config { output } => {
            let content = generate_default_config();
            match output {
                Some(path) => {
                    std::fs::write(&path, content)
                        .with_context(|| format!("Failed to write config to {:?}", path))?;
                    println!("Config written to {:?}", path);
                }
                None => print!("{}", content),
            }
        }
    }

    Ok(())
}

fn init_logging(config: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("habitlink={}", config.level)));

    let registry = tracing_subscriber::registry().with(filter);
    if config.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn load_snapshot(path: &Path, checkins_csv: Option<&Path>) -> anyhow::Result<Snapshot> {
    let mut snapshot = Snapshot::load(path)
        .with_context(|| format!("Failed to load snapshot {:?}", path))?;

    if let Some(csv_path) = checkins_csv {
        let result = CsvCheckinImporter::new()
            .import(csv_path)
            .with_context(|| format!("Failed to import checkins from {:?}", csv_path))?;
        if result.rows_failed > 0 {
            tracing::warn!(
                rows_failed = result.rows_failed,
                "Some checkin rows could not be imported"
            );
        }
        tracing::info!(rows = result.rows_processed, "Imported checkins from CSV");
        snapshot.extend_checkins(result.checkins);
    }

    let orphaned = snapshot.orphaned_checkins();
    if orphaned > 0 {
        tracing::warn!(orphaned, "Checkins reference habits missing from the snapshot");
    }

    Ok(snapshot)
}

fn render_chain(chain: &HabitChain, snapshot: &Snapshot) -> String {
    let steps: Vec<String> = chain
        .habit_ids()
        .into_iter()
        .map(|id| {
            let name = snapshot.habit(id).map(|h| h.name.as_str()).unwrap_or(id);
            let optional = chain
                .habits
                .iter()
                .any(|h| h.habit_id == id && h.is_optional);
            if optional {
                format!("({})", name)
            } else {
                name.to_string()
            }
        })
        .collect();

    format!("{} [{} habits]: {}", chain.name, chain.len(), steps.join(" → "))
}
