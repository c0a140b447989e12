//! # Habitlink
//!
//! Habit Relationship Intelligence - evaluates habit recurrence rules, derives
//! streak statistics, infers relationships between habits from their checkin
//! timelines and recommends chains of habits to perform together.
//!
//! ## Features
//!
//! - **Recurrence**: daily, weekly (Monday = 1 ... Sunday = 7), monthly and
//!   every-N-days rules
//! - **Statistics**: completion rate, current and longest streak
//! - **Relations**: trigger / sequential / complementary / conflicting, from
//!   time proximity and the phi coefficient
//! - **Chains**: trigger paths and complementary bundles, ranked
//!
//! ## Modules
//!
//! - [`model`]: Habit, Checkin and derived value types
//! - [`schedule`]: Recurrence evaluation and statistics
//! - [`analysis`]: Relation inference and chain recommendation
//! - [`snapshot`]: JSON / CSV input snapshots
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use habitlink::{compute_stats, ChainRecommender, Snapshot};
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let snapshot = Snapshot::load(Path::new("snapshot.json"))?;
//!
//!     for habit in &snapshot.habits {
//!         let stats = compute_stats(habit, &snapshot.checkins);
//!         println!("{}: {} day streak", habit.name, stats.current_streak);
//!     }
//!
//!     let chains = ChainRecommender::default().recommend(&snapshot.habits, &snapshot.checkins);
//!     println!("Found {} chains", chains.len());
//!
//!     Ok(())
//! }
//! ```

pub mod analysis;
pub mod config;
pub mod model;
pub mod schedule;
pub mod snapshot;

// Re-export top-level types for convenience
pub use model::{
    Category, ChainError, ChainHabit, Checkin, FrequencyRule, FrequencyType, Habit, HabitChain,
    HabitRelation, HabitStats, RelationStrength, RelationType,
};

pub use schedule::{compute_stats, compute_stats_at, compute_stats_in, due_dates, is_due};

pub use analysis::{
    analyze_relation, discover_complementary_chains, discover_trigger_chains, phi_coefficient,
    recommend, ChainRecommender, RecommendationReport, RelationAnalyzer, TriggerGraph,
};

pub use snapshot::{CsvCheckinImporter, Snapshot, SnapshotError};

pub use config::{AnalysisConfig, Config, ConfigError, CooccurrenceUniverse, LoggingConfig};
