//! Habit Relationship Analysis
//!
//! Infers how habits relate to each other and recommends chains of habits.
//!
//! ## Architecture
//!
//! - **RelationAnalyzer**: pairwise time-proximity + co-occurrence analysis
//! - **TriggerGraph**: index-based graph of trigger relations, path discovery
//! - **Complementary grouping**: hub habit plus complementary partners
//! - **ChainRecommender**: runs all of the above and ranks the chains
//!
//! ## Data Flow
//!
//! 1. Caller supplies the habit roster and checkin snapshot
//! 2. Every ordered habit pair is analyzed (optionally in parallel)
//! 3. Trigger and complementary relations become chains
//! 4. Chains are ranked by length, then creation time

mod complementary;
mod graph;
mod recommender;
mod relation;

pub use complementary::{discover_complementary_chains, discover_complementary_chains_with};
pub use graph::{discover_trigger_chains, discover_trigger_chains_with, TriggerGraph};
pub use recommender::{rank_chains, recommend, ChainRecommender, RecommendationReport};
pub use relation::{
    analyze_relation, phi_coefficient, time_proximity, CompletionLog, Contingency,
    RelationAnalyzer, TimeProximity, FALLBACK_CONFIDENCE, INSUFFICIENT_DATA_CONFIDENCE,
};

use crate::model::{Checkin, Habit, RelationType};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Creation stamp for chains recommended from this input
///
/// The latest `createdAt` among habits and checkins, or the Unix epoch when
/// there is neither.
pub fn input_reference_time(habits: &[Habit], checkins: &[Checkin]) -> DateTime<Utc> {
    habits
        .iter()
        .map(|h| h.created_at)
        .chain(checkins.iter().map(|c| c.created_at))
        .max()
        .unwrap_or_default()
}

/// Stable id of a recommended chain, derived from its kind and habit order
pub(crate) fn chain_id(kind: RelationType, habit_ids: &[&str]) -> String {
    let key = format!("{}:{}", kind, habit_ids.join(","));
    Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes()).to_string()
}
