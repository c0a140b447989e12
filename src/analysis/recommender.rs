//! Chain Recommender
//!
//! Runs the relation analyzer over every ordered habit pair, feeds the
//! result to trigger-chain discovery and complementary grouping, and ranks
//! the combined chains.

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;

use super::complementary::discover_complementary_chains_with;
use super::graph::discover_trigger_chains_with;
use super::input_reference_time;
use super::relation::{CompletionLog, RelationAnalyzer};
use crate::config::AnalysisConfig;
use crate::model::{Checkin, Habit, HabitChain, HabitRelation, RelationType};

/// Relations and ranked chains from one recommendation run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationReport {
    pub relations: Vec<HabitRelation>,
    pub chains: Vec<HabitChain>,
}

impl RecommendationReport {
    /// Number of relations of each type
    pub fn relation_counts(&self) -> HashMap<RelationType, usize> {
        let mut counts = HashMap::new();
        for relation in &self.relations {
            *counts.entry(relation.relation_type).or_insert(0) += 1;
        }
        counts
    }
}

/// Recommends habit chains from a habit roster and checkin snapshot
///
/// Stateless between calls: the same inputs always produce the same output.
/// Chains are stamped with the reference time when one is set, otherwise
/// with the latest `createdAt` found in the input.
#[derive(Debug, Clone)]
pub struct ChainRecommender {
    analyzer: RelationAnalyzer,
    reference_time: Option<DateTime<Utc>>,
}

impl Default for ChainRecommender {
    fn default() -> Self {
        Self::new(AnalysisConfig::default())
    }
}

impl ChainRecommender {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            analyzer: RelationAnalyzer::new(config),
            reference_time: None,
        }
    }

    /// Builder: set the `createdAt` stamp of recommended chains
    pub fn with_reference_time(mut self, reference_time: DateTime<Utc>) -> Self {
        self.reference_time = Some(reference_time);
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        self.analyzer.config()
    }

    pub fn reference_time(&self) -> Option<DateTime<Utc>> {
        self.reference_time
    }

    /// Analyze every ordered pair `(i, j)`, `i != j`
    ///
    /// Results are in pair order (row-major over `habits`) whether or not the
    /// analysis runs in parallel.
    pub fn analyze_all(&self, habits: &[Habit], checkins: &[Checkin]) -> Vec<HabitRelation> {
        if habits.len() < 2 {
            return Vec::new();
        }

        let mut logs: HashMap<&str, CompletionLog> = habits
            .iter()
            .map(|h| (h.id.as_str(), CompletionLog::default()))
            .collect();
        for checkin in checkins {
            if let Some(log) = logs.get_mut(checkin.habit_id.as_str()) {
                log.record(checkin);
            }
        }

        let pairs: Vec<(usize, usize)> = (0..habits.len())
            .flat_map(|i| (0..habits.len()).filter(move |&j| j != i).map(move |j| (i, j)))
            .collect();

        let empty = CompletionLog::default();
        let analyze = |&(i, j): &(usize, usize)| {
            let (source, target) = (&habits[i], &habits[j]);
            let source_log = logs.get(source.id.as_str()).unwrap_or(&empty);
            let target_log = logs.get(target.id.as_str()).unwrap_or(&empty);
            self.analyzer.analyze_logs(source, target, source_log, target_log)
        };

        if self.config().parallel {
            pairs.par_iter().map(analyze).collect()
        } else {
            pairs.iter().map(analyze).collect()
        }
    }

    /// Recommend ranked chains
    pub fn recommend(&self, habits: &[Habit], checkins: &[Checkin]) -> Vec<HabitChain> {
        self.recommend_report(habits, checkins).chains
    }

    /// Recommend ranked chains, keeping the relations they were built from
    pub fn recommend_report(&self, habits: &[Habit], checkins: &[Checkin]) -> RecommendationReport {
        let relations = self.analyze_all(habits, checkins);
        let created_at = self
            .reference_time
            .unwrap_or_else(|| input_reference_time(habits, checkins));
        let chains = self.build_chains(habits, &relations, created_at);

        let report = RecommendationReport { relations, chains };
        let counts = report.relation_counts();
        tracing::info!(
            habits = habits.len(),
            checkins = checkins.len(),
            triggers = counts.get(&RelationType::Trigger).copied().unwrap_or(0),
            complementary = counts.get(&RelationType::Complementary).copied().unwrap_or(0),
            chains = report.chains.len(),
            "Chain recommendation complete"
        );
        report
    }

    /// Build and rank chains from already computed relations
    ///
    /// Without a reference time, chains are stamped with the latest habit
    /// `createdAt`.
    pub fn chains_from_relations(
        &self,
        habits: &[Habit],
        relations: &[HabitRelation],
    ) -> Vec<HabitChain> {
        let created_at = self
            .reference_time
            .unwrap_or_else(|| input_reference_time(habits, &[]));
        self.build_chains(habits, relations, created_at)
    }

    fn build_chains(
        &self,
        habits: &[Habit],
        relations: &[HabitRelation],
        created_at: DateTime<Utc>,
    ) -> Vec<HabitChain> {
        let config = self.config();
        let mut chains = discover_trigger_chains_with(habits, relations, config, created_at);
        chains.extend(discover_complementary_chains_with(
            habits, relations, config, created_at,
        ));
        rank_chains(&mut chains);
        chains
    }
}

/// Sort chains by habit count, then creation time, both descending
///
/// The sort is stable, so equal chains keep their discovery order.
pub fn rank_chains(chains: &mut [HabitChain]) {
    chains.sort_by(|a, b| {
        b.len()
            .cmp(&a.len())
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}

/// Recommend chains with default thresholds
pub fn recommend(habits: &[Habit], checkins: &[Checkin]) -> Vec<HabitChain> {
    ChainRecommender::default().recommend(habits, checkins)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{start_of_day, FrequencyRule};
    use chrono::{Duration, NaiveDate};

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn habit(id: &str) -> Habit {
        Habit::new(id, id, FrequencyRule::daily(), start())
    }

    /// Completed checkin on day `day` at `minute` past 06:00
    fn at(habit_id: &str, day: i64, minute: i64) -> Checkin {
        let ts = start_of_day(start()) + Duration::days(day) + Duration::hours(6) + Duration::minutes(minute);
        Checkin::completed_at(habit_id, ts)
    }

    /// wake -> water -> stretch -> journal, each 10 minutes after the previous
    fn morning() -> (Vec<Habit>, Vec<Checkin>) {
        let ids = ["wake", "water", "stretch", "journal"];
        let habits = ids.iter().map(|id| habit(id)).collect();
        let checkins = (0..14)
            .flat_map(|day| {
                ids.iter()
                    .enumerate()
                    .map(move |(pos, id)| at(id, day, pos as i64 * 10 + day % 3))
            })
            .collect();
        (habits, checkins)
    }

    fn reference() -> DateTime<Utc> {
        start_of_day(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap())
    }

    #[test]
    fn test_analyze_all_covers_ordered_pairs() {
        let (habits, checkins) = morning();
        let relations = ChainRecommender::default().analyze_all(&habits, &checkins);

        assert_eq!(relations.len(), 12);
        assert_eq!(relations[0].source_habit_id, "wake");
        assert_eq!(relations[0].target_habit_id, "water");
        assert!(relations.iter().all(|r| r.source_habit_id != r.target_habit_id));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let (habits, checkins) = morning();
        let parallel = ChainRecommender::default().analyze_all(&habits, &checkins);
        let sequential = ChainRecommender::new(AnalysisConfig {
            parallel: false,
            ..AnalysisConfig::default()
        })
        .analyze_all(&habits, &checkins);

        assert_eq!(parallel, sequential);
    }

    #[test]
    fn test_recommend_ranks_longest_first() {
        let (habits, checkins) = morning();
        let chains = ChainRecommender::default()
            .with_reference_time(reference())
            .recommend(&habits, &checkins);

        assert!(!chains.is_empty());
        assert_eq!(chains[0].habit_ids(), vec!["wake", "water", "stretch", "journal"]);
        assert!(chains.windows(2).all(|w| w[0].len() >= w[1].len()));
        assert!(chains.iter().all(|c| c.created_at == reference()));
    }

    #[test]
    fn test_rank_chains_tie_breaks_on_created_at() {
        let older = HabitChain::new("old", FrequencyRule::daily())
            .with_habit("a", false)
            .with_habit("b", false)
            .created_at(reference());
        let newer = older.clone().created_at(reference() + Duration::days(1));
        let longer = older.clone().with_habit("c", false);

        let mut chains = vec![older.clone(), newer.clone(), longer.clone()];
        rank_chains(&mut chains);
        assert_eq!(chains, vec![longer, newer, older]);
    }

    #[test]
    fn test_default_stamp_comes_from_input() {
        let (habits, checkins) = morning();
        let latest = checkins.iter().map(|c| c.created_at).max().unwrap();

        let first = recommend(&habits, &checkins);
        let second = recommend(&habits, &checkins);
        assert!(!first.is_empty());
        assert_eq!(first, second);
        assert!(first.iter().all(|c| c.created_at == latest));

        let recommender = ChainRecommender::default();
        assert_eq!(recommender.reference_time(), None);
        assert_eq!(recommender.recommend(&habits, &checkins), first);
    }

    #[test]
    fn test_empty_inputs() {
        let recommender = ChainRecommender::default();
        assert!(recommender.recommend(&[], &[]).is_empty());
        assert!(recommender.recommend(&[habit("solo")], &[]).is_empty());

        let habits = vec![habit("a"), habit("b")];
        let relations = recommender.analyze_all(&habits, &[]);
        assert_eq!(relations.len(), 2);
        assert!(recommender.recommend(&habits, &[]).is_empty());
    }

    #[test]
    fn test_report_counts() {
        let (habits, checkins) = morning();
        let report = ChainRecommender::default().recommend_report(&habits, &checkins);
        let counts = report.relation_counts();

        // Every earlier habit triggers every later one within the hour
        assert_eq!(counts.get(&RelationType::Trigger), Some(&6));
        assert_eq!(counts.values().sum::<usize>(), 12);
    }
}
