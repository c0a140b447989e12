//! Relation Analyzer
//!
//! Infers a directional relationship between two habits from their checkin
//! timelines. Two signals are combined:
//!
//! - **Time proximity**: on days both habits were completed, how long after the
//!   source the target was recorded, and how consistent that delay is.
//! - **Co-occurrence**: a 2x2 contingency table over completion dates and the
//!   phi coefficient derived from it.
//!
//! The result is directional: swapping source and target flips the sign of
//! the mean delay.

use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{BTreeMap, BTreeSet};

use crate::config::{AnalysisConfig, CooccurrenceUniverse};
use crate::model::{Checkin, Habit, HabitRelation, RelationStrength, RelationType};

/// Confidence reported when either habit lacks enough completions
pub const INSUFFICIENT_DATA_CONFIDENCE: f64 = 0.3;

/// Confidence of the weak fallback relation
pub const FALLBACK_CONFIDENCE: f64 = 0.4;

/// Completed checkins of one habit, keyed by calendar date
///
/// When several completed checkins share a date, the earliest recording time
/// is kept.
#[derive(Debug, Clone, Default)]
pub struct CompletionLog {
    by_date: BTreeMap<NaiveDate, DateTime<Utc>>,
    completed: usize,
}

impl CompletionLog {
    /// Collect the completed checkins of `habit_id`
    pub fn from_checkins<'a>(
        habit_id: &str,
        checkins: impl IntoIterator<Item = &'a Checkin>,
    ) -> Self {
        let mut log = Self::default();
        for checkin in checkins {
            if checkin.habit_id == habit_id {
                log.record(checkin);
            }
        }
        log
    }

    /// Add one checkin, ignoring it unless completed
    pub fn record(&mut self, checkin: &Checkin) {
        if !checkin.is_completed {
            return;
        }
        self.completed += 1;
        self.by_date
            .entry(checkin.date)
            .and_modify(|ts| *ts = (*ts).min(checkin.created_at))
            .or_insert(checkin.created_at);
    }

    /// Number of completed checkins (before per-date deduplication)
    pub fn completed_count(&self) -> usize {
        self.completed
    }

    /// Distinct completion dates, ascending
    pub fn dates(&self) -> impl Iterator<Item = &NaiveDate> {
        self.by_date.keys()
    }

    pub fn timestamp_on(&self, date: &NaiveDate) -> Option<DateTime<Utc>> {
        self.by_date.get(date).copied()
    }

    pub fn contains(&self, date: &NaiveDate) -> bool {
        self.by_date.contains_key(date)
    }
}

/// Delay statistics on days both habits were completed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeProximity {
    pub shared_days: usize,
    /// Mean of `target - source` in milliseconds
    pub mean_delta_ms: f64,
    pub std_dev_ms: f64,
    /// 1 / (1 + stdDev / |mean|), 1 when every delay is identical or the
    /// mean delay is zero
    pub consistency: f64,
}

impl TimeProximity {
    fn none() -> Self {
        Self {
            shared_days: 0,
            mean_delta_ms: 0.0,
            std_dev_ms: 0.0,
            consistency: 0.0,
        }
    }
}

/// Measure how closely `target` follows `source` in time
pub fn time_proximity(source: &CompletionLog, target: &CompletionLog) -> TimeProximity {
    let deltas: Vec<f64> = source
        .by_date
        .iter()
        .filter_map(|(date, source_ts)| {
            target
                .timestamp_on(date)
                .map(|target_ts| (target_ts - *source_ts).num_milliseconds() as f64)
        })
        .collect();

    if deltas.is_empty() {
        return TimeProximity::none();
    }

    let n = deltas.len() as f64;
    let mean = deltas.iter().sum::<f64>() / n;
    let variance = deltas.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt();

    // A zero denominator on either side is treated as perfectly consistent
    let consistency = if std_dev == 0.0 || mean == 0.0 {
        1.0
    } else {
        1.0 / (1.0 + std_dev / mean.abs())
    };

    TimeProximity {
        shared_days: deltas.len(),
        mean_delta_ms: mean,
        std_dev_ms: std_dev,
        consistency,
    }
}

/// 2x2 contingency table of completion dates
///
/// - `a`: both completed
/// - `b`: only source
/// - `c`: only target
/// - `d`: neither
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Contingency {
    pub a: u64,
    pub b: u64,
    pub c: u64,
    pub d: u64,
}

impl Contingency {
    /// Build the table for two completion logs
    pub fn from_logs(
        source: &CompletionLog,
        target: &CompletionLog,
        universe: CooccurrenceUniverse,
    ) -> Self {
        let union: BTreeSet<&NaiveDate> = source.dates().chain(target.dates()).collect();
        let mut table = Self::default();

        for date in &union {
            match (source.contains(date), target.contains(date)) {
                (true, true) => table.a += 1,
                (true, false) => table.b += 1,
                (false, true) => table.c += 1,
                (false, false) => {}
            }
        }

        if universe == CooccurrenceUniverse::Span {
            if let (Some(first), Some(last)) = (union.first(), union.last()) {
                let span = (**last - **first).num_days() as u64 + 1;
                table.d = span.saturating_sub(union.len() as u64);
            }
        }

        table
    }

    /// Dates on which at least one habit was completed
    pub fn union_size(&self) -> u64 {
        self.a + self.b + self.c
    }

    /// Share of union dates on which both habits were completed
    pub fn same_day_rate(&self) -> f64 {
        let union = self.union_size();
        if union == 0 {
            0.0
        } else {
            self.a as f64 / union as f64
        }
    }

    /// Phi coefficient of this table
    pub fn phi(&self) -> f64 {
        phi_coefficient(self.a, self.b, self.c, self.d)
    }
}

/// Phi correlation coefficient for two binary variables
///
/// Returns a value between -1 and 1; a zero denominator yields 0.
pub fn phi_coefficient(a: u64, b: u64, c: u64, d: u64) -> f64 {
    let (a, b, c, d) = (a as f64, b as f64, c as f64, d as f64);

    let numerator = a * d - b * c;
    let denominator = ((a + b) * (c + d) * (a + c) * (b + d)).sqrt();

    if denominator == 0.0 || !denominator.is_finite() {
        0.0
    } else {
        (numerator / denominator).clamp(-1.0, 1.0)
    }
}

/// Infers relations between habit pairs
#[derive(Debug, Clone, Default)]
pub struct RelationAnalyzer {
    config: AnalysisConfig,
}

impl RelationAnalyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyze `source -> target` over a shared checkin snapshot
    pub fn analyze(&self, source: &Habit, target: &Habit, checkins: &[Checkin]) -> HabitRelation {
        let source_log = CompletionLog::from_checkins(&source.id, checkins);
        let target_log = CompletionLog::from_checkins(&target.id, checkins);
        self.analyze_logs(source, target, &source_log, &target_log)
    }

    /// Analyze `source -> target` from pre-built completion logs
    pub fn analyze_logs(
        &self,
        source: &Habit,
        target: &Habit,
        source_log: &CompletionLog,
        target_log: &CompletionLog,
    ) -> HabitRelation {
        let min = self.config.min_completions;
        if source_log.completed_count() < min || target_log.completed_count() < min {
            return HabitRelation {
                source_habit_id: source.id.clone(),
                target_habit_id: target.id.clone(),
                relation_type: RelationType::Sequential,
                strength: RelationStrength::Weak,
                confidence: INSUFFICIENT_DATA_CONFIDENCE,
                description: format!(
                    "insufficient data: {} and {} need at least {} completions each",
                    source.name, target.name, min
                ),
            };
        }

        let proximity = time_proximity(source_log, target_log);
        let table = Contingency::from_logs(source_log, target_log, self.config.universe);
        let same_day_rate = table.same_day_rate();
        let phi = table.phi();

        let (relation_type, strength, confidence) =
            self.classify(&proximity, same_day_rate, phi);

        tracing::debug!(
            source = %source.id,
            target = %target.id,
            mean_delta_ms = proximity.mean_delta_ms,
            consistency = proximity.consistency,
            same_day_rate,
            phi,
            relation = %relation_type,
            "Analyzed habit pair"
        );

        HabitRelation {
            source_habit_id: source.id.clone(),
            target_habit_id: target.id.clone(),
            relation_type,
            strength,
            confidence: confidence.clamp(0.0, 1.0),
            description: describe(source, target, relation_type, strength, &proximity),
        }
    }

    /// Decision policy, first match wins
    fn classify(
        &self,
        proximity: &TimeProximity,
        same_day_rate: f64,
        phi: f64,
    ) -> (RelationType, RelationStrength, f64) {
        let config = &self.config;
        let mean = proximity.mean_delta_ms;

        if mean > 0.0 && mean <= config.trigger_window_ms as f64 {
            (
                RelationType::Trigger,
                RelationStrength::Strong,
                proximity.consistency.min(config.max_trigger_confidence),
            )
        } else if same_day_rate > config.same_day_threshold {
            (RelationType::Sequential, RelationStrength::Medium, same_day_rate)
        } else if phi > config.complementary_phi {
            (RelationType::Complementary, RelationStrength::Medium, phi)
        } else if phi < config.conflicting_phi {
            (RelationType::Conflicting, RelationStrength::Medium, phi.abs())
        } else {
            (RelationType::Sequential, RelationStrength::Weak, FALLBACK_CONFIDENCE)
        }
    }
}

/// Analyze `source -> target` with default thresholds
pub fn analyze_relation(source: &Habit, target: &Habit, checkins: &[Checkin]) -> HabitRelation {
    RelationAnalyzer::default().analyze(source, target, checkins)
}

fn describe(
    source: &Habit,
    target: &Habit,
    relation_type: RelationType,
    strength: RelationStrength,
    proximity: &TimeProximity,
) -> String {
    match (relation_type, strength) {
        (RelationType::Trigger, _) => format!(
            "Completing {} tends to trigger {} about {} minutes later",
            source.name,
            target.name,
            (proximity.mean_delta_ms / 60_000.0).round() as i64
        ),
        (RelationType::Sequential, RelationStrength::Weak) => format!(
            "No clear pattern between {} and {}",
            source.name, target.name
        ),
        (RelationType::Sequential, _) => format!(
            "{} and {} are usually completed on the same day",
            source.name, target.name
        ),
        (RelationType::Complementary, _) => format!(
            "{} and {} reinforce each other",
            source.name, target.name
        ),
        (RelationType::Conflicting, _) => format!(
            "{} and {} rarely happen on the same day",
            source.name, target.name
        ),
    }
}
