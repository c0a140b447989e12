//! Core data types for habit analysis
//!
//! This module defines the value objects shared by every analysis stage:
//! - `Habit` and `FrequencyRule`: what is tracked and when it is due
//! - `Checkin`: one record of a habit being done (or skipped) on a date
//! - `HabitStats`: derived completion and streak numbers
//! - `HabitRelation`: an inferred, directional relationship between two habits
//! - `HabitChain`: an ordered group of distinct habits
//!
//! Field names serialize in camelCase so presentation layers can consume the
//! values as-is.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

use super::error::{ChainError, ChainResult};

/// Category of habit for organization and display
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Physical health (sleep, water, vitamins)
    Health,
    /// Exercise and movement
    Fitness,
    /// Reading, studying, practicing
    Learning,
    /// Meditation, journaling, gratitude
    Mindfulness,
    /// Work and focus routines
    Productivity,
    /// Anything else, including categories unknown to this crate
    #[default]
    #[serde(other)]
    Other,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Health => write!(f, "health"),
            Category::Fitness => write!(f, "fitness"),
            Category::Learning => write!(f, "learning"),
            Category::Mindfulness => write!(f, "mindfulness"),
            Category::Productivity => write!(f, "productivity"),
            Category::Other => write!(f, "other"),
        }
    }
}

/// Kind of recurrence rule
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FrequencyType {
    /// Due every day
    Daily,
    /// Due on selected weekdays (Monday = 1 ... Sunday = 7)
    Weekly,
    /// Due on selected days of the month (1..=31)
    Monthly,
    /// Due every `interval` days counted from the start date
    Custom,
}

impl std::fmt::Display for FrequencyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrequencyType::Daily => write!(f, "daily"),
            FrequencyType::Weekly => write!(f, "weekly"),
            FrequencyType::Monthly => write!(f, "monthly"),
            FrequencyType::Custom => write!(f, "custom"),
        }
    }
}

/// Recurrence rule of a habit
///
/// `days` is only read by `Weekly` and `Monthly` rules; `interval` only by
/// `Custom` rules.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FrequencyRule {
    #[serde(rename = "type")]
    pub kind: FrequencyType,
    #[serde(default)]
    pub days: BTreeSet<u32>,
    #[serde(default = "default_interval")]
    pub interval: u32,
}

fn default_interval() -> u32 {
    1
}

impl FrequencyRule {
    pub fn daily() -> Self {
        Self {
            kind: FrequencyType::Daily,
            days: BTreeSet::new(),
            interval: default_interval(),
        }
    }

    /// Weekly rule on the given ISO weekdays (Monday = 1 ... Sunday = 7)
    pub fn weekly(days: impl IntoIterator<Item = u32>) -> Self {
        Self {
            kind: FrequencyType::Weekly,
            days: days.into_iter().collect(),
            interval: default_interval(),
        }
    }

    /// Monthly rule on the given days of the month
    pub fn monthly(days: impl IntoIterator<Item = u32>) -> Self {
        Self {
            kind: FrequencyType::Monthly,
            days: days.into_iter().collect(),
            interval: default_interval(),
        }
    }

    /// Custom rule: due every `interval` days from the start date
    pub fn every(interval: u32) -> Self {
        Self {
            kind: FrequencyType::Custom,
            days: BTreeSet::new(),
            interval,
        }
    }
}

/// A recurring user-defined activity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    /// Unique identifier, owned by the habit service
    pub id: String,
    /// Display name (e.g., "Coffee", "Meditate")
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Category,
    pub frequency: FrequencyRule,
    /// First calendar date the habit can be due
    pub start_date: NaiveDate,
    /// Last calendar date the habit can be due, if any
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl Habit {
    /// Create a habit that was created at midnight (UTC) of its start date
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        frequency: FrequencyRule,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            category: Category::default(),
            frequency,
            start_date,
            end_date: None,
            created_at: start_of_day(start_date),
        }
    }

    /// Builder: set description
    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Builder: set category
    pub fn category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    /// Builder: set the last due date
    pub fn end_date(mut self, end: NaiveDate) -> Self {
        self.end_date = Some(end);
        self
    }

    /// Builder: set creation timestamp
    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// UTC calendar date the habit was created on
    pub fn created_on(&self) -> NaiveDate {
        self.created_on_in(&Utc)
    }

    /// Calendar date the habit was created on, in `tz`
    pub fn created_on_in<Tz: TimeZone>(&self, tz: &Tz) -> NaiveDate {
        self.created_at.with_timezone(tz).date_naive()
    }
}

/// A record that a habit was (or was not) performed on a calendar date
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Checkin {
    pub habit_id: String,
    pub date: NaiveDate,
    pub is_completed: bool,
    /// When the checkin was recorded
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completion_time: Option<NaiveTime>,
}

impl Checkin {
    /// Completed checkin recorded at `created_at`, dated by its UTC calendar day
    pub fn completed_at(habit_id: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            habit_id: habit_id.into(),
            date: created_at.date_naive(),
            is_completed: true,
            created_at,
            completion_time: None,
        }
    }

    /// Completed checkin for a date, recorded at noon (UTC) of that date
    pub fn completed(habit_id: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            habit_id: habit_id.into(),
            date,
            is_completed: true,
            created_at: noon_of(date),
            completion_time: None,
        }
    }

    /// A checkin that records the habit as not done
    pub fn missed(habit_id: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            is_completed: false,
            ..Self::completed(habit_id, date)
        }
    }

    /// Builder: set completion time of day
    pub fn completion_time(mut self, time: NaiveTime) -> Self {
        self.completion_time = Some(time);
        self
    }
}

/// Completion and streak statistics for one habit
///
/// Derived on demand, never persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HabitStats {
    pub total_completions: u32,
    pub total_days: u32,
    /// Percentage in 0..=100
    pub completion_rate: u32,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_completed_date: Option<NaiveDate>,
}

/// Kind of inferred relationship between two habits
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RelationType {
    /// Completing the source reliably precedes the target within a short window
    Trigger,
    /// Usually done on the same day, without a tight time link
    Sequential,
    /// Positively correlated completions
    Complementary,
    /// Negatively correlated completions
    Conflicting,
}

impl RelationType {
    pub fn all() -> &'static [RelationType] {
        &[
            RelationType::Trigger,
            RelationType::Sequential,
            RelationType::Complementary,
            RelationType::Conflicting,
        ]
    }
}

impl std::fmt::Display for RelationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelationType::Trigger => write!(f, "trigger"),
            RelationType::Sequential => write!(f, "sequential"),
            RelationType::Complementary => write!(f, "complementary"),
            RelationType::Conflicting => write!(f, "conflicting"),
        }
    }
}

/// Strength bucket of an inferred relationship
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum RelationStrength {
    Weak,
    Medium,
    Strong,
}

impl std::fmt::Display for RelationStrength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelationStrength::Weak => write!(f, "weak"),
            RelationStrength::Medium => write!(f, "medium"),
            RelationStrength::Strong => write!(f, "strong"),
        }
    }
}

/// A directional relationship `source -> target`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HabitRelation {
    pub source_habit_id: String,
    pub target_habit_id: String,
    #[serde(rename = "type")]
    pub relation_type: RelationType,
    pub strength: RelationStrength,
    /// Confidence in 0.0..=1.0
    pub confidence: f64,
    pub description: String,
}

impl HabitRelation {
    /// Whether this relation is usable as a chain edge of the given kind
    pub fn qualifies(&self, kind: RelationType, min_confidence: f64) -> bool {
        self.relation_type == kind
            && self.strength != RelationStrength::Weak
            && self.confidence > min_confidence
    }
}

/// One habit inside a chain
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChainHabit {
    pub habit_id: String,
    /// 1-based position in the chain
    pub order: u32,
    pub is_optional: bool,
}

/// An ordered sequence of distinct habits performed together or in sequence
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HabitChain {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub habits: Vec<ChainHabit>,
    pub frequency: FrequencyRule,
    pub created_at: DateTime<Utc>,
}

impl HabitChain {
    /// Start an empty chain; habits are appended with [`HabitChain::with_habit`]
    pub fn new(name: impl Into<String>, frequency: FrequencyRule) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            description: None,
            habits: Vec::new(),
            frequency,
            created_at: Utc::now(),
        }
    }

    /// Builder: set id
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Builder: set description
    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Builder: set creation timestamp
    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Builder: append a habit at the next order position
    pub fn with_habit(mut self, habit_id: impl Into<String>, is_optional: bool) -> Self {
        let order = self.habits.len() as u32 + 1;
        self.habits.push(ChainHabit {
            habit_id: habit_id.into(),
            order,
            is_optional,
        });
        self
    }

    /// Number of habits in the chain
    pub fn len(&self) -> usize {
        self.habits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.habits.is_empty()
    }

    /// Habit ids in chain order
    pub fn habit_ids(&self) -> Vec<&str> {
        let mut sorted: Vec<&ChainHabit> = self.habits.iter().collect();
        sorted.sort_by_key(|h| h.order);
        sorted.into_iter().map(|h| h.habit_id.as_str()).collect()
    }

    pub fn contains(&self, habit_id: &str) -> bool {
        self.habits.iter().any(|h| h.habit_id == habit_id)
    }

    /// Check uniqueness of habit ids and contiguity of `order`
    pub fn validate(&self) -> ChainResult<()> {
        if self.habits.is_empty() {
            return Err(ChainError::Empty);
        }

        let mut seen = HashSet::new();
        for habit in &self.habits {
            if !seen.insert(habit.habit_id.as_str()) {
                return Err(ChainError::DuplicateHabit(habit.habit_id.clone()));
            }
        }

        let mut orders: Vec<u32> = self.habits.iter().map(|h| h.order).collect();
        orders.sort_unstable();
        for (idx, found) in orders.into_iter().enumerate() {
            let expected = idx as u32 + 1;
            if found != expected {
                return Err(ChainError::NonContiguousOrder { expected, found });
            }
        }

        Ok(())
    }

    /// Validate and additionally require every habit to exist in `roster`
    pub fn validate_against(&self, roster: &[Habit]) -> ChainResult<()> {
        self.validate()?;
        for habit in &self.habits {
            if !roster.iter().any(|h| h.id == habit.habit_id) {
                return Err(ChainError::UnknownHabit(habit.habit_id.clone()));
            }
        }
        Ok(())
    }
}

/// Midnight (UTC) of a calendar date
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

fn noon_of(date: NaiveDate) -> DateTime<Utc> {
    start_of_day(date) + chrono::Duration::hours(12)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_habit_serializes_camel_case() {
        let habit = Habit::new("h1", "Read", FrequencyRule::weekly([1, 3]), date(2024, 1, 1))
            .category(Category::Learning);
        let json = serde_json::to_string(&habit).unwrap();

        assert!(json.contains("\"startDate\":\"2024-01-01\""));
        assert!(json.contains("\"type\":\"weekly\""));
        assert!(json.contains("\"days\":[1,3]"));
        assert!(json.contains("\"category\":\"learning\""));
    }

    #[test]
    fn test_habit_deserializes_with_defaults() {
        let json = r#"{
            "id": "h1",
            "name": "Walk",
            "category": "outdoors",
            "frequency": { "type": "daily" },
            "startDate": "2024-01-01",
            "createdAt": "2024-01-01T08:00:00Z"
        }"#;
        let habit: Habit = serde_json::from_str(json).unwrap();

        assert_eq!(habit.category, Category::Other);
        assert_eq!(habit.frequency.interval, 1);
        assert!(habit.frequency.days.is_empty());
        assert!(habit.end_date.is_none());
    }

    #[test]
    fn test_checkin_constructors() {
        let c = Checkin::completed("h1", date(2024, 1, 5));
        assert!(c.is_completed);
        assert_eq!(c.created_at.date_naive(), date(2024, 1, 5));

        let m = Checkin::missed("h1", date(2024, 1, 5));
        assert!(!m.is_completed);
        assert_eq!(m.date, c.date);
    }

    #[test]
    fn test_relation_qualifies() {
        let relation = HabitRelation {
            source_habit_id: "a".to_string(),
            target_habit_id: "b".to_string(),
            relation_type: RelationType::Trigger,
            strength: RelationStrength::Strong,
            confidence: 0.8,
            description: String::new(),
        };
        assert!(relation.qualifies(RelationType::Trigger, 0.5));
        assert!(!relation.qualifies(RelationType::Complementary, 0.5));
        assert!(!relation.qualifies(RelationType::Trigger, 0.8));

        let weak = HabitRelation {
            strength: RelationStrength::Weak,
            ..relation
        };
        assert!(!weak.qualifies(RelationType::Trigger, 0.5));
    }

    #[test]
    fn test_chain_builder_assigns_contiguous_orders() {
        let chain = HabitChain::new("Morning", FrequencyRule::daily())
            .with_habit("coffee", false)
            .with_habit("stretch", true)
            .with_habit("journal", false);

        assert_eq!(chain.len(), 3);
        assert_eq!(chain.habit_ids(), vec!["coffee", "stretch", "journal"]);
        assert_eq!(chain.habits[2].order, 3);
        assert!(chain.validate().is_ok());
    }

    #[test]
    fn test_chain_validation_errors() {
        let empty = HabitChain::new("Empty", FrequencyRule::daily());
        assert_eq!(empty.validate(), Err(ChainError::Empty));

        let dup = HabitChain::new("Dup", FrequencyRule::daily())
            .with_habit("a", false)
            .with_habit("a", false);
        assert_eq!(
            dup.validate(),
            Err(ChainError::DuplicateHabit("a".to_string()))
        );

        let mut gap = HabitChain::new("Gap", FrequencyRule::daily())
            .with_habit("a", false)
            .with_habit("b", false);
        gap.habits[1].order = 3;
        assert_eq!(
            gap.validate(),
            Err(ChainError::NonContiguousOrder {
                expected: 2,
                found: 3
            })
        );
    }

    #[test]
    fn test_chain_validate_against_roster() {
        let roster = vec![Habit::new("a", "A", FrequencyRule::daily(), date(2024, 1, 1))];
        let chain = HabitChain::new("Chain", FrequencyRule::daily())
            .with_habit("a", false)
            .with_habit("ghost", false);

        assert_eq!(
            chain.validate_against(&roster),
            Err(ChainError::UnknownHabit("ghost".to_string()))
        );
    }
}
