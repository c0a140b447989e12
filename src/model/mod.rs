//! Habit Data Model
//!
//! Plain value objects read from (and handed back to) the habit, checkin and
//! chain services:
//!
//! - **types**: Habit, Checkin, HabitStats, HabitRelation, HabitChain
//! - **error**: Chain validation errors

pub mod error;
pub mod types;

pub use error::{ChainError, ChainResult};
pub use types::{
    start_of_day, Category, ChainHabit, Checkin, FrequencyRule, FrequencyType, Habit,
    HabitChain, HabitRelation, HabitStats, RelationStrength, RelationType,
};
