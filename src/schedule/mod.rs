//! Habit Scheduling
//!
//! - **recurrence**: due-date evaluation for daily/weekly/monthly/custom rules
//! - **stats**: completion rate and streak statistics built on top of it

pub mod recurrence;
pub mod stats;

pub use recurrence::{count_due_days, due_dates, is_due};
pub use stats::{
    completed_dates, completion_rate, compute_stats, compute_stats_at, compute_stats_in,
    current_streak, longest_streak,
};
