//! Recurrence evaluation
//!
//! Answers "is this habit due on date D?" for every frequency rule.
//! Weekdays use the ISO numbering throughout the crate: Monday = 1 ... Sunday = 7.

use chrono::{Datelike, NaiveDate};

use crate::model::{FrequencyType, Habit};

/// Whether `habit` is due on `date`
///
/// Dates outside `[start_date, end_date]` are never due. A `Custom` rule with
/// an interval of zero is never due.
pub fn is_due(habit: &Habit, date: NaiveDate) -> bool {
    if date < habit.start_date {
        return false;
    }
    if let Some(end) = habit.end_date {
        if date > end {
            return false;
        }
    }

    let rule = &habit.frequency;
    match rule.kind {
        FrequencyType::Daily => true,
        FrequencyType::Weekly => rule.days.contains(&date.weekday().number_from_monday()),
        FrequencyType::Monthly => rule.days.contains(&date.day()),
        FrequencyType::Custom => {
            if rule.interval == 0 {
                return false;
            }
            let elapsed = (date - habit.start_date).num_days();
            elapsed % i64::from(rule.interval) == 0
        }
    }
}

/// Every due date in the inclusive range `[from, to]`, ascending
pub fn due_dates(habit: &Habit, from: NaiveDate, to: NaiveDate) -> impl Iterator<Item = NaiveDate> + '_ {
    // Nothing can be due before the start date, skip straight to it
    let first = from.max(habit.start_date);
    first
        .iter_days()
        .take_while(move |day| *day <= to)
        .filter(move |day| is_due(habit, *day))
}

/// Number of due dates in the inclusive range `[from, to]`
pub fn count_due_days(habit: &Habit, from: NaiveDate, to: NaiveDate) -> u32 {
    due_dates(habit, from, to).count() as u32
}
