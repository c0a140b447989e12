//! Completion and streak statistics
//!
//! Turns a habit plus its checkin history into [`HabitStats`]. Only completed
//! checkins count, and a date counts once no matter how many completed
//! checkins share it. Checkins dated after "today" are ignored.

use chrono::{Local, NaiveDate, TimeZone, Utc};
use std::collections::BTreeSet;

use super::recurrence::count_due_days;
use crate::model::{Checkin, Habit, HabitStats};

/// Compute statistics as of the local calendar date
pub fn compute_stats(habit: &Habit, checkins: &[Checkin]) -> HabitStats {
    compute_stats_in(habit, checkins, Local::now().date_naive(), &Local)
}

/// Compute statistics as of `today`, on the UTC calendar
pub fn compute_stats_at(habit: &Habit, checkins: &[Checkin], today: NaiveDate) -> HabitStats {
    compute_stats_in(habit, checkins, today, &Utc)
}

/// Compute statistics as of `today`, where `today` and the habit's creation
/// date are both read on the calendar of `tz`
pub fn compute_stats_in<Tz: TimeZone>(
    habit: &Habit,
    checkins: &[Checkin],
    today: NaiveDate,
    tz: &Tz,
) -> HabitStats {
    let completed = completed_dates(habit, checkins, today);
    let total_days = count_due_days(habit, habit.created_on_in(tz), today);
    let total_completions = completed.len() as u32;

    HabitStats {
        total_completions,
        total_days,
        completion_rate: completion_rate(total_completions, total_days),
        current_streak: current_streak(&completed, today),
        longest_streak: longest_streak(&completed),
        last_completed_date: completed.iter().next_back().copied(),
    }
}

/// Distinct dates on which `habit` was completed, up to and including `today`
pub fn completed_dates(habit: &Habit, checkins: &[Checkin], today: NaiveDate) -> BTreeSet<NaiveDate> {
    checkins
        .iter()
        .filter(|c| c.habit_id == habit.id && c.is_completed && c.date <= today)
        .map(|c| c.date)
        .collect()
}

/// Rounded percentage of due days that were completed, capped at 100
pub fn completion_rate(total_completions: u32, total_days: u32) -> u32 {
    if total_days == 0 {
        return 0;
    }
    let rate = (f64::from(total_completions) / f64::from(total_days) * 100.0).round();
    rate.min(100.0) as u32
}

/// Length of the run of consecutive days ending at the latest completion
///
/// The run only counts while it is still alive: if the latest completion is
/// older than yesterday the streak is 0.
pub fn current_streak(completed: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let Some(&latest) = completed.iter().next_back() else {
        return 0;
    };
    let Some(yesterday) = today.pred_opt() else {
        return 0;
    };
    if latest < yesterday {
        return 0;
    }

    let mut streak = 0;
    let mut expected = latest;
    for &date in completed.iter().rev() {
        if date != expected {
            break;
        }
        streak += 1;
        match expected.pred_opt() {
            Some(prev) => expected = prev,
            None => break,
        }
    }
    streak
}

/// Length of the longest run of consecutive completed days
pub fn longest_streak(completed: &BTreeSet<NaiveDate>) -> u32 {
    let mut longest = 0;
    let mut run = 0;
    let mut previous: Option<NaiveDate> = None;

    for &date in completed {
        run = match previous.and_then(|p| p.succ_opt()) {
            Some(next) if next == date => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        previous = Some(date);
    }

    longest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{start_of_day, FrequencyRule};
    use chrono::Duration;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn daily_since(start: NaiveDate) -> Habit {
        Habit::new("h", "Stretch", FrequencyRule::daily(), start)
    }

    fn completions(days: &[NaiveDate]) -> Vec<Checkin> {
        days.iter().map(|d| Checkin::completed("h", *d)).collect()
    }

    #[test]
    fn test_empty_checkins_yield_zero_stats() {
        let today = date(2024, 1, 10);
        let stats = compute_stats_at(&daily_since(today), &[], today);

        assert_eq!(stats.total_completions, 0);
        assert_eq!(stats.current_streak, 0);
        assert_eq!(stats.longest_streak, 0);
        assert_eq!(stats.completion_rate, 0);
        assert!(stats.last_completed_date.is_none());
    }

    #[test]
    fn test_five_day_streak_ending_today() {
        let today = date(2024, 5, 20);
        let days: Vec<NaiveDate> = (0..5).map(|i| today - Duration::days(i)).collect();
        let habit = daily_since(today - Duration::days(30));

        let stats = compute_stats_at(&habit, &completions(&days), today);
        assert_eq!(stats.current_streak, 5);
        assert_eq!(stats.longest_streak, 5);
        assert_eq!(stats.last_completed_date, Some(today));
    }

    #[test]
    fn test_longest_streak_differs_from_current() {
        let today = date(2024, 5, 20);
        // 3-day run, one missed day, then a 2-day run ending today
        let days = [
            today - Duration::days(5),
            today - Duration::days(4),
            today - Duration::days(3),
            today - Duration::days(1),
            today,
        ];
        let habit = daily_since(today - Duration::days(10));

        let stats = compute_stats_at(&habit, &completions(&days), today);
        assert_eq!(stats.current_streak, 2);
        assert_eq!(stats.longest_streak, 3);
    }

    #[test]
    fn test_streak_alive_through_yesterday() {
        let today = date(2024, 5, 20);
        let days = [today - Duration::days(2), today - Duration::days(1)];
        let set: BTreeSet<NaiveDate> = days.into_iter().collect();
        assert_eq!(current_streak(&set, today), 2);

        let stale: BTreeSet<NaiveDate> = [today - Duration::days(3), today - Duration::days(2)]
            .into_iter()
            .collect();
        assert_eq!(current_streak(&stale, today), 0);
        assert_eq!(longest_streak(&stale), 2);
    }

    #[test]
    fn test_completion_rate_half() {
        let today = date(2024, 5, 10);
        let habit = daily_since(date(2024, 5, 1));
        let days: Vec<NaiveDate> = (1..=5).map(|d| date(2024, 5, d * 2)).collect();

        let stats = compute_stats_at(&habit, &completions(&days), today);
        assert_eq!(stats.total_days, 10);
        assert_eq!(stats.total_completions, 5);
        assert_eq!(stats.completion_rate, 50);
    }

    #[test]
    fn test_total_days_counts_from_creation() {
        // Created mid-way through, started earlier: days before creation don't count
        let habit = Habit::new("h", "Gym", FrequencyRule::weekly([1, 3, 5]), date(2024, 1, 1))
            .created_at(start_of_day(date(2024, 1, 8)));
        let stats = compute_stats_at(&habit, &[], date(2024, 1, 14));
        assert_eq!(stats.total_days, 3);
    }

    #[test]
    fn test_duplicate_and_foreign_checkins_ignored() {
        let today = date(2024, 5, 10);
        let habit = daily_since(date(2024, 5, 1));
        let mut checkins = completions(&[today, today]);
        checkins.push(Checkin::completed("other", today - Duration::days(1)));
        checkins.push(Checkin::missed("h", today - Duration::days(1)));

        let stats = compute_stats_at(&habit, &checkins, today);
        assert_eq!(stats.total_completions, 1);
        assert_eq!(stats.current_streak, 1);
    }

    #[test]
    fn test_future_checkins_ignored() {
        let today = date(2024, 5, 10);
        let habit = daily_since(date(2024, 5, 1));
        let checkins = completions(&[today + Duration::days(3)]);

        let stats = compute_stats_at(&habit, &checkins, today);
        assert_eq!(stats.total_completions, 0);
        assert!(stats.last_completed_date.is_none());
    }

    #[test]
    fn test_completion_rate_capped() {
        assert_eq!(completion_rate(12, 10), 100);
        assert_eq!(completion_rate(1, 3), 33);
        assert_eq!(completion_rate(5, 0), 0);
    }

    #[test]
    fn test_total_days_follow_calendar_of_zone() {
        use chrono::FixedOffset;

        // Created late on March 4 UTC, which is already March 5 at UTC+5
        let habit = daily_since(date(2024, 3, 1))
            .created_at(start_of_day(date(2024, 3, 4)) + Duration::hours(22));
        let today = date(2024, 3, 10);
        let ahead = FixedOffset::east_opt(5 * 3600).unwrap();

        assert_eq!(compute_stats_at(&habit, &[], today).total_days, 7);
        assert_eq!(compute_stats_in(&habit, &[], today, &ahead).total_days, 6);
        assert_eq!(compute_stats_in(&habit, &[], today, &Utc).total_days, 7);
    }
}
