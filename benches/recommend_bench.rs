//! Benchmarks for the habit analysis pipeline
//!
//! Run with: cargo bench

use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use habitlink::model::start_of_day;
use habitlink::{compute_stats_at, AnalysisConfig, ChainRecommender, Checkin, FrequencyRule, Habit};

fn create_roster(habit_count: usize, days: i64) -> (Vec<Habit>, Vec<Checkin>) {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let habits: Vec<Habit> = (0..habit_count)
        .map(|i| Habit::new(format!("h{i}"), format!("Habit {i}"), FrequencyRule::daily(), start))
        .collect();

    let mut checkins = Vec::new();
    for day in 0..days {
        for (i, habit) in habits.iter().enumerate() {
            // Skip a deterministic subset of days so relations vary
            if (day as usize + i) % 5 == 0 {
                continue;
            }
            let ts = start_of_day(start)
                + Duration::days(day)
                + Duration::hours(6)
                + Duration::minutes((i as i64 * 7) % 180);
            checkins.push(Checkin::completed_at(habit.id.clone(), ts));
        }
    }

    (habits, checkins)
}

fn bench_recommend(c: &mut Criterion) {
    let mut group = c.benchmark_group("recommend");

    for size in [10, 25, 50] {
        let (habits, checkins) = create_roster(size, 90);
        group.throughput(Throughput::Elements((size * (size - 1)) as u64));

        for parallel in [false, true] {
            let recommender = ChainRecommender::new(AnalysisConfig {
                parallel,
                ..AnalysisConfig::default()
            });
            let label = if parallel { "parallel" } else { "sequential" };

            group.bench_with_input(BenchmarkId::new(label, size), &size, |b, _| {
                b.iter(|| recommender.recommend(black_box(&habits), black_box(&checkins)))
            });
        }
    }

    group.finish();
}

fn bench_stats(c: &mut Criterion) {
    let mut group = c.benchmark_group("stats");
    let (habits, checkins) = create_roster(1, 365);
    let today = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();

    group.bench_function("compute_stats_365_days", |b| {
        b.iter(|| compute_stats_at(black_box(&habits[0]), black_box(&checkins), today))
    });

    group.finish();
}

criterion_group!(benches, bench_recommend, bench_stats);
criterion_main!(benches);
