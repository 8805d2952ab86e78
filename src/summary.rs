//! Daily and monthly calorie aggregation.
//!
//! Pure functions over an in-memory entry slice; nothing here touches
//! storage, so the same inputs always produce the same summary.

use crate::models::{DailySummary, Entry, MonthlySummary};

/// `YYYY-MM` prefix for month matching. Date keys are fixed-width and
/// zero-padded, so a prefix test is equivalent to comparing year and month
/// fields; any other date representation must compare fields instead.
fn month_prefix(year: i32, month: u32) -> String {
    format!("{year:04}-{month:02}")
}

/// Sum of calories for entries on exactly `date`.
#[must_use]
pub fn daily_total(entries: &[Entry], date: &str) -> f64 {
    entries
        .iter()
        .filter(|entry| entry.date == date)
        .map(|entry| entry.calories)
        .sum()
}

/// Sum of calories for entries within the given year and month.
#[must_use]
pub fn monthly_total(entries: &[Entry], year: i32, month: u32) -> f64 {
    let prefix = month_prefix(year, month);
    entries
        .iter()
        .filter(|entry| entry.date.starts_with(&prefix))
        .map(|entry| entry.calories)
        .sum()
}

/// Roll-up for one day, including the matching entries themselves.
#[must_use]
pub fn daily_summary(entries: &[Entry], date: &str) -> DailySummary {
    let day_entries: Vec<Entry> = entries
        .iter()
        .filter(|entry| entry.date == date)
        .cloned()
        .collect();
    let total_calories = day_entries.iter().map(|entry| entry.calories).sum();
    DailySummary {
        date: date.to_string(),
        total_calories,
        entry_count: day_entries.len(),
        entries: day_entries,
    }
}

/// Roll-up for one month with a per-day breakdown.
///
/// The average divides by days that have at least one entry, not by
/// calendar days, and is zero for an empty month.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn monthly_summary(entries: &[Entry], year: i32, month: u32) -> MonthlySummary {
    let prefix = month_prefix(year, month);
    let month_entries: Vec<Entry> = entries
        .iter()
        .filter(|entry| entry.date.starts_with(&prefix))
        .cloned()
        .collect();
    let total_calories: f64 = month_entries.iter().map(|entry| entry.calories).sum();

    // Group by day in first-appearance order.
    let mut daily_summaries: Vec<DailySummary> = Vec::new();
    for entry in &month_entries {
        match daily_summaries.iter_mut().find(|day| day.date == entry.date) {
            Some(day) => {
                day.total_calories += entry.calories;
                day.entry_count += 1;
                day.entries.push(entry.clone());
            }
            None => daily_summaries.push(DailySummary {
                date: entry.date.clone(),
                total_calories: entry.calories,
                entry_count: 1,
                entries: vec![entry.clone()],
            }),
        }
    }

    let days_with_entries = daily_summaries.len();
    let average_daily_calories = if days_with_entries > 0 {
        total_calories / days_with_entries as f64
    } else {
        0.0
    };

    MonthlySummary {
        year,
        month,
        total_calories,
        average_daily_calories,
        entry_count: month_entries.len(),
        daily_summaries,
    }
}
