// src/aggregation.rs
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::timecard::{TimecardEntry, WeekEnding, WeekKey};

// --- Aggregate Structures ---

/// Per-day figures for one employee-week.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyAggregate {
    pub key: WeekKey,
    pub date: NaiveDate,
    /// Every pay code counts here, including ones that are neither regular nor overtime.
    pub total_hours: Decimal,
    pub regular_hours: Decimal,
    pub overtime_paid_hours: Decimal,
    /// Week-level mean, identical for every day of the same week.
    pub scheduled_regular_hours: Decimal,
    pub projected_overtime: Decimal,
}

/// Weekly sums before reconciliation.
///
/// `weekly_total_hours` is regular + overtime only, so hours booked under any
/// other pay code show up in the daily totals but not here.
#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyTotals {
    pub weekly_regular_hours: Decimal,
    pub weekly_overtime_paid: Decimal,
    pub weekly_total_hours: Decimal,
    pub weekly_projected_overtime: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregationStats {
    pub entries_used: usize,
    pub skipped_missing_date: usize,
    pub skipped_missing_identity: usize,
    pub missing_hours: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    pub daily: BTreeMap<(WeekKey, NaiveDate), DailyAggregate>,
    pub weekly: BTreeMap<WeekKey, WeeklyTotals>,
    pub stats: AggregationStats,
}

impl Aggregation {
    /// Days with activity for one week, in date order.
    pub fn days_for<'a>(&'a self, key: &'a WeekKey) -> impl Iterator<Item = &'a DailyAggregate> {
        let from = (key.clone(), NaiveDate::MIN);
        let to = (key.clone(), NaiveDate::MAX);
        self.daily.range(from..=to).map(|(_, day)| day)
    }
}

// --- Grouping ---

#[derive(Debug, Default)]
struct DaySums {
    total: Decimal,
    regular: Decimal,
    overtime: Decimal,
}

#[derive(Debug, Default)]
struct WeekBucket {
    days: BTreeMap<NaiveDate, DaySums>,
    scheduled_sum: Decimal,
    scheduled_count: u32,
}

impl WeekBucket {
    /// Mean of the non-missing scheduled values; zero when all are missing.
    fn scheduled_mean(&self) -> Decimal {
        if self.scheduled_count == 0 {
            Decimal::ZERO
        } else {
            self.scheduled_sum / Decimal::from(self.scheduled_count)
        }
    }
}

/// Groups entries by (location, employee, week, day) and derives the daily and
/// weekly figures. Input order does not matter.
pub fn aggregate(entries: &[TimecardEntry], weeks: WeekEnding) -> Aggregation {
    let mut stats = AggregationStats::default();
    let mut buckets: BTreeMap<WeekKey, WeekBucket> = BTreeMap::new();

    for entry in entries {
        let Some(date) = entry.date else {
            debug!(
                "Skipping entry without a usable date: Emp={}, Location={}",
                entry.employee_id, entry.location
            );
            stats.skipped_missing_date += 1;
            continue;
        };
        if !entry.has_identity() {
            debug!(
                "Skipping entry on {} without employee or location: Emp='{}', Location='{}'",
                date, entry.employee_id, entry.location
            );
            stats.skipped_missing_identity += 1;
            continue;
        }
        if entry.hours.is_none() {
            stats.missing_hours += 1;
        }
        stats.entries_used += 1;

        let key = WeekKey {
            location: entry.location.clone(),
            employee_id: entry.employee_id.clone(),
            week_start: weeks.week_start(date),
        };
        let bucket = buckets.entry(key).or_default();
        if let Some(scheduled) = entry.scheduled_regular_hours {
            bucket.scheduled_sum += scheduled;
            bucket.scheduled_count += 1;
        }

        let hours = entry.hours_or_zero();
        let day = bucket.days.entry(date).or_default();
        day.total += hours;
        if entry.is_regular() {
            day.regular += hours;
        } else if entry.is_overtime() {
            day.overtime += hours;
        }
    }

    let mut aggregation = Aggregation {
        stats,
        ..Default::default()
    };

    for (key, bucket) in buckets {
        let scheduled = bucket.scheduled_mean();
        let mut totals = WeeklyTotals {
            weekly_regular_hours: Decimal::ZERO,
            weekly_overtime_paid: Decimal::ZERO,
            weekly_total_hours: Decimal::ZERO,
            weekly_projected_overtime: Decimal::ZERO,
        };

        for (date, sums) in bucket.days {
            let projected_overtime = (sums.total - scheduled).max(Decimal::ZERO);
            totals.weekly_regular_hours += sums.regular;
            totals.weekly_overtime_paid += sums.overtime;
            totals.weekly_projected_overtime += projected_overtime;

            aggregation.daily.insert(
                (key.clone(), date),
                DailyAggregate {
                    key: key.clone(),
                    date,
                    total_hours: sums.total,
                    regular_hours: sums.regular,
                    overtime_paid_hours: sums.overtime,
                    scheduled_regular_hours: scheduled,
                    projected_overtime,
                },
            );
        }
        totals.weekly_total_hours = totals.weekly_regular_hours + totals.weekly_overtime_paid;

        debug!(
            "Week aggregated: Location={}, Emp={}, WeekStart={}, Sched={}, Totals={:?}",
            key.location, key.employee_id, key.week_start, scheduled, totals
        );
        aggregation.weekly.insert(key, totals);
    }

    info!(
        "Aggregated {} entries into {} employee-weeks ({} days). Skipped: {} without date, {} without employee/location. {} entries had missing hours.",
        aggregation.stats.entries_used,
        aggregation.weekly.len(),
        aggregation.daily.len(),
        aggregation.stats.skipped_missing_date,
        aggregation.stats.skipped_missing_identity,
        aggregation.stats.missing_hours
    );

    aggregation
}
