// src/report.rs
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::aggregation::{Aggregation, DailyAggregate};
use crate::reconciliation::WeeklyAggregate;
use crate::timecard::{weekday_name, EmployeeId, LocationId, WeekKey, REPORT_WEEKDAYS};

pub const WEEK_START_FORMAT: &str = "%Y-%m-%d";

/// One rendered employee-week, Sunday..Saturday summaries plus weekly totals.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub employee_id: EmployeeId,
    pub location: LocationId,
    pub week_start: NaiveDate,
    /// Indexed Sunday = 0 .. Saturday = 6, empty when the day had no entries.
    pub days: [String; 7],
    pub weekly_regular_hours: Decimal,
    pub weekly_overtime_paid: Decimal,
    pub weekly_total_hours: Decimal,
    pub weekly_projected_overtime: Decimal,
    pub overtime_owed: Decimal,
}

impl ReportRow {
    pub fn header() -> Vec<&'static str> {
        let mut header = vec!["EmpID", "Location", "Week Start"];
        header.extend(REPORT_WEEKDAYS.iter().map(|day| weekday_name(*day)));
        header.extend([
            "Weekly Regular Hours",
            "Weekly OT Paid",
            "Weekly Total Hours",
            "Weekly Proj OT",
            "Overtime Owed",
        ]);
        header
    }

    /// Field values in header order.
    pub fn to_record(&self) -> Vec<String> {
        let mut record = vec![
            self.employee_id.clone(),
            self.location.clone(),
            self.week_start.format(WEEK_START_FORMAT).to_string(),
        ];
        record.extend(self.days.iter().cloned());
        record.extend(
            [
                self.weekly_regular_hours,
                self.weekly_overtime_paid,
                self.weekly_total_hours,
                self.weekly_projected_overtime,
                self.overtime_owed,
            ]
            .into_iter()
            .map(format_hours),
        );
        record
    }
}

/// Renders an hour amount without padding, keeping at least one decimal place:
/// `8` -> `8.0`, `2.50` -> `2.5`.
pub fn format_hours(value: Decimal) -> String {
    let normalized = value.normalize();
    if normalized.scale() == 0 {
        format!("{}.0", normalized)
    } else {
        normalized.to_string()
    }
}

/// `"Mon 03/11: 10.5 hrs (Reg: 10.5, OT Paid: 0.0, Proj OT: 2.5)"`
pub fn format_day_summary(day: &DailyAggregate) -> String {
    format!(
        "{}: {} hrs (Reg: {}, OT Paid: {}, Proj OT: {})",
        day.date.format("%a %m/%d"),
        format_hours(day.total_hours),
        format_hours(day.regular_hours),
        format_hours(day.overtime_paid_hours),
        format_hours(day.projected_overtime)
    )
}

fn weekday_slot(date: NaiveDate) -> usize {
    date.weekday().num_days_from_sunday() as usize
}

/// One row per reconciled week, sorted by location, employee, week start.
pub fn build_report(
    aggregation: &Aggregation,
    weekly: &BTreeMap<WeekKey, WeeklyAggregate>,
) -> Vec<ReportRow> {
    weekly
        .iter()
        .map(|(key, week)| {
            let mut days: [String; 7] = Default::default();
            for day in aggregation.days_for(key) {
                days[weekday_slot(day.date)] = format_day_summary(day);
            }
            ReportRow {
                employee_id: key.employee_id.clone(),
                location: key.location.clone(),
                week_start: key.week_start,
                days,
                weekly_regular_hours: week.weekly_regular_hours,
                weekly_overtime_paid: week.weekly_overtime_paid,
                weekly_total_hours: week.weekly_total_hours,
                weekly_projected_overtime: week.weekly_projected_overtime,
                overtime_owed: week.overtime_owed,
            }
        })
        .collect()
}
