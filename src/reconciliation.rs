// src/reconciliation.rs
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;
use tracing::debug;

use crate::aggregation::WeeklyTotals;
use crate::timecard::WeekKey;

/// Weekly hours above which overtime is owed by law.
pub const DEFAULT_WEEKLY_OVERTIME_THRESHOLD: Decimal = dec!(40);

/// A week's totals together with the reconciled overtime owed.
#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyAggregate {
    pub key: WeekKey,
    pub weekly_regular_hours: Decimal,
    pub weekly_overtime_paid: Decimal,
    pub weekly_total_hours: Decimal,
    pub weekly_projected_overtime: Decimal,
    pub overtime_owed: Decimal,
}

/// Overtime owed for one week.
///
/// At or below the threshold the projected overtime is reported as owed, even
/// though it is only a scheduling anomaly there. Above the threshold the owed
/// amount is the projected overtime not covered by paid overtime, and zero
/// when more overtime was paid than projected.
pub fn overtime_owed(totals: &WeeklyTotals, threshold: Decimal) -> Decimal {
    if totals.weekly_total_hours <= threshold {
        return totals.weekly_projected_overtime;
    }
    let diff = totals.weekly_overtime_paid - totals.weekly_projected_overtime;
    if diff > Decimal::ZERO {
        Decimal::ZERO
    } else {
        diff.abs()
    }
}

pub fn reconcile(
    weekly: &BTreeMap<WeekKey, WeeklyTotals>,
    threshold: Decimal,
) -> BTreeMap<WeekKey, WeeklyAggregate> {
    weekly
        .iter()
        .map(|(key, totals)| {
            let owed = overtime_owed(totals, threshold);
            if owed > Decimal::ZERO {
                debug!(
                    "Overtime owed: Location={}, Emp={}, WeekStart={}, Owed={}",
                    key.location, key.employee_id, key.week_start, owed
                );
            }
            (
                key.clone(),
                WeeklyAggregate {
                    key: key.clone(),
                    weekly_regular_hours: totals.weekly_regular_hours,
                    weekly_overtime_paid: totals.weekly_overtime_paid,
                    weekly_total_hours: totals.weekly_total_hours,
                    weekly_projected_overtime: totals.weekly_projected_overtime,
                    overtime_owed: owed,
                },
            )
        })
        .collect()
}
