// src/timecard.rs
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rust_decimal::Decimal;

// --- Pay Codes ---

pub const PAY_CODE_REGULAR: &str = "regular";
pub const PAY_CODE_OVERTIME: &str = "overtime";

/// Lowercases and trims a raw pay code so comparisons are exact.
pub fn normalize_pay_code(raw: &str) -> String {
    raw.trim().to_lowercase()
}

// --- Core Data Structures ---

pub type EmployeeId = String;
pub type LocationId = String;

/// One raw row of the timecard export after type coercion.
///
/// `date`, `hours` and `scheduled_regular_hours` stay `None` when the source
/// value could not be parsed. Aggregation decides what a missing value means.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TimecardEntry {
    pub date: Option<NaiveDate>,
    pub employee_id: EmployeeId,
    pub hours: Option<Decimal>,
    pub pay_code: String,
    pub location: LocationId,
    pub scheduled_regular_hours: Option<Decimal>,
}

impl TimecardEntry {
    pub fn is_regular(&self) -> bool {
        self.pay_code == PAY_CODE_REGULAR
    }

    pub fn is_overtime(&self) -> bool {
        self.pay_code == PAY_CODE_OVERTIME
    }

    /// Hours contribution to a sum; missing hours count as zero.
    pub fn hours_or_zero(&self) -> Decimal {
        self.hours.unwrap_or(Decimal::ZERO)
    }

    /// Employee and location both non-blank.
    pub fn has_identity(&self) -> bool {
        !self.employee_id.is_empty() && !self.location.is_empty()
    }
}

/// Compound identity of one employee-week. Field order gives the report sort
/// order: location, employee, week start.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WeekKey {
    pub location: LocationId,
    pub employee_id: EmployeeId,
    pub week_start: NaiveDate,
}

// --- Week Mapping ---

/// Billing week convention, identified by the weekday the week ends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekEnding(pub Weekday);

impl Default for WeekEnding {
    fn default() -> Self {
        WeekEnding(Weekday::Sat)
    }
}

impl WeekEnding {
    pub fn first_day(&self) -> Weekday {
        self.0.succ()
    }

    /// Start of the week containing `date`. Depends on the date only.
    pub fn week_start(&self, date: NaiveDate) -> NaiveDate {
        let offset = (date.weekday().num_days_from_monday() + 7
            - self.first_day().num_days_from_monday())
            % 7;
        date - Duration::days(offset as i64)
    }
}

/// Report columns run Sunday through Saturday whatever the billing week is.
pub const REPORT_WEEKDAYS: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Sun => "Sunday",
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
    }
}

/// Parses a weekday given as a full name or the usual abbreviations.
pub fn parse_weekday(raw: &str) -> Option<Weekday> {
    raw.trim().parse::<Weekday>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(date_str: &str) -> NaiveDate {
        NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
            .unwrap_or_else(|_| panic!("Invalid date string format: {}", date_str))
    }

    #[test]
    fn test_saturday_ending_week_starts_on_preceding_sunday() {
        let weeks = WeekEnding::default();
        // 2024-03-10 is a Sunday, 2024-03-16 a Saturday.
        for day in 10..=16 {
            let date = NaiveDate::from_ymd_opt(2024, 3, day).unwrap();
            assert_eq!(weeks.week_start(date), d("2024-03-10"), "date {}", date);
        }
        assert_eq!(weeks.week_start(d("2024-03-17")), d("2024-03-17"));
        assert_eq!(weeks.week_start(d("2024-03-09")), d("2024-03-03"));
    }

    #[test]
    fn test_week_start_crosses_year_boundary() {
        let weeks = WeekEnding::default();
        // 2025-01-01 is a Wednesday.
        assert_eq!(weeks.week_start(d("2025-01-01")), d("2024-12-29"));
    }

    #[test]
    fn test_friday_ending_week_starts_on_saturday() {
        let weeks = WeekEnding(Weekday::Fri);
        assert_eq!(weeks.first_day(), Weekday::Sat);
        assert_eq!(weeks.week_start(d("2024-03-15")), d("2024-03-09"));
        assert_eq!(weeks.week_start(d("2024-03-16")), d("2024-03-16"));
    }

    #[test]
    fn test_pay_code_normalization_and_matching() {
        assert_eq!(normalize_pay_code("  Regular "), "regular");
        assert_eq!(normalize_pay_code("OVERTIME"), "overtime");

        let entry = TimecardEntry {
            pay_code: normalize_pay_code(" OverTime\t"),
            ..Default::default()
        };
        assert!(entry.is_overtime());
        assert!(!entry.is_regular());

        let other = TimecardEntry {
            pay_code: normalize_pay_code("regular pay"),
            ..Default::default()
        };
        assert!(!other.is_regular());
    }

    #[test]
    fn test_parse_weekday_accepts_short_and_long_names() {
        assert_eq!(parse_weekday("Sat"), Some(Weekday::Sat));
        assert_eq!(parse_weekday(" friday "), Some(Weekday::Fri));
        assert_eq!(parse_weekday("someday"), None);
    }
}
