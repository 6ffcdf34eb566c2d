// src/timecard_loader.rs
use calamine::{open_workbook_auto, Data, Reader};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::{fs::File, io::Read, path::Path, str::FromStr};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::timecard::{normalize_pay_code, TimecardEntry};

// --- Error Types ---

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to open timecard file {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV read error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Timecard file is empty or has no header row")]
    MissingHeader,
    #[error("Unexpected timecard columns. Expected {expected:?}, found {found:?}")]
    InvalidHeader {
        expected: Vec<String>,
        found: Vec<String>,
    },
    #[error("Failed to read workbook {path}: {source}")]
    Workbook {
        path: String,
        #[source]
        source: calamine::Error,
    },
}

// --- Constants ---

/// Required leading columns of the timecard export, in order.
pub const EXPECTED_COLUMNS: [&str; 6] = [
    "Date",
    "EmpID",
    "Hours",
    "Pay Code",
    "Location",
    "Regular Hours",
];

const COL_DATE: usize = 0;
const COL_EMP_ID: usize = 1;
const COL_HOURS: usize = 2;
const COL_PAY_CODE: usize = 3;
const COL_LOCATION: usize = 4;
const COL_REGULAR_HOURS: usize = 5;

/// Day zero of spreadsheet serial dates.
const SERIAL_DATE_EPOCH: (i32, u32, u32) = (1899, 12, 30);
/// Serial values beyond this many days are treated as garbage.
const SERIAL_DATE_MAX_DAYS: f64 = 2_958_465.0; // 9999-12-31
/// Largest magnitude accepted for a single hours cell. Keeps every sum well
/// inside `Decimal` range.
const MAX_CELL_HOURS: Decimal = dec!(1000000000);

// Two-digit year formats come first so "%Y" does not swallow "03/14/24" as year 24.
const DATE_FORMATS: [&str; 10] = [
    "%Y-%m-%d",
    "%m/%d/%y",
    "%m/%d/%Y",
    "%Y/%m/%d",
    "%m-%d-%Y",
    "%d-%b-%Y",
    "%d %b %Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%d.%m.%Y",
];

const DATETIME_FORMATS: [&str; 8] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%y %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
];

// --- Value Coercion ---

/// How the Date column is encoded. Decided once for the whole column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateColumnKind {
    Serial,
    Text,
}

impl DateColumnKind {
    /// Serial when every non-blank value is numeric, text otherwise.
    pub fn detect<'a>(values: impl IntoIterator<Item = &'a str>) -> Self {
        let mut saw_value = false;
        for value in values {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            saw_value = true;
            if value.parse::<f64>().is_err() {
                return DateColumnKind::Text;
            }
        }
        if saw_value {
            DateColumnKind::Serial
        } else {
            DateColumnKind::Text
        }
    }

    pub fn parse(&self, raw: &str) -> Option<NaiveDate> {
        match self {
            DateColumnKind::Serial => raw.trim().parse::<f64>().ok().and_then(parse_serial_date),
            DateColumnKind::Text => parse_text_date(raw),
        }
    }
}

/// Whole days since 1899-12-30; the fractional time of day is dropped.
pub fn parse_serial_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial.abs() > SERIAL_DATE_MAX_DAYS {
        return None;
    }
    let (year, month, day) = SERIAL_DATE_EPOCH;
    let epoch = NaiveDate::from_ymd_opt(year, month, day)?;
    epoch.checked_add_signed(Duration::days(serial.floor() as i64))
}

pub fn parse_text_date(raw: &str) -> Option<NaiveDate> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

/// Numeric cell to decimal; blank, non-numeric or absurdly large cells are missing.
pub fn parse_hours(raw: &str) -> Option<Decimal> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }
    let hours = Decimal::from_str(value)
        .or_else(|_| Decimal::from_scientific(value))
        .ok()?;
    if hours.abs() > MAX_CELL_HOURS {
        warn!("Hours value '{}' is out of range, treating it as missing", value);
        return None;
    }
    Some(hours)
}

// --- Loading ---

/// Input encodings the loader understands, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Delimited,
    Workbook,
}

impl InputFormat {
    pub fn from_path(path: &Path) -> Self {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());
        match extension.as_deref() {
            Some("xlsx" | "xlsm" | "xlsb" | "xls" | "ods") => InputFormat::Workbook,
            _ => InputFormat::Delimited,
        }
    }
}

struct RawRow {
    line: u64,
    fields: [String; 6],
}

impl RawRow {
    /// Cells past the end of a short row are blank, i.e. missing.
    fn from_cells<'a>(line: u64, cells: impl IntoIterator<Item = &'a str>) -> (Self, bool) {
        let mut cells = cells.into_iter();
        let mut padded = false;
        let fields: [String; 6] = std::array::from_fn(|_| match cells.next() {
            Some(cell) => cell.to_string(),
            None => {
                padded = true;
                String::new()
            }
        });
        (RawRow { line, fields }, padded)
    }
}

fn validate_header(headers: &[String]) -> Result<(), LoadError> {
    let found: Vec<String> = headers.iter().map(|h| h.trim().to_string()).collect();
    let matches = found.len() >= EXPECTED_COLUMNS.len()
        && EXPECTED_COLUMNS
            .iter()
            .zip(found.iter())
            .all(|(expected, actual)| expected == actual);
    if !matches {
        return Err(LoadError::InvalidHeader {
            expected: EXPECTED_COLUMNS.iter().map(|c| c.to_string()).collect(),
            found,
        });
    }
    if found.len() > EXPECTED_COLUMNS.len() {
        warn!(
            "Ignoring {} extra timecard column(s): {:?}",
            found.len() - EXPECTED_COLUMNS.len(),
            &found[EXPECTED_COLUMNS.len()..]
        );
    }
    Ok(())
}

/// Reads a delimited timecard table. Fails on a bad header; short rows and
/// unparseable values become missing instead.
pub fn read_timecards<R: Read>(reader: R, delimiter: u8) -> Result<Vec<TimecardEntry>, LoadError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader.headers()?.iter().map(str::to_string).collect();
    if headers.is_empty() {
        return Err(LoadError::MissingHeader);
    }
    validate_header(&headers)?;

    let mut rows = Vec::new();
    let mut short_rows = 0usize;
    for record in csv_reader.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let (row, padded) = RawRow::from_cells(line, record.iter());
        if padded {
            short_rows += 1;
            debug!("Line {}: only {} field(s), rest treated as missing", line, record.len());
        }
        rows.push(row);
    }
    if short_rows > 0 {
        warn!("{} short timecard row(s) padded with missing values", short_rows);
    }

    Ok(entries_from_rows(rows))
}

// --- Workbook Input ---

/// Text form of a workbook cell. Date and number cells become their serial
/// value so a native date column takes the serial path.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(text) | Data::DateTimeIso(text) | Data::DurationIso(text) => text.clone(),
        Data::Float(value) => value.to_string(),
        Data::Int(value) => value.to_string(),
        Data::Bool(value) => value.to_string(),
        Data::DateTime(value) => value.as_f64().to_string(),
    }
}

/// Reads the first worksheet of a spreadsheet workbook.
pub fn read_workbook(path: &Path) -> Result<Vec<TimecardEntry>, LoadError> {
    let workbook_error = |source: calamine::Error| LoadError::Workbook {
        path: path.display().to_string(),
        source,
    };
    let mut workbook = open_workbook_auto(path).map_err(workbook_error)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(LoadError::MissingHeader)?
        .map_err(workbook_error)?;

    let first_line = range.start().map(|(row, _)| u64::from(row) + 1).unwrap_or(1);
    let mut sheet_rows = range.rows();
    let headers: Vec<String> = match sheet_rows.next() {
        Some(cells) => cells.iter().map(cell_text).collect(),
        None => return Err(LoadError::MissingHeader),
    };
    validate_header(&headers)?;

    let rows: Vec<RawRow> = sheet_rows
        .enumerate()
        .map(|(index, cells)| {
            let texts: Vec<String> = cells.iter().map(cell_text).collect();
            let line = first_line + 1 + index as u64;
            RawRow::from_cells(line, texts.iter().map(String::as_str)).0
        })
        .collect();
    debug!("Read {} data rows from workbook {}", rows.len(), path.display());

    Ok(entries_from_rows(rows))
}

fn entries_from_rows(rows: Vec<RawRow>) -> Vec<TimecardEntry> {
    let date_kind = DateColumnKind::detect(rows.iter().map(|r| r.fields[COL_DATE].as_str()));
    debug!("Date column detected as {:?}", date_kind);

    let mut missing_dates = 0usize;
    let mut missing_hours = 0usize;
    let entries: Vec<TimecardEntry> = rows
        .into_iter()
        .map(|row| {
            let field = |col: usize| row.fields[col].as_str();
            let entry = TimecardEntry {
                date: date_kind.parse(field(COL_DATE)),
                employee_id: field(COL_EMP_ID).trim().to_string(),
                hours: parse_hours(field(COL_HOURS)),
                pay_code: normalize_pay_code(field(COL_PAY_CODE)),
                location: field(COL_LOCATION).trim().to_string(),
                scheduled_regular_hours: parse_hours(field(COL_REGULAR_HOURS)),
            };
            if entry.date.is_none() {
                missing_dates += 1;
                debug!("Line {}: unparseable date '{}'", row.line, field(COL_DATE));
            }
            if entry.hours.is_none() {
                missing_hours += 1;
                debug!("Line {}: unparseable hours '{}'", row.line, field(COL_HOURS));
            }
            entry
        })
        .collect();

    info!(
        "Loaded {} timecard rows ({} with missing date, {} with missing hours)",
        entries.len(),
        missing_dates,
        missing_hours
    );
    entries
}

/// Loads a timecard export, as a workbook or a delimited file depending on
/// the extension. `delimiter` only applies to delimited input.
pub fn load_timecards(path: &Path, delimiter: u8) -> Result<Vec<TimecardEntry>, LoadError> {
    let format = InputFormat::from_path(path);
    info!("Loading timecards from {} ({:?})", path.display(), format);
    match format {
        InputFormat::Workbook => read_workbook(path),
        InputFormat::Delimited => {
            let file = File::open(path).map_err(|source| LoadError::Open {
                path: path.display().to_string(),
                source,
            })?;
            read_timecards(file, delimiter)
        }
    }
}
