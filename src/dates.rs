use chrono::{DateTime, Days, FixedOffset, NaiveDate};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Numeric values at or above this are epoch-millisecond timestamps (13 digits);
/// anything smaller is a spreadsheet serial day count.
pub const EPOCH_MS_THRESHOLD: f64 = 1_000_000_000_000.0;

const JST_OFFSET_SECONDS: i32 = 9 * 3600;

/// A date exactly as an upstream store hands it over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum DateValue {
    #[schemars(description = "Epoch milliseconds (13 digits) or a spreadsheet serial day count")]
    Number(f64),

    #[schemars(description = "Slash- or dash-delimited Y/M/D text, e.g. 2025/01/10 or 2025-01-10")]
    Text(String),
}

/// Which calendar day an instant falls on. Only matters for epoch timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DayBoundary {
    #[default]
    Utc,
    /// Fixed UTC+9, no DST.
    Jst,
}

impl DayBoundary {
    fn offset(self) -> Option<FixedOffset> {
        let seconds = match self {
            DayBoundary::Utc => 0,
            DayBoundary::Jst => JST_OFFSET_SECONDS,
        };
        FixedOffset::east_opt(seconds)
    }
}

pub fn parse_date(value: &DateValue) -> Option<NaiveDate> {
    parse_date_with(value, DayBoundary::Utc)
}

/// Normalizes any supported date shape, returning `None` for blanks and
/// anything that does not resolve to a real calendar day.
pub fn parse_date_with(value: &DateValue, boundary: DayBoundary) -> Option<NaiveDate> {
    match value {
        DateValue::Number(n) => parse_number(*n, boundary),
        DateValue::Text(text) => parse_text(text, boundary),
    }
}

fn parse_number(n: f64, boundary: DayBoundary) -> Option<NaiveDate> {
    if !n.is_finite() {
        return None;
    }
    if n >= EPOCH_MS_THRESHOLD {
        return from_epoch_millis(n as i64, boundary);
    }
    from_excel_serial(n)
}

fn parse_text(text: &str, boundary: DayBoundary) -> Option<NaiveDate> {
    // trim() also strips the full-width space (U+3000) used as a blank placeholder
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if text.len() == 13 && text.bytes().all(|b| b.is_ascii_digit()) {
        return from_epoch_millis(text.parse().ok()?, boundary);
    }

    let normalized = text.replace('-', "/");
    let parts: Vec<&str> = normalized.split('/').map(str::trim).collect();
    if parts.len() < 3 {
        return None;
    }

    let year: i32 = numeric_part(parts[0])?;
    let month: u32 = numeric_part(parts[1])?;
    let day: u32 = numeric_part(parts[2])?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn numeric_part<T: std::str::FromStr>(part: &str) -> Option<T> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

fn from_epoch_millis(millis: i64, boundary: DayBoundary) -> Option<NaiveDate> {
    let instant = DateTime::from_timestamp_millis(millis)?;
    Some(instant.with_timezone(&boundary.offset()?).date_naive())
}

/// Serial 1 is 1899-12-31 (base 1899-12-30), the convention spreadsheets export.
fn from_excel_serial(serial: f64) -> Option<NaiveDate> {
    let days = serial.floor();
    if days < 1.0 {
        return None;
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_days(Days::new(days as u64))
}

/// Signed whole days from `from` to `to`.
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}
