//! Conversion from the loosely-typed records an upstream store yields into
//! the engine's input types. Nothing here fails: malformed fields degrade to
//! absent values.

use crate::dates::{parse_date_with, DateValue, DayBoundary};
use crate::schema::{BacklogSnapshotEntry, ChangeEvent};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawChangeRecord {
    pub record_id: Option<String>,
    pub person_name: Option<String>,
    pub departments: Vec<String>,
    pub before_date: Option<DateValue>,
    pub after_date: Option<DateValue>,
    pub application_date: Option<DateValue>,
    pub status: Option<String>,
    pub responsibility: Option<String>,
    pub change_reason: Option<String>,
}

impl RawChangeRecord {
    pub fn into_event(self) -> ChangeEvent {
        ChangeEvent {
            record_id: trimmed(self.record_id),
            person_name: trimmed(self.person_name),
            departments: self
                .departments
                .into_iter()
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty())
                .collect(),
            before_date: self
                .before_date
                .as_ref()
                .and_then(|v| parse_date_with(v, DayBoundary::Utc)),
            after_date: self
                .after_date
                .as_ref()
                .and_then(|v| parse_date_with(v, DayBoundary::Utc)),
            // Application dates arrive as creation timestamps; the business day is JST.
            application_date: self
                .application_date
                .as_ref()
                .and_then(|v| parse_date_with(v, DayBoundary::Jst)),
            status: trimmed(self.status),
            responsibility_raw: trimmed(self.responsibility),
            change_reason_raw: trimmed(self.change_reason),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawSnapshotRecord {
    pub fiscal_year_month: Option<String>,
    pub person_name: Option<String>,
    /// Number or numeric text.
    pub open_order_count: Option<Value>,
}

impl RawSnapshotRecord {
    /// Returns `None` when the record has no month to attach to.
    pub fn into_entry(self) -> Option<BacklogSnapshotEntry> {
        let fiscal_year_month = trimmed(self.fiscal_year_month);
        if fiscal_year_month.is_empty() {
            return None;
        }

        Some(BacklogSnapshotEntry {
            fiscal_year_month,
            person_name: trimmed(self.person_name),
            open_order_count: self.open_order_count.as_ref().map_or(0, count_value),
        })
    }
}

pub fn convert_change_records(records: Vec<RawChangeRecord>) -> Vec<ChangeEvent> {
    records.into_iter().map(RawChangeRecord::into_event).collect()
}

pub fn convert_snapshot_records(records: Vec<RawSnapshotRecord>) -> Vec<BacklogSnapshotEntry> {
    let total = records.len();
    let entries: Vec<BacklogSnapshotEntry> = records
        .into_iter()
        .filter_map(RawSnapshotRecord::into_entry)
        .collect();

    if entries.len() < total {
        debug!(
            "Skipped {} snapshot records without a year-month",
            total - entries.len()
        );
    }
    entries
}

fn trimmed(value: Option<String>) -> String {
    value.map(|s| s.trim().to_string()).unwrap_or_default()
}

fn count_value(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn test_mixed_date_shapes() {
        let record: RawChangeRecord = serde_json::from_value(json!({
            "recordId": " 101 ",
            "personName": "佐藤 花子",
            "departments": ["東京営業所", "  "],
            "beforeDate": "2025/01/10",
            "afterDate": 45682,
            "applicationDate": 1734620400000u64,
            "responsibility": "施主都合",
        }))
        .unwrap();

        let event = record.into_event();
        assert_eq!(event.record_id, "101");
        assert_eq!(event.departments, vec!["東京営業所".to_string()]);
        assert_eq!(event.before_date, NaiveDate::from_ymd_opt(2025, 1, 10));
        assert_eq!(event.after_date, NaiveDate::from_ymd_opt(2025, 1, 25));
        // 2024-12-19T15:00:00Z is 2024-12-20 00:00 JST
        assert_eq!(event.application_date, NaiveDate::from_ymd_opt(2024, 12, 20));
        assert_eq!(event.change_reason_raw, "");
    }

    #[test]
    fn test_blank_fields_become_absent() {
        let record: RawChangeRecord = serde_json::from_value(json!({
            "beforeDate": "\u{3000}",
            "afterDate": "",
        }))
        .unwrap();

        let event = record.into_event();
        assert_eq!(event.before_date, None);
        assert_eq!(event.after_date, None);
        assert_eq!(event.application_date, None);
        assert_eq!(event.person_name, "");
    }

    #[test]
    fn test_snapshot_counts() {
        let records: Vec<RawSnapshotRecord> = serde_json::from_value(json!([
            { "fiscalYearMonth": "202501", "personName": "A", "openOrderCount": 12 },
            { "fiscalYearMonth": "202501", "personName": "B", "openOrderCount": "7" },
            { "fiscalYearMonth": "202501", "personName": "C", "openOrderCount": "n/a" },
            { "personName": "D", "openOrderCount": 3 },
        ]))
        .unwrap();

        let entries = convert_snapshot_records(records);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].open_order_count, 12);
        assert_eq!(entries[1].open_order_count, 7);
        assert_eq!(entries[2].open_order_count, 0);
    }
}
