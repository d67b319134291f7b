use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One delivery-date-change record after date normalization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    #[serde(default)]
    #[schemars(
        description = "Identifier of the record in the upstream store, kept for traceability"
    )]
    pub record_id: String,

    #[serde(default)]
    #[schemars(description = "Salesperson in charge. Empty is allowed and reported as 未設定.")]
    pub person_name: String,

    #[serde(default)]
    #[schemars(
        description = "Department display labels of the salesperson, used to resolve the office. First match wins."
    )]
    pub departments: Vec<String>,

    #[serde(default)]
    #[schemars(description = "Construction/delivery date before the change (YYYY-MM-DD)")]
    pub before_date: Option<NaiveDate>,

    #[serde(default)]
    #[schemars(description = "Construction/delivery date after the change (YYYY-MM-DD)")]
    pub after_date: Option<NaiveDate>,

    #[serde(default)]
    #[schemars(description = "Date the change was formally requested (YYYY-MM-DD)")]
    pub application_date: Option<NaiveDate>,

    #[serde(default)]
    #[schemars(description = "Free-text confirmation state, carried through unchanged")]
    pub status: String,

    #[serde(default)]
    #[schemars(
        description = "Responsibility code. Either a bare category (社内責任/外部責任/日程確定) or a detailed reason."
    )]
    pub responsibility_raw: String,

    #[serde(default)]
    #[schemars(description = "Detailed change reason, may be empty")]
    pub change_reason_raw: String,
}

/// Open-order count for one salesperson in one month, produced by an upstream batch job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BacklogSnapshotEntry {
    #[schemars(description = "Calendar year-month of the snapshot, YYYYMM")]
    pub fiscal_year_month: String,

    #[serde(default)]
    #[schemars(description = "Salesperson the open orders belong to")]
    pub person_name: String,

    #[schemars(

        description = "Number of open (not yet delivered) orders. Entries for the same person and month are summed."

    )]
    pub open_order_count: u64,
}

/// The request payload of one report computation.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    #[schemars(description = "Fiscal period (fiscal year number) to report on")]
    pub fiscal_period: i32,

    #[serde(default)]
    pub events: Vec<ChangeEvent>,

    #[serde(default)]
    #[schemars(
        description = "Backlog snapshots. Missing or empty yields zero backlog and zero rates."
    )]
    pub snapshots: Vec<BacklogSnapshotEntry>,
}

impl ReportRequest {
    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(ReportRequest)
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}
