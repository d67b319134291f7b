use crate::error::{DeliveryChangeError, Result};
use crate::organization::OrganizationDirectory;
use crate::responsibility::ResponsibilityTaxonomy;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_FISCAL_START_MONTH: u32 = 8;
pub const DEFAULT_FISCAL_YEAR_OFFSET: i32 = 1972;
pub const DEFAULT_MATERIALITY_DAYS: i64 = 7;
pub const DEFAULT_LEAD_TIME_DAYS: i64 = 30;
pub const DEFAULT_MAGNITUDE_DAYS: i64 = 7;
pub const DEFAULT_MAX_DETAIL_EVENTS: usize = 500;
pub const DEFAULT_HEAD_OFFICE_PERSON: &str = "山本 健一";

/// Tunables for a report run. Every field has a default, so an empty JSON
/// object is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Calendar month that opens the fiscal year (1 = January is rejected).
    pub fiscal_start_month: u32,

    /// Fiscal period = calendar year of the opening month minus this offset.
    pub fiscal_year_offset: i32,

    /// A change counts only when |after - before| is strictly greater than this.
    pub materiality_days: i64,

    /// Judgment 1 holds when before - application is at most this many days.
    pub lead_time_days: i64,

    /// Judgment 2 requires |after - before| of at least this many days.
    pub magnitude_days: i64,

    /// Upper bound on the drill-down event list carried in a report.
    pub max_detail_events: usize,

    /// This person always resolves to the head office. Takes precedence over
    /// the value inside `directory`.
    pub head_office_person: String,

    /// Office table and roster used for placement.
    pub directory: OrganizationDirectory,

    /// Responsibility table seeding the cross-tab rows.
    pub taxonomy: ResponsibilityTaxonomy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fiscal_start_month: DEFAULT_FISCAL_START_MONTH,
            fiscal_year_offset: DEFAULT_FISCAL_YEAR_OFFSET,
            materiality_days: DEFAULT_MATERIALITY_DAYS,
            lead_time_days: DEFAULT_LEAD_TIME_DAYS,
            magnitude_days: DEFAULT_MAGNITUDE_DAYS,
            max_detail_events: DEFAULT_MAX_DETAIL_EVENTS,
            head_office_person: DEFAULT_HEAD_OFFICE_PERSON.to_string(),
            directory: OrganizationDirectory::default(),
            taxonomy: ResponsibilityTaxonomy::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        validate_fiscal_start_month(self.fiscal_start_month)?;

        if self.directory.offices().is_empty() {
            return Err(DeliveryChangeError::InvalidDirectory(
                "office table is empty".to_string(),
            ));
        }

        for (name, value) in [
            ("materiality_days", self.materiality_days),
            ("lead_time_days", self.lead_time_days),
            ("magnitude_days", self.magnitude_days),
        ] {
            if value < 0 {
                return Err(DeliveryChangeError::InvalidThreshold(format!(
                    "{} must be non-negative, got {}",
                    name, value
                )));
            }
        }

        Ok(())
    }
}

pub fn validate_fiscal_start_month(month: u32) -> Result<()> {
    if !(2..=12).contains(&month) {
        return Err(DeliveryChangeError::InvalidFiscalStartMonth(month));
    }
    Ok(())
}
