//! # Delivery Change Rate
//!
//! Turns raw delivery-date-change records and monthly backlog snapshots into a
//! fiscal-year report of delay-change rates across a sales organization.
//!
//! ## Core Concepts
//!
//! - **Counted event**: a change whose date shift exceeds the materiality threshold (7 days)
//! - **Judgment 1 / 2**: lead-time and magnitude flags, tallied per responsibility category
//! - **Backlog**: open-order counts per salesperson and month, supplied by an upstream batch job
//! - **Rate**: counted changes / backlog, 0 when there is no backlog
//! - **Hierarchy**: salesperson → office → region; offices and regions are sums of persons
//!
//! ## Example
//!
//! ```rust
//! use delivery_change_rate::*;
//! use chrono::NaiveDate;
//!
//! let events = vec![ChangeEvent {
//!     record_id: "1001".to_string(),
//!     person_name: "佐藤 花子".to_string(),
//!     departments: vec!["東京営業所".to_string()],
//!     before_date: NaiveDate::from_ymd_opt(2025, 1, 10),
//!     after_date: NaiveDate::from_ymd_opt(2025, 1, 25),
//!     application_date: NaiveDate::from_ymd_opt(2024, 12, 20),
//!     responsibility_raw: "施主都合".to_string(),
//!     ..Default::default()
//! }];
//! let snapshots = vec![BacklogSnapshotEntry {
//!     fiscal_year_month: "202412".to_string(),
//!     person_name: "佐藤 花子".to_string(),
//!     open_order_count: 20,
//! }];
//!
//! let report = compute_report(52, &events, &snapshots).unwrap();
//! assert_eq!(report.series.total_change_count, 1);
//! assert_eq!(report.series.months[4].backlog_count, 20);
//! ```

pub mod aggregator;
pub mod config;
pub mod dates;
pub mod engine;
pub mod error;
pub mod fiscal;
pub mod ingestion;
pub mod judgment;
pub mod organization;
pub mod report;
pub mod responsibility;
pub mod schema;
pub mod snapshot;
pub mod source;

pub use aggregator::{ClassifiedEvent, JudgmentTally};
pub use config::EngineConfig;
pub use dates::{parse_date, parse_date_with, DateValue, DayBoundary};
pub use engine::{compute_report, ReportEngine};
pub use error::{DeliveryChangeError, Result};
pub use fiscal::FiscalCalendar;
pub use ingestion::*;
pub use judgment::{Judgment, JudgmentRules};
pub use organization::{OrganizationDirectory, Placement};
pub use report::{
    verify_rollups, MonthlyFigure, OfficeSummary, PersonSummary, RegionSummary, Report,
    ResponsibilityItem, SeriesSummary,
};
pub use responsibility::{Classification, ResponsibilityTaxonomy};
pub use schema::*;
pub use snapshot::{change_rate, MonthlyBucket};
pub use source::{fetch_and_compute, EventSource, SnapshotSource, StaticSource};

use log::{debug, info};

pub struct ChangeRateProcessor;

impl ChangeRateProcessor {
    pub fn process(config: &EngineConfig, request: &ReportRequest) -> Result<Report> {
        info!(
            "Processing delivery change report request for period {}",
            request.fiscal_period
        );
        debug!(
            "Request contains {} events and {} snapshot entries",
            request.events.len(),
            request.snapshots.len()
        );

        let engine = ReportEngine::new(config.clone())?;
        engine.compute(request.fiscal_period, &request.events, &request.snapshots)
    }

    pub fn process_with_verification(
        config: &EngineConfig,
        request: &ReportRequest,
    ) -> Result<Report> {
        let report = Self::process(config, request)?;

        verify_rollups(&report)?;

        Ok(report)
    }
}

pub fn process_request(request: &ReportRequest) -> Result<Report> {
    ChangeRateProcessor::process(&EngineConfig::default(), request)
}

pub fn process_with_verification(request: &ReportRequest) -> Result<Report> {
    ChangeRateProcessor::process_with_verification(&EngineConfig::default(), request)
}
