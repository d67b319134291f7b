use crate::aggregator::{Aggregator, ClassifiedEvent};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::fiscal::{year_month_label, FiscalCalendar};
use crate::judgment::JudgmentRules;
use crate::organization::{OrganizationDirectory, UNASSIGNED};
use crate::report::{Report, ReportAssembler};
use crate::responsibility::ResponsibilityTaxonomy;
use crate::schema::{BacklogSnapshotEntry, ChangeEvent};
use crate::snapshot::SnapshotJoiner;
use log::{debug, info, warn};

/// Pure, synchronous report computation. Holds only read-only tables; every
/// call to [`ReportEngine::compute`] builds fresh accumulators.
#[derive(Debug, Clone)]
pub struct ReportEngine {
    config: EngineConfig,
    calendar: FiscalCalendar,
    rules: JudgmentRules,
    directory: OrganizationDirectory,
    taxonomy: ResponsibilityTaxonomy,
}

impl ReportEngine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let calendar = FiscalCalendar::new(config.fiscal_start_month, config.fiscal_year_offset)?;
        let directory = config
            .directory
            .clone()
            .with_head_office_person(config.head_office_person.clone());

        Ok(Self {
            rules: JudgmentRules::from_config(&config),
            calendar,
            directory,
            taxonomy: config.taxonomy.clone(),
            config,
        })
    }

    pub fn with_directory(mut self, directory: OrganizationDirectory) -> Self {
        self.directory = directory;
        self
    }

    pub fn with_taxonomy(mut self, taxonomy: ResponsibilityTaxonomy) -> Self {
        self.taxonomy = taxonomy;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn calendar(&self) -> &FiscalCalendar {
        &self.calendar
    }

    /// Places, classifies and judges one event. `period` decides whether the
    /// application month lands in a report bucket.
    pub fn classify(&self, event: &ChangeEvent, period: i32) -> ClassifiedEvent {
        let person = event.person_name.trim();
        let placement = self.directory.resolve(person, &event.departments);
        let classification = self
            .taxonomy
            .classify(&event.responsibility_raw, &event.change_reason_raw);
        let judgment = self.rules.evaluate(event);

        let mut event = event.clone();
        event.person_name = match person {
            "" => UNASSIGNED.to_string(),
            name => name.to_string(),
        };

        ClassifiedEvent {
            office: placement.office,
            region: placement.region,
            days_diff: judgment.days_diff,
            is_counted: judgment.is_counted,
            responsibility_category: classification.category,
            change_reason: classification.reason,
            judgment1: judgment.judgment1,
            judgment2: judgment.judgment2,
            application_fiscal_month: event.application_date.map(year_month_label),
            period_slot: event
                .application_date
                .and_then(|date| self.calendar.slot_in_period(date, period)),
            event,
        }
    }

    pub fn compute(
        &self,
        period: i32,
        events: &[ChangeEvent],
        snapshots: &[BacklogSnapshotEntry],
    ) -> Result<Report> {
        let labels = self.calendar.fiscal_year_months(period)?;
        info!(
            "Computing delivery change report for period {} ({} events, {} snapshot entries)",
            period,
            events.len(),
            snapshots.len()
        );

        let mut aggregator = Aggregator::new(&self.taxonomy, self.config.max_detail_events);
        for event in events {
            aggregator.fold(self.classify(event, period));
        }
        let aggregation = aggregator.finish();

        debug!(
            "Folded {} events: {} counted, {} counted but outside the period buckets",
            aggregation.total_events, aggregation.counted_events, aggregation.unbucketed_events
        );
        if aggregation.details_truncated {
            warn!(
                "Event detail list truncated to {} entries",
                self.config.max_detail_events
            );
        }

        let joined = SnapshotJoiner::new(&self.calendar, &self.directory, period)
            .join(&aggregation, snapshots);
        let report = ReportAssembler::new(&self.directory, &labels)?
            .assemble(period, aggregation, &joined);

        info!(
            "Period {}: {} counted changes over {} backlog ({:.4})",
            period,
            report.series.total_change_count,
            report.series.total_backlog_count,
            report.series.change_rate
        );
        Ok(report)
    }
}

/// Computes a report with the default configuration and tables.
pub fn compute_report(
    fiscal_period: i32,
    events: &[ChangeEvent],
    snapshots: &[BacklogSnapshotEntry],
) -> Result<Report> {
    ReportEngine::new(EngineConfig::default())?.compute(fiscal_period, events, snapshots)
}
