use crate::aggregator::{Aggregation, ClassifiedEvent, JudgmentTally, ResponsibilityTally};
use crate::error::{DeliveryChangeError, Result};
use crate::fiscal::MONTHS_PER_YEAR;
use crate::organization::{OrganizationDirectory, OTHER, REGION_ORDER};
use crate::snapshot::{change_rate, sum_buckets, JoinedSeries, MonthlyBuckets};
use icu_collator::{Collator, CollatorOptions};
use icu_locid::locale;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyFigure {
    pub year_month: String,
    pub change_count: u64,
    pub backlog_count: u64,
    pub change_rate: f64,
}

/// Twelve months of figures plus their totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesSummary {
    pub months: Vec<MonthlyFigure>,
    pub total_change_count: u64,
    pub total_backlog_count: u64,
    pub change_rate: f64,
}

impl SeriesSummary {
    fn from_buckets(labels: &[String; MONTHS_PER_YEAR], buckets: &MonthlyBuckets) -> Self {
        let months: Vec<MonthlyFigure> = labels
            .iter()
            .zip(buckets.iter())
            .map(|(label, bucket)| MonthlyFigure {
                year_month: label.clone(),
                change_count: bucket.change_count,
                backlog_count: bucket.backlog_count,
                change_rate: bucket.change_rate(),
            })
            .collect();

        let total_change_count = buckets.iter().map(|b| b.change_count).sum();
        let total_backlog_count = buckets.iter().map(|b| b.backlog_count).sum();

        Self {
            months,
            total_change_count,
            total_backlog_count,
            change_rate: change_rate(total_change_count, total_backlog_count),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonSummary {
    pub name: String,
    pub office: String,
    #[serde(flatten)]
    pub series: SeriesSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfficeSummary {
    pub name: String,
    pub region: String,
    #[serde(flatten)]
    pub series: SeriesSummary,
    pub persons: Vec<PersonSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionSummary {
    pub name: String,
    #[serde(flatten)]
    pub series: SeriesSummary,
    pub offices: Vec<OfficeSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsibilityItem {
    pub category: String,
    pub reason: String,
    /// Keyed by `YYYYMM`; all twelve months are present.
    pub monthly_counts: BTreeMap<String, u64>,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub fiscal_period: i32,
    pub year_months: Vec<String>,
    #[serde(flatten)]
    pub series: SeriesSummary,
    pub total_event_count: u64,
    pub counted_event_count: u64,
    pub unbucketed_event_count: u64,
    pub regions: Vec<RegionSummary>,
    pub responsibility_items: Vec<ResponsibilityItem>,
    pub judgment_tallies: Vec<JudgmentTally>,
    pub events: Vec<ClassifiedEvent>,
    pub events_truncated: bool,
}

impl Report {
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn region(&self, name: &str) -> Option<&RegionSummary> {
        self.regions.iter().find(|r| r.name == name)
    }

    pub fn office(&self, name: &str) -> Option<&OfficeSummary> {
        self.regions
            .iter()
            .flat_map(|r| r.offices.iter())
            .find(|o| o.name == name)
    }
}

pub struct ReportAssembler<'a> {
    directory: &'a OrganizationDirectory,
    labels: &'a [String; MONTHS_PER_YEAR],
    collator: Collator,
}

/// Japanese collation for salesperson names.
fn person_collator() -> Result<Collator> {
    Collator::try_new(&locale!("ja").into(), CollatorOptions::new())
        .map_err(|e| DeliveryChangeError::CollatorUnavailable(e.to_string()))
}

struct OfficeGroup<'a> {
    region: String,
    persons: Vec<(&'a str, &'a MonthlyBuckets)>,
}

impl<'a> ReportAssembler<'a> {
    pub fn new(
        directory: &'a OrganizationDirectory,
        labels: &'a [String; MONTHS_PER_YEAR],
    ) -> Result<Self> {
        Ok(Self {
            directory,
            labels,
            collator: person_collator()?,
        })
    }

    pub fn assemble(
        &self,
        period: i32,
        aggregation: Aggregation,
        joined: &JoinedSeries,
    ) -> Report {
        let regions = self.build_regions(joined);

        Report {
            fiscal_period: period,
            year_months: self.labels.to_vec(),
            series: SeriesSummary::from_buckets(self.labels, &joined.monthly),
            total_event_count: aggregation.total_events,
            counted_event_count: aggregation.counted_events,
            unbucketed_event_count: aggregation.unbucketed_events,
            regions,
            responsibility_items: aggregation
                .responsibility
                .iter()
                .map(|row| self.responsibility_item(row))
                .collect(),
            judgment_tallies: aggregation.judgments,
            events: aggregation.details,
            events_truncated: aggregation.details_truncated,
        }
    }

    fn responsibility_item(&self, row: &ResponsibilityTally) -> ResponsibilityItem {
        ResponsibilityItem {
            category: row.entry.category.clone(),
            reason: row.entry.reason.clone(),
            monthly_counts: self
                .labels
                .iter()
                .cloned()
                .zip(row.counts.iter().copied())
                .collect(),
            total: row.counts.iter().sum(),
        }
    }

    fn build_regions(&self, joined: &JoinedSeries) -> Vec<RegionSummary> {
        // Every table office is present, populated or not, so the layout is stable.
        let mut groups: BTreeMap<&str, OfficeGroup> = self
            .directory
            .offices()
            .iter()
            .map(|o| {
                (
                    o.name.as_str(),
                    OfficeGroup {
                        region: self.directory.region_of(&o.name),
                        persons: Vec::new(),
                    },
                )
            })
            .collect();

        for (name, person) in &joined.persons {
            groups
                .entry(person.office.as_str())
                .or_insert_with(|| OfficeGroup {
                    region: self.directory.region_of(&person.office),
                    persons: Vec::new(),
                })
                .persons
                .push((name.as_str(), &person.months));
        }

        let mut offices: Vec<(OfficeSummary, MonthlyBuckets)> = groups
            .into_iter()
            .map(|(office, group)| self.office_summary(office, group))
            .collect();
        offices.sort_by(|a, b| self.compare_offices(&a.0.name, &b.0.name));

        let mut region_names: Vec<String> = REGION_ORDER.iter().map(|r| r.to_string()).collect();
        let mut extra: Vec<String> = offices
            .iter()
            .map(|(o, _)| o.region.clone())
            .filter(|r| !region_names.contains(r) && r != OTHER)
            .collect();
        extra.sort();
        extra.dedup();
        region_names.extend(extra);
        region_names.push(OTHER.to_string());

        region_names
            .into_iter()
            .filter_map(|name| {
                let members: Vec<&(OfficeSummary, MonthlyBuckets)> =
                    offices.iter().filter(|(o, _)| o.region == name).collect();
                if members.is_empty() && !REGION_ORDER.contains(&name.as_str()) {
                    return None;
                }
                let buckets = sum_buckets(members.iter().map(|(_, buckets)| buckets));
                Some(RegionSummary {
                    series: SeriesSummary::from_buckets(self.labels, &buckets),
                    name,
                    offices: members.into_iter().map(|(o, _)| o.clone()).collect(),
                })
            })
            .collect()
    }

    fn office_summary(
        &self,
        office: &str,
        group: OfficeGroup,
    ) -> (OfficeSummary, MonthlyBuckets) {
        let mut persons = group.persons;
        persons.sort_by(|a, b| self.collator.compare(a.0, b.0).then_with(|| a.0.cmp(b.0)));

        let buckets = sum_buckets(persons.iter().map(|(_, months)| *months));
        let summary = OfficeSummary {
            name: office.to_string(),
            region: group.region,
            series: SeriesSummary::from_buckets(self.labels, &buckets),
            persons: persons
                .into_iter()
                .map(|(name, months)| PersonSummary {
                    name: name.to_string(),
                    office: office.to_string(),
                    series: SeriesSummary::from_buckets(self.labels, months),
                })
                .collect(),
        };
        (summary, buckets)
    }

    /// Table offices first in table order, then pseudo-offices by name.
    fn compare_offices(&self, a: &str, b: &str) -> Ordering {
        match (self.directory.display_rank(a), self.directory.display_rank(b)) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.cmp(b),
        }
    }
}

/// Exact check that persons sum to offices, offices to regions, and regions
/// to the report totals, for change and backlog counts in every month.
pub fn verify_rollups(report: &Report) -> Result<()> {
    let mut region_total = vec![(0u64, 0u64); MONTHS_PER_YEAR];

    for region in &report.regions {
        let mut office_total = vec![(0u64, 0u64); MONTHS_PER_YEAR];
        for office in &region.offices {
            let mut person_total = vec![(0u64, 0u64); MONTHS_PER_YEAR];
            for person in &office.persons {
                accumulate(&mut person_total, &person.series);
            }
            check_series("office", &office.name, &office.series, &person_total)?;
            accumulate(&mut office_total, &office.series);
        }
        check_series("region", &region.name, &region.series, &office_total)?;
        accumulate(&mut region_total, &region.series);
    }

    check_series(
        "report",
        &report.fiscal_period.to_string(),
        &report.series,
        &region_total,
    )
}

fn accumulate(acc: &mut [(u64, u64)], series: &SeriesSummary) {
    for (slot, month) in acc.iter_mut().zip(series.months.iter()) {
        slot.0 += month.change_count;
        slot.1 += month.backlog_count;
    }
}

fn check_series(
    level: &str,
    name: &str,
    series: &SeriesSummary,
    parts: &[(u64, u64)],
) -> Result<()> {
    let mismatch = |measure: &str, expected: u64, actual: u64| {
        DeliveryChangeError::RollupMismatch {
            level: level.to_string(),
            name: name.to_string(),
            measure: measure.to_string(),
            expected,
            actual,
        }
    };

    for (month, &(changes, backlog)) in series.months.iter().zip(parts.iter()) {
        if month.change_count != changes {
            return Err(mismatch(
                &format!("change_count {}", month.year_month),
                changes,
                month.change_count,
            ));
        }
        if month.backlog_count != backlog {
            return Err(mismatch(
                &format!("backlog_count {}", month.year_month),
                backlog,
                month.backlog_count,
            ));
        }
    }

    let changes: u64 = parts.iter().map(|p| p.0).sum();
    if series.total_change_count != changes {
        return Err(mismatch("total_change_count", changes, series.total_change_count));
    }
    let backlog: u64 = parts.iter().map(|p| p.1).sum();
    if series.total_backlog_count != backlog {
        return Err(mismatch("total_backlog_count", backlog, series.total_backlog_count));
    }
    Ok(())
}
