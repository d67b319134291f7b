//! Joins backlog snapshots onto the folded change counts. Backlog is only
//! joined at month and person level; offices and regions are built later by
//! summing persons.

use crate::aggregator::Aggregation;
use crate::fiscal::{FiscalCalendar, MONTHS_PER_YEAR};
use crate::organization::{OrganizationDirectory, UNASSIGNED};
use crate::schema::BacklogSnapshotEntry;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyBucket {
    pub change_count: u64,
    pub backlog_count: u64,
}

impl MonthlyBucket {
    pub fn change_rate(&self) -> f64 {
        change_rate(self.change_count, self.backlog_count)
    }

    pub fn add(&mut self, other: &MonthlyBucket) {
        self.change_count += other.change_count;
        self.backlog_count += other.backlog_count;
    }
}

pub type MonthlyBuckets = [MonthlyBucket; MONTHS_PER_YEAR];

/// `changes / backlog`, or 0 when there is no backlog.
pub fn change_rate(changes: u64, backlog: u64) -> f64 {
    if backlog > 0 {
        changes as f64 / backlog as f64
    } else {
        0.0
    }
}

pub fn sum_buckets<'a>(series: impl IntoIterator<Item = &'a MonthlyBuckets>) -> MonthlyBuckets {
    let mut total = [MonthlyBucket::default(); MONTHS_PER_YEAR];
    for buckets in series {
        for (acc, bucket) in total.iter_mut().zip(buckets.iter()) {
            acc.add(bucket);
        }
    }
    total
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinedPerson {
    pub office: String,
    pub region: String,
    pub months: MonthlyBuckets,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinedSeries {
    pub monthly: MonthlyBuckets,
    pub persons: BTreeMap<String, JoinedPerson>,
}

pub struct SnapshotJoiner<'a> {
    calendar: &'a FiscalCalendar,
    directory: &'a OrganizationDirectory,
    period: i32,
}

impl<'a> SnapshotJoiner<'a> {
    pub fn new(
        calendar: &'a FiscalCalendar,
        directory: &'a OrganizationDirectory,
        period: i32,
    ) -> Self {
        Self {
            calendar,
            directory,
            period,
        }
    }

    pub fn join(
        &self,
        aggregation: &Aggregation,
        snapshots: &[BacklogSnapshotEntry],
    ) -> JoinedSeries {
        let mut monthly = [MonthlyBucket::default(); MONTHS_PER_YEAR];
        for (bucket, &changes) in monthly.iter_mut().zip(aggregation.monthly_changes.iter()) {
            bucket.change_count = changes;
        }

        let mut persons: BTreeMap<String, JoinedPerson> = aggregation
            .persons
            .iter()
            .map(|(name, tally)| {
                let mut months = [MonthlyBucket::default(); MONTHS_PER_YEAR];
                for (bucket, &changes) in months.iter_mut().zip(tally.change_counts.iter()) {
                    bucket.change_count = changes;
                }
                (
                    name.clone(),
                    JoinedPerson {
                        office: tally.office.clone(),
                        region: tally.region.clone(),
                        months,
                    },
                )
            })
            .collect();

        let mut skipped = 0usize;
        for entry in snapshots {
            let Some(slot) = self
                .calendar
                .slot_of_label(&entry.fiscal_year_month, self.period)
            else {
                skipped += 1;
                continue;
            };

            monthly[slot].backlog_count += entry.open_order_count;

            let name = match entry.person_name.trim() {
                "" => UNASSIGNED,
                name => name,
            };
            let person = persons.entry(name.to_string()).or_insert_with(|| {
                // No counted change: reuse the placement from any other event, else the roster.
                let placement = aggregation
                    .placements
                    .get(name)
                    .cloned()
                    .unwrap_or_else(|| self.directory.resolve(name, &[]));
                JoinedPerson {
                    office: placement.office,
                    region: placement.region,
                    months: [MonthlyBucket::default(); MONTHS_PER_YEAR],
                }
            });
            person.months[slot].backlog_count += entry.open_order_count;
        }

        if skipped > 0 {
            debug!(
                "Ignored {} snapshot entries outside fiscal period {}",
                skipped, self.period
            );
        }

        JoinedSeries { monthly, persons }
    }
}
