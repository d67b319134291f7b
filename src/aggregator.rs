use crate::fiscal::MONTHS_PER_YEAR;
use crate::judgment::Judgment;
use crate::organization::{Placement, UNASSIGNED};
use crate::responsibility::{ResponsibilityTaxonomy, TaxonomyEntry};
use crate::schema::ChangeEvent;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub type MonthlyCounts = [u64; MONTHS_PER_YEAR];

/// A change event after placement, classification and judgment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedEvent {
    #[serde(flatten)]
    pub event: ChangeEvent,
    pub office: String,
    pub region: String,
    pub days_diff: Option<i64>,
    pub is_counted: bool,
    pub responsibility_category: String,
    pub change_reason: String,
    pub judgment1: Option<bool>,
    pub judgment2: Option<bool>,
    /// `YYYYMM` of the application date.
    pub application_fiscal_month: Option<String>,
    /// Fiscal slot of the application date within the report period.
    #[serde(skip)]
    pub period_slot: Option<usize>,
}

impl ClassifiedEvent {
    pub fn judgment(&self) -> Judgment {
        Judgment {
            days_diff: self.days_diff,
            is_counted: self.is_counted,
            judgment1: self.judgment1,
            judgment2: self.judgment2,
        }
    }

    pub fn person_key(&self) -> &str {
        match self.event.person_name.trim() {
            "" => UNASSIGNED,
            name => name,
        }
    }

    pub fn placement(&self) -> Placement {
        Placement {
            office: self.office.clone(),
            region: self.region.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JudgmentTally {
    pub category: String,
    pub judgment1_yes: u64,
    pub judgment1_no: u64,
    pub judgment2_yes: u64,
    pub judgment2_no: u64,
}

impl JudgmentTally {
    fn new(category: String) -> Self {
        Self {
            category,
            judgment1_yes: 0,
            judgment1_no: 0,
            judgment2_yes: 0,
            judgment2_no: 0,
        }
    }

    fn record(&mut self, judgment: &Judgment) {
        match judgment.judgment1 {
            Some(true) => self.judgment1_yes += 1,
            Some(false) => self.judgment1_no += 1,
            None => {}
        }
        match judgment.judgment2 {
            Some(true) => self.judgment2_yes += 1,
            Some(false) => self.judgment2_no += 1,
            None => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonTally {
    pub office: String,
    pub region: String,
    pub change_counts: MonthlyCounts,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponsibilityTally {
    pub entry: TaxonomyEntry,
    pub counts: MonthlyCounts,
}

/// Everything the fold produces. Backlog is attached later by the snapshot joiner.
#[derive(Debug, Clone)]
pub struct Aggregation {
    pub monthly_changes: MonthlyCounts,
    pub persons: BTreeMap<String, PersonTally>,
    /// Placement of every person seen on any event, counted or not.
    pub placements: BTreeMap<String, Placement>,
    pub responsibility: Vec<ResponsibilityTally>,
    pub judgments: Vec<JudgmentTally>,
    pub details: Vec<ClassifiedEvent>,
    pub details_truncated: bool,
    pub total_events: u64,
    pub counted_events: u64,
    pub unbucketed_events: u64,
}

pub struct Aggregator {
    max_details: usize,
    monthly_changes: MonthlyCounts,
    persons: BTreeMap<String, PersonTally>,
    placements: BTreeMap<String, Placement>,
    responsibility: Vec<ResponsibilityTally>,
    responsibility_index: HashMap<TaxonomyEntry, usize>,
    judgments: Vec<JudgmentTally>,
    details: Vec<ClassifiedEvent>,
    details_truncated: bool,
    total_events: u64,
    counted_events: u64,
    unbucketed_events: u64,
}

impl Aggregator {
    /// Seeds every taxonomy row and category before any event is folded, so
    /// the cross-tab is dense even for an empty input.
    pub fn new(taxonomy: &ResponsibilityTaxonomy, max_details: usize) -> Self {
        let responsibility: Vec<ResponsibilityTally> = taxonomy
            .entries()
            .iter()
            .map(|entry| ResponsibilityTally {
                entry: entry.clone(),
                counts: [0; MONTHS_PER_YEAR],
            })
            .collect();

        let mut responsibility_index = HashMap::new();
        for (idx, row) in responsibility.iter().enumerate() {
            responsibility_index.entry(row.entry.clone()).or_insert(idx);
        }

        let judgments = taxonomy
            .categories()
            .into_iter()
            .map(JudgmentTally::new)
            .collect();

        Self {
            max_details,
            monthly_changes: [0; MONTHS_PER_YEAR],
            persons: BTreeMap::new(),
            placements: BTreeMap::new(),
            responsibility,
            responsibility_index,
            judgments,
            details: Vec::new(),
            details_truncated: false,
            total_events: 0,
            counted_events: 0,
            unbucketed_events: 0,
        }
    }

    pub fn fold(&mut self, event: ClassifiedEvent) {
        self.total_events += 1;
        self.record_placement(&event);

        if event.is_counted {
            self.counted_events += 1;
            match event.period_slot {
                Some(slot) => self.fold_counted(&event, slot),
                None => self.unbucketed_events += 1,
            }
        }

        if self.details.len() < self.max_details {
            self.details.push(event);
        } else {
            self.details_truncated = true;
        }
    }

    /// First placement per person wins, except that a tagged placement
    /// replaces an unassigned one.
    fn record_placement(&mut self, event: &ClassifiedEvent) {
        let placement = event.placement();
        self.placements
            .entry(event.person_key().to_string())
            .and_modify(|existing| {
                if existing.office == UNASSIGNED && placement.office != UNASSIGNED {
                    *existing = placement.clone();
                }
            })
            .or_insert(placement);
    }

    fn fold_counted(&mut self, event: &ClassifiedEvent, slot: usize) {
        self.monthly_changes[slot] += 1;

        let person = self
            .persons
            .entry(event.person_key().to_string())
            .or_insert_with(|| PersonTally {
                office: event.office.clone(),
                region: event.region.clone(),
                change_counts: [0; MONTHS_PER_YEAR],
            });
        person.change_counts[slot] += 1;

        let key = TaxonomyEntry {
            category: event.responsibility_category.clone(),
            reason: event.change_reason.clone(),
        };
        let row = match self.responsibility_index.get(&key) {
            Some(&idx) => idx,
            None => {
                debug!(
                    "Responsibility pair outside taxonomy: {} / {}",
                    key.category, key.reason
                );
                self.responsibility.push(ResponsibilityTally {
                    entry: key.clone(),
                    counts: [0; MONTHS_PER_YEAR],
                });
                let idx = self.responsibility.len() - 1;
                self.responsibility_index.insert(key, idx);
                idx
            }
        };
        self.responsibility[row].counts[slot] += 1;

        let judgment = event.judgment();
        match self
            .judgments
            .iter_mut()
            .find(|t| t.category == event.responsibility_category)
        {
            Some(tally) => tally.record(&judgment),
            None => {
                let mut tally = JudgmentTally::new(event.responsibility_category.clone());
                tally.record(&judgment);
                self.judgments.push(tally);
            }
        }
    }

    pub fn finish(self) -> Aggregation {
        Aggregation {
            monthly_changes: self.monthly_changes,
            persons: self.persons,
            placements: self.placements,
            responsibility: self.responsibility,
            judgments: self.judgments,
            details: self.details,
            details_truncated: self.details_truncated,
            total_events: self.total_events,
            counted_events: self.counted_events,
            unbucketed_events: self.unbucketed_events,
        }
    }
}
