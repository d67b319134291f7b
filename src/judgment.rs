//! Per-event change judgment: whether a delivery-date change is material
//! enough to count, plus the two quality flags used for the lead-time metric.

use crate::config::EngineConfig;
use crate::dates::days_between;
use crate::schema::ChangeEvent;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgmentRules {
    pub materiality_days: i64,
    pub lead_time_days: i64,
    pub magnitude_days: i64,
}

impl Default for JudgmentRules {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl JudgmentRules {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            materiality_days: config.materiality_days,
            lead_time_days: config.lead_time_days,
            magnitude_days: config.magnitude_days,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Judgment {
    /// after - before, in days.
    pub days_diff: Option<i64>,
    pub is_counted: bool,
    pub judgment1: Option<bool>,
    pub judgment2: Option<bool>,
}

impl JudgmentRules {
    pub fn evaluate(&self, event: &ChangeEvent) -> Judgment {
        self.evaluate_dates(event.before_date, event.after_date, event.application_date)
    }

    pub fn evaluate_dates(
        &self,
        before: Option<NaiveDate>,
        after: Option<NaiveDate>,
        application: Option<NaiveDate>,
    ) -> Judgment {
        let days_diff = match (before, after) {
            (Some(before), Some(after)) => Some(days_between(before, after)),
            _ => None,
        };
        let is_counted = days_diff.is_some_and(|diff| diff.abs() > self.materiality_days);

        let judgment1 = match (before, application) {
            (Some(before), Some(application)) => {
                Some(days_between(application, before) <= self.lead_time_days)
            }
            _ => None,
        };

        // Judgment 2 only refines a positive judgment 1.
        let judgment2 = match judgment1 {
            None => None,
            Some(false) => Some(false),
            Some(true) => days_diff.map(|diff| diff.abs() >= self.magnitude_days),
        };

        Judgment {
            days_diff,
            is_counted,
            judgment1,
            judgment2,
        }
    }
}
