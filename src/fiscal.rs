//! Fiscal calendar: the single place that maps calendar dates onto fiscal
//! periods and month slots. Every bucketing step in the crate goes through
//! [`FiscalCalendar`].

use crate::config::validate_fiscal_start_month;
use crate::error::{DeliveryChangeError, Result};
use chrono::{Datelike, NaiveDate};

pub const MONTHS_PER_YEAR: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FiscalCalendar {
    start_month: u32,
    year_offset: i32,
}

impl FiscalCalendar {
    pub fn new(start_month: u32, year_offset: i32) -> Result<Self> {
        validate_fiscal_start_month(start_month)?;
        Ok(Self {
            start_month,
            year_offset,
        })
    }

    pub fn start_month(&self) -> u32 {
        self.start_month
    }

    /// Fiscal period that `date` belongs to.
    pub fn fiscal_year_of(&self, date: NaiveDate) -> i32 {
        if date.month() >= self.start_month {
            date.year() - self.year_offset
        } else {
            date.year() - self.year_offset - 1
        }
    }

    /// Returns the 0-based slot of the month within the fiscal year.
    ///
    /// # Examples
    /// - Start month 8: Aug=0, Sep=1, ..., Dec=4, Jan=5, ..., Jul=11
    /// - Start month 4: Apr=0, ..., Mar=11
    pub fn fiscal_month_index(&self, date: NaiveDate) -> usize {
        month_slot(date.month(), self.start_month)
    }

    /// `(period, slot)` for a date.
    pub fn locate(&self, date: NaiveDate) -> (i32, usize) {
        (self.fiscal_year_of(date), self.fiscal_month_index(date))
    }

    /// Slot of `date` if it falls inside `period`.
    pub fn slot_in_period(&self, date: NaiveDate, period: i32) -> Option<usize> {
        let (date_period, slot) = self.locate(date);
        (date_period == period).then_some(slot)
    }

    /// First calendar day of the month occupying `slot` in `period`.
    pub fn month_start(&self, period: i32, slot: usize) -> Result<NaiveDate> {
        let zero_based = self.start_month as usize - 1 + slot;
        let year = period
            .checked_add(self.year_offset)
            .and_then(|y| y.checked_add((zero_based / MONTHS_PER_YEAR) as i32))
            .ok_or(DeliveryChangeError::InvalidFiscalPeriod(period))?;
        let month = (zero_based % MONTHS_PER_YEAR) as u32 + 1;

        NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or(DeliveryChangeError::InvalidFiscalPeriod(period))
    }

    /// The twelve `YYYYMM` labels of `period`, in fiscal order.
    pub fn fiscal_year_months(&self, period: i32) -> Result<[String; MONTHS_PER_YEAR]> {
        let mut labels: [String; MONTHS_PER_YEAR] = Default::default();
        for (slot, label) in labels.iter_mut().enumerate() {
            *label = year_month_label(self.month_start(period, slot)?);
        }
        Ok(labels)
    }

    /// Slot of a `YYYYMM` label inside `period`, if the label parses and belongs to it.
    pub fn slot_of_label(&self, label: &str, period: i32) -> Option<usize> {
        parse_year_month_label(label).and_then(|date| self.slot_in_period(date, period))
    }
}

pub fn year_month_label(date: NaiveDate) -> String {
    format!("{:04}{:02}", date.year(), date.month())
}

/// Parses `YYYYMM` (surrounding whitespace tolerated) into the first day of that month.
pub fn parse_year_month_label(label: &str) -> Option<NaiveDate> {
    let label = label.trim();
    if label.len() != 6 || !label.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year: i32 = label[..4].parse().ok()?;
    let month: u32 = label[4..].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, 1)
}

fn month_slot(calendar_month: u32, start_month: u32) -> usize {
    if calendar_month >= start_month {
        (calendar_month - start_month) as usize
    } else {
        (calendar_month + 12 - start_month) as usize
    }
}
