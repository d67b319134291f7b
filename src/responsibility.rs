use crate::organization::OTHER;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const CATEGORY_EXTERNAL: &str = "外部責任";
pub const CATEGORY_INTERNAL: &str = "社内責任";
pub const CATEGORY_DATE_FINALIZATION: &str = "日程確定";

pub const CATEGORIES: [&str; 3] = [
    CATEGORY_INTERNAL,
    CATEGORY_EXTERNAL,
    CATEGORY_DATE_FINALIZATION,
];

const STANDARD_REASONS: &[(&str, &str)] = &[
    (CATEGORY_INTERNAL, "営業手配ミス"),
    (CATEGORY_INTERNAL, "設計変更遅延"),
    (CATEGORY_INTERNAL, "工程管理不備"),
    (CATEGORY_INTERNAL, "積算ミス"),
    (CATEGORY_INTERNAL, "資材発注遅れ"),
    (CATEGORY_EXTERNAL, "施主都合"),
    (CATEGORY_EXTERNAL, "近隣対応"),
    (CATEGORY_EXTERNAL, "天候不良"),
    (CATEGORY_EXTERNAL, "行政手続き遅延"),
    (CATEGORY_EXTERNAL, "メーカー欠品"),
    (CATEGORY_DATE_FINALIZATION, "着工日確定"),
    (CATEGORY_DATE_FINALIZATION, "引渡日確定"),
];

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaxonomyEntry {
    pub category: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub category: String,
    pub reason: String,
}

/// The fixed `(category, reason)` table. Rows keep their declared order, which
/// is also the row order of the cross-tab. Serializes as the plain entry list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<TaxonomyEntry>", into = "Vec<TaxonomyEntry>")]
pub struct ResponsibilityTaxonomy {
    entries: Vec<TaxonomyEntry>,
    lookup: HashMap<String, String>,
}

impl Default for ResponsibilityTaxonomy {
    fn default() -> Self {
        Self::new(
            STANDARD_REASONS
                .iter()
                .map(|(category, reason)| TaxonomyEntry {
                    category: category.to_string(),
                    reason: reason.to_string(),
                })
                .collect(),
        )
    }
}

impl From<Vec<TaxonomyEntry>> for ResponsibilityTaxonomy {
    fn from(entries: Vec<TaxonomyEntry>) -> Self {
        Self::new(entries)
    }
}

impl From<ResponsibilityTaxonomy> for Vec<TaxonomyEntry> {
    fn from(taxonomy: ResponsibilityTaxonomy) -> Self {
        taxonomy.entries
    }
}

impl ResponsibilityTaxonomy {
    pub fn new(entries: Vec<TaxonomyEntry>) -> Self {
        let mut lookup = HashMap::new();
        for entry in &entries {
            // Category names resolve to themselves so a bare category passes through
            lookup
                .entry(entry.category.clone())
                .or_insert_with(|| entry.category.clone());
            lookup
                .entry(entry.reason.clone())
                .or_insert_with(|| entry.category.clone());
        }
        Self { entries, lookup }
    }

    pub fn entries(&self) -> &[TaxonomyEntry] {
        &self.entries
    }

    /// Distinct categories in first-seen order.
    pub fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = Vec::new();
        for entry in &self.entries {
            if !categories.contains(&entry.category) {
                categories.push(entry.category.clone());
            }
        }
        categories
    }

    /// The raw responsibility field carries either a category or a detailed
    /// reason; table membership decides which.
    ///
    /// 1. `category` is the table value for the raw text, or the raw text itself.
    /// 2. `reason` is the explicit change reason when present; otherwise the raw
    ///    text if it is a detailed reason (maps to something other than itself);
    ///    otherwise empty.
    pub fn classify(&self, responsibility_raw: &str, change_reason_raw: &str) -> Classification {
        let raw = responsibility_raw.trim();
        let explicit_reason = change_reason_raw.trim();
        let mapped = self.lookup.get(raw);

        let category = match mapped {
            Some(category) => category.clone(),
            None if raw.is_empty() => OTHER.to_string(),
            None => raw.to_string(),
        };

        let reason = if !explicit_reason.is_empty() {
            explicit_reason.to_string()
        } else if mapped.is_some_and(|category| category != raw) {
            raw.to_string()
        } else {
            String::new()
        };

        Classification { category, reason }
    }
}
