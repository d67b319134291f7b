use crate::config::DEFAULT_HEAD_OFFICE_PERSON;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const UNASSIGNED: &str = "未設定";
pub const OTHER: &str = "その他";
pub const HEAD_OFFICE: &str = "本社";
pub const REGION_EAST: &str = "東日本";
pub const REGION_WEST: &str = "西日本";

/// Regions in display order. [`OTHER`] is appended only when populated.
pub const REGION_ORDER: [&str; 3] = [REGION_EAST, REGION_WEST, HEAD_OFFICE];

const STANDARD_OFFICES: &[(&str, &str)] = &[
    (HEAD_OFFICE, HEAD_OFFICE),
    ("札幌営業所", REGION_EAST),
    ("仙台営業所", REGION_EAST),
    ("東京営業所", REGION_EAST),
    ("横浜営業所", REGION_EAST),
    ("名古屋営業所", REGION_WEST),
    ("大阪営業所", REGION_WEST),
    ("広島営業所", REGION_WEST),
    ("福岡営業所", REGION_WEST),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfficeEntry {
    pub name: String,
    pub region: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub office: String,
    pub region: String,
}

/// Read-only office table (in display order), an optional person roster,
/// and the head-office override. Missing fields deserialize to the standard
/// table with an empty roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizationDirectory {
    offices: Vec<OfficeEntry>,
    roster: BTreeMap<String, Vec<String>>,
    head_office_person: String,
}

impl Default for OrganizationDirectory {
    fn default() -> Self {
        Self::standard(DEFAULT_HEAD_OFFICE_PERSON)
    }
}

impl OrganizationDirectory {
    pub fn new(offices: Vec<OfficeEntry>, head_office_person: impl Into<String>) -> Self {
        Self {
            offices,
            roster: BTreeMap::new(),
            head_office_person: head_office_person.into(),
        }
    }

    pub fn standard(head_office_person: impl Into<String>) -> Self {
        let offices = STANDARD_OFFICES
            .iter()
            .map(|(name, region)| OfficeEntry {
                name: name.to_string(),
                region: region.to_string(),
            })
            .collect();
        Self::new(offices, head_office_person)
    }

    /// Department tags to fall back on when a record carries none.
    pub fn with_member(mut self, person: impl Into<String>, departments: Vec<String>) -> Self {
        self.roster.insert(person.into(), departments);
        self
    }

    pub fn with_head_office_person(mut self, person: impl Into<String>) -> Self {
        self.head_office_person = person.into();
        self
    }

    pub fn offices(&self) -> &[OfficeEntry] {
        &self.offices
    }

    pub fn head_office_person(&self) -> &str {
        &self.head_office_person
    }

    /// Position of the office in the display table, `None` for pseudo-offices.
    pub fn display_rank(&self, office: &str) -> Option<usize> {
        self.offices.iter().position(|o| o.name == office)
    }

    pub fn region_of(&self, office: &str) -> String {
        if office == HEAD_OFFICE {
            return HEAD_OFFICE.to_string();
        }
        self.offices
            .iter()
            .find(|o| o.name == office)
            .map(|o| o.region.clone())
            .unwrap_or_else(|| OTHER.to_string())
    }

    /// Resolves a person to an office and region. Always succeeds; unknown
    /// placements land in [`UNASSIGNED`] / [`OTHER`].
    pub fn resolve(&self, person_name: &str, departments: &[String]) -> Placement {
        let office = if !person_name.is_empty() && person_name == self.head_office_person {
            HEAD_OFFICE.to_string()
        } else {
            let tags = if departments.is_empty() {
                self.roster
                    .get(person_name)
                    .map(Vec::as_slice)
                    .unwrap_or_default()
            } else {
                departments
            };
            self.match_office(tags)
        };

        let region = self.region_of(&office);
        Placement { office, region }
    }

    fn match_office(&self, tags: &[String]) -> String {
        let tags: Vec<&str> = tags
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect();

        for tag in &tags {
            if let Some(office) = self.offices.iter().find(|o| o.name == *tag) {
                return office.name.clone();
            }
        }

        // Loose match: first tag with any containment relation wins, in input order.
        for tag in &tags {
            if let Some(office) = self
                .offices
                .iter()
                .find(|o| tag.contains(o.name.as_str()) || o.name.contains(tag))
            {
                return office.name.clone();
            }
        }

        tags.first()
            .map(|t| t.to_string())
            .unwrap_or_else(|| UNASSIGNED.to_string())
    }
}
