use serde::{Deserialize, Serialize};

use super::funding::FundingEvent;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyInfo {
    pub name: String,
    pub website: Option<String>,
    pub location: Option<Location>,
    pub industry: Option<String>,
    pub owners: Option<Vec<String>>,
    pub num_employees: Option<i64>,
    pub brief: Option<String>,
}

impl CompanyInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn country(&self) -> Option<&str> {
        self.location.as_ref().and_then(|l| l.country.as_deref())
    }
}

/// A company entry of the digest together with its funding timeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyDigest {
    pub company: CompanyInfo,
    #[serde(default)]
    pub funding_events: Vec<FundingEvent>,
    #[serde(default)]
    pub related_links: Vec<String>,
    pub satisfies_search_criteria: Option<bool>,
}

impl CompanyDigest {
    /// A blank company as added from the editor: empty name and an
    /// explicit location with no country.
    pub fn empty() -> Self {
        Self {
            company: CompanyInfo {
                location: Some(Location::default()),
                ..CompanyInfo::default()
            },
            ..Self::default()
        }
    }

    pub fn new(company: CompanyInfo) -> Self {
        Self {
            company,
            ..Self::default()
        }
    }

    pub fn with_events(mut self, events: Vec<FundingEvent>) -> Self {
        self.funding_events = events;
        self
    }
}
