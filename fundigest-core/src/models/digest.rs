use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::company::CompanyDigest;

/// Summary shown when no digest has been stored yet.
pub const PLACEHOLDER_SUMMARY: &str = "No data to display yet.";

/// Root of a digest document. Company order is display order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DigestRoot {
    #[serde(default)]
    pub summary: Option<String>,
    pub company_funding_digests: Vec<CompanyDigest>,
}

impl DigestRoot {
    pub fn new(summary: Option<String>, companies: Vec<CompanyDigest>) -> Self {
        Self {
            summary,
            company_funding_digests: companies,
        }
    }

    pub fn placeholder() -> Self {
        Self::new(Some(PLACEHOLDER_SUMMARY.to_string()), Vec::new())
    }

    /// Total number of funding events across all companies.
    pub fn event_count(&self) -> usize {
        self.company_funding_digests
            .iter()
            .map(|c| c.funding_events.len())
            .sum()
    }
}

/// A stored digest together with the run that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DigestRecord {
    pub run_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub data: DigestRoot,
}

impl DigestRecord {
    /// The record served before anything has been saved.
    pub fn placeholder() -> Self {
        Self {
            run_id: None,
            created_at: None,
            data: DigestRoot::placeholder(),
        }
    }
}
