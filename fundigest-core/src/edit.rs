//! Editor input applied to a [`Draft`].
//!
//! Values arrive as raw text from form fields. Each field has its own
//! normalization rule; none of them fail. Unparseable input falls back to
//! null, to the raw string, or to the previous value depending on the field.

use serde::{Deserialize, Serialize};

use crate::draft::{
    AmountPatch, CompanyPatch, Draft, EntryKey, EventPatch, EventPath, SourcePatch, SourcePath,
};
use crate::models::{AmountValue, CompanyDigest, FundingEvent, Investor, SourceDocument};

/// A change to a company's own fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanyEdit {
    Name(String),
    Website(String),
    Industry(String),
    Brief(String),
    Country(String),
    /// Comma-separated founder names.
    Owners(String),
    Employees(String),
}

/// A change to a funding event's fields, including its amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventEdit {
    Round(String),
    AnnouncedDate(String),
    AsReported(String),
    Value(String),
    Currency(String),
    /// One investor per line, optionally `name | website`.
    Investors(String),
    LeadInvestor(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceEdit {
    Url(String),
    Title(String),
    Publisher(String),
    PublishedAt(String),
    Snippet(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    Summary(String),
    AddCompany,
    RemoveCompany(EntryKey),
    Company(EntryKey, CompanyEdit),
    AddEvent(EntryKey),
    RemoveEvent(EventPath),
    Event(EventPath, EventEdit),
    AddSource(EventPath),
    RemoveSource(SourcePath),
    Source(SourcePath, SourceEdit),
}

/// `None` for blank input, otherwise the input unchanged.
fn empty_to_none(value: String) -> Option<String> {
    Some(value).filter(|s| !s.is_empty())
}

fn blank_to_none(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// `None` for blank input, otherwise the trimmed input.
fn trim_to_none(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Splits a comma-separated list; an empty result is `None`.
pub fn parse_owners(value: &str) -> Option<Vec<String>> {
    let owners: Vec<String> = value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if owners.is_empty() {
        None
    } else {
        Some(owners)
    }
}

/// Parses an employee count. Blank clears it; input that is not a whole
/// number keeps `previous`.
pub fn parse_employees(value: &str, previous: Option<i64>) -> Option<i64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(n) = trimmed.parse::<i64>() {
        return Some(n);
    }
    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < i64::MAX as f64 => Some(n as i64),
        _ => previous,
    }
}

/// Parses an amount value typed by hand. The whole string must be a finite
/// number; anything else is kept as trimmed text.
pub fn parse_amount_value(value: &str) -> Option<AmountValue> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() => Some(AmountValue::Number(n)),
        _ => Some(AmountValue::Text(trimmed.to_string())),
    }
}

/// Parses investor lines of the form `name` or `name | website`.
pub fn parse_investors(value: &str) -> Vec<Investor> {
    value
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            let mut parts = line.split('|').map(str::trim);
            let name = parts.next().unwrap_or_default().to_string();
            let website = parts.next().filter(|w| !w.is_empty()).map(str::to_string);
            Investor { name, website }
        })
        .collect()
}

pub fn parse_lead_investor(value: &str) -> Option<Investor> {
    trim_to_none(value).map(Investor::new)
}

impl CompanyEdit {
    fn into_patch(self, previous_employees: Option<i64>) -> CompanyPatch {
        let mut patch = CompanyPatch::default();
        match self {
            CompanyEdit::Name(v) => patch.name = Some(v),
            CompanyEdit::Website(v) => patch.website = Some(Some(v)),
            CompanyEdit::Industry(v) => patch.industry = Some(Some(v)),
            CompanyEdit::Brief(v) => patch.brief = Some(Some(v)),
            CompanyEdit::Country(v) => patch.country = Some(trim_to_none(&v)),
            CompanyEdit::Owners(v) => patch.owners = Some(parse_owners(&v)),
            CompanyEdit::Employees(v) => {
                patch.num_employees = Some(parse_employees(&v, previous_employees))
            }
        }
        patch
    }
}

impl From<EventEdit> for EventPatch {
    fn from(edit: EventEdit) -> Self {
        let mut patch = EventPatch::default();
        let mut amount = AmountPatch::default();
        match edit {
            EventEdit::Round(v) => patch.round = Some(empty_to_none(v)),
            EventEdit::AnnouncedDate(v) => patch.announced_date = Some(empty_to_none(v)),
            EventEdit::AsReported(v) => amount.as_reported = Some(blank_to_none(&v)),
            EventEdit::Value(v) => amount.value = Some(parse_amount_value(&v)),
            EventEdit::Currency(v) => amount.currency = Some(blank_to_none(&v)),
            EventEdit::Investors(v) => patch.investors = Some(parse_investors(&v)),
            EventEdit::LeadInvestor(v) => patch.lead_investor = Some(parse_lead_investor(&v)),
        }
        if amount != AmountPatch::default() {
            patch.amount = Some(amount);
        }
        patch
    }
}

impl From<SourceEdit> for SourcePatch {
    fn from(edit: SourceEdit) -> Self {
        let mut patch = SourcePatch::default();
        match edit {
            SourceEdit::Url(v) => patch.url = Some(trim_to_none(&v)),
            SourceEdit::Title(v) => patch.title = Some(trim_to_none(&v)),
            SourceEdit::Publisher(v) => patch.publisher = Some(trim_to_none(&v)),
            SourceEdit::PublishedAt(v) => patch.published_at = Some(trim_to_none(&v)),
            // free-form excerpt, kept as typed
            SourceEdit::Snippet(v) => patch.snippet = Some(empty_to_none(v)),
        }
        patch
    }
}

impl Draft {
    /// Applies one editor change and returns the resulting draft.
    pub fn apply(&self, edit: Edit) -> Draft {
        match edit {
            Edit::Summary(summary) => self.with_summary(Some(summary)),
            Edit::AddCompany => self.push_company(&CompanyDigest::empty()).0,
            Edit::RemoveCompany(key) => self.remove_company(key),
            Edit::Company(key, edit) => {
                let previous = self.company(key).and_then(|c| c.company.num_employees);
                self.patch_company(key, edit.into_patch(previous))
            }
            Edit::AddEvent(key) => self.push_event(key, &FundingEvent::empty()),
            Edit::RemoveEvent(path) => self.remove_event(path),
            Edit::Event(path, edit) => self.patch_event(path, edit.into()),
            Edit::AddSource(path) => self.push_source(path, SourceDocument::empty()),
            Edit::RemoveSource(path) => self.remove_source(path),
            Edit::Source(path, edit) => self.patch_source(path, edit.into()),
        }
    }
}
