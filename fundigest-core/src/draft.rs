//! Working copy of a digest under edit.
//!
//! A [`Draft`] mirrors [`DigestRoot`] but holds every company, funding event
//! and source document behind an `Arc` together with a synthetic
//! [`EntryKey`]. Keys exist only in memory and address edits, so removing an
//! earlier element never redirects an edit to its neighbour.
//!
//! Drafts are immutable values. Every builder returns a new `Draft` that
//! reuses all untouched entries; the receiver stays valid, which is what
//! undo and change detection rely on.

use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use crate::models::{
    Amount, AmountValue, CompanyDigest, CompanyInfo, DigestRoot, FundingEvent, Investor, Location,
    SourceDocument,
};

/// In-memory identity of a list element inside a draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryKey(Uuid);

impl EntryKey {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A keyed, shared list element.
#[derive(Debug)]
pub struct Entry<T> {
    key: EntryKey,
    value: Arc<T>,
}

impl<T> Clone for Entry<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key,
            value: Arc::clone(&self.value),
        }
    }
}

impl<T> Entry<T> {
    fn new(value: T) -> Self {
        Self {
            key: EntryKey::new(),
            value: Arc::new(value),
        }
    }

    pub fn key(&self) -> EntryKey {
        self.key
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    /// True when both entries point at the same allocation.
    pub fn shares(&self, other: &Entry<T>) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

/// Address of a funding event inside a draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventPath {
    pub company: EntryKey,
    pub event: EntryKey,
}

/// Address of a source document inside a draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourcePath {
    pub company: EntryKey,
    pub event: EntryKey,
    pub source: EntryKey,
}

impl SourcePath {
    pub fn event_path(&self) -> EventPath {
        EventPath {
            company: self.company,
            event: self.event,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventDraft {
    pub round: Option<String>,
    pub announced_date: Option<String>,
    pub amount: Option<Amount>,
    pub investors: Arc<Vec<Investor>>,
    pub lead_investor: Option<Investor>,
    pub sources: Vec<Entry<SourceDocument>>,
}

impl From<&FundingEvent> for EventDraft {
    fn from(event: &FundingEvent) -> Self {
        Self {
            round: event.round.clone(),
            announced_date: event.announced_date.clone(),
            amount: event.amount.clone(),
            investors: Arc::new(event.investors.clone()),
            lead_investor: event.lead_investor.clone(),
            sources: event
                .source_documents
                .iter()
                .cloned()
                .map(Entry::new)
                .collect(),
        }
    }
}

impl EventDraft {
    pub fn to_event(&self) -> FundingEvent {
        FundingEvent {
            round: self.round.clone(),
            announced_date: self.announced_date.clone(),
            amount: self.amount.clone(),
            investors: self.investors.as_ref().clone(),
            lead_investor: self.lead_investor.clone(),
            source_documents: self.sources.iter().map(|s| s.value().clone()).collect(),
        }
    }

    fn matches(&self, event: &FundingEvent) -> bool {
        self.round == event.round
            && self.announced_date == event.announced_date
            && self.amount == event.amount
            && self.investors.as_slice() == event.investors.as_slice()
            && self.lead_investor == event.lead_investor
            && self.sources.len() == event.source_documents.len()
            && self
                .sources
                .iter()
                .zip(&event.source_documents)
                .all(|(s, doc)| s.value() == doc)
    }
}

#[derive(Debug, Clone)]
pub struct CompanyDraft {
    pub company: Arc<CompanyInfo>,
    pub events: Vec<Entry<EventDraft>>,
    pub related_links: Arc<Vec<String>>,
    pub satisfies_search_criteria: Option<bool>,
}

impl From<&CompanyDigest> for CompanyDraft {
    fn from(digest: &CompanyDigest) -> Self {
        Self {
            company: Arc::new(digest.company.clone()),
            events: digest
                .funding_events
                .iter()
                .map(|e| Entry::new(EventDraft::from(e)))
                .collect(),
            related_links: Arc::new(digest.related_links.clone()),
            satisfies_search_criteria: digest.satisfies_search_criteria,
        }
    }
}

impl CompanyDraft {
    pub fn to_digest(&self) -> CompanyDigest {
        CompanyDigest {
            company: self.company.as_ref().clone(),
            funding_events: self.events.iter().map(|e| e.value().to_event()).collect(),
            related_links: self.related_links.as_ref().clone(),
            satisfies_search_criteria: self.satisfies_search_criteria,
        }
    }

    pub fn event(&self, key: EntryKey) -> Option<&EventDraft> {
        find(&self.events, key)
    }

    fn matches(&self, digest: &CompanyDigest) -> bool {
        *self.company == digest.company
            && self.related_links.as_slice() == digest.related_links.as_slice()
            && self.satisfies_search_criteria == digest.satisfies_search_criteria
            && self.events.len() == digest.funding_events.len()
            && self
                .events
                .iter()
                .zip(&digest.funding_events)
                .all(|(e, event)| e.value().matches(event))
    }
}

/// Fields to overwrite on a company. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompanyPatch {
    pub name: Option<String>,
    pub website: Option<Option<String>>,
    pub industry: Option<Option<String>>,
    pub brief: Option<Option<String>>,
    pub country: Option<Option<String>>,
    pub owners: Option<Option<Vec<String>>>,
    pub num_employees: Option<Option<i64>>,
}

impl CompanyPatch {
    pub fn apply(self, info: &CompanyInfo) -> CompanyInfo {
        let mut next = info.clone();
        if let Some(name) = self.name {
            next.name = name;
        }
        if let Some(website) = self.website {
            next.website = website;
        }
        if let Some(industry) = self.industry {
            next.industry = industry;
        }
        if let Some(brief) = self.brief {
            next.brief = brief;
        }
        if let Some(country) = self.country {
            next.location = Some(Location { country });
        }
        if let Some(owners) = self.owners {
            next.owners = owners;
        }
        if let Some(num_employees) = self.num_employees {
            next.num_employees = num_employees;
        }
        next
    }
}

/// Fields to overwrite on an amount. A missing amount starts out all-null.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AmountPatch {
    pub as_reported: Option<Option<String>>,
    pub value: Option<Option<AmountValue>>,
    pub currency: Option<Option<String>>,
}

impl AmountPatch {
    pub fn apply(self, amount: Option<&Amount>) -> Amount {
        let mut next = amount.cloned().unwrap_or_default();
        if let Some(as_reported) = self.as_reported {
            next.as_reported = as_reported;
        }
        if let Some(value) = self.value {
            next.value = value;
        }
        if let Some(currency) = self.currency {
            next.currency = currency;
        }
        next
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventPatch {
    pub round: Option<Option<String>>,
    pub announced_date: Option<Option<String>>,
    pub amount: Option<AmountPatch>,
    pub investors: Option<Vec<Investor>>,
    pub lead_investor: Option<Option<Investor>>,
}

impl EventPatch {
    /// Builds the patched event. Sources are shared, as are investors
    /// unless replaced.
    pub fn apply(self, event: &EventDraft) -> EventDraft {
        let mut next = event.clone();
        if let Some(round) = self.round {
            next.round = round;
        }
        if let Some(date) = self.announced_date {
            next.announced_date = date;
        }
        if let Some(amount) = self.amount {
            next.amount = Some(amount.apply(event.amount.as_ref()));
        }
        if let Some(investors) = self.investors {
            next.investors = Arc::new(investors);
        }
        if let Some(lead) = self.lead_investor {
            next.lead_investor = lead;
        }
        next
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourcePatch {
    pub url: Option<Option<String>>,
    pub title: Option<Option<String>>,
    pub publisher: Option<Option<String>>,
    pub published_at: Option<Option<String>>,
    pub snippet: Option<Option<String>>,
}

impl SourcePatch {
    pub fn apply(self, source: &SourceDocument) -> SourceDocument {
        let mut next = source.clone();
        if let Some(url) = self.url {
            next.url = url;
        }
        if let Some(title) = self.title {
            next.title = title;
        }
        if let Some(publisher) = self.publisher {
            next.publisher = publisher;
        }
        if let Some(published_at) = self.published_at {
            next.published_at = published_at;
        }
        if let Some(snippet) = self.snippet {
            next.snippet = snippet;
        }
        next
    }
}

fn find<T>(entries: &[Entry<T>], key: EntryKey) -> Option<&T> {
    entries.iter().find(|e| e.key == key).map(|e| e.value())
}

/// Copies the list with the keyed entry rebuilt by `f`; the key is kept.
fn replace_entry<T>(
    entries: &[Entry<T>],
    key: EntryKey,
    f: impl FnOnce(&T) -> T,
) -> Option<Vec<Entry<T>>> {
    let pos = entries.iter().position(|e| e.key == key)?;
    let mut next = entries.to_vec();
    next[pos] = Entry {
        key,
        value: Arc::new(f(&entries[pos].value)),
    };
    Some(next)
}

fn remove_entry<T>(entries: &[Entry<T>], key: EntryKey) -> Option<Vec<Entry<T>>> {
    entries.iter().position(|e| e.key == key)?;
    Some(entries.iter().filter(|e| e.key != key).cloned().collect())
}

/// Editable working copy of a digest.
#[derive(Debug, Clone)]
pub struct Draft {
    summary: Option<String>,
    companies: Vec<Entry<CompanyDraft>>,
}

impl From<&DigestRoot> for Draft {
    fn from(root: &DigestRoot) -> Self {
        Self::from_root(root)
    }
}

impl Draft {
    /// Builds a draft, assigning a fresh key to every list element.
    pub fn from_root(root: &DigestRoot) -> Self {
        Self {
            summary: root.summary.clone(),
            companies: root
                .company_funding_digests
                .iter()
                .map(|c| Entry::new(CompanyDraft::from(c)))
                .collect(),
        }
    }

    /// The persistable document, without keys.
    pub fn to_root(&self) -> DigestRoot {
        DigestRoot {
            summary: self.summary.clone(),
            company_funding_digests: self.companies.iter().map(|c| c.value().to_digest()).collect(),
        }
    }

    /// Field-by-field comparison against a persisted document.
    pub fn matches(&self, root: &DigestRoot) -> bool {
        self.summary == root.summary
            && self.companies.len() == root.company_funding_digests.len()
            && self
                .companies
                .iter()
                .zip(&root.company_funding_digests)
                .all(|(c, digest)| c.value().matches(digest))
    }

    /// True when `other` holds the same summary and the very same company
    /// entries, as left behind by an edit that changed nothing.
    pub fn same_as(&self, other: &Draft) -> bool {
        self.summary == other.summary
            && self.companies.len() == other.companies.len()
            && self
                .companies
                .iter()
                .zip(&other.companies)
                .all(|(a, b)| a.key == b.key && a.shares(b))
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn companies(&self) -> &[Entry<CompanyDraft>] {
        &self.companies
    }

    pub fn company(&self, key: EntryKey) -> Option<&CompanyDraft> {
        find(&self.companies, key)
    }

    pub fn event(&self, path: EventPath) -> Option<&EventDraft> {
        self.company(path.company)?.event(path.event)
    }

    pub fn source(&self, path: SourcePath) -> Option<&SourceDocument> {
        find(&self.event(path.event_path())?.sources, path.source)
    }

    /// Key of the company currently at `index`.
    pub fn company_key(&self, index: usize) -> Option<EntryKey> {
        self.companies.get(index).map(|c| c.key)
    }

    /// Path of the event currently at the given positions.
    pub fn event_path(&self, company: usize, event: usize) -> Option<EventPath> {
        let entry = self.companies.get(company)?;
        let event = entry.value().events.get(event)?;
        Some(EventPath {
            company: entry.key,
            event: event.key,
        })
    }

    /// Path of the source document currently at the given positions.
    pub fn source_path(&self, company: usize, event: usize, source: usize) -> Option<SourcePath> {
        let path = self.event_path(company, event)?;
        let source = self.event(path)?.sources.get(source)?;
        Some(SourcePath {
            company: path.company,
            event: path.event,
            source: source.key,
        })
    }

    fn with_companies(&self, companies: Option<Vec<Entry<CompanyDraft>>>, key: EntryKey) -> Draft {
        match companies {
            Some(companies) => Draft {
                summary: self.summary.clone(),
                companies,
            },
            None => {
                tracing::debug!("No company with key {} in draft, edit ignored", key);
                self.clone()
            }
        }
    }

    pub fn with_summary(&self, summary: Option<String>) -> Draft {
        Draft {
            summary,
            companies: self.companies.clone(),
        }
    }

    /// Appends a company and returns the new draft with the company's key.
    pub fn push_company(&self, company: &CompanyDigest) -> (Draft, EntryKey) {
        let entry = Entry::new(CompanyDraft::from(company));
        let key = entry.key;
        let mut companies = self.companies.clone();
        companies.push(entry);
        (
            Draft {
                summary: self.summary.clone(),
                companies,
            },
            key,
        )
    }

    pub fn remove_company(&self, key: EntryKey) -> Draft {
        self.with_companies(remove_entry(&self.companies, key), key)
    }

    /// Rebuilds one company with `f`, sharing every other company.
    pub fn update_company(&self, key: EntryKey, f: impl FnOnce(&CompanyDraft) -> CompanyDraft) -> Draft {
        self.with_companies(replace_entry(&self.companies, key, f), key)
    }

    pub fn patch_company(&self, key: EntryKey, patch: CompanyPatch) -> Draft {
        self.update_company(key, |c| CompanyDraft {
            company: Arc::new(patch.apply(&c.company)),
            ..c.clone()
        })
    }

    /// Rebuilds one event with `f`. The owning company is rebuilt around it;
    /// siblings and other companies are shared.
    pub fn update_event(&self, path: EventPath, f: impl FnOnce(&EventDraft) -> EventDraft) -> Draft {
        let Some(events) = self
            .company(path.company)
            .and_then(|c| replace_entry(&c.events, path.event, f))
        else {
            tracing::debug!("No event at {}/{} in draft, edit ignored", path.company, path.event);
            return self.clone();
        };
        self.update_company(path.company, |c| CompanyDraft {
            events,
            ..c.clone()
        })
    }

    pub fn patch_event(&self, path: EventPath, patch: EventPatch) -> Draft {
        self.update_event(path, |e| patch.apply(e))
    }

    pub fn push_event(&self, company: EntryKey, event: &FundingEvent) -> Draft {
        self.update_company(company, |c| {
            let mut events = c.events.clone();
            events.push(Entry::new(EventDraft::from(event)));
            CompanyDraft { events, ..c.clone() }
        })
    }

    pub fn remove_event(&self, path: EventPath) -> Draft {
        let Some(events) = self
            .company(path.company)
            .and_then(|c| remove_entry(&c.events, path.event))
        else {
            tracing::debug!("No event at {}/{} in draft, removal ignored", path.company, path.event);
            return self.clone();
        };
        self.update_company(path.company, |c| CompanyDraft {
            events,
            ..c.clone()
        })
    }

    pub fn push_source(&self, path: EventPath, source: SourceDocument) -> Draft {
        self.update_event(path, |e| {
            let mut sources = e.sources.clone();
            sources.push(Entry::new(source));
            EventDraft { sources, ..e.clone() }
        })
    }

    pub fn remove_source(&self, path: SourcePath) -> Draft {
        let Some(sources) = self
            .event(path.event_path())
            .and_then(|e| remove_entry(&e.sources, path.source))
        else {
            tracing::debug!("No source {} in draft, removal ignored", path.source);
            return self.clone();
        };
        self.update_event(path.event_path(), |e| EventDraft {
            sources,
            ..e.clone()
        })
    }

    pub fn patch_source(&self, path: SourcePath, patch: SourcePatch) -> Draft {
        self.update_source(path, |s| patch.apply(s))
    }

    /// Rebuilds one source document with `f`, sharing its siblings.
    pub fn update_source(
        &self,
        path: SourcePath,
        f: impl FnOnce(&SourceDocument) -> SourceDocument,
    ) -> Draft {
        let Some(sources) = self
            .event(path.event_path())
            .and_then(|e| replace_entry(&e.sources, path.source, f))
        else {
            tracing::debug!("No source {} in draft, edit ignored", path.source);
            return self.clone();
        };
        self.update_event(path.event_path(), |e| EventDraft {
            sources,
            ..e.clone()
        })
    }
}

/// True when the draft differs from the last persisted document.
pub fn has_changes(draft: &Draft, original: &DigestRoot) -> bool {
    !draft.matches(original)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_root() -> DigestRoot {
        let first = CompanyDigest::new(CompanyInfo::new("Acme")).with_events(vec![
            FundingEvent::empty().with_round("seed"),
            FundingEvent::empty().with_round("series-a"),
        ]);
        let mut second = CompanyDigest::new(CompanyInfo::new("Globex"));
        second.funding_events.push(FundingEvent {
            source_documents: vec![SourceDocument {
                url: Some("https://news.example/globex".to_string()),
                ..SourceDocument::empty()
            }],
            ..FundingEvent::empty()
        });
        DigestRoot::new(Some("March roundup".to_string()), vec![first, second])
    }

    #[test]
    fn test_roundtrip_preserves_document() {
        let root = sample_root();
        let draft = Draft::from_root(&root);
        assert_eq!(draft.to_root(), root);
        assert!(draft.matches(&root));
        assert!(!has_changes(&draft, &root));
    }

    #[test]
    fn test_keys_are_unique() {
        let draft = Draft::from_root(&sample_root());
        let a = draft.company_key(0).unwrap();
        let b = draft.company_key(1).unwrap();
        assert_ne!(a, b);
        assert!(draft.company_key(2).is_none());
    }

    #[test]
    fn test_patch_company_shares_untouched_entries() {
        let root = sample_root();
        let draft = Draft::from_root(&root);
        let key = draft.company_key(0).unwrap();

        let next = draft.patch_company(
            key,
            CompanyPatch {
                name: Some("Acme Labs".to_string()),
                ..CompanyPatch::default()
            },
        );

        assert_eq!(next.company(key).unwrap().company.name, "Acme Labs");
        assert_eq!(draft.company(key).unwrap().company.name, "Acme");
        assert!(next.companies()[1].shares(&draft.companies()[1]));
        assert!(!next.companies()[0].shares(&draft.companies()[0]));
        // events of the edited company are still shared
        assert!(next.company(key).unwrap().events[0].shares(&draft.company(key).unwrap().events[0]));
        assert!(has_changes(&next, &root));
        assert!(!has_changes(&draft, &root));
    }

    #[test]
    fn test_patch_event_keeps_siblings() {
        let draft = Draft::from_root(&sample_root());
        let path = draft.event_path(0, 1).unwrap();

        let next = draft.patch_event(
            path,
            EventPatch {
                amount: Some(AmountPatch {
                    value: Some(Some(AmountValue::Number(5.0))),
                    ..AmountPatch::default()
                }),
                ..EventPatch::default()
            },
        );

        let company = next.company(path.company).unwrap();
        assert!(company.events[0].shares(&draft.company(path.company).unwrap().events[0]));
        assert_eq!(
            next.event(path).unwrap().amount.as_ref().unwrap().value,
            Some(AmountValue::Number(5.0))
        );
        assert!(next.event(path).unwrap().investors.is_empty());
    }

    #[test]
    fn test_amount_patch_creates_missing_amount() {
        let amount = AmountPatch {
            currency: Some(Some("EUR".to_string())),
            ..AmountPatch::default()
        }
        .apply(None);

        assert_eq!(amount.currency.as_deref(), Some("EUR"));
        assert!(amount.value.is_none());
        assert!(amount.as_reported.is_none());
    }

    #[test]
    fn test_remove_event_reidentifies_nothing() {
        let draft = Draft::from_root(&sample_root());
        let first = draft.event_path(0, 0).unwrap();
        let second = draft.event_path(0, 1).unwrap();

        let next = draft.remove_event(first);
        let patched = next.patch_event(
            second,
            EventPatch {
                round: Some(Some("series-b".to_string())),
                ..EventPatch::default()
            },
        );

        let events = &patched.company(second.company).unwrap().events;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].key(), second.event);
        assert_eq!(events[0].value().round.as_deref(), Some("series-b"));
    }

    #[test]
    fn test_stale_key_is_noop() {
        let draft = Draft::from_root(&sample_root());
        let key = draft.company_key(0).unwrap();
        let removed = draft.remove_company(key);

        let next = removed.patch_company(
            key,
            CompanyPatch {
                name: Some("Ghost".to_string()),
                ..CompanyPatch::default()
            },
        );

        assert_eq!(next.companies().len(), 1);
        assert_eq!(next.to_root(), removed.to_root());
        assert!(next.companies()[0].shares(&removed.companies()[0]));
        assert!(next.same_as(&removed));
        assert!(!removed.same_as(&draft));
    }

    #[test]
    fn test_push_and_remove_source() {
        let draft = Draft::from_root(&sample_root());
        let path = draft.event_path(1, 0).unwrap();

        let next = draft.push_source(path, SourceDocument::empty());
        assert_eq!(next.event(path).unwrap().sources.len(), 2);

        let first = next.source_path(1, 0, 0).unwrap();
        let trimmed = next.remove_source(first);
        let sources = &trimmed.event(path).unwrap().sources;
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].value(), &SourceDocument::empty());
    }

    #[test]
    fn test_patch_source() {
        let draft = Draft::from_root(&sample_root());
        let path = draft.source_path(1, 0, 0).unwrap();

        let next = draft.patch_source(
            path,
            SourcePatch {
                title: Some(Some("Globex raises".to_string())),
                ..SourcePatch::default()
            },
        );

        let source = next.source(path).unwrap();
        assert_eq!(source.title.as_deref(), Some("Globex raises"));
        assert_eq!(source.url.as_deref(), Some("https://news.example/globex"));
        assert!(draft.source(path).unwrap().title.is_none());
    }

    #[test]
    fn test_summary_change_detected() {
        let root = sample_root();
        let draft = Draft::from_root(&root).with_summary(Some(String::new()));
        assert!(has_changes(&draft, &root));
        assert_eq!(draft.summary(), Some(""));
    }

    #[test]
    fn test_edit_back_to_original_is_clean() {
        let root = sample_root();
        let draft = Draft::from_root(&root);
        let key = draft.company_key(1).unwrap();
        let renamed = draft.patch_company(
            key,
            CompanyPatch {
                name: Some("Initech".to_string()),
                ..CompanyPatch::default()
            },
        );
        let restored = renamed.patch_company(
            key,
            CompanyPatch {
                name: Some("Globex".to_string()),
                ..CompanyPatch::default()
            },
        );

        assert!(has_changes(&renamed, &root));
        assert!(!has_changes(&restored, &root));
    }
}
