//! Fundigest Core Library
//!
//! Digest model, statistics, report view and draft editing shared by the
//! Fundigest CLI and server.

pub mod api;
pub mod coerce;
pub mod draft;
pub mod edit;
pub mod editor;
pub mod models;
pub mod report;
pub mod schema;
pub mod stats;

pub use api::{ApiError, DigestApi, HttpDigestClient};
pub use coerce::{amount_to_number, format_currency_short, format_date, month_label};
pub use draft::{has_changes, Draft, EntryKey, EventPath, SourcePath};
pub use edit::{CompanyEdit, Edit, EventEdit, SourceEdit};
pub use editor::{CancelToken, EditorSession, LoadOutcome, SaveRequest};
pub use models::{
    Amount, AmountValue, CompanyDigest, CompanyInfo, DigestRecord, DigestRoot, FundingEvent,
    Investor, Location, SourceDocument, PLACEHOLDER_SUMMARY,
};
pub use report::{CompanyCard, ReportView};
pub use schema::{parse_digest_root, parse_write_body, SchemaError};
pub use stats::{compute_stats, DigestStats, TopInvestor};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
