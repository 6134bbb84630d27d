mod company;
mod digest;
mod funding;

pub use company::{CompanyDigest, CompanyInfo, Location};
pub use digest::{DigestRecord, DigestRoot, PLACEHOLDER_SUMMARY};
pub use funding::{Amount, AmountValue, FundingEvent, Investor, SourceDocument};
