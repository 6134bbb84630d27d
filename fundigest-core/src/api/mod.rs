//! Access to the digest HTTP service.

mod client;
mod error;

use std::future::Future;

use crate::models::{DigestRecord, DigestRoot};

pub use client::HttpDigestClient;
pub use error::ApiError;

/// Load and save operations against a digest store.
pub trait DigestApi {
    /// Fetches the most recent digest record.
    fn fetch_latest(&self) -> impl Future<Output = Result<DigestRecord, ApiError>> + Send;

    /// Stores a digest, under `run_id` when given, and returns the stored
    /// record.
    fn save(
        &self,
        data: &DigestRoot,
        run_id: Option<&str>,
    ) -> impl Future<Output = Result<DigestRecord, ApiError>> + Send;
}
