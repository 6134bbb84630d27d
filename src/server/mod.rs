//! HTTP service for reading and writing digests.

mod routes;

pub use routes::{app, AppState};
