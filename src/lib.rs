//! Fundigest: storage, HTTP service and configuration for funding digests.

pub mod config;
pub mod db;
pub mod server;
