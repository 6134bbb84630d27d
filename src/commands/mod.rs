use clap::ValueEnum;
use std::path::Path;

use fundigest_core::{parse_write_body, DigestRoot};

mod config_cmd;
mod edit;
mod push;
mod report;

pub use config_cmd::ConfigCommand;
pub use edit::EditCommand;
pub use push::PushCommand;
pub use report::ReportCommand;

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Reads a digest file: either a bare document or a record with `data` and
/// an optional `run_id`, such as the output of `GET /api/digest`.
fn read_digest_file(path: &Path) -> Result<(DigestRoot, Option<String>), Box<dyn std::error::Error>> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read '{}': {}", path.display(), e))?;
    let value = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse '{}': {}", path.display(), e))?;
    let parsed = parse_write_body(value)
        .map_err(|e| format!("Invalid digest in '{}': {}", path.display(), e))?;
    Ok(parsed)
}
