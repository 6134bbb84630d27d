use clap::Args;
use std::path::PathBuf;

use fundigest::config::Config;
use fundigest_core::{DigestApi, HttpDigestClient, ReportView};

use super::{read_digest_file, OutputFormat};

/// Render the digest report
#[derive(Args)]
pub struct ReportCommand {
    /// Read the digest from a JSON file instead of the server
    #[arg(long)]
    file: Option<PathBuf>,

    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    format: OutputFormat,
}

fn render(view: &ReportView, format: OutputFormat) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(view),
        OutputFormat::Text => Ok(view.to_string()),
    }
}

impl ReportCommand {
    pub async fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let root = match &self.file {
            Some(path) => read_digest_file(path)?.0,
            None => {
                let client = HttpDigestClient::new(config.server_url.value.as_str());
                client.fetch_latest().await?.data
            }
        };

        println!("{}", render(&ReportView::build(&root), self.format)?);
        Ok(())
    }
}
