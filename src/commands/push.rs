use clap::Args;
use std::path::PathBuf;

use fundigest::config::Config;
use fundigest_core::{DigestApi, HttpDigestClient};

use super::{read_digest_file, OutputFormat};

/// Upload a digest file to the server
#[derive(Args)]
pub struct PushCommand {
    /// Digest JSON file (a bare document or `{data, run_id}`)
    file: PathBuf,

    /// Store under this run id instead of the file's or a new one
    #[arg(long)]
    run_id: Option<String>,

    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    format: OutputFormat,
}

impl PushCommand {
    pub async fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let (data, file_run_id) = read_digest_file(&self.file)?;
        let run_id = self.run_id.clone().or(file_run_id);

        let client = HttpDigestClient::new(config.server_url.value.as_str());
        let record = client.save(&data, run_id.as_deref()).await?;

        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&record)?);
            }
            OutputFormat::Text => {
                println!(
                    "Saved digest run {} ({} companies, {} funding events)",
                    record.run_id.as_deref().unwrap_or("-"),
                    record.data.company_funding_digests.len(),
                    record.data.event_count()
                );
            }
        }
        Ok(())
    }
}
