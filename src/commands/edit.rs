//! Scripted editing of the latest digest.
//!
//! A script is a YAML list of steps. Steps address companies, events and
//! sources by position; positions are resolved against the draft as it is
//! when the step runs, so earlier removals shift later indices.
//!
//! ```yaml
//! - op: company
//!   company: 0
//!   edit: { country: Denmark }
//! - op: event
//!   company: 0
//!   event: 0
//!   edit: { value: "2500000" }
//! - op: remove_company
//!   company: 2
//! ```

use clap::Args;
use serde::Deserialize;
use std::path::PathBuf;

use fundigest::config::Config;
use fundigest_core::{
    CompanyEdit, Draft, Edit, EditorSession, EventEdit, HttpDigestClient, LoadOutcome, SourceEdit,
};

use super::OutputFormat;

/// Apply a script of edits to the latest digest and save it
#[derive(Args)]
pub struct EditCommand {
    /// YAML file with edit steps
    #[arg(long)]
    script: PathBuf,

    /// Show the resulting report without saving
    #[arg(long)]
    dry_run: bool,

    /// Output format for --dry-run
    #[arg(long, short, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Step {
    Summary {
        text: String,
    },
    AddCompany,
    RemoveCompany {
        company: usize,
    },
    Company {
        company: usize,
        edit: CompanyEdit,
    },
    AddEvent {
        company: usize,
    },
    RemoveEvent {
        company: usize,
        event: usize,
    },
    Event {
        company: usize,
        event: usize,
        edit: EventEdit,
    },
    AddSource {
        company: usize,
        event: usize,
    },
    RemoveSource {
        company: usize,
        event: usize,
        source: usize,
    },
    Source {
        company: usize,
        event: usize,
        source: usize,
        edit: SourceEdit,
    },
    Undo,
}

impl Step {
    /// Resolves positions to keys of `draft`. `Ok(None)` means undo.
    fn resolve(&self, draft: &Draft) -> Result<Option<Edit>, String> {
        let company = |i: usize| {
            draft
                .company_key(i)
                .ok_or_else(|| format!("no company at index {}", i))
        };
        let event = |c: usize, e: usize| {
            draft
                .event_path(c, e)
                .ok_or_else(|| format!("no event {} for company {}", e, c))
        };
        let source = |c: usize, e: usize, s: usize| {
            draft
                .source_path(c, e, s)
                .ok_or_else(|| format!("no source {} for event {} of company {}", s, e, c))
        };

        let edit = match self {
            Step::Summary { text } => Edit::Summary(text.clone()),
            Step::AddCompany => Edit::AddCompany,
            Step::RemoveCompany { company: c } => Edit::RemoveCompany(company(*c)?),
            Step::Company { company: c, edit } => Edit::Company(company(*c)?, edit.clone()),
            Step::AddEvent { company: c } => Edit::AddEvent(company(*c)?),
            Step::RemoveEvent { company: c, event: e } => Edit::RemoveEvent(event(*c, *e)?),
            Step::Event {
                company: c,
                event: e,
                edit,
            } => Edit::Event(event(*c, *e)?, edit.clone()),
            Step::AddSource { company: c, event: e } => Edit::AddSource(event(*c, *e)?),
            Step::RemoveSource {
                company: c,
                event: e,
                source: s,
            } => Edit::RemoveSource(source(*c, *e, *s)?),
            Step::Source {
                company: c,
                event: e,
                source: s,
                edit,
            } => Edit::Source(source(*c, *e, *s)?, edit.clone()),
            Step::Undo => return Ok(None),
        };
        Ok(Some(edit))
    }
}

fn parse_script(contents: &str) -> Result<Vec<Step>, serde_yaml::Error> {
    serde_yaml::from_str(contents)
}

/// Runs every step against the session's draft.
fn apply_steps(session: &mut EditorSession, steps: &[Step]) -> Result<(), String> {
    for (i, step) in steps.iter().enumerate() {
        let draft = session.draft().ok_or("No digest loaded")?;
        match step.resolve(draft) {
            Ok(Some(edit)) => session.apply(edit),
            Ok(None) => {
                if !session.undo() {
                    tracing::warn!("Step {}: nothing to undo", i + 1);
                }
            }
            Err(e) => return Err(format!("Step {}: {}", i + 1, e)),
        }
    }
    Ok(())
}

impl EditCommand {
    pub async fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(&self.script)
            .map_err(|e| format!("Failed to read '{}': {}", self.script.display(), e))?;
        let steps = parse_script(&contents)
            .map_err(|e| format!("Failed to parse '{}': {}", self.script.display(), e))?;

        let client = HttpDigestClient::new(config.server_url.value.as_str());
        let mut session = EditorSession::new();

        if session.load(&client).await != LoadOutcome::Applied {
            let error = session.error().unwrap_or("unknown error");
            return Err(format!("Failed to load digest: {}", error).into());
        }

        apply_steps(&mut session, &steps)?;

        if !session.is_dirty() {
            println!("No changes to save");
            return Ok(());
        }

        if self.dry_run {
            if let Some(view) = session.preview() {
                match self.format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&view)?),
                    OutputFormat::Text => println!("{}", view),
                }
            }
            return Ok(());
        }

        session.save(&client).await;
        if let Some(error) = session.error() {
            return Err(format!("Failed to save digest: {}", error).into());
        }

        println!(
            "Saved digest run {} ({} steps applied)",
            session.run_id().unwrap_or("-"),
            steps.len()
        );
        Ok(())
    }
}
