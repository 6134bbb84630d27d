//! Editing session over the latest stored digest.
//!
//! The session keeps the persisted snapshot (`original`) next to the working
//! copy (`draft`). Loading and saving are split into a `begin_*` step that
//! decides whether the operation may start and a `finish_*` step that folds
//! the result back in, so callers can run the I/O however they like. Only
//! the most recent load may apply its result and only one save runs at a
//! time.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::api::{ApiError, DigestApi};
use crate::draft::{has_changes, Draft};
use crate::edit::Edit;
use crate::models::{DigestRecord, DigestRoot};
use crate::report::ReportView;

/// Number of drafts kept for undo.
pub const UNDO_LIMIT: usize = 100;

/// Marks one load request. Starting another load cancels the previous token.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    /// A newer load started before this one finished.
    Superseded,
    Failed,
}

/// What to send for a save.
#[derive(Debug, Clone)]
pub struct SaveRequest {
    pub data: DigestRoot,
    pub run_id: Option<String>,
}

#[derive(Debug, Default)]
pub struct EditorSession {
    original: Option<DigestRoot>,
    draft: Option<Draft>,
    run_id: Option<String>,
    saved_at: Option<DateTime<Utc>>,
    history: VecDeque<Draft>,
    load_token: Option<CancelToken>,
    loading: bool,
    saving: bool,
    error: Option<String>,
}

impl EditorSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn original(&self) -> Option<&DigestRoot> {
        self.original.as_ref()
    }

    pub fn draft(&self) -> Option<&Draft> {
        self.draft.as_ref()
    }

    pub fn run_id(&self) -> Option<&str> {
        self.run_id.as_deref()
    }

    pub fn saved_at(&self) -> Option<DateTime<Utc>> {
        self.saved_at
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    /// Starts a load, cancelling any load still in flight.
    pub fn begin_load(&mut self) -> CancelToken {
        if let Some(previous) = self.load_token.take() {
            previous.cancel();
        }
        let token = CancelToken::default();
        self.load_token = Some(token.clone());
        self.loading = true;
        self.error = None;
        token
    }

    /// Folds a load result into the session unless `token` was superseded.
    pub fn finish_load(
        &mut self,
        token: &CancelToken,
        result: Result<DigestRecord, ApiError>,
    ) -> LoadOutcome {
        if token.is_cancelled() {
            tracing::debug!("Discarding result of superseded load");
            return LoadOutcome::Superseded;
        }
        self.load_token = None;
        self.loading = false;

        match result {
            Ok(record) => {
                self.replace_snapshots(record);
                self.history.clear();
                LoadOutcome::Applied
            }
            Err(e) => {
                tracing::warn!("Failed to load digest: {}", e);
                self.error = Some(e.to_string());
                LoadOutcome::Failed
            }
        }
    }

    fn replace_snapshots(&mut self, record: DigestRecord) {
        self.draft = Some(Draft::from_root(&record.data));
        self.original = Some(record.data);
        self.run_id = record.run_id;
        self.saved_at = record.created_at;
    }

    /// Applies an edit to the draft. Does nothing before the first load.
    pub fn apply(&mut self, edit: Edit) {
        let Some(current) = self.draft.take() else {
            tracing::debug!("No draft loaded, edit ignored");
            return;
        };
        let next = current.apply(edit);
        if next.same_as(&current) {
            self.draft = Some(current);
            return;
        }
        self.history.push_back(current);
        if self.history.len() > UNDO_LIMIT {
            self.history.pop_front();
        }
        self.draft = Some(next);
    }

    /// Restores the draft as it was before the last edit.
    pub fn undo(&mut self) -> bool {
        match self.history.pop_back() {
            Some(previous) => {
                self.draft = Some(previous);
                true
            }
            None => false,
        }
    }

    pub fn is_dirty(&self) -> bool {
        match (&self.draft, &self.original) {
            (Some(draft), Some(original)) => has_changes(draft, original),
            _ => false,
        }
    }

    pub fn can_save(&self) -> bool {
        self.is_dirty() && !self.saving
    }

    /// Starts a save when there is something to save and no save is running.
    pub fn begin_save(&mut self) -> Option<SaveRequest> {
        if !self.can_save() {
            return None;
        }
        let draft = self.draft.as_ref()?;
        self.saving = true;
        self.error = None;
        Some(SaveRequest {
            data: draft.to_root(),
            run_id: self.run_id.clone(),
        })
    }

    pub fn finish_save(&mut self, result: Result<DigestRecord, ApiError>) {
        self.saving = false;
        match result {
            Ok(record) => {
                tracing::info!(
                    "Saved digest run {}",
                    record.run_id.as_deref().unwrap_or("-")
                );
                self.replace_snapshots(record);
                self.history.clear();
            }
            Err(e) => {
                tracing::warn!("Failed to save digest: {}", e);
                self.error = Some(e.to_string());
            }
        }
    }

    /// Loads the latest digest through `api`.
    pub async fn load(&mut self, api: &impl DigestApi) -> LoadOutcome {
        let token = self.begin_load();
        let result = api.fetch_latest().await;
        self.finish_load(&token, result)
    }

    /// Saves the draft through `api`. Returns `false` when no save started.
    pub async fn save(&mut self, api: &impl DigestApi) -> bool {
        let Some(request) = self.begin_save() else {
            return false;
        };
        let result = api.save(&request.data, request.run_id.as_deref()).await;
        self.finish_save(result);
        true
    }

    /// Report view of the current draft.
    pub fn preview(&self) -> Option<ReportView> {
        self.draft.as_ref().map(|d| ReportView::build(&d.to_root()))
    }
}
