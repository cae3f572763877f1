//! Persisted set of processed filings.
//!
//! Every backend stores the same [`ProcessedReportRecord`] shape keyed by the
//! filing identity, so switching backends never changes which filings are new.

use std::collections::BTreeMap;
use std::path::Path;

use thiserror::Error;

use crate::cli::StoreBackend;
use crate::filing::PLACEHOLDER;
use crate::formats::ProcessedReportRecord;

mod json;
mod sqlite;

pub use json::JsonReportStore;
pub use sqlite::SqliteReportStore;

pub const DEFAULT_SEARCH_LIMIT: usize = 100;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("store file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid store path: {0}")]
    InvalidPath(String),
}

/// Filter for [`ReportStore::search`]. Unset criteria match everything.
#[derive(Debug, Clone)]
pub struct ReportQuery {
    pub security_code: Option<String>,
    /// Case-sensitive literal substring match.
    pub holder_name: Option<String>,
    pub report_type: Option<String>,
    /// Case-sensitive literal substring match.
    pub target_company: Option<String>,
    pub limit: usize,
}

impl Default for ReportQuery {
    fn default() -> Self {
        Self {
            security_code: None,
            holder_name: None,
            report_type: None,
            target_company: None,
            limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}

/// Empty and placeholder submission dates never count as "latest".
pub(crate) fn has_submission_date(date: &str) -> bool {
    !date.is_empty() && date != PLACEHOLDER
}

impl ReportQuery {
    pub fn matches(&self, record: &ProcessedReportRecord) -> bool {
        self.security_code
            .as_deref()
            .is_none_or(|code| record.security_code == code)
            && self
                .holder_name
                .as_deref()
                .is_none_or(|name| record.holder_name.contains(name))
            && self
                .report_type
                .as_deref()
                .is_none_or(|kind| record.report_type == kind)
            && self
                .target_company
                .as_deref()
                .is_none_or(|company| record.target_company.contains(company))
    }
}

pub trait ReportStore {
    fn contains(&self, report_id: &str) -> Result<bool, StoreError>;

    /// Insert-or-replace keyed by `record.report_id`.
    fn upsert(&mut self, record: &ProcessedReportRecord) -> Result<(), StoreError>;

    /// Every record, most recently processed first.
    fn list_all(&self) -> Result<Vec<ProcessedReportRecord>, StoreError>;

    fn search(&self, query: &ReportQuery) -> Result<Vec<ProcessedReportRecord>, StoreError>;

    fn count_by_type(&self) -> Result<BTreeMap<String, u64>, StoreError>;

    /// Records sharing the greatest stored submission date.
    fn latest_submission_reports(&self) -> Result<Vec<ProcessedReportRecord>, StoreError>;
}

/// Opens the configured backend at `path`, creating it when missing.
pub fn open(backend: StoreBackend, path: &Path) -> Result<Box<dyn ReportStore>, StoreError> {
    let store: Box<dyn ReportStore> = match backend {
        StoreBackend::Sqlite => Box::new(SqliteReportStore::open(path)?),
        StoreBackend::Json => Box::new(JsonReportStore::open(path)?),
    };
    tracing::info!(?backend, path = %path.display(), "opened report store");
    Ok(store)
}

/// Copies every record of `from` into `to`, returning how many were written.
pub fn copy_all(from: &dyn ReportStore, to: &mut dyn ReportStore) -> Result<usize, StoreError> {
    let records = from.list_all()?;
    for record in &records {
        to.upsert(record)?;
    }
    Ok(records.len())
}

pub(crate) fn sort_newest_first(records: &mut [ProcessedReportRecord]) {
    records.sort_by(|a, b| {
        b.processed_at
            .cmp(&a.processed_at)
            .then_with(|| a.report_id.cmp(&b.report_id))
    });
}
