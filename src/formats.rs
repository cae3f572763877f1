use serde::{Deserialize, Serialize};

use crate::filing::{Field, NormalizedFiling};
use crate::normalize::FilingIdentity;

pub const PROCESSED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One processed filing as persisted by every store backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedReportRecord {
    pub report_id: String,
    pub processed_at: String,
    pub target_company: String,
    pub security_code: String,
    pub report_type: String,
    pub holder_name: String,
    pub report_date: String,
    pub submission_date: String,
}

impl ProcessedReportRecord {
    pub fn new(identity: &FilingIdentity, filing: &NormalizedFiling, processed_at: String) -> Self {
        Self {
            report_id: identity.as_str().to_owned(),
            processed_at,
            target_company: filing.display(Field::TargetCompany).to_owned(),
            security_code: filing.display(Field::SecurityCode).to_owned(),
            report_type: filing.kind().label().to_owned(),
            holder_name: filing.display(Field::HolderName).to_owned(),
            report_date: filing.display(Field::ReportDate).to_owned(),
            submission_date: filing.display(Field::SubmissionDate).to_owned(),
        }
    }
}

/// Record body of the JSON store, keyed externally by `report_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredReport {
    #[serde(default)]
    pub processed_at: Option<String>,
    #[serde(default)]
    pub target_company: Option<String>,
    #[serde(default)]
    pub security_code: Option<String>,
    #[serde(default)]
    pub report_type: Option<String>,
    #[serde(default)]
    pub holder_name: Option<String>,
    #[serde(default)]
    pub report_date: Option<String>,
    #[serde(default)]
    pub submission_date: Option<String>,
}

impl StoredReport {
    pub fn into_record(self, report_id: String) -> ProcessedReportRecord {
        let or_empty = |value: Option<String>| value.unwrap_or_default();
        ProcessedReportRecord {
            report_id,
            processed_at: or_empty(self.processed_at),
            target_company: or_empty(self.target_company),
            security_code: or_empty(self.security_code),
            report_type: or_empty(self.report_type),
            holder_name: or_empty(self.holder_name),
            report_date: or_empty(self.report_date),
            submission_date: or_empty(self.submission_date),
        }
    }
}

impl From<&ProcessedReportRecord> for StoredReport {
    fn from(record: &ProcessedReportRecord) -> Self {
        Self {
            processed_at: Some(record.processed_at.clone()),
            target_company: Some(record.target_company.clone()),
            security_code: Some(record.security_code.clone()),
            report_type: Some(record.report_type.clone()),
            holder_name: Some(record.holder_name.clone()),
            report_date: Some(record.report_date.clone()),
            submission_date: Some(record.submission_date.clone()),
        }
    }
}

/// Filing list response of the disclosure API.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentList {
    #[serde(default)]
    pub metadata: DocumentListMetadata,
    #[serde(default)]
    pub results: Vec<DocumentEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentListMetadata {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub resultset: Option<ResultSet>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResultSet {
    #[serde(default)]
    pub count: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentEntry {
    #[serde(rename = "docID")]
    pub doc_id: Option<String>,
    pub edinet_code: Option<String>,
    pub sec_code: Option<String>,
    pub filer_name: Option<String>,
    pub form_code: Option<String>,
    pub doc_description: Option<String>,
}

/// Webhook request body posted by the messaging platform.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub events: Vec<WebhookEvent>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub reply_token: Option<String>,
    #[serde(default)]
    pub source: Option<EventSource>,
    #[serde(default)]
    pub message: Option<EventMessage>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSource {
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
}
