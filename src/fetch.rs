use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use chrono::{Local, NaiveDate};

use crate::archive::UnzipSummary;
use crate::cli::{ApiArgs, FetchArgs, GlobalArgs};
use crate::formats::{DocumentEntry, DocumentList};

const LIST_TYPE_WITH_METADATA: &str = "2";
const DOCUMENT_TYPE_ARCHIVE: &str = "1";
const STATUS_OK: &str = "200";

/// Client for the disclosure API's document list and download endpoints.
#[derive(Debug, Clone)]
pub struct DisclosureClient {
    client: reqwest::Client,
    base: String,
    api_key: Option<String>,
    delay: Duration,
}

impl DisclosureClient {
    pub fn new(args: &ApiArgs) -> anyhow::Result<Self> {
        let parsed = url::Url::parse(&args.api_base)
            .with_context(|| format!("parse api base: {}", args.api_base))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            anyhow::bail!("api base must be http/https: {}", args.api_base);
        }

        Ok(Self {
            client: reqwest::Client::new(),
            base: args.api_base.trim_end_matches('/').to_owned(),
            api_key: args.api_key.clone().filter(|key| !key.trim().is_empty()),
            delay: Duration::from_millis(args.request_delay_ms),
        })
    }

    fn get(&self, endpoint: &str) -> reqwest::RequestBuilder {
        let request = self.client.get(endpoint);
        match &self.api_key {
            Some(key) => request.query(&[("Subscription-Key", key.as_str())]),
            None => request,
        }
    }

    /// Every document filed on `date`.
    pub async fn list_documents(&self, date: NaiveDate) -> anyhow::Result<Vec<DocumentEntry>> {
        tokio::time::sleep(self.delay).await;

        let endpoint = format!("{}/documents.json", self.base);
        let date = date.format("%Y-%m-%d").to_string();
        let response = self
            .get(&endpoint)
            .query(&[("date", date.as_str()), ("type", LIST_TYPE_WITH_METADATA)])
            .send()
            .await
            .with_context(|| format!("GET {endpoint}"))?;

        let status = response.status();
        let raw = response.text().await.context("read document list body")?;
        if !status.is_success() {
            anyhow::bail!("document list request failed ({status}): {raw}");
        }

        let list: DocumentList = serde_json::from_str(&raw).context("parse document list")?;
        if list.metadata.status.as_deref() != Some(STATUS_OK) {
            anyhow::bail!(
                "document list returned status {}: {}",
                list.metadata.status.as_deref().unwrap_or("none"),
                list.metadata.message.as_deref().unwrap_or("")
            );
        }
        tracing::info!(
            %date,
            count = list.results.len(),
            reported = list.metadata.resultset.as_ref().map_or(0, |set| set.count),
            "listed documents"
        );
        Ok(list.results)
    }

    /// Raw zip archive of one document.
    pub async fn download(&self, doc_id: &str) -> anyhow::Result<Vec<u8>> {
        tokio::time::sleep(self.delay).await;

        let endpoint = format!("{}/documents/{doc_id}", self.base);
        let response = self
            .get(&endpoint)
            .query(&[("type", DOCUMENT_TYPE_ARCHIVE)])
            .send()
            .await
            .with_context(|| format!("GET {endpoint}"))?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            anyhow::bail!("document download failed ({status}): {raw}");
        }
        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("read document body: {doc_id}"))?;
        Ok(bytes.to_vec())
    }
}

/// Which filer's documents to keep.
#[derive(Debug, Clone)]
pub struct TargetFilter {
    pub code: String,
    pub name: String,
}

impl TargetFilter {
    pub fn from_args(args: &ApiArgs) -> Self {
        Self {
            code: args.target_code.clone(),
            name: args.target_name.clone(),
        }
    }

    pub fn matches(&self, entry: &DocumentEntry) -> bool {
        let code_matches = entry.edinet_code.as_deref() == Some(self.code.as_str());
        let name_matches = !self.name.is_empty()
            && entry
                .filer_name
                .as_deref()
                .is_some_and(|name| name.contains(&self.name));
        code_matches || name_matches
    }
}

#[derive(Debug, Default)]
pub struct FetchSummary {
    pub listed: usize,
    pub matched: usize,
    pub downloaded: Vec<PathBuf>,
    pub failed: usize,
    pub unzip: UnzipSummary,
}

/// Downloads every matching document for `date` into `download_dir` and unpacks it.
///
/// A failing download is logged and counted; it never aborts the batch.
pub async fn fetch_filings(
    api: &ApiArgs,
    date: NaiveDate,
    download_dir: &Path,
) -> anyhow::Result<FetchSummary> {
    let client = DisclosureClient::new(api)?;
    let filter = TargetFilter::from_args(api);

    std::fs::create_dir_all(download_dir)
        .with_context(|| format!("create download dir: {}", download_dir.display()))?;

    let documents = client.list_documents(date).await?;
    let mut summary = FetchSummary {
        listed: documents.len(),
        ..FetchSummary::default()
    };

    for entry in documents.iter().filter(|entry| filter.matches(entry)) {
        summary.matched += 1;
        let Some(doc_id) = entry.doc_id.as_deref().filter(|id| is_safe_doc_id(id)) else {
            tracing::warn!(doc_id = ?entry.doc_id, "skipping document with unusable id");
            summary.failed += 1;
            continue;
        };

        tracing::info!(
            doc_id,
            filer = entry.filer_name.as_deref().unwrap_or(""),
            description = entry.doc_description.as_deref().unwrap_or(""),
            "downloading document"
        );
        match save_archive(&client, doc_id, download_dir).await {
            Ok(path) => summary.downloaded.push(path),
            Err(err) => {
                tracing::error!(doc_id, ?err, "failed to download document");
                summary.failed += 1;
            }
        }
    }

    summary.unzip = tokio::task::block_in_place(|| crate::archive::unzip_all(download_dir))?;
    tracing::info!(
        listed = summary.listed,
        matched = summary.matched,
        downloaded = summary.downloaded.len(),
        failed = summary.failed,
        "fetched filings"
    );
    Ok(summary)
}

async fn save_archive(
    client: &DisclosureClient,
    doc_id: &str,
    download_dir: &Path,
) -> anyhow::Result<PathBuf> {
    let bytes = client.download(doc_id).await?;
    let path = download_dir.join(format!("{doc_id}.zip"));
    tokio::fs::write(&path, &bytes)
        .await
        .with_context(|| format!("write archive: {}", path.display()))?;
    Ok(path)
}

fn is_safe_doc_id(doc_id: &str) -> bool {
    !doc_id.is_empty() && doc_id.chars().all(|c| c.is_ascii_alphanumeric())
}

pub fn resolve_date(date: Option<NaiveDate>) -> NaiveDate {
    date.unwrap_or_else(|| Local::now().date_naive())
}

pub async fn run(global: &GlobalArgs, args: FetchArgs) -> anyhow::Result<()> {
    let date = resolve_date(args.date);
    let summary = fetch_filings(&args.api, date, &global.download_dir).await?;
    eprintln!(
        "{date}: {} listed, {} matched, {} downloaded, {} failed, {} extracted",
        summary.listed,
        summary.matched,
        summary.downloaded.len(),
        summary.failed,
        summary.unzip.extracted
    );
    Ok(())
}
