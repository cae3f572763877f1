use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::{ReportQuery, ReportStore, StoreError, has_submission_date, sort_newest_first};
use crate::formats::{ProcessedReportRecord, StoredReport};

/// Store kept as one JSON object keyed by report id, rewritten on every upsert.
#[derive(Debug)]
pub struct JsonReportStore {
    path: PathBuf,
    reports: BTreeMap<String, StoredReport>,
}

impl JsonReportStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let reports = match std::fs::read(path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => BTreeMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "report store file not found; starting empty");
                BTreeMap::new()
            }
            Err(err) => return Err(err.into()),
        };
        Ok(Self {
            path: path.to_path_buf(),
            reports,
        })
    }

    fn records(&self) -> Vec<ProcessedReportRecord> {
        let mut records = self
            .reports
            .iter()
            .map(|(id, report)| report.clone().into_record(id.clone()))
            .collect::<Vec<_>>();
        sort_newest_first(&mut records);
        records
    }

    fn save(&self) -> Result<(), StoreError> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            Some(_) => PathBuf::from("."),
            None => return Err(StoreError::InvalidPath(self.path.display().to_string())),
        };
        std::fs::create_dir_all(&parent)?;

        let tmp_path = self
            .path
            .with_extension(format!("tmp.{}", uuid::Uuid::new_v4().simple()));
        let data = serde_json::to_vec_pretty(&self.reports)?;
        std::fs::write(&tmp_path, &data)?;
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl ReportStore for JsonReportStore {
    fn contains(&self, report_id: &str) -> Result<bool, StoreError> {
        Ok(self.reports.contains_key(report_id))
    }

    fn upsert(&mut self, record: &ProcessedReportRecord) -> Result<(), StoreError> {
        let previous = self
            .reports
            .insert(record.report_id.clone(), StoredReport::from(record));
        if let Err(err) = self.save() {
            match previous {
                Some(previous) => self.reports.insert(record.report_id.clone(), previous),
                None => self.reports.remove(&record.report_id),
            };
            return Err(err);
        }
        Ok(())
    }

    fn list_all(&self) -> Result<Vec<ProcessedReportRecord>, StoreError> {
        Ok(self.records())
    }

    fn search(&self, query: &ReportQuery) -> Result<Vec<ProcessedReportRecord>, StoreError> {
        Ok(self
            .records()
            .into_iter()
            .filter(|record| query.matches(record))
            .take(query.limit)
            .collect())
    }

    fn count_by_type(&self) -> Result<BTreeMap<String, u64>, StoreError> {
        let mut counts = BTreeMap::new();
        for report in self.reports.values() {
            let kind = report.report_type.clone().unwrap_or_default();
            *counts.entry(kind).or_insert(0) += 1;
        }
        Ok(counts)
    }

    fn latest_submission_reports(&self) -> Result<Vec<ProcessedReportRecord>, StoreError> {
        let records = self.records();
        let Some(latest) = records
            .iter()
            .map(|record| record.submission_date.as_str())
            .filter(|date| has_submission_date(date))
            .max()
            .map(str::to_owned)
        else {
            return Ok(Vec::new());
        };
        Ok(records
            .into_iter()
            .filter(|record| record.submission_date == latest)
            .collect())
    }
}
