use std::collections::BTreeMap;
use std::path::Path;

use rusqlite::{Connection, OptionalExtension, Row, params};

use super::{ReportQuery, ReportStore, StoreError};
use crate::filing::PLACEHOLDER;
use crate::formats::ProcessedReportRecord;

const COLUMNS: &str = "report_id, processed_at, target_company, security_code, report_type, \
                       holder_name, report_date, submission_date";

/// SQLite-backed store. Connections are not shared across threads.
pub struct SqliteReportStore {
    conn: Connection,
}

impl SqliteReportStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(include_str!("schema.sql"))?;
        Ok(Self { conn })
    }

    fn select(
        &self,
        sql: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<ProcessedReportRecord>, StoreError> {
        let mut stmt = self.conn.prepare(sql)?;
        let records = stmt
            .query_map(params, record_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<ProcessedReportRecord> {
    let text = |idx: usize| -> rusqlite::Result<String> {
        Ok(row.get::<_, Option<String>>(idx)?.unwrap_or_default())
    };
    Ok(ProcessedReportRecord {
        report_id: row.get(0)?,
        processed_at: text(1)?,
        target_company: text(2)?,
        security_code: text(3)?,
        report_type: text(4)?,
        holder_name: text(5)?,
        report_date: text(6)?,
        submission_date: text(7)?,
    })
}

impl ReportStore for SqliteReportStore {
    fn contains(&self, report_id: &str) -> Result<bool, StoreError> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM processed_reports WHERE report_id = ?1",
                params![report_id],
                |_| Ok(true),
            )
            .optional()?;
        Ok(found.unwrap_or(false))
    }

    fn upsert(&mut self, record: &ProcessedReportRecord) -> Result<(), StoreError> {
        self.conn.execute(
            &format!("INSERT OR REPLACE INTO processed_reports ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"),
            params![
                &record.report_id,
                &record.processed_at,
                &record.target_company,
                &record.security_code,
                &record.report_type,
                &record.holder_name,
                &record.report_date,
                &record.submission_date,
            ],
        )?;
        Ok(())
    }

    fn list_all(&self) -> Result<Vec<ProcessedReportRecord>, StoreError> {
        self.select(
            &format!(
                "SELECT {COLUMNS} FROM processed_reports ORDER BY processed_at DESC, report_id"
            ),
            &[],
        )
    }

    fn search(&self, query: &ReportQuery) -> Result<Vec<ProcessedReportRecord>, StoreError> {
        let mut sql = format!("SELECT {COLUMNS} FROM processed_reports WHERE 1=1");
        let mut values: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(code) = &query.security_code {
            sql.push_str(" AND COALESCE(security_code, '') = ?");
            values.push(Box::new(code.clone()));
        }
        if let Some(name) = &query.holder_name {
            sql.push_str(" AND instr(COALESCE(holder_name, ''), ?) > 0");
            values.push(Box::new(name.clone()));
        }
        if let Some(kind) = &query.report_type {
            sql.push_str(" AND COALESCE(report_type, '') = ?");
            values.push(Box::new(kind.clone()));
        }
        if let Some(company) = &query.target_company {
            sql.push_str(" AND instr(COALESCE(target_company, ''), ?) > 0");
            values.push(Box::new(company.clone()));
        }
        sql.push_str(" ORDER BY processed_at DESC, report_id LIMIT ?");
        values.push(Box::new(i64::try_from(query.limit).unwrap_or(i64::MAX)));

        let refs = values.iter().map(|v| v.as_ref()).collect::<Vec<_>>();
        self.select(&sql, &refs)
    }

    fn count_by_type(&self) -> Result<BTreeMap<String, u64>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT report_type, COUNT(*) FROM processed_reports GROUP BY report_type",
        )?;
        let counts = stmt
            .query_map([], |row| {
                let kind: Option<String> = row.get(0)?;
                let count: i64 = row.get(1)?;
                Ok((kind.unwrap_or_default(), count.max(0) as u64))
            })?
            .collect::<Result<BTreeMap<_, _>, _>>()?;
        Ok(counts)
    }

    fn latest_submission_reports(&self) -> Result<Vec<ProcessedReportRecord>, StoreError> {
        let latest: Option<String> = self.conn.query_row(
            "SELECT MAX(submission_date) FROM processed_reports \
             WHERE submission_date NOT IN ('', ?1)",
            params![PLACEHOLDER],
            |row| row.get(0),
        )?;
        let Some(latest) = latest else {
            return Ok(Vec::new());
        };
        self.select(
            &format!(
                "SELECT {COLUMNS} FROM processed_reports WHERE submission_date = ?1 \
                 ORDER BY processed_at DESC, report_id"
            ),
            &[&latest],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::{exercise_backend, exercise_matching_rules, record};

    #[test]
    fn in_memory_store_behaves_like_a_store() -> Result<(), StoreError> {
        let mut store = SqliteReportStore::open_in_memory()?;
        exercise_backend(&mut store)
    }

    #[test]
    fn search_is_literal_and_latest_skips_undated() -> Result<(), StoreError> {
        let mut store = SqliteReportStore::open_in_memory()?;
        exercise_matching_rules(&mut store)
    }

    #[test]
    fn records_survive_reopening() -> Result<(), StoreError> {
        let temp = tempfile::TempDir::new()?;
        let path = temp.path().join("reports.db");
        {
            let mut store = SqliteReportStore::open(&path)?;
            store.upsert(&record("id-1", "2025-04-11 09:00:00", "変更報告書", "甲", "d"))?;
        }
        let store = SqliteReportStore::open(&path)?;
        assert!(store.contains("id-1")?);
        Ok(())
    }

    #[test]
    fn null_columns_read_as_empty_text() -> Result<(), StoreError> {
        let store = SqliteReportStore::open_in_memory()?;
        store
            .conn
            .execute("INSERT INTO processed_reports (report_id) VALUES ('bare')", [])?;
        let all = store.list_all()?;
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].holder_name, "");
        assert_eq!(store.count_by_type()?.get(""), Some(&1));
        Ok(())
    }
}
