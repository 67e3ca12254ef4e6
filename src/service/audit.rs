//! Append-only audit log of lookup attempts, plus the pure reporting
//! helpers (date filtering, counting reducers, CSV export) the admin
//! surface is built from.

use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::db::models::DbQueryLog;
use crate::db::sqlite::Storage;
use crate::error::GradeError;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Result summary recorded when a CAS number is not in the dataset.
pub const NOT_FOUND_SUMMARY: &str = "未找到结果";

/// CSV export header, matching the legacy log layout.
pub const EXPORT_HEADER: [&str; 5] = ["用户名", "CAS号", "使用用途", "查询时间", "查询结果"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryLogEntry {
    pub username: String,
    pub cas_number: String,
    pub usage_purpose: String,
    pub queried_at: String,
    pub result_summary: String,
}

impl From<DbQueryLog> for QueryLogEntry {
    fn from(row: DbQueryLog) -> Self {
        Self {
            username: row.username,
            cas_number: row.cas_number,
            usage_purpose: row.usage_purpose,
            queried_at: row.queried_at,
            result_summary: row.result_summary,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateCount {
    pub date: NaiveDate,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserCount {
    pub username: String,
    pub count: u64,
}

#[derive(Clone)]
pub struct AuditService {
    storage: Storage,
}

impl AuditService {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Append one entry with a server-assigned timestamp. A storage error
    /// is returned, never swallowed; the caller decides whether the
    /// triggering action still counts as complete.
    pub async fn append(
        &self,
        username: &str,
        cas_number: &str,
        result_summary: &str,
        usage_purpose: &str,
    ) -> Result<(), GradeError> {
        let queried_at = Local::now().format(TIMESTAMP_FORMAT).to_string();
        self.storage
            .append_log(username, cas_number, usage_purpose, &queried_at, result_summary)
            .await
    }

    /// All entries in insertion (== chronological) order.
    pub async fn load_all(&self) -> Result<Vec<QueryLogEntry>, GradeError> {
        let rows = self.storage.list_logs().await?;
        Ok(rows.into_iter().map(QueryLogEntry::from).collect())
    }
}

fn entry_date(entry: &QueryLogEntry) -> Option<NaiveDate> {
    NaiveDateTime::parse_from_str(&entry.queried_at, TIMESTAMP_FORMAT)
        .ok()
        .map(|dt| dt.date())
}

/// Keep entries whose calendar date falls in `start..=end` (inclusive on
/// both ends; time of day is ignored). Entries with an unparseable
/// timestamp are dropped from the filtered view.
pub fn filter_by_date_range(
    entries: Vec<QueryLogEntry>,
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<QueryLogEntry> {
    entries
        .into_iter()
        .filter(|e| entry_date(e).is_some_and(|d| start <= d && d <= end))
        .collect()
}

pub fn aggregate_by_date(entries: &[QueryLogEntry]) -> Vec<DateCount> {
    let mut counts: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for entry in entries {
        if let Some(date) = entry_date(entry) {
            *counts.entry(date).or_default() += 1;
        }
    }
    counts
        .into_iter()
        .map(|(date, count)| DateCount { date, count })
        .collect()
}

pub fn aggregate_by_user(entries: &[QueryLogEntry]) -> Vec<UserCount> {
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    for entry in entries {
        *counts.entry(entry.username.clone()).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(username, count)| UserCount { username, count })
        .collect()
}

/// Render entries as UTF-8 CSV with the legacy header.
pub fn export_csv(entries: &[QueryLogEntry]) -> Result<Vec<u8>, GradeError> {
    let mut buf = Vec::new();
    {
        let mut writer = csv::Writer::from_writer(&mut buf);
        writer.write_record(EXPORT_HEADER)?;
        for e in entries {
            writer.write_record([
                &e.username,
                &e.cas_number,
                &e.usage_purpose,
                &e.queried_at,
                &e.result_summary,
            ])?;
        }
        writer.flush()?;
    }
    Ok(buf)
}
