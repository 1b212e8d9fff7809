use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{anyhow, bail, Context};
use chrono::{DateTime, SecondsFormat, Utc};
use intent_core::{CheckResult, CheckStatus, Evidence};
use rusqlite::{params, Connection};

const SELECT_COLUMNS: &str = "id, check_id, status, ts, severity, description, \
     evidence_json, suspected_causes_json, error";

/// A persisted result with its row id.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredResult {
    pub id: i64,
    pub result: CheckResult,
}

#[derive(Clone)]
pub struct Store {
    pub(crate) conn: Arc<Mutex<Connection>>,
}

impl Store {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open sqlite db {}", path.display()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory sqlite db")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn init_schema(&self) -> anyhow::Result<()> {
        let conn = self.conn()?;
        conn.execute_batch(crate::schema::DDL)
            .context("failed to apply schema")?;
        Ok(())
    }

    /// Append one result. Results without a check id are rejected.
    pub fn insert_result(&self, result: &CheckResult) -> anyhow::Result<i64> {
        if result.check_id.trim().is_empty() {
            bail!(
                "bad result payload (missing check_id): status={} ts={}",
                result.status,
                result.timestamp
            );
        }

        let evidence_json = serde_json::to_string(&result.evidence)?;
        let causes_json = serde_json::to_string(&result.suspected_causes)?;

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO intent_results
             (check_id, status, ts, severity, description, evidence_json, suspected_causes_json, error)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                result.check_id,
                result.status.as_str(),
                format_ts(&result.timestamp),
                result.severity,
                result.description,
                evidence_json,
                causes_json,
                result.error,
            ],
        )
        .context("failed to insert result")?;
        let id = conn.last_insert_rowid();
        tracing::debug!(check_id = %result.check_id, status = %result.status, id, "stored result");
        Ok(id)
    }

    /// Newest first, optionally for a single check.
    pub fn recent_results(
        &self,
        check_id: Option<&str>,
        limit: u32,
    ) -> anyhow::Result<Vec<StoredResult>> {
        let conn = self.conn()?;
        let raw = match check_id {
            Some(id) => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {SELECT_COLUMNS} FROM intent_results
                     WHERE check_id = ?1 ORDER BY ts DESC, id DESC LIMIT ?2"
                ))?;
                let rows = stmt.query_map(params![id, limit], RawRow::from_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {SELECT_COLUMNS} FROM intent_results
                     ORDER BY ts DESC, id DESC LIMIT ?1"
                ))?;
                let rows = stmt.query_map(params![limit], RawRow::from_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
        };
        raw.into_iter().map(RawRow::into_stored).collect()
    }

    /// The most recently inserted result of every check, ordered by check id.
    pub fn latest_per_check(&self) -> anyhow::Result<Vec<StoredResult>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM intent_results
             WHERE id IN (SELECT MAX(id) FROM intent_results GROUP BY check_id)
             ORDER BY check_id"
        ))?;
        let rows = stmt.query_map([], RawRow::from_row)?;
        let raw = rows.collect::<Result<Vec<_>, _>>()?;
        raw.into_iter().map(RawRow::into_stored).collect()
    }

    pub fn count(&self) -> anyhow::Result<u64> {
        let conn = self.conn()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM intent_results", [], |row| row.get(0))?;
        Ok(n as u64)
    }

    fn conn(&self) -> anyhow::Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("result store lock poisoned"))
    }
}

fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

struct RawRow {
    id: i64,
    check_id: String,
    status: String,
    ts: String,
    severity: Option<String>,
    description: Option<String>,
    evidence_json: Option<String>,
    causes_json: Option<String>,
    error: Option<String>,
}

impl RawRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            check_id: row.get(1)?,
            status: row.get(2)?,
            ts: row.get(3)?,
            severity: row.get(4)?,
            description: row.get(5)?,
            evidence_json: row.get(6)?,
            causes_json: row.get(7)?,
            error: row.get(8)?,
        })
    }

    fn into_stored(self) -> anyhow::Result<StoredResult> {
        let status = CheckStatus::parse(&self.status)
            .ok_or_else(|| anyhow!("row {}: unknown status {:?}", self.id, self.status))?;
        let timestamp = DateTime::parse_from_rfc3339(&self.ts)
            .with_context(|| format!("row {}: bad timestamp {:?}", self.id, self.ts))?
            .with_timezone(&Utc);
        let evidence: Evidence = match self.evidence_json.as_deref() {
            Some(s) if !s.trim().is_empty() => serde_json::from_str(s)
                .with_context(|| format!("row {}: bad evidence json", self.id))?,
            _ => Evidence::new(),
        };
        let suspected_causes: Vec<String> = match self.causes_json.as_deref() {
            Some(s) if !s.trim().is_empty() => serde_json::from_str(s)
                .with_context(|| format!("row {}: bad suspected_causes json", self.id))?,
            _ => Vec::new(),
        };

        Ok(StoredResult {
            id: self.id,
            result: CheckResult {
                check_id: self.check_id,
                description: self.description.unwrap_or_default(),
                severity: self.severity.unwrap_or_default(),
                status,
                timestamp,
                evidence,
                suspected_causes,
                error: self.error,
            },
        })
    }
}
