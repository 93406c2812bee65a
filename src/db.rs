use std::path::Path;

use anyhow::Result;
use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;

pub const DB_PATH: &str = "data/sat_scores.sqlite";

pub fn connect(path: &Path) -> Result<Connection> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    let conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS college_scores (
            id              INTEGER PRIMARY KEY,
            college_name    TEXT UNIQUE NOT NULL,
            sat_total_25th  INTEGER,
            sat_total_50th  INTEGER,
            sat_total_75th  INTEGER,
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );
        ",
    )
}

// ── Records ──

/// Composite SAT totals for one institution. `None` means unavailable and is
/// stored as NULL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstitutionRecord {
    pub name: String,
    pub score_25th: Option<u32>,
    pub score_50th: Option<u32>,
    pub score_75th: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    /// A row with the same name already exists; nothing was written.
    Skipped,
}

pub fn find_by_name(conn: &Connection, name: &str) -> rusqlite::Result<Option<InstitutionRecord>> {
    conn.query_row(
        "SELECT college_name, sat_total_25th, sat_total_50th, sat_total_75th
         FROM college_scores WHERE college_name = ?1",
        [name],
        |row| {
            Ok(InstitutionRecord {
                name: row.get(0)?,
                score_25th: row.get(1)?,
                score_50th: row.get(2)?,
                score_75th: row.get(3)?,
            })
        },
    )
    .optional()
}

pub fn insert_record(conn: &Connection, record: &InstitutionRecord) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO college_scores (college_name, sat_total_25th, sat_total_50th, sat_total_75th)
         VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![
            record.name,
            record.score_25th,
            record.score_50th,
            record.score_75th,
        ],
    )?;
    Ok(())
}

/// Store `record` unless its name is already present. The first stored row
/// for a name is never overwritten. Assumes a single writer.
pub fn upsert(conn: &Connection, record: &InstitutionRecord) -> rusqlite::Result<UpsertOutcome> {
    let tx = conn.unchecked_transaction()?;
    if find_by_name(&tx, &record.name)?.is_some() {
        return Ok(UpsertOutcome::Skipped);
    }
    insert_record(&tx, record)?;
    tx.commit()?;
    Ok(UpsertOutcome::Inserted)
}

// ── Overview ──

pub fn fetch_overview(conn: &Connection, limit: usize) -> Result<Vec<InstitutionRecord>> {
    let mut stmt = conn.prepare(
        "SELECT college_name, sat_total_25th, sat_total_50th, sat_total_75th
         FROM college_scores
         ORDER BY sat_total_50th IS NULL, sat_total_50th DESC, college_name
         LIMIT ?1",
    )?;
    let rows = stmt
        .query_map([limit as i64], |row| {
            Ok(InstitutionRecord {
                name: row.get(0)?,
                score_25th: row.get(1)?,
                score_50th: row.get(2)?,
                score_75th: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Stats ──

pub struct Stats {
    pub total: usize,
    pub complete: usize,
    pub no_data: usize,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let total: usize = conn.query_row("SELECT COUNT(*) FROM college_scores", [], |r| r.get(0))?;
    let complete: usize = conn.query_row(
        "SELECT COUNT(*) FROM college_scores
         WHERE sat_total_25th IS NOT NULL
           AND sat_total_50th IS NOT NULL
           AND sat_total_75th IS NOT NULL",
        [],
        |r| r.get(0),
    )?;
    let no_data: usize = conn.query_row(
        "SELECT COUNT(*) FROM college_scores
         WHERE sat_total_25th IS NULL
           AND sat_total_50th IS NULL
           AND sat_total_75th IS NULL",
        [],
        |r| r.get(0),
    )?;
    Ok(Stats {
        total,
        complete,
        no_data,
    })
}
