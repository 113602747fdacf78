use chrono::{DateTime, Local};
use itertools::Itertools;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::app_dirs::AppDirs;
use crate::config::{Difficulty, Posture, SessionConfig};
use crate::error::{KickrError, Result};
use crate::session::SessionResult;

/// One finished session as stored in the history database
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub played_at: DateTime<Local>,
    pub posture: Posture,
    pub difficulty: Difficulty,
    pub duration: u32,
    pub total_kicks: u32,
    pub average_kick_time: f64,
    pub best_kick_time: f64,
    pub kick_times: Vec<f64>,
}

impl SessionRecord {
    pub fn new(config: &SessionConfig, result: &SessionResult, played_at: DateTime<Local>) -> Self {
        Self {
            played_at,
            posture: config.posture,
            difficulty: config.difficulty,
            duration: result.duration,
            total_kicks: result.total_kicks,
            average_kick_time: result.average_kick_time(),
            best_kick_time: result.best_kick_time(),
            kick_times: result.kick_times.clone(),
        }
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let played_at: String = row.get(0)?;
        let played_at = DateTime::parse_from_rfc3339(&played_at)
            .map_err(|_| {
                rusqlite::Error::InvalidColumnType(0, "played_at".to_string(), rusqlite::types::Type::Text)
            })?
            .with_timezone(&Local);
        let posture = match row.get::<_, String>(1)?.as_str() {
            "sitting" => Posture::Sitting,
            _ => Posture::Standing,
        };
        let kick_times: String = row.get(7)?;

        Ok(SessionRecord {
            played_at,
            posture,
            difficulty: Difficulty::from_level_clamped(row.get(2)?),
            duration: row.get(3)?,
            total_kicks: row.get(4)?,
            average_kick_time: row.get(5)?,
            best_kick_time: row.get(6)?,
            kick_times: serde_json::from_str(&kick_times).unwrap_or_default(),
        })
    }
}

/// Flat row for CSV export
#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    played_at: String,
    posture: String,
    difficulty: u8,
    duration_secs: u32,
    kicks: u32,
    average_kick_time: f64,
    best_kick_time: f64,
    kick_times: &'a str,
}

const SELECT_COLUMNS: &str = "played_at, posture, difficulty, duration, total_kicks, average_kick_time, best_kick_time, kick_times";

/// Database of finished sessions
#[derive(Debug)]
pub struct HistoryDb {
    conn: Connection,
}

impl HistoryDb {
    /// Opens the database under $HOME/.local/state/kickr, creating it if needed
    pub fn new() -> Result<Self> {
        let db_path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("kickr_history.db"));
        Self::open(db_path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = HistoryDb {
            conn: Connection::open(path)?,
        };
        db.create_schema()?;
        debug!(path = %path.display(), "history database opened");
        Ok(db)
    }

    pub fn in_memory() -> Result<Self> {
        let db = HistoryDb {
            conn: Connection::open_in_memory()?,
        };
        db.create_schema()?;
        Ok(db)
    }

    fn create_schema(&self) -> Result<()> {
        self.conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                played_at TEXT NOT NULL,
                posture TEXT NOT NULL,
                difficulty INTEGER NOT NULL,
                duration INTEGER NOT NULL,
                total_kicks INTEGER NOT NULL,
                average_kick_time REAL NOT NULL,
                best_kick_time REAL NOT NULL,
                kick_times TEXT NOT NULL
            )
            "#,
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_sessions_setup ON sessions(posture, difficulty, duration)",
            [],
        )?;

        Ok(())
    }

    pub fn record(&self, record: &SessionRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO sessions
            (played_at, posture, difficulty, duration, total_kicks, average_kick_time, best_kick_time, kick_times)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                record.played_at.to_rfc3339(),
                record.posture.to_string(),
                record.difficulty.level(),
                record.duration,
                record.total_kicks,
                record.average_kick_time,
                record.best_kick_time,
                serde_json::to_string(&record.kick_times)?,
            ],
        )?;
        info!(kicks = record.total_kicks, "session saved to history");
        Ok(())
    }

    /// Most recent sessions first
    pub fn recent(&self, limit: usize) -> Result<Vec<SessionRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM sessions ORDER BY played_at DESC, id DESC LIMIT ?1"
        ))?;
        // SQLite treats a negative LIMIT as unbounded
        let limit = i64::try_from(limit).unwrap_or(-1);
        let rows = stmt.query_map([limit], SessionRecord::from_row)?;

        let mut records = Vec::new();
        for record in rows {
            records.push(record?);
        }
        Ok(records)
    }

    /// Highest kick count recorded for the same posture, difficulty and length.
    pub fn personal_best(&self, config: &SessionConfig) -> Result<Option<u32>> {
        let best = self
            .conn
            .query_row(
                r#"
                SELECT MAX(total_kicks) FROM sessions
                WHERE posture = ?1 AND difficulty = ?2 AND duration = ?3
                "#,
                params![
                    config.posture.to_string(),
                    config.difficulty.level(),
                    config.duration_secs
                ],
                |row| row.get::<_, Option<u32>>(0),
            )
            .optional()?
            .flatten();
        Ok(best)
    }

    pub fn count(&self) -> Result<u64> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))?;
        Ok(n as u64)
    }

    /// Clear all history (for testing or reset purposes)
    pub fn clear_all(&self) -> Result<()> {
        self.conn.execute("DELETE FROM sessions", [])?;
        Ok(())
    }

    /// Writes every stored session, oldest first, as CSV.
    pub fn export_csv<W: std::io::Write>(&self, out: W) -> Result<usize> {
        let mut records = self.recent(usize::MAX)?;
        records.reverse();

        let mut writer = csv::Writer::from_writer(out);
        for record in &records {
            let kick_times = record.kick_times.iter().map(|t| format!("{t:.3}")).join(" ");
            writer.serialize(ExportRow {
                played_at: record.played_at.to_rfc3339(),
                posture: record.posture.to_string(),
                difficulty: record.difficulty.level(),
                duration_secs: record.duration,
                kicks: record.total_kicks,
                average_kick_time: record.average_kick_time,
                best_kick_time: record.best_kick_time,
                kick_times: &kick_times,
            })?;
        }
        writer.flush().map_err(KickrError::from)?;
        Ok(records.len())
    }
}
