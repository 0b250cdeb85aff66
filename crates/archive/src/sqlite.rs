use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{params, Connection};
use tracing::debug;

use crate::{ArchiveError, NewOutfit, OutfitStore, SavedOutfit};

/// Layout shared with SQLite's `CURRENT_TIMESTAMP`, plus microseconds so
/// rows written in the same second still sort by time.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Outfit store over a single SQLite connection.
pub struct SqliteOutfitStore {
    conn: Mutex<Connection>,
}

impl SqliteOutfitStore {
    /// Open (or create) the database file at `path` and ensure the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ArchiveError> {
        let conn = Connection::open(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "archive_open");
        Self::with_connection(conn)
    }

    /// Database that lives as long as the store.
    pub fn open_in_memory() -> Result<Self, ArchiveError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, ArchiveError> {
        migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn migrate(conn: &Connection) -> Result<(), ArchiveError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS saved_outfits (
            id                 INTEGER PRIMARY KEY AUTOINCREMENT,
            top_image          TEXT,
            top_description    TEXT,
            bottom_image       TEXT,
            bottom_description TEXT,
            score              REAL,
            prompt             TEXT,
            created_at         TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        );
        ",
    )?;
    Ok(())
}

/// Read back a `created_at` value. Accepts our own layout, SQLite's default
/// `CURRENT_TIMESTAMP` text, and RFC 3339.
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, ArchiveError> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| ArchiveError::InvalidTimestamp(raw.to_string()))
}

struct Row {
    id: i64,
    top_image: Option<String>,
    top_description: Option<String>,
    bottom_image: Option<String>,
    bottom_description: Option<String>,
    score: Option<f64>,
    prompt: Option<String>,
    created_at: Option<String>,
}

impl OutfitStore for SqliteOutfitStore {
    fn save(&self, outfit: &NewOutfit) -> Result<i64, ArchiveError> {
        let created_at = Utc::now().format(TIMESTAMP_FORMAT).to_string();
        let conn = self.conn();
        conn.execute(
            "INSERT INTO saved_outfits (
                top_image, top_description, bottom_image, bottom_description,
                score, prompt, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                outfit.top_image,
                outfit.top_description,
                outfit.bottom_image,
                outfit.bottom_description,
                outfit.score.map(f64::from),
                outfit.prompt,
                created_at,
            ],
        )?;
        let id = conn.last_insert_rowid();
        debug!(id, "outfit_saved");
        Ok(id)
    }

    fn list_all(&self) -> Result<Vec<SavedOutfit>, ArchiveError> {
        let rows = {
            let conn = self.conn();
            let mut stmt = conn.prepare(
                "SELECT id, top_image, top_description, bottom_image, bottom_description,
                        score, prompt, created_at
                 FROM saved_outfits
                 ORDER BY created_at DESC, id DESC",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(Row {
                        id: row.get(0)?,
                        top_image: row.get(1)?,
                        top_description: row.get(2)?,
                        bottom_image: row.get(3)?,
                        bottom_description: row.get(4)?,
                        score: row.get(5)?,
                        prompt: row.get(6)?,
                        created_at: row.get(7)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };

        rows.into_iter()
            .map(|row| {
                let created_at = match row.created_at.as_deref() {
                    Some(raw) => parse_timestamp(raw)?,
                    None => return Err(ArchiveError::InvalidTimestamp(String::new())),
                };
                Ok(SavedOutfit {
                    id: row.id,
                    top_image: row.top_image,
                    top_description: row.top_description,
                    bottom_image: row.bottom_image,
                    bottom_description: row.bottom_description,
                    score: row.score.map(|s| s as f32),
                    prompt: row.prompt,
                    created_at,
                })
            })
            .collect()
    }

    fn clear(&self) -> Result<usize, ArchiveError> {
        let removed = self.conn().execute("DELETE FROM saved_outfits", [])?;
        debug!(removed, "saved_outfits_cleared");
        Ok(removed)
    }
}
