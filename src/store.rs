//! Catalog storage: the seam between the engine and the database.
//!
//! The engine only needs three operations, all keyed by local id. The SQLite
//! implementation also carries the upsert used by ingestion.

use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use crate::error::{CatalogError, Result};
use crate::models::{FeedEntry, LocalId, TitleRecord};

/// Operations the deduplicator performs against the catalog.
pub trait CatalogStore {
    /// Every anime record with its current scene count.
    fn load_records(&self) -> Result<Vec<TitleRecord>>;

    /// Re-point all scenes of `from` to `to`. Returns the number moved.
    fn rebind_scenes(&mut self, from: LocalId, to: LocalId) -> Result<usize>;

    /// Delete one anime record. Fails with `StorageConflict` if it is gone.
    fn delete_record(&mut self, id: LocalId) -> Result<()>;
}

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS anime (
        id INTEGER PRIMARY KEY,
        mal_id INTEGER UNIQUE,
        title TEXT NOT NULL,
        title_jp TEXT,
        image_url TEXT,
        synopsis TEXT
    );

    CREATE TABLE IF NOT EXISTS scene (
        id INTEGER PRIMARY KEY,
        anime_id INTEGER NOT NULL REFERENCES anime(id),
        video_url TEXT NOT NULL DEFAULT '',
        day TEXT
    );

    CREATE INDEX IF NOT EXISTS idx_scene_anime ON scene(anime_id);
";

/// Anime catalog in a SQLite database.
pub struct SqliteCatalog {
    conn: Connection,
}

impl SqliteCatalog {
    pub fn open(path: &Path) -> Result<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Insert or update by MAL id, storing the record under `title`
    /// (the ingestion key, which may be colon-truncated).
    pub fn upsert_anime(&mut self, entry: &FeedEntry, title: &str) -> Result<LocalId> {
        let title_jp = entry.title_japanese.as_deref().filter(|s| !s.is_empty());
        let synopsis = entry.synopsis.as_deref().filter(|s| !s.is_empty());

        self.conn.execute(
            "INSERT INTO anime (mal_id, title, title_jp, image_url, synopsis)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(mal_id) DO UPDATE SET
                title = excluded.title,
                title_jp = COALESCE(excluded.title_jp, anime.title_jp),
                image_url = COALESCE(excluded.image_url, anime.image_url),
                synopsis = COALESCE(excluded.synopsis, anime.synopsis)",
            params![entry.mal_id, title, title_jp, entry.image_url(), synopsis],
        )?;

        let id = self.conn.query_row(
            "SELECT id FROM anime WHERE mal_id = ?1",
            [entry.mal_id],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// Insert a hand-curated record (admin panel path, no MAL id required).
    pub fn insert_anime(&mut self, title: &str, mal_id: Option<i64>) -> Result<LocalId> {
        if title.trim().is_empty() {
            return Err(CatalogError::InvalidInput("anime title is empty".to_string()));
        }
        self.conn.execute(
            "INSERT INTO anime (mal_id, title) VALUES (?1, ?2)",
            params![mal_id, title],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn insert_scene(&mut self, anime_id: LocalId, video_url: &str) -> Result<LocalId> {
        self.conn.execute(
            "INSERT INTO scene (anime_id, video_url) VALUES (?1, ?2)",
            params![anime_id, video_url],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn find_by_mal_id(&self, mal_id: i64) -> Result<Option<TitleRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT a.id, a.mal_id, a.title,
                        (SELECT COUNT(*) FROM scene s WHERE s.anime_id = a.id)
                 FROM anime a WHERE a.mal_id = ?1",
                [mal_id],
                row_to_record,
            )
            .optional()?;
        Ok(record)
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<TitleRecord> {
    let scenes: i64 = row.get(3)?;
    Ok(TitleRecord {
        local_id: Some(row.get(0)?),
        external_id: row.get(1)?,
        title: row.get(2)?,
        scene_count: scenes.max(0) as u32,
    })
}

impl CatalogStore for SqliteCatalog {
    fn load_records(&self) -> Result<Vec<TitleRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT a.id, a.mal_id, a.title, COUNT(s.id)
             FROM anime a
             LEFT JOIN scene s ON s.anime_id = a.id
             GROUP BY a.id
             ORDER BY a.id",
        )?;
        let records = stmt
            .query_map([], row_to_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    fn rebind_scenes(&mut self, from: LocalId, to: LocalId) -> Result<usize> {
        let exists: Option<i64> = self
            .conn
            .query_row("SELECT id FROM anime WHERE id = ?1", [to], |row| row.get(0))
            .optional()?;
        if exists.is_none() {
            return Err(CatalogError::StorageConflict {
                local_id: from,
                reason: format!("canonical anime {} no longer exists", to),
            });
        }
        let moved = self.conn.execute(
            "UPDATE scene SET anime_id = ?1 WHERE anime_id = ?2",
            params![to, from],
        )?;
        Ok(moved)
    }

    fn delete_record(&mut self, id: LocalId) -> Result<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM anime WHERE id = ?1", [id])
            .map_err(|e| CatalogError::StorageConflict {
                local_id: id,
                reason: e.to_string(),
            })?;
        if deleted == 0 {
            return Err(CatalogError::StorageConflict {
                local_id: id,
                reason: "record already gone".to_string(),
            });
        }
        Ok(())
    }
}
