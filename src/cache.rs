//! Resolution cache
//!
//! Persists completed playlist resolutions so repeated runs skip the
//! expensive cascade. Advisory by contract: a missing or unreadable
//! entry is a cache miss, never an error.

use crate::error::SyncResult;
use crate::resolver::ResolvedPlaylist;
use rusqlite::{Connection, OptionalExtension};
use std::path::PathBuf;
use tracing::{debug, warn};

pub struct ResolutionCache {
    db_path: PathBuf,
}

impl ResolutionCache {
    pub fn new(db_path: PathBuf) -> SyncResult<Self> {
        let cache = Self { db_path };
        cache.init_db()?;
        Ok(cache)
    }

    fn init_db(&self) -> SyncResult<()> {
        if let Some(parent) = self.db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&self.db_path)?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS resolutions (
                playlist TEXT PRIMARY KEY,
                resolved_at TEXT NOT NULL,
                snapshot TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    /// Load a cached resolution by playlist name.
    ///
    /// Entries whose match is absent are filtered out before returning:
    /// a previous run's unresolved tracks are transient noise, not
    /// durable no-match records. Corrupt snapshots degrade to a miss.
    pub fn load(&self, name: &str) -> SyncResult<Option<ResolvedPlaylist>> {
        let conn = Connection::open(&self.db_path)?;
        let snapshot: Option<String> = conn
            .query_row(
                "SELECT snapshot FROM resolutions WHERE playlist = ?",
                [name],
                |row| row.get(0),
            )
            .optional()?;

        let Some(snapshot) = snapshot else {
            return Ok(None);
        };

        match serde_json::from_str::<ResolvedPlaylist>(&snapshot) {
            Ok(mut playlist) => {
                playlist.results.retain(|r| r.matched.is_some());
                debug!(
                    "Cache hit for '{}': {} resolved tracks",
                    name,
                    playlist.results.len()
                );
                Ok(Some(playlist))
            }
            Err(e) => {
                warn!("⚠️ Unreadable cache entry for '{}', recomputing: {}", name, e);
                Ok(None)
            }
        }
    }

    /// Persist a completed resolution, replacing any previous entry.
    pub fn save(&self, playlist: &ResolvedPlaylist) -> SyncResult<()> {
        let snapshot = serde_json::to_string(playlist)?;
        let conn = Connection::open(&self.db_path)?;
        conn.execute(
            "INSERT OR REPLACE INTO resolutions (playlist, resolved_at, snapshot)
             VALUES (?, ?, ?)",
            (
                &playlist.name,
                chrono::Local::now().to_rfc3339(),
                &snapshot,
            ),
        )?;
        Ok(())
    }

    /// Drop the cached entry for a playlist, forcing a rebuild next run.
    pub fn invalidate(&self, name: &str) -> SyncResult<()> {
        let conn = Connection::open(&self.db_path)?;
        let deleted = conn.execute("DELETE FROM resolutions WHERE playlist = ?", [name])?;
        if deleted > 0 {
            debug!("Invalidated cached resolution for '{}'", name);
        }
        Ok(())
    }
}
