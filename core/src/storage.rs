//! Save persistence layer.
//!
//! RULE: Only storage.rs talks to the database.
//! The engine reads and writes one envelope string per game id through the
//! [`SaveStorage`] trait; it never executes SQL directly.

use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;

use crate::error::GameResult;

/// Single-key string storage for save envelopes, mirroring the host
/// key-value store the game persists into.
pub trait SaveStorage {
    fn read(&self, key: &str) -> GameResult<Option<String>>;
    fn write(&mut self, key: &str, envelope: &str) -> GameResult<()>;
    fn delete(&mut self, key: &str) -> GameResult<()>;
}

pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Open (or create) the save database at `path`.
    pub fn open(path: &str) -> GameResult<Self> {
        let conn = Connection::open(path)?;
        // WAL mode: the UI process may read while a save is in flight.
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        let storage = Self { conn };
        storage.migrate()?;
        Ok(storage)
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> GameResult<Self> {
        let storage = Self {
            conn: Connection::open_in_memory()?,
        };
        storage.migrate()?;
        Ok(storage)
    }

    fn migrate(&self) -> GameResult<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS save (
                game_id  TEXT PRIMARY KEY,
                envelope TEXT NOT NULL,
                saved_at INTEGER NOT NULL
            );",
        )?;
        Ok(())
    }
}

impl SaveStorage for SqliteStorage {
    fn read(&self, key: &str) -> GameResult<Option<String>> {
        let envelope = self
            .conn
            .query_row(
                "SELECT envelope FROM save WHERE game_id = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(envelope)
    }

    fn write(&mut self, key: &str, envelope: &str) -> GameResult<()> {
        let saved_at = chrono::Utc::now().timestamp_millis();
        self.conn.execute(
            "INSERT INTO save (game_id, envelope, saved_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(game_id) DO UPDATE SET envelope = ?2, saved_at = ?3",
            params![key, envelope, saved_at],
        )?;
        Ok(())
    }

    fn delete(&mut self, key: &str) -> GameResult<()> {
        self.conn
            .execute("DELETE FROM save WHERE game_id = ?1", params![key])?;
        Ok(())
    }
}

/// Plain map-backed storage for tests and headless runs.
#[derive(Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SaveStorage for MemoryStorage {
    fn read(&self, key: &str) -> GameResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, envelope: &str) -> GameResult<()> {
        self.entries.insert(key.to_string(), envelope.to_string());
        Ok(())
    }

    fn delete(&mut self, key: &str) -> GameResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}
