//! Local SQLite persistence for the application state.

pub mod error;
pub mod schema;

use std::path::Path;
use std::sync::{Mutex, PoisonError};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use sentences_core::{PersistenceError, StateGateway};

pub use error::DbError;

type Result<T> = std::result::Result<T, DbError>;

/// State gateway backed by a single-row SQLite table.
pub struct SqliteGateway {
    conn: Mutex<Connection>,
}

impl SqliteGateway {
    /// Open database at path, creating it and its directory if necessary.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::initialize(Connection::open(path)?)
    }

    /// Open in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        Self::initialize(Connection::open_in_memory()?)
    }

    fn initialize(conn: Connection) -> Result<Self> {
        conn.execute_batch(schema::SCHEMA)?;
        conn.execute(
            "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
            params![schema::SCHEMA_VERSION],
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn read(&self) -> Result<Option<Value>> {
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let payload: Option<String> = conn
            .query_row("SELECT payload FROM app_state WHERE id = 1", [], |row| {
                row.get(0)
            })
            .optional()?;

        payload
            .map(|text| {
                serde_json::from_str(&text).map_err(|e| DbError::InvalidData(e.to_string()))
            })
            .transpose()
    }

    fn write(&self, payload: &Value) -> Result<()> {
        let version = payload.get("version").and_then(Value::as_i64).unwrap_or(0);
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        conn.execute(
            "INSERT INTO app_state (id, version, payload, saved_at) VALUES (1, ?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET
                 version = excluded.version, payload = excluded.payload, saved_at = excluded.saved_at",
            params![version, payload.to_string(), Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}

impl StateGateway for SqliteGateway {
    fn load_raw(&self) -> std::result::Result<Option<Value>, PersistenceError> {
        Ok(self.read()?)
    }

    fn save_raw(&self, payload: &Value) -> std::result::Result<(), PersistenceError> {
        Ok(self.write(payload)?)
    }
}
