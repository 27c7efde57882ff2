//! SQLite-backed table cache.
//!
//! Fetched tables survive restarts so the server can come up without a
//! round-trip to the spreadsheet service. A forced reload invalidates the
//! cached copies.

mod schema;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::Connection;

use crate::models::RawTable;
use crate::source::TableCache;

/// A cached table together with the time it was fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedTable {
    pub name: String,
    pub table: RawTable,
    pub fetched_at: DateTime<Utc>,
}

pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Cache path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)
            .with_context(|| format!("Failed to open cache at {}", path.display()))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_default() -> Result<Self> {
        Self::open(default_path()?)
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        schema::run_migrations(&conn)
    }

    pub fn get_cached_table(&self, name: &str) -> Result<Option<CachedTable>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt =
            conn.prepare("SELECT name, payload, fetched_at FROM table_cache WHERE name = ?")?;

        let mut rows = stmt.query([name])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };

        let payload: String = row.get(1)?;
        let table: RawTable = serde_json::from_str(&payload)
            .with_context(|| format!("Corrupt cache entry for {}", name))?;

        Ok(Some(CachedTable {
            name: row.get(0)?,
            table,
            fetched_at: parse_datetime(row.get::<_, String>(2)?),
        }))
    }

    pub fn put_cached_table(&self, name: &str, table: &RawTable) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        conn.execute(
            "INSERT INTO table_cache (name, payload, fetched_at) VALUES (?, ?, ?)
             ON CONFLICT(name) DO UPDATE SET payload = excluded.payload, fetched_at = excluded.fetched_at",
            (name, serde_json::to_string(table)?, Utc::now().to_rfc3339()),
        )?;
        Ok(())
    }

    /// Returns the number of entries removed.
    pub fn delete_cached_tables(&self, names: &[String]) -> Result<usize> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut removed = 0;
        for name in names {
            removed += conn.execute("DELETE FROM table_cache WHERE name = ?", [name])?;
        }
        Ok(removed)
    }

    pub fn clear_cache(&self) -> Result<usize> {
        let conn = self.conn.lock().expect("database lock poisoned");
        Ok(conn.execute("DELETE FROM table_cache", [])?)
    }

    pub fn cached_table_names(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare("SELECT name FROM table_cache ORDER BY name")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }
}

impl TableCache for Database {
    fn get(&self, name: &str) -> Result<Option<RawTable>> {
        Ok(self.get_cached_table(name)?.map(|cached| cached.table))
    }

    fn put(&self, name: &str, table: &RawTable) -> Result<()> {
        self.put_cached_table(name, table)
    }

    fn invalidate(&self, names: &[String]) -> Result<()> {
        self.delete_cached_tables(names).map(|_| ())
    }

    fn clear(&self) -> Result<()> {
        self.clear_cache().map(|_| ())
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}

/// `<data_dir>/cache.db` for this application.
pub fn default_path() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", "ppserver")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    Ok(dirs.data_dir().join("cache.db"))
}

fn parse_datetime(s: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
