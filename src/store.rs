//! The campaign store: owns the reload lifecycle and serves immutable
//! snapshots to readers.
//!
//! A reload builds a complete [`Snapshot`] off to the side and publishes it
//! with a single pointer swap. Readers holding the previous snapshot keep
//! seeing it in full; a failed reload publishes nothing.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{relations_from_table, PersonRegistry, RawTable, Relation};
use crate::render::{render_graph, render_roster};
use crate::source::{SourceError, TableCache, TableSource};

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Source of "now" for the reload timestamp.
#[cfg_attr(test, mockall::automock)]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Names of the two tables, as known to the data source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNames {
    pub relations: String,
    pub characters: String,
}

impl TableNames {
    pub fn new(relations: impl Into<String>, characters: impl Into<String>) -> Self {
        Self {
            relations: relations.into(),
            characters: characters.into(),
        }
    }

    /// Fetch order: relations first, then characters.
    pub fn ordered(&self) -> Vec<String> {
        vec![self.relations.clone(), self.characters.clone()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreState {
    Empty,
    Loaded,
}

/// Summary of a snapshot for status displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub state: StoreState,
    pub persons: usize,
    pub connections: usize,
    pub last_reload: DateTime<Utc>,
    pub unresolved: Vec<String>,
}

/// Everything a reader needs, published as one value.
#[derive(Debug, Clone)]
pub struct Snapshot {
    persons: PersonRegistry,
    relations: Vec<Relation>,
    last_reload: DateTime<Utc>,
    state: StoreState,
}

impl Snapshot {
    pub fn empty(last_reload: DateTime<Utc>) -> Self {
        Self {
            persons: PersonRegistry::new(),
            relations: Vec::new(),
            last_reload,
            state: StoreState::Empty,
        }
    }

    pub fn from_tables(
        relations: &RawTable,
        characters: &RawTable,
        last_reload: DateTime<Utc>,
    ) -> Self {
        Self {
            persons: PersonRegistry::from_table(characters),
            relations: relations_from_table(relations),
            last_reload,
            state: StoreState::Loaded,
        }
    }

    pub fn persons(&self) -> &PersonRegistry {
        &self.persons
    }

    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    pub fn last_reload(&self) -> DateTime<Utc> {
        self.last_reload
    }

    pub fn state(&self) -> StoreState {
        self.state
    }

    pub fn person_count(&self) -> usize {
        self.persons.len()
    }

    pub fn connection_count(&self) -> usize {
        self.relations.len()
    }

    pub fn graph_document(&self) -> String {
        render_graph(&self.relations, &self.persons)
    }

    pub fn roster_html(&self) -> String {
        render_roster(&self.persons)
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            state: self.state,
            persons: self.person_count(),
            connections: self.connection_count(),
            last_reload: self.last_reload,
            unresolved: self.unresolved_keys(),
        }
    }

    /// Relation endpoints with no character sheet entry, in first-appearance order.
    pub fn unresolved_keys(&self) -> Vec<String> {
        let mut missing: Vec<String> = Vec::new();
        for relation in &self.relations {
            for key in [&relation.actor, &relation.target] {
                if !self.persons.contains(key) && !missing.contains(key) {
                    missing.push(key.clone());
                }
            }
        }
        missing
    }
}

pub struct CampaignStore {
    source: Arc<dyn TableSource>,
    cache: Arc<dyn TableCache>,
    clock: Arc<dyn Clock>,
    tables: TableNames,
    fetch_timeout: Duration,
    current: RwLock<Arc<Snapshot>>,
    reload_lock: tokio::sync::Mutex<()>,
}

impl CampaignStore {
    /// An empty store. Nothing is fetched until [`CampaignStore::reload`].
    pub fn new(
        source: Arc<dyn TableSource>,
        cache: Arc<dyn TableCache>,
        tables: TableNames,
    ) -> Self {
        Self::with_clock(source, cache, tables, Arc::new(SystemClock))
    }

    pub fn with_clock(
        source: Arc<dyn TableSource>,
        cache: Arc<dyn TableCache>,
        tables: TableNames,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let created_at = clock.now();
        Self {
            source,
            cache,
            clock,
            tables,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            current: RwLock::new(Arc::new(Snapshot::empty(created_at))),
            reload_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn tables(&self) -> &TableNames {
        &self.tables
    }

    /// The current snapshot. Stays valid and unchanged across later reloads.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.current
            .read()
            .expect("snapshot lock poisoned")
            .clone()
    }

    pub fn state(&self) -> StoreState {
        self.snapshot().state()
    }

    pub fn graph_document(&self) -> String {
        self.snapshot().graph_document()
    }

    pub fn roster_html(&self) -> String {
        self.snapshot().roster_html()
    }

    pub fn person_count(&self) -> usize {
        self.snapshot().person_count()
    }

    pub fn connection_count(&self) -> usize {
        self.snapshot().connection_count()
    }

    /// Time of the last forced reload, or of construction if there was none.
    pub fn last_reload(&self) -> DateTime<Utc> {
        self.snapshot().last_reload()
    }

    /// Fetch both tables and publish a new snapshot.
    ///
    /// `force` drops the cached tables first and moves the reload timestamp.
    /// On failure the current snapshot stays in place.
    pub async fn reload(&self, force: bool) -> Result<(), SourceError> {
        let _guard = self.reload_lock.lock().await;
        let names = self.tables.ordered();

        if force {
            if let Err(e) = self.cache.invalidate(&names) {
                tracing::warn!("Failed to invalidate table cache: {:#}", e);
            }
        }

        let tables = self.fetch(&names).await?;
        let [relations, characters]: [RawTable; 2] = tables.try_into().map_err(
            |tables: Vec<RawTable>| {
                SourceError::Malformed(format!("expected 2 tables, got {}", tables.len()))
            },
        )?;

        let last_reload = if force {
            self.clock.now()
        } else {
            self.snapshot().last_reload()
        };
        let next = Snapshot::from_tables(&relations, &characters, last_reload);

        tracing::info!(
            "Loaded {} persons and {} connections{}",
            next.person_count(),
            next.connection_count(),
            if force { " (forced)" } else { "" }
        );

        *self.current.write().expect("snapshot lock poisoned") = Arc::new(next);
        Ok(())
    }

    async fn fetch(&self, names: &[String]) -> Result<Vec<RawTable>, SourceError> {
        if let Some(tables) = self.cached(names) {
            tracing::debug!("Serving {:?} from cache", names);
            return Ok(tables);
        }

        let tables = tokio::time::timeout(self.fetch_timeout, self.source.fetch_tables(names))
            .await
            .map_err(|_| SourceError::Timeout(self.fetch_timeout.as_secs()))??;

        if tables.len() != names.len() {
            return Err(SourceError::Malformed(format!(
                "requested {} tables, got {}",
                names.len(),
                tables.len()
            )));
        }

        for (name, table) in names.iter().zip(&tables) {
            if let Err(e) = self.cache.put(name, table) {
                tracing::warn!("Failed to cache table {}: {:#}", name, e);
            }
        }
        Ok(tables)
    }

    /// All requested tables from the cache, or `None` if any is missing.
    fn cached(&self, names: &[String]) -> Option<Vec<RawTable>> {
        let mut tables = Vec::with_capacity(names.len());
        for name in names {
            match self.cache.get(name) {
                Ok(Some(table)) => tables.push(table),
                Ok(None) => return None,
                Err(e) => {
                    tracing::warn!("Failed to read cached table {}: {:#}", name, e);
                    return None;
                }
            }
        }
        Some(tables)
    }
}
