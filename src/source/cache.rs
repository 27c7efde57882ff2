use std::collections::HashMap;
use std::sync::Mutex;

use crate::models::RawTable;

use super::TableCache;

/// Process-local cache. Lost on restart.
#[derive(Debug, Default)]
pub struct MemoryCache {
    tables: Mutex<HashMap<String, RawTable>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TableCache for MemoryCache {
    fn get(&self, name: &str) -> anyhow::Result<Option<RawTable>> {
        let tables = self.tables.lock().expect("cache lock poisoned");
        Ok(tables.get(name).cloned())
    }

    fn put(&self, name: &str, table: &RawTable) -> anyhow::Result<()> {
        let mut tables = self.tables.lock().expect("cache lock poisoned");
        tables.insert(name.to_string(), table.clone());
        Ok(())
    }

    fn invalidate(&self, names: &[String]) -> anyhow::Result<()> {
        let mut tables = self.tables.lock().expect("cache lock poisoned");
        for name in names {
            tables.remove(name);
        }
        Ok(())
    }

    fn clear(&self) -> anyhow::Result<()> {
        self.tables.lock().expect("cache lock poisoned").clear();
        Ok(())
    }
}
