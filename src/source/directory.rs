use std::path::PathBuf;

use async_trait::async_trait;

use crate::models::RawTable;

use super::{SourceError, TableSource};

/// Reads tables from `<dir>/<name>.json`, each a JSON array of rows with the
/// header row first. Handy for play-testing without spreadsheet access.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn table_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", name))
    }
}

#[async_trait]
impl TableSource for DirectorySource {
    async fn fetch_tables(&self, names: &[String]) -> Result<Vec<RawTable>, SourceError> {
        let mut tables = Vec::with_capacity(names.len());
        for name in names {
            let path = self.table_path(name);
            tracing::debug!("Reading {} from {}", name, path.display());

            let content = match tokio::fs::read_to_string(&path).await {
                Ok(content) => content,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Err(SourceError::MissingTable(name.clone()));
                }
                Err(e) => return Err(e.into()),
            };

            let grid: Vec<Vec<String>> = serde_json::from_str(&content)
                .map_err(|e| SourceError::Malformed(format!("{}: {}", path.display(), e)))?;
            tables.push(RawTable::from_grid(grid));
        }
        Ok(tables)
    }
}
