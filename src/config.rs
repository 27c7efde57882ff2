use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};

use crate::source::{DirectorySource, SheetsSource, TableSource, DEFAULT_SHEETS_URL};
use crate::store::TableNames;

const APP_NAME: &str = "ppserver";
const CONFIG_FILE: &str = "config.json";

/// Environment variable holding an OAuth bearer token for the Sheets API.
pub const SHEETS_TOKEN_ENV: &str = "PPSERVER_SHEETS_TOKEN";
/// Environment variable pointing at an alternative config file.
pub const CONFIG_PATH_ENV: &str = "PPSERVER_CONFIG";

pub const DEFAULT_PORT: u16 = 6149;
const DEFAULT_VIS_JS_URL: &str =
    "https://unpkg.com/vis-network@9.1.9/standalone/umd/vis-network.min.js";

/// One of the two campaign sheets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetConfig {
    /// Table name as known to the data source.
    pub name: String,
    /// Google spreadsheet id. Required for the sheets source.
    #[serde(default)]
    pub spreadsheet_id: Option<String>,
    /// Link shown on the page so players can edit the sheet.
    #[serde(default)]
    pub link: Option<String>,
}

impl SheetConfig {
    pub fn link(&self) -> Option<String> {
        self.link.clone().or_else(|| {
            self.spreadsheet_id
                .as_ref()
                .map(|id| format!("https://docs.google.com/spreadsheets/d/{}", id))
        })
    }
}

/// Where the raw tables come from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    Sheets {
        #[serde(default)]
        api_key: Option<String>,
        #[serde(default)]
        base_url: Option<String>,
    },
    Directory {
        path: PathBuf,
    },
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self::Sheets {
            api_key: None,
            base_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub characters: SheetConfig,
    pub relations: SheetConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default = "default_port")]
    pub port: u16,
    /// SQLite table cache. Defaults to the platform data directory.
    #[serde(default)]
    pub cache_path: Option<PathBuf>,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    /// Forced reloads allowed per client per minute.
    #[serde(default = "default_reload_rate_limit")]
    pub reload_rate_limit: u32,
    /// Identify reload clients by `X-Forwarded-For`/`X-Real-IP`. Only for
    /// deployments behind a reverse proxy.
    #[serde(default)]
    pub trust_proxy_headers: bool,
    #[serde(default = "default_vis_js_url")]
    pub vis_js_url: String,
    /// Directory served under `/static`.
    #[serde(default)]
    pub static_dir: Option<PathBuf>,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

fn default_reload_rate_limit() -> u32 {
    10
}

fn default_vis_js_url() -> String {
    DEFAULT_VIS_JS_URL.to_string()
}

impl AppConfig {
    /// Load from an explicit path, `$PPSERVER_CONFIG`, or the user's config
    /// directory, in that order. The sheet names have no defaults, so a
    /// missing file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match std::env::var_os(CONFIG_PATH_ENV) {
                Some(path) => PathBuf::from(path),
                None => get_config_path()?,
            },
        };
        Self::from_file(&path)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn table_names(&self) -> TableNames {
        TableNames::new(&self.relations.name, &self.characters.name)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn cache_path(&self) -> Result<PathBuf> {
        match &self.cache_path {
            Some(path) => Ok(path.clone()),
            None => crate::db::default_path(),
        }
    }

    /// Build the configured table source.
    pub fn table_source(&self) -> Result<Arc<dyn TableSource>> {
        match &self.source {
            SourceConfig::Directory { path } => Ok(Arc::new(DirectorySource::new(path))),
            SourceConfig::Sheets { api_key, base_url } => {
                let mut spreadsheets = HashMap::new();
                for sheet in [&self.relations, &self.characters] {
                    let id = sheet.spreadsheet_id.clone().ok_or_else(|| {
                        anyhow::anyhow!("Sheet {} has no spreadsheet_id", sheet.name)
                    })?;
                    spreadsheets.insert(sheet.name.clone(), id);
                }

                let token = std::env::var(SHEETS_TOKEN_ENV).ok();
                if api_key.is_none() && token.is_none() {
                    tracing::warn!(
                        "No Sheets API key or {} set, requests will be anonymous",
                        SHEETS_TOKEN_ENV
                    );
                }

                let source = SheetsSource::new(
                    base_url.as_deref().unwrap_or(DEFAULT_SHEETS_URL),
                    spreadsheets,
                )
                .with_api_key(api_key.clone())
                .with_token(token)
                .with_timeout(self.fetch_timeout())?;
                Ok(Arc::new(source))
            }
        }
    }
}

fn get_config_path() -> Result<PathBuf> {
    let mut path =
        config_dir().ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    path.push(APP_NAME);
    path.push(CONFIG_FILE);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_gets_defaults() {
        let config = AppConfig::from_json(
            r#"{
                "characters": {"name": "Characters", "spreadsheet_id": "abc"},
                "relations": {"name": "Relations", "spreadsheet_id": "def"}
            }"#,
        )
        .unwrap();

        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.fetch_timeout(), Duration::from_secs(30));
        assert_eq!(config.reload_rate_limit, 10);
        assert!(!config.trust_proxy_headers);
        assert!(matches!(config.source, SourceConfig::Sheets { .. }));
        assert_eq!(
            config.table_names().ordered(),
            vec!["Relations".to_string(), "Characters".to_string()]
        );
        assert_eq!(
            config.characters.link().as_deref(),
            Some("https://docs.google.com/spreadsheets/d/abc")
        );
    }

    #[test]
    fn missing_sheet_is_an_error() {
        let err = AppConfig::from_json(r#"{"characters": {"name": "Characters"}}"#).unwrap_err();
        assert!(err.to_string().contains("relations"));
    }

    #[test]
    fn directory_source_is_selected_by_kind() {
        let config = AppConfig::from_json(
            r#"{
                "characters": {"name": "characters", "link": "http://example.com/c"},
                "relations": {"name": "relations"},
                "source": {"kind": "directory", "path": "/tmp/campaign"}
            }"#,
        )
        .unwrap();

        assert!(matches!(config.source, SourceConfig::Directory { .. }));
        assert!(config.table_source().is_ok());
        assert_eq!(config.characters.link().as_deref(), Some("http://example.com/c"));
        assert!(config.relations.link().is_none());
    }

    #[test]
    fn sheets_source_requires_spreadsheet_ids() {
        let config = AppConfig::from_json(
            r#"{"characters": {"name": "c"}, "relations": {"name": "r"}}"#,
        )
        .unwrap();
        assert!(config.table_source().is_err());
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = AppConfig::from_file(Path::new("/nonexistent/ppserver.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/ppserver.json"));
    }
}
