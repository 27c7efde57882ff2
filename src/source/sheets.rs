//! Google Sheets source.
//!
//! Each table name maps to a spreadsheet id; the first worksheet of that
//! spreadsheet is fetched through the Sheets v4 values endpoint. Credentials:
//! - an API key (`key` query parameter) for link-shared sheets
//! - an OAuth bearer token, e.g. a service-account access token

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::models::RawTable;

use super::{SourceError, TableSource};

pub const DEFAULT_SHEETS_URL: &str = "https://sheets.googleapis.com/v4";

/// A range without a sheet title addresses the first worksheet.
const FIRST_WORKSHEET: &str = "A:ZZ";

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct SheetsSource {
    base_url: String,
    api_key: Option<String>,
    token: Option<String>,
    spreadsheets: HashMap<String, String>,
    client: Client,
}

impl SheetsSource {
    /// `spreadsheets` maps table names to spreadsheet ids.
    pub fn new(base_url: impl Into<String>, spreadsheets: HashMap<String, String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            token: None,
            spreadsheets,
            client: Client::new(),
        }
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    /// Per-request timeout. The store applies its own overall deadline too.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, SourceError> {
        self.client = Client::builder().timeout(timeout).build()?;
        Ok(self)
    }

    fn request(&self, spreadsheet_id: &str) -> reqwest::RequestBuilder {
        let url = format!(
            "{}/spreadsheets/{}/values/{}",
            self.base_url, spreadsheet_id, FIRST_WORKSHEET
        );
        let mut req = self.client.get(&url);
        if let Some(ref key) = self.api_key {
            req = req.query(&[("key", key)]);
        }
        if let Some(ref token) = self.token {
            req = req.bearer_auth(token);
        }
        req
    }

    async fn fetch_table(&self, name: &str) -> Result<RawTable, SourceError> {
        let spreadsheet_id = self
            .spreadsheets
            .get(name)
            .ok_or_else(|| SourceError::MissingTable(name.to_string()))?;

        tracing::debug!("Fetching {} from Google Sheets", name);
        let response = self.request(spreadsheet_id).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SourceError::Auth(body),
                StatusCode::NOT_FOUND => SourceError::MissingTable(name.to_string()),
                _ => SourceError::Service(format!("{}: {}", status, body)),
            });
        }

        let range: ValueRange = response.json().await?;
        tracing::debug!("Done fetching {} ({} lines)", name, range.values.len());
        Ok(RawTable::from_grid(range.values))
    }
}

#[async_trait]
impl TableSource for SheetsSource {
    async fn fetch_tables(&self, names: &[String]) -> Result<Vec<RawTable>, SourceError> {
        let mut tables = Vec::with_capacity(names.len());
        for name in names {
            tables.push(self.fetch_table(name).await?);
        }
        Ok(tables)
    }
}
