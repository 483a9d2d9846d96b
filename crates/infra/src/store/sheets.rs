//! Google Sheets record store (values API v4).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, Url};
use serde::Deserialize;
use serde_json::{Value, json};

use toolcrib_core::{AliasKey, Entity};
use toolcrib_inventory::InventoryRecord;

use crate::ports::{RecordStore, StoreError};
use crate::sheet_rows::{self, SheetLayout};

pub const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Inventory (and optionally catalog) rows kept in spreadsheet tabs.
///
/// Upserts read the inventory tab once per batch to find rows by name and resolve the
/// header layout, then send at most two writes: one `values:batchUpdate` for rows
/// that already exist and one `:append` for the rest.
#[derive(Debug, Clone)]
pub struct SheetsRecordStore {
    client: reqwest::Client,
    base_url: Url,
    spreadsheet_id: String,
    access_token: String,
    inventory_tab: String,
    catalog_tab: Option<String>,
}

impl SheetsRecordStore {
    pub fn new(
        spreadsheet_id: impl Into<String>,
        access_token: impl Into<String>,
        inventory_tab: impl Into<String>,
    ) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| StoreError::Unavailable(format!("http client setup failed: {e}")))?;
        let base_url = Url::parse(DEFAULT_BASE_URL)
            .map_err(|e| StoreError::Unavailable(format!("invalid base url: {e}")))?;
        Ok(Self {
            client,
            base_url,
            spreadsheet_id: spreadsheet_id.into(),
            access_token: access_token.into(),
            inventory_tab: inventory_tab.into(),
            catalog_tab: None,
        })
    }

    /// Blank tab names mean no catalog.
    pub fn with_catalog_tab(mut self, tab: Option<String>) -> Self {
        self.catalog_tab = tab.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, StoreError> {
        self.base_url =
            Url::parse(base_url).map_err(|e| StoreError::Unavailable(format!("invalid base url: {e}")))?;
        Ok(self)
    }

    /// `.../{spreadsheet}/{segments...}` with every segment percent-encoded.
    fn spreadsheet_url(&self, segments: &[&str]) -> Result<Url, StoreError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::Unavailable("base url cannot carry a path".to_string()))?
            .pop_if_empty()
            .push(&self.spreadsheet_id)
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, method: Method, url: Url, body: Option<Value>) -> Result<Value, StoreError> {
        let mut req = self.client.request(method, url).bearer_auth(&self.access_token);
        if let Some(body) = body {
            req = req.json(&body);
        }

        let resp = req.send().await.map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(StoreError::Api {
                status: status.as_u16(),
                message: resp.text().await.unwrap_or_default(),
            });
        }

        resp.json().await.map_err(|e| StoreError::Api {
            status: status.as_u16(),
            message: format!("unreadable response body: {e}"),
        })
    }

    async fn read_tab(&self, tab: &str) -> Result<Vec<Vec<Value>>, StoreError> {
        let url = self.spreadsheet_url(&["values", &quoted(tab)])?;
        let body = self.send(Method::GET, url, None).await?;
        let range: ValueRange = serde_json::from_value(body).map_err(|e| StoreError::Api {
            status: 200,
            message: format!("unexpected values payload: {e}"),
        })?;
        Ok(range.values)
    }

    /// Overwrite existing rows, keyed by 1-based sheet row, in a single request.
    async fn update_rows(&self, rows: Vec<(usize, Vec<Value>)>) -> Result<(), StoreError> {
        let tab = quoted(&self.inventory_tab);
        let data: Vec<Value> = rows
            .into_iter()
            .map(|(row, cells)| {
                let last = sheet_rows::column_letters(cells.len().saturating_sub(1));
                json!({ "range": format!("{tab}!A{row}:{last}{row}"), "values": [cells] })
            })
            .collect();
        let url = self.spreadsheet_url(&["values:batchUpdate"])?;
        self.send(Method::POST, url, Some(json!({ "valueInputOption": "RAW", "data": data })))
            .await
            .map(|_| ())
    }

    async fn append_rows(&self, rows: Vec<Vec<Value>>) -> Result<(), StoreError> {
        let mut url = self.spreadsheet_url(&["values", &format!("{}:append", quoted(&self.inventory_tab))])?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "RAW")
            .append_pair("insertDataOption", "INSERT_ROWS");
        self.send(Method::POST, url, Some(json!({ "values": rows })))
            .await
            .map(|_| ())
    }
}

/// A1-notation tab reference; quotes are doubled.
fn quoted(tab: &str) -> String {
    format!("'{}'", tab.replace('\'', "''"))
}

#[async_trait]
impl RecordStore for SheetsRecordStore {
    async fn fetch_inventory(&self) -> Result<Vec<InventoryRecord>, StoreError> {
        let values = self.read_tab(&self.inventory_tab).await?;
        sheet_rows::parse_table(&values)
    }

    async fn fetch_catalog(&self) -> Result<Vec<InventoryRecord>, StoreError> {
        match &self.catalog_tab {
            Some(tab) => sheet_rows::parse_table(&self.read_tab(tab).await?),
            None => Ok(Vec::new()),
        }
    }

    async fn upsert(&self, records: &[InventoryRecord]) -> Result<usize, StoreError> {
        if records.is_empty() {
            return Ok(0);
        }

        let values = self.read_tab(&self.inventory_tab).await?;
        let layout = match values.first() {
            Some(header) => SheetLayout::from_header(header),
            None => SheetLayout::canonical(),
        };
        layout.require_name()?;
        let existing: Vec<(AliasKey, usize)> = sheet_rows::row_numbers_by_name(&values);

        // A record named twice in one batch is written once, with its last copy.
        let mut updates: Vec<(usize, Vec<Value>)> = Vec::new();
        let mut appends: Vec<(&AliasKey, Vec<Value>)> = Vec::new();
        for record in records {
            let row = existing
                .iter()
                .find(|(key, _)| key == record.id())
                .map(|(_, row)| *row);
            match row {
                Some(row) => {
                    let current = values.get(row - 1).map(Vec::as_slice).unwrap_or_default();
                    let cells = layout.write_row(record, current);
                    match updates.iter_mut().find(|(r, _)| *r == row) {
                        Some(slot) => slot.1 = cells,
                        None => updates.push((row, cells)),
                    }
                }
                None => {
                    let cells = layout.write_row(record, &[]);
                    match appends.iter_mut().find(|(key, _)| *key == record.id()) {
                        Some(slot) => slot.1 = cells,
                        None => appends.push((record.id(), cells)),
                    }
                }
            }
            tracing::debug!(name = record.name(), row = ?row, "sheet row staged");
        }

        if !updates.is_empty() {
            self.update_rows(updates).await?;
        }

        let mut new_rows: Vec<Vec<Value>> = Vec::with_capacity(appends.len() + 1);
        if values.is_empty() {
            new_rows.push(sheet_rows::header_row());
        }
        new_rows.extend(appends.into_iter().map(|(_, cells)| cells));
        if !new_rows.is_empty() {
            self.append_rows(new_rows).await?;
        }

        Ok(records.len())
    }
}
