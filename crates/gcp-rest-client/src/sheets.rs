//! Google Sheets v4 read-only client

use crate::error::{GcpError, Result};
use crate::token::TokenSource;
use crate::types::ValueRange;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Reads cell ranges from spreadsheets
pub struct SheetsClient {
    http: Client,
    tokens: Arc<TokenSource>,
    base_url: String,
}

impl SheetsClient {
    /// Base URL of the Sheets API
    pub const BASE_URL: &'static str = "https://sheets.googleapis.com";

    pub fn new(tokens: Arc<TokenSource>) -> Self {
        Self::with_base_url(tokens, Self::BASE_URL)
    }

    pub fn with_base_url(tokens: Arc<TokenSource>, base_url: &str) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            tokens,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn values_url(&self, spreadsheet_id: &str, range: &str) -> String {
        format!(
            "{}/v4/spreadsheets/{}/values/{}?majorDimension=ROWS",
            self.base_url,
            urlencoding::encode(spreadsheet_id),
            urlencoding::encode(range)
        )
    }

    /// Read an A1-notation range as rows of formatted cell strings.
    ///
    /// Trailing empty cells and rows are omitted by the API, so rows may be
    /// shorter than the range width.
    pub async fn read_range(&self, spreadsheet_id: &str, range: &str) -> Result<Vec<Vec<String>>> {
        let token = self.tokens.token().await?;
        let url = self.values_url(spreadsheet_id, range);

        let response = self.http.get(&url).bearer_auth(&token).send().await?;
        if !response.status().is_success() {
            return Err(GcpError::from_response(response).await);
        }

        let body: ValueRange = response.json().await?;
        let rows = body.into_rows();
        debug!(spreadsheet_id, range, rows = rows.len(), "Read sheet range");
        Ok(rows)
    }
}
