//! Public Google Sheet download.
//!
//! A sheet shared as "anyone with the link" can be exported as `.xlsx`
//! without credentials. The bytes then go through the normal pipeline.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use termquote::sheets::{parse_spreadsheet_id, SheetFetcher};
//!
//! let id = parse_spreadsheet_id("https://docs.google.com/spreadsheets/d/abc123/edit")?;
//! let bytes = SheetFetcher::new().fetch_xlsx(&id).await?;
//! ```

use once_cell::sync::Lazy;
use regex::Regex;

use crate::api::logs::{log_info, log_success};
use crate::error::FetchError;

/// Export endpoint host.
pub const DEFAULT_BASE_URL: &str = "https://docs.google.com";

static URL_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/spreadsheets/d/([A-Za-z0-9_-]+)").expect("Valid sheet URL pattern"));

static BARE_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{10,}$").expect("Valid spreadsheet id pattern"));

/// Extract the spreadsheet id from a share URL, or accept a bare id.
pub fn parse_spreadsheet_id(input: &str) -> Result<String, FetchError> {
    let input = input.trim();

    if let Some(caps) = URL_ID.captures(input) {
        return Ok(caps[1].to_string());
    }
    if BARE_ID.is_match(input) {
        return Ok(input.to_string());
    }

    Err(FetchError::InvalidUrl(input.to_string()))
}

/// Downloads `.xlsx` exports of public spreadsheets.
#[derive(Debug, Clone)]
pub struct SheetFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl Default for SheetFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl SheetFetcher {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Point at another host, e.g. a local mock.
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn export_url(&self, id: &str) -> String {
        format!("{}/spreadsheets/d/{}/export?format=xlsx", self.base_url, id)
    }

    /// Download the whole spreadsheet as `.xlsx` bytes.
    pub async fn fetch_xlsx(&self, id: &str) -> Result<Vec<u8>, FetchError> {
        let url = self.export_url(id);
        log_info(format!("📡 Downloading sheet {}...", id));

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;

        log_success(format!("Received {} bytes", bytes.len()));
        Ok(bytes.to_vec())
    }
}
