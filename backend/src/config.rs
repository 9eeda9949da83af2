//! Pipeline configuration.
//!
//! A [`QuoteConfig`] is built once (defaults, a JSON file, or the file named by
//! `TERMQUOTE_CONFIG`) and handed to [`crate::QuotePipeline::new`]. Nothing in
//! the pipeline reads process-wide settings, so tests can swap schemas freely.
//!
//! ```json
//! {
//!   "schema": { "premiumSheet": "Quotes" },
//!   "format": { "grouping": "western", "currencySymbol": "Rs." }
//! }
//! ```
//!
//! Every field is optional; missing fields keep their defaults.

use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

use crate::error::ConfigError;

/// Environment variable pointing at a JSON config file.
pub const CONFIG_ENV_VAR: &str = "TERMQUOTE_CONFIG";

/// Complete pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QuoteConfig {
    /// Accepted sheet and column names.
    pub schema: SchemaConfig,
    /// Firm name, title and contact block.
    pub branding: Branding,
    /// Display formatting for money and dates.
    pub format: FormatConfig,
    /// Fixed document styling.
    pub styles: StyleConfig,
    /// Append a data-notes section listing dropped premium rows.
    pub append_warnings: bool,
}

impl Default for QuoteConfig {
    fn default() -> Self {
        Self {
            schema: SchemaConfig::default(),
            branding: Branding::default(),
            format: FormatConfig::default(),
            styles: StyleConfig::default(),
            append_warnings: true,
        }
    }
}

impl QuoteConfig {
    /// Load from a JSON file, filling unspecified fields with defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    /// Parse from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: QuoteConfig = serde_json::from_str(json)?;
        config.check()?;
        Ok(config)
    }

    /// Load from the file named by `TERMQUOTE_CONFIG`, or defaults if unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        match env::var(CONFIG_ENV_VAR) {
            Ok(path) if !path.trim().is_empty() => Self::from_json_file(path.trim()),
            _ => Ok(Self::default()),
        }
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn check(&self) -> Result<(), ConfigError> {
        let s = &self.schema;
        if s.client_sheet.trim().is_empty() || s.premium_sheet.trim().is_empty() {
            return Err(ConfigError::Invalid("sheet names must not be empty".into()));
        }
        if s.client_sheet == s.premium_sheet {
            return Err(ConfigError::Invalid(format!(
                "client and premium sheets must differ (both '{}')",
                s.client_sheet
            )));
        }
        for column in s.client_columns.all().into_iter().chain(s.premium_columns.all()) {
            if column.name.trim().is_empty() {
                return Err(ConfigError::Invalid("column names must not be empty".into()));
            }
        }
        if self.styles.body_size == 0 || self.styles.heading_size == 0 || self.styles.title_size == 0 {
            return Err(ConfigError::Invalid("font sizes must be positive".into()));
        }
        for pattern in [&self.format.date_format, &self.format.timestamp_format] {
            if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
                return Err(ConfigError::Invalid(format!("invalid date format '{}'", pattern)));
            }
        }
        Ok(())
    }
}

// =============================================================================
// Schema
// =============================================================================

/// One required column: its canonical header and accepted alternatives.
///
/// Matching is case-sensitive on the trimmed header text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
}

impl HeaderSpec {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string(), aliases: Vec::new() }
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }

    /// Whether a header cell's text names this column.
    pub fn matches(&self, header: &str) -> bool {
        let header = header.trim();
        self.name == header || self.aliases.iter().any(|a| a == header)
    }
}

/// Columns of the client details sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientColumns {
    pub client_name: HeaderSpec,
    pub dob: HeaderSpec,
    pub age: HeaderSpec,
    pub city: HeaderSpec,
    pub sum_assured: HeaderSpec,
    pub policy_term: HeaderSpec,
    pub ppt: HeaderSpec,
}

impl ClientColumns {
    /// Columns in display order.
    pub fn all(&self) -> Vec<&HeaderSpec> {
        vec![
            &self.client_name,
            &self.dob,
            &self.age,
            &self.city,
            &self.sum_assured,
            &self.policy_term,
            &self.ppt,
        ]
    }
}

impl Default for ClientColumns {
    fn default() -> Self {
        Self {
            client_name: HeaderSpec::new("Client Name"),
            dob: HeaderSpec::new("DOB"),
            age: HeaderSpec::new("Age"),
            city: HeaderSpec::new("City"),
            sum_assured: HeaderSpec::new("Sum Assured"),
            policy_term: HeaderSpec::new("Policy Term"),
            ppt: HeaderSpec::new("PPT"),
        }
    }
}

/// Columns of the premiums sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PremiumColumns {
    pub insurance_company: HeaderSpec,
    pub plan_name: HeaderSpec,
    pub regular_premium: HeaderSpec,
    pub ten_pay_premium: HeaderSpec,
    pub special_notes: HeaderSpec,
}

impl PremiumColumns {
    /// Columns in display order.
    pub fn all(&self) -> Vec<&HeaderSpec> {
        vec![
            &self.insurance_company,
            &self.plan_name,
            &self.regular_premium,
            &self.ten_pay_premium,
            &self.special_notes,
        ]
    }
}

impl Default for PremiumColumns {
    fn default() -> Self {
        Self {
            insurance_company: HeaderSpec::new("Insurance Company"),
            plan_name: HeaderSpec::new("Plan Name"),
            regular_premium: HeaderSpec::new("Regular Premium"),
            ten_pay_premium: HeaderSpec::new("10 Pay Premium").with_alias("10 Pay"),
            special_notes: HeaderSpec::new("Special Notes"),
        }
    }
}

/// Accepted workbook schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SchemaConfig {
    pub client_sheet: String,
    pub premium_sheet: String,
    pub notes_sheet: String,
    pub client_columns: ClientColumns,
    pub premium_columns: PremiumColumns,
    /// First-row texts in the notes sheet that are treated as a header.
    pub notes_headers: Vec<String>,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            client_sheet: "Client Details".to_string(),
            premium_sheet: "Premiums".to_string(),
            notes_sheet: "Final Notes".to_string(),
            client_columns: ClientColumns::default(),
            premium_columns: PremiumColumns::default(),
            notes_headers: vec![
                "Final Notes".to_string(),
                "Notes".to_string(),
                "Advisory Note".to_string(),
            ],
        }
    }
}

// =============================================================================
// Branding
// =============================================================================

/// Fixed text printed on every quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Branding {
    pub firm_name: String,
    pub title: String,
    /// Lines of the closing contact block; empty disables the block.
    pub contact_lines: Vec<String>,
}

impl Default for Branding {
    fn default() -> Self {
        Self {
            firm_name: "Incremint Edge Pvt Ltd".to_string(),
            title: "Final Incremint Dual-Pay Term Quote".to_string(),
            contact_lines: vec![
                "Agent Name: __________________".to_string(),
                "Mobile: __________________".to_string(),
            ],
        }
    }
}

// =============================================================================
// Formatting
// =============================================================================

/// Digit grouping for currency amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Grouping {
    /// 1,00,00,000
    #[default]
    Indian,
    /// 10,000,000
    Western,
}

/// Display formatting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FormatConfig {
    pub currency_symbol: String,
    pub grouping: Grouping,
    /// chrono format for dates of birth.
    pub date_format: String,
    /// chrono format for the generation timestamp.
    pub timestamp_format: String,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            currency_symbol: "₹".to_string(),
            grouping: Grouping::Indian,
            date_format: "%d-%m-%Y".to_string(),
            timestamp_format: "%d-%m-%Y %H:%M".to_string(),
        }
    }
}

// =============================================================================
// Styles
// =============================================================================

/// Document styling. Sizes are in half-points, as docx stores them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StyleConfig {
    pub font: String,
    pub body_size: usize,
    pub title_size: usize,
    pub firm_size: usize,
    pub heading_size: usize,
    /// Hex fill of table header cells.
    pub header_fill: String,
    /// Hex color of table borders.
    pub border_color: String,
    /// Hex color of warning text.
    pub warning_color: String,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            font: "Calibri".to_string(),
            body_size: 22,
            title_size: 32,
            firm_size: 28,
            heading_size: 26,
            header_fill: "D9E2F3".to_string(),
            border_color: "000000".to_string(),
            warning_color: "C00000".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_input_template() {
        let config = QuoteConfig::default();
        assert_eq!(config.schema.client_sheet, "Client Details");
        assert_eq!(config.schema.premium_sheet, "Premiums");
        assert_eq!(config.schema.notes_sheet, "Final Notes");
        assert_eq!(config.schema.client_columns.all().len(), 7);
        assert_eq!(config.schema.premium_columns.all().len(), 5);
        assert!(config.append_warnings);
        assert_eq!(QuoteConfig::from_json("{}").unwrap(), config);
    }

    #[test]
    fn test_header_spec_matching() {
        let header = HeaderSpec::new("10 Pay Premium").with_alias("10 Pay");
        assert!(header.matches("10 Pay Premium"));
        assert!(header.matches("  10 Pay "));
        assert!(!header.matches("10 pay premium"));
        assert!(!header.matches("Regular Premium"));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = QuoteConfig::from_json(
            r#"{ "schema": { "premiumSheet": "Quotes" }, "format": { "grouping": "western" } }"#,
        )
        .unwrap();
        assert_eq!(config.schema.premium_sheet, "Quotes");
        assert_eq!(config.schema.client_sheet, "Client Details");
        assert_eq!(config.format.grouping, Grouping::Western);
        assert_eq!(config.format.currency_symbol, "₹");
    }

    #[test]
    fn test_rejects_identical_sheets() {
        let err = QuoteConfig::from_json(
            r#"{ "schema": { "clientSheet": "Data", "premiumSheet": "Data" } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_bad_date_format() {
        let err = QuoteConfig::from_json(r#"{ "format": { "dateFormat": "%d-%Q" } }"#).unwrap_err();
        assert!(err.to_string().contains("%d-%Q"));
        assert!(QuoteConfig::from_json(r#"{ "format": { "dateFormat": "%d/%m/%Y" } }"#).is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "branding": {{ "firmName": "Acme Advisors" }} }}"#).unwrap();

        let config = QuoteConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.branding.firm_name, "Acme Advisors");
        assert!(!config.branding.contact_lines.is_empty());
    }

    #[test]
    fn test_json_roundtrip_of_defaults() {
        let json = QuoteConfig::default().to_json().unwrap();
        let back = QuoteConfig::from_json(&json).unwrap();
        assert_eq!(back.schema, SchemaConfig::default());
    }
}
