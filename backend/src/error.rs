//! Error types for the quotation pipeline.
//!
//! Errors follow the pipeline stages:
//!
//! - [`WorkbookError`] - Reading the uploaded workbook
//! - [`SchemaError`] - Missing sheets or columns (halts before extraction)
//! - [`ExtractionError`] - Cells that cannot be coerced (halts before model building)
//! - [`RenderError`] - Malformed section list (an internal defect, not bad input)
//! - [`ConfigError`] - Loading a configuration file
//! - [`FetchError`] - Downloading a Google Sheet export
//! - [`PipelineError`] - Top-level orchestration errors
//!
//! Non-fatal data problems are not errors: see [`crate::models::ModelWarning`].
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Workbook Errors
// =============================================================================

/// Errors while opening or reading the workbook container.
#[derive(Debug, Error)]
pub enum WorkbookError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// The bytes are not a workbook calamine understands.
    #[error("Unsupported or corrupt workbook: {0}")]
    Unreadable(String),

    /// A sheet listed in the workbook could not be loaded.
    #[error("Cannot read sheet '{sheet}': {message}")]
    Sheet { sheet: String, message: String },

    /// The workbook has no sheets at all.
    #[error("Workbook contains no sheets")]
    NoSheets,
}

// =============================================================================
// Schema Errors
// =============================================================================

/// Required structure is absent from the workbook.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaError {
    /// A required sheet is missing.
    #[error("Missing required sheet '{sheet}'")]
    MissingSheet { sheet: String },

    /// The sheet exists but has no header row.
    #[error("Sheet '{sheet}' has no header row")]
    NoHeaderRow { sheet: String },

    /// One or more required columns are missing from a sheet.
    #[error("Sheet '{sheet}' is missing required column(s): {}", columns.join(", "))]
    MissingColumns { sheet: String, columns: Vec<String> },
}

impl SchemaError {
    /// Names of the missing columns, empty for sheet-level errors.
    pub fn missing_columns(&self) -> &[String] {
        match self {
            SchemaError::MissingColumns { columns, .. } => columns,
            _ => &[],
        }
    }
}

// =============================================================================
// Extraction Errors
// =============================================================================

/// A cell could not be turned into its typed field.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ExtractionError {
    /// Cell value cannot be coerced to the expected type.
    #[error("Sheet '{sheet}', row {row}, column '{column}': expected {expected}, found '{value}'")]
    InvalidCell {
        sheet: String,
        row: usize,
        column: String,
        value: String,
        expected: &'static str,
    },

    /// A required cell is blank.
    #[error("Sheet '{sheet}', row {row}, column '{column}': value is required")]
    MissingValue {
        sheet: String,
        row: usize,
        column: String,
    },

    /// The client sheet has a header but no data row.
    #[error("Sheet '{sheet}' has no client data row")]
    NoClientRow { sheet: String },
}

impl ExtractionError {
    /// Sheet the failing cell belongs to.
    pub fn sheet(&self) -> &str {
        match self {
            ExtractionError::InvalidCell { sheet, .. }
            | ExtractionError::MissingValue { sheet, .. }
            | ExtractionError::NoClientRow { sheet } => sheet,
        }
    }
}

// =============================================================================
// Render Errors
// =============================================================================

/// The renderer was handed a section list it cannot lay out.
///
/// These indicate a contract violation upstream, never a user input problem.
#[derive(Debug, Error)]
pub enum RenderError {
    /// No sections at all.
    #[error("Document has no sections")]
    EmptyDocument,

    /// The mandatory client-details section is absent.
    #[error("Document is missing the client details section")]
    MissingClientDetails,

    /// More than one client-details section.
    #[error("Document has {0} client details sections, expected exactly one")]
    DuplicateClientDetails(usize),

    /// docx packaging failed.
    #[error("Failed to package document: {0}")]
    Package(String),
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors while loading a [`crate::config::QuoteConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error.
    #[error("Config IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("Config JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Semantically invalid configuration.
    #[error("Invalid config: {0}")]
    Invalid(String),
}

// =============================================================================
// Fetch Errors
// =============================================================================

/// Errors while downloading a spreadsheet export.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Not a recognizable sheet URL or id.
    #[error("Invalid Google Sheet URL or id: {0}")]
    InvalidUrl(String),

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// Non-success response.
    #[error("Sheet export returned HTTP {0}")]
    Status(u16),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the error returned by [`crate::transform::pipeline::QuotePipeline`].
/// Any variant means no document was produced.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Workbook could not be read.
    #[error("Workbook error: {0}")]
    Workbook(#[from] WorkbookError),

    /// Schema validation failed.
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// A cell could not be extracted.
    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Rendering failed.
    #[error("Render error: {0}")]
    Render(#[from] RenderError),
}

impl PipelineError {
    /// Short machine-readable category.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Workbook(_) => "workbook",
            PipelineError::Schema(_) => "schema",
            PipelineError::Extraction(_) => "extraction",
            PipelineError::Render(_) => "render",
        }
    }

    /// Whether the advisor can fix this by editing the workbook.
    pub fn is_user_error(&self) -> bool {
        !matches!(self, PipelineError::Render(_))
    }
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Sheet download error.
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Missing or wrong shared secret.
    #[error("Missing or invalid secret")]
    Unauthorized,

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for workbook reading.
pub type WorkbookResult<T> = Result<T, WorkbookError>;

/// Result type for extraction.
pub type ExtractionResult<T> = Result<T, ExtractionError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        let schema_err = SchemaError::MissingColumns {
            sheet: "Client Details".into(),
            columns: vec!["Sum Assured".into()],
        };
        let pipeline_err: PipelineError = schema_err.into();
        assert!(pipeline_err.to_string().contains("Sum Assured"));
        assert_eq!(pipeline_err.kind(), "schema");
        assert!(pipeline_err.is_user_error());

        let render_err: PipelineError = RenderError::MissingClientDetails.into();
        assert_eq!(render_err.kind(), "render");
        assert!(!render_err.is_user_error());
    }

    #[test]
    fn test_extraction_error_format() {
        let err = ExtractionError::InvalidCell {
            sheet: "Premiums".into(),
            row: 4,
            column: "Regular Premium".into(),
            value: "call me".into(),
            expected: "a number",
        };
        let msg = err.to_string();
        assert!(msg.contains("Premiums"));
        assert!(msg.contains("row 4"));
        assert!(msg.contains("'Regular Premium'"));
        assert!(msg.contains("call me"));
        assert_eq!(err.sheet(), "Premiums");
    }

    #[test]
    fn test_missing_columns_lists_all() {
        let err = SchemaError::MissingColumns {
            sheet: "Premiums".into(),
            columns: vec!["Plan Name".into(), "Special Notes".into()],
        };
        assert_eq!(
            err.to_string(),
            "Sheet 'Premiums' is missing required column(s): Plan Name, Special Notes"
        );
        assert_eq!(err.missing_columns().len(), 2);
    }
}
