//! # Termquote - term insurance quote generation
//!
//! Termquote turns an advisor's workbook (client details, a premium comparison
//! and optional closing notes) into a branded `.docx` quote for the client.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────┐   ┌───────────┐   ┌───────────┐   ┌──────────┐   ┌───────┐
//! │ Workbook │──▶│  Schema  │──▶│  Record   │──▶│ Document  │──▶│ Document │──▶│ .docx │
//! │  bytes   │   │Validator │   │ Extractor │   │  Model    │   │ Renderer │   │ bytes │
//! └──────────┘   └──────────┘   └───────────┘   └───────────┘   └──────────┘   └───────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use termquote::{QuoteConfig, QuotePipeline};
//!
//! let pipeline = QuotePipeline::new(QuoteConfig::default());
//! let output = pipeline.generate(&std::fs::read("client.xlsx")?)?;
//! std::fs::write(&output.file_name, &output.rendered.bytes)?;
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`config`] - Schema, branding, formatting and style settings
//! - [`models`] - Domain records (client, premium options, notes, warnings)
//! - [`parser`] - Workbook reading via calamine
//! - [`validation`] - Required sheets and columns
//! - [`transform`] - Record extraction and the end-to-end pipeline
//! - [`document`] - Section model, formatting and `.docx` rendering
//! - [`sheets`] - Public Google Sheet export download
//! - [`api`] - HTTP API server and progress log

// Core modules
pub mod config;
pub mod error;
pub mod models;

// Reading
pub mod parser;
pub mod sheets;

// Validation
pub mod validation;

// Transformation
pub mod transform;

// Output
pub mod document;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError,
    ExtractionError,
    FetchError,
    PipelineError,
    PipelineResult,
    RenderError,
    SchemaError,
    ServerError,
    WorkbookError,
};

// =============================================================================
// Re-exports - Configuration
// =============================================================================

pub use config::{
    Branding,
    FormatConfig,
    Grouping,
    HeaderSpec,
    QuoteConfig,
    SchemaConfig,
    StyleConfig,
    CONFIG_ENV_VAR,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{ClientDetails, DropReason, FinalNotes, ModelWarning, Money, PremiumOption};

// =============================================================================
// Re-exports - Reading & Validation
// =============================================================================

pub use parser::{read_workbook_bytes, read_workbook_file, Cell, Sheet, Workbook};
pub use validation::{is_valid, validate, SchemaValidator, ValidatedWorkbook};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::{
    generate_quote_file,
    quote_file_name,
    Extraction,
    InspectReport,
    QuoteOutput,
    QuotePipeline,
    RecordExtractor,
};

// =============================================================================
// Re-exports - Document
// =============================================================================

pub use document::{Block, DocumentModelBuilder, DocumentRenderer, QuoteDocument, RenderedDocument, Section};

// =============================================================================
// Re-exports - Google Sheets
// =============================================================================

pub use sheets::{parse_spreadsheet_id, SheetFetcher};

// Server
pub mod server {
    pub use crate::api::server::start_server;
}
