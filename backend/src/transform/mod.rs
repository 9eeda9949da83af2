//! Transformation module.
//!
//! This module handles workbook to quote transformation:
//! - Extract: validated sheets to typed records
//! - Pipeline: the end-to-end orchestration

pub mod extract;
pub mod pipeline;

pub use extract::{Extraction, RecordExtractor};
pub use pipeline::*;
