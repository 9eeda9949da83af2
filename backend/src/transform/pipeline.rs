//! High-level pipeline API for workbook to quote transformation.
//!
//! Combines every stage: reading, schema validation, extraction, model
//! building and rendering. Each call is independent; the pipeline only holds
//! its immutable configuration.
//!
//! # Example
//!
//! ```rust,ignore
//! use termquote::{QuoteConfig, QuotePipeline};
//!
//! let pipeline = QuotePipeline::new(QuoteConfig::default());
//! let output = pipeline.generate(&std::fs::read("client.xlsx")?)?;
//! std::fs::write(&output.file_name, &output.rendered.bytes)?;
//! ```

use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use std::path::Path;

use super::extract::{Extraction, RecordExtractor};
use crate::api::logs::{log_info, log_success, log_warning};
use crate::config::QuoteConfig;
use crate::document::{DocumentModelBuilder, DocumentRenderer, QuoteDocument, RenderedDocument};
use crate::error::PipelineResult;
use crate::models::ModelWarning;
use crate::parser::{read_workbook_bytes, Workbook};
use crate::validation::SchemaValidator;

/// Suffix of generated file names.
const FILE_SUFFIX: &str = "_term_quote_final.docx";

/// Result of one successful pipeline run.
#[derive(Debug, Clone)]
pub struct QuoteOutput {
    /// Logical section list.
    pub document: QuoteDocument,
    /// Outline and `.docx` bytes.
    pub rendered: RenderedDocument,
    /// Non-fatal problems, also visible in the document.
    pub warnings: Vec<ModelWarning>,
    /// Suggested download name.
    pub file_name: String,
}

impl QuoteOutput {
    /// Name the file after the uploaded workbook instead of the client.
    pub fn with_source_name(mut self, source: &str) -> Self {
        let stem = Path::new(source)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(source);
        self.file_name = quote_file_name(stem);
        self
    }
}

/// Summary of an inspection run, for the CLI and logs.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectReport {
    pub sheets: Vec<String>,
    pub extraction: Extraction,
}

/// Stateless workbook → quote pipeline.
#[derive(Debug, Clone, Default)]
pub struct QuotePipeline {
    config: QuoteConfig,
}

impl QuotePipeline {
    pub fn new(config: QuoteConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &QuoteConfig {
        &self.config
    }

    /// Generate a quote stamped with the current local time.
    pub fn generate(&self, bytes: &[u8]) -> PipelineResult<QuoteOutput> {
        self.generate_at(bytes, Local::now().naive_local())
    }

    /// Generate a quote with an explicit timestamp.
    pub fn generate_at(&self, bytes: &[u8], generated_at: NaiveDateTime) -> PipelineResult<QuoteOutput> {
        log_info("📖 Reading workbook...");
        let workbook = read_workbook_bytes(bytes)?;
        log_success(format!("Found sheets: {}", workbook.sheet_names().join(", ")));

        self.generate_from_workbook(&workbook, generated_at)
    }

    /// Generate from two uploads: one holding client details, one holding premiums.
    pub fn generate_from_parts(
        &self,
        client_bytes: &[u8],
        premium_bytes: &[u8],
        generated_at: NaiveDateTime,
    ) -> PipelineResult<QuoteOutput> {
        log_info("📖 Reading client and premium workbooks...");
        let client = read_workbook_bytes(client_bytes)?;
        let premiums = read_workbook_bytes(premium_bytes)?;
        let workbook = Workbook::combine(client, premiums, &self.config.schema)?;
        log_success("Combined into one workbook");

        self.generate_from_workbook(&workbook, generated_at)
    }

    /// Run every stage after reading.
    pub fn generate_from_workbook(
        &self,
        workbook: &Workbook,
        generated_at: NaiveDateTime,
    ) -> PipelineResult<QuoteOutput> {
        let extraction = self.extract(workbook)?;

        log_info("🧱 Building document model...");
        let built = DocumentModelBuilder::new(&self.config).build(&extraction, generated_at);
        for warning in &built.warnings {
            log_warning(warning.to_string());
        }
        log_success(format!("{} sections", built.document.sections.len()));

        log_info("📝 Rendering document...");
        let rendered = DocumentRenderer::new(&self.config.styles).render(&built.document)?;
        log_success(format!("Rendered {} bytes", rendered.bytes.len()));

        Ok(QuoteOutput {
            file_name: quote_file_name(&extraction.client.name),
            document: built.document,
            rendered,
            warnings: built.warnings,
        })
    }

    /// Validate and extract only.
    pub fn inspect(&self, bytes: &[u8]) -> PipelineResult<InspectReport> {
        let workbook = read_workbook_bytes(bytes)?;
        let extraction = self.extract(&workbook)?;
        Ok(InspectReport {
            sheets: workbook.sheet_names().iter().map(|s| s.to_string()).collect(),
            extraction,
        })
    }

    fn extract(&self, workbook: &Workbook) -> PipelineResult<Extraction> {
        log_info("✔️  Validating workbook schema...");
        let validated = SchemaValidator::new(&self.config.schema).validate(workbook)?;
        log_success("Required sheets and columns present");

        log_info("⚙️  Extracting records...");
        let extraction = RecordExtractor::new(&self.config.schema).extract(&validated)?;
        log_success(format!(
            "Client '{}', {} premium option(s){}",
            extraction.client.name,
            extraction.premiums.len(),
            if extraction.notes.is_some() { ", final notes" } else { "" }
        ));
        if !extraction.warnings.is_empty() {
            log_warning(format!("{} premium row(s) dropped", extraction.warnings.len()));
        }

        Ok(extraction)
    }
}

/// Generate a quote from a workbook on disk, named after the file.
pub fn generate_quote_file(path: &Path, config: QuoteConfig) -> Result<QuoteOutput, Box<dyn std::error::Error>> {
    let bytes = std::fs::read(path)?;
    let output = QuotePipeline::new(config).generate(&bytes)?;
    Ok(output.with_source_name(&path.to_string_lossy()))
}

/// `<slug>_term_quote_final.docx`, e.g. `ravi-kumar_term_quote_final.docx`.
pub fn quote_file_name(base: &str) -> String {
    let slug = base
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    if slug.is_empty() {
        FILE_SUFFIX.trim_start_matches('_').to_string()
    } else {
        format!("{}{}", slug, FILE_SUFFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Block, SectionKind};
    use crate::error::{PipelineError, SchemaError};
    use crate::parser::{Cell, Sheet};
    use chrono::NaiveDate;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap().and_hms_opt(9, 0, 0).unwrap()
    }

    fn header(names: &[&str]) -> Vec<Cell> {
        names.iter().map(|h| Cell::text(*h)).collect()
    }

    fn client_row(policy_term: f64, ppt: f64) -> Vec<Cell> {
        vec![
            Cell::text("Ravi Kumar"),
            Cell::date(NaiveDate::from_ymd_opt(1990, 4, 1).unwrap()),
            Cell::Empty,
            Cell::text("Pune"),
            Cell::Number(10_000_000.0),
            Cell::Number(policy_term),
            Cell::Number(ppt),
        ]
    }

    fn premium_row(company: &str, plan: &str, regular: Option<f64>, ten_pay: Option<f64>) -> Vec<Cell> {
        let money = |v: Option<f64>| v.map_or(Cell::Empty, Cell::Number);
        vec![Cell::text(company), Cell::text(plan), money(regular), money(ten_pay), Cell::Empty]
    }

    fn quote_workbook(client: Vec<Cell>, premium_rows: Vec<Vec<Cell>>, notes: Option<Sheet>) -> Workbook {
        let mut premiums = vec![header(&[
            "Insurance Company",
            "Plan Name",
            "Regular Premium",
            "10 Pay Premium",
            "Special Notes",
        ])];
        premiums.extend(premium_rows);

        let mut sheets = vec![
            Sheet::new(
                "Client Details",
                vec![
                    header(&["Client Name", "DOB", "Age", "City", "Sum Assured", "Policy Term", "PPT"]),
                    client,
                ],
            ),
            Sheet::new("Premiums", premiums),
        ];
        sheets.extend(notes);
        Workbook::new(sheets)
    }

    fn standard_client() -> Vec<Cell> {
        client_row(40.0, 10.0)
    }

    fn premium_rows(outline: &[Block]) -> usize {
        outline
            .iter()
            .filter_map(|b| match b {
                Block::Table { header, rows } if header.first().map(String::as_str) == Some("Company") => {
                    Some(rows.len())
                }
                _ => None,
            })
            .sum()
    }

    #[test]
    fn test_one_client_section_and_n_premium_rows() {
        let workbook = quote_workbook(
            standard_client(),
            vec![
                premium_row("HDFC Life", "Click 2 Protect", Some(15_000.0), Some(32_000.0)),
                vec![],
                premium_row("ICICI Pru", "iProtect Smart", Some(14_500.0), None),
                premium_row("Max Life", "Smart Secure", None, Some(29_000.0)),
            ],
            None,
        );

        let output = QuotePipeline::default().generate_from_workbook(&workbook, at()).unwrap();
        let kinds = output.document.section_kinds();

        assert_eq!(kinds.iter().filter(|k| **k == SectionKind::ClientDetails).count(), 1);
        assert_eq!(output.document.premium_table().unwrap().rows.len(), 3);
        assert_eq!(premium_rows(&output.rendered.outline), 3);
        assert!(output.rendered.bytes.starts_with(b"PK"));
        assert!(output.warnings.is_empty());
        assert_eq!(output.file_name, "ravi-kumar_term_quote_final.docx");
    }

    #[test]
    fn test_idempotent_structure() {
        let workbook = quote_workbook(
            standard_client(),
            vec![premium_row("LIC", "Tech Term", Some(12_000.0), None)],
            None,
        );
        let pipeline = QuotePipeline::default();

        let a = pipeline.generate_from_workbook(&workbook, at()).unwrap();
        let b = pipeline.generate_from_workbook(&workbook, at()).unwrap();
        assert_eq!(a.document, b.document);
        assert_eq!(a.rendered.outline, b.rendered.outline);
    }

    #[test]
    fn test_blank_premiums_excluded_regular_only_included() {
        let workbook = quote_workbook(
            standard_client(),
            vec![
                premium_row("Tata AIA", "Sampoorna Raksha", None, None),
                premium_row("Bajaj", "eTouch", Some(11_000.0), None),
            ],
            None,
        );

        let output = QuotePipeline::default().generate_from_workbook(&workbook, at()).unwrap();
        let table = output.document.premium_table().unwrap();

        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0][1], "eTouch");
        assert_eq!(output.warnings.len(), 1);
        assert!(output.document.section_kinds().contains(&SectionKind::DataNotes));
    }

    #[test]
    fn test_missing_sum_assured_produces_no_document() {
        let mut workbook = quote_workbook(standard_client(), vec![], None);
        let client = &mut workbook.sheets[0];
        for row in client.rows.iter_mut() {
            row.remove(4);
        }

        let err = QuotePipeline::default()
            .generate_from_workbook(&workbook, at())
            .unwrap_err();
        match err {
            PipelineError::Schema(SchemaError::MissingColumns { columns, .. }) => {
                assert_eq!(columns, vec!["Sum Assured".to_string()]);
            }
            other => panic!("expected schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_ppt_over_term_still_generates() {
        let workbook = quote_workbook(client_row(10.0, 15.0), vec![premium_row("LIC", "Tech Term", Some(9_000.0), None)], None);

        let output = QuotePipeline::default().generate_from_workbook(&workbook, at()).unwrap();
        assert_eq!(output.document.client_details().unwrap().warnings.len(), 1);
        assert!(output.rendered.outline.iter().any(|b| matches!(
            b,
            Block::Paragraph { text, .. } if text.contains("exceeds policy term")
        )));
        assert!(!output.rendered.bytes.is_empty());
    }

    #[test]
    fn test_absent_and_empty_notes_sheet_match() {
        let rows = || vec![premium_row("LIC", "Tech Term", Some(9_000.0), None)];
        let without = quote_workbook(standard_client(), rows(), None);
        let with_empty = quote_workbook(
            standard_client(),
            rows(),
            Some(Sheet::new("Final Notes", vec![vec![Cell::Empty]])),
        );
        let pipeline = QuotePipeline::default();

        let a = pipeline.generate_from_workbook(&without, at()).unwrap();
        let b = pipeline.generate_from_workbook(&with_empty, at()).unwrap();

        assert_eq!(a.document, b.document);
        assert_eq!(a.rendered.outline, b.rendered.outline);
        assert!(!a.document.section_kinds().contains(&SectionKind::FinalNotes));
    }

    #[test]
    fn test_notes_rendered_when_present() {
        let workbook = quote_workbook(
            standard_client(),
            vec![],
            Some(Sheet::new("Final Notes", vec![vec![Cell::text("10 Pay is recommended.")]])),
        );

        let output = QuotePipeline::default().generate_from_workbook(&workbook, at()).unwrap();
        assert!(output.document.section_kinds().contains(&SectionKind::FinalNotes));
    }

    #[test]
    fn test_extraction_error_halts() {
        let workbook = quote_workbook(
            standard_client(),
            vec![vec![
                Cell::text("LIC"),
                Cell::text("Tech Term"),
                Cell::text("TBD"),
                Cell::Empty,
                Cell::Empty,
            ]],
            None,
        );

        let err = QuotePipeline::default()
            .generate_from_workbook(&workbook, at())
            .unwrap_err();
        assert_eq!(err.kind(), "extraction");
        assert!(err.to_string().contains("Regular Premium"));
    }

    fn write_client_sheet(book: &mut rust_xlsxwriter::Workbook, name: &str) {
        let date_format = rust_xlsxwriter::Format::new().set_num_format("dd-mm-yyyy");
        let dob = rust_xlsxwriter::ExcelDateTime::from_ymd(1990, 4, 1).unwrap();
        let sheet = book.add_worksheet().set_name(name).unwrap();

        let headers = ["Client Name", "DOB", "Age", "City", "Sum Assured", "Policy Term", "PPT"];
        for (i, h) in headers.iter().enumerate() {
            sheet.write_string(2, 1 + i as u16, *h).unwrap();
        }
        sheet.write_string(3, 1, "Ravi Kumar").unwrap();
        sheet.write_datetime_with_format(3, 2, &dob, &date_format).unwrap();
        sheet.write_string(3, 4, "Pune").unwrap();
        sheet.write_number(3, 5, 10_000_000.0).unwrap();
        sheet.write_number(3, 6, 10.0).unwrap();
        sheet.write_number(3, 7, 15.0).unwrap();
    }

    fn write_premium_sheet(book: &mut rust_xlsxwriter::Workbook, name: &str) {
        let sheet = book.add_worksheet().set_name(name).unwrap();

        let headers = ["Insurance Company", "Plan Name", "Regular Premium", "10 Pay", "Special Notes"];
        for (i, h) in headers.iter().enumerate() {
            sheet.write_string(0, i as u16, *h).unwrap();
        }
        sheet.write_string(1, 0, "HDFC Life").unwrap();
        sheet.write_string(1, 1, "Click 2 Protect").unwrap();
        sheet.write_number(1, 2, 15_000.0).unwrap();
        sheet.write_string(1, 3, "₹ 32,000").unwrap();
        sheet.write_string(2, 0, "ICICI Pru").unwrap();
        sheet.write_string(2, 1, "iProtect Smart").unwrap();
    }

    #[test]
    fn test_generate_from_xlsx_bytes() {
        let mut book = rust_xlsxwriter::Workbook::new();
        write_client_sheet(&mut book, "Client Details");
        write_premium_sheet(&mut book, "Premiums");
        let notes = book.add_worksheet().set_name("Final Notes").unwrap();
        notes.write_string(0, 0, "Final Notes").unwrap();
        notes.write_string(1, 0, "Prefer the 10 Pay option.").unwrap();
        let bytes = book.save_to_buffer().unwrap();

        let output = QuotePipeline::default().generate_at(&bytes, at()).unwrap();
        let client = output.document.client_details().unwrap();
        let value = |label: &str| client.rows.iter().find(|r| r.label == label).unwrap().value.clone();

        assert_eq!(value("DOB"), "01-04-1990");
        assert_eq!(value("Age"), "34");
        assert_eq!(value("Sum Assured"), "₹ 1,00,00,000");
        assert_eq!(client.warnings, vec![ModelWarning::PptExceedsPolicyTerm { ppt: 15, policy_term: 10 }]);

        let table = output.document.premium_table().unwrap();
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0][3], "₹ 32,000");

        assert!(output.warnings.contains(&ModelWarning::PremiumOptionDropped {
            row: 3,
            plan: Some("iProtect Smart".to_string()),
            reason: crate::models::DropReason::NoPremium,
        }));
        assert_eq!(
            output.document.section_kinds(),
            vec![
                SectionKind::Header,
                SectionKind::ClientDetails,
                SectionKind::CoverDetails,
                SectionKind::PremiumComparison,
                SectionKind::FinalNotes,
                SectionKind::DataNotes,
                SectionKind::Contact,
            ]
        );
        assert!(output.rendered.bytes.starts_with(b"PK"));
    }

    #[test]
    fn test_generate_from_two_xlsx_files() {
        let mut client_book = rust_xlsxwriter::Workbook::new();
        write_client_sheet(&mut client_book, "Sheet1");
        let mut premium_book = rust_xlsxwriter::Workbook::new();
        write_premium_sheet(&mut premium_book, "Quotes");

        let output = QuotePipeline::default()
            .generate_from_parts(
                &client_book.save_to_buffer().unwrap(),
                &premium_book.save_to_buffer().unwrap(),
                at(),
            )
            .unwrap();

        assert_eq!(output.document.client_details().unwrap().rows[0].value, "Ravi Kumar");
        assert_eq!(output.document.premium_table().unwrap().rows.len(), 1);
        assert!(!output.document.section_kinds().contains(&SectionKind::FinalNotes));
        assert_eq!(output.warnings.len(), 2);
    }

    #[test]
    fn test_unreadable_bytes() {
        let err = QuotePipeline::default().generate_at(b"not a workbook", at()).unwrap_err();
        assert_eq!(err.kind(), "workbook");
    }

    #[test]
    fn test_quote_file_name() {
        assert_eq!(quote_file_name("Ravi Kumar"), "ravi-kumar_term_quote_final.docx");
        assert_eq!(quote_file_name("  "), "term_quote_final.docx");

        let output = QuotePipeline::default()
            .generate_from_workbook(&quote_workbook(standard_client(), vec![], None), at())
            .unwrap()
            .with_source_name("uploads/Term_Quote_Input.xlsx");
        assert_eq!(output.file_name, "term-quote-input_term_quote_final.docx");
    }
}
