//! DOCX rendering.
//!
//! Rendering happens in two steps:
//!
//! 1. The section list is checked and lowered into an outline of [`Block`]s.
//!    The outline is fully determined by the sections.
//! 2. The outline is written out with docx-rs using the fixed style set.
//!
//! Callers that need to compare two renders structurally compare outlines;
//! the packaged bytes also carry generated element ids.

use docx_rs::{Docx, Paragraph, Run, Table, TableCell, TableRow, WidthType};
use serde::Serialize;
use std::io::Cursor;

use super::model::{QuoteDocument, Section, SectionKind, TableSection, TextSection};
use super::styles::{header_shading, register_styles, with_borders, NamedStyle};
use crate::config::StyleConfig;
use crate::error::RenderError;

/// Full page width in fiftieths of a percent.
const FULL_WIDTH_PCT: usize = 5000;

/// Prefix of warning lines attached to a section.
pub const WARNING_PREFIX: &str = "Warning: ";

/// One laid-out element of the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Block {
    Paragraph { style: NamedStyle, text: String },
    Table { header: Vec<String>, rows: Vec<Vec<String>> },
}

impl Block {
    fn paragraph(style: NamedStyle, text: impl Into<String>) -> Self {
        Block::Paragraph { style, text: text.into() }
    }

    fn heading(text: &str) -> Self {
        Block::paragraph(NamedStyle::Heading, text)
    }
}

/// The rendered artifact plus the outline it was written from.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub outline: Vec<Block>,
    pub bytes: Vec<u8>,
}

/// Writes a [`QuoteDocument`] as `.docx`.
#[derive(Debug, Clone, Copy)]
pub struct DocumentRenderer<'c> {
    styles: &'c StyleConfig,
}

impl<'c> DocumentRenderer<'c> {
    pub fn new(styles: &'c StyleConfig) -> Self {
        Self { styles }
    }

    pub fn render(&self, document: &QuoteDocument) -> Result<RenderedDocument, RenderError> {
        let outline = self.outline(document)?;
        let bytes = self.write(&outline)?;
        Ok(RenderedDocument { outline, bytes })
    }

    /// Check the section list and lower it into blocks.
    pub fn outline(&self, document: &QuoteDocument) -> Result<Vec<Block>, RenderError> {
        check_sections(document)?;

        let mut blocks = Vec::new();
        for section in &document.sections {
            match section {
                Section::Header(h) => {
                    blocks.push(Block::paragraph(NamedStyle::Firm, &h.firm_name));
                    blocks.push(Block::paragraph(NamedStyle::Title, &h.title));
                    blocks.push(Block::paragraph(NamedStyle::Body, format!("Client: {}", h.client_name)));
                    blocks.push(Block::paragraph(NamedStyle::Body, format!("Date: {}", h.generated_at)));
                }
                Section::ClientDetails(c) => {
                    blocks.push(Block::heading(&c.heading));
                    blocks.push(Block::Table {
                        header: vec!["Field".to_string(), "Value".to_string()],
                        rows: c
                            .rows
                            .iter()
                            .map(|r| vec![r.label.clone(), r.value.clone()])
                            .collect(),
                    });
                    for warning in &c.warnings {
                        blocks.push(Block::paragraph(
                            NamedStyle::Warning,
                            format!("{}{}", WARNING_PREFIX, warning),
                        ));
                    }
                }
                Section::CoverDetails(t) | Section::PremiumComparison(t) => {
                    push_table(&mut blocks, t);
                }
                Section::FinalNotes(t) | Section::Contact(t) => {
                    push_text(&mut blocks, t, NamedStyle::Body);
                }
                Section::DataNotes(t) => {
                    push_text(&mut blocks, t, NamedStyle::Warning);
                }
            }
        }

        Ok(blocks)
    }

    fn write(&self, outline: &[Block]) -> Result<Vec<u8>, RenderError> {
        let docx = outline
            .iter()
            .fold(register_styles(Docx::new(), self.styles), |docx, block| match block {
                Block::Paragraph { style, text } => docx.add_paragraph(self.paragraph(*style, text)),
                Block::Table { header, rows } => docx.add_table(self.table(header, rows)),
            });

        let mut buffer = Cursor::new(Vec::new());
        docx.build()
            .pack(&mut buffer)
            .map_err(|e| RenderError::Package(e.to_string()))?;

        Ok(buffer.into_inner())
    }

    fn paragraph(&self, style: NamedStyle, text: &str) -> Paragraph {
        Paragraph::new()
            .style(style.id())
            .add_run(Run::new().add_text(text))
    }

    fn table(&self, header: &[String], rows: &[Vec<String>]) -> Table {
        let header_row = TableRow::new(
            header
                .iter()
                .map(|h| {
                    TableCell::new()
                        .shading(header_shading(self.styles))
                        .add_paragraph(
                            Paragraph::new()
                                .style(NamedStyle::Body.id())
                                .add_run(Run::new().add_text(h).bold()),
                        )
                })
                .collect(),
        );

        let body_rows = rows.iter().map(|row| {
            TableRow::new(
                row.iter()
                    .map(|value| TableCell::new().add_paragraph(self.paragraph(NamedStyle::Body, value)))
                    .collect(),
            )
        });

        let table = Table::new(std::iter::once(header_row).chain(body_rows).collect())
            .width(FULL_WIDTH_PCT, WidthType::Pct);
        with_borders(table, self.styles)
    }
}

fn push_table(blocks: &mut Vec<Block>, table: &TableSection) {
    blocks.push(Block::heading(&table.heading));
    blocks.push(Block::Table {
        header: table.columns.clone(),
        rows: table.rows.clone(),
    });
}

fn push_text(blocks: &mut Vec<Block>, text: &TextSection, style: NamedStyle) {
    blocks.push(Block::heading(&text.heading));
    for paragraph in &text.paragraphs {
        blocks.push(Block::paragraph(style, paragraph));
    }
}

/// Exactly one client-details section is mandatory.
fn check_sections(document: &QuoteDocument) -> Result<(), RenderError> {
    if document.sections.is_empty() {
        return Err(RenderError::EmptyDocument);
    }

    match document
        .sections
        .iter()
        .filter(|s| s.kind() == SectionKind::ClientDetails)
        .count()
    {
        0 => Err(RenderError::MissingClientDetails),
        1 => Ok(()),
        n => Err(RenderError::DuplicateClientDetails(n)),
    }
}
