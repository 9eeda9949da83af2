//! The fixed style set applied to every quote.
//!
//! Styles are registered once per document under stable ids, and blocks refer
//! to them by [`NamedStyle`]. Nothing is styled per request.

use docx_rs::{
    Docx, RunFonts, Shading, Style, StyleType, Table, TableBorder, TableBorderPosition,
};
use serde::Serialize;

use crate::config::StyleConfig;

/// Border width in eighths of a point.
const BORDER_SIZE: usize = 4;

/// Paragraph styles used by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NamedStyle {
    Firm,
    Title,
    Heading,
    Body,
    Warning,
}

impl NamedStyle {
    pub const ALL: [NamedStyle; 5] = [
        NamedStyle::Firm,
        NamedStyle::Title,
        NamedStyle::Heading,
        NamedStyle::Body,
        NamedStyle::Warning,
    ];

    /// Style id written into the document.
    pub fn id(self) -> &'static str {
        match self {
            NamedStyle::Firm => "QuoteFirm",
            NamedStyle::Title => "QuoteTitle",
            NamedStyle::Heading => "QuoteHeading",
            NamedStyle::Body => "QuoteBody",
            NamedStyle::Warning => "QuoteWarning",
        }
    }

    /// Name shown in the word processor's style gallery.
    pub fn display_name(self) -> &'static str {
        match self {
            NamedStyle::Firm => "Quote Firm",
            NamedStyle::Title => "Quote Title",
            NamedStyle::Heading => "Quote Heading",
            NamedStyle::Body => "Quote Body",
            NamedStyle::Warning => "Quote Warning",
        }
    }

    fn to_style(self, cfg: &StyleConfig) -> Style {
        let base = Style::new(self.id(), StyleType::Paragraph)
            .name(self.display_name())
            .fonts(fonts(cfg));

        match self {
            NamedStyle::Firm => base.size(cfg.firm_size).bold(),
            NamedStyle::Title => base.size(cfg.title_size).bold(),
            NamedStyle::Heading => base.size(cfg.heading_size).bold(),
            NamedStyle::Body => base.size(cfg.body_size),
            NamedStyle::Warning => base
                .size(cfg.body_size)
                .bold()
                .color(cfg.warning_color.clone()),
        }
    }
}

fn fonts(cfg: &StyleConfig) -> RunFonts {
    RunFonts::new()
        .ascii(&cfg.font)
        .hi_ansi(&cfg.font)
        .east_asia(&cfg.font)
        .cs(&cfg.font)
}

/// Register every named style plus document-wide font defaults.
pub fn register_styles(docx: Docx, cfg: &StyleConfig) -> Docx {
    NamedStyle::ALL
        .iter()
        .fold(docx.default_fonts(fonts(cfg)).default_size(cfg.body_size), |docx, style| {
            docx.add_style(style.to_style(cfg))
        })
}

/// Single-line borders on every edge and inner gridline.
pub fn with_borders(table: Table, cfg: &StyleConfig) -> Table {
    [
        TableBorderPosition::Top,
        TableBorderPosition::Left,
        TableBorderPosition::Bottom,
        TableBorderPosition::Right,
        TableBorderPosition::InsideH,
        TableBorderPosition::InsideV,
    ]
    .into_iter()
    .fold(table, |table, position| {
        table.set_border(
            TableBorder::new(position)
                .size(BORDER_SIZE)
                .color(cfg.border_color.clone()),
        )
    })
}

/// Background of table header cells.
pub fn header_shading(cfg: &StyleConfig) -> Shading {
    Shading::new().fill(cfg.header_fill.clone())
}
