//! Quote document construction.
//!
//! - Model: extracted records → ordered section list ([`QuoteDocument`])
//! - Format: currency, date and age derivations
//! - Styles: the fixed named style set
//! - Render: section list → outline → `.docx` bytes

pub mod format;
pub mod model;
pub mod render;
pub mod styles;

pub use model::{
    BuiltDocument, ClientSection, DocumentModelBuilder, HeaderSection, LabeledValue, QuoteDocument,
    Section, SectionKind, TableSection, TextSection,
};
pub use render::{Block, DocumentRenderer, RenderedDocument};
pub use styles::NamedStyle;
