//! Workbook schema validation.
//!
//! Confirms the required sheets and columns exist before anything is
//! extracted, and resolves each configured column to its position in the
//! sheet. Extraction then works against typed layouts instead of looking
//! headers up by string.
//!
//! # Rules
//!
//! - The client and premium sheets are required (exact sheet name).
//! - The header row is the first non-blank row of each sheet.
//! - Headers match case-sensitively after trimming, against the column's
//!   canonical name or any of its aliases.
//! - The notes sheet is optional and has no column requirements.
//! - Any other labelled client column is kept as an extra column.
//!
//! # Example
//!
//! ```rust,ignore
//! use termquote::{read_workbook_file, SchemaValidator, QuoteConfig};
//!
//! let config = QuoteConfig::default();
//! let workbook = read_workbook_file("quote.xlsx")?;
//! let validated = SchemaValidator::new(&config.schema).validate(&workbook)?;
//! println!("Plan names in column {}", validated.premiums.plan_name);
//! ```

use crate::config::{HeaderSpec, SchemaConfig};
use crate::error::SchemaError;
use crate::parser::{Sheet, Workbook};

/// Column positions of the client sheet (grid indices).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientLayout {
    pub header_row: usize,
    pub client_name: usize,
    pub dob: usize,
    pub age: usize,
    pub city: usize,
    pub sum_assured: usize,
    pub policy_term: usize,
    pub ppt: usize,
    /// Labelled columns outside the schema, as (index, header), in sheet order.
    pub extra_columns: Vec<(usize, String)>,
}

/// Column positions of the premium sheet (grid indices).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PremiumLayout {
    pub header_row: usize,
    pub insurance_company: usize,
    pub plan_name: usize,
    pub regular_premium: usize,
    pub ten_pay_premium: usize,
    pub special_notes: usize,
}

/// A workbook whose structure has been checked.
#[derive(Debug, Clone)]
pub struct ValidatedWorkbook<'a> {
    pub client_sheet: &'a Sheet,
    pub client: ClientLayout,
    pub premium_sheet: &'a Sheet,
    pub premiums: PremiumLayout,
    pub notes_sheet: Option<&'a Sheet>,
}

/// Checks a workbook against a [`SchemaConfig`].
#[derive(Debug, Clone, Copy)]
pub struct SchemaValidator<'c> {
    schema: &'c SchemaConfig,
}

impl<'c> SchemaValidator<'c> {
    pub fn new(schema: &'c SchemaConfig) -> Self {
        Self { schema }
    }

    /// Validate sheets, then columns. Stops at the first sheet with problems.
    pub fn validate<'a>(&self, workbook: &'a Workbook) -> Result<ValidatedWorkbook<'a>, SchemaError> {
        let client_sheet = require_sheet(workbook, &self.schema.client_sheet)?;
        let premium_sheet = require_sheet(workbook, &self.schema.premium_sheet)?;

        let client = self.client_layout(client_sheet)?;
        let premiums = self.premium_layout(premium_sheet)?;

        Ok(ValidatedWorkbook {
            client_sheet,
            client,
            premium_sheet,
            premiums,
            notes_sheet: workbook.sheet(&self.schema.notes_sheet),
        })
    }

    fn client_layout(&self, sheet: &Sheet) -> Result<ClientLayout, SchemaError> {
        let cols = &self.schema.client_columns;
        let mut resolver = ColumnResolver::new(sheet)?;

        let layout = ClientLayout {
            header_row: resolver.header_row,
            client_name: resolver.find(&cols.client_name),
            dob: resolver.find(&cols.dob),
            age: resolver.find(&cols.age),
            city: resolver.find(&cols.city),
            sum_assured: resolver.find(&cols.sum_assured),
            policy_term: resolver.find(&cols.policy_term),
            ppt: resolver.find(&cols.ppt),
            extra_columns: resolver.unmatched(),
        };

        resolver.finish()?;
        Ok(layout)
    }

    fn premium_layout(&self, sheet: &Sheet) -> Result<PremiumLayout, SchemaError> {
        let cols = &self.schema.premium_columns;
        let mut resolver = ColumnResolver::new(sheet)?;

        let layout = PremiumLayout {
            header_row: resolver.header_row,
            insurance_company: resolver.find(&cols.insurance_company),
            plan_name: resolver.find(&cols.plan_name),
            regular_premium: resolver.find(&cols.regular_premium),
            ten_pay_premium: resolver.find(&cols.ten_pay_premium),
            special_notes: resolver.find(&cols.special_notes),
        };

        resolver.finish()?;
        Ok(layout)
    }
}

fn require_sheet<'a>(workbook: &'a Workbook, name: &str) -> Result<&'a Sheet, SchemaError> {
    workbook
        .sheet(name)
        .ok_or_else(|| SchemaError::MissingSheet { sheet: name.to_string() })
}

/// Looks columns up in a header row, remembering which ones were missing.
struct ColumnResolver<'s> {
    sheet: &'s Sheet,
    header_row: usize,
    headers: Vec<String>,
    matched: Vec<usize>,
    missing: Vec<String>,
}

impl<'s> ColumnResolver<'s> {
    fn new(sheet: &'s Sheet) -> Result<Self, SchemaError> {
        let header_row = sheet
            .first_non_blank_row()
            .ok_or_else(|| SchemaError::NoHeaderRow { sheet: sheet.name.clone() })?;

        let headers = sheet.rows[header_row].iter().map(|c| c.display()).collect();

        Ok(Self {
            sheet,
            header_row,
            headers,
            matched: Vec::new(),
            missing: Vec::new(),
        })
    }

    /// Index of the column, or `usize::MAX` (recorded as missing).
    fn find(&mut self, column: &HeaderSpec) -> usize {
        match self.headers.iter().position(|h| column.matches(h)) {
            Some(index) => {
                self.matched.push(index);
                index
            }
            None => {
                self.missing.push(column.name.clone());
                usize::MAX
            }
        }
    }

    /// Non-blank headers no lookup has claimed.
    fn unmatched(&self) -> Vec<(usize, String)> {
        self.headers
            .iter()
            .enumerate()
            .filter(|(i, h)| !h.is_empty() && !self.matched.contains(i))
            .map(|(i, h)| (i, h.clone()))
            .collect()
    }

    fn finish(self) -> Result<(), SchemaError> {
        if self.missing.is_empty() {
            Ok(())
        } else {
            Err(SchemaError::MissingColumns {
                sheet: self.sheet.name.clone(),
                columns: self.missing,
            })
        }
    }
}

/// Check a workbook without keeping the resolved layout.
pub fn validate(schema: &SchemaConfig, workbook: &Workbook) -> Result<(), SchemaError> {
    SchemaValidator::new(schema).validate(workbook).map(|_| ())
}

/// Quick structural check.
pub fn is_valid(schema: &SchemaConfig, workbook: &Workbook) -> bool {
    validate(schema, workbook).is_ok()
}
