//! Record extraction.
//!
//! Turns the cells of a validated workbook into typed records. Every field has
//! an explicit coercion rule and a named failure, so a bad cell is reported by
//! sheet, row and column instead of surfacing as a formatting oddity in the
//! rendered quote.

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::config::{HeaderSpec, SchemaConfig};
use crate::error::{ExtractionError, ExtractionResult};
use crate::models::{ClientDetails, DropReason, FinalNotes, ModelWarning, Money, PremiumOption};
use crate::parser::{Cell, Sheet};
use crate::validation::ValidatedWorkbook;

/// Date formats accepted in text cells, tried in order.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y", "%d.%m.%Y"];

/// Currency markers stripped from numeric text.
const CURRENCY_PREFIXES: &[&str] = &["INR", "Rs.", "Rs", "rs.", "rs"];

/// Excel's day zero for serial dates (1900 date system).
const EXCEL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

/// Everything read from one workbook.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Extraction {
    pub client: ClientDetails,
    /// Kept premium options, in sheet order.
    pub premiums: Vec<PremiumOption>,
    pub notes: Option<FinalNotes>,
    /// Rows dropped during extraction.
    pub warnings: Vec<ModelWarning>,
}

/// Reads typed records out of a [`ValidatedWorkbook`].
#[derive(Debug, Clone, Copy)]
pub struct RecordExtractor<'c> {
    schema: &'c SchemaConfig,
}

impl<'c> RecordExtractor<'c> {
    pub fn new(schema: &'c SchemaConfig) -> Self {
        Self { schema }
    }

    /// Extract client, premium options and notes.
    pub fn extract(&self, workbook: &ValidatedWorkbook<'_>) -> ExtractionResult<Extraction> {
        let client = self.client(workbook)?;
        let (premiums, warnings) = self.premiums(workbook)?;
        let notes = workbook.notes_sheet.and_then(|sheet| self.notes(sheet));

        Ok(Extraction {
            client,
            premiums,
            notes,
            warnings,
        })
    }

    fn client(&self, workbook: &ValidatedWorkbook<'_>) -> ExtractionResult<ClientDetails> {
        let sheet = workbook.client_sheet;
        let layout = &workbook.client;
        let cols = &self.schema.client_columns;

        let row = (layout.header_row + 1..sheet.rows.len())
            .find(|&i| !sheet.is_blank_row(i))
            .ok_or_else(|| ExtractionError::NoClientRow { sheet: sheet.name.clone() })?;
        let cells = RowReader::new(sheet, row);

        let name = cells.text(layout.client_name).ok_or_else(|| ExtractionError::MissingValue {
            sheet: sheet.name.clone(),
            row: sheet.row_number(row),
            column: cols.client_name.name.clone(),
        })?;

        Ok(ClientDetails {
            name,
            date_of_birth: cells.date(layout.dob, &cols.dob)?,
            age: cells.whole(layout.age, &cols.age)?,
            city: cells.text(layout.city),
            sum_assured: cells.money(layout.sum_assured, &cols.sum_assured)?,
            policy_term: cells.whole(layout.policy_term, &cols.policy_term)?,
            ppt: cells.whole(layout.ppt, &cols.ppt)?,
            extra: layout
                .extra_columns
                .iter()
                .filter_map(|(col, header)| cells.text(*col).map(|value| (header.clone(), value)))
                .collect(),
        })
    }

    fn premiums(
        &self,
        workbook: &ValidatedWorkbook<'_>,
    ) -> ExtractionResult<(Vec<PremiumOption>, Vec<ModelWarning>)> {
        let sheet = workbook.premium_sheet;
        let layout = &workbook.premiums;
        let cols = &self.schema.premium_columns;

        let mut options = Vec::new();
        let mut warnings = Vec::new();

        for row in layout.header_row + 1..sheet.rows.len() {
            if sheet.is_blank_row(row) {
                continue;
            }
            let cells = RowReader::new(sheet, row);
            let row_number = sheet.row_number(row);

            let Some(plan_name) = cells.text(layout.plan_name) else {
                warnings.push(ModelWarning::PremiumOptionDropped {
                    row: row_number,
                    plan: None,
                    reason: DropReason::NoPlanName,
                });
                continue;
            };

            let regular_premium = cells.money(layout.regular_premium, &cols.regular_premium)?;
            let ten_pay_premium = cells.money(layout.ten_pay_premium, &cols.ten_pay_premium)?;

            if regular_premium.is_none() && ten_pay_premium.is_none() {
                warnings.push(ModelWarning::PremiumOptionDropped {
                    row: row_number,
                    plan: Some(plan_name),
                    reason: DropReason::NoPremium,
                });
                continue;
            }

            options.push(PremiumOption {
                row: row_number,
                insurance_company: cells.text(layout.insurance_company).unwrap_or_default(),
                plan_name,
                regular_premium,
                ten_pay_premium,
                special_notes: cells.text(layout.special_notes),
            });
        }

        Ok((options, warnings))
    }

    /// One paragraph per non-blank row; a leading header row is skipped.
    fn notes(&self, sheet: &Sheet) -> Option<FinalNotes> {
        let start = sheet.first_non_blank_row()?;

        let paragraphs: Vec<String> = (start..sheet.rows.len())
            .map(|i| {
                sheet.rows[i]
                    .iter()
                    .filter(|c| !c.is_empty())
                    .map(Cell::display)
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect();

        let skip = usize::from(
            paragraphs
                .first()
                .is_some_and(|first| self.schema.notes_headers.iter().any(|h| h == first)),
        );

        FinalNotes::from_paragraphs(paragraphs.into_iter().skip(skip).collect())
    }
}

/// Typed access to the cells of one data row.
struct RowReader<'s> {
    sheet: &'s Sheet,
    row: usize,
}

impl<'s> RowReader<'s> {
    fn new(sheet: &'s Sheet, row: usize) -> Self {
        Self { sheet, row }
    }

    fn cell(&self, col: usize) -> &'s Cell {
        self.sheet.cell(self.row, col)
    }

    fn invalid(&self, col: usize, column: &HeaderSpec, expected: &'static str) -> ExtractionError {
        ExtractionError::InvalidCell {
            sheet: self.sheet.name.clone(),
            row: self.sheet.row_number(self.row),
            column: column.name.clone(),
            value: self.cell(col).display(),
            expected,
        }
    }

    /// Any non-blank cell as trimmed text.
    fn text(&self, col: usize) -> Option<String> {
        let cell = self.cell(col);
        if cell.is_empty() {
            None
        } else {
            Some(cell.display()).filter(|s| !s.is_empty())
        }
    }

    fn number(&self, col: usize, column: &HeaderSpec) -> ExtractionResult<Option<f64>> {
        match self.cell(col) {
            Cell::Empty => Ok(None),
            Cell::Number(n) => Ok(Some(*n)),
            Cell::Text(s) => parse_numeric_text(s)
                .map(Some)
                .ok_or_else(|| self.invalid(col, column, "a number")),
            _ => Err(self.invalid(col, column, "a number")),
        }
    }

    fn money(&self, col: usize, column: &HeaderSpec) -> ExtractionResult<Option<Money>> {
        match self.number(col, column)? {
            None => Ok(None),
            Some(n) => Money::new(n)
                .map(Some)
                .ok_or_else(|| self.invalid(col, column, "a non-negative amount")),
        }
    }

    fn whole(&self, col: usize, column: &HeaderSpec) -> ExtractionResult<Option<u32>> {
        match self.number(col, column)? {
            None => Ok(None),
            Some(n) if n >= 0.0 && n.fract() == 0.0 && n <= f64::from(u32::MAX) => Ok(Some(n as u32)),
            Some(_) => Err(self.invalid(col, column, "a non-negative whole number")),
        }
    }

    fn date(&self, col: usize, column: &HeaderSpec) -> ExtractionResult<Option<NaiveDate>> {
        let parsed = match self.cell(col) {
            Cell::Empty => return Ok(None),
            Cell::DateTime(dt) => Some(dt.date()),
            Cell::Number(n) => from_excel_serial(*n),
            Cell::Text(s) => parse_date_text(s.trim()),
            _ => None,
        };
        parsed.map(Some).ok_or_else(|| self.invalid(col, column, "a date"))
    }
}

/// Parse amounts typed as text, e.g. `"₹ 12,500"` or `"Rs. 9,999.50"`.
pub fn parse_numeric_text(s: &str) -> Option<f64> {
    let compact: String = s
        .chars()
        .filter(|c| !matches!(c, ',' | ' ' | '\u{a0}' | '₹'))
        .collect();

    let digits = CURRENCY_PREFIXES
        .iter()
        .find_map(|p| compact.strip_prefix(p))
        .unwrap_or(&compact);

    if digits.is_empty() {
        return None;
    }
    digits.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Parse a date typed as text in one of the accepted formats.
pub fn parse_date_text(s: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// Convert an Excel serial day number (1900 system) to a date.
pub fn from_excel_serial(serial: f64) -> Option<NaiveDate> {
    if !(1.0..2_958_466.0).contains(&serial) {
        return None;
    }
    let (y, m, d) = EXCEL_EPOCH;
    NaiveDate::from_ymd_opt(y, m, d)?.checked_add_days(Days::new(serial.trunc() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Workbook;
    use crate::validation::SchemaValidator;

    fn t(s: &str) -> Cell {
        Cell::text(s)
    }

    fn n(v: f64) -> Cell {
        Cell::Number(v)
    }

    fn client_header() -> Vec<Cell> {
        ["Client Name", "DOB", "Age", "City", "Sum Assured", "Policy Term", "PPT"]
            .iter()
            .map(|h| t(h))
            .collect()
    }

    fn premium_header() -> Vec<Cell> {
        ["Insurance Company", "Plan Name", "Regular Premium", "10 Pay Premium", "Special Notes"]
            .iter()
            .map(|h| t(h))
            .collect()
    }

    fn workbook(client_row: Vec<Cell>, premium_rows: Vec<Vec<Cell>>, notes: Option<Sheet>) -> Workbook {
        let mut premiums = vec![premium_header()];
        premiums.extend(premium_rows);

        let mut sheets = vec![
            Sheet::new("Client Details", vec![client_header(), client_row]),
            Sheet::new("Premiums", premiums),
        ];
        sheets.extend(notes);
        Workbook::new(sheets)
    }

    fn standard_client() -> Vec<Cell> {
        vec![
            t("Ravi Kumar"),
            Cell::date(NaiveDate::from_ymd_opt(1990, 4, 1).unwrap()),
            n(34.0),
            t("Pune"),
            n(10_000_000.0),
            n(40.0),
            n(10.0),
        ]
    }

    fn run(wb: &Workbook) -> ExtractionResult<Extraction> {
        let schema = SchemaConfig::default();
        let validated = SchemaValidator::new(&schema).validate(wb).unwrap();
        RecordExtractor::new(&schema).extract(&validated)
    }

    #[test]
    fn test_client_fields() {
        let wb = workbook(standard_client(), vec![], None);
        let client = run(&wb).unwrap().client;

        assert_eq!(client.name, "Ravi Kumar");
        assert_eq!(client.date_of_birth, NaiveDate::from_ymd_opt(1990, 4, 1));
        assert_eq!(client.age, Some(34));
        assert_eq!(client.city.as_deref(), Some("Pune"));
        assert_eq!(client.sum_assured, Money::new(10_000_000.0));
        assert_eq!(client.policy_term, Some(40));
        assert_eq!(client.ppt, Some(10));
    }

    #[test]
    fn test_extra_client_columns_carried() {
        let mut wb = workbook(standard_client(), vec![], None);
        let client_sheet = &mut wb.sheets[0];
        client_sheet.rows[0].extend([t("Advisor"), t("Annual Income"), t("Smoker")]);
        client_sheet.rows[1].extend([t("Meera"), n(1_800_000.0), Cell::Empty]);

        let client = run(&wb).unwrap().client;
        assert_eq!(
            client.extra,
            vec![
                ("Advisor".to_string(), "Meera".to_string()),
                ("Annual Income".to_string(), "1800000".to_string()),
            ]
        );
        assert_eq!(client.ppt, Some(10));
    }

    #[test]
    fn test_blank_client_cells_are_not_provided() {
        let row = vec![t("Meera"), Cell::Empty, Cell::Empty, Cell::Empty, Cell::Empty, Cell::Empty, Cell::Empty];
        let client = run(&workbook(row, vec![], None)).unwrap().client;

        assert_eq!(client, ClientDetails::new("Meera"));
    }

    #[test]
    fn test_negative_age_rejected() {
        let mut row = standard_client();
        row[2] = n(-3.0);
        let err = run(&workbook(row, vec![], None)).unwrap_err();

        assert!(matches!(err, ExtractionError::InvalidCell { ref column, row: 2, .. } if column == "Age"));
    }

    #[test]
    fn test_implausible_sum_assured_rejected() {
        let mut row = standard_client();
        row[4] = n(1e20);
        let err = run(&workbook(row, vec![], None)).unwrap_err();

        assert!(matches!(
            err,
            ExtractionError::InvalidCell { ref column, row: 2, expected, .. }
                if column == "Sum Assured" && expected == "a non-negative amount"
        ));
    }

    #[test]
    fn test_missing_client_name() {
        let mut row = standard_client();
        row[0] = Cell::Empty;
        let err = run(&workbook(row, vec![], None)).unwrap_err();

        assert_eq!(
            err,
            ExtractionError::MissingValue {
                sheet: "Client Details".into(),
                row: 2,
                column: "Client Name".into(),
            }
        );
    }

    #[test]
    fn test_no_client_row() {
        let wb = workbook(vec![], vec![], None);
        let err = run(&wb).unwrap_err();
        assert_eq!(err, ExtractionError::NoClientRow { sheet: "Client Details".into() });
    }

    #[test]
    fn test_text_dates_and_serials() {
        let mut row = standard_client();
        row[1] = t("01/04/1990");
        assert_eq!(
            run(&workbook(row.clone(), vec![], None)).unwrap().client.date_of_birth,
            NaiveDate::from_ymd_opt(1990, 4, 1)
        );

        row[1] = n(32964.0);
        assert_eq!(
            run(&workbook(row.clone(), vec![], None)).unwrap().client.date_of_birth,
            NaiveDate::from_ymd_opt(1990, 4, 1)
        );

        row[1] = t("sometime in April");
        let err = run(&workbook(row, vec![], None)).unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidCell { expected: "a date", .. }));
    }

    #[test]
    fn test_premium_rows_in_order() {
        let rows = vec![
            vec![t("HDFC Life"), t("Click 2 Protect"), n(15_000.0), n(32_000.0), t("Return of premium")],
            vec![],
            vec![t("ICICI Pru"), t("iProtect Smart"), n(14_500.0), Cell::Empty, Cell::Empty],
        ];
        let extraction = run(&workbook(standard_client(), rows, None)).unwrap();

        let plans: Vec<&str> = extraction.premiums.iter().map(|p| p.plan_name.as_str()).collect();
        assert_eq!(plans, vec!["Click 2 Protect", "iProtect Smart"]);
        assert_eq!(extraction.premiums[1].row, 4);
        assert!(extraction.premiums[1].ten_pay_premium.is_none());
        assert!(extraction.warnings.is_empty());
    }

    #[test]
    fn test_row_without_premiums_dropped_with_warning() {
        let rows = vec![
            vec![t("Tata AIA"), t("Sampoorna Raksha"), Cell::Empty, Cell::Empty, t("Awaiting quote")],
            vec![t("Max Life"), t("Smart Secure"), n(13_900.0), Cell::Empty, Cell::Empty],
        ];
        let extraction = run(&workbook(standard_client(), rows, None)).unwrap();

        assert_eq!(extraction.premiums.len(), 1);
        assert_eq!(extraction.premiums[0].plan_name, "Smart Secure");
        assert_eq!(
            extraction.warnings,
            vec![ModelWarning::PremiumOptionDropped {
                row: 2,
                plan: Some("Sampoorna Raksha".into()),
                reason: DropReason::NoPremium,
            }]
        );
    }

    #[test]
    fn test_row_without_plan_name_dropped() {
        let rows = vec![vec![t("* premiums include GST"), Cell::Empty, t("n/a"), Cell::Empty, Cell::Empty]];
        let extraction = run(&workbook(standard_client(), rows, None)).unwrap();

        assert!(extraction.premiums.is_empty());
        assert!(matches!(
            extraction.warnings[0],
            ModelWarning::PremiumOptionDropped { reason: DropReason::NoPlanName, plan: None, row: 2 }
        ));
    }

    #[test]
    fn test_non_numeric_premium_is_error() {
        let rows = vec![vec![t("LIC"), t("Tech Term"), t("on request"), Cell::Empty, Cell::Empty]];
        let err = run(&workbook(standard_client(), rows, None)).unwrap_err();

        assert_eq!(
            err,
            ExtractionError::InvalidCell {
                sheet: "Premiums".into(),
                row: 2,
                column: "Regular Premium".into(),
                value: "on request".into(),
                expected: "a number",
            }
        );
    }

    #[test]
    fn test_numeric_text_tolerated() {
        let rows = vec![vec![t("LIC"), t("Tech Term"), t("₹ 12,500"), t("Rs. 25,000.50"), Cell::Empty]];
        let premium = run(&workbook(standard_client(), rows, None)).unwrap().premiums.remove(0);

        assert_eq!(premium.regular_premium, Money::new(12_500.0));
        assert_eq!(premium.ten_pay_premium, Money::new(25_000.5));
    }

    #[test]
    fn test_notes_paragraphs_skip_header() {
        let notes = Sheet::new(
            "Final Notes",
            vec![
                vec![t("Final Notes")],
                vec![t("10 Pay builds cover faster."), t("Ask about riders.")],
                vec![],
                vec![t("System-generated quote.")],
            ],
        );
        let extraction = run(&workbook(standard_client(), vec![], Some(notes))).unwrap();

        assert_eq!(
            extraction.notes.unwrap().paragraphs,
            vec!["10 Pay builds cover faster. Ask about riders.", "System-generated quote."]
        );
    }

    #[test]
    fn test_empty_notes_sheet_is_none() {
        let notes = Sheet::new("Final Notes", vec![vec![t("Notes")], vec![Cell::Empty]]);
        let extraction = run(&workbook(standard_client(), vec![], Some(notes))).unwrap();
        assert!(extraction.notes.is_none());

        let extraction = run(&workbook(standard_client(), vec![], Some(Sheet::new("Final Notes", vec![])))).unwrap();
        assert!(extraction.notes.is_none());
    }

    #[test]
    fn test_parse_numeric_text() {
        assert_eq!(parse_numeric_text("1,00,000"), Some(100_000.0));
        assert_eq!(parse_numeric_text("INR 500"), Some(500.0));
        assert_eq!(parse_numeric_text("₹"), None);
        assert_eq!(parse_numeric_text("abc"), None);
    }

    #[test]
    fn test_excel_serial_bounds() {
        assert_eq!(from_excel_serial(1.0), NaiveDate::from_ymd_opt(1899, 12, 31));
        assert_eq!(from_excel_serial(0.0), None);
        assert_eq!(from_excel_serial(-5.0), None);
    }
}
