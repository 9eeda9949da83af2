//! Workbook reader.
//!
//! Loads `.xlsx`, `.xls` or `.ods` bytes with calamine and copies every sheet
//! into a plain [`Workbook`] grid. The rest of the pipeline never touches
//! calamine types, which keeps validation and extraction testable with
//! hand-built workbooks.

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::io::Cursor;
use std::path::Path;

use crate::config::SchemaConfig;
use crate::error::{WorkbookError, WorkbookResult};

/// A single cell value, detached from the file format.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value")]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
    /// Spreadsheet error value such as `#DIV/0!`.
    Error(String),
}

impl Cell {
    /// Text cell, or `Empty` when the text is only whitespace.
    pub fn text(s: impl Into<String>) -> Self {
        let s = s.into();
        if s.trim().is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s)
        }
    }

    /// Date cell at midnight.
    pub fn date(date: NaiveDate) -> Self {
        Cell::DateTime(date.and_hms_opt(0, 0, 0).unwrap_or_default())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// The value as the advisor would read it in the sheet.
    pub fn display(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.trim().to_string(),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Cell::Number(n) => n.to_string(),
            Cell::Bool(b) => b.to_string(),
            Cell::DateTime(dt) => dt.format("%Y-%m-%d").to_string(),
            Cell::Error(e) => e.clone(),
        }
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => Cell::Empty,
            Data::String(s) => Cell::text(s.as_str()),
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Float(f) => Cell::Number(*f),
            Data::Bool(b) => Cell::Bool(*b),
            Data::DateTime(dt) => match dt.as_datetime() {
                Some(naive) if dt.is_datetime() => Cell::DateTime(naive),
                _ => Cell::Number(dt.as_f64()),
            },
            Data::DateTimeIso(s) => parse_iso_datetime(s).map_or_else(|| Cell::text(s.as_str()), Cell::DateTime),
            Data::DurationIso(s) => Cell::text(s.as_str()),
            Data::Error(e) => Cell::Error(e.to_string()),
        }
    }
}

fn parse_iso_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// One worksheet as a rectangular-ish grid of cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sheet {
    pub name: String,
    /// 1-based sheet row number of `rows[0]`.
    pub first_row: usize,
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    /// Sheet whose first grid row is sheet row 1.
    pub fn new(name: impl Into<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self { name: name.into(), first_row: 1, rows }
    }

    /// Sheet row number (1-based) of a grid index.
    pub fn row_number(&self, index: usize) -> usize {
        self.first_row + index
    }

    /// Cell at grid position, `Empty` when out of range.
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        const EMPTY: &Cell = &Cell::Empty;
        self.rows.get(row).and_then(|r| r.get(col)).unwrap_or(EMPTY)
    }

    /// Whether every cell of a row is blank.
    pub fn is_blank_row(&self, row: usize) -> bool {
        self.rows
            .get(row)
            .is_none_or(|cells| cells.iter().all(Cell::is_empty))
    }

    /// Grid index of the first row with any content.
    pub fn first_non_blank_row(&self) -> Option<usize> {
        (0..self.rows.len()).find(|&i| !self.is_blank_row(i))
    }

    /// Whether the sheet holds no content at all.
    pub fn is_blank(&self) -> bool {
        self.first_non_blank_row().is_none()
    }
}

/// All sheets of one uploaded workbook, in file order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }

    /// Sheet by exact name.
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    /// Merge two separately uploaded files into one workbook.
    ///
    /// Each file contributes the sheet carrying the configured name, or its
    /// first sheet renamed to it. A notes sheet found in either file is kept.
    pub fn combine(client: Workbook, premiums: Workbook, schema: &SchemaConfig) -> WorkbookResult<Self> {
        let notes = client
            .sheet(&schema.notes_sheet)
            .or_else(|| premiums.sheet(&schema.notes_sheet))
            .cloned();

        let mut sheets = vec![
            take_sheet(client, &schema.client_sheet)?,
            take_sheet(premiums, &schema.premium_sheet)?,
        ];
        sheets.extend(notes);

        Ok(Self { sheets })
    }
}

fn take_sheet(workbook: Workbook, name: &str) -> WorkbookResult<Sheet> {
    let mut sheets = workbook.sheets;
    let index = sheets.iter().position(|s| s.name == name).unwrap_or(0);
    if sheets.is_empty() {
        return Err(WorkbookError::NoSheets);
    }
    let mut sheet = sheets.swap_remove(index);
    sheet.name = name.to_string();
    Ok(sheet)
}

/// Read a workbook from raw bytes, auto-detecting the format.
pub fn read_workbook_bytes(bytes: &[u8]) -> WorkbookResult<Workbook> {
    let mut source = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| WorkbookError::Unreadable(e.to_string()))?;

    let names = source.sheet_names();
    if names.is_empty() {
        return Err(WorkbookError::NoSheets);
    }

    let mut sheets = Vec::with_capacity(names.len());
    for name in names {
        let range = source.worksheet_range(&name).map_err(|e| WorkbookError::Sheet {
            sheet: name.clone(),
            message: e.to_string(),
        })?;

        let first_row = range.start().map_or(1, |(row, _)| row as usize + 1);
        let rows = range
            .rows()
            .map(|cells| cells.iter().map(Cell::from).collect())
            .collect();

        sheets.push(Sheet { name, first_row, rows });
    }

    Ok(Workbook { sheets })
}

/// Read a workbook file from disk.
pub fn read_workbook_file<P: AsRef<Path>>(path: P) -> WorkbookResult<Workbook> {
    let bytes = std::fs::read(path.as_ref())?;
    read_workbook_bytes(&bytes)
}
