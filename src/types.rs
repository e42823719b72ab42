//! Core data model for loaded workbooks.
//!
//! A [`Workbook`] is an ordered list of [`Sheet`]s. Each sheet keeps its raw cell grid split into
//! a header row and data rows; cells are untyped [`Value`]s exactly as the source file stored them.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// A single cell value.
///
/// Serializes "untagged": `Null` as JSON `null`, numbers and date serials as JSON numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Missing/empty cell.
    Null,
    /// Boolean.
    Bool(bool),
    /// Plain number.
    Number(f64),
    /// Number the source file marked as a date/time (spreadsheet serial, 1900 date system).
    DateTime(f64),
    /// UTF-8 string.
    Utf8(String),
}

impl Value {
    /// Build a string cell.
    pub fn text(s: impl Into<String>) -> Self {
        Self::Utf8(s.into())
    }

    /// Returns `true` for absent values and values whose string form trims to `""`.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Utf8(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Numeric payload of number-like cells (plain numbers and date serials).
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) | Self::DateTime(n) => Some(*n),
            _ => None,
        }
    }

    /// String payload of string cells.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Utf8(s) => Some(s),
            _ => None,
        }
    }

    /// String coercion used by every text-based predicate. `Null` becomes `""`.
    pub fn to_text(&self) -> Cow<'_, str> {
        match self {
            Self::Null => Cow::Borrowed(""),
            Self::Utf8(s) => Cow::Borrowed(s.as_str()),
            Self::Bool(b) => Cow::Borrowed(if *b { "true" } else { "false" }),
            Self::Number(n) | Self::DateTime(n) => Cow::Owned(format_number(*n)),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_text())
    }
}

/// Render a number the way spreadsheet users expect to read it back (`30`, not `30.0`).
pub fn format_number(n: f64) -> String {
    if n == 0.0 {
        // Normalizes -0.0.
        return "0".to_string();
    }
    n.to_string()
}

/// Strict decimal parse of a trimmed string.
///
/// The whole string must be a finite number; `inf`/`NaN` spellings and numeric prefixes such as
/// `"12abc"` are rejected.
pub fn parse_number(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() || !s.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// One worksheet: a header row plus data rows aligned positionally to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sheet {
    /// Sheet name, unique within its workbook.
    pub name: String,
    /// First row of the grid, as raw cell values.
    pub header: Vec<Value>,
    /// Remaining rows. Rows may be shorter or longer than the header.
    pub rows: Vec<Vec<Value>>,
    /// Zero-based (row, column) of the grid's top-left cell in the source sheet.
    pub origin: (u32, u32),
    /// Formula cells of the source sheet. Their cached results stay in the grid.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub formulas: Vec<CellFormula>,
}

/// A formula read from a source cell, positioned in source-sheet coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellFormula {
    /// Zero-based row in the source sheet.
    pub row: u32,
    /// Zero-based column in the source sheet.
    pub col: u32,
    /// Formula text as stored, without a leading `=`.
    pub formula: String,
}

impl Sheet {
    /// Create a sheet from a full cell grid; the first row becomes the header.
    pub fn from_grid(name: impl Into<String>, mut grid: Vec<Vec<Value>>) -> Self {
        let header = if grid.is_empty() {
            Vec::new()
        } else {
            grid.remove(0)
        };
        Self {
            name: name.into(),
            header,
            rows: grid,
            origin: (0, 0),
            formulas: Vec::new(),
        }
    }

    /// Set the position of the grid inside the source sheet.
    pub fn with_origin(mut self, origin: (u32, u32)) -> Self {
        self.origin = origin;
        self
    }

    /// Attach the formula cells read from the source sheet.
    pub fn with_formulas(mut self, formulas: Vec<CellFormula>) -> Self {
        self.formulas = formulas;
        self
    }

    /// Cell at a source-sheet position, if it lies inside the loaded grid.
    pub fn cell_at(&self, row: u32, col: u32) -> Option<&Value> {
        let (row0, col0) = self.origin;
        let r = usize::try_from(row.checked_sub(row0)?).ok()?;
        let c = usize::try_from(col.checked_sub(col0)?).ok()?;
        match r {
            0 => self.header.get(c),
            _ => self.rows.get(r - 1)?.get(c),
        }
    }

    /// Number of data rows (header excluded).
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` when the sheet has no data rows to scan.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column names derived from the header: string-coerced and trimmed.
    ///
    /// Empty or whitespace-only header cells yield `None`; such positions are not treated as
    /// columns.
    pub fn column_names(&self) -> Vec<Option<String>> {
        self.header
            .iter()
            .map(|cell| {
                let name = cell.to_text().trim().to_string();
                (!name.is_empty()).then_some(name)
            })
            .collect()
    }

    /// Returns the index of the first column with the given (trimmed) name, if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.column_names()
            .iter()
            .position(|c| c.as_deref() == Some(name))
    }

    /// Full grid (header followed by data rows), as it was loaded.
    pub fn grid(&self) -> impl Iterator<Item = &[Value]> {
        std::iter::once(self.header.as_slice())
            .filter(|h| !h.is_empty() || !self.rows.is_empty())
            .chain(self.rows.iter().map(|r| r.as_slice()))
    }
}

/// An ordered collection of sheets produced by the loader.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Workbook {
    /// Sheets in source order.
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    /// Create a workbook from sheets.
    pub fn new(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }

    /// Iterate sheet names in order.
    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.iter().map(|s| s.name.as_str())
    }

    /// Look up a sheet by exact name.
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// Total number of data rows across all sheets.
    pub fn row_count(&self) -> usize {
        self.sheets.iter().map(Sheet::row_count).sum()
    }
}
