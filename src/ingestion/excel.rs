#![cfg(feature = "excel")]

use std::io::Cursor;
use std::path::Path;

use calamine::{open_workbook_auto_from_rs, Data, Reader};

use crate::error::ValidationResult;
use crate::types::{CellFormula, Sheet, Value, Workbook};

/// Load an Excel document (`.xlsx`, `.xlsm`, `.xlsb`, `.xls`, `.ods`) from a file path.
pub fn load_excel_from_path(path: impl AsRef<Path>) -> ValidationResult<Workbook> {
    let bytes = std::fs::read(path)?;
    load_excel_from_bytes(&bytes)
}

/// Load every sheet of an in-memory Excel document.
///
/// Behavior:
/// - Sheets are returned in workbook order, including sheets with no cells
/// - Each sheet's used range becomes its grid; the first row of that range is the header
/// - Cells keep their stored type (string/number/bool); date cells become [`Value::DateTime`]
///   serials so later passes can read them either as numbers or as dates
/// - Formula cells keep their cached result in the grid; the formula text is kept alongside in
///   [`Sheet::formulas`]
pub fn load_excel_from_bytes(bytes: &[u8]) -> ValidationResult<Workbook> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;

    let names: Vec<String> = workbook.sheet_names().to_vec();
    let mut sheets: Vec<Sheet> = Vec::with_capacity(names.len());
    for name in names {
        let range = workbook.worksheet_range(&name)?;
        let formulas = match workbook.worksheet_formula(&name) {
            Ok(f) => formulas_from_range(&f),
            Err(e) => {
                tracing::debug!(sheet = %name, error = %e, "formulas unavailable; keeping values");
                Vec::new()
            }
        };
        sheets.push(sheet_from_range(&name, &range).with_formulas(formulas));
    }

    tracing::debug!(sheets = sheets.len(), "loaded excel workbook");
    Ok(Workbook::new(sheets))
}

fn sheet_from_range(name: &str, range: &calamine::Range<Data>) -> Sheet {
    if range.is_empty() {
        return Sheet::from_grid(name, Vec::new());
    }

    let grid: Vec<Vec<Value>> = range
        .rows()
        .map(|row| row.iter().map(convert_cell).collect())
        .collect();
    let origin = range.start().unwrap_or((0, 0));
    Sheet::from_grid(name, grid).with_origin(origin)
}

fn formulas_from_range(range: &calamine::Range<String>) -> Vec<CellFormula> {
    let Some((row0, col0)) = range.start() else {
        return Vec::new();
    };
    range
        .used_cells()
        .filter(|(_, _, f)| !f.is_empty())
        .map(|(r, c, f)| CellFormula {
            row: row0 + r as u32,
            col: col0 + c as u32,
            formula: f.trim_start_matches('=').to_string(),
        })
        .collect()
}

/// Convert a calamine cell into a [`Value`] without applying any schema.
pub(crate) fn convert_cell(c: &Data) -> Value {
    match c {
        Data::Empty => Value::Null,
        Data::String(s) => Value::Utf8(s.clone()),
        Data::Int(i) => Value::Number(*i as f64),
        Data::Float(f) => Value::Number(*f),
        Data::Bool(b) => Value::Bool(*b),
        Data::DateTime(dt) => Value::DateTime(dt.as_f64()),
        Data::DateTimeIso(s) => Value::Utf8(s.clone()),
        Data::DurationIso(s) => Value::Utf8(s.clone()),
        Data::Error(e) => Value::Utf8(e.to_string()),
    }
}
