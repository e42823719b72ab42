//! Annotated workbook export.
//!
//! The exported `.xlsx` holds every original sheet, in order, followed by a `"Validation Summary"`
//! sheet holding [`ValidationReport::to_rows`]. Formula cells are written back as formulas with
//! their cached result.

use chrono::{DateTime, Utc};
use rust_xlsxwriter::{Format, Formula, Workbook as XlsxWorkbook, Worksheet};

use crate::error::{ValidationError, ValidationResult};
use crate::types::{Sheet, Value, Workbook};

use super::summary::ValidationReport;

/// Name of the appended summary sheet.
pub const SUMMARY_SHEET_NAME: &str = "Validation Summary";

const DATE_NUM_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";
const STRIPPED_EXTENSIONS: [&str; 3] = [".xlsx", ".xls", ".csv"];

/// Download name: `Validation_Report_{base}_{YYYY-MM-DD}.xlsx`.
///
/// `base` is `original` minus one trailing `.xlsx`, `.xls` or `.csv`; `"N/A"` stands in for an
/// unknown name. Path separators are replaced so the result is a single file name.
pub fn export_file_name(original: Option<&str>, date: DateTime<Utc>) -> String {
    let name = original.unwrap_or("N/A");
    let base = STRIPPED_EXTENSIONS
        .iter()
        .find_map(|ext| name.strip_suffix(ext))
        .unwrap_or(name)
        .replace(['/', '\\'], "_");
    format!("Validation_Report_{base}_{}.xlsx", date.format("%Y-%m-%d"))
}

/// Write the original sheets plus the summary sheet into a new `.xlsx` buffer.
///
/// Fails with [`ValidationError::Export`] when the workbook already has a sheet named
/// [`SUMMARY_SHEET_NAME`].
pub fn export_workbook(workbook: &Workbook, report: &ValidationReport) -> ValidationResult<Vec<u8>> {
    if workbook.sheet(SUMMARY_SHEET_NAME).is_some() {
        return Err(ValidationError::Export {
            message: format!("workbook already contains a sheet named \"{SUMMARY_SHEET_NAME}\""),
        });
    }

    let date_format = Format::new().set_num_format(DATE_NUM_FORMAT);
    let mut out = XlsxWorkbook::new();

    for sheet in &workbook.sheets {
        let ws = out.add_worksheet().set_name(&sheet.name)?;
        let (row0, col0) = sheet.origin;
        for (r, row) in sheet.grid().enumerate() {
            let r = row0 + to_u32(r, "row")?;
            for (c, value) in row.iter().enumerate() {
                let c = to_u16(col0 as usize + c)?;
                write_cell(ws, r, c, value, &date_format)?;
            }
        }
        write_formulas(ws, sheet, &date_format)?;
    }

    let summary = out.add_worksheet().set_name(SUMMARY_SHEET_NAME)?;
    for (r, row) in report.to_rows().iter().enumerate() {
        let r = to_u32(r, "row")?;
        for (c, value) in row.iter().enumerate() {
            write_cell(summary, r, to_u16(c)?, value, &date_format)?;
        }
    }

    let bytes = out.save_to_buffer()?;
    tracing::debug!(
        sheets = workbook.sheets.len() + 1,
        bytes = bytes.len(),
        "exported annotated workbook"
    );
    Ok(bytes)
}

fn write_cell(
    ws: &mut Worksheet,
    row: u32,
    col: u16,
    value: &Value,
    date_format: &Format,
) -> ValidationResult<()> {
    match value {
        Value::Null => {}
        Value::Bool(b) => {
            ws.write_boolean(row, col, *b)?;
        }
        Value::Number(n) => {
            ws.write_number(row, col, *n)?;
        }
        Value::DateTime(n) => {
            ws.write_number_with_format(row, col, *n, date_format)?;
        }
        Value::Utf8(s) => {
            ws.write_string(row, col, s)?;
        }
    }
    Ok(())
}

fn write_formulas(
    ws: &mut Worksheet,
    sheet: &Sheet,
    date_format: &Format,
) -> ValidationResult<()> {
    for cell in &sheet.formulas {
        let col = to_u16(cell.col as usize)?;
        let cached = sheet.cell_at(cell.row, cell.col);
        let mut formula = Formula::new(&cell.formula);
        if let Some(result) = cached.and_then(formula_result) {
            formula = formula.set_result(result);
        }
        match cached {
            Some(Value::DateTime(_)) => {
                ws.write_formula_with_format(cell.row, col, formula, date_format)?;
            }
            _ => {
                ws.write_formula(cell.row, col, formula)?;
            }
        }
    }
    Ok(())
}

fn formula_result(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Bool(true) => Some("TRUE".to_string()),
        Value::Bool(false) => Some("FALSE".to_string()),
        Value::Number(n) | Value::DateTime(n) => Some(n.to_string()),
        Value::Utf8(s) => Some(s.clone()),
    }
}

fn to_u32(n: usize, what: &str) -> ValidationResult<u32> {
    u32::try_from(n).map_err(|_| ValidationError::Export {
        message: format!("{what} index {n} out of range"),
    })
}

fn to_u16(n: usize) -> ValidationResult<u16> {
    u16::try_from(n).map_err(|_| ValidationError::Export {
        message: format!("column index {n} out of range"),
    })
}
