//! CSV loading.
//!
//! A CSV file becomes a one-sheet [`Workbook`]. The first record is the header; records may have
//! differing lengths.
//!
//! Fields are decoded as UTF-8 when they are valid UTF-8 and as Windows-1252 otherwise, so files
//! saved by spreadsheet applications in a legacy code page still load.

use std::borrow::Cow;
use std::path::Path;

use encoding_rs::WINDOWS_1252;

use crate::error::ValidationResult;
use crate::types::{parse_number, Sheet, Value, Workbook};

/// Sheet name given to the single sheet of a CSV workbook.
pub const CSV_SHEET_NAME: &str = "Sheet1";

/// Load a CSV file from disk.
pub fn load_csv_from_path(path: impl AsRef<Path>, infer_types: bool) -> ValidationResult<Workbook> {
    let bytes = std::fs::read(path)?;
    load_csv_from_bytes(&bytes, infer_types)
}

/// Load CSV bytes into a one-sheet [`Workbook`].
///
/// When `infer_types` is set, unquoted-looking numbers become [`Value::Number`] and
/// `true`/`false` become [`Value::Bool`], the way spreadsheet applications open CSV files.
/// Empty fields are always [`Value::Null`].
pub fn load_csv_from_bytes(bytes: &[u8], infer_types: bool) -> ValidationResult<Workbook> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);
    let sheet = load_csv_from_reader(&mut rdr, CSV_SHEET_NAME, infer_types)?;
    Ok(Workbook::new(vec![sheet]))
}

/// Load CSV records from an existing reader into a named [`Sheet`].
///
/// The reader should be configured with `has_headers(false)` so the header record is part of
/// the grid.
pub fn load_csv_from_reader<R: std::io::Read>(
    rdr: &mut csv::Reader<R>,
    sheet_name: &str,
    infer_types: bool,
) -> ValidationResult<Sheet> {
    let mut grid: Vec<Vec<Value>> = Vec::new();
    for result in rdr.byte_records() {
        let record = result?;
        let row = record
            .iter()
            .map(|raw| parse_field(&decode_field(raw), infer_types))
            .collect();
        grid.push(row);
    }
    Ok(Sheet::from_grid(sheet_name, grid))
}

fn decode_field(raw: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(raw) {
        Ok(s) => Cow::Borrowed(s),
        Err(_) => WINDOWS_1252.decode_without_bom_handling(raw).0,
    }
}

fn parse_field(raw: &str, infer_types: bool) -> Value {
    if raw.is_empty() {
        return Value::Null;
    }
    if !infer_types {
        return Value::Utf8(raw.to_owned());
    }

    let trimmed = raw.trim();
    if let Some(b) = parse_bool(trimmed) {
        return Value::Bool(b);
    }
    match parse_number(trimmed) {
        Some(n) => Value::Number(n),
        None => Value::Utf8(raw.to_owned()),
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}
