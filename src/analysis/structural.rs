//! Structural checks that need no rules: blank cells, `"NULL"` placeholders, future dates and
//! exact duplicate rows.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use crate::types::{Sheet, Value};

use super::{dates, excel_row};

/// Per-column structural counters for one sheet.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StructuralCounts {
    /// Blank cells per column.
    pub blank_cells: IndexMap<String, usize>,
    /// `"NULL"` placeholder strings per column.
    pub null_strings: IndexMap<String, usize>,
    /// Future-dated cells per column.
    pub future_dates: IndexMap<String, usize>,
}

/// Returns `true` for string cells that read `null` once trimmed, in any case.
pub fn is_null_string(value: &Value) -> bool {
    value
        .as_str()
        .is_some_and(|s| s.trim().eq_ignore_ascii_case("null"))
}

/// Count blank, null-string and future-date cells for every named header column.
///
/// Every column starts at 0. The three predicates are independent, so one cell may count in more
/// than one map. Cells past the end of a short row are treated as blank.
pub fn scan_cells(sheet: &Sheet, now: DateTime<Utc>) -> StructuralCounts {
    let columns: Vec<(usize, String)> = sheet
        .column_names()
        .into_iter()
        .enumerate()
        .filter_map(|(idx, name)| name.map(|n| (idx, n)))
        .collect();

    let mut counts = StructuralCounts::default();
    for (_, name) in &columns {
        counts.blank_cells.insert(name.clone(), 0);
        counts.null_strings.insert(name.clone(), 0);
        counts.future_dates.insert(name.clone(), 0);
    }

    for row in &sheet.rows {
        for (idx, name) in &columns {
            let cell = row.get(*idx).unwrap_or(&Value::Null);
            if cell.is_blank() {
                bump(&mut counts.blank_cells, name);
            }
            if is_null_string(cell) {
                bump(&mut counts.null_strings, name);
            }
            if dates::is_future_date(cell, now) {
                bump(&mut counts.future_dates, name);
            }
        }
    }
    counts
}

fn bump(map: &mut IndexMap<String, usize>, key: &str) {
    if let Some(n) = map.get_mut(key) {
        *n += 1;
    }
}

/// Excel row numbers of every row that repeats an earlier row exactly.
///
/// Comparison is type-sensitive (`30` and `"30"` differ). Trailing empty cells are ignored so a
/// row is not distinguished by how far its source range happened to extend.
pub fn find_duplicate_rows(sheet: &Sheet) -> Vec<usize> {
    let mut seen: HashSet<String> = HashSet::with_capacity(sheet.rows.len());
    let mut duplicates = Vec::new();
    for (idx, row) in sheet.rows.iter().enumerate() {
        if !seen.insert(row_key(row)) {
            duplicates.push(excel_row(idx));
        }
    }
    duplicates
}

fn row_key(row: &[Value]) -> String {
    let len = row
        .iter()
        .rposition(|v| !matches!(v, Value::Null))
        .map_or(0, |i| i + 1);
    let significant = &row[..len];
    serde_json::to_string(significant).unwrap_or_else(|_| format!("{significant:?}"))
}
