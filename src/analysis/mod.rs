//! Workbook analysis: structural scan, custom rule evaluation and per-sheet aggregation.
//!
//! [`analyze_workbook`] is the entrypoint. It scans every non-empty sheet, applies the rule set to
//! columns that have rules, and returns fresh [`AnalysisResults`] with workbook totals.
//!
//! ```
//! use sheet_validation::analysis::{analyze_workbook, AnalysisOptions};
//! use sheet_validation::rules::RuleSet;
//! use sheet_validation::types::{Sheet, Value, Workbook};
//!
//! let wb = Workbook::new(vec![Sheet::from_grid(
//!     "Data",
//!     vec![
//!         vec![Value::text("Name"), Value::text("Age")],
//!         vec![Value::text("Alice"), Value::text("30")],
//!         vec![Value::text(""), Value::text("25")],
//!         vec![Value::text("Alice"), Value::text("30")],
//!     ],
//! )]);
//! let results = analyze_workbook(&wb, &RuleSet::new(), &AnalysisOptions::default());
//! assert_eq!(results.totals.blank_cells, 1);
//! assert_eq!(results.get("Data").unwrap().duplicate_rows, vec![4]);
//! ```

pub mod dates;
pub mod evaluator;
pub mod structural;

use std::fmt;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;

use crate::rules::{RuleSet, ValidationType};
use crate::types::{Sheet, Value, Workbook};

/// Number of the spreadsheet row holding data row `index` (header is row 1).
pub(crate) fn excel_row(index: usize) -> usize {
    index + 2
}

/// One failing cell found by a custom rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    /// Spreadsheet row number (first data row is 2).
    pub row: usize,
    /// Original cell value.
    pub value: Value,
    /// Configured or generated failure message.
    pub message: String,
    /// Rule that failed.
    pub rule_type: ValidationType,
}

/// Pass/fail verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OverallStatus {
    Pass,
    Fail,
}

impl OverallStatus {
    /// `Pass` iff `count` is zero.
    pub fn from_count(count: usize) -> Self {
        if count == 0 { Self::Pass } else { Self::Fail }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
        }
    }
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-sheet issue counts before overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueCounts {
    pub blank_cells: usize,
    pub null_strings: usize,
    pub future_dates: usize,
    pub duplicate_rows: usize,
    pub custom_validation: usize,
}

impl IssueCounts {
    /// Sum of all five counters.
    pub fn total(&self) -> usize {
        self.blank_cells
            + self.null_strings
            + self.future_dates
            + self.duplicate_rows
            + self.custom_validation
    }
}

/// Everything found in one sheet.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetIssues {
    /// Column → blank cell count.
    pub blank_cells: IndexMap<String, usize>,
    /// Column → `"NULL"` string count.
    pub null_strings: IndexMap<String, usize>,
    /// Column → future date count.
    pub future_dates: IndexMap<String, usize>,
    /// Spreadsheet row numbers of duplicate rows.
    pub duplicate_rows: Vec<usize>,
    /// Column → custom rule violations. Only columns with rules appear.
    pub custom_validation: IndexMap<String, Vec<Issue>>,
}

impl SheetIssues {
    /// Sheet-wide counts for display.
    pub fn counts(&self) -> IssueCounts {
        IssueCounts {
            blank_cells: self.blank_cells.values().sum(),
            null_strings: self.null_strings.values().sum(),
            future_dates: self.future_dates.values().sum(),
            duplicate_rows: self.duplicate_rows.len(),
            custom_validation: self.custom_validation.values().map(Vec::len).sum(),
        }
    }

    /// `Pass` iff nothing at all was found (overrides not applied).
    pub fn status(&self) -> OverallStatus {
        OverallStatus::from_count(self.counts().total())
    }

    /// Issues attributed to one column: blank + null + future + custom.
    ///
    /// Duplicate rows belong to no column and are not included.
    pub fn column_issue_count(&self, column: &str) -> usize {
        let get = |m: &IndexMap<String, usize>| m.get(column).copied().unwrap_or(0);
        get(&self.blank_cells)
            + get(&self.null_strings)
            + get(&self.future_dates)
            + self.custom_validation.get(column).map_or(0, Vec::len)
    }
}

/// Workbook-wide structural totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisTotals {
    pub blank_cells: usize,
    pub null_strings: usize,
    pub future_dates: usize,
    pub duplicate_rows: usize,
}

impl AnalysisTotals {
    fn add(&mut self, counts: &IssueCounts) {
        self.blank_cells += counts.blank_cells;
        self.null_strings += counts.null_strings;
        self.future_dates += counts.future_dates;
        self.duplicate_rows += counts.duplicate_rows;
    }

    /// Sum of the four totals.
    pub fn total(&self) -> usize {
        self.blank_cells + self.null_strings + self.future_dates + self.duplicate_rows
    }
}

/// Output of one analysis run: sheet name → issues, plus workbook totals.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct AnalysisResults {
    /// Analyzed sheets in workbook order. Empty sheets are absent.
    pub sheets: IndexMap<String, SheetIssues>,
    /// Structural totals across all analyzed sheets.
    pub totals: AnalysisTotals,
}

impl AnalysisResults {
    /// Issues for a sheet, if it was analyzed.
    pub fn get(&self, sheet: &str) -> Option<&SheetIssues> {
        self.sheets.get(sheet)
    }

    /// Iterate `(sheet, issues)` in workbook order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SheetIssues)> {
        self.sheets.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of analyzed sheets.
    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    /// Returns `true` when no sheet was analyzed.
    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }
}

/// Options controlling an analysis run.
#[derive(Debug, Clone, Default)]
pub struct AnalysisOptions {
    /// Instant that "future" and "past" are measured against. `None` means now.
    pub reference_time: Option<DateTime<Utc>>,
}

impl AnalysisOptions {
    /// Pin the reference instant.
    pub fn at(reference_time: DateTime<Utc>) -> Self {
        Self {
            reference_time: Some(reference_time),
        }
    }

    /// Resolve the reference instant for one run.
    pub fn now(&self) -> DateTime<Utc> {
        self.reference_time.unwrap_or_else(Utc::now)
    }
}

/// Analyze one sheet.
///
/// Custom rules run only when `rules` is non-empty, and only for header columns that have rules.
pub fn analyze_sheet(sheet: &Sheet, rules: &RuleSet, now: DateTime<Utc>) -> SheetIssues {
    let counts = structural::scan_cells(sheet, now);
    let mut issues = SheetIssues {
        blank_cells: counts.blank_cells,
        null_strings: counts.null_strings,
        future_dates: counts.future_dates,
        duplicate_rows: structural::find_duplicate_rows(sheet),
        custom_validation: IndexMap::new(),
    };

    if rules.is_empty() {
        return issues;
    }
    for (idx, name) in sheet.column_names().into_iter().enumerate() {
        let Some(name) = name else { continue };
        if !rules.has_rules_for(&name) {
            continue;
        }
        let found =
            evaluator::evaluate_column(&name, idx, rules.rules_for(&name), &sheet.rows, now);
        issues.custom_validation.insert(name, found);
    }
    issues
}

/// Analyze every sheet of a workbook.
///
/// Sheets without data rows are skipped and get no entry. The reference instant is resolved once
/// so the whole run agrees on what "now" is.
pub fn analyze_workbook(
    workbook: &Workbook,
    rules: &RuleSet,
    options: &AnalysisOptions,
) -> AnalysisResults {
    let now = options.now();
    let mut results = AnalysisResults::default();

    for sheet in &workbook.sheets {
        if sheet.is_empty() {
            tracing::debug!(sheet = %sheet.name, "skipping sheet without data rows");
            continue;
        }
        let issues = analyze_sheet(sheet, rules, now);
        let counts = issues.counts();
        tracing::debug!(
            sheet = %sheet.name,
            rows = sheet.row_count(),
            blank = counts.blank_cells,
            null = counts.null_strings,
            future = counts.future_dates,
            duplicates = counts.duplicate_rows,
            custom = counts.custom_validation,
            "analyzed sheet"
        );
        results.totals.add(&counts);
        results.sheets.insert(sheet.name.clone(), issues);
    }

    tracing::info!(
        sheets = results.len(),
        blank = results.totals.blank_cells,
        null = results.totals.null_strings,
        future = results.totals.future_dates,
        duplicates = results.totals.duplicate_rows,
        "analysis complete"
    );
    results
}
