//! Pass/fail summary of an analysis run under the current overrides.
//!
//! The report is always recomputed from [`AnalysisResults`] + [`OverrideSet`]; column lists are
//! read from the workbook passed in, not from anything cached at scan time. [`ValidationReport`]
//! renders as text via `Display` and as a flat row table via [`ValidationReport::to_rows`], which
//! the exporter writes verbatim.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::analysis::{AnalysisResults, OverallStatus, SheetIssues};
use crate::types::{Value, Workbook};

use super::overrides::OverrideSet;

/// Title line of every report.
pub const REPORT_TITLE: &str = "Data Validation Summary Report";

/// Column headings of the per-sheet table.
pub const COLUMN_TABLE_HEADINGS: [&str; 7] = [
    "Column Name",
    "Blank Cells",
    "\"NULL\" Strings",
    "Future Dates",
    "Custom Validation Issues",
    "Total Issues (Column)",
    "Status (After Override)",
];

/// Verdict for one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColumnStatus {
    Pass,
    Fail,
    Overridden,
}

impl ColumnStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
            Self::Overridden => "OVERRIDDEN",
        }
    }
}

impl fmt::Display for ColumnStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of a sheet table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSummary {
    pub column: String,
    pub blank_cells: usize,
    pub null_strings: usize,
    pub future_dates: usize,
    pub custom_issues: usize,
    /// blank + null + future + custom.
    pub identified: usize,
    /// `identified`, or 0 when overridden.
    pub after_override: usize,
    pub status: ColumnStatus,
}

/// Totals for one scope (sheet or workbook).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportTotals {
    pub identified: usize,
    pub overridden: usize,
    pub remaining: usize,
}

impl ReportTotals {
    fn add(&mut self, other: ReportTotals) {
        self.identified += other.identified;
        self.overridden += other.overridden;
        self.remaining += other.remaining;
    }

    /// `Pass` iff nothing remains after overrides.
    pub fn status(&self) -> OverallStatus {
        OverallStatus::from_count(self.remaining)
    }
}

/// Table and totals for one analyzed sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetSummary {
    pub sheet: String,
    pub columns: Vec<ColumnSummary>,
    pub totals: ReportTotals,
}

impl SheetSummary {
    pub fn status(&self) -> OverallStatus {
        self.totals.status()
    }
}

/// Workbook-level report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    /// Name of the analyzed file, when known.
    pub file_name: Option<String>,
    pub generated_at: DateTime<Utc>,
    /// Sheets in analysis order.
    pub sheets: Vec<SheetSummary>,
    pub totals: ReportTotals,
}

impl ValidationReport {
    /// Overall verdict after overrides.
    pub fn status(&self) -> OverallStatus {
        self.totals.status()
    }

    /// File name for display; `"N/A"` when unknown.
    pub fn file_label(&self) -> &str {
        self.file_name.as_deref().unwrap_or("N/A")
    }

    fn generated_label(&self) -> String {
        self.generated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
    }

    /// Flat row form used for the exported summary sheet.
    pub fn to_rows(&self) -> Vec<Vec<Value>> {
        let count = |n: usize| Value::Number(n as f64);
        let mut rows: Vec<Vec<Value>> = vec![
            vec![Value::text(REPORT_TITLE)],
            vec![Value::text(format!("For File: {}", self.file_label()))],
            vec![Value::text(format!("Generated On: {}", self.generated_label()))],
            Vec::new(),
        ];

        for sheet in &self.sheets {
            let name = &sheet.sheet;
            rows.push(Vec::new());
            rows.push(vec![Value::text(format!("Sheet: {name}"))]);
            rows.push(COLUMN_TABLE_HEADINGS.iter().map(|h| Value::text(*h)).collect());
            for c in &sheet.columns {
                rows.push(vec![
                    Value::text(c.column.clone()),
                    count(c.blank_cells),
                    count(c.null_strings),
                    count(c.future_dates),
                    count(c.custom_issues),
                    count(c.identified),
                    Value::text(c.status.as_str()),
                ]);
            }
            rows.push(Vec::new());
            rows.push(vec![
                Value::text(format!("Total Issues Identified for Sheet ({name}):")),
                count(sheet.totals.identified),
            ]);
            rows.push(vec![
                Value::text(format!("Total Issues Overridden for Sheet ({name}):")),
                count(sheet.totals.overridden),
            ]);
            rows.push(vec![
                Value::text(format!("Total Issues Remaining for Sheet ({name}):")),
                count(sheet.totals.remaining),
            ]);
            rows.push(vec![
                Value::text("Sheet Overall Status (After Override):"),
                Value::text(sheet.status().as_str()),
            ]);
        }

        rows.push(Vec::new());
        rows.push(vec![Value::text("Overall File Summary")]);
        rows.push(vec![
            Value::text("Grand Total Issues Identified:"),
            count(self.totals.identified),
        ]);
        rows.push(vec![
            Value::text("Grand Total Issues Overridden:"),
            count(self.totals.overridden),
        ]);
        rows.push(vec![
            Value::text("Grand Total Issues Remaining (After Override):"),
            count(self.totals.remaining),
        ]);
        rows.push(vec![
            Value::text("Overall File Status (After Override):"),
            Value::text(self.status().as_str()),
        ]);
        rows
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{REPORT_TITLE}")?;
        writeln!(f, "For File: {}", self.file_label())?;
        writeln!(f, "Generated On: {}", self.generated_label())?;

        for sheet in &self.sheets {
            let name = &sheet.sheet;
            writeln!(f)?;
            writeln!(f, "Sheet: {name}")?;
            writeln!(f, "{}", COLUMN_TABLE_HEADINGS.join(" | "))?;
            for c in &sheet.columns {
                writeln!(
                    f,
                    "{} | {} | {} | {} | {} | {} | {}",
                    c.column,
                    c.blank_cells,
                    c.null_strings,
                    c.future_dates,
                    c.custom_issues,
                    c.identified,
                    c.status
                )?;
            }
            writeln!(f, "Total Issues Identified for Sheet ({name}): {}", sheet.totals.identified)?;
            writeln!(f, "Total Issues Overridden for Sheet ({name}): {}", sheet.totals.overridden)?;
            writeln!(f, "Total Issues Remaining for Sheet ({name}): {}", sheet.totals.remaining)?;
            writeln!(f, "Sheet Overall Status (After Override): {}", sheet.status())?;
        }

        writeln!(f)?;
        writeln!(f, "Overall File Summary")?;
        writeln!(f, "Grand Total Issues Identified: {}", self.totals.identified)?;
        writeln!(f, "Grand Total Issues Overridden: {}", self.totals.overridden)?;
        writeln!(
            f,
            "Grand Total Issues Remaining (After Override): {}",
            self.totals.remaining
        )?;
        write!(f, "Overall File Status (After Override): {}", self.status())
    }
}

fn summarize_column(
    sheet: &str,
    column: &str,
    issues: &SheetIssues,
    overrides: &OverrideSet,
) -> ColumnSummary {
    let get = |m: &indexmap::IndexMap<String, usize>| m.get(column).copied().unwrap_or(0);
    let blank_cells = get(&issues.blank_cells);
    let null_strings = get(&issues.null_strings);
    let future_dates = get(&issues.future_dates);
    let custom_issues = issues.custom_validation.get(column).map_or(0, Vec::len);
    let identified = blank_cells + null_strings + future_dates + custom_issues;

    let (after_override, status) = if overrides.is_overridden(sheet, column) {
        (0, ColumnStatus::Overridden)
    } else if identified > 0 {
        (identified, ColumnStatus::Fail)
    } else {
        (identified, ColumnStatus::Pass)
    };

    ColumnSummary {
        column: column.to_string(),
        blank_cells,
        null_strings,
        future_dates,
        custom_issues,
        identified,
        after_override,
        status,
    }
}

/// Build the report for the current results and overrides.
///
/// Sheets follow `results` order; each sheet's columns come from the header of the same-named
/// sheet in `workbook`. Duplicate rows are not attributed to columns and so do not count here.
pub fn generate_report(
    workbook: &Workbook,
    results: &AnalysisResults,
    overrides: &OverrideSet,
    file_name: Option<&str>,
    generated_at: DateTime<Utc>,
) -> ValidationReport {
    let mut totals = ReportTotals::default();
    let mut sheets = Vec::with_capacity(results.len());

    for (sheet_name, issues) in results.iter() {
        let header = workbook
            .sheet(sheet_name)
            .map(|s| s.column_names())
            .unwrap_or_default();

        let columns: Vec<ColumnSummary> = header
            .iter()
            .flatten()
            .map(|column| summarize_column(sheet_name, column, issues, overrides))
            .collect();

        let mut sheet_totals = ReportTotals::default();
        for c in &columns {
            sheet_totals.add(ReportTotals {
                identified: c.identified,
                overridden: if c.status == ColumnStatus::Overridden {
                    c.identified
                } else {
                    0
                },
                remaining: c.after_override,
            });
        }
        totals.add(sheet_totals);
        sheets.push(SheetSummary {
            sheet: sheet_name.to_string(),
            columns,
            totals: sheet_totals,
        });
    }

    tracing::debug!(
        sheets = sheets.len(),
        identified = totals.identified,
        overridden = totals.overridden,
        remaining = totals.remaining,
        "generated report"
    );
    ValidationReport {
        file_name: file_name.map(str::to_string),
        generated_at,
        sheets,
        totals,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{generate_report, ColumnStatus};
    use crate::analysis::{analyze_workbook, AnalysisOptions, OverallStatus};
    use crate::report::overrides::OverrideSet;
    use crate::rules::RuleSet;
    use crate::types::{Sheet, Value, Workbook};

    fn workbook() -> Workbook {
        Workbook::new(vec![Sheet::from_grid(
            "Data",
            vec![
                vec![Value::text("Name"), Value::text("Age")],
                vec![Value::text("Alice"), Value::text("30")],
                vec![Value::text(""), Value::text("null")],
                vec![Value::text("Alice"), Value::text("30")],
            ],
        )])
    }

    #[test]
    fn override_zeroes_remaining_but_keeps_identified() {
        let wb = workbook();
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let results = analyze_workbook(&wb, &RuleSet::new(), &AnalysisOptions::at(now));

        let plain = generate_report(&wb, &results, &OverrideSet::new(), Some("a.csv"), now);
        assert_eq!(plain.totals.identified, 2);
        assert_eq!(plain.totals.remaining, 2);
        assert_eq!(plain.status(), OverallStatus::Fail);

        let mut overrides = OverrideSet::new();
        overrides.set("Data", "Age", true);
        let report = generate_report(&wb, &results, &overrides, Some("a.csv"), now);
        let age = &report.sheets[0].columns[1];
        assert_eq!(age.status, ColumnStatus::Overridden);
        assert_eq!(age.identified, 1);
        assert_eq!(age.after_override, 0);
        assert_eq!(report.totals.identified, 2);
        assert_eq!(report.totals.overridden, 1);
        assert_eq!(report.totals.remaining, 1);

        overrides.set("Data", "Name", true);
        let report = generate_report(&wb, &results, &overrides, Some("a.csv"), now);
        assert_eq!(report.status(), OverallStatus::Pass);

        overrides.clear();
        let restored = generate_report(&wb, &results, &overrides, Some("a.csv"), now);
        assert_eq!(restored, plain);
    }

    #[test]
    fn tabular_form_ends_with_overall_status() {
        let wb = workbook();
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let results = analyze_workbook(&wb, &RuleSet::new(), &AnalysisOptions::at(now));
        let report = generate_report(&wb, &results, &OverrideSet::new(), None, now);
        let rows = report.to_rows();

        assert_eq!(rows[0], vec![Value::text("Data Validation Summary Report")]);
        assert_eq!(rows[1], vec![Value::text("For File: N/A")]);
        assert_eq!(rows[2], vec![Value::text("Generated On: 2025-01-01 00:00:00 UTC")]);
        assert_eq!(rows[5], vec![Value::text("Sheet: Data")]);
        assert_eq!(
            rows[7],
            vec![
                Value::text("Name"),
                Value::Number(1.0),
                Value::Number(0.0),
                Value::Number(0.0),
                Value::Number(0.0),
                Value::Number(1.0),
                Value::text("FAIL"),
            ]
        );
        assert_eq!(
            rows.last().unwrap(),
            &vec![
                Value::text("Overall File Status (After Override):"),
                Value::text("FAIL")
            ]
        );

        let text = report.to_string();
        assert!(text.starts_with("Data Validation Summary Report\nFor File: N/A\n"));
        assert!(text.contains("Age | 0 | 1 | 0 | 0 | 1 | FAIL"));
        assert!(text.ends_with("Overall File Status (After Override): FAIL"));
    }

    #[test]
    fn columns_come_from_the_workbook_passed_in() {
        let wb = workbook();
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let results = analyze_workbook(&wb, &RuleSet::new(), &AnalysisOptions::at(now));

        let renamed = Workbook::new(vec![Sheet::from_grid(
            "Data",
            vec![vec![Value::text("Age")]],
        )]);
        let report = generate_report(&renamed, &results, &OverrideSet::new(), None, now);
        assert_eq!(report.sheets[0].columns.len(), 1);
        assert_eq!(report.sheets[0].columns[0].column, "Age");
        assert_eq!(report.totals.identified, 1);
    }
}
