//! Reporting on analysis results: override store, pass/fail summary and workbook export.
//!
//! - [`overrides`]: the `(sheet, column)` pairs a user chose to ignore
//! - [`summary`]: the report, recomputed on demand from results + overrides
//! - [`export`]: the annotated `.xlsx` download built from that same report

pub mod export;
pub mod overrides;
pub mod summary;

pub use export::{export_file_name, export_workbook, SUMMARY_SHEET_NAME};
pub use overrides::OverrideSet;
pub use summary::{
    generate_report, ColumnStatus, ColumnSummary, ReportTotals, SheetSummary, ValidationReport,
};
