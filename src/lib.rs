//! `sheet-validation` is a data-quality engine for spreadsheets.
//!
//! It loads a workbook (Excel or CSV) into memory, flags structural problems in every sheet,
//! applies a per-column rule set taken from a data dictionary, and summarizes the findings as a
//! pass/fail report that users can adjust with per-column overrides and export as an annotated
//! `.xlsx`.
//!
//! ## Checks
//!
//! **Structural** (always on, counted per column):
//!
//! - blank cells (absent, or whitespace only)
//! - `"NULL"` placeholder strings (trimmed, any case)
//! - future dates (number cells read as spreadsheet serials, string cells parsed as dates)
//! - exact duplicate rows (reported by row number; the first occurrence is never flagged)
//!
//! **Custom rules** (from a data dictionary, see [`rules`]):
//!
//! - `REQUIRED`, `ALLOWED_VALUES`, `NUMERIC_RANGE`, `REGEX`, `DATE_PAST`, `UNIQUE`
//! - any other type is accepted and always passes
//!
//! Row numbers in results are spreadsheet row numbers: the first data row is row 2.
//!
//! ## Quick example: analyze, override, report
//!
//! ```rust
//! use sheet_validation::session::ValidationSession;
//! use sheet_validation::analysis::OverallStatus;
//!
//! # fn main() -> Result<(), sheet_validation::ValidationError> {
//! let mut session = ValidationSession::new();
//! session.load_rules_json(
//!     r#"[{"Column Name":"Email","Validation Type":"REGEX","Validation Value":"^[^@]+@[^@]+$"}]"#,
//! )?;
//!
//! let csv = b"Name,Email\nAlice,a@b.com\nBob,bad\n";
//! let results = session.analyze(csv, "contacts.csv")?;
//! assert_eq!(results.get("Sheet1").unwrap().custom_validation["Email"].len(), 1);
//!
//! session.set_override("Sheet1", "Email", true);
//! let report = session.generate_report()?;
//! assert_eq!(report.status(), OverallStatus::Pass);
//!
//! let export = session.export()?;
//! assert!(export.file_name.starts_with("Validation_Report_contacts_"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Loading without a session
//!
//! ```no_run
//! use sheet_validation::analysis::{analyze_workbook, AnalysisOptions};
//! use sheet_validation::ingestion::{load_workbook_from_path, LoadOptions};
//! use sheet_validation::ingestion::json::load_data_dictionary_from_path;
//!
//! # fn main() -> Result<(), sheet_validation::ValidationError> {
//! let workbook = load_workbook_from_path("sales.xlsx", &LoadOptions::default())?;
//! let rules = load_data_dictionary_from_path("sales_rules.json")?.rule_set();
//! let results = analyze_workbook(&workbook, &rules, &AnalysisOptions::default());
//! println!("blank cells: {}", results.totals.blank_cells);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`ingestion`]: workbook loading (CSV, Excel), rule-set JSON decoding, observer hooks
//! - [`types`]: workbook / sheet / cell model
//! - [`rules`]: rule model and extraction from data dictionaries
//! - [`analysis`]: structural scan, rule evaluation, per-sheet aggregation
//! - [`report`]: overrides, pass/fail report, annotated export
//! - [`session`]: one workflow's state, replaced step by step
//! - [`error`]: error types

pub mod analysis;
pub mod error;
pub mod ingestion;
pub mod report;
pub mod rules;
pub mod session;
pub mod types;

pub use error::{ValidationError, ValidationResult};
