//! Loading entrypoints and implementations.
//!
//! Most callers should use [`load_workbook_from_bytes`] (from [`unified`]) which:
//!
//! - sniffs the container format (or you can force one via [`LoadOptions`])
//! - parses every sheet into an in-memory [`crate::types::Workbook`]
//! - optionally reports success/failure/alerts to an [`AnalysisObserver`]
//!
//! Format-specific functions are also available under:
//! - [`csv`]
//! - `excel` (feature `excel`)
//! - [`json`] (rule-set payloads rather than workbooks)

pub mod csv;
#[cfg(feature = "excel")]
pub mod excel;
pub mod json;
pub mod observability;
pub mod unified;

pub use json::{parse_data_dictionary_json, parse_rule_records_json};
pub use observability::{
    severity_for_error, AnalysisContext, AnalysisObserver, AnalysisStats, CompositeObserver,
    FileObserver, Severity, StdErrObserver,
};
pub use unified::{load_workbook_from_bytes, load_workbook_from_path, LoadOptions, WorkbookFormat};
