//! Unified workbook loading.
//!
//! Most callers should use [`load_workbook_from_bytes`], which turns an uploaded byte buffer into
//! a [`crate::types::Workbook`].
//!
//! - If [`LoadOptions::format`] is `None`, the format is sniffed from the bytes: ZIP and OLE2
//!   containers are read as Excel workbooks, anything else without NUL bytes is read as CSV.
//! - If an [`super::observability::AnalysisObserver`] is provided, success/failure/alerts are
//!   reported to it.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::error::{ValidationError, ValidationResult};
use crate::types::Workbook;

use super::csv;
use super::observability::{
    report_failure, AnalysisContext, AnalysisObserver, AnalysisStats, Severity,
};

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE2_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Supported workbook container formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkbookFormat {
    /// Comma-separated text.
    Csv,
    /// Binary spreadsheet formats (feature-gated behind `excel`).
    Excel,
}

impl WorkbookFormat {
    /// Parse a format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" | "txt" => Some(Self::Csv),
            "xlsx" | "xls" | "xlsm" | "xlsb" | "ods" => Some(Self::Excel),
            _ => None,
        }
    }

    /// Guess the format from the leading bytes of a buffer.
    ///
    /// Returns `None` for empty input and for binary data that is not a ZIP/OLE2 container.
    /// Text in a legacy single-byte encoding still counts as CSV; only NUL bytes rule it out.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.is_empty() {
            return None;
        }
        if bytes.starts_with(ZIP_MAGIC) || bytes.starts_with(OLE2_MAGIC) {
            return Some(Self::Excel);
        }
        (!bytes.contains(&0)).then_some(Self::Csv)
    }
}

/// Options controlling workbook loading.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct LoadOptions {
    /// If `None`, sniff the format from the bytes.
    pub format: Option<WorkbookFormat>,
    /// Convert numeric/boolean-looking CSV fields into typed values.
    pub infer_csv_types: bool,
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn AnalysisObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: Severity,
}

impl fmt::Debug for LoadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadOptions")
            .field("format", &self.format)
            .field("infer_csv_types", &self.infer_csv_types)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            format: None,
            infer_csv_types: true,
            observer: None,
            alert_at_or_above: Severity::Critical,
        }
    }
}

/// Load a workbook from an in-memory byte buffer.
///
/// `file_name` is only used for diagnostics and observer context.
///
/// Fails with [`ValidationError::ParseError`] (or a wrapped reader error) when the bytes are not
/// a recognized spreadsheet.
///
/// # Examples
///
/// ```
/// use sheet_validation::ingestion::{load_workbook_from_bytes, LoadOptions};
/// use sheet_validation::types::Value;
///
/// # fn main() -> Result<(), sheet_validation::ValidationError> {
/// let wb = load_workbook_from_bytes(b"Name,Age\nAlice,30\n", "people.csv", &LoadOptions::default())?;
/// assert_eq!(wb.sheets[0].rows[0][1], Value::Number(30.0));
/// # Ok(())
/// # }
/// ```
pub fn load_workbook_from_bytes(
    bytes: &[u8],
    file_name: &str,
    options: &LoadOptions,
) -> ValidationResult<Workbook> {
    let format = options.format.or_else(|| WorkbookFormat::sniff(bytes));
    let ctx = AnalysisContext {
        file_name: file_name.to_string(),
        format,
    };

    let result = match format {
        Some(WorkbookFormat::Csv) => csv::load_csv_from_bytes(bytes, options.infer_csv_types),
        Some(WorkbookFormat::Excel) => load_excel_dispatch(bytes),
        None => Err(ValidationError::ParseError {
            message: format!("'{file_name}' is not a recognized spreadsheet format"),
        }),
    };

    match &result {
        Ok(wb) => {
            if let Some(obs) = options.observer.as_ref() {
                obs.on_success(
                    &ctx,
                    AnalysisStats {
                        sheets: wb.sheets.len(),
                        rows: wb.row_count(),
                        issues: 0,
                    },
                );
            }
        }
        Err(e) => {
            tracing::warn!(file = file_name, error = %e, "failed to load workbook");
            report_failure(options.observer.as_ref(), options.alert_at_or_above, &ctx, e);
        }
    }

    result
}

/// Load a workbook from disk.
///
/// If `options.format` is `None`, the extension picks the format; files without a known
/// extension fall back to sniffing their contents.
pub fn load_workbook_from_path(
    path: impl AsRef<Path>,
    options: &LoadOptions,
) -> ValidationResult<Workbook> {
    let path = path.as_ref();
    let display = path.display().to_string();
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) => {
            let err = ValidationError::Io(e);
            let ctx = AnalysisContext {
                file_name: display,
                format: options.format,
            };
            report_failure(options.observer.as_ref(), options.alert_at_or_above, &ctx, &err);
            return Err(err);
        }
    };

    let format = options.format.or_else(|| {
        path.extension()
            .and_then(|s| s.to_str())
            .and_then(WorkbookFormat::from_extension)
    });
    let opts = LoadOptions {
        format,
        ..options.clone()
    };
    load_workbook_from_bytes(&bytes, &display, &opts)
}

fn load_excel_dispatch(bytes: &[u8]) -> ValidationResult<Workbook> {
    #[cfg(feature = "excel")]
    {
        super::excel::load_excel_from_bytes(bytes)
    }

    #[cfg(not(feature = "excel"))]
    {
        let _ = bytes;
        Err(ValidationError::ParseError {
            message: "excel support not enabled (enable cargo feature 'excel')".to_string(),
        })
    }
}
