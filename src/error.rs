use thiserror::Error;

/// Convenience result type for loading, analysis, and export operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Error type returned across the crate.
///
/// Only failures that stop an operation are represented here. Per-rule anomalies (a malformed
/// regex, an unparseable `Validation Value`) are absorbed by the evaluator and logged instead.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "excel")]
    /// The workbook container could not be read (feature-gated behind `excel`).
    #[error("excel error: {0}")]
    Excel(#[from] calamine::Error),

    /// The text-tabular input could not be read as CSV.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// A rule-set JSON payload is not valid JSON.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Writing the exported workbook failed.
    #[error("xlsx write error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// The input bytes are not a recognized spreadsheet.
    #[error("invalid file: {message}")]
    ParseError { message: String },

    /// The rule-set source does not have the expected sheet/array shape.
    #[error("invalid rule set: {message}")]
    RuleSet { message: String },

    /// The export could not be assembled from the current session state.
    #[error("export failed: {message}")]
    Export { message: String },

    /// A report or export was requested before any workbook was analyzed.
    #[error("no workbook has been analyzed yet")]
    NotAnalyzed,
}

impl ValidationError {
    /// Returns `true` for failures that mean "the bytes are not a usable spreadsheet".
    ///
    /// These are terminal for an analysis run and reset all derived session state.
    pub fn is_parse_failure(&self) -> bool {
        match self {
            Self::ParseError { .. } | Self::Csv(_) => true,
            #[cfg(feature = "excel")]
            Self::Excel(_) => true,
            _ => false,
        }
    }
}
