use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::ValidationError;

use super::unified::WorkbookFormat;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Informational event.
    Info,
    /// Non-fatal problem (e.g. a rule set could not be loaded; analysis can still run).
    Warning,
    /// The operation failed (e.g. the file is not a spreadsheet).
    Error,
    /// Infrastructure failure (typically I/O).
    Critical,
}

/// What was being loaded or analyzed when an event fired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisContext {
    /// Display name of the input (original file name, or a path).
    pub file_name: String,
    /// Detected or forced format, once known.
    pub format: Option<WorkbookFormat>,
}

/// Stats reported on success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnalysisStats {
    /// Number of sheets in the loaded workbook (or analyzed, for analysis runs).
    pub sheets: usize,
    /// Number of data rows (header rows excluded).
    pub rows: usize,
    /// Structural issues found (blank + null + future-date cells + duplicate rows); zero for
    /// pure load events.
    pub issues: usize,
}

/// Observer interface for load and analysis outcomes.
///
/// Implementors can record metrics, logs, or trigger alerts.
pub trait AnalysisObserver: Send + Sync {
    /// Called when a load or analysis run succeeds.
    fn on_success(&self, _ctx: &AnalysisContext, _stats: AnalysisStats) {}

    /// Called when a load or analysis run fails.
    fn on_failure(&self, _ctx: &AnalysisContext, _severity: Severity, _error: &ValidationError) {}

    /// Called when a failure meets the alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, ctx: &AnalysisContext, severity: Severity, error: &ValidationError) {
        self.on_failure(ctx, severity, error)
    }
}

/// Classify an error for observer callbacks.
pub fn severity_for_error(e: &ValidationError) -> Severity {
    match e {
        ValidationError::Io(_) => Severity::Critical,
        ValidationError::Csv(err) => match err.kind() {
            ::csv::ErrorKind::Io(_) => Severity::Critical,
            _ => Severity::Error,
        },
        ValidationError::RuleSet { .. } => Severity::Warning,
        _ => Severity::Error,
    }
}

/// Send a failure to `observer` (if any), escalating to `on_alert` at or above `alert_at_or_above`.
pub(crate) fn report_failure(
    observer: Option<&Arc<dyn AnalysisObserver>>,
    alert_at_or_above: Severity,
    ctx: &AnalysisContext,
    error: &ValidationError,
) {
    let Some(obs) = observer else {
        return;
    };
    let sev = severity_for_error(error);
    obs.on_failure(ctx, sev, error);
    if sev >= alert_at_or_above {
        obs.on_alert(ctx, sev, error);
    }
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn AnalysisObserver>>,
}

impl CompositeObserver {
    /// Create a new composite observer from a list of observers.
    pub fn new(observers: Vec<Arc<dyn AnalysisObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl AnalysisObserver for CompositeObserver {
    fn on_success(&self, ctx: &AnalysisContext, stats: AnalysisStats) {
        for o in &self.observers {
            o.on_success(ctx, stats);
        }
    }

    fn on_failure(&self, ctx: &AnalysisContext, severity: Severity, error: &ValidationError) {
        for o in &self.observers {
            o.on_failure(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &AnalysisContext, severity: Severity, error: &ValidationError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }
}

/// Logs events to stderr.
#[derive(Debug, Default)]
pub struct StdErrObserver;

impl AnalysisObserver for StdErrObserver {
    fn on_success(&self, ctx: &AnalysisContext, stats: AnalysisStats) {
        eprintln!(
            "[validate][ok] format={:?} file={} sheets={} rows={} issues={}",
            ctx.format, ctx.file_name, stats.sheets, stats.rows, stats.issues
        );
    }

    fn on_failure(&self, ctx: &AnalysisContext, severity: Severity, error: &ValidationError) {
        eprintln!(
            "[validate][{:?}] format={:?} file={} err={}",
            severity, ctx.format, ctx.file_name, error
        );
    }

    fn on_alert(&self, ctx: &AnalysisContext, severity: Severity, error: &ValidationError) {
        eprintln!(
            "[ALERT][validate][{:?}] format={:?} file={} err={}",
            severity, ctx.format, ctx.file_name, error
        );
    }
}

/// Appends events to a local log file.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileObserver {
    /// Create a file observer that appends events to `path`.
    ///
    /// Writes are best-effort; failures to open/write the log file are ignored.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn append_line(&self, line: &str) {
        let _guard = self.lock.lock().ok();
        if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = writeln!(f, "{line}");
        }
    }
}

impl AnalysisObserver for FileObserver {
    fn on_success(&self, ctx: &AnalysisContext, stats: AnalysisStats) {
        self.append_line(&format!(
            "{} ok format={:?} file={} sheets={} rows={} issues={}",
            unix_ts(),
            ctx.format,
            ctx.file_name,
            stats.sheets,
            stats.rows,
            stats.issues
        ));
    }

    fn on_failure(&self, ctx: &AnalysisContext, severity: Severity, error: &ValidationError) {
        self.append_line(&format!(
            "{} fail severity={:?} format={:?} file={} err={}",
            unix_ts(),
            severity,
            ctx.format,
            ctx.file_name,
            error
        ));
    }

    fn on_alert(&self, ctx: &AnalysisContext, severity: Severity, error: &ValidationError) {
        self.append_line(&format!(
            "{} ALERT severity={:?} format={:?} file={} err={}",
            unix_ts(),
            severity,
            ctx.format,
            ctx.file_name,
            error
        ));
    }
}

fn unix_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::{severity_for_error, Severity};
    use crate::error::ValidationError;

    #[test]
    fn rule_set_problems_are_warnings_and_io_is_critical() {
        let rs = ValidationError::RuleSet {
            message: "missing sheet".to_string(),
        };
        assert_eq!(severity_for_error(&rs), Severity::Warning);

        let io = ValidationError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(severity_for_error(&io), Severity::Critical);

        let parse = ValidationError::ParseError {
            message: "bad".to_string(),
        };
        assert_eq!(severity_for_error(&parse), Severity::Error);
        assert!(Severity::Warning < Severity::Error);
    }
}
