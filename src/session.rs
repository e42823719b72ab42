//! Explicit engine context for one user's validation workflow.
//!
//! A [`ValidationSession`] owns the loaded workbook, the active rule set, the latest analysis
//! results and the override set. Each producing step fully replaces what it produces:
//!
//! - loading rules replaces the rule set (a failed load leaves it empty)
//! - a successful analysis replaces workbook and results and clears overrides
//! - a failed analysis clears workbook, results and overrides
//!
//! Reports and exports are always computed from the current state.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;

use crate::analysis::{analyze_workbook, AnalysisOptions, AnalysisResults};
use crate::error::{ValidationError, ValidationResult};
use crate::ingestion::json::parse_data_dictionary_json;
use crate::ingestion::observability::{
    report_failure, AnalysisContext, AnalysisObserver, AnalysisStats,
};
use crate::ingestion::unified::{load_workbook_from_bytes, LoadOptions};
use crate::report::{export_file_name, export_workbook, generate_report, OverrideSet, ValidationReport};
use crate::rules::{extract_validation_rules, rules_from_workbook, DataDictionary, RuleRecord, RuleSet};
use crate::types::Workbook;

/// Whether a report has been rendered since the last analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportState {
    /// Analyzed, no report yet.
    Raw,
    /// At least one report generated for the current results.
    Reported,
}

/// An exported workbook ready for download.
#[derive(Clone, PartialEq, Eq)]
pub struct ExportedWorkbook {
    /// `Validation_Report_{base}_{YYYY-MM-DD}.xlsx`.
    pub file_name: String,
    /// `.xlsx` bytes.
    pub bytes: Vec<u8>,
}

impl fmt::Debug for ExportedWorkbook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportedWorkbook")
            .field("file_name", &self.file_name)
            .field("bytes_len", &self.bytes.len())
            .finish()
    }
}

/// Workbook, rules, results and overrides for one validation workflow.
#[derive(Default)]
pub struct ValidationSession {
    load_options: LoadOptions,
    analysis_options: AnalysisOptions,
    rules: RuleSet,
    dictionary_name: Option<String>,
    workbook: Option<Workbook>,
    file_name: Option<String>,
    results: Option<AnalysisResults>,
    overrides: OverrideSet,
    report_state: Option<ReportState>,
}

impl fmt::Debug for ValidationSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationSession")
            .field("file_name", &self.file_name)
            .field("dictionary_name", &self.dictionary_name)
            .field("rule_columns", &self.rules.column_count())
            .field("analyzed_sheets", &self.results.as_ref().map(AnalysisResults::len))
            .field("overrides", &self.overrides.len())
            .field("report_state", &self.report_state)
            .finish()
    }
}

impl ValidationSession {
    /// Create a session with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session with explicit load and analysis options.
    pub fn with_options(load_options: LoadOptions, analysis_options: AnalysisOptions) -> Self {
        Self {
            load_options,
            analysis_options,
            ..Self::default()
        }
    }

    /// Attach an observer for load, rule-set and analysis outcomes.
    pub fn with_observer(mut self, observer: Arc<dyn AnalysisObserver>) -> Self {
        self.load_options.observer = Some(observer);
        self
    }

    /// The active rule set.
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Name of the loaded data dictionary, if it had one.
    pub fn dictionary_name(&self) -> Option<&str> {
        self.dictionary_name.as_deref()
    }

    /// Replace the rule set with rules extracted from raw records.
    pub fn load_rule_records(&mut self, records: &[RuleRecord]) -> &RuleSet {
        self.dictionary_name = None;
        self.rules = extract_validation_rules(records);
        &self.rules
    }

    /// Replace the rule set with a decoded data dictionary.
    pub fn load_data_dictionary(&mut self, dictionary: &DataDictionary) -> &RuleSet {
        self.rules = dictionary.rule_set();
        self.dictionary_name = dictionary.name.clone();
        &self.rules
    }

    /// Replace the rule set from rule JSON (bare array or stored dictionary object).
    ///
    /// On failure the rule set is left empty, so a following analysis runs without custom
    /// validation.
    pub fn load_rules_json(&mut self, json: &str) -> ValidationResult<&RuleSet> {
        match parse_data_dictionary_json(json) {
            Ok(dictionary) => Ok(self.load_data_dictionary(&dictionary)),
            Err(e) => Err(self.rule_set_failed("rules.json", e)),
        }
    }

    /// Replace the rule set from a data-dictionary workbook's `"Validation Rules"` sheet.
    ///
    /// On failure the rule set is left empty.
    pub fn load_rules_workbook(&mut self, bytes: &[u8], file_name: &str) -> ValidationResult<&RuleSet> {
        let loaded = load_workbook_from_bytes(bytes, file_name, &self.quiet_load_options())
            .and_then(|wb| rules_from_workbook(&wb));
        match loaded {
            Ok(rules) => {
                self.rules = rules;
                self.dictionary_name = Some(file_name.to_string());
                Ok(&self.rules)
            }
            Err(e) => Err(self.rule_set_failed(file_name, e)),
        }
    }

    fn rule_set_failed(&mut self, source: &str, e: ValidationError) -> ValidationError {
        tracing::warn!(source, error = %e, "could not load rule set; continuing without custom rules");
        self.rules = RuleSet::new();
        self.dictionary_name = None;
        let ctx = AnalysisContext {
            file_name: source.to_string(),
            format: None,
        };
        report_failure(
            self.load_options.observer.as_ref(),
            self.load_options.alert_at_or_above,
            &ctx,
            &e,
        );
        e
    }

    /// Parse `bytes` and analyze every sheet with the active rule set.
    ///
    /// On a parse failure all derived state is cleared before the error is returned.
    pub fn analyze(&mut self, bytes: &[u8], file_name: &str) -> ValidationResult<&AnalysisResults> {
        match load_workbook_from_bytes(bytes, file_name, &self.quiet_load_options()) {
            Ok(workbook) => Ok(self.analyze_workbook(workbook, Some(file_name))),
            Err(e) => {
                self.reset();
                let ctx = AnalysisContext {
                    file_name: file_name.to_string(),
                    format: self.load_options.format,
                };
                report_failure(
                    self.load_options.observer.as_ref(),
                    self.load_options.alert_at_or_above,
                    &ctx,
                    &e,
                );
                Err(e)
            }
        }
    }

    /// Analyze an already-loaded workbook, replacing any previous run.
    pub fn analyze_workbook(&mut self, workbook: Workbook, file_name: Option<&str>) -> &AnalysisResults {
        let results = analyze_workbook(&workbook, &self.rules, &self.analysis_options);

        if let Some(obs) = self.load_options.observer.as_ref() {
            let rows = results
                .iter()
                .filter_map(|(name, _)| workbook.sheet(name))
                .map(|s| s.row_count())
                .sum();
            obs.on_success(
                &AnalysisContext {
                    file_name: file_name.unwrap_or("N/A").to_string(),
                    format: self.load_options.format,
                },
                AnalysisStats {
                    sheets: results.len(),
                    rows,
                    issues: results.totals.total(),
                },
            );
        }

        self.workbook = Some(workbook);
        self.file_name = file_name.map(str::to_string);
        self.overrides.clear();
        self.report_state = Some(ReportState::Raw);
        self.results.insert(results)
    }

    fn quiet_load_options(&self) -> LoadOptions {
        LoadOptions {
            observer: None,
            ..self.load_options.clone()
        }
    }

    /// Drop workbook, results and overrides. The rule set is kept.
    pub fn reset(&mut self) {
        self.workbook = None;
        self.file_name = None;
        self.results = None;
        self.overrides.clear();
        self.report_state = None;
    }

    /// The workbook of the latest successful run.
    pub fn workbook(&self) -> Option<&Workbook> {
        self.workbook.as_ref()
    }

    /// Results of the latest successful run.
    pub fn results(&self) -> Option<&AnalysisResults> {
        self.results.as_ref()
    }

    /// `None` until something has been analyzed.
    pub fn report_state(&self) -> Option<ReportState> {
        self.report_state
    }

    pub fn overrides(&self) -> &OverrideSet {
        &self.overrides
    }

    /// Turn the override for `(sheet, column)` on or off.
    pub fn set_override(&mut self, sheet: &str, column: &str, overridden: bool) {
        self.overrides.set(sheet, column, overridden);
    }

    /// Flip the override for `(sheet, column)`; returns the new state.
    pub fn toggle_override(&mut self, sheet: &str, column: &str) -> bool {
        self.overrides.toggle(sheet, column)
    }

    /// Replace all overrides at once.
    pub fn replace_overrides(&mut self, overrides: OverrideSet) {
        self.overrides = overrides;
    }

    fn analyzed(&self) -> ValidationResult<(&Workbook, &AnalysisResults)> {
        match (self.workbook.as_ref(), self.results.as_ref()) {
            (Some(wb), Some(results)) => Ok((wb, results)),
            _ => Err(ValidationError::NotAnalyzed),
        }
    }

    /// Compute the report from current results and overrides and mark the session reported.
    pub fn generate_report(&mut self) -> ValidationResult<ValidationReport> {
        let report = self.current_report()?;
        self.report_state = Some(ReportState::Reported);
        Ok(report)
    }

    fn current_report(&self) -> ValidationResult<ValidationReport> {
        let (workbook, results) = self.analyzed()?;
        Ok(generate_report(
            workbook,
            results,
            &self.overrides,
            self.file_name.as_deref(),
            Utc::now(),
        ))
    }

    /// Build the annotated workbook using the overrides in effect right now.
    pub fn export(&self) -> ValidationResult<ExportedWorkbook> {
        let report = self.current_report()?;
        let (workbook, _) = self.analyzed()?;
        let bytes = export_workbook(workbook, &report)?;
        Ok(ExportedWorkbook {
            file_name: export_file_name(self.file_name.as_deref(), report.generated_at),
            bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{ReportState, ValidationSession};
    use crate::error::ValidationError;

    const CSV: &[u8] = b"Name,Age\nAlice,30\n,25\nAlice,30\n";

    #[test]
    fn report_before_analysis_is_an_error() {
        let mut session = ValidationSession::new();
        assert!(matches!(session.generate_report(), Err(ValidationError::NotAnalyzed)));
        assert!(matches!(session.export(), Err(ValidationError::NotAnalyzed)));
        assert_eq!(session.report_state(), None);
    }

    #[test]
    fn report_state_moves_from_raw_to_reported() {
        let mut session = ValidationSession::new();
        session.analyze(CSV, "people.csv").unwrap();
        assert_eq!(session.report_state(), Some(ReportState::Raw));
        session.generate_report().unwrap();
        assert_eq!(session.report_state(), Some(ReportState::Reported));

        session.analyze(CSV, "people.csv").unwrap();
        assert_eq!(session.report_state(), Some(ReportState::Raw));
    }

    #[test]
    fn failed_parse_clears_previous_run() {
        let mut session = ValidationSession::new();
        session.analyze(CSV, "people.csv").unwrap();
        session.set_override("Sheet1", "Name", true);

        let err = session.analyze(&[0xFF, 0xFE, 0x00], "broken.bin").unwrap_err();
        assert!(err.is_parse_failure());
        assert!(session.results().is_none());
        assert!(session.workbook().is_none());
        assert!(session.overrides().is_empty());
        assert_eq!(session.report_state(), None);
    }

    #[test]
    fn new_run_clears_overrides() {
        let mut session = ValidationSession::new();
        session.analyze(CSV, "people.csv").unwrap();
        assert!(session.toggle_override("Sheet1", "Name"));
        session.analyze(CSV, "people.csv").unwrap();
        assert!(session.overrides().is_empty());
    }

    #[test]
    fn bad_rule_json_leaves_empty_rule_set() {
        let mut session = ValidationSession::new();
        session
            .load_rules_json(r#"[{"Column Name":"Name","Validation Type":"REQUIRED"}]"#)
            .unwrap();
        assert_eq!(session.rules().rule_count(), 1);

        let err = session.load_rules_json(r#"{"rules": 3}"#).unwrap_err();
        assert!(matches!(err, ValidationError::RuleSet { .. }));
        assert!(session.rules().is_empty());

        let results = session.analyze(CSV, "people.csv").unwrap();
        assert!(results.get("Sheet1").unwrap().custom_validation.is_empty());
    }
}
