//! Validation rule model and the rule extractor.
//!
//! A data dictionary is a list of loosely-typed rule records (one per row of a
//! `"Validation Rules"` sheet, or one per object of a stored JSON array). [`extract_validation_rules`]
//! turns those records into a [`RuleSet`]: column name → ordered list of typed [`Rule`]s.

use std::fmt;

use indexmap::IndexMap;
use serde::{Serialize, Serializer};

use crate::error::{ValidationError, ValidationResult};
use crate::types::{Sheet, Value, Workbook};

/// Name of the worksheet that holds rules in a data-dictionary workbook.
pub const RULES_SHEET_NAME: &str = "Validation Rules";

/// Record field naming the column a rule applies to.
pub const COLUMN_NAME_FIELD: &str = "Column Name";
/// Record field naming the rule type.
pub const VALIDATION_TYPE_FIELD: &str = "Validation Type";
/// Record field carrying the rule parameter.
pub const VALIDATION_VALUE_FIELD: &str = "Validation Value";
/// Record field carrying the user-facing failure message.
pub const FAILURE_MESSAGE_FIELD: &str = "Failure Message";

/// One raw rule record: field name → cell value, in source order.
pub type RuleRecord = IndexMap<String, Value>;

/// The kind of check a [`Rule`] performs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValidationType {
    /// Value must be present and non-blank.
    Required,
    /// Value must be one of a comma-separated list (case-insensitive).
    AllowedValues,
    /// Value must parse as a number within an inclusive `min-max` range.
    NumericRange,
    /// String form of the value must match a regular expression.
    Regex,
    /// Value must be a date strictly before the current instant.
    DatePast,
    /// Value must not repeat within its column (case-insensitive, trimmed).
    Unique,
    /// Any other type string. Always passes.
    Unrecognized(String),
}

impl ValidationType {
    /// Parse a type string. Matching trims and ignores case.
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_uppercase();
        match normalized.as_str() {
            "REQUIRED" => Self::Required,
            "ALLOWED_VALUES" => Self::AllowedValues,
            "NUMERIC_RANGE" => Self::NumericRange,
            "REGEX" => Self::Regex,
            "DATE_PAST" => Self::DatePast,
            "UNIQUE" => Self::Unique,
            _ => Self::Unrecognized(normalized),
        }
    }

    /// Canonical upper-case name.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Required => "REQUIRED",
            Self::AllowedValues => "ALLOWED_VALUES",
            Self::NumericRange => "NUMERIC_RANGE",
            Self::Regex => "REGEX",
            Self::DatePast => "DATE_PAST",
            Self::Unique => "UNIQUE",
            Self::Unrecognized(s) => s.as_str(),
        }
    }

    /// Returns `false` for [`ValidationType::Unrecognized`].
    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }
}

impl fmt::Display for ValidationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ValidationType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A single typed validation rule attached to a column.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    /// Trimmed column name the rule applies to.
    pub column_name: String,
    /// Rule type.
    pub validation_type: ValidationType,
    /// Rule parameter (allowed list, `min-max`, pattern). `None` when absent or blank.
    pub validation_value: Option<String>,
    /// Configured failure message, if any.
    pub failure_message: Option<String>,
}

impl Rule {
    /// Create a rule with no parameter and no custom message.
    pub fn new(column_name: impl Into<String>, validation_type: ValidationType) -> Self {
        Self {
            column_name: column_name.into(),
            validation_type,
            validation_value: None,
            failure_message: None,
        }
    }

    /// Set the rule parameter.
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.validation_value = Some(value.into());
        self
    }

    /// Set the failure message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.failure_message = Some(message.into());
        self
    }

    /// Message attached to issues raised by this rule.
    pub fn message(&self) -> String {
        match &self.failure_message {
            Some(m) => m.clone(),
            None => format!(
                "Validation failed for {} (Rule: {})",
                self.column_name, self.validation_type
            ),
        }
    }

    /// Build a rule from a raw record.
    ///
    /// Returns `None` when the record has no usable `Column Name`.
    pub fn from_record(record: &RuleRecord) -> Option<Self> {
        let column_name = non_blank_text(record.get(COLUMN_NAME_FIELD))?
            .trim()
            .to_string();

        let raw_type = record
            .get(VALIDATION_TYPE_FIELD)
            .map(|v| v.to_text().into_owned())
            .unwrap_or_default();

        Some(Self {
            column_name,
            validation_type: ValidationType::parse(&raw_type),
            validation_value: non_blank_text(record.get(VALIDATION_VALUE_FIELD)),
            failure_message: non_blank_text(record.get(FAILURE_MESSAGE_FIELD)),
        })
    }
}

fn non_blank_text(value: Option<&Value>) -> Option<String> {
    match value {
        None => None,
        Some(v) if v.is_blank() => None,
        Some(v) => Some(v.to_text().into_owned()),
    }
}

/// Column name → ordered list of rules.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct RuleSet {
    by_column: IndexMap<String, Vec<Rule>>,
}

impl RuleSet {
    /// Create an empty rule set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule under its column, keeping insertion order.
    pub fn push(&mut self, rule: Rule) {
        self.by_column
            .entry(rule.column_name.clone())
            .or_default()
            .push(rule);
    }

    /// Rules for a column (empty slice if none).
    pub fn rules_for(&self, column: &str) -> &[Rule] {
        self.by_column
            .get(column)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Returns `true` if the column has at least one rule.
    pub fn has_rules_for(&self, column: &str) -> bool {
        self.by_column.contains_key(column)
    }

    /// Iterate column names in first-seen order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.by_column.keys().map(|k| k.as_str())
    }

    /// Iterate `(column, rules)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Rule])> {
        self.by_column
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Number of columns with rules.
    pub fn column_count(&self) -> usize {
        self.by_column.len()
    }

    /// Total number of rules.
    pub fn rule_count(&self) -> usize {
        self.by_column.values().map(Vec::len).sum()
    }

    /// Returns `true` when no column has rules.
    pub fn is_empty(&self) -> bool {
        self.by_column.is_empty()
    }
}

impl FromIterator<Rule> for RuleSet {
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        let mut set = Self::new();
        for rule in iter {
            set.push(rule);
        }
        set
    }
}

/// Convert raw rule records into a fresh [`RuleSet`].
///
/// Records without a `Column Name` are skipped. Unrecognized rule types are kept (they always
/// pass) and logged here, once, rather than on every evaluated cell.
pub fn extract_validation_rules(records: &[RuleRecord]) -> RuleSet {
    if records.is_empty() {
        tracing::warn!("data dictionary has no rules defined");
        return RuleSet::new();
    }

    let mut set = RuleSet::new();
    let mut skipped = 0usize;
    for record in records {
        match Rule::from_record(record) {
            Some(rule) => {
                if !rule.validation_type.is_recognized() {
                    tracing::warn!(
                        column = %rule.column_name,
                        validation_type = %rule.validation_type,
                        "unknown validation type; rule will always pass"
                    );
                }
                set.push(rule);
            }
            None => skipped += 1,
        }
    }

    tracing::debug!(
        columns = set.column_count(),
        rules = set.rule_count(),
        skipped,
        "extracted validation rules"
    );
    set
}

/// Read rule records from a sheet whose first row holds the field names.
///
/// Header names are trimmed; empty cells are left out of each record and fully blank rows are
/// dropped.
pub fn rule_records_from_sheet(sheet: &Sheet) -> Vec<RuleRecord> {
    let fields = sheet.column_names();
    sheet
        .rows
        .iter()
        .filter(|row| row.iter().any(|c| !c.is_blank()))
        .map(|row| {
            fields
                .iter()
                .zip(row.iter())
                .filter_map(|(field, cell)| match (field, cell) {
                    (Some(name), v) if !matches!(v, Value::Null) => {
                        Some((name.clone(), v.clone()))
                    }
                    _ => None,
                })
                .collect()
        })
        .collect()
}

/// A stored, named rule set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataDictionary {
    /// Display name, if stored.
    pub name: Option<String>,
    /// Raw rule records in source order.
    pub rules: Vec<RuleRecord>,
    /// Field names of the sheet the rules were imported from.
    pub source_headers: Vec<String>,
}

impl DataDictionary {
    /// Run the extractor over this dictionary's records.
    pub fn rule_set(&self) -> RuleSet {
        extract_validation_rules(&self.rules)
    }
}

/// Extract rules from a data-dictionary workbook's `"Validation Rules"` sheet.
///
/// Fails with [`ValidationError::RuleSet`] when the sheet is missing.
pub fn rules_from_workbook(workbook: &Workbook) -> ValidationResult<RuleSet> {
    let sheet = workbook
        .sheet(RULES_SHEET_NAME)
        .ok_or_else(|| ValidationError::RuleSet {
            message: format!("data dictionary does not contain a \"{RULES_SHEET_NAME}\" sheet"),
        })?;
    Ok(extract_validation_rules(&rule_records_from_sheet(sheet)))
}
