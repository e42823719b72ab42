//! Custom rule evaluation.
//!
//! Each [`Rule`] is compiled once per column into a [`CompiledRule`] (allowed list split, range
//! bounds parsed, pattern compiled) and then checked against every data row. `UNIQUE` rules are
//! column-wide and run as a single pass after the per-cell rules.
//!
//! Rule anomalies never fail the scan. Each has a fixed outcome:
//!
//! | Anomaly | Outcome |
//! |---|---|
//! | `ALLOWED_VALUES` without a value | always valid |
//! | `NUMERIC_RANGE` / `REGEX` without a value | always invalid |
//! | unparseable range bound | always invalid |
//! | malformed pattern | always valid (logged) |
//! | pattern exceeds the backtracking limit on a cell | valid for that cell (logged) |
//! | unrecognized type | always valid (logged once, at extraction) |
//!
//! Patterns are compiled with `fancy_regex`, so lookaround and backreferences work the way
//! dictionary authors write them for browser-side validation.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use fancy_regex::Regex;

use crate::rules::{Rule, ValidationType};
use crate::types::{parse_number, Value};

use super::{dates, excel_row, Issue};

#[derive(Debug)]
enum Check {
    Required,
    AllowedValues(Option<Vec<String>>),
    NumericRange(Option<(f64, f64)>),
    Pattern(PatternCheck),
    DatePast,
    Unique,
    AlwaysValid,
}

#[derive(Debug)]
enum PatternCheck {
    Missing,
    Malformed,
    Compiled(Regex),
}

/// A rule prepared for repeated evaluation against one column.
#[derive(Debug)]
pub struct CompiledRule<'a> {
    rule: &'a Rule,
    check: Check,
    message: String,
}

impl<'a> CompiledRule<'a> {
    /// Prepare `rule` for evaluation. Problems with the rule's value are logged, not returned.
    pub fn compile(rule: &'a Rule) -> Self {
        let value = rule.validation_value.as_deref();
        let check = match &rule.validation_type {
            ValidationType::Required => Check::Required,
            ValidationType::AllowedValues => Check::AllowedValues(value.map(allowed_list)),
            ValidationType::NumericRange => Check::NumericRange(value.map(range_bounds)),
            ValidationType::Regex => Check::Pattern(compile_pattern(&rule.column_name, value)),
            ValidationType::DatePast => Check::DatePast,
            ValidationType::Unique => Check::Unique,
            ValidationType::Unrecognized(name) => {
                tracing::trace!(
                    column = %rule.column_name,
                    validation_type = %name,
                    "unknown validation type; skipping"
                );
                Check::AlwaysValid
            }
        };
        Self {
            rule,
            check,
            message: rule.message(),
        }
    }

    /// The rule this was compiled from.
    pub fn rule(&self) -> &Rule {
        self.rule
    }

    /// Returns `true` for column-wide rules that are not checked cell by cell.
    pub fn is_column_wide(&self) -> bool {
        matches!(self.check, Check::Unique)
    }

    /// Check a single cell. Column-wide rules always report valid here.
    pub fn is_valid(&self, value: &Value, now: DateTime<Utc>) -> bool {
        match &self.check {
            Check::Required => !value.is_blank(),
            Check::AllowedValues(None) => true,
            Check::AllowedValues(Some(allowed)) => {
                let v = value.to_text().trim().to_lowercase();
                allowed.iter().any(|a| *a == v)
            }
            Check::NumericRange(None) => false,
            Check::NumericRange(Some((min, max))) => match cell_number(value) {
                Some(n) => n >= *min && n <= *max,
                None => false,
            },
            Check::Pattern(PatternCheck::Missing) => false,
            Check::Pattern(PatternCheck::Malformed) => true,
            Check::Pattern(PatternCheck::Compiled(re)) => {
                re.is_match(&value.to_text()).unwrap_or_else(|e| {
                    tracing::debug!(
                        column = %self.rule.column_name,
                        error = %e,
                        "regex evaluation aborted; treating cell as valid"
                    );
                    true
                })
            }
            Check::DatePast => dates::cell_as_datetime(value).is_some_and(|d| d < now),
            Check::Unique | Check::AlwaysValid => true,
        }
    }
}

fn allowed_list(raw: &str) -> Vec<String> {
    raw.split(',').map(|s| s.trim().to_lowercase()).collect()
}

/// `"min-max"`. An empty bound reads as 0; a missing or unparseable one as NaN, which no value
/// satisfies.
fn range_bounds(raw: &str) -> (f64, f64) {
    let mut parts = raw.split('-');
    let bound = |part: Option<&str>| match part.map(str::trim) {
        None => f64::NAN,
        Some("") => 0.0,
        Some(s) => parse_number(s).unwrap_or(f64::NAN),
    };
    let min = bound(parts.next());
    let max = bound(parts.next());
    if min.is_nan() || max.is_nan() {
        tracing::debug!(range = raw, "numeric range has an unparseable bound");
    }
    (min, max)
}

fn compile_pattern(column: &str, raw: Option<&str>) -> PatternCheck {
    let Some(pattern) = raw else {
        return PatternCheck::Missing;
    };
    match Regex::new(pattern) {
        Ok(re) => PatternCheck::Compiled(re),
        Err(e) => {
            tracing::warn!(column, pattern, error = %e, "invalid regex; skipping rule");
            PatternCheck::Malformed
        }
    }
}

fn cell_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) | Value::DateTime(n) => Some(*n),
        Value::Utf8(s) => parse_number(s),
        Value::Null | Value::Bool(_) => None,
    }
}

/// Evaluate every rule of one column against the sheet's data rows.
///
/// Issues come out grouped by rule, in rule order, with row order inside each group. `UNIQUE`
/// violations follow all other issues and are reported once per row however many `UNIQUE` rules
/// the column carries.
pub fn evaluate_column(
    column: &str,
    column_index: usize,
    rules: &[Rule],
    rows: &[Vec<Value>],
    now: DateTime<Utc>,
) -> Vec<Issue> {
    let compiled: Vec<CompiledRule<'_>> = rules.iter().map(CompiledRule::compile).collect();

    let mut issues = Vec::new();
    for rule in compiled.iter().filter(|r| !r.is_column_wide()) {
        for (idx, row) in rows.iter().enumerate() {
            let value = row.get(column_index).unwrap_or(&Value::Null);
            if !rule.is_valid(value, now) {
                issues.push(Issue {
                    row: excel_row(idx),
                    value: value.clone(),
                    message: rule.message.clone(),
                    rule_type: rule.rule.validation_type.clone(),
                });
            }
        }
    }

    if compiled.iter().any(CompiledRule::is_column_wide) {
        issues.extend(find_unique_violations(column, column_index, rows));
    }
    issues
}

/// Flag every repeat of a non-blank value in a column, compared trimmed and case-insensitively.
pub fn find_unique_violations(
    column: &str,
    column_index: usize,
    rows: &[Vec<Value>],
) -> Vec<Issue> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut issues = Vec::new();
    for (idx, row) in rows.iter().enumerate() {
        let Some(value) = row.get(column_index) else {
            continue;
        };
        if value.is_blank() {
            continue;
        }
        let normalized = value.to_text().trim().to_lowercase();
        if !seen.insert(normalized) {
            issues.push(Issue {
                row: excel_row(idx),
                value: value.clone(),
                message: format!("Value '{value}' in column '{column}' is not unique."),
                rule_type: ValidationType::Unique,
            });
        }
    }
    issues
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};

    use super::{evaluate_column, find_unique_violations, CompiledRule};
    use crate::rules::{Rule, ValidationType};
    use crate::types::Value;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
    }

    fn check(rule: &Rule, value: Value) -> bool {
        CompiledRule::compile(rule).is_valid(&value, now())
    }

    fn column(values: &[Value]) -> Vec<Vec<Value>> {
        values.iter().map(|v| vec![v.clone()]).collect()
    }

    #[test]
    fn required_rejects_blank_and_accepts_zero() {
        let r = Rule::new("C", ValidationType::Required);
        assert!(!check(&r, Value::Null));
        assert!(!check(&r, Value::text("")));
        assert!(!check(&r, Value::text("  \t")));
        assert!(check(&r, Value::Number(0.0)));
        assert!(check(&r, Value::text("x")));
    }

    #[test]
    fn numeric_range_is_inclusive_and_strict() {
        let r = Rule::new("C", ValidationType::NumericRange).with_value("10-20");
        assert!(check(&r, Value::Number(15.0)));
        assert!(!check(&r, Value::Number(9.0)));
        assert!(check(&r, Value::Number(20.0)));
        assert!(check(&r, Value::text(" 10 ")));
        assert!(!check(&r, Value::text("abc")));
        assert!(!check(&r, Value::text("12abc")));
        assert!(!check(&r, Value::Null));

        let missing = Rule::new("C", ValidationType::NumericRange);
        assert!(!check(&missing, Value::Number(15.0)));

        let open_max = Rule::new("C", ValidationType::NumericRange).with_value("10");
        assert!(!check(&open_max, Value::Number(15.0)));

        let empty_min = Rule::new("C", ValidationType::NumericRange).with_value("-5");
        assert!(check(&empty_min, Value::Number(3.0)));
        assert!(!check(&empty_min, Value::Number(-1.0)));
    }

    #[test]
    fn allowed_values_without_list_are_skipped() {
        let r = Rule::new("C", ValidationType::AllowedValues).with_value("Yes, No ,maybe");
        assert!(check(&r, Value::text(" YES ")));
        assert!(check(&r, Value::text("no")));
        assert!(!check(&r, Value::text("never")));
        assert!(!check(&r, Value::Null));

        let unset = Rule::new("C", ValidationType::AllowedValues);
        assert!(check(&unset, Value::text("anything")));
    }

    #[test]
    fn regex_fallbacks() {
        let r = Rule::new("Email", ValidationType::Regex).with_value("^[^@]+@[^@]+$");
        assert!(check(&r, Value::text("a@b.com")));
        assert!(!check(&r, Value::text("bad")));
        assert!(!check(&r, Value::text("")));
        assert!(!check(&r, Value::Null));

        let unanchored = Rule::new("C", ValidationType::Regex).with_value("\\d");
        assert!(check(&unanchored, Value::text("abc1")));
        assert!(check(&unanchored, Value::Number(7.0)));

        let malformed = Rule::new("C", ValidationType::Regex).with_value("([a-z");
        assert!(check(&malformed, Value::text("anything")));

        let missing = Rule::new("C", ValidationType::Regex);
        assert!(!check(&missing, Value::text("anything")));
    }

    #[test]
    fn regex_supports_lookaround_and_backreferences() {
        let needs_digit = Rule::new("Code", ValidationType::Regex).with_value(r"^(?=.*\d).+$");
        assert!(!check(&needs_digit, Value::text("nodigits")));
        assert!(check(&needs_digit, Value::text("abc1")));

        let issues = evaluate_column(
            "Code",
            0,
            &[needs_digit],
            &column(&[Value::text("nodigits"), Value::text("abc1")]),
            now(),
        );
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].row, 2);
        assert_eq!(issues[0].value, Value::text("nodigits"));

        let no_repeat = Rule::new("Code", ValidationType::Regex).with_value(r"^(?!.*(.)\1)");
        assert!(check(&no_repeat, Value::text("abc")));
        assert!(!check(&no_repeat, Value::text("abbc")));
    }

    #[test]
    fn date_past_requires_a_parseable_past_date() {
        let r = Rule::new("C", ValidationType::DatePast);
        assert!(check(&r, Value::text("2020-05-17")));
        assert!(!check(&r, Value::text("2099-01-01")));
        assert!(!check(&r, Value::text("yesterday")));
        assert!(check(&r, Value::DateTime(45292.0)));
        assert!(!check(&r, Value::Null));
        assert!(!check(&r, Value::Bool(false)));
    }

    #[test]
    fn unrecognized_types_always_pass() {
        let r = Rule::new("C", ValidationType::parse("STARTS_WITH")).with_value("A");
        assert!(check(&r, Value::text("zzz")));
        assert!(check(&r, Value::Null));
    }

    #[test]
    fn unique_flags_n_minus_one_repeats() {
        let rows = column(&[
            Value::text("a"),
            Value::text(" A "),
            Value::Null,
            Value::text("b"),
            Value::text("a"),
            Value::text(""),
            Value::text(""),
        ]);
        let issues = find_unique_violations("Code", 0, &rows);
        assert_eq!(issues.iter().map(|i| i.row).collect::<Vec<_>>(), vec![3, 6]);
        assert_eq!(issues[0].message, "Value ' A ' in column 'Code' is not unique.");
        assert_eq!(issues[0].value, Value::text(" A "));

        let single = column(&[Value::text("a"), Value::text("b")]);
        assert!(find_unique_violations("Code", 0, &single).is_empty());
    }

    #[test]
    fn unique_issues_follow_cell_rules_and_are_not_doubled() {
        let rules = vec![
            Rule::new("Code", ValidationType::Unique),
            Rule::new("Code", ValidationType::Required).with_message("Code is required"),
            Rule::new("Code", ValidationType::Unique).with_message("ignored"),
        ];
        let rows = column(&[Value::text("x"), Value::Null, Value::text("X")]);
        let issues = evaluate_column("Code", 0, &rules, &rows, now());

        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].row, 3);
        assert_eq!(issues[0].rule_type, ValidationType::Required);
        assert_eq!(issues[0].message, "Code is required");
        assert_eq!(issues[1].row, 4);
        assert_eq!(issues[1].rule_type, ValidationType::Unique);
    }

    #[test]
    fn issues_are_grouped_by_rule_order() {
        let rules = vec![
            Rule::new("Age", ValidationType::NumericRange).with_value("0-120"),
            Rule::new("Age", ValidationType::Required),
        ];
        let rows = column(&[Value::Null, Value::Number(200.0)]);
        let issues = evaluate_column("Age", 0, &rules, &rows, now());
        let summary: Vec<(usize, &str)> = issues
            .iter()
            .map(|i| (i.row, i.rule_type.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![(2, "NUMERIC_RANGE"), (3, "NUMERIC_RANGE"), (2, "REQUIRED")]
        );
        assert_eq!(issues[0].message, "Validation failed for Age (Rule: NUMERIC_RANGE)");
    }
}
