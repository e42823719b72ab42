use chrono::{TimeZone, Utc};

use sheet_validation::analysis::{analyze_workbook, AnalysisOptions, OverallStatus};
use sheet_validation::ingestion::json::load_data_dictionary_from_path;
use sheet_validation::ingestion::{load_workbook_from_path, LoadOptions};
use sheet_validation::report::{generate_report, ColumnStatus, OverrideSet};
use sheet_validation::rules::{extract_validation_rules, RuleRecord, RuleSet, ValidationType};
use sheet_validation::types::{Sheet, Value, Workbook};

fn opts() -> AnalysisOptions {
    AnalysisOptions::at(Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap())
}

fn record(fields: &[(&str, &str)]) -> RuleRecord {
    fields
        .iter()
        .map(|(k, v)| (k.to_string(), Value::text(*v)))
        .collect()
}

#[test]
fn blank_and_duplicate_scenario_without_rules() {
    let wb = Workbook::new(vec![Sheet::from_grid(
        "Data",
        vec![
            vec![Value::text("Name"), Value::text("Age")],
            vec![Value::text("Alice"), Value::text("30")],
            vec![Value::text(""), Value::text("25")],
            vec![Value::text("Alice"), Value::text("30")],
        ],
    )]);

    let results = analyze_workbook(&wb, &RuleSet::new(), &opts());
    let data = results.get("Data").unwrap();
    assert_eq!(data.blank_cells.get("Name"), Some(&1));
    assert_eq!(data.blank_cells.get("Age"), Some(&0));
    assert_eq!(data.duplicate_rows, vec![4]);
    assert!(data.custom_validation.is_empty());

    assert_eq!(results.totals.blank_cells, 1);
    assert_eq!(results.totals.duplicate_rows, 1);
    assert_eq!(results.totals.null_strings, 0);
    assert_eq!(results.totals.future_dates, 0);
}

#[test]
fn same_scenario_loaded_from_csv_fixture() {
    let wb = load_workbook_from_path("tests/fixtures/people.csv", &LoadOptions::default()).unwrap();
    let results = analyze_workbook(&wb, &RuleSet::new(), &opts());
    let sheet = results.get("Sheet1").unwrap();
    assert_eq!(sheet.blank_cells.get("Name"), Some(&1));
    assert_eq!(sheet.duplicate_rows, vec![4]);
}

#[test]
fn regex_rule_flags_non_matching_and_empty_values() {
    let rules = extract_validation_rules(&[record(&[
        ("Column Name", "Email"),
        ("Validation Type", "REGEX"),
        ("Validation Value", "^[^@]+@[^@]+$"),
    ])]);
    let wb = Workbook::new(vec![Sheet::from_grid(
        "Contacts",
        vec![
            vec![Value::text("Email")],
            vec![Value::text("a@b.com")],
            vec![Value::text("bad")],
            vec![Value::text("")],
        ],
    )]);

    let results = analyze_workbook(&wb, &rules, &opts());
    let issues = &results.get("Contacts").unwrap().custom_validation["Email"];
    assert_eq!(issues.len(), 2);
    assert_eq!(issues[0].row, 3);
    assert_eq!(issues[0].value, Value::text("bad"));
    assert_eq!(issues[1].row, 4);
    assert_eq!(issues[1].rule_type, ValidationType::Regex);
    assert_eq!(
        issues[1].message,
        "Validation failed for Email (Rule: REGEX)"
    );
}

#[test]
fn unique_rule_reports_n_minus_one() {
    let rules = extract_validation_rules(&[
        record(&[("Column Name", "Code"), ("Validation Type", "UNIQUE")]),
        record(&[("Column Name", "Code"), ("Validation Type", "unique")]),
    ]);
    let mut grid = vec![vec![Value::text("Code")]];
    for v in ["X1", "x1 ", "X1", "Y2"] {
        grid.push(vec![Value::text(v)]);
    }
    let wb = Workbook::new(vec![Sheet::from_grid("S", grid)]);

    let results = analyze_workbook(&wb, &rules, &opts());
    let issues = &results.get("S").unwrap().custom_validation["Code"];
    assert_eq!(issues.iter().map(|i| i.row).collect::<Vec<_>>(), vec![3, 4]);
}

#[test]
fn customer_fixture_with_stored_dictionary() {
    let wb = load_workbook_from_path("tests/fixtures/customers.csv", &LoadOptions::default()).unwrap();
    let dict = load_data_dictionary_from_path("tests/fixtures/customer_rules.json").unwrap();
    assert_eq!(dict.name.as_deref(), Some("Customer master"));
    let rules = dict.rule_set();
    assert_eq!(rules.column_count(), 5);

    let results = analyze_workbook(&wb, &rules, &opts());
    let sheet = results.get("Sheet1").unwrap();

    assert_eq!(sheet.blank_cells.get("Email"), Some(&1));
    assert_eq!(sheet.null_strings.get("Joined"), Some(&1));
    assert_eq!(sheet.future_dates.get("Joined"), Some(&1));
    assert!(sheet.duplicate_rows.is_empty());

    let custom = &sheet.custom_validation;
    assert_eq!(custom["ID"].len(), 1);
    assert_eq!(custom["ID"][0].message, "Value '1' in column 'ID' is not unique.");
    assert_eq!(custom["Email"].len(), 2);
    assert!(custom["Email"].iter().all(|i| i.message == "Email is malformed"));
    assert_eq!(custom["Status"].len(), 1);
    assert_eq!(custom["Status"][0].value, Value::text("Retired"));
    assert_eq!(custom["Age"].iter().map(|i| i.row).collect::<Vec<_>>(), vec![3, 4]);
    assert_eq!(custom["Joined"].iter().map(|i| i.row).collect::<Vec<_>>(), vec![3, 4]);
    assert_eq!(sheet.counts().custom_validation, 8);

    let report = generate_report(&wb, &results, &OverrideSet::new(), Some("customers.csv"), Utc::now());
    assert_eq!(report.totals.identified, 11);
    assert_eq!(report.status(), OverallStatus::Fail);

    let overrides = OverrideSet::from_toggles(
        ["ID", "Email", "Status", "Age", "Joined"].map(|c| (("Sheet1", c), true)),
    );
    let report = generate_report(&wb, &results, &overrides, Some("customers.csv"), Utc::now());
    assert_eq!(report.totals.overridden, 11);
    assert_eq!(report.totals.remaining, 0);
    assert!(report.sheets[0].columns.iter().all(|c| c.status == ColumnStatus::Overridden));
    assert_eq!(report.status(), OverallStatus::Pass);
}

#[test]
fn override_toggle_round_trip_restores_totals() {
    let wb = load_workbook_from_path("tests/fixtures/people.csv", &LoadOptions::default()).unwrap();
    let results = analyze_workbook(&wb, &RuleSet::new(), &opts());
    let now = Utc::now();

    let mut overrides = OverrideSet::new();
    let before = generate_report(&wb, &results, &overrides, None, now);

    overrides.toggle("Sheet1", "Name");
    let during = generate_report(&wb, &results, &overrides, None, now);
    assert_eq!(during.totals.identified, before.totals.identified);
    assert_eq!(during.totals.overridden, 1);
    assert_eq!(during.totals.remaining, before.totals.remaining - 1);

    overrides.toggle("Sheet1", "Name");
    let after = generate_report(&wb, &results, &overrides, None, now);
    assert_eq!(after, before);
}
