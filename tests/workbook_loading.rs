use sheet_validation::ingestion::csv::load_csv_from_path;
use sheet_validation::ingestion::{load_workbook_from_bytes, load_workbook_from_path, LoadOptions, WorkbookFormat};
use sheet_validation::types::Value;
use sheet_validation::ValidationError;

#[test]
fn csv_fixture_loads_as_single_sheet() {
    let wb = load_csv_from_path("tests/fixtures/people.csv", true).unwrap();
    assert_eq!(wb.sheet_names().collect::<Vec<_>>(), vec!["Sheet1"]);
    let sheet = &wb.sheets[0];
    assert_eq!(sheet.header, vec![Value::text("Name"), Value::text("Age")]);
    assert_eq!(sheet.row_count(), 3);
    assert_eq!(sheet.rows[1], vec![Value::Null, Value::Number(25.0)]);
}

#[test]
fn csv_without_type_inference_keeps_text() {
    let opts = LoadOptions {
        infer_csv_types: false,
        ..Default::default()
    };
    let wb = load_workbook_from_path("tests/fixtures/people.csv", &opts).unwrap();
    assert_eq!(wb.sheets[0].rows[0][1], Value::text("30"));
}

#[test]
fn forced_format_overrides_sniffing() {
    let opts = LoadOptions {
        format: Some(WorkbookFormat::Csv),
        ..Default::default()
    };
    let wb = load_workbook_from_bytes(b"only_header\n", "x.dat", &opts).unwrap();
    assert_eq!(wb.sheets[0].header, vec![Value::text("only_header")]);
    assert!(wb.sheets[0].is_empty());
}

#[test]
fn unrecognized_bytes_are_a_parse_error() {
    let err = load_workbook_from_bytes(&[0x00, 0x9F, 0x92, 0x96], "blob.bin", &LoadOptions::default())
        .unwrap_err();
    assert!(matches!(err, ValidationError::ParseError { .. }));
    assert!(err.is_parse_failure());
    assert!(err.to_string().contains("blob.bin"));

    let err = load_workbook_from_bytes(b"", "empty.csv", &LoadOptions::default()).unwrap_err();
    assert!(err.is_parse_failure());
}

#[test]
fn missing_file_is_io_error() {
    let err = load_workbook_from_path("tests/fixtures/does_not_exist.csv", &LoadOptions::default())
        .unwrap_err();
    assert!(matches!(err, ValidationError::Io(_)));
}

#[test]
fn windows_1252_csv_is_sniffed_and_decoded() {
    let bytes = b"Name,City\nJos\xe9,M\xe1laga\nFran\xe7ois,Li\xe8ge\n";
    let wb = load_workbook_from_bytes(bytes, "patients.csv", &LoadOptions::default()).unwrap();
    let sheet = &wb.sheets[0];
    assert_eq!(sheet.row_count(), 2);
    assert_eq!(sheet.rows[0], vec![Value::text("José"), Value::text("Málaga")]);
    assert_eq!(sheet.rows[1][1], Value::text("Liège"));
}
