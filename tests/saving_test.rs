use flate2::Compression;
use flate2::write::GzEncoder;
use metawiz::config::WizardSettings;
use metawiz::field::Attribute;
use metawiz::protocol::NON_WIZARD_FILE_ERROR_PREFIX;
use metawiz::saving::{from_bytes, load_wizard_file, save_wizard_file, to_bytes, upload_response};
use metawiz::wizard::{SubmitOutcome, Submission, Wizard};
use std::io::Write;
use tempfile::tempdir;

fn described_wizard() -> Wizard {
    let mut wizard = Wizard::new(WizardSettings::default()).unwrap();
    wizard.set_study_name("Soil survey");
    wizard.add_field_names("depth\nhabitat").unwrap();

    wizard.set_value(0, Attribute::FieldType, "continuous").unwrap();
    wizard.set_value(0, Attribute::DataType, "float").unwrap();
    wizard
        .set_checked(0, Attribute::AllowedMissingVals, "not collected", true)
        .unwrap();
    wizard.set_value(0, Attribute::MinimumComparison, "greater_than").unwrap();
    wizard.set_value(0, Attribute::MinimumValue, "0").unwrap();
    wizard.set_value(0, Attribute::Units, "cm").unwrap();
    wizard.set_value(0, Attribute::DefaultValue, "continuous_default").unwrap();
    wizard.set_value(0, Attribute::ContinuousDefault, "1.5").unwrap();

    wizard.set_value(1, Attribute::FieldType, "categorical").unwrap();
    wizard.set_value(1, Attribute::DataType, "str").unwrap();
    wizard.set_value(1, Attribute::CategoricalValues, "forest\nmeadow").unwrap();
    wizard.set_checked(1, Attribute::IsUnitless, "true", true).unwrap();
    wizard.set_value(1, Attribute::DefaultValue, "categorical_default").unwrap();
    wizard
        .set_value(1, Attribute::CategoricalDefaultSelect, "meadow")
        .unwrap();
    wizard
}

fn accepted(wizard: &mut Wizard) -> Submission {
    match wizard.submit() {
        SubmitOutcome::Accepted(submission) => submission,
        SubmitOutcome::Rejected(report) => panic!("unexpected errors: {}", report.summary_text()),
    }
}

#[test]
fn test_save_and_load_wizard_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("soil.wizard.json.gz");

    let submission = accepted(&mut described_wizard());
    save_wizard_file(&submission, &path).unwrap();
    assert!(path.exists(), "File was not created");

    let loaded = load_wizard_file(&path).unwrap();
    assert_eq!(loaded, submission, "Submission wasn't preserved");
    println!("✓ Wizard file saved and loaded");
}

#[test]
fn test_upload_restores_fields() {
    let submission = accepted(&mut described_wizard());
    let bytes = to_bytes(&submission).unwrap();

    let response = upload_response(&[("soil.wizard.json.gz".to_string(), bytes)]);
    assert_eq!(response.files.len(), 1);
    assert!(response.files[0].error.is_none());

    let mut restored = Wizard::new(WizardSettings::default()).unwrap();
    restored.set_study_name("Soil survey");
    let errors = restored.apply_upload_response(&response).unwrap();
    assert!(errors.is_empty());
    assert_eq!(
        restored.registry().uploaded_file_names(),
        &["soil.wizard.json.gz".to_string()]
    );

    let again = accepted(&mut restored);
    assert_eq!(
        again.field_definitions(),
        submission.field_definitions(),
        "uploaded fields should describe the same template"
    );
    println!("✓ Uploaded wizard file restores the fields");
}

#[cfg(feature = "web")]
#[test]
fn test_upload_restores_fields_from_xlsx() {
    use metawiz::downloader::to_xlsx;
    use metawiz::saving::from_xlsx_bytes;

    let submission = accepted(&mut described_wizard());
    let xlsx = to_xlsx(&submission).unwrap();
    assert_eq!(from_xlsx_bytes(&xlsx).unwrap(), submission, "form sheet should hold the form");

    let mut budget = rust_xlsxwriter::Workbook::new();
    budget.add_worksheet().write_string(0, 0, "total").unwrap();
    let budget = budget.save_to_buffer().unwrap();

    let response = upload_response(&[
        ("soil.xlsx".to_string(), xlsx),
        ("budget.xlsx".to_string(), budget),
    ]);
    assert!(response.files[0].error.is_none());
    assert_eq!(
        response.files[1].error.as_deref(),
        Some(format!("{}'budget.xlsx'.", NON_WIZARD_FILE_ERROR_PREFIX).as_str()),
        "other workbooks are not wizard files"
    );

    let mut restored = Wizard::new(WizardSettings::default()).unwrap();
    restored.set_study_name("Soil survey");
    let errors = restored.apply_upload_response(&response).unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(
        restored.form().field(1).unwrap().value(Attribute::CategoricalDefaultSelect),
        "meadow"
    );

    let again = accepted(&mut restored);
    assert_eq!(again.field_definitions(), submission.field_definitions());
    println!("✓ Uploaded XLSX template restores the fields");
}

#[test]
fn test_upload_rejects_foreign_files() {
    let good = to_bytes(&Submission::default()).unwrap();
    let response = upload_response(&[
        ("notes.txt".to_string(), b"just some notes".to_vec()),
        ("empty.wizard.json.gz".to_string(), good),
    ]);

    assert_eq!(
        response.files[0].error.as_deref(),
        Some(format!("{}'notes.txt'.", NON_WIZARD_FILE_ERROR_PREFIX).as_str())
    );
    assert!(response.files[1].error.is_none());
    assert!(response.fields.is_none(), "an empty form contributes no fields");

    let mut wizard = Wizard::new(WizardSettings::default()).unwrap();
    let errors = wizard.apply_upload_response(&response).unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(wizard.registry().uploaded_file_names().len(), 1);
    println!("✓ Foreign files reported");
}

#[test]
fn test_envelope_is_checked() {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(br#"{"format": "spreadsheet", "version": 1, "metadata_form": {"study_name": "x", "fields": {}}}"#)
        .unwrap();
    let foreign = encoder.finish().unwrap();
    assert!(from_bytes(&foreign).is_err(), "other formats must be refused");

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(br#"{"format": "metawiz", "version": 99, "metadata_form": {"study_name": "x", "fields": {}}}"#)
        .unwrap();
    let future = encoder.finish().unwrap();
    assert!(from_bytes(&future).is_err(), "newer versions must be refused");
    println!("✓ File envelope checked");
}
