use metawiz::downloader::{header_row, schema_rows, schema_to_csv, to_csv};
use metawiz::field::{Attribute, FieldDefinition, FieldValue};
use metawiz::wizard::Submission;
use std::collections::BTreeMap;

fn submission() -> Submission {
    let mut fields = BTreeMap::new();
    fields.insert(
        0,
        FieldDefinition::named("colour")
            .with(Attribute::FieldType, "categorical")
            .with(Attribute::CategoricalValues, "red, dark\ngreen")
            .with(
                Attribute::AllowedMissingVals,
                FieldValue::List(vec!["not collected".to_string(), "not provided".to_string()]),
            ),
    );
    fields.insert(2, FieldDefinition::named("depth").with(Attribute::FieldType, "continuous"));
    Submission {
        study_name: "Soil survey".to_string(),
        package: None,
        package_fields: vec!["latitude".to_string(), "longitude".to_string()],
        fields,
    }
}

#[test]
fn test_header_row_order() {
    let headers = header_row(&submission());
    assert_eq!(
        headers,
        vec!["sample_name", "latitude", "longitude", "colour", "depth"]
    );
    println!("✓ Header row in column order");
}

#[test]
fn test_header_row_skips_repeats() {
    let mut submission = submission();
    submission.package_fields.push("sample_name".to_string());
    submission.package_fields.push("colour".to_string());
    let headers = header_row(&submission);
    assert_eq!(headers.iter().filter(|h| *h == "sample_name").count(), 1);
    assert_eq!(headers.iter().filter(|h| *h == "colour").count(), 1);
    println!("✓ Header row has no repeated columns");
}

#[test]
fn test_to_csv() {
    let csv = to_csv(&submission()).unwrap();
    assert_eq!(csv, "sample_name,latitude,longitude,colour,depth\n");
    println!("✓ CSV template generated");
}

#[test]
fn test_schema_rows() {
    let rows = schema_rows(&submission());
    assert_eq!(rows.len(), 3, "a header and one row per field");
    assert_eq!(rows[0].len(), Attribute::ALL.len() - 1, "every attribute but the button");
    assert_eq!(rows[0][0], "field_name");

    let missing_column = rows[0]
        .iter()
        .position(|name| name == "allowed_missing_vals[]")
        .unwrap();
    assert_eq!(rows[1][missing_column], "not collected; not provided");
    assert_eq!(rows[2][0], "depth");

    let csv = schema_to_csv(&submission()).unwrap();
    assert!(csv.contains("\"red, dark\ngreen\""), "values with commas are quoted");
    assert_eq!(csv.lines().next().unwrap().split(',').count(), Attribute::ALL.len() - 1);
    println!("✓ Schema rows generated");
}
