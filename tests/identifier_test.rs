use metawiz::field::Attribute;
use metawiz::identifier::{
    ElementKey, base_name_from_identifier, field_index_from_identifier, identifier_for,
    identifier_from_template, is_template_identifier, template_identifier,
};

#[test]
fn test_template_identifier_keeps_list_marker_last() {
    assert_eq!(template_identifier("minimum_value"), "minimum_value_template");
    assert_eq!(
        template_identifier("allowed_missing_vals[]"),
        "allowed_missing_vals_template[]"
    );
    println!("✓ Template identifiers built");
}

#[test]
fn test_identifier_from_template() {
    assert_eq!(identifier_from_template("minimum_value_template", 3), "minimum_value_3");
    assert_eq!(
        identifier_from_template("allowed_missing_vals_template[]", 2),
        "allowed_missing_vals_2[]"
    );
    assert_eq!(identifier_from_template("units_div_template", 10), "units_div_10");

    // Only the last suffix is substituted
    assert_eq!(identifier_from_template("x_template_template", 4), "x_template_4");

    // Nothing to substitute
    assert_eq!(identifier_from_template("study_name", 4), "study_name");
    println!("✓ Template substitution applied once");
}

#[test]
fn test_index_extraction() {
    assert_eq!(field_index_from_identifier("units_12"), Some(12));
    assert_eq!(field_index_from_identifier("allowed_missing_vals_2[]"), Some(2));
    assert_eq!(field_index_from_identifier("study_name"), None);
    assert_eq!(field_index_from_identifier("units_template"), None);

    assert_eq!(base_name_from_identifier("units_12").as_deref(), Some("units"));
    assert_eq!(
        base_name_from_identifier("allowed_missing_vals_2[]").as_deref(),
        Some("allowed_missing_vals[]")
    );
    assert_eq!(base_name_from_identifier("field_names"), None);
    println!("✓ Field indexes recovered from identifiers");
}

#[test]
fn test_template_detection() {
    assert!(is_template_identifier("units_template"));
    assert!(is_template_identifier("allowed_missing_vals_template[]"));
    assert!(!is_template_identifier("units_0"));
    assert!(!is_template_identifier(&identifier_for("units", 0)));
    println!("✓ Template identifiers detected");
}

#[test]
fn test_element_key_round_trip() {
    let key = ElementKey::new(5, Attribute::AllowedMissingVals);
    assert_eq!(key.identifier(), "allowed_missing_vals_5[]");
    assert_eq!(ElementKey::parse(&key.identifier()), Some(key));

    let key = ElementKey::parse("minimum_comparison_0").expect("key should parse");
    assert_eq!(key.index, 0);
    assert_eq!(key.attribute, Attribute::MinimumComparison);

    assert_eq!(ElementKey::parse("no_such_thing_1"), None);
    assert_eq!(key.to_string(), "minimum_comparison_0");
    println!("✓ Element keys parsed");
}
