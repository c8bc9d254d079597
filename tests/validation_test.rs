use metawiz::config::FIELD_NAME_REGEX;
use metawiz::registry::FieldRegistry;
use metawiz::validation::{
    FIELD_NAMES_HEADER, NAME_PATTERN_MSG, UNIQUE_NAME_MSG, datetime_msg, has_no_duplicates,
    is_integer, is_number, is_reserved_word_msg, is_valid_datetime, reserved_suffix_msg,
    validate_field_names_list, validate_putative_field_name, values_from_multiline,
};
use regex::Regex;
use serde_json::json;

fn registry() -> FieldRegistry {
    let mut registry = FieldRegistry::with_reserved_suffixes(["_units", "_phi"]);
    registry.set_reserved_words(&[json!("sample_name")]);
    registry.add_field("weight");
    registry
}

#[test]
fn test_datetime_formats() {
    for valid in [
        "2020-02-29 23:59:59",
        "2021-06-01 08:30",
        "2021-06-01 08",
        "2020-02-29",
        "2021-12",
        "1999",
    ] {
        assert!(is_valid_datetime(valid), "'{}' should be accepted", valid);
    }
    for invalid in [
        "2019-02-29",
        "2021-13-01",
        "2021-06-01 24:00",
        "2021-06-01T08:30",
        "2021-6-1",
        "21",
        "",
        "yesterday",
    ] {
        assert!(!is_valid_datetime(invalid), "'{}' should be rejected", invalid);
    }
    assert!(datetime_msg().contains("YYYY-MM-DD HH:mm:ss or YYYY-MM-DD HH:mm"));
    println!("✓ Datetime formats checked");
}

#[test]
fn test_numbers() {
    assert!(is_integer("42"));
    assert!(is_integer("-7"));
    assert!(!is_integer("4.2"));
    assert!(!is_integer("four"));

    assert!(is_number("4.2"));
    assert!(is_number("-0.5"));
    assert!(is_number(".5"));
    assert!(is_number("1,000.25"));
    assert!(!is_number("1,00"));
    assert!(!is_number("-"));
    assert!(!is_number("1e5"));
    println!("✓ Numbers checked");
}

#[test]
fn test_multiline_values() {
    assert_eq!(values_from_multiline("a\n\nb\r\n"), vec!["a", "b"]);
    assert!(has_no_duplicates("red\ngreen\nblue"));
    assert!(!has_no_duplicates("red\ngreen\nred"));
    assert!(has_no_duplicates(""));
    println!("✓ Multi-line values split");
}

#[test]
fn test_putative_field_name() {
    let registry = registry();
    let pattern = Regex::new(FIELD_NAME_REGEX).unwrap();

    assert!(validate_putative_field_name("height", &registry, &pattern).is_empty());
    assert_eq!(
        validate_putative_field_name("Sample_Name", &registry, &pattern),
        vec![is_reserved_word_msg("Sample_Name"), NAME_PATTERN_MSG.to_string()]
    );
    assert_eq!(
        validate_putative_field_name("height_units", &registry, &pattern),
        vec![reserved_suffix_msg("height_units", "_units")]
    );
    assert_eq!(
        validate_putative_field_name("1height", &registry, &pattern),
        vec![NAME_PATTERN_MSG.to_string()]
    );
    assert_eq!(
        validate_putative_field_name("weight", &registry, &pattern),
        vec![UNIQUE_NAME_MSG.to_string()]
    );
    println!("✓ Field names checked in order");
}

#[test]
fn test_field_names_list() {
    let registry = registry();
    let pattern = Regex::new(FIELD_NAME_REGEX).unwrap();

    assert!(validate_field_names_list("height\nage\n", &registry, &pattern).is_empty());

    let messages = validate_field_names_list("height\nweight\n\nage_phi", &registry, &pattern);
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0], FIELD_NAMES_HEADER);
    assert_eq!(messages[1], format!("weight: {}", UNIQUE_NAME_MSG));
    assert!(messages[2].starts_with("age_phi: "));
    println!("✓ Field-name lists checked");
}
