use metawiz::config::WizardSettings;
use metawiz::field::{
    Attribute, DataType, DefaultOption, FieldDefinition, FieldItems, FieldType, FieldValue,
};
use metawiz::identifier::ElementKey;
use metawiz::loader::{load_fields, read_field_items};
use metawiz::validation::Rule;
use metawiz::wizard::Wizard;
use std::fs;
use tempfile::tempdir;

fn wizard() -> Wizard {
    Wizard::new(WizardSettings::default()).unwrap()
}

fn weight_definition() -> FieldDefinition {
    FieldDefinition::named("weight")
        .with(Attribute::FieldType, "continuous")
        .with(Attribute::DataType, "float")
        .with(
            Attribute::AllowedMissingVals,
            vec!["not provided".to_string(), "not collected".to_string()],
        )
        .with(Attribute::MinimumComparison, "greater_than_or_equal_to")
        .with(Attribute::MinimumValue, "0")
        .with(Attribute::Units, "kg")
        .with(Attribute::DefaultValue, "continuous_default")
        .with(Attribute::ContinuousDefault, "70.5")
}

#[test]
fn test_load_names_skips_blank_and_known() {
    let mut wizard = wizard();
    let items = FieldItems::Names(vec![
        "weight".to_string(),
        " ".to_string(),
        "weight".to_string(),
        "height".to_string(),
    ]);
    let added = load_fields(&mut wizard, &items).unwrap();
    assert_eq!(added, vec![0, 1], "skipped names must not use up an index");
    assert_eq!(wizard.registry().next_index(), 2);
    assert_eq!(wizard.form().index_of_name("height"), Some(1));
    assert!(wizard.form().existing_fields_visible());

    // Nothing new: no options, no change
    let again = load_fields(&mut wizard, &FieldItems::Names(vec!["height".to_string()])).unwrap();
    assert!(again.is_empty());
    assert_eq!(wizard.form().field_name_options().len(), 2);
    println!("✓ Names loaded once each");
}

#[test]
fn test_load_definition_replays_handlers() {
    let mut wizard = wizard();
    let added = wizard
        .load(&FieldItems::Definitions(vec![weight_definition()]))
        .unwrap();
    assert_eq!(added, vec![0]);

    let view = wizard.view(0).unwrap();
    assert_eq!(view.field_type, FieldType::Continuous);
    assert_eq!(view.data_type, Some(DataType::Float));
    assert_eq!(view.default_option, DefaultOption::ContinuousDefault);

    let rules = wizard
        .rules()
        .rules_for(ElementKey::new(0, Attribute::MinimumValue))
        .unwrap();
    assert!(rules.contains(&Rule::Number), "type rules follow the loaded data type");

    let panel = wizard.form().field(0).unwrap();
    assert!(panel.control(Attribute::ContinuousDefault).unwrap().enabled);
    let select = panel.control(Attribute::AllowedMissingDefaultSelect).unwrap();
    assert!(select.choice_enabled("not provided"));
    assert!(!select.choice_enabled("restricted access"));

    // Collecting gives the loaded values back, lists in option order
    let collected = panel.collect();
    assert_eq!(collected.get(Attribute::Units), Some(&FieldValue::from("kg")));
    assert_eq!(
        collected.get(Attribute::AllowedMissingVals),
        Some(&FieldValue::List(vec![
            "not collected".to_string(),
            "not provided".to_string()
        ]))
    );
    assert_eq!(collected.get(Attribute::ContinuousDefault), Some(&FieldValue::from("70.5")));
    let report = wizard.validate();
    assert!(report.error_for(ElementKey::new(0, Attribute::MinimumValue)).is_none());
    assert!(report.error_for(ElementKey::new(0, Attribute::MinimumComparison)).is_none());
    println!("✓ Definitions loaded through the change handlers");
}

#[test]
fn test_load_ignores_unknown_keys_and_options() {
    let mut wizard = wizard();
    let mut definition = FieldDefinition::named("colour")
        .with(Attribute::FieldType, "categorical")
        .with(Attribute::DataType, "str")
        .with(Attribute::CategoricalValues, "red\ngreen")
        .with(Attribute::CategoricalDefaultSelect, "blue");
    definition
        .values
        .insert("favourite_snack".to_string(), FieldValue::from("crisps"));

    wizard.load(&FieldItems::Definitions(vec![definition])).unwrap();
    let panel = wizard.form().field(0).unwrap();
    assert_eq!(panel.value(Attribute::DataType), "str");
    assert_eq!(
        panel.value(Attribute::CategoricalDefaultSelect),
        "",
        "a value that is not an option is ignored"
    );
    println!("✓ Unknown keys and options ignored");
}

#[test]
fn test_load_rejects_list_for_scalar_input() {
    let mut wizard = wizard();
    let definition = FieldDefinition::named("weight")
        .with(Attribute::Units, vec!["kg".to_string(), "g".to_string()]);
    let later = FieldDefinition::named("height").with(Attribute::Units, "cm");
    assert!(wizard.load(&FieldItems::Definitions(vec![definition, later])).is_err());
    // The field itself was created before the bad value
    assert_eq!(wizard.form().field_name_options().len(), 1);
    assert!(wizard.registry().has_field("weight"));
    assert!(!wizard.registry().has_field("height"), "the rest of the batch is abandoned");
    assert_eq!(wizard.registry().next_index(), 1);
    println!("✓ Lists rejected for single-valued inputs");
}

#[test]
fn test_read_field_items() {
    let dir = tempdir().unwrap();
    let names_path = dir.path().join("names.json");
    fs::write(&names_path, r#"["weight", "height"]"#).unwrap();
    assert_eq!(
        read_field_items(&names_path).unwrap(),
        FieldItems::Names(vec!["weight".to_string(), "height".to_string()])
    );

    let definitions_path = dir.path().join("definitions.json");
    fs::write(
        &definitions_path,
        r#"[{"field_name": "age", "field_type": "continuous", "minimum_value": 0,
             "allowed_missing_vals": ["not provided"]}]"#,
    )
    .unwrap();
    match read_field_items(&definitions_path).unwrap() {
        FieldItems::Definitions(definitions) => {
            assert_eq!(definitions[0].field_name(), Some("age"));
            assert_eq!(
                definitions[0].get(Attribute::MinimumValue),
                Some(&FieldValue::from("0"))
            );
            assert_eq!(
                definitions[0].get(Attribute::AllowedMissingVals),
                Some(&FieldValue::List(vec!["not provided".to_string()]))
            );
        }
        other => panic!("expected definitions, got {:?}", other),
    }
    println!("✓ Field items read from JSON");
}
