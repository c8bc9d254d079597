use metawiz::display::{
    DisplayChange, DisplayConfig, FieldView, Presentation, apply_data_type_change,
    apply_default_option_change, apply_field_type_change, apply_unitless_change,
};
use metawiz::field::{Attribute, DataType, DefaultOption, FieldType, Group};
use std::collections::{BTreeMap, BTreeSet};

fn continuous_view(config: &DisplayConfig) -> FieldView {
    apply_field_type_change(&FieldView::default(), FieldType::Continuous, config)
}

#[test]
fn test_unset_type_shows_header_only() {
    let config = DisplayConfig::standard();
    let presentation = Presentation::of(&FieldView::default(), &config);
    assert_eq!(presentation.visible_groups, BTreeSet::from([Group::Header]));
    assert!(presentation.enabled_controls.contains(&Attribute::FieldType));
    assert!(presentation.enabled_controls.contains(&Attribute::FieldName));
    assert!(!presentation.enabled_controls.contains(&Attribute::Units));
    println!("✓ Unset field shows only its header");
}

#[test]
fn test_field_type_selects_groups() {
    let config = DisplayConfig::standard();
    let view = continuous_view(&config);
    let presentation = Presentation::of(&view, &config);
    for group in [Group::FieldDetails, Group::DataType, Group::Minimum, Group::Units] {
        assert!(presentation.visible_groups.contains(&group), "{:?} should show", group);
    }
    assert!(!presentation.visible_groups.contains(&Group::BooleanTrue));
    assert!(!presentation.free_text_enabled, "free text is for categorical fields only");
    assert!(
        presentation
            .enabled_default_options
            .contains(&DefaultOption::ContinuousDefault)
    );
    assert!(
        !presentation
            .enabled_default_options
            .contains(&DefaultOption::CategoricalDefault)
    );

    let categorical = apply_field_type_change(&view, FieldType::Categorical, &config);
    assert!(Presentation::of(&categorical, &config).free_text_enabled);
    println!("✓ Field type drives group visibility");
}

#[test]
fn test_categorical_then_boolean() {
    let config = DisplayConfig::standard();
    let categorical = apply_field_type_change(&FieldView::default(), FieldType::Categorical, &config);
    let categorical = apply_data_type_change(&categorical, Some(DataType::Text), &config);
    let presentation = Presentation::of(&categorical, &config);
    assert_eq!(
        presentation.visible_groups,
        BTreeSet::from([
            Group::Header,
            Group::FieldDetails,
            Group::DataType,
            Group::Categorical,
            Group::Units,
            Group::CategoricalDefault,
        ])
    );

    let boolean = apply_field_type_change(&categorical, FieldType::Boolean, &config);
    let after = Presentation::of(&boolean, &config);
    assert_eq!(boolean.data_type, None, "a free-text data type is reset");
    let changes = Presentation::diff(&presentation, &after);
    assert!(changes.contains(&DisplayChange::DisableOption {
        attribute: Attribute::DataType,
        value: "str".to_string(),
    }));
    assert!(changes.contains(&DisplayChange::SetValue {
        attribute: Attribute::DataType,
        value: String::new(),
    }));
    println!("✓ Categorical groups shown, free text dropped for boolean");
}

#[test]
fn test_type_change_clears_stale_selections() {
    let config = DisplayConfig::standard();
    let categorical = apply_field_type_change(&FieldView::default(), FieldType::Categorical, &config);
    let categorical = apply_data_type_change(&categorical, Some(DataType::Text), &config);
    assert_eq!(categorical.data_type, Some(DataType::Text));

    // Free text is not offered for continuous fields
    let continuous = apply_field_type_change(&categorical, FieldType::Continuous, &config);
    assert_eq!(continuous.data_type, None);

    let with_default =
        apply_default_option_change(&continuous, DefaultOption::ContinuousDefault, &config);
    assert_eq!(with_default.default_option, DefaultOption::ContinuousDefault);
    let boolean = apply_field_type_change(&with_default, FieldType::Boolean, &config);
    assert_eq!(boolean.default_option, DefaultOption::NoDefault);

    // Options of always-visible groups survive a type change
    let missing = apply_default_option_change(&boolean, DefaultOption::AllowedMissingDefault, &config);
    let text = apply_field_type_change(&missing, FieldType::Text, &config);
    assert_eq!(text.default_option, DefaultOption::AllowedMissingDefault);
    println!("✓ Stale selections cleared");
}

#[test]
fn test_datetime_hides_units_and_swaps_default_input() {
    let config = DisplayConfig::standard();
    let view = continuous_view(&config);
    let view = apply_default_option_change(&view, DefaultOption::ContinuousDefault, &config);

    let numeric = Presentation::of(&view, &config);
    assert!(numeric.enabled_controls.contains(&Attribute::ContinuousDefault));
    assert!(!numeric.enabled_controls.contains(&Attribute::DatetimeDefault));

    let datetime = apply_data_type_change(&view, Some(DataType::DateTime), &config);
    let presentation = Presentation::of(&datetime, &config);
    assert!(!presentation.visible_groups.contains(&Group::Units));
    assert!(!presentation.enabled_controls.contains(&Attribute::ContinuousDefault));
    assert!(presentation.enabled_controls.contains(&Attribute::DatetimeDefault));
    println!("✓ Datetime fields use the datetime default input");
}

#[test]
fn test_unitless_disables_units() {
    let config = DisplayConfig::standard();
    let view = continuous_view(&config);
    assert!(Presentation::of(&view, &config).enabled_controls.contains(&Attribute::Units));

    let unitless = apply_unitless_change(&view, true, &config);
    let presentation = Presentation::of(&unitless, &config);
    assert!(!presentation.enabled_controls.contains(&Attribute::Units));
    assert!(presentation.enabled_controls.contains(&Attribute::IsUnitless));
    println!("✓ Unitless fields have no units");
}

#[test]
fn test_diff_lists_only_changes() {
    let config = DisplayConfig::standard();
    let before = Presentation::of(&FieldView::default(), &config);
    let after = Presentation::of(
        &apply_field_type_change(&FieldView::default(), FieldType::Boolean, &config),
        &config,
    );

    let changes = Presentation::diff(&before, &after);
    assert!(changes.contains(&DisplayChange::ShowGroup(Group::BooleanTrue)));
    assert!(changes.contains(&DisplayChange::EnableControl(Attribute::TrueValue)));
    assert!(!changes.contains(&DisplayChange::ShowGroup(Group::Header)));
    assert!(!changes.iter().any(|c| matches!(c, DisplayChange::HideGroup(_))));

    assert!(Presentation::diff(&after, &after).is_empty());
    println!("✓ Presentation diff is minimal");
}

#[test]
fn test_display_config_must_be_complete() {
    let mut groups = BTreeMap::new();
    groups.insert(FieldType::Text, BTreeSet::from([Group::FieldDetails]));
    assert!(DisplayConfig::new(groups).is_err(), "missing field types must be rejected");

    let mut groups = DisplayConfig::standard().mapping().clone();
    assert!(DisplayConfig::new(groups.clone()).is_ok());
    groups
        .get_mut(&FieldType::Text)
        .unwrap()
        .insert(Group::Header);
    assert!(DisplayConfig::new(groups).is_err(), "the header group cannot be configured");
    println!("✓ Display configuration checked");
}
