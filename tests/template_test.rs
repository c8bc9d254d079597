use metawiz::error::WizardError;
use metawiz::field::{Attribute, Group};
use metawiz::form::Form;
use metawiz::template::{ElementKind, FieldTemplate};

#[test]
fn test_instantiate_rewrites_every_identifier() {
    let template = FieldTemplate::standard();
    let fragment = template.instantiate(7, Some("age"));

    assert!(!fragment.has_template_ids(), "no template id may survive instantiation");
    assert_eq!(fragment.field_index, 7);

    let units = fragment.element(Attribute::Units).expect("units control");
    assert_eq!(units.id, "units_7");
    assert_eq!(units.name.as_deref(), Some("units_7"));

    let missing = fragment.element(Attribute::AllowedMissingVals).unwrap();
    assert_eq!(missing.name.as_deref(), Some("allowed_missing_vals_7[]"));

    let field_name = fragment.element(Attribute::FieldName).unwrap();
    assert_eq!(field_name.value, "age");

    let container = fragment
        .elements
        .iter()
        .find(|e| e.kind == ElementKind::Container(Group::Units))
        .unwrap();
    assert_eq!(container.id, "units_div_7");

    // The template itself is untouched
    assert_eq!(template.element_for(Attribute::Units).unwrap().id, "units_template");
    println!("✓ Instantiated fragment carries index 7 everywhere");
}

#[test]
fn test_input_order_follows_declaration() {
    let template = FieldTemplate::standard();
    assert_eq!(template.input_names_in_order(), Attribute::ALL.to_vec());
    println!("✓ Inputs in declaration order");
}

#[test]
fn test_markup_hides_conditional_groups() {
    let fragment = FieldTemplate::standard().instantiate(0, Some("weight"));
    let markup = fragment.to_markup();
    assert!(markup.contains("id=\"field_0\""));
    assert!(markup.contains("id=\"header_div_0\" class=\"field-group\""));
    assert!(markup.contains("id=\"units_div_0\" class=\"field-group hidden\""));
    assert!(markup.contains("name=\"field_name_0\" value=\"weight\""));
    assert!(!markup.contains("_template"));
    println!("✓ Markup rendered");
}

#[test]
fn test_form_rejects_template_fragment() {
    let mut form = Form::new();
    let template = FieldTemplate::standard();
    let raw = metawiz::template::Fragment {
        field_index: 0,
        elements: template.elements().to_vec(),
    };
    assert!(matches!(form.append_field(raw), Err(WizardError::Config(_))));

    form.append_field(template.instantiate(0, Some("weight"))).unwrap();
    assert_eq!(form.field_count(), 1);
    assert_eq!(form.index_of_name("weight"), Some(0));
    println!("✓ Only instantiated fragments are appended");
}
