//! The hidden field template and its instantiation for a concrete field index.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

use crate::field::{
    Attribute, Comparison, ControlKind, DataType, DefaultOption, FieldIndex, FieldType, Group,
    MISSING_VALUES,
};
use crate::identifier::{
    identifier_from_template, is_template_identifier, template_identifier, TEMPLATE_SUFFIX,
};

/// Label of the empty first option of selects.
pub const PLACEHOLDER_LABEL: &str = "--Select One--";

/// Base id of the wrapper around one field's groups.
pub const FIELD_CONTAINER: &str = "field";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub value: String,
    pub label: String,
    /// Group the option is rendered in when it differs from its control's
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<Group>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub disabled: bool,
}

impl ChoiceOption {
    pub fn new(value: &str, label: &str) -> Self {
        ChoiceOption {
            value: value.to_string(),
            label: label.to_string(),
            group: None,
            disabled: false,
        }
    }

    pub fn placeholder() -> Self {
        Self::new("", PLACEHOLDER_LABEL)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "of")]
pub enum ElementKind {
    /// The wrapper around all groups of a field
    Field,
    Container(Group),
    Control(Attribute),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateElement {
    pub id: String,
    pub name: Option<String>,
    pub kind: ElementKind,
    pub classes: Vec<String>,
    pub options: Vec<ChoiceOption>,
    pub value: String,
    /// Checked values of checkboxes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub checked: Vec<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub disabled: bool,
}

impl TemplateElement {
    fn container(group: Group) -> Self {
        let mut classes = vec!["field-group".to_string()];
        if group.is_conditional() {
            classes.push("hidden".to_string());
        }
        TemplateElement {
            id: template_identifier(&group.container_name()),
            name: None,
            kind: ElementKind::Container(group),
            classes,
            options: Vec::new(),
            value: String::new(),
            checked: Vec::new(),
            disabled: false,
        }
    }

    fn control(attribute: Attribute) -> Self {
        let template_name = template_identifier(attribute.name());
        let mut classes = vec![attribute.control_kind().as_str().to_string()];
        if attribute.group().is_conditional() {
            classes.push("conditional".to_string());
        }
        TemplateElement {
            id: template_name.clone(),
            name: Some(template_name),
            kind: ElementKind::Control(attribute),
            classes,
            options: initial_options(attribute),
            value: initial_value(attribute).to_string(),
            checked: Vec::new(),
            disabled: false,
        }
    }

    pub fn attribute(&self) -> Option<Attribute> {
        match self.kind {
            ElementKind::Control(attribute) => Some(attribute),
            _ => None,
        }
    }
}

fn initial_options(attribute: Attribute) -> Vec<ChoiceOption> {
    match attribute {
        Attribute::FieldType => FieldType::ALL
            .iter()
            .map(|t| ChoiceOption::new(t.as_str(), t.label()))
            .collect(),
        Attribute::DataType => std::iter::once(ChoiceOption::placeholder())
            .chain(
                DataType::ALL
                    .iter()
                    .map(|t| ChoiceOption::new(t.as_str(), t.label())),
            )
            .collect(),
        Attribute::MinimumComparison | Attribute::MaximumComparison => Comparison::ALL
            .iter()
            .map(|c| ChoiceOption::new(c.as_str(), c.label()))
            .collect(),
        Attribute::AllowedMissingVals => MISSING_VALUES
            .iter()
            .map(|v| ChoiceOption::new(v, v))
            .collect(),
        Attribute::AllowedMissingDefaultSelect => std::iter::once(ChoiceOption::placeholder())
            .chain(MISSING_VALUES.iter().map(|v| ChoiceOption::new(v, v)))
            .collect(),
        Attribute::BooleanDefaultSelect | Attribute::CategoricalDefaultSelect => {
            vec![ChoiceOption::placeholder()]
        }
        Attribute::DefaultValue => DefaultOption::ALL
            .iter()
            .map(|option| ChoiceOption {
                value: option.as_str().to_string(),
                label: option.label().to_string(),
                group: Some(option.group()),
                disabled: false,
            })
            .collect(),
        Attribute::IsPhi | Attribute::IsUnitless => vec![ChoiceOption::new("true", "")],
        _ => Vec::new(),
    }
}

fn initial_value(attribute: Attribute) -> &'static str {
    match attribute {
        Attribute::MinimumComparison | Attribute::MaximumComparison => {
            Comparison::NoComparison.as_str()
        }
        Attribute::DefaultValue => DefaultOption::NoDefault.as_str(),
        _ => "",
    }
}

/// The single hidden template fragment every field is cloned from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldTemplate {
    elements: Vec<TemplateElement>,
}

impl FieldTemplate {
    /// Field wrapper, then each group container followed by its controls.
    /// Controls keep the canonical attribute order across groups.
    pub fn standard() -> Self {
        let mut elements = vec![TemplateElement {
            id: template_identifier(FIELD_CONTAINER),
            name: None,
            kind: ElementKind::Field,
            classes: vec!["field-panel".to_string()],
            options: Vec::new(),
            value: String::new(),
            checked: Vec::new(),
            disabled: false,
        }];
        elements.extend(Group::ALL.iter().map(|group| TemplateElement::container(*group)));
        elements.extend(Attribute::ALL.iter().map(|a| TemplateElement::control(*a)));
        FieldTemplate { elements }
    }

    pub fn elements(&self) -> &[TemplateElement] {
        &self.elements
    }

    pub fn element_for(&self, attribute: Attribute) -> Option<&TemplateElement> {
        self.elements
            .iter()
            .find(|element| element.attribute() == Some(attribute))
    }

    /// Attributes of every named control, in declaration order.
    pub fn input_names_in_order(&self) -> Vec<Attribute> {
        self.elements
            .iter()
            .filter(|element| element.name.is_some())
            .filter_map(TemplateElement::attribute)
            .collect()
    }

    /// Clones the fragment and rewrites every template id (and name, where one
    /// exists) for `field_index`. Nothing is attached anywhere.
    pub fn instantiate(&self, field_index: FieldIndex, initial_field_name: Option<&str>) -> Fragment {
        let elements = self
            .elements
            .iter()
            .map(|element| {
                let mut element = element.clone();
                if is_template_identifier(&element.id) {
                    element.id = identifier_from_template(&element.id, field_index);
                    element.name = element
                        .name
                        .as_deref()
                        .map(|name| identifier_from_template(name, field_index));
                }
                if let (Some(name), Some(Attribute::FieldName)) =
                    (initial_field_name, element.attribute())
                {
                    element.value = name.to_string();
                }
                element
            })
            .collect();
        Fragment {
            field_index,
            elements,
        }
    }
}

impl Default for FieldTemplate {
    fn default() -> Self {
        Self::standard()
    }
}

/// One instantiated field, detached from any form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    pub field_index: FieldIndex,
    pub elements: Vec<TemplateElement>,
}

impl Fragment {
    pub fn element(&self, attribute: Attribute) -> Option<&TemplateElement> {
        self.elements
            .iter()
            .find(|element| element.attribute() == Some(attribute))
    }

    /// True while any id still carries the template suffix.
    pub fn has_template_ids(&self) -> bool {
        self.elements
            .iter()
            .any(|element| element.id.contains(TEMPLATE_SUFFIX))
    }

    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        let wrapper = self
            .elements
            .iter()
            .find(|element| element.kind == ElementKind::Field);
        if let Some(wrapper) = wrapper {
            let _ = writeln!(
                out,
                "<div id=\"{}\" class=\"{}\">",
                wrapper.id,
                wrapper.classes.join(" ")
            );
        }
        for container in &self.elements {
            let group = match container.kind {
                ElementKind::Container(group) => group,
                _ => continue,
            };
            let _ = writeln!(
                out,
                "  <div id=\"{}\" class=\"{}\">",
                container.id,
                container.classes.join(" ")
            );
            for element in &self.elements {
                if let Some(attribute) = element.attribute() {
                    if attribute.group() == group {
                        write_control(&mut out, element, attribute);
                    }
                }
            }
            // radio options rendered in another group than their control
            if let Some(radio) = self.element(Attribute::DefaultValue) {
                if group != Attribute::DefaultValue.group() {
                    for option in radio.options.iter().filter(|o| o.group == Some(group)) {
                        write_radio_option(&mut out, radio, option);
                    }
                }
            }
            out.push_str("  </div>\n");
        }
        if wrapper.is_some() {
            out.push_str("</div>\n");
        }
        out
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn flag(set: bool, attribute: &'static str) -> &'static str {
    if set { attribute } else { "" }
}

fn write_radio_option(out: &mut String, radio: &TemplateElement, option: &ChoiceOption) {
    let _ = writeln!(
        out,
        "    <label><input type=\"radio\" id=\"{}_{}\" name=\"{}\" value=\"{}\"{}{}> {}</label>",
        radio.id,
        option.value,
        radio.name.as_deref().unwrap_or_default(),
        escape(&option.value),
        flag(option.value == radio.value, " checked"),
        flag(radio.disabled || option.disabled, " disabled"),
        escape(&option.label)
    );
}

fn write_control(out: &mut String, element: &TemplateElement, attribute: Attribute) {
    let name = element.name.as_deref().unwrap_or_default();
    let disabled = flag(element.disabled, " disabled");
    out.push_str("    ");
    if !matches!(attribute.control_kind(), ControlKind::Hidden | ControlKind::Button) {
        let _ = write!(out, "<label for=\"{}\">{}</label> ", element.id, attribute.label());
    }
    match attribute.control_kind() {
        ControlKind::Text | ControlKind::Hidden => {
            let _ = writeln!(
                out,
                "<input type=\"{}\" id=\"{}\" name=\"{}\" value=\"{}\"{}>",
                attribute.control_kind(),
                element.id,
                name,
                escape(&element.value),
                disabled
            );
        }
        ControlKind::Textarea => {
            let _ = writeln!(
                out,
                "<textarea id=\"{}\" name=\"{}\"{}>{}</textarea>",
                element.id,
                name,
                disabled,
                escape(&element.value)
            );
        }
        ControlKind::Select => {
            let _ = write!(
                out,
                "<select id=\"{}\" name=\"{}\"{}>",
                element.id, name, disabled
            );
            for option in &element.options {
                let _ = write!(
                    out,
                    "<option value=\"{}\"{}{}>{}</option>",
                    escape(&option.value),
                    flag(option.value == element.value, " selected"),
                    flag(option.disabled, " disabled"),
                    escape(&option.label)
                );
            }
            out.push_str("</select>\n");
        }
        ControlKind::Checkbox => {
            let _ = writeln!(
                out,
                "<input type=\"checkbox\" id=\"{}\" name=\"{}\" value=\"true\"{}{}>",
                element.id,
                name,
                flag(element.checked.iter().any(|v| v == "true"), " checked"),
                disabled
            );
        }
        ControlKind::CheckboxGroup => {
            out.push('\n');
            for option in &element.options {
                let _ = writeln!(
                    out,
                    "    <label><input type=\"checkbox\" name=\"{}\" value=\"{}\"{}{}> {}</label>",
                    name,
                    escape(&option.value),
                    flag(element.checked.contains(&option.value), " checked"),
                    flag(element.disabled || option.disabled, " disabled"),
                    escape(&option.label)
                );
            }
        }
        ControlKind::Radio => {
            out.push('\n');
            let own_group = attribute.group();
            for option in element
                .options
                .iter()
                .filter(|o| o.group.is_none() || o.group == Some(own_group))
            {
                write_radio_option(out, element, option);
            }
        }
        ControlKind::Button => {
            let _ = writeln!(
                out,
                "<button type=\"button\" id=\"{}\" name=\"{}\">{}</button>",
                element.id,
                name,
                attribute.label()
            );
        }
    }
}
