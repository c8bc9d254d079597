//! Headless form model: the instantiated fields, their controls, and the
//! form-level inputs (study name, field-name list, field selector).

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::display::DisplayChange;
use crate::error::{Result, WizardError};
use crate::field::{Attribute, ControlKind, FieldDefinition, FieldIndex, FieldValue, Group};
use crate::identifier::ElementKey;
use crate::template::{ChoiceOption, ElementKind, Fragment};

/// Name of the form-level study name input.
pub const STUDY_NAME: &str = "study_name";
/// Name of the form-level textarea listing new field names, one per line.
pub const FIELD_NAMES: &str = "field_names";
/// Value a single checkbox submits when checked.
pub const CHECKED_VALUE: &str = "true";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub value: String,
    pub label: String,
    pub enabled: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Control {
    pub key: ElementKey,
    pub kind: ControlKind,
    /// Concrete element name, e.g. `units_3`
    pub name: String,
    pub value: String,
    /// Checked values of checkboxes
    pub checked: BTreeSet<String>,
    pub choices: Vec<Choice>,
    pub enabled: bool,
}

impl Control {
    pub fn has_choice(&self, value: &str) -> bool {
        self.choices.iter().any(|choice| choice.value == value)
    }

    pub fn choice_enabled(&self, value: &str) -> bool {
        self.choices
            .iter()
            .any(|choice| choice.value == value && choice.enabled)
    }

    pub fn is_checked(&self, value: &str) -> bool {
        self.checked.contains(value)
    }

    /// Checked values in option order.
    pub fn checked_in_order(&self) -> Vec<String> {
        self.choices
            .iter()
            .filter(|choice| self.checked.contains(&choice.value))
            .map(|choice| choice.value.clone())
            .collect()
    }

    /// Replaces the options, keeping the selection if it is still offered.
    pub fn replace_choices(&mut self, choices: Vec<Choice>) {
        self.choices = choices;
        if !self.has_choice(&self.value) {
            self.value = self
                .choices
                .first()
                .map(|choice| choice.value.clone())
                .unwrap_or_default();
        }
    }

    fn set_choice_enabled(&mut self, value: &str, enabled: bool) {
        for choice in self.choices.iter_mut().filter(|c| c.value == value) {
            choice.enabled = enabled;
        }
    }
}

/// The controls and group visibility of one instantiated field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldPanel {
    pub index: FieldIndex,
    pub controls: BTreeMap<Attribute, Control>,
    pub visible_groups: BTreeSet<Group>,
    /// Whether this field's details are the ones on display
    pub shown: bool,
    fragment: Fragment,
}

impl FieldPanel {
    fn from_fragment(fragment: Fragment) -> Self {
        let index = fragment.field_index;
        let mut controls = BTreeMap::new();
        for element in &fragment.elements {
            let attribute = match element.kind {
                ElementKind::Control(attribute) => attribute,
                _ => continue,
            };
            let kind = attribute.control_kind();
            let enabled = kind == ControlKind::Hidden || !attribute.group().is_conditional();
            let choices = element
                .options
                .iter()
                .map(|option| Choice {
                    value: option.value.clone(),
                    label: option.label.clone(),
                    enabled: option.group.map_or(true, |group| !group.is_conditional()),
                })
                .collect();
            controls.insert(
                attribute,
                Control {
                    key: ElementKey::new(index, attribute),
                    kind,
                    name: element.name.clone().unwrap_or_else(|| element.id.clone()),
                    value: element.value.clone(),
                    checked: BTreeSet::new(),
                    choices,
                    enabled,
                },
            );
        }
        FieldPanel {
            index,
            controls,
            visible_groups: BTreeSet::from([Group::Header]),
            shown: false,
            fragment,
        }
    }

    pub fn control(&self, attribute: Attribute) -> Result<&Control> {
        self.controls
            .get(&attribute)
            .ok_or_else(|| WizardError::UnknownAttribute(attribute.name().to_string()))
    }

    pub fn control_mut(&mut self, attribute: Attribute) -> Result<&mut Control> {
        self.controls
            .get_mut(&attribute)
            .ok_or_else(|| WizardError::UnknownAttribute(attribute.name().to_string()))
    }

    pub fn value(&self, attribute: Attribute) -> &str {
        self.controls
            .get(&attribute)
            .map(|control| control.value.as_str())
            .unwrap_or_default()
    }

    pub fn is_checked(&self, attribute: Attribute) -> bool {
        self.controls
            .get(&attribute)
            .is_some_and(|control| control.is_checked(CHECKED_VALUE))
    }

    pub fn field_name(&self) -> &str {
        self.value(Attribute::FieldName)
    }

    /// Assigns `value` the way the control kind dictates. Values that are not
    /// among a choice control's options, or whose option is disabled, are
    /// ignored.
    pub fn set_form_value(&mut self, attribute: Attribute, value: &str) -> Result<()> {
        let control = self.control_mut(attribute)?;
        match control.kind {
            ControlKind::Checkbox => {
                if value.eq_ignore_ascii_case(CHECKED_VALUE) {
                    control.checked.insert(CHECKED_VALUE.to_string());
                } else {
                    control.checked.remove(CHECKED_VALUE);
                }
            }
            ControlKind::CheckboxGroup => {
                if control.has_choice(value) {
                    control.checked.insert(value.to_string());
                } else {
                    warn!("'{}' is not an option of {}", value, control.name);
                }
            }
            ControlKind::Radio | ControlKind::Select => {
                if control.choice_enabled(value) {
                    control.value = value.to_string();
                } else if control.has_choice(value) {
                    warn!("'{}' is not an enabled option of {}", value, control.name);
                } else {
                    warn!("'{}' is not an option of {}", value, control.name);
                }
            }
            ControlKind::Text | ControlKind::Textarea | ControlKind::Hidden => {
                control.value = value.to_string();
            }
            ControlKind::Button => {
                return Err(WizardError::UnsupportedInput {
                    identifier: control.name.clone(),
                    kind: control.kind.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn set_checked(&mut self, attribute: Attribute, value: &str, checked: bool) -> Result<()> {
        let control = self.control_mut(attribute)?;
        match control.kind {
            ControlKind::Checkbox | ControlKind::CheckboxGroup => {
                if checked {
                    if control.has_choice(value) {
                        control.checked.insert(value.to_string());
                    } else {
                        warn!("'{}' is not an option of {}", value, control.name);
                    }
                } else {
                    control.checked.remove(value);
                }
                Ok(())
            }
            kind => Err(WizardError::UnsupportedInput {
                identifier: control.name.clone(),
                kind: kind.to_string(),
            }),
        }
    }

    pub fn apply(&mut self, changes: &[DisplayChange]) -> Result<()> {
        for change in changes {
            match change {
                DisplayChange::ShowGroup(group) => {
                    self.visible_groups.insert(*group);
                }
                DisplayChange::HideGroup(group) => {
                    self.visible_groups.remove(group);
                }
                DisplayChange::EnableControl(attribute) => {
                    self.control_mut(*attribute)?.enabled = true;
                }
                DisplayChange::DisableControl(attribute) => {
                    self.control_mut(*attribute)?.enabled = false;
                }
                DisplayChange::EnableOption { attribute, value } => {
                    self.control_mut(*attribute)?.set_choice_enabled(value, true);
                }
                DisplayChange::DisableOption { attribute, value } => {
                    self.control_mut(*attribute)?.set_choice_enabled(value, false);
                }
                DisplayChange::SetValue { attribute, value } => {
                    self.control_mut(*attribute)?.value = value.clone();
                }
            }
        }
        Ok(())
    }

    /// Enabled, non-blank values keyed by attribute name.
    pub fn collect(&self) -> FieldDefinition {
        let mut definition = FieldDefinition::new();
        for (attribute, control) in &self.controls {
            if !control.enabled {
                continue;
            }
            match control.kind {
                ControlKind::Button => {}
                ControlKind::CheckboxGroup => {
                    let checked = control.checked_in_order();
                    if !checked.is_empty() {
                        definition.set(*attribute, FieldValue::List(checked));
                    }
                }
                ControlKind::Checkbox => {
                    if control.is_checked(CHECKED_VALUE) {
                        definition.set(*attribute, CHECKED_VALUE);
                    }
                }
                _ => {
                    if !control.value.trim().is_empty() {
                        definition.set(*attribute, control.value.trim());
                    }
                }
            }
        }
        definition
    }

    /// Current state rendered through the template markup.
    pub fn to_markup(&self) -> String {
        let mut fragment = self.fragment.clone();
        for element in &mut fragment.elements {
            match element.kind {
                ElementKind::Container(group) => {
                    element.classes.retain(|class| class != "hidden");
                    if !self.visible_groups.contains(&group) {
                        element.classes.push("hidden".to_string());
                    }
                }
                ElementKind::Control(attribute) => {
                    if let Some(control) = self.controls.get(&attribute) {
                        element.value = control.value.clone();
                        element.checked = control.checked_in_order();
                        element.disabled = !control.enabled;
                        if control.kind == ControlKind::Select {
                            element.options = control
                                .choices
                                .iter()
                                .map(|choice| ChoiceOption {
                                    disabled: !choice.enabled,
                                    ..ChoiceOption::new(&choice.value, &choice.label)
                                })
                                .collect();
                        } else {
                            for option in &mut element.options {
                                option.disabled = !control.choice_enabled(&option.value);
                            }
                        }
                    }
                }
                ElementKind::Field => {
                    element.classes.retain(|class| class != "hidden");
                    if !self.shown {
                        element.classes.push("hidden".to_string());
                    }
                }
            }
        }
        fragment.to_markup()
    }
}

/// One option of the field-name selector.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldNameOption {
    pub index: FieldIndex,
    pub name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Form {
    pub study_name: String,
    pub field_names: String,
    fields: BTreeMap<FieldIndex, FieldPanel>,
    field_name_options: Vec<FieldNameOption>,
    selected_field: Option<FieldIndex>,
    existing_fields_visible: bool,
}

impl Form {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_field(&mut self, fragment: Fragment) -> Result<&mut FieldPanel> {
        let index = fragment.field_index;
        if fragment.has_template_ids() {
            return Err(WizardError::config(format!(
                "fragment for field {} still carries template ids",
                index
            )));
        }
        debug!("appending field {}", index);
        Ok(self
            .fields
            .entry(index)
            .or_insert_with(|| FieldPanel::from_fragment(fragment)))
    }

    pub fn remove_field(&mut self, index: FieldIndex) -> Option<FieldPanel> {
        let removed = self.fields.remove(&index);
        self.field_name_options.retain(|option| option.index != index);
        if self.selected_field == Some(index) {
            self.selected_field = None;
        }
        if self.fields.is_empty() {
            self.existing_fields_visible = false;
        }
        removed
    }

    pub fn field(&self, index: FieldIndex) -> Result<&FieldPanel> {
        self.fields.get(&index).ok_or(WizardError::UnknownField(index))
    }

    pub fn field_mut(&mut self, index: FieldIndex) -> Result<&mut FieldPanel> {
        self.fields
            .get_mut(&index)
            .ok_or(WizardError::UnknownField(index))
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldPanel> {
        self.fields.values()
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn control(&self, key: ElementKey) -> Result<&Control> {
        self.field(key.index)?.control(key.attribute)
    }

    /// Index of the field whose `field_name` input holds `name`.
    pub fn index_of_name(&self, name: &str) -> Option<FieldIndex> {
        self.fields
            .values()
            .find(|panel| panel.field_name() == name)
            .map(|panel| panel.index)
    }

    /// Adds selector options after the existing ones.
    pub fn append_field_name_options<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (FieldIndex, String)>,
    {
        for (index, name) in entries {
            self.field_name_options.push(FieldNameOption { index, name });
        }
    }

    pub fn field_name_options(&self) -> &[FieldNameOption] {
        &self.field_name_options
    }

    pub fn show_existing_fields(&mut self) {
        self.existing_fields_visible = true;
    }

    pub fn existing_fields_visible(&self) -> bool {
        self.existing_fields_visible
    }

    /// Shows only the details of `index`.
    pub fn select_field(&mut self, index: FieldIndex) -> Result<()> {
        if !self.fields.contains_key(&index) {
            return Err(WizardError::UnknownField(index));
        }
        for panel in self.fields.values_mut() {
            panel.shown = panel.index == index;
        }
        self.selected_field = Some(index);
        Ok(())
    }

    pub fn selected_field(&self) -> Option<FieldIndex> {
        self.selected_field
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
