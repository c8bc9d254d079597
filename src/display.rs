//! Conditional display engine.
//!
//! Each field's interdependent controls are driven by a small [`FieldView`]. User
//! events go through pure reducers producing a new view; the [`Presentation`]
//! derived from old and new view is diffed into [`DisplayChange`]s which the
//! form applies.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Result, WizardError};
use crate::field::{Attribute, ControlKind, DataType, DefaultOption, FieldType, Group};

/// Groups shown for each field type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayConfig {
    groups: BTreeMap<FieldType, BTreeSet<Group>>,
}

impl DisplayConfig {
    /// Fails unless every field type has an entry.
    pub fn new(groups: BTreeMap<FieldType, BTreeSet<Group>>) -> Result<Self> {
        let missing: Vec<&str> = FieldType::ALL
            .iter()
            .filter(|field_type| !groups.contains_key(field_type))
            .map(|field_type| field_type.as_str())
            .collect();
        if !missing.is_empty() {
            return Err(WizardError::config(format!(
                "display configuration has no entry for field type(s) {:?}",
                missing
            )));
        }
        if groups.values().any(|set| set.contains(&Group::Header)) {
            return Err(WizardError::config(
                "the header group is always shown and cannot be configured",
            ));
        }
        Ok(DisplayConfig { groups })
    }

    pub fn standard() -> Self {
        let mut groups = BTreeMap::new();
        groups.insert(FieldType::Unset, BTreeSet::new());
        groups.insert(
            FieldType::Text,
            BTreeSet::from([Group::FieldDetails, Group::TextDefault]),
        );
        groups.insert(
            FieldType::Boolean,
            BTreeSet::from([
                Group::FieldDetails,
                Group::BooleanTrue,
                Group::BooleanFalse,
                Group::BooleanDefault,
            ]),
        );
        groups.insert(
            FieldType::Continuous,
            BTreeSet::from([
                Group::FieldDetails,
                Group::DataType,
                Group::Minimum,
                Group::Maximum,
                Group::Units,
                Group::ContinuousDefault,
            ]),
        );
        groups.insert(
            FieldType::Categorical,
            BTreeSet::from([
                Group::FieldDetails,
                Group::DataType,
                Group::Categorical,
                Group::Units,
                Group::CategoricalDefault,
            ]),
        );
        DisplayConfig { groups }
    }

    pub fn groups_for(&self, field_type: FieldType) -> &BTreeSet<Group> {
        // `new` guarantees every field type is present
        &self.groups[&field_type]
    }

    pub fn mapping(&self) -> &BTreeMap<FieldType, BTreeSet<Group>> {
        &self.groups
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self::standard()
    }
}

/// The state of one field that its presentation depends on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldView {
    pub field_type: FieldType,
    pub data_type: Option<DataType>,
    pub default_option: DefaultOption,
    pub is_unitless: bool,
}

impl Default for FieldView {
    fn default() -> Self {
        FieldView {
            field_type: FieldType::Unset,
            data_type: None,
            default_option: DefaultOption::NoDefault,
            is_unitless: false,
        }
    }
}

/// Clears selections that are no longer offered.
fn settle(mut view: FieldView, config: &DisplayConfig) -> FieldView {
    if view.data_type == Some(DataType::Text) && view.field_type != FieldType::Categorical {
        view.data_type = None;
    }
    let visible = visible_groups(&view, config);
    if !visible.contains(&view.default_option.group()) {
        view.default_option = DefaultOption::NoDefault;
    }
    view
}

pub fn apply_field_type_change(view: &FieldView, new_type: FieldType, config: &DisplayConfig) -> FieldView {
    settle(
        FieldView {
            field_type: new_type,
            ..*view
        },
        config,
    )
}

pub fn apply_data_type_change(
    view: &FieldView,
    data_type: Option<DataType>,
    config: &DisplayConfig,
) -> FieldView {
    settle(FieldView { data_type, ..*view }, config)
}

pub fn apply_default_option_change(
    view: &FieldView,
    option: DefaultOption,
    config: &DisplayConfig,
) -> FieldView {
    settle(
        FieldView {
            default_option: option,
            ..*view
        },
        config,
    )
}

pub fn apply_unitless_change(view: &FieldView, is_unitless: bool, config: &DisplayConfig) -> FieldView {
    settle(FieldView { is_unitless, ..*view }, config)
}

fn visible_groups(view: &FieldView, config: &DisplayConfig) -> BTreeSet<Group> {
    let mut groups: BTreeSet<Group> = config.groups_for(view.field_type).clone();
    groups.insert(Group::Header);
    if view.data_type == Some(DataType::DateTime) {
        groups.remove(&Group::Units);
    }
    groups
}

/// Whether a control in a visible group is enabled given the view.
fn control_enabled(attribute: Attribute, view: &FieldView) -> bool {
    let is_datetime = view.data_type == Some(DataType::DateTime);
    match attribute {
        Attribute::AllowedMissingDefaultSelect => {
            view.default_option == DefaultOption::AllowedMissingDefault
        }
        Attribute::BooleanDefaultSelect => view.default_option == DefaultOption::BooleanDefault,
        Attribute::CategoricalDefaultSelect => {
            view.default_option == DefaultOption::CategoricalDefault
        }
        Attribute::ContinuousDefault => {
            view.default_option == DefaultOption::ContinuousDefault && !is_datetime
        }
        Attribute::DatetimeDefault => {
            view.default_option == DefaultOption::ContinuousDefault && is_datetime
        }
        Attribute::TextDefault => view.default_option == DefaultOption::TextDefault,
        Attribute::Units => !view.is_unitless,
        _ => true,
    }
}

/// Everything the form shows for one field, derived from its view.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Presentation {
    pub visible_groups: BTreeSet<Group>,
    pub enabled_controls: BTreeSet<Attribute>,
    pub enabled_default_options: BTreeSet<DefaultOption>,
    pub free_text_enabled: bool,
    pub data_type: Option<DataType>,
    pub default_option: DefaultOption,
}

impl Presentation {
    pub fn of(view: &FieldView, config: &DisplayConfig) -> Self {
        let visible_groups = visible_groups(view, config);
        let enabled_controls = Attribute::ALL
            .iter()
            .copied()
            .filter(|attribute| {
                attribute.control_kind() == ControlKind::Hidden
                    || (visible_groups.contains(&attribute.group())
                        && control_enabled(*attribute, view))
            })
            .collect();
        let enabled_default_options = DefaultOption::ALL
            .iter()
            .copied()
            .filter(|option| visible_groups.contains(&option.group()))
            .collect();
        Presentation {
            visible_groups,
            enabled_controls,
            enabled_default_options,
            free_text_enabled: view.field_type == FieldType::Categorical,
            data_type: view.data_type,
            default_option: view.default_option,
        }
    }

    /// The changes that turn `old` into `new`.
    pub fn diff(old: &Presentation, new: &Presentation) -> Vec<DisplayChange> {
        let mut changes = Vec::new();
        for group in Group::ALL {
            match (
                old.visible_groups.contains(&group),
                new.visible_groups.contains(&group),
            ) {
                (false, true) => changes.push(DisplayChange::ShowGroup(group)),
                (true, false) => changes.push(DisplayChange::HideGroup(group)),
                _ => {}
            }
        }
        for attribute in Attribute::ALL {
            match (
                old.enabled_controls.contains(&attribute),
                new.enabled_controls.contains(&attribute),
            ) {
                (false, true) => changes.push(DisplayChange::EnableControl(attribute)),
                (true, false) => changes.push(DisplayChange::DisableControl(attribute)),
                _ => {}
            }
        }
        for option in DefaultOption::ALL {
            match (
                old.enabled_default_options.contains(&option),
                new.enabled_default_options.contains(&option),
            ) {
                (false, true) => changes.push(DisplayChange::EnableOption {
                    attribute: Attribute::DefaultValue,
                    value: option.as_str().to_string(),
                }),
                (true, false) => changes.push(DisplayChange::DisableOption {
                    attribute: Attribute::DefaultValue,
                    value: option.as_str().to_string(),
                }),
                _ => {}
            }
        }
        if old.free_text_enabled != new.free_text_enabled {
            let value = DataType::Text.as_str().to_string();
            changes.push(if new.free_text_enabled {
                DisplayChange::EnableOption {
                    attribute: Attribute::DataType,
                    value,
                }
            } else {
                DisplayChange::DisableOption {
                    attribute: Attribute::DataType,
                    value,
                }
            });
        }
        if old.data_type != new.data_type {
            changes.push(DisplayChange::SetValue {
                attribute: Attribute::DataType,
                value: new.data_type.map(|t| t.as_str()).unwrap_or_default().to_string(),
            });
        }
        if old.default_option != new.default_option {
            changes.push(DisplayChange::SetValue {
                attribute: Attribute::DefaultValue,
                value: new.default_option.as_str().to_string(),
            });
        }
        changes
    }

    /// The complete presentation as changes, for a field whose current
    /// presentation is unknown (a freshly appended one).
    pub fn as_changes(&self) -> Vec<DisplayChange> {
        let mut changes: Vec<DisplayChange> = Group::ALL
            .iter()
            .map(|group| {
                if self.visible_groups.contains(group) {
                    DisplayChange::ShowGroup(*group)
                } else {
                    DisplayChange::HideGroup(*group)
                }
            })
            .collect();
        changes.extend(Attribute::ALL.iter().map(|attribute| {
            if self.enabled_controls.contains(attribute) {
                DisplayChange::EnableControl(*attribute)
            } else {
                DisplayChange::DisableControl(*attribute)
            }
        }));
        changes.extend(DefaultOption::ALL.iter().map(|option| {
            let value = option.as_str().to_string();
            if self.enabled_default_options.contains(option) {
                DisplayChange::EnableOption {
                    attribute: Attribute::DefaultValue,
                    value,
                }
            } else {
                DisplayChange::DisableOption {
                    attribute: Attribute::DefaultValue,
                    value,
                }
            }
        }));
        let value = DataType::Text.as_str().to_string();
        changes.push(if self.free_text_enabled {
            DisplayChange::EnableOption {
                attribute: Attribute::DataType,
                value,
            }
        } else {
            DisplayChange::DisableOption {
                attribute: Attribute::DataType,
                value,
            }
        });
        changes.push(DisplayChange::SetValue {
            attribute: Attribute::DataType,
            value: self.data_type.map(|t| t.as_str()).unwrap_or_default().to_string(),
        });
        changes.push(DisplayChange::SetValue {
            attribute: Attribute::DefaultValue,
            value: self.default_option.as_str().to_string(),
        });
        changes
    }
}

/// One presentational mutation of a single field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "change", content = "of")]
pub enum DisplayChange {
    ShowGroup(Group),
    HideGroup(Group),
    EnableControl(Attribute),
    DisableControl(Attribute),
    EnableOption { attribute: Attribute, value: String },
    DisableOption { attribute: Attribute, value: String },
    SetValue { attribute: Attribute, value: String },
}
