//! Closed vocabularies of the field wizard and the `FieldDefinition` record.
//!
//! Every per-field input is an [`Attribute`]; the order of [`Attribute::ALL`] is
//! the order in which the inputs are declared in the field template, which is
//! also the order the bulk loader applies values in.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Index of one repeatable field record. Assigned once, never reused.
pub type FieldIndex = usize;

/// Values offered by the allowed-missing checkboxes and the missing-value default select.
pub const MISSING_VALUES: [&str; 4] = [
    "not applicable",
    "not collected",
    "not provided",
    "restricted access",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FieldType {
    #[serde(rename = "")]
    Unset,
    #[serde(rename = "str")]
    Text,
    #[serde(rename = "boolean")]
    Boolean,
    #[serde(rename = "continuous")]
    Continuous,
    #[serde(rename = "categorical")]
    Categorical,
}

impl FieldType {
    pub const ALL: [FieldType; 5] = [
        FieldType::Unset,
        FieldType::Text,
        FieldType::Boolean,
        FieldType::Continuous,
        FieldType::Categorical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Unset => "",
            FieldType::Text => "str",
            FieldType::Boolean => "boolean",
            FieldType::Continuous => "continuous",
            FieldType::Categorical => "categorical",
        }
    }

    pub fn from_value(value: &str) -> Option<Self> {
        FieldType::ALL
            .iter()
            .copied()
            .find(|field_type| field_type.as_str() == value)
    }

    pub fn label(&self) -> &'static str {
        match self {
            FieldType::Unset => "--Select One--",
            FieldType::Text => "Free Text",
            FieldType::Boolean => "Boolean (True/False)",
            FieldType::Continuous => "Continuous (Numbers, dates, etc.)",
            FieldType::Categorical => "Categorical (Group A, B, C, etc.)",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// The free-text option, only valid for categorical fields
    #[serde(rename = "str")]
    Text,
    #[serde(rename = "integer")]
    Integer,
    #[serde(rename = "float")]
    Float,
    #[serde(rename = "datetime")]
    DateTime,
}

impl DataType {
    pub const ALL: [DataType; 4] = [
        DataType::Text,
        DataType::Integer,
        DataType::Float,
        DataType::DateTime,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Text => "str",
            DataType::Integer => "integer",
            DataType::Float => "float",
            DataType::DateTime => "datetime",
        }
    }

    pub fn from_value(value: &str) -> Option<Self> {
        DataType::ALL
            .iter()
            .copied()
            .find(|data_type| data_type.as_str() == value)
    }

    pub fn label(&self) -> &'static str {
        match self {
            DataType::Text => "Text",
            DataType::Integer => "Integer",
            DataType::Float => "Decimal",
            DataType::DateTime => "Date/time",
        }
    }
}

/// The radio choices of `default_value`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultOption {
    NoDefault,
    AllowedMissingDefault,
    BooleanDefault,
    CategoricalDefault,
    ContinuousDefault,
    TextDefault,
}

impl DefaultOption {
    pub const ALL: [DefaultOption; 6] = [
        DefaultOption::NoDefault,
        DefaultOption::AllowedMissingDefault,
        DefaultOption::BooleanDefault,
        DefaultOption::CategoricalDefault,
        DefaultOption::ContinuousDefault,
        DefaultOption::TextDefault,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DefaultOption::NoDefault => "no_default",
            DefaultOption::AllowedMissingDefault => "allowed_missing_default",
            DefaultOption::BooleanDefault => "boolean_default",
            DefaultOption::CategoricalDefault => "categorical_default",
            DefaultOption::ContinuousDefault => "continuous_default",
            DefaultOption::TextDefault => "text_default",
        }
    }

    pub fn from_value(value: &str) -> Option<Self> {
        DefaultOption::ALL
            .iter()
            .copied()
            .find(|option| option.as_str() == value)
    }

    /// Group the radio button for this option is rendered in.
    pub fn group(&self) -> Group {
        match self {
            DefaultOption::NoDefault | DefaultOption::AllowedMissingDefault => Group::FieldDetails,
            DefaultOption::BooleanDefault => Group::BooleanDefault,
            DefaultOption::CategoricalDefault => Group::CategoricalDefault,
            DefaultOption::ContinuousDefault => Group::ContinuousDefault,
            DefaultOption::TextDefault => Group::TextDefault,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DefaultOption::NoDefault => "No default",
            DefaultOption::AllowedMissingDefault => "Missing value",
            DefaultOption::BooleanDefault => "Boolean value",
            DefaultOption::CategoricalDefault => "Category",
            DefaultOption::ContinuousDefault => "Value",
            DefaultOption::TextDefault => "Text",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    NoComparison,
    GreaterThan,
    GreaterThanOrEqualTo,
    LessThan,
    LessThanOrEqualTo,
}

impl Comparison {
    pub const ALL: [Comparison; 5] = [
        Comparison::NoComparison,
        Comparison::GreaterThan,
        Comparison::GreaterThanOrEqualTo,
        Comparison::LessThan,
        Comparison::LessThanOrEqualTo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Comparison::NoComparison => "no_comparison",
            Comparison::GreaterThan => "greater_than",
            Comparison::GreaterThanOrEqualTo => "greater_than_or_equal_to",
            Comparison::LessThan => "less_than",
            Comparison::LessThanOrEqualTo => "less_than_or_equal_to",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Comparison::NoComparison => "None",
            Comparison::GreaterThan => ">",
            Comparison::GreaterThanOrEqualTo => ">=",
            Comparison::LessThan => "<",
            Comparison::LessThanOrEqualTo => "<=",
        }
    }
}

/// UI groups of a field. Every group except `Header` starts hidden and is shown
/// or hidden by the conditional display engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Group {
    Header,
    FieldDetails,
    DataType,
    BooleanTrue,
    BooleanFalse,
    BooleanDefault,
    Categorical,
    CategoricalDefault,
    Minimum,
    Maximum,
    Units,
    ContinuousDefault,
    TextDefault,
}

impl Group {
    pub const ALL: [Group; 13] = [
        Group::Header,
        Group::FieldDetails,
        Group::DataType,
        Group::BooleanTrue,
        Group::BooleanFalse,
        Group::BooleanDefault,
        Group::Categorical,
        Group::CategoricalDefault,
        Group::Minimum,
        Group::Maximum,
        Group::Units,
        Group::ContinuousDefault,
        Group::TextDefault,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            Group::Header => "header",
            Group::FieldDetails => "field_details",
            Group::DataType => "data_type",
            Group::BooleanTrue => "boolean_true",
            Group::BooleanFalse => "boolean_false",
            Group::BooleanDefault => "boolean_default",
            Group::Categorical => "categorical",
            Group::CategoricalDefault => "categorical_default",
            Group::Minimum => "minimum",
            Group::Maximum => "maximum",
            Group::Units => "units",
            Group::ContinuousDefault => "continuous_default",
            Group::TextDefault => "text_default",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Group::ALL.iter().copied().find(|group| group.tag() == tag)
    }

    /// Base identifier of the group's container element.
    pub fn container_name(&self) -> String {
        format!("{}_div", self.tag())
    }

    pub fn is_conditional(&self) -> bool {
        !matches!(self, Group::Header)
    }
}

/// Kind of input element backing an attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlKind {
    Text,
    Hidden,
    Textarea,
    Select,
    Radio,
    Checkbox,
    CheckboxGroup,
    Button,
}

impl ControlKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlKind::Text => "text",
            ControlKind::Hidden => "hidden",
            ControlKind::Textarea => "textarea",
            ControlKind::Select => "select",
            ControlKind::Radio => "radio",
            ControlKind::Checkbox => "checkbox",
            ControlKind::CheckboxGroup => "checkbox",
            ControlKind::Button => "button",
        }
    }
}

impl fmt::Display for ControlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One per-field input of the template.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    FieldName,
    FieldType,
    FieldDesc,
    IsPhi,
    AllowedMissingVals,
    DataType,
    TrueValue,
    FalseValue,
    CategoricalValues,
    MinimumComparison,
    MinimumValue,
    MaximumComparison,
    MaximumValue,
    IsUnitless,
    Units,
    DefaultValue,
    AllowedMissingDefaultSelect,
    CategoricalDefaultSelect,
    BooleanDefaultSelect,
    ContinuousDefault,
    DatetimeDefault,
    TextDefault,
    RemoveField,
}

impl Attribute {
    /// Template declaration order.
    pub const ALL: [Attribute; 23] = [
        Attribute::FieldName,
        Attribute::FieldType,
        Attribute::FieldDesc,
        Attribute::IsPhi,
        Attribute::AllowedMissingVals,
        Attribute::DataType,
        Attribute::TrueValue,
        Attribute::FalseValue,
        Attribute::CategoricalValues,
        Attribute::MinimumComparison,
        Attribute::MinimumValue,
        Attribute::MaximumComparison,
        Attribute::MaximumValue,
        Attribute::IsUnitless,
        Attribute::Units,
        Attribute::DefaultValue,
        Attribute::AllowedMissingDefaultSelect,
        Attribute::CategoricalDefaultSelect,
        Attribute::BooleanDefaultSelect,
        Attribute::ContinuousDefault,
        Attribute::DatetimeDefault,
        Attribute::TextDefault,
        Attribute::RemoveField,
    ];

    /// Input name without template suffix or field index.
    pub fn name(&self) -> &'static str {
        match self {
            Attribute::FieldName => "field_name",
            Attribute::FieldType => "field_type",
            Attribute::FieldDesc => "field_desc",
            Attribute::IsPhi => "is_phi",
            Attribute::AllowedMissingVals => "allowed_missing_vals[]",
            Attribute::DataType => "data_type",
            Attribute::TrueValue => "true_value",
            Attribute::FalseValue => "false_value",
            Attribute::CategoricalValues => "categorical_values",
            Attribute::MinimumComparison => "minimum_comparison",
            Attribute::MinimumValue => "minimum_value",
            Attribute::MaximumComparison => "maximum_comparison",
            Attribute::MaximumValue => "maximum_value",
            Attribute::IsUnitless => "is_unitless",
            Attribute::Units => "units",
            Attribute::DefaultValue => "default_value",
            Attribute::AllowedMissingDefaultSelect => "allowed_missing_default_select",
            Attribute::CategoricalDefaultSelect => "categorical_default_select",
            Attribute::BooleanDefaultSelect => "boolean_default_select",
            Attribute::ContinuousDefault => "continuous_default",
            Attribute::DatetimeDefault => "datetime_default",
            Attribute::TextDefault => "text_default",
            Attribute::RemoveField => "remove_field",
        }
    }

    /// Accepts the exact input name; list-valued names also match without their `[]`.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        Attribute::ALL.iter().copied().find(|attribute| {
            let own = attribute.name();
            own == name || (attribute.is_list() && own.trim_end_matches("[]") == name)
        })
    }

    pub fn is_list(&self) -> bool {
        self.name().ends_with("[]")
    }

    pub fn control_kind(&self) -> ControlKind {
        match self {
            Attribute::FieldName => ControlKind::Hidden,
            Attribute::FieldType
            | Attribute::DataType
            | Attribute::MinimumComparison
            | Attribute::MaximumComparison
            | Attribute::AllowedMissingDefaultSelect
            | Attribute::CategoricalDefaultSelect
            | Attribute::BooleanDefaultSelect => ControlKind::Select,
            Attribute::IsPhi | Attribute::IsUnitless => ControlKind::Checkbox,
            Attribute::AllowedMissingVals => ControlKind::CheckboxGroup,
            Attribute::CategoricalValues => ControlKind::Textarea,
            Attribute::DefaultValue => ControlKind::Radio,
            Attribute::RemoveField => ControlKind::Button,
            Attribute::FieldDesc
            | Attribute::TrueValue
            | Attribute::FalseValue
            | Attribute::MinimumValue
            | Attribute::MaximumValue
            | Attribute::Units
            | Attribute::ContinuousDefault
            | Attribute::DatetimeDefault
            | Attribute::TextDefault => ControlKind::Text,
        }
    }

    /// Group whose container holds this input.
    pub fn group(&self) -> Group {
        match self {
            Attribute::FieldName | Attribute::FieldType | Attribute::RemoveField => Group::Header,
            Attribute::FieldDesc
            | Attribute::IsPhi
            | Attribute::AllowedMissingVals
            | Attribute::DefaultValue
            | Attribute::AllowedMissingDefaultSelect => Group::FieldDetails,
            Attribute::DataType => Group::DataType,
            Attribute::TrueValue => Group::BooleanTrue,
            Attribute::FalseValue => Group::BooleanFalse,
            Attribute::BooleanDefaultSelect => Group::BooleanDefault,
            Attribute::CategoricalValues => Group::Categorical,
            Attribute::CategoricalDefaultSelect => Group::CategoricalDefault,
            Attribute::MinimumComparison | Attribute::MinimumValue => Group::Minimum,
            Attribute::MaximumComparison | Attribute::MaximumValue => Group::Maximum,
            Attribute::IsUnitless | Attribute::Units => Group::Units,
            Attribute::ContinuousDefault | Attribute::DatetimeDefault => Group::ContinuousDefault,
            Attribute::TextDefault => Group::TextDefault,
        }
    }

    /// Human label shown next to the control and in error summaries.
    pub fn label(&self) -> &'static str {
        match self {
            Attribute::FieldName => "Field name:",
            Attribute::FieldType => "Field type:",
            Attribute::FieldDesc => "Description:",
            Attribute::IsPhi => "Contains PHI:",
            Attribute::AllowedMissingVals => "Allowed missing values:",
            Attribute::DataType => "Data type:",
            Attribute::TrueValue => "True value:",
            Attribute::FalseValue => "False value:",
            Attribute::CategoricalValues => "Categories (one per line):",
            Attribute::MinimumComparison => "Minimum comparison:",
            Attribute::MinimumValue => "Minimum:",
            Attribute::MaximumComparison => "Maximum comparison:",
            Attribute::MaximumValue => "Maximum:",
            Attribute::IsUnitless => "Unitless:",
            Attribute::Units => "Units:",
            Attribute::DefaultValue => "Default:",
            Attribute::AllowedMissingDefaultSelect => "Default missing value:",
            Attribute::CategoricalDefaultSelect => "Default category:",
            Attribute::BooleanDefaultSelect => "Default boolean value:",
            Attribute::ContinuousDefault => "Default value:",
            Attribute::DatetimeDefault => "Default date/time:",
            Attribute::TextDefault => "Default text:",
            Attribute::RemoveField => "Remove field",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A scalar or ordered-list attribute value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Scalar(#[serde(deserialize_with = "scalar_as_string")] String),
    List(Vec<String>),
}

fn scalar_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Bool(b) => Ok(b.to_string()),
        other => Err(D::Error::custom(format!("expected a scalar, found {}", other))),
    }
}

impl FieldValue {
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            FieldValue::Scalar(s) => Some(s),
            FieldValue::List(_) => None,
        }
    }

    /// The value as a list; a scalar becomes a one-element list.
    pub fn to_list(&self) -> Vec<String> {
        match self {
            FieldValue::Scalar(s) => vec![s.clone()],
            FieldValue::List(items) => items.clone(),
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Scalar(s) => s.trim().is_empty(),
            FieldValue::List(items) => items.iter().all(|item| item.trim().is_empty()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Scalar(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Scalar(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(values: Vec<String>) -> Self {
        FieldValue::List(values)
    }
}

/// Attribute name -> value mapping describing one field.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldDefinition {
    pub values: BTreeMap<String, FieldValue>,
}

impl FieldDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(field_name: &str) -> Self {
        let mut definition = Self::new();
        definition.set(Attribute::FieldName, field_name);
        definition
    }

    pub fn field_name(&self) -> Option<&str> {
        self.get(Attribute::FieldName).and_then(FieldValue::as_scalar)
    }

    /// Looks the attribute up by its exact name, or its name without `[]`.
    pub fn get(&self, attribute: Attribute) -> Option<&FieldValue> {
        self.values.get(attribute.name()).or_else(|| {
            if attribute.is_list() {
                self.values.get(attribute.name().trim_end_matches("[]"))
            } else {
                None
            }
        })
    }

    pub fn set(&mut self, attribute: Attribute, value: impl Into<FieldValue>) {
        self.values.insert(attribute.name().to_string(), value.into());
    }

    /// Builder-style variant of [`FieldDefinition::set`].
    pub fn with(mut self, attribute: Attribute, value: impl Into<FieldValue>) -> Self {
        self.set(attribute, value);
        self
    }

    /// Keys that do not name any template attribute.
    pub fn unknown_keys(&self) -> Vec<&str> {
        self.values
            .keys()
            .filter(|key| Attribute::from_name(key).is_none())
            .map(String::as_str)
            .collect()
    }
}

/// Input of the bulk loader: bare names, or full definitions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldItems {
    Names(Vec<String>),
    Definitions(Vec<FieldDefinition>),
}

impl FieldItems {
    pub fn is_empty(&self) -> bool {
        match self {
            FieldItems::Names(names) => names.is_empty(),
            FieldItems::Definitions(definitions) => definitions.is_empty(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            FieldItems::Names(names) => names.len(),
            FieldItems::Definitions(definitions) => definitions.len(),
        }
    }
}
