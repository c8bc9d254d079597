//! Validators, the per-field rule book, and form-wide validation.

use chrono::{NaiveDate, NaiveTime};
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::error::{Result, WizardError};
use crate::field::{Attribute, Comparison, ControlKind, DataType, FieldIndex};
use crate::form::{Form, FIELD_NAMES, STUDY_NAME};
use crate::identifier::{field_index_from_identifier, ElementKey};
use crate::registry::FieldRegistry;

pub const ALLOWED_DATE_FORMATS: [&str; 6] = [
    "YYYY-MM-DD HH:mm:ss",
    "YYYY-MM-DD HH:mm",
    "YYYY-MM-DD HH",
    "YYYY-MM-DD",
    "YYYY-MM",
    "YYYY",
];

pub const REQUIRED_MSG: &str = "This field is required.";
pub const NOT_NONE_MSG: &str = "Must not be None if a threshold value has been provided.";
pub const NO_DUPLICATES_MSG: &str = "Must not contain duplicate items.";
pub const INTEGER_MSG: &str = "Please enter a valid integer.";
pub const NUMBER_MSG: &str = "Please enter a valid number.";
pub const NAME_PATTERN_MSG: &str =
    "Only lower-case letters, numbers, and underscores are permitted, and must not start with a number.";
pub const UNIQUE_NAME_MSG: &str = "Field name must be unique.";
pub const SUMMARY_HEADER: &str = "Please correct the following issues:";
pub const FIELD_NAMES_HEADER: &str = "Please address the following issues:";

const STUDY_NAME_LABEL: &str = "Study name:";
const FIELD_NAMES_LABEL: &str = "Field names:";
const STUDY_NAME_MIN: usize = 2;
const STUDY_NAME_MAX: usize = 400;

lazy_static! {
    static ref INTEGER_RE: Regex = Regex::new(r"^-?\d+$").unwrap();
    static ref NUMBER_RE: Regex =
        Regex::new(r"^-?(?:\d+|\d{1,3}(?:,\d{3})+)?(?:\.\d+)?$").unwrap();
    static ref STUDY_NAME_RE: Regex = Regex::new(r"^[a-zA-Z0-9 ]*$").unwrap();
    // Same order as ALLOWED_DATE_FORMATS
    static ref DATETIME_RES: Vec<Regex> = vec![
        Regex::new(r"^(\d{4})-(\d{2})-(\d{2}) (\d{2}):(\d{2}):(\d{2})$").unwrap(),
        Regex::new(r"^(\d{4})-(\d{2})-(\d{2}) (\d{2}):(\d{2})$").unwrap(),
        Regex::new(r"^(\d{4})-(\d{2})-(\d{2}) (\d{2})$").unwrap(),
        Regex::new(r"^(\d{4})-(\d{2})-(\d{2})$").unwrap(),
        Regex::new(r"^(\d{4})-(\d{2})$").unwrap(),
        Regex::new(r"^(\d{4})$").unwrap(),
    ];
}

/// Non-blank lines of a multi-line text value, in order.
pub fn values_from_multiline(text: &str) -> Vec<String> {
    text.split('\n')
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}

pub fn has_no_duplicates(text: &str) -> bool {
    let mut seen = HashSet::new();
    values_from_multiline(text)
        .into_iter()
        .all(|line| seen.insert(line))
}

/// Strict match against the first of [`ALLOWED_DATE_FORMATS`] the text has
/// the shape of, then calendar validation.
pub fn is_valid_datetime(text: &str) -> bool {
    let captures = match DATETIME_RES.iter().find_map(|re| re.captures(text)) {
        Some(captures) => captures,
        None => return false,
    };
    let part = |i: usize, default: u32| -> u32 {
        captures
            .get(i)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(default)
    };
    let year: i32 = match captures[1].parse() {
        Ok(year) => year,
        Err(_) => return false,
    };
    NaiveDate::from_ymd_opt(year, part(2, 1), part(3, 1)).is_some()
        && NaiveTime::from_hms_opt(part(4, 0), part(5, 0), part(6, 0)).is_some()
}

pub fn is_integer(text: &str) -> bool {
    INTEGER_RE.is_match(text.trim())
}

pub fn is_number(text: &str) -> bool {
    let text = text.trim();
    !text.is_empty() && text != "-" && NUMBER_RE.is_match(text)
}

pub fn is_reserved_word_msg(name: &str) -> String {
    format!(
        "'{}' is not an allowed field name because it is a reserved word.",
        name
    )
}

pub fn reserved_suffix_msg(name: &str, suffix: &str) -> String {
    format!(
        "'{}' is not an allowed field name because it ends with the reserved suffix '{}'.",
        name, suffix
    )
}

pub fn datetime_msg() -> String {
    format!(
        "DateTime must be a valid timestamp in one of these formats: {}",
        ALLOWED_DATE_FORMATS.join(" or ")
    )
}

/// Every problem with `name` as a new field name: reserved word, reserved
/// suffix, pattern, uniqueness, in that order.
pub fn validate_putative_field_name(
    name: &str,
    registry: &FieldRegistry,
    pattern: &Regex,
) -> Vec<String> {
    let mut messages = Vec::new();
    if registry.is_reserved_word(name) {
        messages.push(is_reserved_word_msg(name));
    }
    if let Some(suffix) = registry.reserved_suffix_of(name) {
        messages.push(reserved_suffix_msg(name, suffix));
    }
    if !pattern.is_match(name) {
        messages.push(NAME_PATTERN_MSG.to_string());
    }
    if registry.has_field(name) {
        messages.push(UNIQUE_NAME_MSG.to_string());
    }
    messages
}

/// Validates each non-blank line of the field-names textarea. Returns one
/// message per offending name, after a header, or nothing when all pass.
pub fn validate_field_names_list(
    text: &str,
    registry: &FieldRegistry,
    pattern: &Regex,
) -> Vec<String> {
    let mut messages: Vec<String> = values_from_multiline(text)
        .iter()
        .map(|name| name.trim())
        .filter_map(|name| {
            let problems = validate_putative_field_name(name, registry, pattern);
            if problems.is_empty() {
                None
            } else {
                Some(format!("{}: {}", name, problems.join(" ")))
            }
        })
        .collect();
    if !messages.is_empty() {
        messages.insert(0, FIELD_NAMES_HEADER.to_string());
    }
    messages
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    Required,
    RequiredUnlessNoComparison,
    ComparisonRequiredIfFilled,
    NotReserved,
    NoReservedSuffix,
    NamePattern,
    UniqueName,
    NoDuplicates,
    DateTime,
    Integer,
    Number,
}

/// The comparison select paired with a threshold value, and back.
fn sibling(attribute: Attribute) -> Option<Attribute> {
    match attribute {
        Attribute::MinimumValue => Some(Attribute::MinimumComparison),
        Attribute::MinimumComparison => Some(Attribute::MinimumValue),
        Attribute::MaximumValue => Some(Attribute::MaximumComparison),
        Attribute::MaximumComparison => Some(Attribute::MaximumValue),
        _ => None,
    }
}

const TYPED_ATTRIBUTES: [Attribute; 3] = [
    Attribute::MinimumValue,
    Attribute::MaximumValue,
    Attribute::ContinuousDefault,
];

/// Validation rules bound per element.
#[derive(Clone, Debug)]
pub struct RuleBook {
    rules: BTreeMap<ElementKey, BTreeSet<Rule>>,
    name_pattern: Regex,
}

impl RuleBook {
    pub fn new(field_name_regex: &str) -> Result<Self> {
        let name_pattern = Regex::new(field_name_regex)
            .map_err(|e| WizardError::config(format!("field name pattern: {}", e)))?;
        Ok(RuleBook {
            rules: BTreeMap::new(),
            name_pattern,
        })
    }

    pub fn name_pattern(&self) -> &Regex {
        &self.name_pattern
    }

    fn add(&mut self, index: FieldIndex, attribute: Attribute, rules: &[Rule]) {
        self.rules
            .entry(ElementKey::new(index, attribute))
            .or_default()
            .extend(rules.iter().copied());
    }

    /// Binds the fixed rule set of a newly appended field.
    pub fn decorate(&mut self, index: FieldIndex) {
        self.add(
            index,
            Attribute::FieldName,
            &[
                Rule::NotReserved,
                Rule::NoReservedSuffix,
                Rule::NamePattern,
                Rule::UniqueName,
            ],
        );
        for attribute in [
            Attribute::FieldType,
            Attribute::DataType,
            Attribute::TrueValue,
            Attribute::FalseValue,
        ] {
            self.add(index, attribute, &[Rule::Required]);
        }
        self.add(
            index,
            Attribute::CategoricalValues,
            &[Rule::Required, Rule::NoDuplicates],
        );
        self.add(index, Attribute::MinimumValue, &[Rule::RequiredUnlessNoComparison]);
        self.add(index, Attribute::MaximumValue, &[Rule::RequiredUnlessNoComparison]);
        self.add(
            index,
            Attribute::MinimumComparison,
            &[Rule::ComparisonRequiredIfFilled],
        );
        self.add(
            index,
            Attribute::MaximumComparison,
            &[Rule::ComparisonRequiredIfFilled],
        );
        self.add(index, Attribute::DatetimeDefault, &[Rule::DateTime]);
        debug!("rules bound for field {}", index);
    }

    /// Swaps the numeric rule of the typed inputs for the one `data_type` needs.
    pub fn update_type_rules(&mut self, index: FieldIndex, data_type: Option<DataType>) {
        let type_rule = match data_type {
            Some(DataType::Integer) => Some(Rule::Integer),
            Some(DataType::Float) => Some(Rule::Number),
            _ => None,
        };
        for attribute in TYPED_ATTRIBUTES {
            let rules = self
                .rules
                .entry(ElementKey::new(index, attribute))
                .or_default();
            rules.remove(&Rule::Integer);
            rules.remove(&Rule::Number);
            if let Some(rule) = type_rule {
                rules.insert(rule);
            }
        }
    }

    pub fn rules_for(&self, key: ElementKey) -> Option<&BTreeSet<Rule>> {
        self.rules.get(&key)
    }

    pub fn remove_field(&mut self, index: FieldIndex) {
        self.rules.retain(|key, _| key.index != index);
    }

    pub fn clear(&mut self) {
        self.rules.clear();
    }

    /// First failing rule's message for one element, if any.
    fn check(
        &self,
        key: ElementKey,
        form: &Form,
        registry: &FieldRegistry,
    ) -> Option<String> {
        let rules = self.rules.get(&key)?;
        let panel = form.field(key.index).ok()?;
        let control = panel.control(key.attribute).ok()?;
        if !control.enabled && control.kind != ControlKind::Hidden {
            return None;
        }
        let value = control.value.trim();
        let blank = value.is_empty();
        for rule in rules {
            let failure = match rule {
                Rule::Required => blank.then(|| REQUIRED_MSG.to_string()),
                Rule::RequiredUnlessNoComparison => {
                    let comparison = sibling(key.attribute).map(|a| panel.value(a));
                    (blank && comparison != Some(Comparison::NoComparison.as_str()))
                        .then(|| REQUIRED_MSG.to_string())
                }
                Rule::ComparisonRequiredIfFilled => {
                    let threshold = sibling(key.attribute).map(|a| panel.value(a).trim());
                    let filled = threshold.is_some_and(|t| !t.is_empty());
                    (filled && value == Comparison::NoComparison.as_str())
                        .then(|| NOT_NONE_MSG.to_string())
                }
                Rule::NotReserved => registry
                    .is_reserved_word(value)
                    .then(|| is_reserved_word_msg(value)),
                Rule::NoReservedSuffix => registry
                    .reserved_suffix_of(value)
                    .map(|suffix| reserved_suffix_msg(value, suffix)),
                Rule::NamePattern => {
                    (!self.name_pattern.is_match(value)).then(|| NAME_PATTERN_MSG.to_string())
                }
                Rule::UniqueName => {
                    let holders = form.fields().filter(|p| p.field_name() == value).count();
                    (holders > 1 || (registry.is_package_field(value)))
                        .then(|| UNIQUE_NAME_MSG.to_string())
                }
                Rule::NoDuplicates => {
                    (!blank && !has_no_duplicates(&control.value)).then(|| NO_DUPLICATES_MSG.to_string())
                }
                Rule::DateTime => (!blank && !is_valid_datetime(value)).then(datetime_msg),
                Rule::Integer => (!blank && !is_integer(value)).then(|| INTEGER_MSG.to_string()),
                Rule::Number => (!blank && !is_number(value)).then(|| NUMBER_MSG.to_string()),
            };
            if failure.is_some() {
                return failure;
            }
        }
        None
    }

    /// Validates the form-level inputs and every bound element.
    pub fn validate(&self, form: &Form, registry: &FieldRegistry) -> ValidationReport {
        let mut report = ValidationReport::default();
        if let Some(message) = study_name_error(&form.study_name) {
            report.push(STUDY_NAME, None, STUDY_NAME_LABEL, message);
        }
        let name_problems = validate_field_names_list(&form.field_names, registry, &self.name_pattern);
        if !name_problems.is_empty() {
            report.push(FIELD_NAMES, None, FIELD_NAMES_LABEL, name_problems.join("\n"));
        }
        for panel in form.fields() {
            for attribute in Attribute::ALL {
                let key = ElementKey::new(panel.index, attribute);
                if let Some(message) = self.check(key, form, registry) {
                    let label = format!("{} {}", panel.field_name(), attribute.label());
                    report.push(&key.identifier(), Some(key), &label, message);
                }
            }
        }
        report
    }
}

fn study_name_error(study_name: &str) -> Option<String> {
    let length = study_name.chars().count();
    if study_name.trim().is_empty() {
        Some(REQUIRED_MSG.to_string())
    } else if !STUDY_NAME_RE.is_match(study_name) {
        Some("Only letters, numbers, and spaces are permitted.".to_string())
    } else if length < STUDY_NAME_MIN {
        Some(format!("Please enter at least {} characters.", STUDY_NAME_MIN))
    } else if length > STUDY_NAME_MAX {
        Some(format!(
            "This field must be {} characters or fewer.",
            STUDY_NAME_MAX
        ))
    } else {
        None
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Name of the offending element, e.g. `minimum_value_2` or `study_name`
    pub identifier: String,
    pub key: Option<ElementKey>,
    pub message: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
    pub summary: Vec<String>,
}

impl ValidationReport {
    fn push(&mut self, identifier: &str, key: Option<ElementKey>, label: &str, message: String) {
        let mut label = label.trim().to_string();
        if !label.ends_with(':') {
            label.push(':');
        }
        self.summary.push(format!("{} {}", label, message));
        self.errors.push(ValidationError {
            identifier: identifier.to_string(),
            key,
            message,
        });
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn error_for(&self, key: ElementKey) -> Option<&str> {
        self.errors
            .iter()
            .find(|error| error.key == Some(key))
            .map(|error| error.message.as_str())
    }

    pub fn error_for_identifier(&self, identifier: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|error| error.identifier == identifier)
            .map(|error| error.message.as_str())
    }

    /// Indexes of fields that have at least one error.
    pub fn failing_fields(&self) -> BTreeSet<FieldIndex> {
        self.errors
            .iter()
            .filter_map(|error| field_index_from_identifier(&error.identifier))
            .collect()
    }

    /// Header plus one line per error; empty when valid.
    pub fn summary_text(&self) -> String {
        if self.summary.is_empty() {
            return String::new();
        }
        let mut text = String::from(SUMMARY_HEADER);
        for line in &self.summary {
            text.push_str("\n - ");
            text.push_str(line);
        }
        text
    }
}
