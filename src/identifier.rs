use serde::{Deserialize, Serialize};
use std::fmt;

use crate::field::{Attribute, FieldIndex};

/// Joins a base name and a field index in concrete identifiers.
pub const SEPARATOR: &str = "_";

/// Marks an element of the hidden template fragment.
pub const TEMPLATE_SUFFIX: &str = "_template";

/// Trailing marker of list-valued (checkbox group) input names.
pub const LIST_MARKER: &str = "[]";

fn split_list_marker(name: &str) -> (&str, bool) {
    match name.strip_suffix(LIST_MARKER) {
        Some(stem) => (stem, true),
        None => (name, false),
    }
}

/// Template identifier for a base name, e.g. `minimum_value` -> `minimum_value_template`.
///
/// A list marker stays last: `allowed_missing_vals[]` -> `allowed_missing_vals_template[]`.
pub fn template_identifier(base_name: &str) -> String {
    let (stem, is_list) = split_list_marker(base_name);
    let mut result = format!("{}{}", stem, TEMPLATE_SUFFIX);
    if is_list {
        result.push_str(LIST_MARKER);
    }
    result
}

/// Substitutes the template suffix of `template` with `SEPARATOR + field_index`.
///
/// Only the last occurrence of the suffix is replaced, so the substitution is
/// applied exactly once. A string without the suffix is returned unchanged.
pub fn identifier_from_template(template: &str, field_index: FieldIndex) -> String {
    match template.rfind(TEMPLATE_SUFFIX) {
        Some(pos) => {
            let mut result = String::with_capacity(template.len() + 4);
            result.push_str(&template[..pos]);
            result.push_str(SEPARATOR);
            result.push_str(&field_index.to_string());
            result.push_str(&template[pos + TEMPLATE_SUFFIX.len()..]);
            result
        }
        None => template.to_string(),
    }
}

/// Concrete identifier of one attribute of one field, e.g. (`units`, 3) -> `units_3`.
pub fn identifier_for(base_name: &str, field_index: FieldIndex) -> String {
    identifier_from_template(&template_identifier(base_name), field_index)
}

/// True when `identifier` names an element of the template fragment rather than
/// an instantiated field.
pub fn is_template_identifier(identifier: &str) -> bool {
    let (stem, _) = split_list_marker(identifier);
    stem.ends_with(TEMPLATE_SUFFIX)
}

/// Recovers the field index from a concrete identifier.
///
/// Returns `None` for identifiers that carry no index, such as `study_name`.
pub fn field_index_from_identifier(identifier: &str) -> Option<FieldIndex> {
    let (stem, _) = split_list_marker(identifier);
    let last_piece = stem.rsplit(SEPARATOR).next()?;
    if last_piece.is_empty() || !last_piece.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    last_piece.parse::<FieldIndex>().ok()
}

/// Strips the `SEPARATOR + index` part from a concrete identifier, giving back the
/// base name (list marker kept).
pub fn base_name_from_identifier(identifier: &str) -> Option<String> {
    let index = field_index_from_identifier(identifier)?;
    let (stem, is_list) = split_list_marker(identifier);
    let index_piece = format!("{}{}", SEPARATOR, index);
    let mut base = stem.strip_suffix(index_piece.as_str())?.to_string();
    if is_list {
        base.push_str(LIST_MARKER);
    }
    Some(base)
}

/// Composite key addressing one control of one field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ElementKey {
    pub index: FieldIndex,
    pub attribute: Attribute,
}

impl ElementKey {
    pub fn new(index: FieldIndex, attribute: Attribute) -> Self {
        ElementKey { index, attribute }
    }

    /// The serialized (name) form of the key.
    pub fn identifier(&self) -> String {
        identifier_for(self.attribute.name(), self.index)
    }

    pub fn parse(identifier: &str) -> Option<Self> {
        let index = field_index_from_identifier(identifier)?;
        let base = base_name_from_identifier(identifier)?;
        let attribute = Attribute::from_name(&base)?;
        Some(ElementKey { index, attribute })
    }
}

impl fmt::Display for ElementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.identifier())
    }
}
