//! Session-wide bookkeeping of field names, reserved words and the index counter.

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

use crate::field::FieldIndex;

/// Word a null reserved-word entry is recorded as.
pub const NULL_WORD: &str = "null";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRegistry {
    existing_field_names: BTreeSet<String>,
    package_fields: BTreeSet<String>,
    reserved_words: BTreeSet<String>,
    reserved_suffixes: BTreeSet<String>,
    next_field_index: FieldIndex,
    uploaded_file_names: Vec<String>,
}

impl FieldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reserved_suffixes<I, S>(suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldRegistry {
            reserved_suffixes: suffixes.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.existing_field_names.contains(name)
    }

    /// Registers `name`; adding an existing name changes nothing.
    pub fn add_field(&mut self, name: &str) {
        if self.existing_field_names.insert(name.to_string()) {
            debug!("registered field name '{}'", name);
        }
    }

    /// Unregisters `name`. The index counter is left alone.
    pub fn remove_field(&mut self, name: &str) {
        if self.existing_field_names.remove(name) {
            debug!("unregistered field name '{}'", name);
        }
    }

    pub fn next_index(&self) -> FieldIndex {
        self.next_field_index
    }

    /// Moves the counter past the index just instantiated.
    pub fn advance_index(&mut self) -> FieldIndex {
        let used = self.next_field_index;
        self.next_field_index += 1;
        used
    }

    /// Replaces the reserved words with the lowercased entries of `raw`.
    ///
    /// A null entry is recorded as the word `null`; numbers and booleans are
    /// recorded by their JSON text.
    pub fn set_reserved_words(&mut self, raw: &[Value]) {
        self.reserved_words = raw
            .iter()
            .map(|entry| match entry {
                Value::Null => NULL_WORD.to_string(),
                Value::String(s) => s.to_lowercase(),
                other => other.to_string().to_lowercase(),
            })
            .collect();
        debug!("{} reserved words set", self.reserved_words.len());
    }

    pub fn is_reserved_word(&self, name: &str) -> bool {
        self.reserved_words.contains(&name.to_lowercase())
    }

    /// The reserved suffix `name` ends with, if any.
    pub fn reserved_suffix_of(&self, name: &str) -> Option<&str> {
        self.reserved_suffixes
            .iter()
            .find(|suffix| name.ends_with(suffix.as_str()))
            .map(String::as_str)
    }

    pub fn set_package_fields<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            let name = name.as_ref();
            self.package_fields.insert(name.to_string());
            self.add_field(name);
        }
    }

    pub fn is_package_field(&self, name: &str) -> bool {
        self.package_fields.contains(name)
    }

    pub fn record_uploaded_file(&mut self, name: &str) {
        self.uploaded_file_names.push(name.to_string());
    }

    /// Registered names that did not come from the package.
    pub fn custom_field_names(&self) -> impl Iterator<Item = &str> {
        self.existing_field_names
            .iter()
            .filter(|name| !self.package_fields.contains(*name))
            .map(String::as_str)
    }

    pub fn existing_field_names(&self) -> &BTreeSet<String> {
        &self.existing_field_names
    }

    pub fn package_fields(&self) -> &BTreeSet<String> {
        &self.package_fields
    }

    pub fn reserved_words(&self) -> &BTreeSet<String> {
        &self.reserved_words
    }

    pub fn reserved_suffixes(&self) -> &BTreeSet<String> {
        &self.reserved_suffixes
    }

    pub fn uploaded_file_names(&self) -> &[String] {
        &self.uploaded_file_names
    }
}

