//! JSON shapes exchanged with the package and upload endpoints.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::PackageDefinition;
use crate::field::FieldItems;

/// Prefix of the error reported for a file the wizard did not produce.
pub const NON_WIZARD_FILE_ERROR_PREFIX: &str =
    "File does not appear to have been produced by the metadata wizard: ";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRequest {
    pub env: String,
    pub sample_type: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescription {
    pub name: String,
    pub description: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageResponse {
    /// Arbitrary JSON scalars; nulls and non-strings are normalised on receipt
    #[serde(default)]
    pub reserved_words: Vec<Value>,
    #[serde(default)]
    pub field_names: Vec<String>,
    #[serde(default)]
    pub field_descriptions: Vec<FieldDescription>,
}

impl PackageResponse {
    /// Response for `package`, with the settings-wide reserved words merged in.
    pub fn for_package(package: &PackageDefinition, common_reserved_words: &[Value]) -> Self {
        let mut reserved_words = common_reserved_words.to_vec();
        reserved_words.extend(package.reserved_words.iter().cloned());
        PackageResponse {
            reserved_words,
            field_names: package.fields.iter().map(|f| f.name.clone()).collect(),
            field_descriptions: package
                .fields
                .iter()
                .map(|f| FieldDescription {
                    name: f.name.clone(),
                    description: f.description.clone(),
                })
                .collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UploadedFile {
    pub fn accepted(name: &str) -> Self {
        UploadedFile {
            name: name.to_string(),
            error: None,
        }
    }

    pub fn rejected(name: &str, error: impl Into<String>) -> Self {
        UploadedFile {
            name: name.to_string(),
            error: Some(error.into()),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub files: Vec<UploadedFile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<FieldItems>,
}
