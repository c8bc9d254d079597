//! Wizard settings: the values a hosting page would otherwise transfer into the
//! client (reserved suffixes, name pattern, package catalogue, display mapping).

use lazy_static::lazy_static;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::display::DisplayConfig;
use crate::error::{Result, WizardError};
use crate::field::{FieldType, Group};

/// Lower-case letters, digits and underscores, not starting with a digit.
pub const FIELD_NAME_REGEX: &str = "^[a-z][a-z0-9_]*$";
pub const UNITS_SUFFIX: &str = "_units";
pub const PHI_SUFFIX: &str = "_phi";
pub const SAMPLE_NAME_HEADER: &str = "sample_name";
pub const DEFAULT_SETTINGS_PATH: &str = "settings/wizard_settings.json";

lazy_static! {
    pub static ref SETTINGS_PATH: PathBuf = env::var("METAWIZ_SETTINGS")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_SETTINGS_PATH));
    pub static ref SERVER_ADDR: String =
        env::var("METAWIZ_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
}

/// One field a package contributes to every template built from it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageField {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// A pre-defined set of fields for one environment / sample type combination.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PackageDefinition {
    pub env: String,
    pub sample_type: String,
    #[serde(default)]
    pub reserved_words: Vec<Value>,
    #[serde(default)]
    pub fields: Vec<PackageField>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WizardSettings {
    #[serde(default = "default_reserved_suffixes")]
    pub reserved_suffixes: Vec<String>,
    #[serde(default = "default_field_name_regex")]
    pub field_name_regex: String,
    /// Reserved words applied to every package
    #[serde(default)]
    pub reserved_words: Vec<Value>,
    /// Visible groups per field type; the standard mapping when absent
    #[serde(default)]
    pub display: Option<BTreeMap<FieldType, BTreeSet<Group>>>,
    #[serde(default)]
    pub packages: Vec<PackageDefinition>,
}

fn default_reserved_suffixes() -> Vec<String> {
    vec![UNITS_SUFFIX.to_string(), PHI_SUFFIX.to_string()]
}

fn default_field_name_regex() -> String {
    FIELD_NAME_REGEX.to_string()
}

impl Default for WizardSettings {
    fn default() -> Self {
        WizardSettings {
            reserved_suffixes: default_reserved_suffixes(),
            field_name_regex: default_field_name_regex(),
            reserved_words: Vec::new(),
            display: None,
            packages: Vec::new(),
        }
    }
}

impl WizardSettings {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        let settings: WizardSettings = serde_json::from_str(&text)?;
        settings.validate()?;
        info!("loaded wizard settings from {}", path.as_ref().display());
        Ok(settings)
    }

    /// Settings from `METAWIZ_SETTINGS` (or the default path); defaults when the file is missing.
    pub fn from_env() -> Result<Self> {
        if SETTINGS_PATH.exists() {
            Self::load(SETTINGS_PATH.as_path())
        } else {
            warn!(
                "no settings file at {}, using built-in defaults",
                SETTINGS_PATH.display()
            );
            Ok(Self::default())
        }
    }

    pub fn display_config(&self) -> Result<DisplayConfig> {
        match &self.display {
            Some(mapping) => DisplayConfig::new(mapping.clone()),
            None => Ok(DisplayConfig::standard()),
        }
    }

    pub fn find_package(&self, env: &str, sample_type: &str) -> Option<&PackageDefinition> {
        self.packages
            .iter()
            .find(|package| package.env == env && package.sample_type == sample_type)
    }

    /// Environment -> sample types offered for it.
    pub fn sample_types_by_env(&self) -> BTreeMap<String, Vec<String>> {
        let mut result: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for package in &self.packages {
            result
                .entry(package.env.clone())
                .or_default()
                .push(package.sample_type.clone());
        }
        result
    }

    pub fn validate(&self) -> Result<()> {
        regex::Regex::new(&self.field_name_regex)
            .map_err(|e| WizardError::config(format!("field_name_regex: {}", e)))?;
        self.display_config()?;
        Ok(())
    }
}
