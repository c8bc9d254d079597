//! Browser binding: a wizard session driven with JSON strings.

use wasm_bindgen::prelude::*;

use crate::config::WizardSettings;
use crate::error::WizardError;
use crate::field::{Attribute, FieldIndex, FieldItems};
use crate::protocol::{PackageRequest, PackageResponse, UploadResponse};
use crate::wizard::{AddFieldsOutcome, PackageChange, SubmitOutcome, Wizard};

fn to_js(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn attribute(name: &str) -> Result<Attribute, JsValue> {
    Attribute::from_name(name).ok_or_else(|| to_js(WizardError::UnknownAttribute(name.to_string())))
}

#[wasm_bindgen]
pub struct WizardSession {
    wizard: Wizard,
}

#[wasm_bindgen]
impl WizardSession {
    /// Starts a session from a settings JSON document; an empty string uses
    /// the built-in defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(settings_json: &str) -> Result<WizardSession, JsValue> {
        let settings = if settings_json.trim().is_empty() {
            WizardSettings::default()
        } else {
            let settings: WizardSettings = serde_json::from_str(settings_json).map_err(to_js)?;
            settings.validate().map_err(to_js)?;
            settings
        };
        Ok(WizardSession {
            wizard: Wizard::new(settings).map_err(to_js)?,
        })
    }

    #[wasm_bindgen(js_name = setStudyName)]
    pub fn set_study_name(&mut self, study_name: &str) {
        self.wizard.set_study_name(study_name);
    }

    /// Returns the indexes added, or the list problems as an error.
    #[wasm_bindgen(js_name = addFieldNames)]
    pub fn add_field_names(&mut self, text: &str) -> Result<String, JsValue> {
        match self.wizard.add_field_names(text).map_err(to_js)? {
            AddFieldsOutcome::Added(indexes) => serde_json::to_string(&indexes).map_err(to_js),
            AddFieldsOutcome::Rejected(messages) => Err(JsValue::from_str(&messages.join("\n"))),
        }
    }

    #[wasm_bindgen(js_name = loadFields)]
    pub fn load_fields(&mut self, items_json: &str) -> Result<String, JsValue> {
        let items: FieldItems = serde_json::from_str(items_json).map_err(to_js)?;
        let added = self.wizard.load(&items).map_err(to_js)?;
        serde_json::to_string(&added).map_err(to_js)
    }

    #[wasm_bindgen(js_name = setValue)]
    pub fn set_value(&mut self, index: FieldIndex, name: &str, value: &str) -> Result<(), JsValue> {
        let attribute = attribute(name)?;
        self.wizard.set_value(index, attribute, value).map_err(to_js)
    }

    #[wasm_bindgen(js_name = setChecked)]
    pub fn set_checked(
        &mut self,
        index: FieldIndex,
        name: &str,
        value: &str,
        checked: bool,
    ) -> Result<(), JsValue> {
        let attribute = attribute(name)?;
        self.wizard
            .set_checked(index, attribute, value, checked)
            .map_err(to_js)
    }

    #[wasm_bindgen(js_name = removeField)]
    pub fn remove_field(&mut self, index: FieldIndex, confirmed: bool) -> Result<bool, JsValue> {
        self.wizard.remove_field(index, |_| confirmed).map_err(to_js)
    }

    #[wasm_bindgen(js_name = selectField)]
    pub fn select_field(&mut self, index: FieldIndex) -> Result<(), JsValue> {
        self.wizard.select_field(index).map_err(to_js)
    }

    /// Applies a package choice with the server's package reply. Returns
    /// `false` when the change was declined.
    #[wasm_bindgen(js_name = changePackage)]
    pub fn change_package(
        &mut self,
        request_json: &str,
        response_json: &str,
        confirmed: bool,
    ) -> Result<bool, JsValue> {
        let request: PackageRequest = serde_json::from_str(request_json).map_err(to_js)?;
        let response: PackageResponse = serde_json::from_str(response_json).map_err(to_js)?;
        match self.wizard.change_package(request, |_| confirmed) {
            PackageChange::Declined => Ok(false),
            PackageChange::Unchanged => Ok(true),
            PackageChange::Reset => {
                self.wizard.apply_package_response(&response);
                Ok(true)
            }
        }
    }

    #[wasm_bindgen(js_name = applyUploadResponse)]
    pub fn apply_upload_response(&mut self, response_json: &str) -> Result<String, JsValue> {
        let response: UploadResponse = serde_json::from_str(response_json).map_err(to_js)?;
        let errors = self.wizard.apply_upload_response(&response).map_err(to_js)?;
        serde_json::to_string(&errors).map_err(to_js)
    }

    /// The submission JSON, or the error summary as an error.
    pub fn submit(&mut self) -> Result<String, JsValue> {
        match self.wizard.submit() {
            SubmitOutcome::Accepted(submission) => serde_json::to_string(&submission).map_err(to_js),
            SubmitOutcome::Rejected(report) => Err(JsValue::from_str(&report.summary_text())),
        }
    }

    /// Latest validation report as JSON; `null` before a failed submit.
    #[wasm_bindgen(js_name = lastReport)]
    pub fn last_report(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.wizard.last_report()).map_err(to_js)
    }

    #[wasm_bindgen(js_name = presentation)]
    pub fn presentation(&self, index: FieldIndex) -> Result<String, JsValue> {
        let presentation = self.wizard.presentation(index).map_err(to_js)?;
        serde_json::to_string(&presentation).map_err(to_js)
    }

    #[wasm_bindgen(js_name = fieldMarkup)]
    pub fn field_markup(&self, index: FieldIndex) -> Result<String, JsValue> {
        let panel = self.wizard.form().field(index).map_err(to_js)?;
        Ok(panel.to_markup())
    }
}
