//! One wizard session: the registry, form, rule book and per-field views, plus
//! the change handlers that keep them consistent.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::WizardSettings;
use crate::display::{
    apply_data_type_change, apply_default_option_change, apply_field_type_change,
    apply_unitless_change, DisplayChange, DisplayConfig, FieldView, Presentation,
};
use crate::error::{Result, WizardError};
use crate::field::{
    Attribute, DataType, DefaultOption, FieldDefinition, FieldIndex, FieldItems, FieldType,
    FieldValue,
};
use crate::form::{Choice, Form};
use crate::loader::load_fields;
use crate::protocol::{FieldDescription, PackageRequest, PackageResponse, UploadResponse};
use crate::registry::FieldRegistry;
use crate::template::{FieldTemplate, PLACEHOLDER_LABEL};
use crate::validation::{validate_field_names_list, values_from_multiline, RuleBook, ValidationReport};

/// The described template as it leaves the wizard.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub study_name: String,
    #[serde(default)]
    pub package: Option<PackageRequest>,
    #[serde(default)]
    pub package_fields: Vec<String>,
    pub fields: BTreeMap<FieldIndex, FieldDefinition>,
}

impl Submission {
    /// Definitions in field index order, ready to be loaded back.
    pub fn field_definitions(&self) -> Vec<FieldDefinition> {
        self.fields.values().cloned().collect()
    }

    pub fn custom_field_names(&self) -> Vec<String> {
        self.fields
            .values()
            .filter_map(|definition| definition.field_name().map(str::to_string))
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    Accepted(Submission),
    Rejected(ValidationReport),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AddFieldsOutcome {
    Added(Vec<FieldIndex>),
    /// The field-name list failed validation; nothing was added
    Rejected(Vec<String>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PackageChange {
    /// The same package was chosen again
    Unchanged,
    /// The user declined to drop the custom fields
    Declined,
    Reset,
}

pub struct Wizard {
    settings: WizardSettings,
    display: DisplayConfig,
    template: FieldTemplate,
    registry: FieldRegistry,
    form: Form,
    rules: RuleBook,
    views: BTreeMap<FieldIndex, FieldView>,
    submitted: bool,
    last_report: Option<ValidationReport>,
    package: Option<PackageRequest>,
    field_descriptions: Vec<FieldDescription>,
}

impl Wizard {
    pub fn new(settings: WizardSettings) -> Result<Self> {
        let display = settings.display_config()?;
        let rules = RuleBook::new(&settings.field_name_regex)?;
        let mut registry = FieldRegistry::with_reserved_suffixes(settings.reserved_suffixes.clone());
        registry.set_reserved_words(&settings.reserved_words);
        Ok(Wizard {
            settings,
            display,
            template: FieldTemplate::standard(),
            registry,
            form: Form::new(),
            rules,
            views: BTreeMap::new(),
            submitted: false,
            last_report: None,
            package: None,
            field_descriptions: Vec::new(),
        })
    }

    pub fn settings(&self) -> &WizardSettings {
        &self.settings
    }

    pub fn display_config(&self) -> &DisplayConfig {
        &self.display
    }

    pub fn template(&self) -> &FieldTemplate {
        &self.template
    }

    pub fn registry(&self) -> &FieldRegistry {
        &self.registry
    }

    pub(crate) fn registry_mut(&mut self) -> &mut FieldRegistry {
        &mut self.registry
    }

    pub fn form(&self) -> &Form {
        &self.form
    }

    pub(crate) fn form_mut(&mut self) -> &mut Form {
        &mut self.form
    }

    pub fn rules(&self) -> &RuleBook {
        &self.rules
    }

    pub fn view(&self, index: FieldIndex) -> Result<&FieldView> {
        self.views.get(&index).ok_or(WizardError::UnknownField(index))
    }

    pub fn presentation(&self, index: FieldIndex) -> Result<Presentation> {
        Ok(Presentation::of(self.view(index)?, &self.display))
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    /// Report of the latest validation, kept only once a submit has failed.
    pub fn last_report(&self) -> Option<&ValidationReport> {
        self.last_report.as_ref()
    }

    pub fn package(&self) -> Option<&PackageRequest> {
        self.package.as_ref()
    }

    pub fn field_descriptions(&self) -> &[FieldDescription] {
        &self.field_descriptions
    }

    /// Registers `name` and appends a fresh field for the next index with its
    /// rules bound and its initial presentation applied. The index counter is
    /// not advanced here.
    pub(crate) fn instantiate_field(&mut self, name: &str) -> Result<FieldIndex> {
        self.registry.add_field(name);
        let index = self.registry.next_index();
        let fragment = self.template.instantiate(index, Some(name));
        self.form.append_field(fragment)?;
        self.rules.decorate(index);

        let view = FieldView::default();
        let changes = Presentation::of(&view, &self.display).as_changes();
        self.form.field_mut(index)?.apply(&changes)?;
        self.views.insert(index, view);
        self.refresh_missing_defaults(index)?;
        debug!("instantiated field {} '{}'", index, name);
        Ok(index)
    }

    /// Puts a loaded value into a control and fires its change handler once.
    pub(crate) fn assign(&mut self, index: FieldIndex, attribute: Attribute, value: &FieldValue) -> Result<()> {
        let panel = self.form.field_mut(index)?;
        match value {
            FieldValue::Scalar(text) => panel.set_form_value(attribute, text)?,
            FieldValue::List(items) if attribute.is_list() => {
                if items.is_empty() {
                    return Ok(());
                }
                for item in items {
                    panel.set_form_value(attribute, item)?;
                }
            }
            FieldValue::List(items) => {
                return Err(WizardError::invalid_value(attribute.name(), items.join(", ")));
            }
        }
        self.on_change(index, attribute)
    }

    /// A user edit of one control. The field name is fixed when the field is
    /// created and cannot be edited.
    pub fn set_value(&mut self, index: FieldIndex, attribute: Attribute, value: &str) -> Result<()> {
        debug!("set {} = '{}'", crate::identifier::ElementKey::new(index, attribute), value);
        self.reject_field_name(index, attribute)?;
        self.form.field_mut(index)?.set_form_value(attribute, value)?;
        self.on_change(index, attribute)
    }

    /// A user click on a checkbox.
    pub fn set_checked(
        &mut self,
        index: FieldIndex,
        attribute: Attribute,
        value: &str,
        checked: bool,
    ) -> Result<()> {
        self.reject_field_name(index, attribute)?;
        self.form
            .field_mut(index)?
            .set_checked(attribute, value, checked)?;
        self.on_change(index, attribute)
    }

    // The registry owns field names; only instantiation writes them.
    fn reject_field_name(&self, index: FieldIndex, attribute: Attribute) -> Result<()> {
        if attribute != Attribute::FieldName {
            return Ok(());
        }
        let control = self.form.field(index)?.control(attribute)?;
        Err(WizardError::UnsupportedInput {
            identifier: control.name.clone(),
            kind: control.kind.to_string(),
        })
    }

    pub fn set_study_name(&mut self, study_name: &str) {
        self.form.study_name = study_name.to_string();
        self.revalidate_if_submitted();
    }

    pub fn set_field_names_text(&mut self, text: &str) {
        self.form.field_names = text.to_string();
        self.revalidate_if_submitted();
    }

    /// Validates the `field_names` list and, when it passes, adds the names
    /// and clears the list.
    pub fn add_field_names(&mut self, text: &str) -> Result<AddFieldsOutcome> {
        self.form.field_names = text.to_string();
        let problems =
            validate_field_names_list(text, &self.registry, self.rules.name_pattern());
        if !problems.is_empty() {
            debug!("field name list rejected with {} problem(s)", problems.len() - 1);
            self.revalidate_if_submitted();
            return Ok(AddFieldsOutcome::Rejected(problems));
        }
        let names: Vec<String> = values_from_multiline(text)
            .iter()
            .map(|name| name.trim().to_string())
            .collect();
        let added = load_fields(self, &FieldItems::Names(names))?;
        self.form.field_names.clear();
        self.revalidate_if_submitted();
        Ok(AddFieldsOutcome::Added(added))
    }

    /// Bulk-loads names or definitions.
    pub fn load(&mut self, items: &FieldItems) -> Result<Vec<FieldIndex>> {
        let added = load_fields(self, items)?;
        self.revalidate_if_submitted();
        Ok(added)
    }

    /// Removes a field once `confirm` agrees. Returns whether it was removed.
    pub fn remove_field<F>(&mut self, index: FieldIndex, confirm: F) -> Result<bool>
    where
        F: FnOnce(&str) -> bool,
    {
        let name = self.form.field(index)?.field_name().to_string();
        let message = format!("Permanently delete the '{}' field?", name);
        if !confirm(&message) {
            return Ok(false);
        }
        self.form.remove_field(index);
        self.registry.remove_field(&name);
        self.rules.remove_field(index);
        self.views.remove(&index);
        info!("removed field {} '{}'", index, name);
        self.revalidate_if_submitted();
        Ok(true)
    }

    pub fn select_field(&mut self, index: FieldIndex) -> Result<()> {
        self.form.select_field(index)
    }

    /// Starts over for another package, asking first when fields would be lost.
    pub fn change_package<F>(&mut self, request: PackageRequest, confirm: F) -> PackageChange
    where
        F: FnOnce(&str) -> bool,
    {
        if self.package.as_ref() == Some(&request) {
            return PackageChange::Unchanged;
        }
        if self.registry.next_index() > 0 {
            let message = "Changing the package selection will remove all custom fields.  \
                           Clear existing custom fields and change package?";
            if !confirm(message) {
                return PackageChange::Declined;
            }
        }
        self.reset();
        info!(
            "package changed to {} / {}",
            request.env, request.sample_type
        );
        self.package = Some(request);
        PackageChange::Reset
    }

    /// Fresh registry and empty form; the study name is kept.
    pub fn reset(&mut self) {
        let study_name = std::mem::take(&mut self.form.study_name);
        self.registry = FieldRegistry::with_reserved_suffixes(self.settings.reserved_suffixes.clone());
        self.registry.set_reserved_words(&self.settings.reserved_words);
        self.form.clear();
        self.form.study_name = study_name;
        self.rules.clear();
        self.views.clear();
        self.submitted = false;
        self.last_report = None;
        self.package = None;
        self.field_descriptions.clear();
    }

    pub fn apply_package_response(&mut self, response: &PackageResponse) {
        self.registry.set_reserved_words(&response.reserved_words);
        self.registry.set_package_fields(&response.field_names);
        self.field_descriptions = response.field_descriptions.clone();
        info!(
            "package applied: {} fields, {} reserved words",
            response.field_names.len(),
            self.registry.reserved_words().len()
        );
    }

    /// Records accepted files, loads any returned fields, and hands back the
    /// per-file error messages.
    pub fn apply_upload_response(&mut self, response: &UploadResponse) -> Result<Vec<String>> {
        let mut errors = Vec::new();
        for file in &response.files {
            match &file.error {
                None => self.registry.record_uploaded_file(&file.name),
                Some(error) => {
                    warn!("upload of '{}' rejected: {}", file.name, error);
                    errors.push(error.clone());
                }
            }
        }
        if let Some(fields) = &response.fields {
            let added = self.load(fields)?;
            info!("upload added {} field(s)", added.len());
        }
        Ok(errors)
    }

    pub fn validate(&self) -> ValidationReport {
        self.rules.validate(&self.form, &self.registry)
    }

    pub fn submit(&mut self) -> SubmitOutcome {
        let report = self.validate();
        if !report.is_valid() {
            self.submitted = true;
            self.last_report = Some(report.clone());
            return SubmitOutcome::Rejected(report);
        }
        self.last_report = None;
        SubmitOutcome::Accepted(self.collect())
    }

    /// Enabled, non-blank values of every field; no validation.
    pub fn collect(&self) -> Submission {
        Submission {
            study_name: self.form.study_name.trim().to_string(),
            package: self.package.clone(),
            package_fields: self.registry.package_fields().iter().cloned().collect(),
            fields: self
                .form
                .fields()
                .map(|panel| (panel.index, panel.collect()))
                .collect(),
        }
    }

    fn revalidate_if_submitted(&mut self) {
        if self.submitted {
            self.last_report = Some(self.validate());
        }
    }

    /// Change handler dispatch.
    fn on_change(&mut self, index: FieldIndex, attribute: Attribute) -> Result<()> {
        let view = *self.view(index)?;
        let panel = self.form.field(index)?;
        match attribute {
            Attribute::FieldType => {
                let raw = panel.value(Attribute::FieldType);
                let field_type = FieldType::from_value(raw)
                    .ok_or_else(|| WizardError::invalid_value(attribute.name(), raw))?;
                let next = apply_field_type_change(&view, field_type, &self.display);
                self.apply_view(index, next)?;
            }
            Attribute::DataType => {
                let data_type = DataType::from_value(panel.value(Attribute::DataType));
                let next = apply_data_type_change(&view, data_type, &self.display);
                self.apply_view(index, next)?;
            }
            Attribute::DefaultValue => {
                let raw = panel.value(Attribute::DefaultValue);
                let option = DefaultOption::from_value(raw)
                    .ok_or_else(|| WizardError::invalid_value(attribute.name(), raw))?;
                let next = apply_default_option_change(&view, option, &self.display);
                self.apply_view(index, next)?;
            }
            Attribute::IsUnitless => {
                let is_unitless = panel.is_checked(Attribute::IsUnitless);
                let next = apply_unitless_change(&view, is_unitless, &self.display);
                self.apply_view(index, next)?;
            }
            Attribute::AllowedMissingVals => self.refresh_missing_defaults(index)?,
            Attribute::TrueValue | Attribute::FalseValue => self.refresh_boolean_defaults(index)?,
            Attribute::CategoricalValues => self.refresh_categorical_defaults(index)?,
            _ => {}
        }
        self.revalidate_if_submitted();
        Ok(())
    }

    /// Moves a field to `next`, applying the presentation diff. The selects the
    /// view tracks are always written back so the form cannot drift from it.
    fn apply_view(&mut self, index: FieldIndex, next: FieldView) -> Result<()> {
        let previous = *self.view(index)?;
        let mut changes = Presentation::diff(
            &Presentation::of(&previous, &self.display),
            &Presentation::of(&next, &self.display),
        );
        changes.push(DisplayChange::SetValue {
            attribute: Attribute::DataType,
            value: next.data_type.map(|t| t.as_str()).unwrap_or_default().to_string(),
        });
        changes.push(DisplayChange::SetValue {
            attribute: Attribute::DefaultValue,
            value: next.default_option.as_str().to_string(),
        });
        self.form.field_mut(index)?.apply(&changes)?;
        if previous.data_type != next.data_type {
            self.rules.update_type_rules(index, next.data_type);
        }
        self.views.insert(index, next);
        debug!("field {} view {:?}", index, next);
        Ok(())
    }

    /// Missing-value default options follow the checked missing values.
    fn refresh_missing_defaults(&mut self, index: FieldIndex) -> Result<()> {
        let panel = self.form.field_mut(index)?;
        let checked = panel.control(Attribute::AllowedMissingVals)?.checked.clone();
        let select = panel.control_mut(Attribute::AllowedMissingDefaultSelect)?;
        for choice in select.choices.iter_mut().filter(|c| !c.value.is_empty()) {
            choice.enabled = checked.contains(&choice.value);
        }
        if !select.choice_enabled(&select.value) {
            select.value.clear();
        }
        Ok(())
    }

    /// Boolean default options: the true value, then the false value, blanks left out.
    fn refresh_boolean_defaults(&mut self, index: FieldIndex) -> Result<()> {
        let panel = self.form.field_mut(index)?;
        let values: Vec<String> = [Attribute::TrueValue, Attribute::FalseValue]
            .iter()
            .map(|attribute| panel.value(*attribute).to_string())
            .filter(|value| !value.is_empty())
            .collect();
        panel
            .control_mut(Attribute::BooleanDefaultSelect)?
            .replace_choices(choices_with_placeholder(&values));
        Ok(())
    }

    fn refresh_categorical_defaults(&mut self, index: FieldIndex) -> Result<()> {
        let panel = self.form.field_mut(index)?;
        let categories = values_from_multiline(panel.value(Attribute::CategoricalValues));
        panel
            .control_mut(Attribute::CategoricalDefaultSelect)?
            .replace_choices(choices_with_placeholder(&categories));
        Ok(())
    }
}

fn choices_with_placeholder(values: &[String]) -> Vec<Choice> {
    std::iter::once(Choice {
        value: String::new(),
        label: PLACEHOLDER_LABEL.to_string(),
        enabled: true,
    })
    .chain(values.iter().map(|value| Choice {
        value: value.clone(),
        label: value.clone(),
        enabled: true,
    }))
    .collect()
}
