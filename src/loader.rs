use log::{debug, warn};
use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::field::{FieldDefinition, FieldIndex, FieldItems};
use crate::wizard::Wizard;

/// Load fields into a wizard session
///
/// Each new name is registered, a field is instantiated for it at the next
/// index and decorated with its validation rules. For definitions, the
/// attributes are then assigned in template declaration order, firing the
/// same change handlers a user edit would, so interdependent controls end up
/// consistent. Blank and already registered names are skipped without using
/// up an index.
///
/// The first failed assignment ends the batch: the field it failed on and
/// those before it stay in the form and selector, the remaining items are not
/// loaded, and the error is returned.
///
/// # Arguments
/// * `wizard` - The session to load into
/// * `items` - Bare field names, or full field definitions
///
/// # Returns
/// * `Result<Vec<FieldIndex>>` - Indexes of the fields that were added
///
/// # Examples
/// ```no_run
/// use metawiz::config::WizardSettings;
/// use metawiz::field::FieldItems;
/// use metawiz::loader::load_fields;
/// use metawiz::wizard::Wizard;
///
/// let mut wizard = Wizard::new(WizardSettings::default()).unwrap();
/// let items = FieldItems::Names(vec!["weight".to_string(), "height".to_string()]);
/// let added = load_fields(&mut wizard, &items).unwrap();
/// assert_eq!(added, vec![0, 1]);
/// ```
pub fn load_fields(wizard: &mut Wizard, items: &FieldItems) -> Result<Vec<FieldIndex>> {
    if items.is_empty() {
        return Ok(Vec::new());
    }

    let entries: Vec<(String, Option<&FieldDefinition>)> = match items {
        FieldItems::Names(names) => names.iter().map(|name| (name.clone(), None)).collect(),
        FieldItems::Definitions(definitions) => definitions
            .iter()
            .map(|definition| {
                let name = definition.field_name().unwrap_or_default().to_string();
                (name, Some(definition))
            })
            .collect(),
    };

    let input_order = wizard.template().input_names_in_order();
    let mut added: Vec<(FieldIndex, String)> = Vec::new();
    let mut outcome = Ok(());

    for (name, definition) in entries {
        if name.trim().is_empty() || wizard.registry().has_field(&name) {
            debug!("skipping field '{}'", name);
            continue;
        }

        let index = match wizard.instantiate_field(&name) {
            Ok(index) => index,
            Err(e) => {
                outcome = Err(e);
                break;
            }
        };
        wizard.registry_mut().advance_index();
        added.push((index, name.clone()));

        let definition = match definition {
            Some(definition) => definition,
            None => continue,
        };
        for key in definition.unknown_keys() {
            warn!("field '{}': ignoring unknown attribute '{}'", name, key);
        }
        let assigned = input_order.iter().try_for_each(|attribute| {
            match definition.get(*attribute) {
                Some(value) => wizard.assign(index, *attribute, value),
                None => Ok(()),
            }
        });
        if let Err(e) = assigned {
            outcome = Err(e);
            break;
        }
    }

    let indexes: Vec<FieldIndex> = added.iter().map(|(index, _)| *index).collect();
    if !added.is_empty() {
        debug!("loaded {} field(s)", added.len());
        let form = wizard.form_mut();
        form.append_field_name_options(added);
        form.show_existing_fields();
    }
    outcome.map(|_| indexes)
}

/// Read field names or definitions from a JSON file
///
/// The file holds either an array of names or an array of definition objects.
pub fn read_field_items(filepath: impl AsRef<Path>) -> Result<FieldItems> {
    let text = fs::read_to_string(filepath)?;
    let items: FieldItems = serde_json::from_str(&text)?;
    Ok(items)
}
