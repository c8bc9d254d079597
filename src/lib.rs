/*!
# Metadata Wizard

A field engine for building metadata templates, built in Rust.

## Overview

A user names a study, optionally picks a metadata package (an environment and
sample type whose standard fields come with it), and adds custom fields. Each
field is described through a per-field panel: its type, data type, allowed
missing values, default value, units and the like. Which parts of the panel
are shown depends on the answers already given, and every input is checked
against validation rules that follow the field's data type. An accepted form
is exported as a CSV or XLSX metadata template, or saved as a wizard file that
can be uploaded again later to restore the fields.

## Architecture

### Engine Layer
- **Field Template** - One declared panel of controls, cloned per field with
  index-bearing identifiers
- **Field Registry** - Names in use, package fields, reserved words and
  suffixes, and the next field index
- **Display Logic** - Pure reducers from a field's answers to the groups,
  controls and options that should be visible and enabled
- **Rule Book** - Validation rules bound per control, retargeted when a
  field's data type changes
- **Loader** - Bulk creation of fields from names or full definitions,
  replaying the same change handlers a user edit fires

### Interface Layer
- **Web Server** - axum routes over one shared wizard session (feature `web`)
- **Command Line** - An interactive session on stdin/stdout
- **Browser Binding** - A JSON-in, JSON-out session for wasm (feature `wasm`)

### Data Persistence Layer
- Wizard files: gzip-compressed JSON carrying the accepted form
- CSV and XLSX metadata templates

## Modules

- **identifier**: Element identifiers, template identifiers and index extraction
- **field**: Field, data and default types, control attributes and field definitions
- **registry**: Field names and index bookkeeping for one session
- **config**: Settings file, packages and environment lookups
- **template**: The field template and its per-index instantiation
- **display**: Group visibility and control enablement
- **form**: Live form state: study name, field panels and the field selector
- **validation**: Validators, the rule book and validation reports
- **protocol**: Package and upload request and reply shapes
- **loader**: Bulk field loading
- **wizard**: A whole session and its change handlers
- **saving**: Wizard file persistence with compression
- **downloader**: Export functionality (CSV, XLSX)
- **app**: Routing and handlers
- **wasm**: Browser binding

## REST API Endpoints

- `GET /api/form` - Current form, presentations and validation report
- `POST /api/study_name` - Sets the study name
- `POST /api/fields` - Adds fields from a newline-separated name list
- `POST /api/field/{index}/value`, `/check` - Edits one control
- `POST /api/field/{index}/remove`, `/select` - Removes or selects a field
- `POST /api/package` - Chooses a package
- `POST /api/upload` - Uploads wizard files
- `POST /api/submit` - Validates the form
- `GET /api/download/{csv,xlsx,wizard}` - Exports an accepted form
*/

pub mod config;
pub mod display;
pub mod downloader;
pub mod error;
pub mod field;
pub mod form;
pub mod identifier;
pub mod loader;
pub mod protocol;
pub mod registry;
pub mod saving;
pub mod template;
pub mod validation;
pub mod wizard;

#[cfg(feature = "web")]
pub mod app;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use config::WizardSettings;
pub use error::{Result, WizardError};
pub use field::{Attribute, DataType, DefaultOption, FieldDefinition, FieldIndex, FieldItems, FieldType};
pub use registry::FieldRegistry;
pub use validation::ValidationReport;
pub use wizard::{Submission, SubmitOutcome, Wizard};
