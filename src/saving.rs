use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::error::{Result, WizardError};
use crate::field::FieldItems;
use crate::protocol::{NON_WIZARD_FILE_ERROR_PREFIX, UploadResponse, UploadedFile};
use crate::wizard::Submission;

/// Marks a file as written by this wizard.
pub const WIZARD_FILE_FORMAT: &str = "metawiz";
pub const WIZARD_FILE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct WizardFile {
    format: String,
    version: u32,
    metadata_form: Submission,
}

pub fn save_wizard_file(submission: &Submission, filename: impl AsRef<Path>) -> Result<()> {
    let file = File::create(filename.as_ref())?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut writer = BufWriter::new(encoder);
    write_envelope(submission, &mut writer)?;
    // finish the gzip stream so a failed flush surfaces here
    let encoder = writer.into_inner().map_err(|e| e.into_error())?;
    encoder.finish()?;
    info!("saved wizard file {}", filename.as_ref().display());
    Ok(())
}

pub fn load_wizard_file(filename: impl AsRef<Path>) -> Result<Submission> {
    let file = File::open(filename)?;
    let reader = BufReader::new(GzDecoder::new(file));
    read_envelope(reader)
}

pub fn to_bytes(submission: &Submission) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    write_envelope(submission, &mut encoder)?;
    Ok(encoder.finish()?)
}

pub fn from_bytes(bytes: &[u8]) -> Result<Submission> {
    read_envelope(GzDecoder::new(bytes))
}

fn write_envelope<W: Write>(submission: &Submission, writer: &mut W) -> Result<()> {
    let envelope = WizardFile {
        format: WIZARD_FILE_FORMAT.to_string(),
        version: WIZARD_FILE_VERSION,
        metadata_form: submission.clone(),
    };
    serde_json::to_writer(&mut *writer, &envelope)?;
    writer.flush()?;
    Ok(())
}

fn read_envelope<R: Read>(mut reader: R) -> Result<Submission> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    let envelope: WizardFile = serde_json::from_str(&text)?;
    if envelope.format != WIZARD_FILE_FORMAT {
        return Err(WizardError::config(format!(
            "unexpected file format '{}'",
            envelope.format
        )));
    }
    if envelope.version > WIZARD_FILE_VERSION {
        return Err(WizardError::config(format!(
            "wizard file version {} is newer than supported version {}",
            envelope.version, WIZARD_FILE_VERSION
        )));
    }
    Ok(envelope.metadata_form)
}

/// Read the form back out of an XLSX template written by `to_xlsx`
///
/// The serialized submission sits in cell A1 of the form sheet. Workbooks
/// without that sheet, or with anything else in A1, are refused.
///
/// # Arguments
/// * `bytes` - Content of the uploaded workbook
///
/// # Returns
/// * `Result<Submission>` - The submission stored in the workbook or an error
#[cfg(feature = "web")]
pub fn from_xlsx_bytes(bytes: &[u8]) -> Result<Submission> {
    use crate::downloader::FORM_SHEET_NAME;
    use calamine::{Data, Reader, Xlsx};
    use std::io::Cursor;

    let mut workbook: Xlsx<_> =
        Xlsx::new(Cursor::new(bytes)).map_err(|e| WizardError::config(e.to_string()))?;
    let range = workbook
        .worksheet_range(FORM_SHEET_NAME)
        .map_err(|e| WizardError::config(e.to_string()))?;
    match range.get_value((0, 0)) {
        Some(Data::String(text)) => Ok(serde_json::from_str(text)?),
        _ => Err(WizardError::config(format!(
            "no serialized form in sheet '{}'",
            FORM_SHEET_NAME
        ))),
    }
}

// Gzip wizard files first, then XLSX templates when they can be read.
fn read_uploaded(bytes: &[u8]) -> Result<Submission> {
    match from_bytes(bytes) {
        Ok(submission) => Ok(submission),
        #[cfg(feature = "web")]
        Err(_) => from_xlsx_bytes(bytes),
        #[cfg(not(feature = "web"))]
        Err(e) => Err(e),
    }
}

/// Builds the upload reply for a batch of uploaded files
///
/// Every file that decodes as a wizard file, or (with the `web` feature) as
/// an XLSX template this wizard wrote, is accepted and contributes its field
/// definitions; every other file is reported back with an error and
/// contributes nothing.
pub fn upload_response(files: &[(String, Vec<u8>)]) -> UploadResponse {
    let mut response = UploadResponse::default();
    let mut definitions = Vec::new();
    for (name, bytes) in files {
        match read_uploaded(bytes) {
            Ok(submission) => {
                definitions.extend(submission.field_definitions());
                response.files.push(UploadedFile::accepted(name));
            }
            Err(e) => {
                warn!("'{}' is not a wizard file: {}", name, e);
                response.files.push(UploadedFile::rejected(
                    name,
                    format!("{}'{}'.", NON_WIZARD_FILE_ERROR_PREFIX, name),
                ));
            }
        }
    }
    if !definitions.is_empty() {
        response.fields = Some(FieldItems::Definitions(definitions));
    }
    response
}
