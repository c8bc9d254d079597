use std::error::Error;

use crate::config::SAMPLE_NAME_HEADER;
use crate::field::{Attribute, FieldValue};
use crate::wizard::Submission;

/// Sheet holding the empty metadata grid.
pub const METADATA_SHEET_NAME: &str = "metadata";
/// Sheet holding the field descriptions, one row per field.
pub const SCHEMA_SHEET_NAME: &str = "metadata_schema";
/// Sheet whose cell A1 holds the serialized wizard form.
pub const FORM_SHEET_NAME: &str = "metadata_form";

/// Column headers of the metadata grid
///
/// The sample name column comes first, then the package fields, then the
/// custom fields in the order they were added.
///
/// # Arguments
/// * `submission` - The accepted wizard submission
///
/// # Returns
/// * `Vec<String>` - One header per column
pub fn header_row(submission: &Submission) -> Vec<String> {
    let mut headers = vec![SAMPLE_NAME_HEADER.to_string()];
    for name in submission
        .package_fields
        .iter()
        .cloned()
        .chain(submission.custom_field_names())
    {
        if !headers.contains(&name) {
            headers.push(name);
        }
    }
    headers
}

/// Rows of the schema sheet: a header of attribute names, then one row per
/// custom field with list values joined by `"; "`.
pub fn schema_rows(submission: &Submission) -> Vec<Vec<String>> {
    let attributes: Vec<Attribute> = Attribute::ALL
        .iter()
        .copied()
        .filter(|attribute| *attribute != Attribute::RemoveField)
        .collect();
    let mut rows = vec![attributes.iter().map(|a| a.name().to_string()).collect()];
    for definition in submission.fields.values() {
        rows.push(
            attributes
                .iter()
                .map(|attribute| match definition.get(*attribute) {
                    Some(FieldValue::Scalar(value)) => value.clone(),
                    Some(FieldValue::List(values)) => values.join("; "),
                    None => String::new(),
                })
                .collect(),
        );
    }
    rows
}

fn push_csv_value(csv_content: &mut String, value: &str) {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        let escaped = value.replace('"', "\"\"");
        csv_content.push_str(&format!("\"{}\"", escaped));
    } else {
        csv_content.push_str(value);
    }
}

/// Convert a submission to a CSV metadata template
///
/// The result holds the single header row of the metadata grid; special
/// characters (commas, quotes, newlines) are escaped.
///
/// # Arguments
/// * `submission` - The accepted wizard submission
///
/// # Returns
/// * `Result<String, Box<dyn Error>>` - CSV content as a string or an error
///
/// # Examples
/// ```
/// use metawiz::downloader::to_csv;
/// use metawiz::wizard::Submission;
///
/// let submission = Submission::default();
/// assert_eq!(to_csv(&submission).unwrap(), "sample_name\n");
/// ```
pub fn to_csv(submission: &Submission) -> Result<String, Box<dyn Error>> {
    let mut csv_content = String::new();
    for (i, header) in header_row(submission).iter().enumerate() {
        if i > 0 {
            csv_content.push(',');
        }
        push_csv_value(&mut csv_content, header);
    }
    csv_content.push('\n');
    Ok(csv_content)
}

/// Convert the field descriptions of a submission to CSV
pub fn schema_to_csv(submission: &Submission) -> Result<String, Box<dyn Error>> {
    let mut csv_content = String::new();
    for row in schema_rows(submission) {
        for (i, value) in row.iter().enumerate() {
            if i > 0 {
                csv_content.push(',');
            }
            push_csv_value(&mut csv_content, value);
        }
        csv_content.push('\n');
    }
    Ok(csv_content)
}

/// Convert a submission to an XLSX metadata template
///
/// The workbook holds three sheets: the metadata grid header, the field
/// schema, and the serialized form in cell A1 of the form sheet, which lets
/// the file be read back by the wizard.
///
/// # Arguments
/// * `submission` - The accepted wizard submission
///
/// # Returns
/// * `Result<Vec<u8>, Box<dyn Error>>` - XLSX file content as bytes or an error
///
/// # Examples
/// ```no_run
/// use metawiz::downloader::to_xlsx;
/// use metawiz::wizard::Submission;
///
/// match to_xlsx(&Submission::default()) {
///     Ok(xlsx_data) => println!("XLSX generated: {} bytes", xlsx_data.len()),
///     Err(e) => eprintln!("Failed to generate XLSX: {}", e),
/// }
/// ```
#[cfg(feature = "web")]
pub fn to_xlsx(submission: &Submission) -> Result<Vec<u8>, Box<dyn Error>> {
    use rust_xlsxwriter::{Workbook, Worksheet};

    let mut workbook = Workbook::new();

    let mut metadata = Worksheet::new();
    metadata.set_name(METADATA_SHEET_NAME)?;
    for (c, header) in header_row(submission).iter().enumerate() {
        metadata.write_string(0, c as u16, header.as_str())?;
    }
    workbook.push_worksheet(metadata);

    let mut schema = Worksheet::new();
    schema.set_name(SCHEMA_SHEET_NAME)?;
    for (r, row) in schema_rows(submission).iter().enumerate() {
        for (c, value) in row.iter().enumerate() {
            schema.write_string(r as u32, c as u16, value.as_str())?;
        }
    }
    workbook.push_worksheet(schema);

    let mut form = Worksheet::new();
    form.set_name(FORM_SHEET_NAME)?;
    form.write_string(0, 0, serde_json::to_string(submission)?.as_str())?;
    workbook.push_worksheet(form);

    let buffer = workbook.save_to_buffer()?;
    Ok(buffer)
}
