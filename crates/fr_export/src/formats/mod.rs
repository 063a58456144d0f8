use crate::{ExportOptions, ReportRow};
use fr_core::{ExportFormat, Result};

pub mod csv;
pub mod html;
pub mod json;
pub mod markdown;
pub mod xlsx;

pub fn render(rows: &[ReportRow], format: ExportFormat, options: &ExportOptions) -> Result<Vec<u8>> {
    match format {
        ExportFormat::Csv => csv::render(rows, options),
        ExportFormat::Xlsx => xlsx::render(rows, options),
        ExportFormat::Json => json::render(rows),
        ExportFormat::Markdown => Ok(markdown::render(rows, options).into_bytes()),
        ExportFormat::Html => Ok(html::render(rows, options)?.into_bytes()),
    }
}

/// Label of the text column for the current options.
pub(crate) fn text_header(options: &ExportOptions) -> &'static str {
    if options.include_full_content {
        "Content"
    } else {
        "Excerpt"
    }
}
