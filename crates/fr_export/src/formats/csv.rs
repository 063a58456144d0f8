use super::text_header;
use crate::{ExportOptions, ReportRow};
use fr_core::{Error, Result};

pub fn render(rows: &[ReportRow], options: &ExportOptions) -> Result<Vec<u8>> {
    let mut writer = ::csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "Relevance Score",
        "Title",
        "Link",
        "Alert Name",
        "Explanation",
        "Site Name",
        "Byline",
        "Published",
        text_header(options),
    ])?;

    for row in rows {
        let score = row.relevance_score.to_string();
        writer.write_record([
            score.as_str(),
            row.title.as_str(),
            row.url.as_str(),
            row.source_label.as_str(),
            row.explanation.as_str(),
            row.site_name.as_deref().unwrap_or(""),
            row.byline.as_deref().unwrap_or(""),
            row.published.as_deref().unwrap_or(""),
            row.text.as_str(),
        ])?;
    }

    writer.into_inner().map_err(|e| Error::Export(e.to_string()))
}
