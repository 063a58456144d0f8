use super::text_header;
use crate::{ExportOptions, ReportRow, ScoreSummary};
use fr_core::{Error, Result};
use rust_xlsxwriter::{Format, Workbook, XlsxError};

/// Excel cells hold at most 32,767 UTF-16 code units; bodies are cut well below that.
pub const MAX_CELL_UTF16: usize = 30_000;
pub const CELL_TRUNCATION_MARKER: &str = "... [truncated]";

fn xlsx_error(e: XlsxError) -> Error {
    Error::Export(format!("xlsx: {}", e))
}

/// Longest prefix of `text` that fits in `max_units` UTF-16 code units.
fn truncate_utf16(text: &str, max_units: usize) -> (&str, bool) {
    let mut units = 0;
    for (idx, ch) in text.char_indices() {
        units += ch.len_utf16();
        if units > max_units {
            return (&text[..idx], true);
        }
    }
    (text, false)
}

fn cell_text(text: &str) -> String {
    match truncate_utf16(text, MAX_CELL_UTF16) {
        (cut, true) => format!("{}{}", cut, CELL_TRUNCATION_MARKER),
        (whole, false) => whole.to_string(),
    }
}

pub fn render(rows: &[ReportRow], options: &ExportOptions) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    let headers = [
        ("Relevance Score", 10.0),
        ("Title", 50.0),
        ("Link", 40.0),
        ("Alert Name", 18.0),
        ("Explanation", 60.0),
        ("Site Name", 18.0),
        ("Byline", 18.0),
        ("Published", 20.0),
        (text_header(options), 80.0),
    ];

    let articles = workbook.add_worksheet();
    articles.set_name("Articles").map_err(xlsx_error)?;
    for (col, (header, width)) in headers.iter().enumerate() {
        let col = col as u16;
        articles
            .write_string_with_format(0, col, *header, &bold)
            .map_err(xlsx_error)?;
        articles.set_column_width(col, *width).map_err(xlsx_error)?;
    }

    for (i, row) in rows.iter().enumerate() {
        let r = i as u32 + 1;
        articles.write_number(r, 0, row.relevance_score).map_err(xlsx_error)?;
        let cells = [
            cell_text(&row.title),
            cell_text(&row.url),
            cell_text(&row.source_label),
            cell_text(&row.explanation),
            row.site_name.as_deref().map(cell_text).unwrap_or_default(),
            row.byline.as_deref().map(cell_text).unwrap_or_default(),
            row.published.clone().unwrap_or_default(),
            cell_text(&row.text),
        ];
        for (offset, value) in cells.iter().enumerate() {
            articles
                .write_string(r, offset as u16 + 1, value.as_str())
                .map_err(xlsx_error)?;
        }
    }
    articles.set_freeze_panes(1, 0).map_err(xlsx_error)?;

    let summary = ScoreSummary::from_rows(rows);
    let sheet = workbook.add_worksheet();
    sheet.set_name("Summary").map_err(xlsx_error)?;
    sheet.set_column_width(0, 28.0).map_err(xlsx_error)?;
    sheet.write_string_with_format(0, 0, "Metric", &bold).map_err(xlsx_error)?;
    sheet.write_string_with_format(0, 1, "Value", &bold).map_err(xlsx_error)?;

    let metrics = [
        ("Articles", summary.count as f64),
        ("Mean relevance score", (summary.mean * 10.0).round() / 10.0),
        ("Score >= 80", summary.at_least_80 as f64),
        ("Score >= 60", summary.at_least_60 as f64),
        ("Score >= 40", summary.at_least_40 as f64),
        ("Score >= 20", summary.at_least_20 as f64),
    ];
    for (i, (label, value)) in metrics.iter().enumerate() {
        let r = i as u32 + 1;
        sheet.write_string(r, 0, *label).map_err(xlsx_error)?;
        sheet.write_number(r, 1, *value).map_err(xlsx_error)?;
    }

    workbook.save_to_buffer().map_err(xlsx_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_text_truncates_long_bodies() {
        let long = "a".repeat(MAX_CELL_UTF16 + 10);
        let cell = cell_text(&long);
        assert!(cell.ends_with(CELL_TRUNCATION_MARKER));
        assert_eq!(cell.chars().count(), MAX_CELL_UTF16 + CELL_TRUNCATION_MARKER.len());
        assert_eq!(cell_text("short"), "short");
    }

    #[test]
    fn test_cell_limit_counts_utf16_units() {
        // Each emoji is one char but two UTF-16 units.
        let emoji = "\u{1F4F0}".repeat(MAX_CELL_UTF16 / 2 + 5);
        let cell = cell_text(&emoji);
        let body = cell.strip_suffix(CELL_TRUNCATION_MARKER).unwrap();
        assert_eq!(body.encode_utf16().count(), MAX_CELL_UTF16);

        let (cut, truncated) = truncate_utf16("ab\u{1F4F0}", 3);
        assert_eq!((cut, truncated), ("ab", true));
    }
}
