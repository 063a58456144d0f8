use crate::{ExportOptions, ReportRow, ScoreSummary};
use chrono::Utc;

fn escape_inline(text: &str) -> String {
    text.replace('[', "\\[").replace(']', "\\]").replace('\n', " ")
}

/// Percent-encodes the characters that would end or split a link destination.
fn escape_destination(url: &str) -> String {
    let mut out = String::with_capacity(url.len());
    for ch in url.chars() {
        match ch {
            ' ' => out.push_str("%20"),
            '(' => out.push_str("%28"),
            ')' => out.push_str("%29"),
            '<' => out.push_str("%3C"),
            '>' => out.push_str("%3E"),
            '\r' | '\n' => {}
            _ => out.push(ch),
        }
    }
    out
}

pub fn render(rows: &[ReportRow], options: &ExportOptions) -> String {
    let summary = ScoreSummary::from_rows(rows);
    let mut out = String::new();

    out.push_str("# Article relevance report\n\n");
    out.push_str(&format!("Generated {}\n\n", Utc::now().format("%Y-%m-%d %H:%M UTC")));
    out.push_str(&format!(
        "{} articles with score >= {} (mean {:.1}; {} at 80+, {} at 60+)\n\n",
        summary.count, options.min_relevance_score, summary.mean, summary.at_least_80, summary.at_least_60
    ));

    for (i, row) in rows.iter().enumerate() {
        out.push_str(&format!(
            "## {}. [{}]({}) ({}/100)\n\n",
            i + 1,
            escape_inline(&row.title),
            escape_destination(&row.url),
            row.relevance_score
        ));

        let mut source = row.source_label.clone();
        if let Some(site) = &row.site_name {
            source = format!("{} / {}", source, site);
        }
        out.push_str(&format!("- **Source:** {}\n", source));
        if let Some(byline) = &row.byline {
            out.push_str(&format!("- **Byline:** {}\n", byline));
        }
        if let Some(published) = &row.published {
            out.push_str(&format!("- **Published:** {}\n", published));
        }
        out.push_str(&format!("- **Why:** {}\n", row.explanation.replace('\n', " ")));
        if let Some(error) = &row.extraction_error {
            out.push_str(&format!("- **Extraction error:** {}\n", error));
        }
        out.push('\n');

        if !row.text.trim().is_empty() {
            for line in row.text.lines() {
                out.push_str("> ");
                out.push_str(line);
                out.push('\n');
            }
            out.push('\n');
        }
    }

    out
}
