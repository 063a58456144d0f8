//! Report writers for analyzed and scraped articles.

use chrono::Utc;
use fr_core::{AnalyzedArticle, ArticleLink, Error, ExportFormat, Result, ScrapedArticle};
use fr_core::{LINK_CSV_HEADERS, SCRAPED_CSV_HEADERS};
use serde::Serialize;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

pub mod formats;

pub const ANALYZED_PREFIX: &str = "analyzed-articles-";
pub const SCRAPED_PREFIX: &str = "scraped-articles-";
pub const LINKS_PREFIX: &str = "article-links-";

/// Characters of body text shown when full content is not requested.
pub const EXCERPT_CHARS: usize = 300;

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub output_dir: PathBuf,
    pub min_relevance_score: u8,
    pub include_full_content: bool,
}

/// One report line, shared by every format.
#[derive(Debug, Clone, Serialize)]
pub struct ReportRow {
    pub relevance_score: u8,
    pub title: String,
    pub url: String,
    pub source_label: String,
    pub explanation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub byline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<String>,
    /// Full body or excerpt, depending on `include_full_content`.
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extraction_error: Option<String>,
}

impl ReportRow {
    pub fn new(article: &AnalyzedArticle, include_full_content: bool) -> Self {
        let scraped = &article.article;
        let text = if include_full_content {
            scraped.content.clone()
        } else {
            scraped.excerpt(EXCERPT_CHARS)
        };
        Self {
            relevance_score: article.relevance_score,
            title: scraped.title().to_string(),
            url: scraped.url().to_string(),
            source_label: scraped.link.source_label.clone(),
            explanation: article.relevance_explanation.clone(),
            site_name: scraped.metadata.site_name.clone(),
            byline: scraped.metadata.byline.clone(),
            published: scraped.metadata.published.clone(),
            text,
            extraction_error: scraped.extraction_error.clone(),
        }
    }
}

/// Headline numbers for a report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreSummary {
    pub count: usize,
    pub mean: f64,
    pub at_least_80: usize,
    pub at_least_60: usize,
    pub at_least_40: usize,
    pub at_least_20: usize,
}

impl ScoreSummary {
    pub fn from_rows(rows: &[ReportRow]) -> Self {
        let count = rows.len();
        let total: u64 = rows.iter().map(|r| r.relevance_score as u64).sum();
        let at_least = |min: u8| rows.iter().filter(|r| r.relevance_score >= min).count();
        Self {
            count,
            mean: if count == 0 { 0.0 } else { total as f64 / count as f64 },
            at_least_80: at_least(80),
            at_least_60: at_least(60),
            at_least_40: at_least(40),
            at_least_20: at_least(20),
        }
    }
}

/// File-name timestamp with millisecond resolution, e.g. `20240501-101500123`.
pub fn timestamp() -> String {
    Utc::now().format("%Y%m%d-%H%M%S%3f").to_string()
}

/// Writes analyzed articles scoring at least `min_relevance_score` and
/// returns the path of the new report.
pub fn export(articles: &[AnalyzedArticle], format: ExportFormat, options: &ExportOptions) -> Result<PathBuf> {
    let rows: Vec<ReportRow> = articles
        .iter()
        .filter(|a| a.relevance_score >= options.min_relevance_score)
        .map(|a| ReportRow::new(a, options.include_full_content))
        .collect();

    let bytes = formats::render(&rows, format, options)?;
    let path = write_new(&options.output_dir, ANALYZED_PREFIX, format.extension(), &bytes)?;

    info!(
        "💾 Exported {} of {} articles (min score {}) to {}",
        rows.len(),
        articles.len(),
        options.min_relevance_score,
        path.display()
    );
    Ok(path)
}

/// Saves scraped articles so a later run can skip scraping.
pub fn write_scraped(articles: &[ScrapedArticle], dir: &Path) -> Result<PathBuf> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(SCRAPED_CSV_HEADERS)?;
    for article in articles {
        let meta = &article.metadata;
        writer.write_record([
            article.link.source_label.as_str(),
            article.title(),
            article.url(),
            article.content.as_str(),
            article.extraction_error.as_deref().unwrap_or(""),
            meta.byline.as_deref().unwrap_or(""),
            meta.site_name.as_deref().unwrap_or(""),
            meta.published.as_deref().unwrap_or(""),
            meta.excerpt.as_deref().unwrap_or(""),
        ])?;
    }
    let bytes = writer.into_inner().map_err(|e| Error::Export(e.to_string()))?;
    let path = write_new(dir, SCRAPED_PREFIX, "csv", &bytes)?;
    info!("💾 Saved {} scraped articles to {}", articles.len(), path.display());
    Ok(path)
}

/// Saves the links gathered from feeds.
pub fn write_links(links: &[ArticleLink], dir: &Path) -> Result<PathBuf> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(LINK_CSV_HEADERS)?;
    for link in links {
        writer.write_record([link.source_label.as_str(), link.title.as_str(), link.url.as_str()])?;
    }
    let bytes = writer.into_inner().map_err(|e| Error::Export(e.to_string()))?;
    let path = write_new(dir, LINKS_PREFIX, "csv", &bytes)?;
    info!("💾 Saved {} links to {}", links.len(), path.display());
    Ok(path)
}

/// Writes `<prefix><timestamp>.<extension>` into `dir` through a temp file,
/// so a reader never sees a partial report. An existing file is never
/// replaced: a clash gets a `-1`, `-2`, ... suffix instead.
pub fn write_new(dir: &Path, prefix: &str, extension: &str, bytes: &[u8]) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.flush()?;

    let stamp = timestamp();
    let mut suffix = 0u32;
    loop {
        let name = match suffix {
            0 => format!("{}{}.{}", prefix, stamp, extension),
            n => format!("{}{}-{}.{}", prefix, stamp, n, extension),
        };
        let target = dir.join(name);
        match file.persist_noclobber(&target) {
            Ok(_) => return Ok(target),
            Err(e) if e.error.kind() == ErrorKind::AlreadyExists => {
                file = e.file;
                suffix += 1;
            }
            Err(e) => return Err(Error::Io(e.error)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fr_core::ArticleMetadata;
    use tempfile::TempDir;

    pub(crate) fn analyzed(title: &str, score: i64, content: &str) -> AnalyzedArticle {
        let mut article = ScrapedArticle::new(
            ArticleLink::new("alerts", title, format!("https://x.com/{}", title.replace(' ', "-"))),
            content,
        );
        article.metadata = ArticleMetadata {
            site_name: Some("X News".to_string()),
            ..ArticleMetadata::default()
        };
        AnalyzedArticle::new(article, score, format!("explanation for {}", title))
    }

    #[test]
    fn test_summary_buckets() {
        let rows: Vec<ReportRow> = [90, 65, 45, 20, 5]
            .iter()
            .map(|s| ReportRow::new(&analyzed("t", *s, "c"), false))
            .collect();
        let summary = ScoreSummary::from_rows(&rows);
        assert_eq!(summary.count, 5);
        assert_eq!(summary.mean, 45.0);
        assert_eq!(
            (summary.at_least_80, summary.at_least_60, summary.at_least_40, summary.at_least_20),
            (1, 2, 3, 4)
        );
        assert_eq!(ScoreSummary::from_rows(&[]).mean, 0.0);
    }

    #[test]
    fn test_row_uses_excerpt_unless_full_content() {
        let long = "word ".repeat(200);
        let article = analyzed("t", 50, &long);
        assert_eq!(ReportRow::new(&article, false).text.chars().count(), EXCERPT_CHARS);
        assert_eq!(ReportRow::new(&article, true).text, long);
    }

    #[test]
    fn test_write_new_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let path = write_new(dir.path(), "report-", "txt", b"hello").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello");
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_back_to_back_writes_never_overwrite() {
        let dir = TempDir::new().unwrap();
        let paths: Vec<PathBuf> = (0..5)
            .map(|i| write_new(dir.path(), "report-", "txt", format!("run {}", i).as_bytes()).unwrap())
            .collect();

        let mut names: Vec<_> = paths.iter().map(|p| p.file_name().unwrap().to_owned()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 5);
        for (i, path) in paths.iter().enumerate() {
            assert_eq!(std::fs::read_to_string(path).unwrap(), format!("run {}", i));
        }
    }

    #[test]
    fn test_name_clash_gets_suffix() {
        let dir = TempDir::new().unwrap();
        let stamp = timestamp();
        for name in [format!("report-{}.txt", stamp), format!("report-{}-1.txt", stamp)] {
            std::fs::write(dir.path().join(name), "old").unwrap();
        }

        let path = write_new(dir.path(), "report-", "txt", b"new").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 3);
    }

    #[test]
    fn test_write_links_header_and_rows() {
        let dir = TempDir::new().unwrap();
        let links = vec![
            ArticleLink::new("infra", "A, quoted \"title\"", "https://x.com/a"),
            ArticleLink::new("infra", "B", "https://x.com/b"),
        ];
        let path = write_links(&links, dir.path()).unwrap();
        assert!(path.file_name().unwrap().to_str().unwrap().starts_with(LINKS_PREFIX));

        let mut reader = csv::Reader::from_path(&path).unwrap();
        assert_eq!(reader.headers().unwrap(), &csv::StringRecord::from(LINK_CSV_HEADERS.to_vec()));
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][1], "A, quoted \"title\"");
    }
}
