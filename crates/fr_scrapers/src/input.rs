//! Readers for the operator's input files.

use crate::feeds::FeedSource;
use fr_core::{ArticleLink, ArticleMetadata, Error, Result, ScrapedArticle};
use std::path::Path;

pub const FEED_URL_HEADER: &str = "feed url";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputFile {
    /// `Alert Name | Title | Link`
    Articles(Vec<ArticleLink>),
    /// `Feed URL | Alert Name`
    Feeds(Vec<FeedSource>),
}

struct Columns {
    headers: Vec<String>,
}

impl Columns {
    fn new(headers: &csv::StringRecord) -> Self {
        Self {
            headers: headers.iter().map(|h| h.trim().to_lowercase()).collect(),
        }
    }

    fn index(&self, names: &[&str]) -> Option<usize> {
        self.headers.iter().position(|h| names.contains(&h.as_str()))
    }

    fn get<'r>(record: &'r csv::StringRecord, index: Option<usize>) -> &'r str {
        index.and_then(|i| record.get(i)).map(str::trim).unwrap_or("")
    }
}

/// Reads an input CSV, picking feed mode when a `Feed URL` column is present.
/// Rows without a URL are skipped.
pub fn read_input(path: &Path) -> Result<InputFile> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let columns = Columns::new(reader.headers()?);
    let label = columns.index(&["alert name", "source", "label"]);

    if let Some(feed_url) = columns.index(&[FEED_URL_HEADER]) {
        let mut feeds = Vec::new();
        for record in reader.records() {
            let record = record?;
            let url = Columns::get(&record, Some(feed_url));
            if !url.is_empty() {
                feeds.push(FeedSource::new(url, Columns::get(&record, label)));
            }
        }
        return Ok(InputFile::Feeds(feeds));
    }

    let link = columns.index(&["link", "url"]).ok_or_else(|| {
        Error::Config(format!(
            "{} has neither a 'Feed URL' nor a 'Link' column",
            path.display()
        ))
    })?;
    let title = columns.index(&["title"]);

    let mut links = Vec::new();
    for record in reader.records() {
        let record = record?;
        let url = Columns::get(&record, Some(link));
        if !url.is_empty() {
            links.push(ArticleLink::new(
                Columns::get(&record, label),
                Columns::get(&record, title),
                url,
            ));
        }
    }
    Ok(InputFile::Articles(links))
}

/// Loads previously scraped articles from a `.json` array or a scraped-articles CSV.
pub fn read_scraped_articles(path: &Path) -> Result<Vec<ScrapedArticle>> {
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if is_json {
        let raw = std::fs::read_to_string(path)?;
        return Ok(serde_json::from_str(&raw)?);
    }

    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let columns = Columns::new(reader.headers()?);
    let label = columns.index(&["alert name", "source", "label"]);
    let title = columns.index(&["title"]);
    let link = columns.index(&["link", "url"]);
    let content = columns.index(&["content"]);
    let error = columns.index(&["extraction error"]);
    let byline = columns.index(&["byline"]);
    let site_name = columns.index(&["site name"]);
    let published = columns.index(&["published"]);
    let excerpt = columns.index(&["excerpt"]);

    let optional = |value: &str| (!value.is_empty()).then(|| value.to_string());

    let mut articles = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut article = ScrapedArticle::new(
            ArticleLink::new(
                Columns::get(&record, label),
                Columns::get(&record, title),
                Columns::get(&record, link),
            ),
            Columns::get(&record, content),
        );
        article.extraction_error = optional(Columns::get(&record, error));
        article.metadata = ArticleMetadata {
            byline: optional(Columns::get(&record, byline)),
            site_name: optional(Columns::get(&record, site_name)),
            published: optional(Columns::get(&record, published)),
            excerpt: optional(Columns::get(&record, excerpt)),
        };
        articles.push(article);
    }
    Ok(articles)
}

/// Reads the rubric; an empty file is a configuration error.
pub fn read_rubric(path: &Path) -> Result<String> {
    let rubric = std::fs::read_to_string(path)?;
    let rubric = rubric.trim();
    if rubric.is_empty() {
        return Err(Error::Config(format!("Rubric file {} is empty", path.display())));
    }
    Ok(rubric.to_string())
}
