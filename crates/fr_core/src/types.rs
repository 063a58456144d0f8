use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A link to an article as it arrives from a feed or an input file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleLink {
    pub source_label: String,
    pub title: String,
    pub url: String,
}

impl ArticleLink {
    pub fn new(source_label: impl Into<String>, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            source_label: source_label.into(),
            title: title.into(),
            url: url.into(),
        }
    }
}

/// Best-effort page metadata picked up while scraping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub byline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapedArticle {
    #[serde(flatten)]
    pub link: ArticleLink,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extraction_error: Option<String>,
    #[serde(default)]
    pub metadata: ArticleMetadata,
}

impl ScrapedArticle {
    pub fn new(link: ArticleLink, content: impl Into<String>) -> Self {
        Self {
            link,
            content: content.into(),
            extraction_error: None,
            metadata: ArticleMetadata::default(),
        }
    }

    pub fn failed(link: ArticleLink, error: impl Into<String>) -> Self {
        Self {
            link,
            content: String::new(),
            extraction_error: Some(error.into()),
            metadata: ArticleMetadata::default(),
        }
    }

    pub fn url(&self) -> &str {
        &self.link.url
    }

    pub fn title(&self) -> &str {
        &self.link.title
    }

    /// Excerpt from metadata, or the leading `max_chars` of the body.
    pub fn excerpt(&self, max_chars: usize) -> String {
        match &self.metadata.excerpt {
            Some(excerpt) if !excerpt.is_empty() => excerpt.clone(),
            _ => truncate_chars(&self.content, max_chars).0.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzedArticle {
    #[serde(flatten)]
    pub article: ScrapedArticle,
    pub relevance_score: u8,
    pub relevance_explanation: String,
}

impl AnalyzedArticle {
    pub fn new(article: ScrapedArticle, score: i64, explanation: impl Into<String>) -> Self {
        Self {
            article,
            relevance_score: clamp_score(score),
            relevance_explanation: explanation.into(),
        }
    }

    pub fn url(&self) -> &str {
        self.article.url()
    }

    pub fn title(&self) -> &str {
        self.article.title()
    }
}

pub const MAX_SCORE: u8 = 100;

/// Column order of the scraped-articles CSV, shared by its writer and reader.
pub const SCRAPED_CSV_HEADERS: [&str; 9] = [
    "Alert Name",
    "Title",
    "Link",
    "Content",
    "Extraction Error",
    "Byline",
    "Site Name",
    "Published",
    "Excerpt",
];

/// Column order of the article-link CSV produced in feed mode.
pub const LINK_CSV_HEADERS: [&str; 3] = ["Alert Name", "Title", "Link"];

pub fn clamp_score(score: i64) -> u8 {
    score.clamp(0, MAX_SCORE as i64) as u8
}

/// Cuts `text` to at most `max_chars` characters on a char boundary.
/// Returns the slice and whether anything was cut.
pub fn truncate_chars(text: &str, max_chars: usize) -> (&str, bool) {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => (&text[..idx], true),
        None => (text, false),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    #[value(alias = "excel")]
    Xlsx,
    Json,
    #[value(alias = "md")]
    Markdown,
    Html,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Json => "json",
            ExportFormat::Markdown => "md",
            ExportFormat::Html => "html",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Json => "json",
            ExportFormat::Markdown => "markdown",
            ExportFormat::Html => "html",
        };
        f.write_str(name)
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "xlsx" | "excel" => Ok(ExportFormat::Xlsx),
            "json" => Ok(ExportFormat::Json),
            "markdown" | "md" => Ok(ExportFormat::Markdown),
            "html" => Ok(ExportFormat::Html),
            other => Err(format!("Unknown export format: {}", other)),
        }
    }
}
