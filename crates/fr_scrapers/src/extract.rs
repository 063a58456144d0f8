//! Readable-text extraction from article HTML.
//!
//! The primary container is picked from a ranked selector list, then by
//! paragraph density, then `<body>`. Its markup is sanitized to an allow-list
//! with non-content subtrees dropped, and the plain text is what remains once
//! every tag is stripped.

use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};

/// Ranked candidates for the primary content container.
pub const CONTENT_SELECTORS: &[&str] = &[
    "article",
    "main",
    "[role='main']",
    "[itemprop='articleBody']",
    ".post-content",
    ".entry-content",
    ".article-content",
    ".article-body",
    ".story-body",
    ".post-body",
    "#article-body",
    "#content",
    ".content",
];

/// A selector match only counts if it yields at least this much text.
pub const MIN_CONTENT_CHARS: usize = 200;

const SKIPPED_TAGS: &[&str] = &[
    "script", "style", "nav", "aside", "footer", "header", "form", "noscript", "iframe", "svg",
    "button", "template", "object", "embed", "canvas", "select", "input",
];

const ALLOWED_TAGS: &[&str] = &[
    "p", "br", "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol", "li", "blockquote", "pre", "code",
    "em", "strong", "b", "i", "a", "table", "thead", "tbody", "tr", "td", "th", "figcaption",
];

/// Tags that break lines when stripped.
const BLOCK_TAGS: &[&str] = &[
    "p", "br", "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol", "li", "blockquote", "pre", "tr",
    "table", "figcaption", "div", "section", "article", "main", "figure", "dl", "dt", "dd", "hr",
];

const NOISE_MARKERS: &[&str] = &[
    "advert", "sponsor", "promo", "comment", "share", "social", "newsletter", "related", "cookie",
    "popup", "subscribe", "paywall",
];

lazy_static! {
    static ref CONTENT_SELECTOR_LIST: Vec<Selector> = CONTENT_SELECTORS
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .collect();
    static ref PARAGRAPH_PARENTS: Selector = Selector::parse("div, section, td, article, main").unwrap();
    static ref BODY: Selector = Selector::parse("body").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerStrategy {
    Selector(&'static str),
    ParagraphDensity,
    Body,
}

#[derive(Debug, Clone)]
pub struct Extraction {
    pub text: String,
    pub sanitized_html: String,
    pub strategy: ContainerStrategy,
}

pub fn extract_content(document: &Html) -> Extraction {
    for (selector, raw) in CONTENT_SELECTOR_LIST.iter().zip(CONTENT_SELECTORS.iter()) {
        for element in document.select(selector) {
            let extraction = extract_from(element, ContainerStrategy::Selector(raw));
            if extraction.text.chars().count() >= MIN_CONTENT_CHARS {
                return extraction;
            }
        }
    }

    if let Some(element) = densest_paragraph_container(document) {
        let extraction = extract_from(element, ContainerStrategy::ParagraphDensity);
        if !extraction.text.is_empty() {
            return extraction;
        }
    }

    let body = document.select(&BODY).next().unwrap_or_else(|| document.root_element());
    extract_from(body, ContainerStrategy::Body)
}

fn extract_from(element: ElementRef, strategy: ContainerStrategy) -> Extraction {
    let mut sanitized_html = String::new();
    sanitize_element(element, &mut sanitized_html, true);
    let text = strip_tags(&sanitized_html);
    Extraction {
        text,
        sanitized_html,
        strategy,
    }
}

/// The container element with the most direct `<p>` children.
fn densest_paragraph_container(document: &Html) -> Option<ElementRef<'_>> {
    let mut best: Option<(usize, ElementRef)> = None;
    for element in document.select(&PARAGRAPH_PARENTS) {
        let paragraphs = element
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|child| child.value().name() == "p")
            .count();
        if paragraphs > 0 && best.map_or(true, |(count, _)| paragraphs > count) {
            best = Some((paragraphs, element));
        }
    }
    best.map(|(_, element)| element)
}

fn is_noise(element: &ElementRef) -> bool {
    let value = element.value();
    let tokens = value.classes().chain(value.id());
    for token in tokens {
        let token = token.to_lowercase();
        if token == "ad" || token == "ads" || token.starts_with("ad-") || token.starts_with("ads-") {
            return true;
        }
        if NOISE_MARKERS.iter().any(|marker| token.contains(marker)) {
            return true;
        }
    }
    false
}

fn sanitize_element(element: ElementRef, out: &mut String, is_root: bool) {
    let name = element.value().name();
    if SKIPPED_TAGS.contains(&name) || (!is_root && is_noise(&element)) {
        return;
    }

    let allowed = ALLOWED_TAGS.contains(&name);
    let block = BLOCK_TAGS.contains(&name);

    if allowed {
        out.push('<');
        out.push_str(name);
        if name == "a" {
            if let Some(href) = element.value().attr("href") {
                if !href.trim_start().to_lowercase().starts_with("javascript:") {
                    out.push_str(" href=\"");
                    out.push_str(&html_escape::encode_double_quoted_attribute(href));
                    out.push('"');
                }
            }
        }
        out.push('>');
        if name == "br" {
            return;
        }
    } else if block {
        out.push('\n');
    }

    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            sanitize_element(child_element, out, false);
        } else if let Some(text) = child.value().as_text() {
            out.push_str(&html_escape::encode_text(&**text));
        }
    }

    if allowed {
        out.push_str("</");
        out.push_str(name);
        out.push('>');
    } else if block {
        out.push('\n');
    }
}

/// Removes every tag, turning block boundaries into newlines. Entities are
/// decoded by the HTML parser, so `&lt;` in the input stays a literal `<`.
pub fn strip_tags(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut raw = String::with_capacity(html.len());
    collect_text(fragment.root_element(), &mut raw);
    normalize_whitespace(&raw)
}

fn collect_text(element: ElementRef, out: &mut String) {
    let block = BLOCK_TAGS.contains(&element.value().name());
    if block {
        break_line(out);
    }
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            collect_text(child_element, out);
        } else if let Some(text) = child.value().as_text() {
            out.push_str(text);
        }
    }
    if block {
        break_line(out);
    }
}

fn break_line(out: &mut String) {
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}

/// Collapses runs of spaces inside lines and keeps at most one blank line between blocks.
pub fn normalize_whitespace(text: &str) -> String {
    let mut lines = Vec::new();
    let mut blank = false;
    for line in text.lines() {
        let collapsed = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.is_empty() {
            blank = !lines.is_empty();
            continue;
        }
        if blank {
            lines.push(String::new());
            blank = false;
        }
        lines.push(collapsed);
    }
    lines.join("\n")
}
