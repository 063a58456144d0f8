use fr_core::{truncate_chars, ArticleMetadata};
use lazy_static::lazy_static;
use scraper::{Html, Selector};
use serde_json::Value;

/// Length of the excerpt cut from the body when the page has no description.
pub const EXCERPT_CHARS: usize = 300;

#[derive(Debug, Clone, Copy)]
enum Source {
    MetaProperty(&'static str),
    MetaName(&'static str),
    JsonLd(&'static str),
    Text(&'static str),
    Attr(&'static str, &'static str),
}

use Source::*;

const TITLE: &[Source] = &[
    MetaProperty("og:title"),
    MetaName("twitter:title"),
    MetaName("title"),
    JsonLd("headline"),
    Text("h1"),
    Text("title"),
];

const BYLINE: &[Source] = &[
    MetaName("author"),
    MetaProperty("article:author"),
    MetaName("twitter:creator"),
    JsonLd("author"),
    Text("[rel='author']"),
    Text(".byline"),
    Text(".author"),
];

const SITE_NAME: &[Source] = &[
    MetaProperty("og:site_name"),
    MetaName("application-name"),
    MetaName("twitter:site"),
    JsonLd("publisher"),
];

const PUBLISHED: &[Source] = &[
    MetaProperty("article:published_time"),
    MetaName("pubdate"),
    MetaName("date"),
    JsonLd("datePublished"),
    Attr("time[datetime]", "datetime"),
];

const EXCERPT: &[Source] = &[
    MetaProperty("og:description"),
    MetaName("twitter:description"),
    MetaName("description"),
    JsonLd("description"),
];

lazy_static! {
    static ref JSON_LD: Selector = Selector::parse("script[type='application/ld+json']").unwrap();
}

/// Page metadata together with the title the page gives itself.
#[derive(Debug, Clone, Default)]
pub struct PageMetadata {
    pub title: Option<String>,
    pub metadata: ArticleMetadata,
}

/// Collects metadata from meta tags, JSON-LD blocks and a few conventional
/// selectors. For every field the first non-empty source wins. When the page
/// carries no description the excerpt is cut from `body_text`.
pub fn extract_metadata(document: &Html, body_text: &str) -> PageMetadata {
    let json_ld = json_ld_objects(document);
    let lookup = |sources: &[Source]| first_value(document, &json_ld, sources);

    let excerpt = lookup(EXCERPT).or_else(|| {
        let (cut, truncated) = truncate_chars(body_text.trim(), EXCERPT_CHARS);
        match (cut.is_empty(), truncated) {
            (true, _) => None,
            (false, true) => Some(format!("{}...", cut.trim_end())),
            (false, false) => Some(cut.to_string()),
        }
    });

    PageMetadata {
        title: lookup(TITLE),
        metadata: ArticleMetadata {
            byline: lookup(BYLINE),
            site_name: lookup(SITE_NAME),
            published: lookup(PUBLISHED),
            excerpt,
        },
    }
}

fn first_value(document: &Html, json_ld: &[Value], sources: &[Source]) -> Option<String> {
    sources
        .iter()
        .filter_map(|source| read_source(document, json_ld, *source))
        .map(|value| value.split_whitespace().collect::<Vec<_>>().join(" "))
        .find(|value| !value.is_empty())
}

fn read_source(document: &Html, json_ld: &[Value], source: Source) -> Option<String> {
    match source {
        MetaProperty(property) => meta_content(document, &format!("meta[property='{}']", property)),
        MetaName(name) => meta_content(document, &format!("meta[name='{}']", name)),
        JsonLd(key) => json_ld
            .iter()
            .filter_map(|object| object.get(key))
            .find_map(json_ld_text),
        Text(selector) => {
            let selector = Selector::parse(selector).ok()?;
            let element = document.select(&selector).next()?;
            Some(element.text().collect::<String>())
        }
        Attr(selector, attr) => {
            let selector = Selector::parse(selector).ok()?;
            let element = document.select(&selector).next()?;
            element.value().attr(attr).map(str::to_string)
        }
    }
}

fn meta_content(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .filter_map(|meta| meta.value().attr("content"))
        .map(|content| html_escape::decode_html_entities(content).into_owned())
        .find(|content| !content.trim().is_empty())
}

/// All JSON-LD objects on the page, with `@graph` containers and top-level
/// arrays flattened.
fn json_ld_objects(document: &Html) -> Vec<Value> {
    let mut objects = Vec::new();
    for script in document.select(&JSON_LD) {
        let raw = script.text().collect::<String>();
        if let Ok(json) = serde_json::from_str::<Value>(raw.trim()) {
            flatten_json_ld(json, &mut objects);
        }
    }
    objects
}

fn flatten_json_ld(value: Value, out: &mut Vec<Value>) {
    match value {
        Value::Array(items) => items.into_iter().for_each(|item| flatten_json_ld(item, out)),
        Value::Object(mut map) => {
            if let Some(graph) = map.remove("@graph") {
                flatten_json_ld(graph, out);
            }
            out.push(Value::Object(map));
        }
        _ => {}
    }
}

/// Names inside JSON-LD may be plain strings, `{ "name": .. }` objects or
/// arrays of either.
fn json_ld_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Object(obj) => obj.get("name").and_then(json_ld_text),
        Value::Array(items) => {
            let names: Vec<String> = items.iter().filter_map(json_ld_text).filter(|n| !n.is_empty()).collect();
            if names.is_empty() {
                None
            } else {
                Some(names.join(", "))
            }
        }
        _ => None,
    }
}
