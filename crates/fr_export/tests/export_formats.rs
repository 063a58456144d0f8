use fr_core::{AnalyzedArticle, ArticleLink, ExportFormat, ScrapedArticle, SCRAPED_CSV_HEADERS};
use fr_export::{export, write_scraped, ExportOptions, ANALYZED_PREFIX, SCRAPED_PREFIX};
use tempfile::TempDir;

fn analyzed(title: &str, score: i64) -> AnalyzedArticle {
    let article = ScrapedArticle::new(
        ArticleLink::new("alerts", title, format!("https://x.com/{}", title)),
        format!("Body of {}\nsecond line, with a comma", title),
    );
    AnalyzedArticle::new(article, score, format!("why {}", title))
}

fn options(dir: &TempDir, min: u8) -> ExportOptions {
    ExportOptions {
        output_dir: dir.path().to_path_buf(),
        min_relevance_score: min,
        include_full_content: true,
    }
}

fn sample() -> Vec<AnalyzedArticle> {
    vec![analyzed("a", 90), analyzed("b", 60), analyzed("c", 59), analyzed("d", 0)]
}

#[test]
fn test_csv_filter_keeps_only_scores_at_or_above_min() {
    let dir = TempDir::new().unwrap();
    let path = export(&sample(), ExportFormat::Csv, &options(&dir, 60)).unwrap();

    let name = path.file_name().unwrap().to_str().unwrap();
    assert!(name.starts_with(ANALYZED_PREFIX));
    assert!(name.ends_with(".csv"));

    let mut reader = csv::Reader::from_path(&path).unwrap();
    assert_eq!(&reader.headers().unwrap()[0], "Relevance Score");
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    let scores: Vec<&str> = rows.iter().map(|r| &r[0]).collect();
    assert_eq!(scores, vec!["90", "60"]);
    assert_eq!(&rows[0][8], "Body of a\nsecond line, with a comma");
}

#[test]
fn test_json_export_is_an_array_of_rows() {
    let dir = TempDir::new().unwrap();
    let path = export(&sample(), ExportFormat::Json, &options(&dir, 1)).unwrap();

    let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let rows = value.as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[2]["relevance_score"], 59);
    assert_eq!(rows[0]["explanation"], "why a");
}

#[test]
fn test_xlsx_export_writes_a_workbook() {
    let dir = TempDir::new().unwrap();
    let path = export(&sample(), ExportFormat::Xlsx, &options(&dir, 0)).unwrap();

    assert_eq!(path.extension().unwrap(), "xlsx");
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[..2], b"PK");
}

#[test]
fn test_markdown_and_html_exports() {
    let dir = TempDir::new().unwrap();
    let md = export(&sample(), ExportFormat::Markdown, &options(&dir, 60)).unwrap();
    let text = std::fs::read_to_string(&md).unwrap();
    assert_eq!(text.matches("\n## ").count(), 2);

    let html = export(&sample(), ExportFormat::Html, &options(&dir, 0)).unwrap();
    let page = std::fs::read_to_string(&html).unwrap();
    assert!(page.starts_with("<!DOCTYPE html>"));
    assert!(page.contains("\"title\":\"d\""));
}

#[test]
fn test_empty_result_still_writes_header() {
    let dir = TempDir::new().unwrap();
    let path = export(&sample(), ExportFormat::Csv, &options(&dir, 100)).unwrap();

    let mut reader = csv::Reader::from_path(&path).unwrap();
    assert_eq!(reader.headers().unwrap().len(), 9);
    assert_eq!(reader.records().count(), 0);
}

#[test]
fn test_write_scraped_columns() {
    let dir = TempDir::new().unwrap();
    let mut failed = ScrapedArticle::failed(ArticleLink::new("alerts", "gone", "https://x.com/gone"), "HTTP 404");
    failed.metadata.site_name = Some("X".to_string());
    let articles = vec![sample()[0].article.clone(), failed];

    let path = write_scraped(&articles, dir.path()).unwrap();
    assert!(path.file_name().unwrap().to_str().unwrap().starts_with(SCRAPED_PREFIX));

    let mut reader = csv::Reader::from_path(&path).unwrap();
    assert_eq!(reader.headers().unwrap(), &csv::StringRecord::from(SCRAPED_CSV_HEADERS.to_vec()));
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[1][4], "HTTP 404");
    assert_eq!(&rows[1][6], "X");
}
