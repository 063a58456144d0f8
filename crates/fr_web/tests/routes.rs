use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use fr_web::{create_app, AppState};
use std::fs;
use tempfile::TempDir;
use tower::ServiceExt;

async fn get(dir: &TempDir, uri: &str) -> (StatusCode, Option<String>, String) {
    let app = create_app(AppState::new(dir.path()));
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let location = response
        .headers()
        .get(header::LOCATION)
        .map(|v| v.to_str().unwrap().to_string());
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, location, String::from_utf8_lossy(&body).into_owned())
}

fn populated() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("scraped-articles-20240101-000000.csv"), "Alert Name\n").unwrap();
    fs::write(dir.path().join("analyzed-articles-20240101-000000.html"), "<p>old</p>").unwrap();
    fs::write(dir.path().join("analyzed-articles-20240102-000000.html"), "<p>new</p>").unwrap();
    fs::write(dir.path().join("cost-ledger.json"), "{}").unwrap();
    dir
}

#[tokio::test]
async fn test_root_redirects_to_newest_report() {
    let dir = populated();
    let (status, location, _) = get(&dir, "/").await;

    assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location.as_deref(), Some("/analyzed-articles-20240102-000000.html"));
}

#[tokio::test]
async fn test_root_redirects_to_listing_when_empty() {
    let dir = TempDir::new().unwrap();
    let (status, location, _) = get(&dir, "/").await;

    assert_eq!(status, StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location.as_deref(), Some("/reports"));
}

#[tokio::test]
async fn test_listing_excludes_ledger() {
    let dir = populated();

    let (status, _, body) = get(&dir, "/api/reports").await;
    assert_eq!(status, StatusCode::OK);
    let reports: serde_json::Value = serde_json::from_str(&body).unwrap();
    let names: Vec<&str> = reports
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert_eq!(names.len(), 3);
    assert!(!names.contains(&"cost-ledger.json"));

    let (status, _, page) = get(&dir, "/reports").await;
    assert_eq!(status, StatusCode::OK);
    assert!(page.contains("analyzed-articles-20240102-000000.html"));
    assert!(!page.contains("cost-ledger"));
}

#[tokio::test]
async fn test_serves_report_files() {
    let dir = populated();
    let (status, _, body) = get(&dir, "/analyzed-articles-20240102-000000.html").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "<p>new</p>");

    let (status, _, _) = get(&dir, "/missing.html").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_ledger_and_other_files_are_not_served() {
    let dir = populated();
    fs::write(dir.path().join("notes.txt"), "private").unwrap();

    for uri in ["/cost-ledger.json", "/notes.txt", "/nested/analyzed-articles-1.html"] {
        let (status, _, body) = get(&dir, uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
        assert!(!body.contains("private"));
    }
}
