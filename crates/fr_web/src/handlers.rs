use crate::reports::{is_report_name, landing_report, list_reports, ReportEntry};
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Json,
};
use std::sync::Arc;
use tower_http::services::ServeDir;
use tracing::warn;

async fn reports_or_error(state: &AppState) -> Result<Vec<ReportEntry>, Response> {
    list_reports(&state.output_dir).await.map_err(|e| {
        warn!("Failed to list {}: {}", state.output_dir.display(), e);
        (StatusCode::INTERNAL_SERVER_ERROR, format!("Failed to list reports: {}", e)).into_response()
    })
}

pub async fn index(State(state): State<Arc<AppState>>) -> Response {
    match reports_or_error(&state).await {
        Ok(reports) => match landing_report(&reports) {
            Some(report) => Redirect::temporary(&report.url).into_response(),
            None => Redirect::temporary("/reports").into_response(),
        },
        Err(response) => response,
    }
}

pub async fn api_reports(State(state): State<Arc<AppState>>) -> Response {
    match reports_or_error(&state).await {
        Ok(reports) => Json(reports).into_response(),
        Err(response) => response,
    }
}

pub async fn reports_page(State(state): State<Arc<AppState>>) -> Response {
    let reports = match reports_or_error(&state).await {
        Ok(reports) => reports,
        Err(response) => return response,
    };

    let mut rows = String::new();
    for report in &reports {
        rows.push_str(&format!(
            "<tr><td><a href=\"{url}\">{name}</a></td><td>{size}</td><td>{modified}</td></tr>\n",
            url = html_escape::encode_double_quoted_attribute(&report.url),
            name = html_escape::encode_text(&report.name),
            size = human_size(report.size),
            modified = report.modified.format("%Y-%m-%d %H:%M:%S UTC"),
        ));
    }
    if reports.is_empty() {
        rows.push_str("<tr><td colspan=\"3\">No reports yet.</td></tr>\n");
    }

    Html(format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>Reports</title>\
         <style>body{{font-family:system-ui,sans-serif;margin:2rem}}td,th{{padding:.4rem 1rem;text-align:left}}</style>\
         </head><body><h1>Reports</h1>\n<table><thead><tr><th>Name</th><th>Size</th><th>Modified</th></tr></thead>\n\
         <tbody>\n{}</tbody></table></body></html>\n",
        rows
    ))
    .into_response()
}

/// Serves a report file from the output directory. Anything that is not a
/// top-level report, the ledger included, is a 404.
pub async fn report_file(State(state): State<Arc<AppState>>, request: Request) -> Response {
    let name = request.uri().path().trim_start_matches('/');
    if name.contains('/') || !is_report_name(name) {
        return StatusCode::NOT_FOUND.into_response();
    }

    match ServeDir::new(&state.output_dir).try_call(request).await {
        Ok(response) => response.into_response(),
        Err(e) => {
            warn!("Failed to serve {}: {}", state.output_dir.display(), e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn human_size(bytes: u64) -> String {
    match bytes {
        b if b >= 1024 * 1024 => format!("{:.1} MB", b as f64 / (1024.0 * 1024.0)),
        b if b >= 1024 => format!("{:.1} KB", b as f64 / 1024.0),
        b => format!("{} B", b),
    }
}
