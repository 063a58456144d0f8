use crate::{ExportOptions, ReportRow, ScoreSummary};
use chrono::Utc;
use fr_core::Result;

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{{TITLE}}</title>
<style>
  body { font-family: system-ui, sans-serif; margin: 2rem; color: #1d2433; background: #f7f8fa; }
  h1 { margin-bottom: 0.2rem; }
  .meta { color: #5b6475; margin-bottom: 1rem; }
  .controls { display: flex; gap: 1rem; align-items: center; margin-bottom: 1rem; flex-wrap: wrap; }
  .controls input[type=search] { padding: 0.4rem; min-width: 18rem; }
  table { border-collapse: collapse; width: 100%; background: #fff; }
  th, td { border-bottom: 1px solid #e3e6ec; padding: 0.5rem; text-align: left; vertical-align: top; }
  th { cursor: pointer; user-select: none; background: #eef1f6; }
  th.sorted-asc::after { content: " \25B2"; }
  th.sorted-desc::after { content: " \25BC"; }
  .score { font-weight: bold; text-align: center; border-radius: 4px; padding: 0.2rem 0.4rem; }
  .high { background: #c9f2d0; } .mid { background: #fff0b3; } .low { background: #f6d2d2; }
  .text { color: #444; font-size: 0.9rem; white-space: pre-line; max-height: 12rem; overflow: auto; }
  .pager { margin-top: 1rem; display: flex; gap: 0.5rem; align-items: center; }
</style>
</head>
<body>
<h1>{{TITLE}}</h1>
<div class="meta">Generated {{GENERATED}} &middot; {{COUNT}} articles &middot; mean score {{MEAN}}</div>
<div class="controls">
  <input type="search" id="filter" placeholder="Filter by title, source or explanation">
  <label>Min score <input type="range" id="min-score" min="0" max="100" value="0"> <span id="min-score-value">0</span></label>
  <label>Per page <select id="page-size"><option>10</option><option selected>25</option><option>50</option><option>100</option></select></label>
</div>
<table>
  <thead><tr>
    <th data-key="relevance_score">Score</th>
    <th data-key="title">Title</th>
    <th data-key="source_label">Source</th>
    <th data-key="published">Published</th>
    <th data-key="explanation">Explanation</th>
    <th data-key="text">{{TEXT_HEADER}}</th>
  </tr></thead>
  <tbody id="rows"></tbody>
</table>
<div class="pager">
  <button id="prev">Previous</button>
  <span id="page-info"></span>
  <button id="next">Next</button>
</div>
<script type="application/json" id="report-data">{{DATA}}</script>
<script>
(function () {
  const data = JSON.parse(document.getElementById("report-data").textContent);
  const state = { filter: "", minScore: 0, sortKey: "relevance_score", sortDir: -1, page: 0, pageSize: 25 };

  function cell(tag, text, className) {
    const el = document.createElement(tag);
    if (className) el.className = className;
    el.textContent = text == null ? "" : String(text);
    return el;
  }

  function visible() {
    const needle = state.filter.toLowerCase();
    const rows = data.filter(function (row) {
      if (row.relevance_score < state.minScore) return false;
      if (!needle) return true;
      return [row.title, row.source_label, row.site_name, row.explanation]
        .some(function (v) { return v && v.toLowerCase().indexOf(needle) !== -1; });
    });
    rows.sort(function (a, b) {
      const x = a[state.sortKey] == null ? "" : a[state.sortKey];
      const y = b[state.sortKey] == null ? "" : b[state.sortKey];
      if (x < y) return -state.sortDir;
      if (x > y) return state.sortDir;
      return 0;
    });
    return rows;
  }

  function render() {
    const rows = visible();
    const pages = Math.max(1, Math.ceil(rows.length / state.pageSize));
    state.page = Math.min(state.page, pages - 1);
    const body = document.getElementById("rows");
    body.replaceChildren();
    rows.slice(state.page * state.pageSize, (state.page + 1) * state.pageSize).forEach(function (row) {
      const tr = document.createElement("tr");
      const band = row.relevance_score >= 70 ? "high" : row.relevance_score >= 40 ? "mid" : "low";
      const score = document.createElement("td");
      score.appendChild(cell("span", row.relevance_score, "score " + band));
      tr.appendChild(score);
      const title = document.createElement("td");
      const link = cell("a", row.title || row.url);
      link.href = row.url;
      link.target = "_blank";
      link.rel = "noopener";
      title.appendChild(link);
      tr.appendChild(title);
      tr.appendChild(cell("td", row.site_name ? row.source_label + " / " + row.site_name : row.source_label));
      tr.appendChild(cell("td", row.published));
      tr.appendChild(cell("td", row.explanation));
      tr.appendChild(cell("td", row.text, "text"));
      body.appendChild(tr);
    });
    document.getElementById("page-info").textContent =
      "Page " + (state.page + 1) + " of " + pages + " (" + rows.length + " articles)";
    document.getElementById("prev").disabled = state.page === 0;
    document.getElementById("next").disabled = state.page >= pages - 1;
    document.querySelectorAll("th").forEach(function (th) {
      th.classList.remove("sorted-asc", "sorted-desc");
      if (th.dataset.key === state.sortKey) th.classList.add(state.sortDir > 0 ? "sorted-asc" : "sorted-desc");
    });
  }

  document.getElementById("filter").addEventListener("input", function (e) {
    state.filter = e.target.value; state.page = 0; render();
  });
  document.getElementById("min-score").addEventListener("input", function (e) {
    state.minScore = Number(e.target.value); state.page = 0;
    document.getElementById("min-score-value").textContent = e.target.value;
    render();
  });
  document.getElementById("page-size").addEventListener("change", function (e) {
    state.pageSize = Number(e.target.value); state.page = 0; render();
  });
  document.getElementById("prev").addEventListener("click", function () { state.page -= 1; render(); });
  document.getElementById("next").addEventListener("click", function () { state.page += 1; render(); });
  document.querySelectorAll("th").forEach(function (th) {
    th.addEventListener("click", function () {
      const key = th.dataset.key;
      state.sortDir = state.sortKey === key ? -state.sortDir : (key === "relevance_score" ? -1 : 1);
      state.sortKey = key;
      render();
    });
  });
  render();
})();
</script>
</body>
</html>
"#;

/// JSON that is safe to place inside a `<script>` element.
fn script_safe_json(rows: &[ReportRow]) -> Result<String> {
    let json = serde_json::to_string(rows)?;
    Ok(json
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026"))
}

pub fn render(rows: &[ReportRow], options: &ExportOptions) -> Result<String> {
    let summary = ScoreSummary::from_rows(rows);
    let title = format!("Article relevance report (score >= {})", options.min_relevance_score);

    Ok(TEMPLATE
        .replace("{{TITLE}}", &html_escape::encode_text(&title))
        .replace("{{GENERATED}}", &Utc::now().format("%Y-%m-%d %H:%M UTC").to_string())
        .replace("{{COUNT}}", &summary.count.to_string())
        .replace("{{MEAN}}", &format!("{:.1}", summary.mean))
        .replace("{{TEXT_HEADER}}", super::text_header(options))
        .replace("{{DATA}}", &script_safe_json(rows)?))
}
