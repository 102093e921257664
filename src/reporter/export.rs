use anyhow::{Context, Result};
use chrono::Utc;
use std::fs;
use std::path::Path;
use tera::{Context as TeraContext, Tera};

use crate::models::{ScanResult, ScanStats, Severity, SeveritySummary};

pub struct JsonExporter;

impl JsonExporter {
    /// Overwrites `path` with the results as a pretty JSON array. The file is
    /// written next to its destination first and renamed into place.
    pub fn export(results: &[ScanResult], path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let json = Self::to_json(results)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).with_context(|| format!("Failed to write to {}", tmp.display()))?;
        fs::rename(&tmp, path)
            .with_context(|| format!("Failed to move report into {}", path.display()))?;
        Ok(())
    }

    pub fn to_json(results: &[ScanResult]) -> Result<String> {
        Ok(serde_json::to_string_pretty(results)?)
    }

    pub fn load(path: &Path) -> Result<Vec<ScanResult>> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let results = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(results)
    }
}

pub struct HtmlExporter;

impl HtmlExporter {
    pub fn export(results: &[ScanResult], stats: Option<&ScanStats>, title: &str, path: &Path) -> Result<()> {
        let html = Self::render(results, stats, title)?;
        fs::write(path, html).with_context(|| format!("Failed to write to {}", path.display()))?;
        Ok(())
    }

    pub fn render(results: &[ScanResult], stats: Option<&ScanStats>, title: &str) -> Result<String> {
        let mut tera = Tera::default();
        tera.add_raw_template("report.html", Self::TEMPLATE)?;

        let summary = SeveritySummary::from_results(results);

        let mut context = TeraContext::new();
        context.insert("title", title);
        context.insert("scan_time", &Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string());
        context.insert("summary", &summary);
        context.insert("stats", &stats);

        let rows: Vec<HtmlRow> = results
            .iter()
            .map(|r| HtmlRow {
                id: r.id,
                url: r.url.clone(),
                payload: r.payload.clone(),
                status: if r.error && r.status_code == 0 {
                    "ERR".to_string()
                } else {
                    r.status_code.to_string()
                },
                severity: r.severity.to_string(),
                severity_class: Self::severity_class(r.severity).to_string(),
                length: r.length,
                words: r.words,
                lines: r.lines,
            })
            .collect();
        context.insert("rows", &rows);

        Ok(tera.render("report.html", &context)?)
    }

    fn severity_class(severity: Severity) -> &'static str {
        match severity {
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Info => "info",
            Severity::Unknown => "unknown",
        }
    }

    const TEMPLATE: &'static str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{{ title }}</title>
    <style>
        * { margin: 0; padding: 0; box-sizing: border-box; }
        body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; background: #0d1117; color: #c9d1d9; line-height: 1.6; }
        .container { max-width: 1200px; margin: 0 auto; padding: 2rem; }
        h1 { color: #58a6ff; margin-bottom: 0.5rem; }
        .subtitle { color: #8b949e; margin-bottom: 2rem; }
        .summary { display: grid; grid-template-columns: repeat(auto-fit, minmax(150px, 1fr)); gap: 1rem; margin-bottom: 2rem; }
        .stat { background: #161b22; border: 1px solid #30363d; border-radius: 6px; padding: 1rem; text-align: center; }
        .stat-value { font-size: 2rem; font-weight: bold; }
        .stat-label { color: #8b949e; font-size: 0.875rem; }
        .high .stat-value { color: #f85149; }
        .medium .stat-value { color: #d29922; }
        .low .stat-value { color: #3fb950; }
        table { width: 100%; border-collapse: collapse; background: #161b22; border: 1px solid #30363d; border-radius: 6px; overflow: hidden; }
        th, td { padding: 0.75rem 1rem; text-align: left; border-bottom: 1px solid #30363d; }
        th { background: #21262d; color: #c9d1d9; font-weight: 600; }
        tr:hover { background: #21262d; }
        .severity { padding: 0.25rem 0.5rem; border-radius: 4px; font-size: 0.75rem; font-weight: 600; }
        .severity.high { background: #f8514933; color: #f85149; }
        .severity.medium { background: #d2992233; color: #d29922; }
        .severity.low { background: #3fb95033; color: #3fb950; }
        .severity.info { background: #58a6ff33; color: #58a6ff; }
        .severity.unknown { background: #8b949e33; color: #8b949e; }
        .url { word-break: break-all; }
    </style>
</head>
<body>
    <div class="container">
        <h1>{{ title }}</h1>
        <p class="subtitle">Generated: {{ scan_time }}{% if stats %} &middot; {{ stats.processed }} requests in {{ stats.elapsed_secs | round(precision=2) }}s ({{ stats.requests_per_second }} req/s){% endif %}</p>

        <div class="summary">
            <div class="stat">
                <div class="stat-value">{{ summary.total }}</div>
                <div class="stat-label">Results</div>
            </div>
            <div class="stat high">
                <div class="stat-value">{{ summary.high_count }}</div>
                <div class="stat-label">High</div>
            </div>
            <div class="stat medium">
                <div class="stat-value">{{ summary.medium_count }}</div>
                <div class="stat-label">Medium</div>
            </div>
            <div class="stat low">
                <div class="stat-value">{{ summary.low_count }}</div>
                <div class="stat-label">Low</div>
            </div>
            <div class="stat">
                <div class="stat-value">{{ summary.error_count }}</div>
                <div class="stat-label">Errors</div>
            </div>
        </div>

        <table>
            <thead>
                <tr>
                    <th>#</th>
                    <th>URL</th>
                    <th>Payload</th>
                    <th>Status</th>
                    <th>Length</th>
                    <th>Words</th>
                    <th>Lines</th>
                    <th>Severity</th>
                </tr>
            </thead>
            <tbody>
                {% for row in rows %}
                <tr>
                    <td>{{ row.id }}</td>
                    <td class="url">{{ row.url }}</td>
                    <td>{{ row.payload }}</td>
                    <td>{{ row.status }}</td>
                    <td>{{ row.length }}</td>
                    <td>{{ row.words }}</td>
                    <td>{{ row.lines }}</td>
                    <td><span class="severity {{ row.severity_class }}">{{ row.severity }}</span></td>
                </tr>
                {% endfor %}
            </tbody>
        </table>
    </div>
</body>
</html>"#;
}

#[derive(serde::Serialize)]
struct HtmlRow {
    id: u64,
    url: String,
    payload: String,
    status: String,
    severity: String,
    severity_class: String,
    length: usize,
    words: usize,
    lines: usize,
}
