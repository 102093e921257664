use colored::Colorize;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Rows},
};

use crate::models::{ScanResult, ScanStats, Severity, SeveritySummary};

pub struct ConsoleReporter;

#[derive(Tabled)]
struct TableRow {
    #[tabled(rename = "#")]
    id: u64,
    #[tabled(rename = "URL")]
    url: String,
    #[tabled(rename = "Payload")]
    payload: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Length")]
    length: usize,
    #[tabled(rename = "Words")]
    words: usize,
    #[tabled(rename = "Severity")]
    severity: String,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn severity_label(severity: Severity) -> String {
        match severity {
            Severity::High => "HIGH".red().bold().to_string(),
            Severity::Medium => "MEDIUM".yellow().to_string(),
            Severity::Low => "LOW".green().to_string(),
            Severity::Info => "INFO".cyan().to_string(),
            Severity::Unknown => "UNKNOWN".dimmed().to_string(),
        }
    }

    pub fn render_table(&self, results: &[ScanResult]) -> String {
        let rows: Vec<TableRow> = results
            .iter()
            .map(|r| TableRow {
                id: r.id,
                url: r.url.clone(),
                payload: r.payload.clone(),
                status: if r.error && r.status_code == 0 {
                    "ERR".red().to_string()
                } else {
                    r.status_code.to_string()
                },
                length: r.length,
                words: r.words,
                severity: Self::severity_label(r.severity),
            })
            .collect();

        Table::new(rows)
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()))
            .to_string()
    }

    pub fn print_table(&self, results: &[ScanResult]) {
        if results.is_empty() {
            println!("\n{}", "No results passed the configured filters.".yellow());
            return;
        }
        println!("\n{}", self.render_table(results));
    }

    pub fn print_summary(&self, results: &[ScanResult], stats: Option<&ScanStats>) {
        let summary = SeveritySummary::from_results(results);

        println!("\n{}", "Summary".bold().underline());
        if let Some(stats) = stats {
            println!(
                "{} requests in {:.2}s ({} req/s), {} kept, {} filtered out",
                stats.processed, stats.elapsed_secs, stats.requests_per_second, stats.filtered, stats.rejected
            );
        }

        if summary.high_count > 0 {
            println!("  {}: {}", "HIGH".red().bold(), summary.high_count);
        }
        if summary.medium_count > 0 {
            println!("  {}: {}", "MEDIUM".yellow(), summary.medium_count);
        }
        if summary.low_count > 0 {
            println!("  {}: {}", "LOW".green(), summary.low_count);
        }
        if summary.info_count > 0 {
            println!("  {}: {}", "INFO".cyan(), summary.info_count);
        }
        if summary.error_count > 0 {
            println!("  {}: {}", "ERRORS".red(), summary.error_count);
        }
        println!();
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}
