use std::io::{BufRead, IsTerminal};
use std::path::Path;

use anyhow::{Context, Result, bail};
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;

use reconkit::cli::{Cli, Commands};
use reconkit::config::ScanConfig;
use reconkit::models::{ScanEvent, ScanResult};
use reconkit::reporter::{ConsoleReporter, HtmlExporter, JsonExporter};
use reconkit::scanner::{ScanControl, ScanController, ScanOutcome};

const EVENT_BUFFER: usize = 256;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.debug);

    if let Commands::Report { input, format, output } = &cli.command {
        return render_report(input, format, output.as_deref());
    }

    let Some((kind, params, common)) = cli.command.scan_params() else {
        return Ok(());
    };
    let json = common.json;
    let config = ScanConfig::from_params(kind, params)?;
    let outcome = run_scan(config, json).await?;

    if !json {
        let reporter = ConsoleReporter::new();
        reporter.print_table(&outcome.report.results);
        reporter.print_summary(&outcome.report.results, Some(&outcome.report.stats));

        if outcome.persisted() {
            println!("{} {}", "Report:".bold(), outcome.report_path.display());
        }
        if let Some(warning) = &outcome.warning {
            eprintln!("{} {}", "Warning:".yellow().bold(), warning);
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool, debug: bool) {
    use tracing_subscriber::EnvFilter;

    let crate_level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        "warn"
    };
    let filter_str = format!("reconkit={},reqwest=warn,hyper=warn", crate_level);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&filter_str))
        .unwrap_or_else(|_| EnvFilter::new(crate_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run_scan(config: ScanConfig, json: bool) -> Result<ScanOutcome> {
    let controller = ScanController::for_config(&config)?;
    let control = controller.control();
    let total = config.total_targets();

    if !json {
        println!(
            "{} {} {}",
            format!("[{}]", config.kind).cyan().bold(),
            config.target.bold(),
            "(p = pause, r = resume, s = stop)".dimmed()
        );
    }

    let prepared = controller.prepare(config)?;
    spawn_ctrl_c(control.clone());
    if !json && std::io::stdin().is_terminal() {
        spawn_keyboard(control.clone());
    }

    let pb = if json {
        ProgressBar::hidden()
    } else {
        create_progress_bar(total)
    };

    let (tx, mut rx) = mpsc::channel(EVENT_BUFFER);
    let consumer = async {
        while let Some(event) = rx.recv().await {
            if json {
                match serde_json::to_string(&event) {
                    Ok(line) => println!("{}", line),
                    Err(e) => tracing::error!(error = %e, "failed to encode event"),
                }
            } else {
                show_event(&pb, &event);
            }
        }
    };

    let (outcome, ()) = tokio::join!(controller.drive(prepared, tx), consumer);
    if !pb.is_finished() {
        pb.finish_and_clear();
    }
    Ok(outcome)
}

fn create_progress_bar(total: Option<usize>) -> ProgressBar {
    match total {
        Some(total) => {
            let pb = ProgressBar::new(total as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.cyan} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("=>-"),
            );
            pb
        }
        None => {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.cyan} [{elapsed_precise}] {pos} pages {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb
        }
    }
}

fn show_event(pb: &ProgressBar, event: &ScanEvent) {
    match event {
        ScanEvent::Progress(update) => {
            pb.set_position(update.processed_requests as u64);
            pb.set_message(format!(
                "{} kept, {} req/s",
                update.filtered_requests, update.requests_per_second
            ));
            if let Some(result) = &update.result {
                pb.println(result_line(result));
            }
        }
        ScanEvent::Result(result) => pb.println(result_line(result)),
        ScanEvent::Status(status) => {
            pb.finish_with_message(status.message.clone());
        }
    }
}

fn result_line(result: &ScanResult) -> String {
    let status = if result.error && result.status_code == 0 {
        "ERR".red().to_string()
    } else {
        result.status_code.to_string()
    };
    format!(
        "{:>5} {:>4} {:>8} {} {}",
        result.id,
        status,
        result.length,
        ConsoleReporter::severity_label(result.severity),
        result.url
    )
}

fn spawn_ctrl_c(control: ScanControl) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received");
            control.request_stop();
        }
    });
}

/// Reads `p`, `r` and `s` commands from the terminal while a scan runs.
fn spawn_keyboard(control: ScanControl) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let response = match line.trim().to_ascii_lowercase().as_str() {
                "p" | "pause" => control.request_pause(),
                "r" | "resume" => control.request_resume(),
                "s" | "stop" | "q" => control.request_stop(),
                _ => continue,
            };
            eprintln!("{}", response.message.dimmed());
            if control.state().is_terminal() {
                break;
            }
        }
    });
}

fn render_report(input: &str, format: &str, output: Option<&str>) -> Result<()> {
    let results = JsonExporter::load(Path::new(input))?;

    match format.to_lowercase().as_str() {
        "html" => {
            let output = output.unwrap_or("report.html");
            HtmlExporter::export(&results, None, "Scan report", Path::new(output))?;
            println!("{} {}", "HTML report written to".green(), output);
        }
        "json" => {
            let output = output.context("--output is required for json format")?;
            JsonExporter::export(&results, Path::new(output))?;
            println!("{} {}", "JSON report written to".green(), output);
        }
        "table" => {
            let reporter = ConsoleReporter::new();
            reporter.print_table(&results);
            reporter.print_summary(&results, None);
        }
        other => bail!("Unsupported report format '{}', expected html, json or table", other),
    }

    Ok(())
}
