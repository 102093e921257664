use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::analyzer::StatusClassifier;
use crate::config::{ScanConfig, ScanKind};
use crate::enumerator::{Enumerator, PageInfo, Target};
use crate::error::Result;
use crate::http::{HttpClient, Transport};
use crate::models::{
    ProbeResponse, ProgressUpdate, RunState, ScanEvent, ScanReport, ScanResult,
    StatusUpdate,
};
use crate::reporter::{JsonExporter, ReportSubmitter, SubmissionStatus};

use super::control::ScanControl;

/// Everything a finished run leaves behind.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub state: RunState,
    pub report: ScanReport,
    pub report_path: PathBuf,
    pub persist_error: Option<String>,
    pub submission: Option<SubmissionStatus>,
    /// Everything the caller should be told about, joined with `; `.
    pub warning: Option<String>,
}

impl ScanOutcome {
    pub fn persisted(&self) -> bool {
        self.persist_error.is_none()
    }
}

/// A run that passed validation and holds the controller's running slot.
pub struct PreparedRun {
    config: ScanConfig,
    enumerator: Enumerator,
}

impl PreparedRun {
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }
}

enum LoopExit {
    Exhausted,
    Stopped,
    ConsumerGone,
}

/// Drives one scan at a time over a shared transport.
pub struct ScanController {
    transport: Arc<dyn Transport>,
    control: ScanControl,
}

impl ScanController {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            control: ScanControl::new(),
        }
    }

    /// Controller backed by an HTTP client honoring the config's timeout and proxy.
    pub fn for_config(config: &ScanConfig) -> Result<Self> {
        let client = HttpClient::new(config.timeout_secs, config.proxy.as_deref())?;
        Ok(Self::new(Arc::new(client)))
    }

    pub fn control(&self) -> ScanControl {
        self.control.clone()
    }

    pub fn state(&self) -> RunState {
        self.control.state()
    }

    /// Validates the config and claims the running slot. Nothing is sent yet.
    pub fn prepare(&self, config: ScanConfig) -> Result<PreparedRun> {
        let enumerator = Enumerator::for_config(&config)?;
        self.control.begin()?;
        Ok(PreparedRun { config, enumerator })
    }

    pub async fn run(&self, config: ScanConfig, events: mpsc::Sender<ScanEvent>) -> Result<ScanOutcome> {
        let prepared = self.prepare(config)?;
        Ok(self.drive(prepared, events).await)
    }

    /// Executes a prepared run to completion or stop, then persists the report.
    pub async fn drive(&self, prepared: PreparedRun, events: mpsc::Sender<ScanEvent>) -> ScanOutcome {
        let PreparedRun { config, mut enumerator } = prepared;
        let mut report = ScanReport::new(config.total_targets());
        let started = Instant::now();
        let mut next_id: u64 = 0;

        info!(
            kind = %config.kind,
            target = %config.target,
            total = ?config.total_targets(),
            filtered = !config.filter.is_permissive(),
            "scan started"
        );

        let exit = loop {
            if self.control.stop_requested() {
                break LoopExit::Stopped;
            }
            if self.control.wait_while_paused().await {
                break LoopExit::Stopped;
            }

            let Some(target) = enumerator.next_target() else {
                break LoopExit::Exhausted;
            };

            let response = self.transport.send(target.request.clone()).await;
            next_id += 1;

            let page = enumerator.observe(&target, &response);
            let result = build_result(next_id, config.kind, &target, &response, page);
            let admitted = config.filter.admits(&result);

            debug!(
                id = result.id,
                url = %result.url,
                status = result.status_code,
                admitted,
                "probe finished"
            );

            report.stats.record(admitted);
            report.stats.finish_tick(started.elapsed());

            let live = if admitted {
                report.results.push(result.clone());
                config.live_updates.then_some(result)
            } else {
                None
            };

            let update = ProgressUpdate::from_stats(&report.stats, live);
            if events.send(ScanEvent::Progress(update)).await.is_err() {
                warn!("event receiver dropped, stopping scan");
                break LoopExit::ConsumerGone;
            }

            if enumerator.quota_reached() {
                break LoopExit::Exhausted;
            }

            if let Some(delay) = config.delay {
                if self.control.sleep_or_stop(delay).await {
                    break LoopExit::Stopped;
                }
            }
        };

        report.stats.finish_tick(started.elapsed());

        let final_state = match exit {
            LoopExit::Exhausted => RunState::Completed,
            LoopExit::Stopped | LoopExit::ConsumerGone => RunState::Stopped,
        };
        let mut consumer_alive = !matches!(exit, LoopExit::ConsumerGone);

        if !config.live_updates && consumer_alive {
            for result in &report.results {
                if events.send(ScanEvent::Result(result.clone())).await.is_err() {
                    consumer_alive = false;
                    break;
                }
            }
        }

        let report_path = config.report_path();
        let persist_error = match JsonExporter::export(&report.results, &report_path) {
            Ok(()) => {
                info!(path = %report_path.display(), results = report.len(), "report written");
                None
            }
            Err(e) => {
                error!(path = %report_path.display(), error = %format!("{:#}", e), "failed to write report");
                Some(format!("Failed to write report: {:#}", e))
            }
        };

        let submission = match &config.submit {
            Some(target) => {
                Some(ReportSubmitter::submit(self.transport.as_ref(), config.kind, target, &report.results).await)
            }
            None => None,
        };

        self.control.finish(final_state);

        info!(
            state = %final_state,
            processed = report.stats.processed,
            kept = report.stats.filtered,
            elapsed = report.stats.elapsed_secs,
            "scan finished"
        );

        let warning = [
            self.transport.setup_warning(),
            persist_error.clone(),
            submission.as_ref().and_then(|s| s.warning()).map(str::to_string),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>();
        let warning = (!warning.is_empty()).then(|| warning.join("; "));

        if consumer_alive {
            let status = StatusUpdate {
                status: final_state,
                message: finish_message(config.kind, final_state),
                report_path: persist_error.is_none().then(|| report_path.display().to_string()),
                warning: warning.clone(),
            };
            let _ = events.send(ScanEvent::Status(status)).await;
        }

        ScanOutcome {
            state: final_state,
            report,
            report_path,
            persist_error,
            submission,
            warning,
        }
    }
}

fn build_result(
    id: u64,
    kind: ScanKind,
    target: &Target,
    response: &ProbeResponse,
    page: Option<PageInfo>,
) -> ScanResult {
    let error = match kind {
        ScanKind::Crawler => !response.is_success(),
        ScanKind::Fuzzer | ScanKind::BruteForcer => response.is_transport_failure(),
    };

    let result = ScanResult::new(
        id,
        target.request.url.clone(),
        target.payload.clone(),
        response.status_code,
        StatusClassifier::classify(response.status_code),
        response.metrics(),
        error,
    );

    match page {
        Some(page) => result.with_page_info(page.title, page.link_count),
        None => result,
    }
}

fn finish_message(kind: ScanKind, state: RunState) -> String {
    let noun = match kind {
        ScanKind::Crawler => "Crawl",
        ScanKind::Fuzzer => "Fuzzing",
        ScanKind::BruteForcer => "Brute force",
    };
    match state {
        RunState::Stopped => format!("{} stopped", noun),
        _ => format!("{} completed", noun),
    }
}
