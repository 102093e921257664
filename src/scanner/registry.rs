use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::{RwLock, mpsc};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::config::{ScanConfig, ScanKind};
use crate::error::{Result, ScanError};
use crate::http::{HttpClient, Transport};
use crate::models::{ControlResponse, RunState, ScanEvent};

use super::control::ScanControl;
use super::controller::{ScanController, ScanOutcome};

pub type RunId = Uuid;

const DEFAULT_EVENT_BUFFER: usize = 256;

/// A freshly launched run and the stream of its events.
pub struct LaunchedScan {
    pub id: RunId,
    pub kind: ScanKind,
    pub events: mpsc::Receiver<ScanEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub id: RunId,
    pub kind: ScanKind,
    pub state: RunState,
}

struct RunEntry {
    kind: ScanKind,
    control: ScanControl,
    handle: Option<JoinHandle<ScanOutcome>>,
}

/// Keeps every launched run addressable by id, one controller per run.
pub struct ScanRegistry {
    runs: RwLock<HashMap<RunId, RunEntry>>,
    event_buffer: usize,
}

impl Default for ScanRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanRegistry {
    pub fn new() -> Self {
        Self::with_event_buffer(DEFAULT_EVENT_BUFFER)
    }

    pub fn with_event_buffer(event_buffer: usize) -> Self {
        Self {
            runs: RwLock::new(HashMap::new()),
            event_buffer: event_buffer.max(1),
        }
    }

    pub async fn launch(&self, config: ScanConfig) -> Result<LaunchedScan> {
        let client = HttpClient::new(config.timeout_secs, config.proxy.as_deref())?;
        self.launch_with(config, Arc::new(client)).await
    }

    pub async fn launch_with(&self, config: ScanConfig, transport: Arc<dyn Transport>) -> Result<LaunchedScan> {
        let controller = ScanController::new(transport);
        let prepared = controller.prepare(config)?;
        let kind = prepared.config().kind;
        let control = controller.control();

        let (tx, rx) = mpsc::channel(self.event_buffer);
        let handle = tokio::spawn(async move { controller.drive(prepared, tx).await });

        let id = Uuid::new_v4();
        self.runs.write().await.insert(
            id,
            RunEntry {
                kind,
                control,
                handle: Some(handle),
            },
        );
        tracing::info!(%id, %kind, "scan launched");

        Ok(LaunchedScan { id, kind, events: rx })
    }

    pub async fn stop(&self, id: RunId) -> ControlResponse {
        match self.control(id).await {
            Some(control) => control.request_stop(),
            None => ControlResponse::nothing_to("stop"),
        }
    }

    pub async fn pause(&self, id: RunId) -> ControlResponse {
        match self.control(id).await {
            Some(control) => control.request_pause(),
            None => ControlResponse::nothing_to("pause"),
        }
    }

    pub async fn resume(&self, id: RunId) -> ControlResponse {
        match self.control(id).await {
            Some(control) => control.request_resume(),
            None => ControlResponse::nothing_to("resume"),
        }
    }

    pub async fn control(&self, id: RunId) -> Option<ScanControl> {
        self.runs.read().await.get(&id).map(|entry| entry.control.clone())
    }

    pub async fn state(&self, id: RunId) -> Option<RunState> {
        self.runs.read().await.get(&id).map(|entry| entry.control.state())
    }

    pub async fn list(&self) -> Vec<RunSummary> {
        self.runs
            .read()
            .await
            .iter()
            .map(|(id, entry)| RunSummary {
                id: *id,
                kind: entry.kind,
                state: entry.control.state(),
            })
            .collect()
    }

    pub async fn active(&self) -> Vec<RunSummary> {
        self.list().await.into_iter().filter(|run| run.state.is_active()).collect()
    }

    /// Waits for a run to finish and returns its outcome. The run stays
    /// listed until pruned, but can only be awaited once.
    pub async fn wait(&self, id: RunId) -> Option<Result<ScanOutcome>> {
        let handle = self.runs.write().await.get_mut(&id)?.handle.take()?;
        Some(handle.await.map_err(|e| ScanError::TaskFailed(e.to_string())))
    }

    /// Drops finished runs. Returns how many were removed.
    pub async fn prune(&self) -> usize {
        let mut runs = self.runs.write().await;
        let before = runs.len();
        runs.retain(|_, entry| {
            let finished = entry.control.state().is_terminal()
                && entry.handle.as_ref().is_none_or(|h| h.is_finished());
            !finished
        });
        before - runs.len()
    }

    /// Stops every run and waits for all of them to persist their reports.
    pub async fn shutdown(&self) -> Vec<ScanOutcome> {
        let handles: Vec<_> = {
            let mut runs = self.runs.write().await;
            runs.values_mut()
                .filter_map(|entry| {
                    entry.control.request_stop();
                    entry.handle.take()
                })
                .collect()
        };

        join_all(handles)
            .await
            .into_iter()
            .filter_map(|joined| match joined {
                Ok(outcome) => Some(outcome),
                Err(e) => {
                    tracing::error!(error = %e, "scan task failed during shutdown");
                    None
                }
            })
            .collect()
    }
}
