use serde::{Deserialize, Serialize};
use std::fmt;

use super::{ScanResult, ScanStats};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Running,
    Paused,
    Completed,
    Stopped,
}

impl RunState {
    pub fn is_active(&self) -> bool {
        matches!(self, RunState::Running | RunState::Paused)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Completed | RunState::Stopped)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunState::Idle => "idle",
            RunState::Running => "running",
            RunState::Paused => "paused",
            RunState::Completed => "completed",
            RunState::Stopped => "stopped",
        };
        write!(f, "{}", s)
    }
}

/// Aggregate counters emitted after every probe, optionally carrying the
/// admitted result inline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressUpdate {
    pub progress: Option<f64>,
    pub processed_requests: usize,
    pub filtered_requests: usize,
    pub requests_per_second: f64,
    #[serde(flatten)]
    pub result: Option<ScanResult>,
}

impl ProgressUpdate {
    pub fn from_stats(stats: &ScanStats, result: Option<ScanResult>) -> Self {
        Self {
            progress: stats.progress(),
            processed_requests: stats.processed,
            filtered_requests: stats.filtered,
            requests_per_second: stats.requests_per_second,
            result,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusUpdate {
    pub status: RunState,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ScanEvent {
    Progress(ProgressUpdate),
    Result(ScanResult),
    Status(StatusUpdate),
}

impl ScanEvent {
    pub fn result(&self) -> Option<&ScanResult> {
        match self {
            ScanEvent::Progress(update) => update.result.as_ref(),
            ScanEvent::Result(result) => Some(result),
            ScanEvent::Status(_) => None,
        }
    }
}

/// Answer to a stop, pause or resume signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControlResponse {
    pub accepted: bool,
    pub message: String,
}

impl ControlResponse {
    pub fn accepted(message: impl Into<String>) -> Self {
        Self {
            accepted: true,
            message: message.into(),
        }
    }

    pub fn nothing_to(action: &str) -> Self {
        Self {
            accepted: false,
            message: format!("nothing to {}", action),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BodyMetrics, Severity};

    #[test]
    fn test_progress_event_flattens_result() {
        let mut stats = ScanStats::new(Some(4));
        stats.record(true);
        let result = ScanResult::new(
            1,
            "http://example.test/?fuzz=a".to_string(),
            "a".to_string(),
            200,
            Severity::Low,
            BodyMetrics::measure("ok"),
            false,
        );
        let event = ScanEvent::Progress(ProgressUpdate::from_stats(&stats, Some(result)));
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["progress"], 0.25);
        assert_eq!(json["processed_requests"], 1);
        assert_eq!(json["payload"], "a");
        assert_eq!(json["status_code"], 200);
    }

    #[test]
    fn test_progress_event_without_result_has_only_aggregates() {
        let stats = ScanStats::new(None);
        let event = ScanEvent::Progress(ProgressUpdate::from_stats(&stats, None));
        let json = serde_json::to_value(&event).unwrap();

        assert!(json["progress"].is_null());
        assert!(json.get("url").is_none());
        assert!(event.result().is_none());
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let event = ScanEvent::Status(StatusUpdate {
            status: RunState::Stopped,
            message: "scan stopped".to_string(),
            report_path: None,
            warning: None,
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["status"], "stopped");
        assert!(json.get("warning").is_none());
    }
}
