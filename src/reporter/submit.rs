use serde::Serialize;

use crate::config::{ScanKind, SubmitTarget};
use crate::http::{ProbeRequest, Transport};
use crate::models::{HttpMethod, ScanResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "lowercase")]
pub enum SubmissionStatus {
    Success(String),
    Failure(String),
}

impl SubmissionStatus {
    pub fn warning(&self) -> Option<&str> {
        match self {
            SubmissionStatus::Success(_) => None,
            SubmissionStatus::Failure(message) => Some(message),
        }
    }
}

/// Pushes a finished report to the results-ingestion API. Never fails the scan.
pub struct ReportSubmitter;

impl ReportSubmitter {
    pub async fn submit(
        transport: &dyn Transport,
        kind: ScanKind,
        target: &SubmitTarget,
        results: &[ScanResult],
    ) -> SubmissionStatus {
        let url = target.url_for(kind);

        let body = match serde_json::to_string(results) {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize report for submission");
                return SubmissionStatus::Failure(format!("Failed to serialize results: {}", e));
            }
        };

        let request = ProbeRequest {
            url: url.clone(),
            method: HttpMethod::Post,
            headers: Default::default(),
            body: Some(body),
        }
        .with_header("Content-Type", "application/json");

        let response = transport.send(request).await;

        if response.status_code == 200 {
            tracing::info!(%url, count = results.len(), "submitted results");
            SubmissionStatus::Success("Results saved to database".to_string())
        } else {
            tracing::warn!(%url, status = response.status_code, body = %response.body, "results submission failed");
            SubmissionStatus::Failure(format!(
                "Failed to send results to {} (status {})",
                url, response.status_code
            ))
        }
    }
}
