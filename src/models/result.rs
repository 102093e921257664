use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse triage label derived from the HTTP status of a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Unknown,
}

impl Severity {
    pub fn numeric_value(&self) -> u8 {
        match self {
            Severity::Unknown => 0,
            Severity::Info => 1,
            Severity::Low => 2,
            Severity::Medium => 3,
            Severity::High => 4,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Info => "Info",
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
            Severity::Unknown => "Unknown",
        };
        write!(f, "{}", s)
    }
}

/// Raw outcome of a single transport call. `length` is the body size on the
/// wire, which differs from `body.len()` when the body was not valid UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResponse {
    pub status_code: u16,
    pub body: String,
    pub length: usize,
}

impl ProbeResponse {
    pub fn new(status_code: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        Self {
            status_code,
            length: body.len(),
            body,
        }
    }

    pub fn from_bytes(status_code: u16, bytes: &[u8]) -> Self {
        Self {
            status_code,
            body: String::from_utf8_lossy(bytes).into_owned(),
            length: bytes.len(),
        }
    }

    pub fn error(err: impl fmt::Display) -> Self {
        Self {
            status_code: 0,
            body: format!("Error: {}", err),
            length: 0,
        }
    }

    /// Body metrics for the report; all zero for a transport failure.
    pub fn metrics(&self) -> BodyMetrics {
        if self.is_transport_failure() {
            return BodyMetrics::default();
        }
        BodyMetrics {
            length: self.length,
            ..BodyMetrics::measure(&self.body)
        }
    }

    pub fn is_transport_failure(&self) -> bool {
        self.status_code == 0
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyMetrics {
    pub length: usize,
    pub lines: usize,
    pub words: usize,
    pub chars: usize,
}

impl BodyMetrics {
    pub fn measure(body: &str) -> Self {
        Self {
            length: body.len(),
            lines: body.matches('\n').count(),
            words: body.split_whitespace().count(),
            chars: body.chars().count(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    pub id: u64,
    pub url: String,
    pub payload: String,
    pub status_code: u16,
    pub severity: Severity,
    pub length: usize,
    pub lines: usize,
    pub words: usize,
    pub chars: usize,
    pub error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_count: Option<usize>,
}

impl ScanResult {
    pub fn new(
        id: u64,
        url: String,
        payload: String,
        status_code: u16,
        severity: Severity,
        metrics: BodyMetrics,
        error: bool,
    ) -> Self {
        Self {
            id,
            url,
            payload,
            status_code,
            severity,
            length: metrics.length,
            lines: metrics.lines,
            words: metrics.words,
            chars: metrics.chars,
            error,
            title: None,
            link_count: None,
        }
    }

    pub fn with_page_info(mut self, title: Option<String>, link_count: usize) -> Self {
        self.title = Some(title.unwrap_or_else(|| "No Title".to_string()));
        self.link_count = Some(link_count);
        self
    }
}
