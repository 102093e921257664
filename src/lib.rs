pub mod analyzer;
pub mod cli;
pub mod config;
pub mod enumerator;
pub mod error;
pub mod http;
pub mod models;
pub mod reporter;
pub mod scanner;

pub use analyzer::{LengthFilter, ResultFilter, StatusClassifier};
pub use config::{ScanConfig, ScanKind, ScanParams};
pub use error::{ConfigError, ScanError};
pub use http::{HttpClient, ProbeRequest, Transport};
pub use models::{
    ControlResponse, HttpMethod, ProgressUpdate, RunState, ScanEvent, ScanReport, ScanResult,
    ScanStats, Severity, StatusUpdate,
};
pub use reporter::{ConsoleReporter, HtmlExporter, JsonExporter, ReportSubmitter, SubmissionStatus};
pub use scanner::{RunId, ScanControl, ScanController, ScanOutcome, ScanRegistry};
