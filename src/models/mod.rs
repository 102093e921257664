mod event;
mod method;
mod report;
mod result;

pub use event::{ControlResponse, ProgressUpdate, RunState, ScanEvent, StatusUpdate};
pub use method::HttpMethod;
pub use report::{ScanReport, ScanStats, SeveritySummary};
pub use result::{BodyMetrics, ProbeResponse, ScanResult, Severity};
