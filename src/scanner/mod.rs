mod control;
mod controller;
mod registry;

pub use control::ScanControl;
pub use controller::{PreparedRun, ScanController, ScanOutcome};
pub use registry::{LaunchedScan, RunId, RunSummary, ScanRegistry};
