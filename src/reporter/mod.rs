mod console;
mod export;
mod submit;

pub use console::ConsoleReporter;
pub use export::{HtmlExporter, JsonExporter};
pub use submit::{ReportSubmitter, SubmissionStatus};
