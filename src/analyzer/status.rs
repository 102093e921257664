use crate::models::Severity;

pub struct StatusClassifier;

impl StatusClassifier {
    /// Maps a status code to a triage label. Redirects rank above success and
    /// every 4xx/5xx ranks highest; 0 and anything outside 100..=599 is unknown.
    pub fn classify(status: u16) -> Severity {
        match status {
            100..=199 => Severity::Info,
            200..=299 => Severity::Low,
            300..=399 => Severity::Medium,
            400..=599 => Severity::High,
            _ => Severity::Unknown,
        }
    }
}
