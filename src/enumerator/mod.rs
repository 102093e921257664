mod frontier;
mod links;
mod payloads;

pub use frontier::Frontier;
pub use links::{PageLinks, extract_links};
pub use payloads::{FUZZ_MARKER, PayloadList};

use std::collections::BTreeMap;
use url::Url;

use crate::config::{ScanConfig, ScanKind};
use crate::error::ConfigError;
use crate::http::ProbeRequest;
use crate::models::ProbeResponse;

/// One probe to issue, with the payload or link that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub payload: String,
    pub request: ProbeRequest,
}

/// Page details recorded for crawled URLs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageInfo {
    pub title: Option<String>,
    pub link_count: usize,
}

pub enum Enumerator {
    Frontier(Frontier),
    Payloads(PayloadList),
}

impl Enumerator {
    pub fn for_config(config: &ScanConfig) -> Result<Self, ConfigError> {
        match config.kind {
            ScanKind::Crawler => {
                let start = Url::parse(&config.target).map_err(|source| ConfigError::InvalidUrl {
                    url: config.target.clone(),
                    source,
                })?;
                Ok(Enumerator::Frontier(Frontier::new(start, config)))
            }
            ScanKind::Fuzzer | ScanKind::BruteForcer => {
                Ok(Enumerator::Payloads(PayloadList::new(config)))
            }
        }
    }

    pub fn next_target(&mut self) -> Option<Target> {
        match self {
            Enumerator::Frontier(frontier) => frontier.next_target(),
            Enumerator::Payloads(payloads) => payloads.next_target(),
        }
    }

    /// Feeds a probe outcome back. Only the frontier uses it, to grow the crawl.
    pub fn observe(&mut self, target: &Target, response: &ProbeResponse) -> Option<PageInfo> {
        match self {
            Enumerator::Frontier(frontier) => Some(frontier.observe(target, response)),
            Enumerator::Payloads(_) => None,
        }
    }

    pub fn quota_reached(&self) -> bool {
        match self {
            Enumerator::Frontier(frontier) => frontier.quota_reached(),
            Enumerator::Payloads(payloads) => payloads.is_exhausted(),
        }
    }
}

pub(crate) fn base_headers(config: &ScanConfig) -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();
    headers.insert("User-Agent".to_string(), config.user_agent.clone());
    if !config.cookies.is_empty() {
        let cookie = config
            .cookies
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("; ");
        headers.insert("Cookie".to_string(), cookie);
    }
    headers
}
