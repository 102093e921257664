mod params;
mod wordlist;

pub use params::{FlagParam, KeyValueParam, NumberParam, ScanParams, StatusListParam, WordListParam};
pub use wordlist::{ResolutionStep, UPLOAD_DIRS, WordlistResolver};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::analyzer::{LengthFilter, ResultFilter};
use crate::error::ConfigError;
use crate::models::HttpMethod;

pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanKind {
    Crawler,
    Fuzzer,
    BruteForcer,
}

impl fmt::Display for ScanKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.api_name())
    }
}

impl ScanKind {
    /// Name used in submission endpoints and log fields.
    pub fn api_name(&self) -> &'static str {
        match self {
            ScanKind::Crawler => "crawler",
            ScanKind::Fuzzer => "fuzzer",
            ScanKind::BruteForcer => "bruteforcer",
        }
    }

    pub fn default_wordlist(&self) -> Vec<String> {
        let words: &[&str] = match self {
            ScanKind::Crawler => &[],
            ScanKind::Fuzzer => &["test", "admin", "password", "123456"],
            ScanKind::BruteForcer => &["admin", "test", "password", "backup", "config"],
        };
        words.iter().map(|w| w.to_string()).collect()
    }

    pub fn default_user_agent(&self) -> &'static str {
        match self {
            ScanKind::Crawler => "reconkit-crawler/1.0",
            ScanKind::Fuzzer => "reconkit-fuzzer/1.0",
            ScanKind::BruteForcer => "reconkit-bruteforcer/1.0",
        }
    }

    fn default_scheme(&self) -> &'static str {
        match self {
            ScanKind::BruteForcer => "https://",
            ScanKind::Crawler | ScanKind::Fuzzer => "http://",
        }
    }

    /// Report location relative to the output directory.
    pub fn report_file(&self) -> PathBuf {
        let (dir, file) = match self {
            ScanKind::Crawler => ("outputs_crawler", "crawl_results.json"),
            ScanKind::Fuzzer => ("outputs_fuzzer", "fuzz_results.json"),
            ScanKind::BruteForcer => ("outputs_bruteforcer", "brute_force_results.json"),
        };
        Path::new(dir).join(file)
    }
}

/// Where finished reports are pushed, best effort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitTarget {
    pub endpoint: String,
    pub project: String,
}

impl SubmitTarget {
    pub fn url_for(&self, kind: ScanKind) -> String {
        format!(
            "{}/submit_results/{}/{}",
            self.endpoint.trim_end_matches('/'),
            kind.api_name(),
            urlencoding::encode(&self.project)
        )
    }
}

/// Validated, immutable scan configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanConfig {
    pub kind: ScanKind,
    pub target: String,
    pub payloads: Vec<String>,
    pub method: HttpMethod,
    pub cookies: BTreeMap<String, String>,
    pub proxy: Option<String>,
    pub filter: ResultFilter,
    pub extra_params: BTreeMap<String, String>,
    pub live_updates: bool,
    pub max_depth: Option<usize>,
    pub max_pages: Option<usize>,
    pub user_agent: String,
    pub delay: Option<Duration>,
    pub timeout_secs: u64,
    pub output_dir: PathBuf,
    pub submit: Option<SubmitTarget>,
}

impl ScanConfig {
    /// Minimal configuration with every optional feature at its default.
    pub fn new(kind: ScanKind, target: impl Into<String>) -> Self {
        Self {
            kind,
            target: target.into(),
            payloads: kind.default_wordlist(),
            method: HttpMethod::Get,
            cookies: BTreeMap::new(),
            proxy: None,
            filter: ResultFilter::default(),
            extra_params: BTreeMap::new(),
            live_updates: true,
            max_depth: None,
            max_pages: None,
            user_agent: kind.default_user_agent().to_string(),
            delay: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            output_dir: PathBuf::from("."),
            submit: None,
        }
    }

    pub fn from_params(kind: ScanKind, params: ScanParams) -> Result<Self, ConfigError> {
        Self::from_params_with(kind, params, &WordlistResolver::default())
    }

    pub fn from_params_with(
        kind: ScanKind,
        params: ScanParams,
        resolver: &WordlistResolver,
    ) -> Result<Self, ConfigError> {
        let raw_target = params
            .target_url
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingTarget)?;
        let target = normalize_target(kind, raw_target)?;

        let mut config = Self::new(kind, target);

        if kind != ScanKind::Crawler {
            let words = params
                .word_list
                .as_ref()
                .and_then(|source| resolver.resolve(source))
                .map(|(step, words)| {
                    tracing::debug!(?step, count = words.len(), "resolved wordlist");
                    words
                })
                .unwrap_or_default();
            if params.word_list.as_ref().is_some_and(WordListParam::is_malformed) {
                tracing::warn!("word_list is neither a list nor a string, ignoring");
            }
            if words.is_empty() {
                tracing::info!(kind = %kind, "no payloads resolved, using built-in wordlist");
            } else {
                config.payloads = words;
            }
        } else {
            config.payloads.clear();
        }

        if let Some(method) = params.http_method.as_deref().filter(|m| !m.trim().is_empty()) {
            match HttpMethod::parse(method) {
                Some(parsed) if kind != ScanKind::Crawler => config.method = parsed,
                Some(_) => {}
                None => tracing::warn!(method, "unsupported HTTP method, using GET"),
            }
        }

        for (field, value) in [("cookies", &params.cookies), ("additional_parameters", &params.additional_parameters)] {
            if let Some(KeyValueParam::Other(raw)) = value {
                if !raw.is_object() {
                    tracing::warn!(field, value = %raw, "expected a map or k=v string, ignoring");
                }
            }
        }
        if let Some(cookies) = &params.cookies {
            config.cookies = cookies.pairs(';');
        }
        if let Some(extra) = &params.additional_parameters {
            config.extra_params = extra.pairs('&');
        }

        if let Some(hide) = &params.hide_status {
            config.filter.hide_status = hide.codes();
        }
        if let Some(show) = &params.show_status {
            config.filter.show_status = show.codes();
        }
        if let Some(length) = &params.filter_by_content_length {
            let text = length.as_text();
            if !text.trim().is_empty() {
                config.filter.content_length = LengthFilter::parse(&text);
                if config.filter.content_length.is_none() {
                    tracing::warn!(filter = %text, "invalid content length filter, ignoring");
                }
            }
        }

        config.proxy = params
            .proxy
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());

        if let Some(flag) = &params.show_results {
            match flag.value() {
                Some(live) => config.live_updates = live,
                None => tracing::warn!(value = %flag.as_text(), "invalid show_results flag, keeping live updates"),
            }
        }

        config.max_depth = positive(params.depth.as_ref(), "depth");
        config.max_pages = positive(params.max_pages.as_ref(), "max_pages");
        config.delay = positive(params.delay.as_ref(), "delay").map(|secs| Duration::from_secs(secs as u64));

        if let Some(agent) = params.user_agent.filter(|a| !a.trim().is_empty()) {
            config.user_agent = agent;
        }
        if let Some(timeout) = positive(params.timeout.as_ref(), "timeout") {
            config.timeout_secs = timeout as u64;
        }
        if let Some(dir) = params.output_dir {
            config.output_dir = dir;
        }

        config.submit = params
            .submit_url
            .filter(|u| !u.trim().is_empty())
            .map(|endpoint| SubmitTarget {
                endpoint,
                project: params.project.unwrap_or_else(|| "default".to_string()),
            });

        Ok(config)
    }

    pub fn report_path(&self) -> PathBuf {
        self.output_dir.join(self.kind.report_file())
    }

    /// Number of targets known up front, `None` for an uncapped crawl.
    pub fn total_targets(&self) -> Option<usize> {
        match self.kind {
            ScanKind::Crawler => self.max_pages,
            ScanKind::Fuzzer | ScanKind::BruteForcer => Some(self.payloads.len()),
        }
    }
}

fn normalize_target(kind: ScanKind, raw: &str) -> Result<String, ConfigError> {
    let lowered = raw.to_ascii_lowercase();
    let with_scheme = if lowered.starts_with("http://") || lowered.starts_with("https://") {
        raw.to_string()
    } else {
        format!("{}{}", kind.default_scheme(), raw)
    };

    if kind == ScanKind::Crawler {
        let mut url = Url::parse(&with_scheme).map_err(|source| ConfigError::InvalidUrl {
            url: with_scheme.clone(),
            source,
        })?;
        url.set_fragment(None);
        return Ok(url.to_string());
    }

    Ok(with_scheme)
}

fn positive(param: Option<&NumberParam>, name: &str) -> Option<usize> {
    let param = param?;
    match param.value() {
        Some(n) if n > 0 => usize::try_from(n).ok(),
        Some(_) => None,
        None => {
            if !param.as_text().trim().is_empty() {
                tracing::warn!(field = name, value = %param.as_text(), "ignoring non-numeric value");
            }
            None
        }
    }
}
