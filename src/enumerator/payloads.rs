use std::collections::BTreeMap;
use url::Url;

use super::{Target, base_headers};
use crate::config::{ScanConfig, ScanKind};
use crate::http::ProbeRequest;
use crate::models::HttpMethod;

pub const FUZZ_MARKER: &str = "FUZZ";

/// Fixed list of payloads substituted into the target one at a time.
pub struct PayloadList {
    kind: ScanKind,
    target: String,
    method: HttpMethod,
    extra_params: BTreeMap<String, String>,
    headers: BTreeMap<String, String>,
    payloads: Vec<String>,
    cursor: usize,
}

impl PayloadList {
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            kind: config.kind,
            target: config.target.clone(),
            method: config.method,
            extra_params: config.extra_params.clone(),
            headers: base_headers(config),
            payloads: config.payloads.clone(),
            cursor: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.payloads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.payloads.len()
    }

    pub fn next_target(&mut self) -> Option<Target> {
        let payload = self.payloads.get(self.cursor)?.clone();
        self.cursor += 1;

        let request = match self.kind {
            ScanKind::BruteForcer => self.brute_force_request(&payload),
            _ => self.fuzz_request(&payload),
        };

        Some(Target { payload, request })
    }

    fn fuzz_request(&self, payload: &str) -> ProbeRequest {
        let mut request = ProbeRequest {
            url: self.target.clone(),
            method: self.method,
            headers: self.headers.clone(),
            body: None,
        };

        if self.method.carries_payload_body() {
            let encoded = urlencoding::encode(payload);
            let body = if self.extra_params.is_empty() {
                format!("fuzz={}", encoded)
            } else {
                self.extra_params
                    .keys()
                    .map(|key| format!("{}={}", urlencoding::encode(key), encoded))
                    .collect::<Vec<_>>()
                    .join("&")
            };
            request.body = Some(body);
            request
                .headers
                .insert("Content-Type".to_string(), "application/x-www-form-urlencoded".to_string());
        } else if self.target.contains(FUZZ_MARKER) {
            request.url = self.target.replace(FUZZ_MARKER, payload);
        } else {
            let separator = if self.target.contains('?') { '&' } else { '?' };
            request.url = format!("{}{}fuzz={}", self.target, separator, urlencoding::encode(payload));
        }

        request
    }

    fn brute_force_request(&self, payload: &str) -> ProbeRequest {
        let url = match Url::parse(&self.target) {
            Ok(mut url) => {
                let path = format!("{}/{}", url.path().trim_end_matches('/'), payload);
                url.set_path(&path);
                url.to_string()
            }
            Err(_) => format!("{}/{}", self.target.trim_end_matches('/'), payload),
        };

        ProbeRequest {
            url,
            method: self.method,
            headers: self.headers.clone(),
            body: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(kind: ScanKind, target: &str, payloads: &[&str]) -> ScanConfig {
        let mut config = ScanConfig::new(kind, target);
        config.payloads = payloads.iter().map(|p| p.to_string()).collect();
        config
    }

    #[test]
    fn test_fuzz_marker_substitution() {
        let config = list(ScanKind::Fuzzer, "http://example.test/FUZZ?x=FUZZ", &["admin"]);
        let mut payloads = PayloadList::new(&config);
        let target = payloads.next_target().unwrap();
        assert_eq!(target.request.url, "http://example.test/admin?x=admin");
        assert_eq!(target.payload, "admin");
        assert!(payloads.next_target().is_none());
        assert!(payloads.is_exhausted());
    }

    #[test]
    fn test_fuzz_query_parameter_appended() {
        let config = list(ScanKind::Fuzzer, "http://example.test/search?q=1", &["a b"]);
        let target = PayloadList::new(&config).next_target().unwrap();
        assert_eq!(target.request.url, "http://example.test/search?q=1&fuzz=a%20b");

        let config = list(ScanKind::Fuzzer, "http://example.test/search", &["x"]);
        let target = PayloadList::new(&config).next_target().unwrap();
        assert_eq!(target.request.url, "http://example.test/search?fuzz=x");
    }

    #[test]
    fn test_fuzz_post_body() {
        let mut config = list(ScanKind::Fuzzer, "http://example.test/login", &["secret"]);
        config.method = HttpMethod::Post;
        let target = PayloadList::new(&config).next_target().unwrap();
        assert_eq!(target.request.url, "http://example.test/login");
        assert_eq!(target.request.body.as_deref(), Some("fuzz=secret"));
        assert_eq!(
            target.request.headers.get("Content-Type").map(String::as_str),
            Some("application/x-www-form-urlencoded")
        );

        config.extra_params.insert("user".to_string(), "ignored".to_string());
        config.extra_params.insert("pass".to_string(), "ignored".to_string());
        let target = PayloadList::new(&config).next_target().unwrap();
        assert_eq!(target.request.body.as_deref(), Some("pass=secret&user=secret"));
    }

    #[test]
    fn test_brute_force_appends_path_segment() {
        let config = list(ScanKind::BruteForcer, "https://example.test/app/", &["admin", "backup"]);
        let mut payloads = PayloadList::new(&config);
        assert_eq!(payloads.len(), 2);
        assert_eq!(payloads.next_target().unwrap().request.url, "https://example.test/app/admin");
        assert_eq!(payloads.next_target().unwrap().request.url, "https://example.test/app/backup");

        let config = list(ScanKind::BruteForcer, "https://example.test", &["admin"]);
        let target = PayloadList::new(&config).next_target().unwrap();
        assert_eq!(target.request.url, "https://example.test/admin");
    }

    #[test]
    fn test_cookies_and_user_agent_headers() {
        let mut config = list(ScanKind::BruteForcer, "https://example.test", &["admin"]);
        config.cookies.insert("sid".to_string(), "1".to_string());
        config.cookies.insert("lang".to_string(), "en".to_string());
        let target = PayloadList::new(&config).next_target().unwrap();
        assert_eq!(target.request.headers["Cookie"], "lang=en; sid=1");
        assert_eq!(target.request.headers["User-Agent"], "reconkit-bruteforcer/1.0");
    }
}
