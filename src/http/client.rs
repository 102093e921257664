use async_trait::async_trait;
use reqwest::{Client, Method, Proxy, redirect};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::models::{HttpMethod, ProbeResponse};

/// A single outgoing probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeRequest {
    pub url: String,
    pub method: HttpMethod,
    pub headers: BTreeMap<String, String>,
    pub body: Option<String>,
}

impl ProbeRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: HttpMethod::Get,
            headers: BTreeMap::new(),
            body: None,
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_string(), value.into());
        self
    }
}

/// Sends one request and reports status plus body. Implementations never
/// fail: network errors come back as status 0 with a diagnostic body.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ProbeRequest) -> ProbeResponse;

    /// Problem noticed while building the transport that the caller should
    /// hear about, such as a proxy that could not be used.
    fn setup_warning(&self) -> Option<String> {
        None
    }
}

pub struct HttpClient {
    client: Client,
    proxy_warning: Option<String>,
}

impl HttpClient {
    pub fn new(timeout_secs: u64, proxy: Option<&str>) -> reqwest::Result<Self> {
        let mut builder = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .redirect(redirect::Policy::none())
            .danger_accept_invalid_certs(false);

        let mut proxy_warning = None;
        if let Some(proxy_url) = proxy.map(str::trim).filter(|p| !p.is_empty()) {
            match Proxy::all(proxy_url) {
                Ok(proxy) => builder = builder.proxy(proxy),
                Err(e) => {
                    tracing::warn!(proxy = proxy_url, error = %e, "ignoring invalid proxy, connecting directly");
                    proxy_warning = Some(format!(
                        "Invalid proxy '{}' ignored, requests were sent directly: {}",
                        proxy_url, e
                    ));
                }
            }
        }

        Ok(Self {
            client: builder.build()?,
            proxy_warning,
        })
    }

    fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
            HttpMethod::Head => Method::HEAD,
            HttpMethod::Options => Method::OPTIONS,
        }
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn send(&self, request: ProbeRequest) -> ProbeResponse {
        let method = Self::to_reqwest_method(request.method);
        let mut builder = self.client.request(method, &request.url);

        for (key, value) in &request.headers {
            builder = builder.header(key, value);
        }

        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        match builder.send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                match response.bytes().await {
                    Ok(bytes) => ProbeResponse::from_bytes(status, &bytes),
                    Err(e) => {
                        tracing::debug!(url = %request.url, error = %e, "failed to read response body");
                        ProbeResponse::error(e)
                    }
                }
            }
            Err(e) => {
                tracing::debug!(url = %request.url, error = %e, "request failed");
                ProbeResponse::error(e)
            }
        }
    }

    fn setup_warning(&self) -> Option<String> {
        self.proxy_warning.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_proxy_builds_with_warning() {
        let client = HttpClient::new(5, Some("::not a proxy::")).unwrap();
        let warning = client.setup_warning().unwrap();
        assert!(warning.contains("::not a proxy::"));

        let client = HttpClient::new(5, Some("   ")).unwrap();
        assert!(client.setup_warning().is_none());

        let client = HttpClient::new(5, Some("http://127.0.0.1:8080")).unwrap();
        assert!(client.setup_warning().is_none());
    }

    #[tokio::test]
    async fn test_unresolvable_host_becomes_status_zero() {
        let client = HttpClient::new(2, None).unwrap();
        let response = client
            .send(ProbeRequest::get("http://nonexistent.invalid/"))
            .await;
        assert!(response.is_transport_failure());
        assert!(response.body.starts_with("Error:"));
    }
}
