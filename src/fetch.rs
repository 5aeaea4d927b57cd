use crate::config::QueryProfile;
use crate::trace::LogSink;
use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{info, warn};

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub trait FetchClient {
    fn fetch(&self, url: &str, headers: &BTreeMap<String, String>) -> Result<FetchResponse>;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn for_profile(profile: &QueryProfile) -> Result<Self> {
        let user_agent = profile
            .fetch
            .user_agent
            .as_deref()
            .unwrap_or(DEFAULT_USER_AGENT);

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_str(user_agent)?);

        let client = Client::builder()
            .timeout(Duration::from_secs(profile.fetch.timeout_secs))
            .default_headers(headers)
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self { client })
    }
}

impl FetchClient for HttpFetcher {
    fn fetch(&self, url: &str, headers: &BTreeMap<String, String>) -> Result<FetchResponse> {
        let mut header_map = HeaderMap::new();
        for (k, v) in headers {
            let name = HeaderName::from_bytes(k.as_bytes())
                .with_context(|| format!("invalid header name {k}"))?;
            let value = HeaderValue::from_str(v)
                .with_context(|| format!("invalid header value for {k}"))?;
            header_map.insert(name, value);
        }

        let resp = self
            .client
            .get(url)
            .headers(header_map)
            .send()
            .with_context(|| format!("request to {url} failed"))?;
        let status = resp.status().as_u16();
        let body = resp
            .text()
            .with_context(|| format!("failed to read body from {url}"))?;

        Ok(FetchResponse { status, body })
    }
}

/// Fetches the profile's search page. Any failure degrades to `None`.
pub fn fetch_search_page(
    client: &dyn FetchClient,
    profile: &QueryProfile,
    sink: &mut dyn LogSink,
) -> Option<String> {
    let url = profile.search_url();
    sink.record(format!("Fetching search results from: {url}"));

    match client.fetch(&url, &profile.fetch.headers) {
        Ok(resp) if resp.is_success() => {
            info!(
                profile = %profile.key(),
                status = resp.status,
                bytes = resp.body.len(),
                url = %url,
                "fetched search page"
            );
            Some(resp.body)
        }
        Ok(resp) => {
            warn!(profile = %profile.key(), status = resp.status, url = %url, "search page returned non-success status");
            sink.record(format!(
                "Failed to fetch search results, status: {}",
                resp.status
            ));
            None
        }
        Err(err) => {
            warn!(profile = %profile.key(), error = %err, url = %url, "search page fetch errored");
            sink.record(format!("Error fetching search results: {err:#}"));
            None
        }
    }
}
