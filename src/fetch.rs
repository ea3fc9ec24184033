use std::time::Duration;

use anyhow::{anyhow, Result};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::StatusCode;

use crate::merge::Fetch;

const CLIENT_USER_AGENT: &str = "Mozilla/5.0 (compatible; merge-sites/1.0)";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(25);

/// Blocking HTTP collaborator. The client is built once with the fixed
/// identifying header and a bounded per-request timeout; every fetch is a
/// single GET with no retries.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String> {
        let resp = self.client.get(url).send()?;
        if resp.status() != StatusCode::OK {
            return Err(anyhow!("HTTP {}", resp.status()));
        }
        Ok(resp.text()?)
    }
}
