//! HTTP plumbing shared by every provider

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::ProviderConfig;
use crate::error::ProviderError;

/// Shared upstream client plus the fan-out width providers enrich with.
///
/// Cloning is cheap; every provider of a registry holds a clone of the same
/// connection pool.
#[derive(Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
    max_concurrent_fetches: usize,
}

impl UpstreamClient {
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            max_concurrent_fetches: config.max_concurrent_fetches.max(1),
        })
    }

    pub fn max_concurrent_fetches(&self) -> usize {
        self.max_concurrent_fetches
    }

    /// GET `url` and decode its JSON body
    ///
    /// # Returns
    /// * `Err(ProviderError::NotFound)` - upstream answered 404
    /// * `Err(ProviderError::UnexpectedStatus)` - any other non-2xx status
    /// * `Err(ProviderError::InvalidResponse)` - the body is not the expected JSON
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ProviderError> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ProviderError::NotFound(url.to_string()));
        }

        if !status.is_success() {
            warn!("Upstream returned status {}: {}", status, url);
            return Err(ProviderError::UnexpectedStatus {
                status,
                url: url.to_string(),
            });
        }

        response.json().await.map_err(|e| {
            warn!("Failed to parse upstream response from {}: {}", url, e);
            ProviderError::InvalidResponse(e.to_string())
        })
    }
}

/// Percent-encode `value` for use as a single URL path segment.
///
/// Only RFC 3986 unreserved characters pass through, so `/`, `?`, `#` and `%`
/// can never change which resource is addressed.
pub fn encode_path_segment(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}

/// Encoded path segment for a caller supplied id, or `None` when the id is
/// empty or a dot segment that URL normalization would collapse
pub fn path_segment(value: &str) -> Option<String> {
    match value {
        "" | "." | ".." => None,
        _ => Some(encode_path_segment(value)),
    }
}
