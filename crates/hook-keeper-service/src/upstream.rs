//! # Upstream Relay Client
//!
//! Issues one outbound request to the upstream API per inbound request and
//! buffers the response in full. No retries: a transport-level failure
//! propagates to the caller, which surfaces it as a failed relay.

use crate::UpstreamConfig;
use bytes::Bytes;
use http::header::{ACCEPT_ENCODING, CONTENT_LENGTH, HOST, TRANSFER_ENCODING};
use http::{HeaderMap, Method, StatusCode};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Fully buffered response from the upstream API
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Errors from the upstream relay client
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// The configured base URL could not be parsed (startup error).
    #[error("Invalid upstream base URL '{url}': {message}")]
    InvalidBaseUrl { url: String, message: String },

    /// The HTTP client could not be constructed (startup error).
    #[error("Failed to create HTTP client: {message}")]
    ClientBuild { message: String },

    /// The inbound path could not be joined onto the base URL.
    #[error("Invalid relay path '{path}': {message}")]
    InvalidPath { path: String, message: String },

    /// Connection-level failure talking to the upstream (retryable by the
    /// caller's infrastructure, not by this client).
    #[error("Upstream transport error: {message}")]
    Transport { message: String },
}

impl UpstreamError {
    /// Check if this error represents a transient condition.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

/// HTTP client relaying requests to the upstream API
///
/// Wraps a shared `reqwest::Client` configured once at startup. The base URL
/// is configurable so tests can point the relay at a mock server.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    base_url: Url,
}

impl UpstreamClient {
    /// Create a client from the upstream configuration.
    pub fn new(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let base_url =
            Url::parse(&config.base_url).map_err(|e| UpstreamError::InvalidBaseUrl {
                url: config.base_url.clone(),
                message: e.to_string(),
            })?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| UpstreamError::ClientBuild {
                message: e.to_string(),
            })?;

        Ok(Self { http, base_url })
    }

    /// Base URL requests are relayed to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Hostname of the upstream API.
    pub fn host(&self) -> &str {
        self.base_url.host_str().unwrap_or_default()
    }

    /// Relay one request to the upstream and buffer the response.
    ///
    /// Headers are forwarded verbatim except:
    /// - `Host` is dropped; the client derives it from the upstream URL, so
    ///   the outbound request always names the upstream host.
    /// - `Accept-Encoding` is dropped so the upstream never compresses the
    ///   body (the augmenter has to parse it as text).
    /// - Framing headers (`Content-Length`, `Transfer-Encoding`) are dropped;
    ///   the client recomputes them from the actual body.
    pub async fn relay(
        &self,
        method: Method,
        path_and_query: &str,
        headers: &HeaderMap,
        body: Bytes,
    ) -> Result<UpstreamResponse, UpstreamError> {
        let url = self
            .base_url
            .join(path_and_query)
            .map_err(|e| UpstreamError::InvalidPath {
                path: path_and_query.to_string(),
                message: e.to_string(),
            })?;

        let mut outbound = HeaderMap::with_capacity(headers.len());
        for (name, value) in headers {
            if *name == HOST
                || *name == ACCEPT_ENCODING
                || *name == CONTENT_LENGTH
                || *name == TRANSFER_ENCODING
            {
                continue;
            }
            outbound.append(name.clone(), value.clone());
        }

        debug!(method = %method, url = %url, "Relaying request upstream");

        let response = self
            .http
            .request(method, url)
            .headers(outbound)
            .body(body)
            .send()
            .await
            .map_err(|e| UpstreamError::Transport {
                message: e.to_string(),
            })?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| UpstreamError::Transport {
                message: e.to_string(),
            })?;

        debug!(status = %status, bytes = body.len(), "Upstream response buffered");

        Ok(UpstreamResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
#[path = "upstream_tests.rs"]
mod tests;
