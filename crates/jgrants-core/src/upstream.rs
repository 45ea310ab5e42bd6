//! Client for the jGrants public API.
//!
//! Every operation performs exactly one GET and normalizes failures into [`UpstreamError`].

use crate::error::{Result, UpstreamError};
use crate::overview::{Overview, OverviewFormat};
use crate::query::SearchQuery;
use crate::shaping;
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

/// Public jGrants API endpoint.
pub const API_BASE_URL: &str = "https://api.jgrants-portal.go.jp/exp/v1/public";

/// Upstream error bodies are truncated to this many bytes before being kept.
const MAX_ERROR_BODY_BYTES: usize = 512;

/// Shared, immutable handle to the upstream API.
///
/// Cloning is cheap; all clones share one connection pool.
#[derive(Debug, Clone)]
pub struct JgrantsClient {
    inner: Arc<ClientInner>,
}

#[derive(Debug)]
struct ClientInner {
    http: Client,
    base_url: Url,
}

impl JgrantsClient {
    /// # Errors
    ///
    /// Returns an error if `base_url` is not an absolute `http(s)` URL.
    pub fn new(base_url: &str) -> std::result::Result<Self, UpstreamError> {
        Self::with_http_client(base_url, Client::new())
    }

    /// Build a client that reuses an existing `reqwest::Client`.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not an absolute `http(s)` URL.
    pub fn with_http_client(
        base_url: &str,
        http: Client,
    ) -> std::result::Result<Self, UpstreamError> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| UpstreamError::Url(format!("'{base_url}': {e}")))?;
        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            return Err(UpstreamError::Url(format!(
                "'{base_url}' is not an http(s) base URL"
            )));
        }
        Ok(Self {
            inner: Arc::new(ClientInner { http, base_url }),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Search subsidies matching `query`.
    ///
    /// # Errors
    ///
    /// Returns an error if the upstream call fails.
    pub async fn search(&self, query: &SearchQuery) -> Result<Value> {
        let url = self.endpoint(&["subsidies"], &query.query_pairs())?;
        let envelope = self.get_json(url).await?;
        Ok(shaping::search_result(envelope, query))
    }

    /// Fetch one subsidy record by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the upstream call fails (a 404 is reported as
    /// [`crate::GrantsError::is_not_found`]) or the envelope holds no record.
    pub async fn subsidy_detail(&self, subsidy_id: &str) -> Result<Value> {
        let url = self.endpoint(&["subsidies", "id", subsidy_id], &[])?;
        let envelope = self.get_json(url).await?;
        shaping::unwrap_detail(envelope)
    }

    /// Aggregate statistics over the broad default search.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying search fails.
    pub async fn overview(&self, format: OverviewFormat) -> Result<Overview> {
        let query = SearchQuery::broad();
        let result = self.search(&query).await?;
        Ok(Overview::from_search_result(
            &result,
            format,
            chrono::Utc::now(),
        ))
    }

    fn endpoint(
        &self,
        segments: &[&str],
        query: &[(&'static str, String)],
    ) -> std::result::Result<Url, UpstreamError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| UpstreamError::Url(format!("'{}' cannot be a base", self.base_url())))?
            .pop_if_empty()
            .extend(segments);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    /// GET `url` and parse the body as JSON.
    async fn get_json(&self, url: Url) -> std::result::Result<Value, UpstreamError> {
        debug!(url = %url, "upstream GET");
        let response = self
            .inner
            .http
            .get(url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| UpstreamError::Transport(sanitize_reqwest_error(&e)))?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            truncate_utf8(&mut body, MAX_ERROR_BODY_BYTES);
            warn!(url = %url, status = status.as_u16(), "upstream returned error status");
            return Err(UpstreamError::Status { status, body });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| UpstreamError::Transport(sanitize_reqwest_error(&e)))?;
        serde_json::from_slice(&bytes).map_err(|e| UpstreamError::Decode(e.to_string()))
    }
}

/// Render a reqwest error without leaking credentials embedded in the request URL.
fn sanitize_reqwest_error(e: &reqwest::Error) -> String {
    let mut msg = e.to_string();
    if let Some(u) = e.url()
        && (!u.username().is_empty() || u.password().is_some())
    {
        let mut redacted = u.clone();
        let _ = redacted.set_username("");
        let _ = redacted.set_password(None);
        msg = msg.replace(u.as_str(), redacted.as_str());
    }
    msg
}

fn truncate_utf8(s: &mut String, max: usize) {
    if s.len() <= max {
        return;
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    s.truncate(cut);
}
