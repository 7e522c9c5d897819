//! `OmdbClient` - OMDB API client implementation.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::instrument;
use url::Url;

use super::api::OmdbApi;
use super::types::{
    DetailRecord, OmdbSearchResponse, OmdbStatus, PlotLength, SearchPage, SearchParams,
};

/// Default base URL for the OMDB API.
pub const DEFAULT_BASE_URL: &str = "https://www.omdbapi.com/";

/// Default minimum spacing between requests (10 req/s).
const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(100);

/// Default per-request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// OMDB API client.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct OmdbClient {
    /// HTTP client.
    http_client: Client,
    /// Base URL for API requests.
    base_url: Url,
    /// API key sent as the `apikey` query parameter.
    api_key: String,
    /// Minimum spacing between two requests of this client.
    min_interval: Duration,
    /// Send time of the previous request, shared by concurrent tasks.
    last_request: Arc<Mutex<Option<Instant>>>,
}

/// Builder for `OmdbClient`.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct OmdbClientBuilder {
    base_url: Option<Url>,
    api_key: Option<String>,
    user_agent: Option<String>,
    min_interval: Option<Duration>,
    timeout: Option<Duration>,
}

impl OmdbClientBuilder {
    /// Creates a new builder.
    const fn new() -> Self {
        Self {
            base_url: None,
            api_key: None,
            user_agent: None,
            min_interval: None,
            timeout: None,
        }
    }

    /// Overrides the base URL (config override, or wiremock in tests).
    #[must_use]
    pub fn base_url(mut self, url: Url) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Sets the API key (required).
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the User-Agent (required).
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Sets the minimum request interval (default: 100ms).
    #[must_use]
    pub const fn min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = Some(interval);
        self
    }

    /// Sets the per-request timeout (default: 10s).
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// - `api_key` is not set or blank.
    /// - `user_agent` is not set.
    /// - `reqwest::Client` build fails.
    pub fn build(self) -> Result<OmdbClient> {
        let api_key = self.api_key.context("api_key is required")?;
        if api_key.trim().is_empty() {
            bail!("api_key must not be empty");
        }
        let user_agent = self.user_agent.context("user_agent is required")?;

        let base_url = if let Some(url) = self.base_url {
            url
        } else {
            let result = Url::parse(DEFAULT_BASE_URL);
            result.context("invalid default base URL")?
        };

        let http_client = Client::builder()
            .user_agent(&user_agent)
            .gzip(true)
            .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
            .build()
            .context("failed to build HTTP client")?;

        Ok(OmdbClient {
            http_client,
            base_url,
            api_key,
            min_interval: self.min_interval.unwrap_or(DEFAULT_MIN_INTERVAL),
            last_request: Arc::new(Mutex::new(None)),
        })
    }
}

impl OmdbClient {
    /// Creates a new builder.
    #[must_use]
    pub const fn builder() -> OmdbClientBuilder {
        OmdbClientBuilder::new()
    }

    /// Waits until `min_interval` has passed since the previous request.
    ///
    /// The lock is held across the sleep, so the page requests of a listing
    /// and any concurrent search or detail request go out one at a time.
    async fn pace(&self) {
        let mut last_request = self.last_request.lock().await;
        if let Some(last) = *last_request {
            let remaining = self.min_interval.saturating_sub(last.elapsed());
            if !remaining.is_zero() {
                tracing::debug!(wait_ms = remaining.as_millis(), "pacing OMDB request");
                tokio::time::sleep(remaining).await;
            }
        }
        *last_request = Some(Instant::now());
    }

    /// Sends a paced GET request with the API key and query params, and
    /// returns the body of a successful response.
    #[instrument(skip_all)]
    async fn get_body(&self, query: &[(&str, String)]) -> Result<String> {
        self.pace().await;

        // The API key is appended after logging so it never reaches the logs.
        tracing::debug!(base_url = %self.base_url, query = ?query, "OMDB API request");

        let request = self
            .http_client
            .get(self.base_url.clone())
            .query(query)
            .query(&[("apikey", self.api_key.as_str())])
            .build()
            .context("failed to build request")?;

        let result = self.http_client.execute(request).await;
        let response = result.context("request to OMDB failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<failed to read body>"));
            if let Ok(envelope) = serde_json::from_str::<OmdbStatus>(&body)
                && let Some(message) = envelope.failure()
            {
                bail!("OMDB API error (HTTP {status}): {message}");
            }
            bail!("OMDB API error (HTTP {status}): {body}");
        }

        response
            .text()
            .await
            .context("failed to read response body")
    }
}

/// Decodes a JSON body, naming the target in the error.
fn decode<T: DeserializeOwned>(body: &str, what: &str) -> Result<T> {
    let raw_result: std::result::Result<T, _> = serde_json::from_str(body);
    raw_result.with_context(|| format!("failed to decode {what} response"))
}

impl OmdbApi for OmdbClient {
    #[instrument(skip_all, fields(query = %params.query, page = params.page))]
    async fn search(&self, params: &SearchParams) -> Result<SearchPage> {
        let mut query: Vec<(&str, String)> = vec![("s", params.query.clone())];
        if let Some(media_type) = params.media_type {
            query.push(("type", String::from(media_type.as_str())));
        }
        if let Some(year) = params.year {
            query.push(("y", year.to_string()));
        }
        query.push(("page", params.page.to_string()));

        let body = self.get_body(&query).await?;
        let response: OmdbSearchResponse = decode(&body, "search")?;
        let page = response.into_page()?;

        tracing::debug!(
            fetched = page.items.len(),
            total = ?page.total_results,
            "OMDB search page received"
        );
        Ok(page)
    }

    #[instrument(skip_all, fields(imdb_id = %imdb_id))]
    async fn details(&self, imdb_id: &str, plot: PlotLength) -> Result<DetailRecord> {
        let query = [
            ("i", String::from(imdb_id)),
            ("plot", String::from(plot.as_str())),
        ];

        let body = self.get_body(&query).await?;
        let envelope: OmdbStatus = decode(&body, "detail")?;
        if let Some(message) = envelope.failure() {
            bail!("OMDB API error: {message} ({imdb_id})");
        }
        decode(&body, "detail")
    }
}
