//! Catalog Source Implementation using Reqwest

use async_trait::async_trait;
use bridge_traits::{
    catalog::{CatalogSource, RawArtist, RawGenre, RawPlaylist, RawSong},
    error::{BridgeError, Result},
};
use parking_lot::RwLock;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

/// Default API root of the Wavify backend.
pub const DEFAULT_API_BASE_URL: &str = "https://wavifyserver.onrender.com/api/";

/// Retry policy for catalog requests
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first one
    pub max_attempts: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Exponential backoff delay after `attempt` failed attempts (1-based).
    fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Reqwest-backed [`CatalogSource`] talking to the Wavify REST API.
///
/// - JSON bodies, optional bearer token
/// - 10 second request timeout
/// - Retries 5xx/429 and transport errors with exponential backoff
/// - List calls abort as soon as the caller's token is cancelled
pub struct HttpCatalogSource {
    client: Client,
    base_url: String,
    access_token: RwLock<Option<String>>,
    retry: RetryPolicy,
}

impl HttpCatalogSource {
    /// Create a client for the given API root (must end with `/`).
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, Duration::from_secs(10))
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(10)
            .user_agent("wavify-core/0.1.0")
            .build()
            .map_err(|e| {
                BridgeError::NotAvailable(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            access_token: RwLock::new(None),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set or clear the bearer token sent with every request.
    pub fn set_access_token(&self, token: Option<String>) {
        *self.access_token.write() = token;
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn build_request(&self, method: Method, path: &str, body: Option<&Value>) -> reqwest::RequestBuilder {
        let mut req = self.client.request(method, self.endpoint(path));

        if let Some(token) = self.access_token.read().as_deref() {
            req = req.bearer_auth(token);
        }

        if let Some(body) = body {
            req = req.json(body);
        }

        req
    }

    /// Execute a request, retrying transient failures.
    async fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<reqwest::Response> {
        let mut attempt = 0;
        let mut last_error = None;

        while attempt < self.retry.max_attempts {
            debug!(
                attempt = attempt + 1,
                max_attempts = self.retry.max_attempts,
                method = %method,
                path,
                "Executing catalog request"
            );

            match self
                .build_request(method.clone(), path, body.as_ref())
                .send()
                .await
            {
                Ok(response) => {
                    let status = response.status().as_u16();

                    if status >= 500 || status == 429 {
                        warn!(status, attempt = attempt + 1, path, "Retryable HTTP status");
                        last_error = Some(BridgeError::Status {
                            status,
                            message: format!("{} {}", method, path),
                        });
                    } else if !response.status().is_success() {
                        let message = response.text().await.unwrap_or_default();
                        return Err(BridgeError::Status { status, message });
                    } else {
                        return Ok(response);
                    }
                }
                Err(e) => {
                    warn!(error = %e, attempt = attempt + 1, path, "Catalog request failed");

                    last_error = Some(if e.is_timeout() {
                        BridgeError::OperationFailed("Request timed out".to_string())
                    } else if e.is_connect() {
                        BridgeError::OperationFailed(format!("Connection failed: {}", e))
                    } else {
                        BridgeError::OperationFailed(e.to_string())
                    });
                }
            }

            attempt += 1;

            if attempt < self.retry.max_attempts {
                let delay = self.retry.delay_for(attempt);
                debug!(delay_ms = delay.as_millis() as u64, "Retrying after delay");
                sleep(delay).await;
            }
        }

        Err(last_error.unwrap_or_else(|| {
            BridgeError::OperationFailed("All retry attempts exhausted".to_string())
        }))
    }

    #[instrument(skip(self, cancel))]
    async fn get_list<T: DeserializeOwned>(&self, path: &str, cancel: CancellationToken) -> Result<Vec<T>> {
        let request = async {
            let response = self.send(Method::GET, path, None).await?;
            response
                .json::<Vec<T>>()
                .await
                .map_err(|e| BridgeError::OperationFailed(format!("Invalid response body: {}", e)))
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(path, "Catalog request cancelled");
                Err(BridgeError::Cancelled)
            }
            result = request => result,
        }
    }

    async fn mutate(&self, method: Method, path: &str, body: Option<Value>) -> Result<()> {
        self.send(method, path, body).await.map(|_| ())
    }
}

#[async_trait]
impl CatalogSource for HttpCatalogSource {
    async fn list_songs(&self, cancel: CancellationToken) -> Result<Vec<RawSong>> {
        self.get_list("songs/", cancel).await
    }

    async fn list_artists(&self, cancel: CancellationToken) -> Result<Vec<RawArtist>> {
        self.get_list("artists/", cancel).await
    }

    async fn list_genres(&self, cancel: CancellationToken) -> Result<Vec<RawGenre>> {
        self.get_list("genres/", cancel).await
    }

    async fn list_playlists(&self, cancel: CancellationToken) -> Result<Vec<RawPlaylist>> {
        self.get_list("playlists/", cancel).await
    }

    async fn list_recently_played(&self, cancel: CancellationToken) -> Result<Vec<RawSong>> {
        self.get_list("songs/recently-played/", cancel).await
    }

    async fn record_play(&self, song_id: u64) -> Result<()> {
        self.mutate(Method::POST, &format!("songs/{}/play/", song_id), None)
            .await
    }

    async fn set_liked(&self, song_id: u64, liked: bool) -> Result<()> {
        self.mutate(
            Method::PATCH,
            &format!("songs/{}/", song_id),
            Some(json!({ "is_liked": liked })),
        )
        .await
    }

    async fn set_recently_played(&self, song_id: u64) -> Result<()> {
        self.mutate(
            Method::PATCH,
            &format!("songs/{}/", song_id),
            Some(json!({ "is_recently_played": true })),
        )
        .await
    }

    async fn set_favorite(&self, artist_id: u64, favorite: bool) -> Result<()> {
        let method = if favorite { Method::POST } else { Method::DELETE };
        self.mutate(method, &format!("artists/{}/favorite/", artist_id), None)
            .await
    }
}
