//! Spotify Web API client
//!
//! The client owns its OAuth token state. Every request first calls
//! [`SpotifyClient::ensure_fresh_token`], which refreshes the access token through
//! the accounts service when it is missing or about to expire. A 401 from the API
//! forces one refresh before the request is given up on.

use super::{CatalogApi, Page, PageRequest, Resource};
use crate::config::{RetryConfig, SecretString, SpotifyConfig};
use crate::domain::{CurrentUser, ExportError, RemoteFetchError};
use crate::log_retry_attempt;
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, ClientBuilder, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Refresh this long before the access token expires
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Default wait when a 429 carries no usable `Retry-After`
const DEFAULT_RETRY_AFTER_SECS: u64 = 1;

struct TokenState {
    access_token: Option<String>,
    refresh_token: Option<SecretString>,
    /// `None` when the token came from configuration and its lifetime is unknown
    expires_at: Option<Instant>,
}

impl TokenState {
    fn usable_token(&self) -> Option<&str> {
        let token = self.access_token.as_deref()?;
        match self.expires_at {
            Some(expires_at) if expires_at <= Instant::now() + EXPIRY_MARGIN => None,
            _ => Some(token),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Spotify Web API client
///
/// # Example
///
/// ```no_run
/// use playlist_export::adapters::spotify::{CatalogApi, SpotifyClient};
/// use playlist_export::config::SpotifyConfig;
///
/// # async fn example() -> playlist_export::domain::Result<()> {
/// let config = SpotifyConfig::default();
/// let client = SpotifyClient::new(&config)?;
/// let me = client.current_user().await?;
/// println!("Exporting for {}", me.id);
/// # Ok(())
/// # }
/// ```
pub struct SpotifyClient {
    client: Client,
    api_base_url: String,
    accounts_url: String,
    client_id: String,
    client_secret: Option<SecretString>,
    retry: RetryConfig,
    tokens: Mutex<TokenState>,
}

impl SpotifyClient {
    /// Create a client from configuration
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Configuration`] if the HTTP client cannot be built.
    pub fn new(config: &SpotifyConfig) -> Result<Self, ExportError> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ExportError::Configuration(format!("Failed to build HTTP client: {e}")))?;

        let access_token = config
            .access_token
            .as_ref()
            .map(|token| token.expose_secret().as_ref().to_string())
            .filter(|token| !token.is_empty());

        Ok(Self {
            client,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            accounts_url: config.accounts_url.trim_end_matches('/').to_string(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            retry: config.retry.clone(),
            tokens: Mutex::new(TokenState {
                access_token,
                refresh_token: config.refresh_token.clone(),
                expires_at: None,
            }),
        })
    }

    /// Base URL of the Web API
    pub fn base_url(&self) -> &str {
        &self.api_base_url
    }

    /// Return an access token that is valid for at least another minute,
    /// refreshing it first if necessary
    ///
    /// # Errors
    ///
    /// Returns [`RemoteFetchError::TokenRefreshFailed`] if a refresh is needed and
    /// fails, or [`RemoteFetchError::Unauthorized`] if there is nothing to refresh with.
    pub async fn ensure_fresh_token(&self) -> Result<String, RemoteFetchError> {
        let mut state = self.tokens.lock().await;
        if let Some(token) = state.usable_token() {
            return Ok(token.to_string());
        }
        self.refresh_locked(&mut state).await
    }

    async fn force_refresh(&self) -> Result<String, RemoteFetchError> {
        let mut state = self.tokens.lock().await;
        self.refresh_locked(&mut state).await
    }

    async fn can_refresh(&self) -> bool {
        self.tokens.lock().await.refresh_token.is_some() && self.client_secret.is_some()
    }

    async fn refresh_locked(&self, state: &mut TokenState) -> Result<String, RemoteFetchError> {
        let refresh_token = state.refresh_token.as_ref().ok_or_else(|| {
            RemoteFetchError::Unauthorized(
                "access token expired and no refresh token is configured".to_string(),
            )
        })?;
        let client_secret = self.client_secret.as_ref().ok_or_else(|| {
            RemoteFetchError::TokenRefreshFailed("client secret is not configured".to_string())
        })?;

        let credentials = format!(
            "{}:{}",
            self.client_id,
            client_secret.expose_secret().as_ref()
        );
        let encoded = general_purpose::STANDARD.encode(credentials.as_bytes());
        let url = format!("{}/api/token", self.accounts_url);

        tracing::debug!(url = %url, "Refreshing access token");

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Basic {encoded}"))
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.expose_secret().as_ref()),
            ])
            .send()
            .await
            .map_err(|e| RemoteFetchError::TokenRefreshFailed(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(RemoteFetchError::TokenRefreshFailed(format!(
                "accounts service returned {status}: {body}"
            )));
        }

        let token: TokenResponse = resp
            .json()
            .await
            .map_err(|e| RemoteFetchError::TokenRefreshFailed(e.to_string()))?;

        state.expires_at = token
            .expires_in
            .map(|secs| Instant::now() + Duration::from_secs(secs));
        if let Some(rotated) = token.refresh_token {
            state.refresh_token = Some(crate::config::secret_string(rotated));
        }
        state.access_token = Some(token.access_token.clone());

        tracing::info!(expires_in = ?token.expires_in, "Access token refreshed");

        Ok(token.access_token)
    }

    /// Retry a request with exponential backoff
    ///
    /// Only retryable errors are retried. A rate-limit response waits at least as
    /// long as the server asked for.
    async fn retry_request<F, T, Fut>(&self, operation: F) -> Result<T, RemoteFetchError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T, RemoteFetchError>>,
    {
        let max_retries = self.retry.max_retries;
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    attempt += 1;
                    if !e.is_retryable() || attempt > max_retries {
                        return Err(e);
                    }

                    let mut delay = backoff_delay(&self.retry, attempt);
                    if let RemoteFetchError::RateLimited(secs) = e {
                        delay = delay.max(Duration::from_secs(secs));
                    }

                    log_retry_attempt!(attempt, max_retries, e);
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn send_get<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, RemoteFetchError> {
        let token = self.ensure_fresh_token().await?;

        let resp = self
            .client
            .get(url)
            .query(query)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| RemoteFetchError::ConnectionFailed(e.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            return resp
                .json::<T>()
                .await
                .map_err(|e| RemoteFetchError::InvalidResponse(e.to_string()));
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = resp
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            return Err(RemoteFetchError::RateLimited(retry_after));
        }

        let body = resp.text().await.unwrap_or_default();
        Err(match status {
            StatusCode::UNAUTHORIZED => RemoteFetchError::Unauthorized(body),
            s if s.is_server_error() => RemoteFetchError::ServerError {
                status: s.as_u16(),
                message: body,
            },
            s => RemoteFetchError::ClientError {
                status: s.as_u16(),
                message: body,
            },
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, RemoteFetchError> {
        let url = format!("{}{}", self.api_base_url, path);
        let mut refreshed = false;

        loop {
            let result = self.retry_request(|| self.send_get(&url, query)).await;
            if let Err(RemoteFetchError::Unauthorized(ref message)) = result {
                if !refreshed && self.can_refresh().await {
                    tracing::warn!(url = %url, message = %message, "Access token rejected, refreshing");
                    self.force_refresh().await?;
                    refreshed = true;
                    continue;
                }
            }
            return result;
        }
    }
}

/// Delay before retry number `attempt` (1-based)
pub(crate) fn backoff_delay(retry: &RetryConfig, attempt: usize) -> Duration {
    let exponent = attempt.saturating_sub(1) as i32;
    let delay_ms = retry.initial_delay_ms as f64 * retry.backoff_multiplier.powi(exponent);
    let delay_ms = (delay_ms as u64).min(retry.max_delay_ms);
    Duration::from_millis(delay_ms)
}

#[async_trait]
impl CatalogApi for SpotifyClient {
    async fn fetch_page(
        &self,
        resource: &Resource,
        page: PageRequest,
    ) -> Result<Page<Value>, RemoteFetchError> {
        tracing::debug!(
            resource = %resource,
            limit = page.limit,
            offset = page.offset,
            "Fetching page"
        );

        let query = [
            ("limit", page.limit.to_string()),
            ("offset", page.offset.to_string()),
        ];
        self.get_json(&resource.path(), &query).await
    }

    async fn current_user(&self) -> Result<CurrentUser, RemoteFetchError> {
        self.get_json("/me", &[]).await
    }
}
