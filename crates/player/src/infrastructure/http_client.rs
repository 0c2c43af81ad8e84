//! HTTP adapter for the GalaxyTalk REST backend (reqwest)
//!
//! Responsibilities:
//! - unwrap the `{success, message, data}` envelope
//! - classify status codes into [`ApiError`]
//! - on 401, refresh the session once and retry the original request once
//!
//! Refreshes are single-flight: requests that hit 401 while a refresh is in
//! progress wait for it and reuse its outcome instead of starting another.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use reqwest::{Client, Method};
use serde_json::Value;
use tokio::sync::Mutex;

use galaxytalk_shared::ApiResponse;

use crate::ports::outbound::{ApiError, RawApiPort};

/// Session refresh endpoint, relative to the versioned base URL.
pub const REFRESH_PATH: &str = "/oauth/refresh";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Cookie jar for `base_url`, optionally seeded with a `name=value` pair.
pub fn session_jar(base_url: &str, cookie: Option<&str>) -> Arc<Jar> {
    let jar = Arc::new(Jar::default());
    if let Some(cookie) = cookie {
        match url::Url::parse(base_url) {
            Ok(url) => jar.add_cookie_str(cookie, &url),
            Err(e) => tracing::warn!("Ignoring auth cookie, invalid base URL {}: {}", base_url, e),
        }
    }
    jar
}

pub struct ApiAdapter {
    client: Client,
    base_url: String,
    refresh_lock: Mutex<()>,
    /// Bumped after every successful refresh.
    auth_generation: AtomicU64,
}

impl ApiAdapter {
    pub fn new(base_url: &str) -> Self {
        Self::with_auth_cookie(base_url, None)
    }

    /// `cookie` is a `name=value` pair seeded into the cookie jar for `base_url`.
    pub fn with_auth_cookie(base_url: &str, cookie: Option<&str>) -> Self {
        Self::with_cookie_jar(base_url, session_jar(base_url, cookie))
    }

    /// Share `jar` with other transports, so cookies set by a refresh reach
    /// them as well.
    pub fn with_cookie_jar(base_url: &str, jar: Arc<Jar>) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .cookie_provider(jar)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            refresh_lock: Mutex::new(()),
            auth_generation: AtomicU64::new(0),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send_once(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        let mut request = self.client.request(method.clone(), self.url(path));
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let result = unwrap_envelope(status, &text);
        if let Err(ref e) = result {
            tracing::debug!(%method, path, status, error = %e, "Request failed");
        }
        result
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        let generation = self.auth_generation.load(Ordering::SeqCst);
        match self.send_once(method.clone(), path, body).await {
            Err(ApiError::Unauthorized) if path != REFRESH_PATH => {
                self.refresh_session(generation).await?;
                self.send_once(method, path, body).await
            }
            other => other,
        }
    }

    /// Refresh unless someone else already did since `seen_generation`.
    async fn refresh_session(&self, seen_generation: u64) -> Result<(), ApiError> {
        let _guard = self.refresh_lock.lock().await;
        if self.auth_generation.load(Ordering::SeqCst) != seen_generation {
            tracing::debug!("Session already refreshed by a concurrent request");
            return Ok(());
        }

        tracing::info!("Access token rejected, refreshing session");
        match self.send_once(Method::POST, REFRESH_PATH, None).await {
            Ok(_) => {
                self.auth_generation.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            Err(ApiError::SessionExpired) => Err(ApiError::SessionExpired),
            Err(e) => {
                tracing::warn!("Session refresh failed: {}", e);
                Err(ApiError::Unauthorized)
            }
        }
    }
}

/// Turn a raw HTTP response into the envelope's `data` (or an error).
pub(crate) fn unwrap_envelope(status: u16, body: &str) -> Result<Value, ApiError> {
    let parsed = serde_json::from_str::<ApiResponse<Value>>(body);

    if !(200..300).contains(&status) {
        let message = parsed
            .ok()
            .map(|r| r.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| body.trim().to_string());
        return Err(ApiError::from_status(status, message));
    }

    if body.trim().is_empty() {
        return Ok(Value::Null);
    }

    let envelope = parsed.map_err(|e| ApiError::ParseError(e.to_string()))?;
    if !envelope.success {
        return Err(ApiError::Rejected(envelope.message));
    }
    Ok(envelope.data.unwrap_or(Value::Null))
}

#[async_trait::async_trait]
impl RawApiPort for ApiAdapter {
    async fn get_json(&self, path: &str) -> Result<Value, ApiError> {
        self.execute(Method::GET, path, None).await
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        self.execute(Method::POST, path, Some(body)).await
    }

    async fn post_empty(&self, path: &str) -> Result<Value, ApiError> {
        self.execute(Method::POST, path, None).await
    }

    async fn delete(&self, path: &str) -> Result<Value, ApiError> {
        self.execute(Method::DELETE, path, None).await
    }
}
