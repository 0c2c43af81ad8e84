//! Player configuration

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::infrastructure::websocket::ws_url_from_api_base;

/// Player configuration loaded from environment (and `.env`, via dotenvy)
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerConfig {
    /// Backend base URL, e.g. `http://localhost:8080/api`
    pub api_base_url: String,
    /// Optional version segment appended to REST paths (`v1`)
    pub api_version: Option<String>,
    /// Where a user without a session should go to log in
    pub oauth_url: Option<String>,
    /// Session cookie as `name=value`
    pub access_token: Option<String>,
    /// Broker endpoint; derived from `api_base_url` when unset
    pub ws_url: String,
    /// Storage directory; the platform config directory when unset
    pub storage_dir: Option<PathBuf>,
    /// Concern to join the pool with, if the user is not already matching
    pub concern: Option<String>,
    pub preferred_mbti: Option<String>,
}

impl PlayerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_base_url = get("GALAXYTALK_API_BASE_URL")
            .unwrap_or_else(|| "http://localhost:8080/api".to_string())
            .trim_end_matches('/')
            .to_string();
        url::Url::parse(&api_base_url)
            .with_context(|| format!("GALAXYTALK_API_BASE_URL is not a valid URL: {api_base_url}"))?;

        let ws_url = match get("GALAXYTALK_WS_URL") {
            Some(url) => url,
            None => ws_url_from_api_base(&api_base_url)
                .context("Cannot derive the broker URL from GALAXYTALK_API_BASE_URL")?,
        };

        let access_token = get("GALAXYTALK_ACCESS_TOKEN");
        if let Some(token) = &access_token {
            anyhow::ensure!(
                token.contains('='),
                "GALAXYTALK_ACCESS_TOKEN must be a cookie pair like `Authorization=...`"
            );
        }

        Ok(Self {
            api_base_url,
            api_version: get("GALAXYTALK_API_VERSION").map(|v| v.trim_matches('/').to_string()),
            oauth_url: get("GALAXYTALK_OAUTH_URL"),
            access_token,
            ws_url,
            storage_dir: get("GALAXYTALK_STORAGE_DIR").map(PathBuf::from),
            concern: get("GALAXYTALK_CONCERN"),
            preferred_mbti: get("GALAXYTALK_PREFERRED_MBTI"),
        })
    }

    /// Base URL REST paths are appended to.
    pub fn rest_base_url(&self) -> String {
        match &self.api_version {
            Some(version) => format!("{}/{}", self.api_base_url, version),
            None => self.api_base_url.clone(),
        }
    }
}
