use std::net::IpAddr;
use std::time::Duration;

use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::core::config::ApiConfig;
use crate::core::features::Feature;
use crate::core::models::usage::ModelSettings;
use crate::core::series::ChartWindow;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const MODEL_SETTINGS_PATH: &str = "/api/admin/chatbot/settings";
/// Error bodies are cut to this many characters before display.
const MAX_ERROR_BODY: usize = 200;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("not authorized (HTTP {0}); check api.token or ZU_API_TOKEN")]
    Unauthorized(u16),
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("backend error: {0}")]
    Backend(String),
}

/// The base URL must use HTTPS, except for loopback hosts during local
/// development. Credentials are never sent anywhere else.
pub fn validate_endpoint(url: &str) -> Result<Url, FetchError> {
    let parsed =
        Url::parse(url).map_err(|e| FetchError::InvalidEndpoint(format!("{}: {}", url, e)))?;
    match parsed.scheme() {
        "https" => Ok(parsed),
        "http" if is_loopback(&parsed) => Ok(parsed),
        _ => Err(FetchError::InvalidEndpoint(format!(
            "endpoint must use HTTPS, got: {}",
            url
        ))),
    }
}

fn is_loopback(url: &Url) -> bool {
    match url.host_str() {
        Some("localhost") => true,
        Some(host) => host
            .trim_start_matches('[')
            .trim_end_matches(']')
            .parse::<IpAddr>()
            .map(|ip| ip.is_loopback())
            .unwrap_or(false),
        None => false,
    }
}

/// FastAPI puts the message under `detail`; anything else is shown raw.
fn error_body(raw: &str) -> String {
    let message = serde_json::from_str::<serde_json::Value>(raw)
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_string))
        .unwrap_or_else(|| raw.trim().to_string());
    message.chars().take(MAX_ERROR_BODY).collect()
}

/// HTTP client for the analytics endpoints.
#[derive(Debug, Clone)]
pub struct AnalyticsClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl AnalyticsClient {
    pub fn new(api: &ApiConfig) -> Result<Self, FetchError> {
        let base_url = validate_endpoint(api.base_url.trim_end_matches('/'))?;
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url,
            token: api.token.clone().filter(|t| !t.is_empty()),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, u32)],
    ) -> Result<T, FetchError> {
        let url = self.url(path);
        tracing::debug!(%url, ?query, "fetching");

        let mut request = self
            .http
            .get(&url)
            .header("Accept", "application/json")
            .query(query);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(FetchError::Unauthorized(status.as_u16()));
        }
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
                body: error_body(&body),
            });
        }

        let value: serde_json::Value = serde_json::from_str(&body)?;
        if let Some(err) = value.get("error").filter(|e| !e.is_null()) {
            let message = err
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| err.to_string());
            return Err(FetchError::Backend(message));
        }
        Ok(serde_json::from_value(value)?)
    }

    pub async fn fetch_stats<T: DeserializeOwned>(&self, feature: Feature) -> Result<T, FetchError> {
        self.get_json(feature.stats_path(), &[]).await
    }

    pub async fn fetch_daily<T: DeserializeOwned>(
        &self,
        feature: Feature,
        window: ChartWindow,
    ) -> Result<T, FetchError> {
        self.get_json(&feature.daily_path(), &[("days", window.days())])
            .await
    }

    pub async fn fetch_model_settings(&self) -> Result<ModelSettings, FetchError> {
        self.get_json(MODEL_SETTINGS_PATH, &[]).await
    }
}
