//! API client for the profile and login endpoints.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, Client};
use tracing::debug;

use crate::models::{LoginRequest, LoginResponse, UserProfile};

use super::{ApiError, AuthApi};

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// API client for the backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    api_base: String,
}

impl ApiClient {
    /// Create a new API client rooted at `api_base` (e.g. `https://host/api`)
    pub fn new(api_base: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    /// The backend expects the token verbatim, without a `Bearer` scheme.
    fn auth_headers(token: &str) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(token).context("Token is not a valid header value")?,
        );
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }
}

impl AuthApi for ApiClient {
    async fn fetch_me(&self, token: &str) -> Result<UserProfile> {
        let url = self.url("/user/me");
        debug!(url = %url, "Fetching user profile");

        let response = self
            .client
            .get(&url)
            .headers(Self::auth_headers(token)?)
            .send()
            .await
            .map_err(ApiError::from)
            .with_context(|| format!("Failed to send GET request to {}", url))?;

        let response = Self::check_response(response).await?;

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }

    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse> {
        let url = self.url("/auth/login");
        debug!(url = %url, email = %request.email, "Sending login request");

        let response = self
            .client
            .post(&url)
            .json(&request.to_body())
            .send()
            .await
            .map_err(ApiError::from)
            .with_context(|| format!("Failed to send POST request to {}", url))?;

        let response = Self::check_response(response).await?;

        response
            .json()
            .await
            .context("Failed to parse login response")
    }
}
