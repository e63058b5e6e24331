use crate::responses::ApiErrorResponse;
use async_trait::async_trait;
use configuration::ApiConfig;
use core_types::{AnalyticsSnapshot, DashboardSnapshot, OrderStatusFilter, Period, RecentOrder};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use std::time::Duration;

pub mod auth;
pub mod error;
pub mod responses;

// --- Public API ---
pub use error::ApiError;
pub use auth::{
    provider_from_config, AuthError, Credential, CredentialProvider, JwtCredentialProvider,
    StaticCredentialProvider,
};

/// The abstract interface for the remote vendor API.
/// This trait is the contract the dashboard orchestrator uses, allowing the
/// underlying implementation (HTTP or in-memory) to be swapped out.
#[async_trait]
pub trait VendorApi: Send + Sync {
    /// Fetches aggregate metrics for `period`. (Authenticated)
    async fn fetch_dashboard(
        &self,
        credential: &Credential,
        period: Period,
    ) -> Result<DashboardSnapshot, ApiError>;

    /// Fetches sales/commission trends and top products for `period`. (Authenticated)
    async fn fetch_analytics(
        &self,
        credential: &Credential,
        period: Period,
    ) -> Result<AnalyticsSnapshot, ApiError>;

    /// Lists orders, newest first. (Authenticated)
    async fn fetch_orders(
        &self,
        credential: &Credential,
        status: OrderStatusFilter,
        limit: u32,
    ) -> Result<Vec<RecentOrder>, ApiError>;
}

/// A concrete implementation of `VendorApi` over HTTP.
#[derive(Clone)]
pub struct HttpVendorClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpVendorClient {
    pub fn new(api_config: &ApiConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(api_config.timeout_secs))
            .build()
            .map_err(|e| ApiError::ClientBuild(e.to_string()))?;

        Ok(Self {
            client,
            base_url: api_config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn _get_authorized<T: DeserializeOwned>(
        &self,
        credential: &Credential,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%url, ?query, subject = %credential.subject, "Sending API request.");

        let response = self
            .client
            .get(&url)
            .bearer_auth(credential.token())
            .query(query)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            serde_json::from_str::<T>(&text).map_err(|e| ApiError::Parse(e.to_string()))
        } else {
            let message = serde_json::from_str::<ApiErrorResponse>(&text)
                .ok()
                .and_then(|body| body.message)
                .filter(|message| !message.is_empty())
                .unwrap_or_else(|| format!("API Error: {}", status.as_u16()));
            tracing::debug!(%url, status = status.as_u16(), %message, "API request failed.");
            Err(ApiError::Http {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[async_trait]
impl VendorApi for HttpVendorClient {
    async fn fetch_dashboard(
        &self,
        credential: &Credential,
        period: Period,
    ) -> Result<DashboardSnapshot, ApiError> {
        self._get_authorized(credential, "/dashboard", &[("period", period.to_string())])
            .await
    }

    async fn fetch_analytics(
        &self,
        credential: &Credential,
        period: Period,
    ) -> Result<AnalyticsSnapshot, ApiError> {
        self._get_authorized(credential, "/analytics", &[("period", period.to_string())])
            .await
    }

    async fn fetch_orders(
        &self,
        credential: &Credential,
        status: OrderStatusFilter,
        limit: u32,
    ) -> Result<Vec<RecentOrder>, ApiError> {
        self._get_authorized(
            credential,
            "/orders",
            &[("status", status.to_string()), ("limit", limit.to_string())],
        )
        .await
    }
}
