use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method, StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use shared_config::AppConfig;

/// Storage failures, split so callers can tell a uniqueness conflict from a
/// transient outage. `Unavailable` is the only retryable variant.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage conflict: {0}")]
    Conflict(String),

    #[error("Storage resource not found: {0}")]
    NotFound(String),

    #[error("Storage authentication error: {0}")]
    Auth(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed storage response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for StorageError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            StorageError::Malformed(err.to_string())
        } else {
            StorageError::Unavailable(err.to_string())
        }
    }
}

pub struct StorageClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl StorageClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.storage_url.clone(),
            api_key: config.storage_api_key.clone(),
        }
    }

    fn get_headers(&self, extra: Option<HeaderMap>) -> HeaderMap {
        let mut headers = HeaderMap::new();

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Ok(key) = HeaderValue::from_str(&self.api_key) {
            headers.insert("apikey", key);
        }
        if let Ok(bearer) = HeaderValue::from_str(&format!("Bearer {}", self.api_key)) {
            headers.insert(AUTHORIZATION, bearer);
        }

        if let Some(extra) = extra {
            headers.extend(extra);
        }

        headers
    }

    pub async fn request<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T, StorageError>
    where
        T: DeserializeOwned,
    {
        self.request_with_headers(method, path, body, None).await
    }

    pub async fn request_with_headers<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<T, StorageError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making storage request to {}", url);

        let mut req = self
            .client
            .request(method, &url)
            .headers(self.get_headers(extra_headers));

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Storage error ({}): {}", status, error_text);

            return Err(match status {
                StatusCode::CONFLICT => StorageError::Conflict(error_text),
                StatusCode::NOT_FOUND => StorageError::NotFound(error_text),
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    StorageError::Auth(error_text)
                }
                _ => StorageError::Unavailable(format!("{}: {}", status, error_text)),
            });
        }

        let data = response.json::<T>().await?;
        Ok(data)
    }

    /// POST with `Prefer: return=representation` so the inserted row comes
    /// back in the same round trip.
    pub async fn insert_returning<T>(&self, path: &str, body: Value) -> Result<Vec<T>, StorageError>
    where
        T: DeserializeOwned,
    {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        self.request_with_headers(Method::POST, path, Some(body), Some(headers))
            .await
    }

    /// PATCH with `Prefer: return=representation`. The caller's filter
    /// expression decides which rows are touched; an empty result means the
    /// filter matched nothing.
    pub async fn update_returning<T>(&self, path: &str, body: Value) -> Result<Vec<T>, StorageError>
    where
        T: DeserializeOwned,
    {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        self.request_with_headers(Method::PATCH, path, Some(body), Some(headers))
            .await
    }

    /// DELETE that ignores the response body; PostgREST answers these with
    /// 204 No Content.
    pub async fn delete(&self, path: &str) -> Result<(), StorageError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making storage delete to {}", url);

        let response = self
            .client
            .delete(&url)
            .headers(self.get_headers(None))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Storage error ({}): {}", status, error_text);
            return Err(StorageError::Unavailable(format!(
                "{}: {}",
                status, error_text
            )));
        }

        Ok(())
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }
}
