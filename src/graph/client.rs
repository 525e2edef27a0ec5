//! Thin authenticated wrapper over the Microsoft-Graph-shaped REST API.
//!
//! The client attaches the bearer token, maps non-success statuses to
//! [`AppError::Graph`] and decodes JSON. It never retries; retry policy
//! belongs to callers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::GraphConfig;
use crate::errors::AppError;

/// The `$batch` endpoint accepts at most this many sub-requests per call.
pub const BATCH_LIMIT: usize = 20;

#[derive(Clone)]
pub struct GraphClient {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchRequest {
    pub id: String,
    pub method: String,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchResponse {
    pub id: String,
    pub status: u16,
    #[serde(default)]
    pub body: Value,
}

#[derive(Debug, Deserialize)]
struct BatchEnvelope {
    responses: Vec<BatchResponse>,
}

impl GraphClient {
    pub fn new(config: &GraphConfig) -> Self {
        GraphClient {
            http: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn check(&self, response: reqwest::Response) -> Result<reqwest::Response, AppError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "unreadable error body".to_string());
        Err(AppError::Graph {
            status: status.as_u16(),
            message,
        })
    }

    pub async fn get_json(&self, path: &str) -> Result<Value, AppError> {
        let response = self
            .http
            .get(self.url(path))
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        Ok(self.check(response).await?.json().await?)
    }

    pub async fn get_bytes(&self, path: &str) -> Result<Vec<u8>, AppError> {
        let response = self
            .http
            .get(self.url(path))
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        Ok(self.check(response).await?.bytes().await?.to_vec())
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> Result<Value, AppError> {
        let response = self
            .http
            .post(self.url(path))
            .bearer_auth(&self.access_token)
            .json(body)
            .send()
            .await?;
        let response = self.check(response).await?;
        if response.content_length() == Some(0) {
            return Ok(Value::Null);
        }
        Ok(response.json().await.unwrap_or(Value::Null))
    }

    pub async fn patch_json(&self, path: &str, body: &Value) -> Result<Value, AppError> {
        let response = self
            .http
            .patch(self.url(path))
            .bearer_auth(&self.access_token)
            .json(body)
            .send()
            .await?;
        Ok(self.check(response).await?.json().await.unwrap_or(Value::Null))
    }

    pub async fn put_bytes(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<Value, AppError> {
        let response = self
            .http
            .put(self.url(path))
            .bearer_auth(&self.access_token)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await?;
        Ok(self.check(response).await?.json().await.unwrap_or(Value::Null))
    }

    pub async fn delete(&self, path: &str) -> Result<(), AppError> {
        let response = self
            .http
            .delete(self.url(path))
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        self.check(response).await?;
        Ok(())
    }

    /// Issue up to [`BATCH_LIMIT`] sub-requests in one round trip.
    pub async fn batch(&self, requests: &[BatchRequest]) -> Result<Vec<BatchResponse>, AppError> {
        if requests.len() > BATCH_LIMIT {
            return Err(AppError::BadRequest(format!(
                "Batch of {} sub-requests exceeds the limit of {BATCH_LIMIT}",
                requests.len()
            )));
        }
        let body = serde_json::json!({ "requests": requests });
        let envelope: BatchEnvelope =
            serde_json::from_value(self.post_json("/$batch", &body).await?)?;
        Ok(envelope.responses)
    }
}
