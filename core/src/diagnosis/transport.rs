use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::instrument;

use super::api::{GenerateContentRequest, GenerateContentResponse};
use crate::errors::{AnalysisError, ConfigurationError};

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Carries one `generateContent` call to an inference backend.
#[async_trait]
pub trait InferenceTransport: Send + Sync {
    async fn generate(
        &self,
        api_key: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, AnalysisError>;
}

pub struct GeminiTransport {
    client: Client,
    endpoint: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl GeminiTransport {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ConfigurationError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ConfigurationError::HttpClient)?;

        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn generate_url(&self) -> String {
        format!(
            "{endpoint}/models/{model}:generateContent",
            endpoint = self.endpoint,
            model = self.model
        )
    }
}

#[async_trait]
impl InferenceTransport for GeminiTransport {
    #[instrument(name = "gemini", skip_all, fields(model = %self.model))]
    async fn generate(
        &self,
        api_key: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, AnalysisError> {
        let res = self
            .client
            .post(self.generate_url())
            .header("x-goog-api-key", api_key)
            .json(request)
            .send()
            .await?;

        let status = res.status();
        tracing::debug!(status = status.as_u16(), "Inference service responded");

        if status != StatusCode::OK {
            let body = res.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(AnalysisError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(res.json::<GenerateContentResponse>().await?)
    }
}
