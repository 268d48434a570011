//! 비전 모델 HTTP 클라이언트.
//!
//! `VisionTransport`는 요청 한 번을 그대로 보내는 포트이며, 재시도는
//! 서비스 계층의 `RetryPolicy`가 담당한다.

use async_trait::async_trait;
use std::time::Duration;

use super::error::TransportError;
use super::types::{ChatRequest, ChatResponse};

#[async_trait]
pub trait VisionTransport: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, TransportError>;
}

/// OpenAI 호환 chat completion 클라이언트
pub struct OpenAiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenAiClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Connection(format!("HTTP client build failed: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl VisionTransport for OpenAiClient {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, TransportError> {
        tracing::debug!("POST {} (model {})", self.endpoint(), request.model);

        let resp = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_else(|e| {
                tracing::warn!("Failed to read error body: {}", e);
                String::new()
            });
            return Err(match status.as_u16() {
                429 => TransportError::RateLimited(text),
                code => TransportError::Api {
                    status: code,
                    message: text,
                },
            });
        }

        resp.json::<ChatResponse>()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))
    }
}
