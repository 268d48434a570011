use regex::Regex;
use serde_json::Value;
use std::sync::{Arc, OnceLock};
use thiserror::Error;

use super::retry::RetryPolicy;
use crate::models::{CartItem, CartTable, CartVariant, RawCartItem};
use crate::vision::{ChatRequest, ChatResponse, TransportError, VisionTransport};

/// 추출 실패 (재시도 소진은 실패가 아니라 빈 결과로 처리)
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("vision request failed: {0}")]
    Transport(#[from] TransportError),
}

/// 업로드된 이미지 한 장
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// 여러 이미지의 합산 결과와 이미지별 경고
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub table: CartTable,
    pub warnings: Vec<String>,
}

/// 장바구니 추출 서비스 - 세션 상태 없이 설정과 전송 계층만 보관
pub struct CartExtractor {
    transport: Arc<dyn VisionTransport>,
    model: String,
    retry: RetryPolicy,
}

impl CartExtractor {
    pub fn new(transport: Arc<dyn VisionTransport>, model: &str, retry: RetryPolicy) -> Self {
        Self {
            transport,
            model: model.to_string(),
            retry,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// 이미지 한 장 추출
    ///
    /// 요청 제한/연결 실패가 재시도 후에도 계속되면 빈 테이블을 돌려준다.
    pub async fn extract(
        &self,
        image_bytes: &[u8],
        variant: CartVariant,
    ) -> Result<CartTable, ExtractError> {
        let request = ChatRequest::cart_extraction(&self.model, variant, image_bytes);
        let transport = &self.transport;
        let request = &request;

        let response = match self
            .retry
            .run(move || async move { transport.complete(request).await })
            .await
        {
            Ok(resp) => resp,
            Err(e) if e.is_retryable() => {
                tracing::warn!(
                    "Extraction gave up after {} attempts: {}",
                    self.retry.max_attempts(),
                    e
                );
                return Ok(CartTable::new(variant));
            }
            Err(e) => return Err(e.into()),
        };

        let table = parse_completion(&response, variant);
        tracing::info!("Extracted {} items ({:?})", table.len(), variant);
        Ok(table)
    }

    /// 이미지를 순서대로 처리하고 결과를 이어 붙임 (실패한 이미지는 경고만 남김)
    pub async fn extract_batch(&self, images: &[ImageUpload], variant: CartVariant) -> BatchOutcome {
        let mut table = CartTable::new(variant);
        let mut warnings = Vec::new();

        for (idx, image) in images.iter().enumerate() {
            tracing::info!(
                "Processing image {}/{}: {} ({} bytes)",
                idx + 1,
                images.len(),
                image.file_name,
                image.bytes.len()
            );

            match self.extract(&image.bytes, variant).await {
                Ok(part) if part.is_empty() => {
                    warnings.push(format!("{}: 품목을 추출하지 못했습니다.", image.file_name));
                }
                Ok(part) => table.extend(part),
                Err(e) => {
                    tracing::error!("Image {} failed: {}", image.file_name, e);
                    warnings.push(format!("{}: {}", image.file_name, e));
                }
            }
        }

        BatchOutcome { table, warnings }
    }
}

fn bracket_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?s)\[.*\]").expect("valid bracket pattern"))
}

/// 모델 응답 → 테이블
///
/// 1) tool call 인자의 `items`, 2) 본문 전체 JSON, 3) 본문의 첫 `[`부터 마지막 `]`까지.
/// 형식이 깨진 응답은 빈 테이블.
pub fn parse_completion(response: &ChatResponse, variant: CartVariant) -> CartTable {
    let Some(choice) = response.choices.first() else {
        tracing::warn!("Response has no choices");
        return CartTable::new(variant);
    };

    let items = match choice.message.tool_calls.as_deref() {
        Some([call, ..]) => items_from_arguments(&call.function.arguments),
        _ => {
            let raw = choice.message.content.as_deref().unwrap_or_default();
            items_from_text(raw)
        }
    };

    let rows = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<RawCartItem>(item) {
            Ok(raw) => Some(CartItem::from_raw(raw)),
            Err(e) => {
                tracing::warn!("Skipping item that is not an object: {}", e);
                None
            }
        })
        .collect();

    CartTable::with_items(variant, rows)
}

fn items_from_arguments(arguments: &Value) -> Vec<Value> {
    let parsed = match arguments {
        Value::String(s) => match serde_json::from_str::<Value>(s) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("Tool call arguments are not valid JSON: {}", e);
                return Vec::new();
            }
        },
        other => other.clone(),
    };
    items_from_value(parsed)
}

fn items_from_text(raw: &str) -> Vec<Value> {
    let raw = raw.trim();
    match serde_json::from_str::<Value>(raw) {
        // JSON 문자열 안에 배열을 감싼 응답
        Ok(Value::String(inner)) if inner.trim() != raw => return items_from_text(&inner),
        Ok(value) => {
            let items = items_from_value(value);
            if !items.is_empty() {
                return items;
            }
        }
        Err(_) => {}
    }

    let Some(m) = bracket_pattern().find(raw) else {
        tracing::warn!("No JSON array found in model text");
        return Vec::new();
    };
    match serde_json::from_str::<Value>(m.as_str()) {
        Ok(value) => items_from_value(value),
        Err(e) => {
            tracing::warn!("Bracketed model text is not valid JSON: {}", e);
            Vec::new()
        }
    }
}

fn items_from_value(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("items") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}
