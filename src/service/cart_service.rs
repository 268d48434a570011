use chrono::{Local, NaiveDate};
use std::sync::Arc;
use std::time::Duration;

use super::document::{self, DocumentSkip};
use super::extractor::{CartExtractor, ImageUpload};
use super::retry::RetryPolicy;
use crate::config::{ConfigError, VisionConfig};
use crate::models::{CartTable, CartVariant, ExpenseDocument};
use crate::vision::{OpenAiClient, VisionTransport};

/// 업로드 한 번(이미지 여러 장)의 처리 결과
#[derive(Debug, Clone)]
pub struct CartReport {
    pub table: CartTable,
    pub warnings: Vec<String>,
    /// 생성된 문서, 또는 생성하지 않은 이유
    pub document: Result<ExpenseDocument, DocumentSkip>,
}

/// 장바구니 → 표/품의서 서비스
pub struct CartService {
    extractor: CartExtractor,
}

impl CartService {
    pub fn new(transport: Arc<dyn VisionTransport>, model: &str, retry: RetryPolicy) -> Self {
        Self {
            extractor: CartExtractor::new(transport, model, retry),
        }
    }

    /// 설정으로부터 OpenAI 클라이언트를 만들어 서비스 생성
    pub fn from_config(config: &VisionConfig) -> Result<Self, ConfigError> {
        let api_key = config.resolve_api_key()?;
        let client = OpenAiClient::new(
            &config.base_url,
            &api_key,
            Duration::from_secs(config.timeout_secs),
        )
        .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        let retry = RetryPolicy::new(config.max_retries, Duration::from_secs(1));
        Ok(Self::new(Arc::new(client), &config.model, retry))
    }

    pub fn extractor(&self) -> &CartExtractor {
        &self.extractor
    }

    /// 이미지 추출 → 합치기 → (제목/목적이 있으면) 문서 생성
    pub async fn process(
        &self,
        images: &[ImageUpload],
        variant: CartVariant,
        title: &str,
        purpose: &str,
    ) -> CartReport {
        let outcome = self.extractor.extract_batch(images, variant).await;

        let document = if outcome.table.is_empty() {
            Err(DocumentSkip::EmptyTable)
        } else {
            self.document(&outcome.table, title, purpose)
        };

        tracing::info!(
            "Upload processed: {} images, {} rows, total {}, document: {}",
            images.len(),
            outcome.table.len(),
            outcome.table.grand_total(),
            document.is_ok()
        );

        CartReport {
            table: outcome.table,
            warnings: outcome.warnings,
            document,
        }
    }

    /// 오늘 날짜로 문서 생성
    pub fn document(
        &self,
        table: &CartTable,
        title: &str,
        purpose: &str,
    ) -> Result<ExpenseDocument, DocumentSkip> {
        document::build_if_ready(table, title, purpose, today())
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
