use thiserror::Error;

/// 비전 모델 호출 실패
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Rate limited (429): {0}")]
    RateLimited(String),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Response decode failed: {0}")]
    Decode(String),
}

impl TransportError {
    /// 재시도 대상: 요청 제한, 연결 실패
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TransportError::RateLimited(_) | TransportError::Connection(_)
        )
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() {
            TransportError::Connection(e.to_string())
        } else if e.is_decode() {
            TransportError::Decode(e.to_string())
        } else if let Some(status) = e.status() {
            TransportError::Api {
                status: status.as_u16(),
                message: e.to_string(),
            }
        } else {
            TransportError::Connection(e.to_string())
        }
    }
}
