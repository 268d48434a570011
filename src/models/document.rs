use serde::{Deserialize, Serialize};

/// 지출 품의 문서 - 요청마다 새로 계산하며 저장하지 않음
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseDocument {
    /// 개요
    pub overview: String,
    /// 품의서 본문
    pub request: String,
}
