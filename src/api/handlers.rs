use crate::export::{self, CSV_FILE_NAME, TEXT_FILE_NAME, XLSX_CONTENT_TYPE, XLSX_FILE_NAME};
use crate::models::{CartTable, CartVariant, ExpenseDocument};
use crate::service::document::render_text_file;
use crate::service::numeral::format_thousands;
use crate::service::{CartService, ImageUpload};
use crate::vision::ImageFormat;
use axum::{
    extract::{Json, Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const EMPTY_RESULT_MESSAGE: &str = "품목을 추출하지 못했습니다.";

/// 추출 응답
#[derive(Debug, Serialize, Deserialize)]
pub struct ExtractResponse {
    pub success: bool,
    pub message: String,
    pub warnings: Vec<String>,
    pub table: CartTable,
    pub grand_total: i64,
    /// 천 단위 구분 기호가 들어간 합계
    pub grand_total_text: String,
    pub document: Option<ExpenseDocument>,
}

/// 문서 생성 요청
#[derive(Debug, Deserialize)]
pub struct DocumentRequest {
    pub table: CartTable,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub purpose: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DocumentResponse {
    pub success: bool,
    pub message: String,
    pub document: Option<ExpenseDocument>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
}

fn error_response(status: StatusCode, message: String) -> Response {
    let body = ErrorResponse {
        success: false,
        message,
    };
    (status, Json(body)).into_response()
}

fn attachment(content_type: &'static str, file_name: &str, body: Vec<u8>) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        body,
    )
        .into_response()
}

/// 헬스 체크
pub async fn health_check() -> &'static str {
    "OK"
}

/// 장바구니 캡처 업로드 (multipart)
///
/// `image` 파트 여러 개, 선택 필드 `variant`, `title`, `purpose`.
pub async fn extract_cart(
    State(service): State<Arc<CartService>>,
    mut multipart: Multipart,
) -> Response {
    let mut images = Vec::new();
    let mut warnings = Vec::new();
    let mut variant = CartVariant::default();
    let mut title = String::new();
    let mut purpose = String::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return error_response(StatusCode::BAD_REQUEST, format!("Invalid upload: {}", e)),
        };
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "image" | "images" => {
                let file_name = field
                    .file_name()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("image-{}", images.len() + warnings.len() + 1));
                let bytes = match field.bytes().await {
                    Ok(b) => b,
                    Err(e) => {
                        return error_response(StatusCode::BAD_REQUEST, format!("Invalid upload: {}", e))
                    }
                };
                if ImageFormat::sniff(&bytes).is_none() {
                    tracing::warn!("Skipping unsupported upload {}", file_name);
                    warnings.push(format!("{}: JPG/PNG 이미지만 지원합니다.", file_name));
                    continue;
                }
                images.push(ImageUpload {
                    file_name,
                    bytes: bytes.to_vec(),
                });
            }
            "variant" | "title" | "purpose" => {
                let text = match field.text().await {
                    Ok(t) => t,
                    Err(e) => {
                        return error_response(StatusCode::BAD_REQUEST, format!("Invalid upload: {}", e))
                    }
                };
                match name.as_str() {
                    "variant" => match CartVariant::parse(&text) {
                        Some(v) => variant = v,
                        None => {
                            return error_response(
                                StatusCode::BAD_REQUEST,
                                format!("Unknown variant: {}", text),
                            )
                        }
                    },
                    "title" => title = text,
                    _ => purpose = text,
                }
            }
            other => {
                tracing::debug!("Ignoring multipart field {}", other);
            }
        }
    }

    if images.is_empty() {
        let mut message = "장바구니 캡처(JPG/PNG)를 업로드하세요.".to_string();
        if !warnings.is_empty() {
            message = format!("{} ({})", message, warnings.join(", "));
        }
        return error_response(StatusCode::BAD_REQUEST, message);
    }

    let report = service.process(&images, variant, &title, &purpose).await;
    warnings.extend(report.warnings);

    let grand_total = report.table.grand_total();
    let (success, message) = match &report.document {
        _ if report.table.is_empty() => (false, EMPTY_RESULT_MESSAGE.to_string()),
        Err(skip) => (
            true,
            format!("{} items extracted. {}", report.table.len(), skip.message()),
        ),
        Ok(_) => (true, format!("{} items extracted", report.table.len())),
    };

    let response = ExtractResponse {
        success,
        message,
        warnings,
        grand_total,
        grand_total_text: format_thousands(grand_total),
        table: report.table,
        document: report.document.ok(),
    };
    (StatusCode::OK, Json(response)).into_response()
}

/// 표 → 엑셀(xlsx) 다운로드
pub async fn export_xlsx(Json(table): Json<CartTable>) -> Response {
    match export::to_xlsx_bytes(&table) {
        Ok(bytes) => attachment(XLSX_CONTENT_TYPE, XLSX_FILE_NAME, bytes),
        Err(e) => {
            tracing::error!("xlsx export failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {}", e))
        }
    }
}

/// 표 → CSV 다운로드
pub async fn export_csv(Json(table): Json<CartTable>) -> Response {
    match export::to_csv_bytes(&table) {
        Ok(bytes) => attachment("text/csv; charset=utf-8", CSV_FILE_NAME, bytes),
        Err(e) => {
            tracing::error!("CSV export failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {}", e))
        }
    }
}

/// 개요/품의서 생성
pub async fn generate_document(
    State(service): State<Arc<CartService>>,
    Json(req): Json<DocumentRequest>,
) -> Response {
    let response = match service.document(&req.table, &req.title, &req.purpose) {
        Ok(document) => DocumentResponse {
            success: true,
            message: "Document generated".to_string(),
            document: Some(document),
        },
        Err(skip) => DocumentResponse {
            success: false,
            message: skip.message().to_string(),
            document: None,
        },
    };
    (StatusCode::OK, Json(response)).into_response()
}

/// 두 문서를 합친 텍스트 파일 다운로드
pub async fn download_document(
    State(service): State<Arc<CartService>>,
    Json(req): Json<DocumentRequest>,
) -> Response {
    match service.document(&req.table, &req.title, &req.purpose) {
        Ok(document) => attachment(
            "text/plain; charset=utf-8",
            TEXT_FILE_NAME,
            render_text_file(&document).into_bytes(),
        ),
        Err(skip) => {
            let response = DocumentResponse {
                success: false,
                message: skip.message().to_string(),
                document: None,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
    }
}
