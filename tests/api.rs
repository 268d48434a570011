use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use cart_ocr_rust::api::{self, DocumentResponse, ExtractResponse};
use cart_ocr_rust::models::{CartItem, CartTable, CartVariant};
use cart_ocr_rust::service::{CartService, RetryPolicy};
use cart_ocr_rust::vision::{ChatRequest, ChatResponse, TransportError, VisionTransport};
use serde_json::json;
use std::collections::VecDeque;
use std::io::{Cursor, Read};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

const BOUNDARY: &str = "cartocrboundary";
const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0, 0];

/// 이미지 순서대로 응답 본문을 돌려주는 가짜 모델
struct FakeModel {
    replies: Mutex<VecDeque<Result<ChatResponse, TransportError>>>,
}

#[async_trait]
impl VisionTransport for FakeModel {
    async fn complete(&self, _request: &ChatRequest) -> Result<ChatResponse, TransportError> {
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::RateLimited("no more replies".into())))
    }
}

fn tool_reply(items: serde_json::Value) -> Result<ChatResponse, TransportError> {
    let body = json!({
        "choices": [{
            "message": {
                "content": null,
                "tool_calls": [{
                    "id": "call_1",
                    "type": "function",
                    "function": {
                        "name": "extract_items",
                        "arguments": json!({ "items": items }).to_string()
                    }
                }]
            }
        }]
    });
    Ok(serde_json::from_value(body).unwrap())
}

fn app(replies: Vec<Result<ChatResponse, TransportError>>) -> axum::Router {
    let model = Arc::new(FakeModel {
        replies: Mutex::new(replies.into()),
    });
    let service = CartService::new(model, "gpt-4o-mini", RetryPolicy::new(1, Duration::ZERO));
    api::router(Arc::new(service))
}

enum Part<'a> {
    File(&'a str, &'a [u8]),
    Text(&'a str, &'a str),
}

fn multipart_body(parts: &[Part]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::File(name, bytes) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"image\"; filename=\"{name}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}")
                        .as_bytes(),
                );
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(parts: &[Part]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/cart/extract")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

fn json_request(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()
}

#[tokio::test]
async fn health_check() {
    let response = app(vec![])
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"OK");
}

#[tokio::test]
async fn two_images_make_three_rows_and_documents() {
    let router = app(vec![
        tool_reply(json!([{"내용": "볼펜", "규격": "0.5mm", "수량": 10, "예상단가": 300}])),
        tool_reply(json!([
            {"내용": "A4 용지", "규격": "", "수량": 2, "예상단가": 25000},
            {"내용": "풀", "규격": "35g", "수량": 4, "예상단가": 1500}
        ])),
    ]);

    let response = router
        .clone()
        .oneshot(upload_request(&[
            Part::File("cart1.png", PNG),
            Part::File("cart2.jpg", JPEG),
            Part::Text("variant", "procurement"),
            Part::Text("title", "학습 준비물 구입"),
            Part::Text("purpose", "수업 준비물 확보"),
        ]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let result: ExtractResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert!(result.success);
    assert_eq!(result.table.len(), 3);
    assert_eq!(result.grand_total, 3_000 + 50_000 + 6_000);
    assert_eq!(result.grand_total_text, "59,000");

    let document = result.document.expect("document generated");
    assert!(!document.overview.is_empty());
    assert!(!document.request.is_empty());
    assert!(document.overview.contains("59,000"));
    assert!(document.request.contains("59,000"));

    // 같은 표로 엑셀 내보내기: 장바구니 시트, 헤더 + 3행
    let response = router
        .clone()
        .oneshot(json_request(
            "/api/cart/export/xlsx",
            serde_json::to_value(&result.table).unwrap(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    );
    assert!(response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .contains("cart_items.xlsx"));
    let workbook = body_bytes(response).await;
    let mut archive = zip::ZipArchive::new(Cursor::new(workbook)).unwrap();
    let mut xml = String::new();
    archive
        .by_name("xl/workbook.xml")
        .unwrap()
        .read_to_string(&mut xml)
        .unwrap();
    assert!(xml.contains("장바구니"));
    xml.clear();
    archive
        .by_name("xl/worksheets/sheet1.xml")
        .unwrap()
        .read_to_string(&mut xml)
        .unwrap();
    assert_eq!(xml.matches("<row ").count(), 4);

    // CSV 내보내기도 헤더 + 3행
    let response = router
        .oneshot(json_request(
            "/api/cart/export/csv",
            serde_json::to_value(&result.table).unwrap(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .contains("cart_items.csv"));
    let csv = String::from_utf8(body_bytes(response).await).unwrap();
    let lines: Vec<&str> = csv.trim_start_matches('\u{feff}').lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], "내용,규격,수량,예상단가,금액");
}

#[tokio::test]
async fn missing_title_skips_document() {
    let router = app(vec![tool_reply(json!([
        {"내용": "가위", "규격": "", "수량": 1, "예상단가": 2000}
    ]))]);

    let response = router
        .oneshot(upload_request(&[Part::File("cart.png", PNG)]))
        .await
        .unwrap();
    let result: ExtractResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();

    assert!(result.success);
    assert_eq!(result.table.len(), 1);
    assert!(result.document.is_none());
}

#[tokio::test]
async fn basic_variant_table_has_no_document() {
    let router = app(vec![tool_reply(json!([
        {"품명": "노트", "수량": 3, "단가": 1200, "총액": 3600}
    ]))]);

    let response = router
        .oneshot(upload_request(&[
            Part::File("cart.png", PNG),
            Part::Text("variant", "basic"),
            Part::Text("title", "준비물 구입"),
            Part::Text("purpose", "수업"),
        ]))
        .await
        .unwrap();
    let result: ExtractResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();

    assert!(result.success);
    assert_eq!(result.table.len(), 1);
    assert!(result.document.is_none());
    assert!(result
        .message
        .ends_with(cart_ocr_rust::service::document::BASIC_VARIANT_MESSAGE));
}

#[tokio::test]
async fn exhausted_retries_report_warning() {
    let router = app(vec![]);

    let response = router
        .oneshot(upload_request(&[
            Part::File("cart.png", PNG),
            Part::Text("variant", "basic"),
        ]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let result: ExtractResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert!(!result.success);
    assert_eq!(result.message, api::EMPTY_RESULT_MESSAGE);
    assert!(result.table.is_empty());
    assert_eq!(result.table.variant, CartVariant::Basic);
    assert_eq!(result.warnings.len(), 1);
}

#[tokio::test]
async fn rejects_upload_without_images() {
    let response = app(vec![])
        .oneshot(upload_request(&[Part::File("notes.txt", b"hello")]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn document_endpoint_needs_title_and_purpose() {
    let table = CartTable::with_items(
        CartVariant::Procurement,
        vec![CartItem {
            name: "볼펜".into(),
            quantity: 3,
            unit_price: 4000,
            ..Default::default()
        }],
    );

    let response = app(vec![])
        .oneshot(json_request(
            "/api/cart/document",
            json!({ "table": table, "title": "", "purpose": "준비물" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let result: DocumentResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert!(!result.success);
    assert!(result.document.is_none());

    let response = app(vec![])
        .oneshot(json_request(
            "/api/cart/document/text",
            json!({ "table": table, "title": "준비물 구입", "purpose": "수업" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let text = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(text.contains("개요"));
    assert!(text.contains("품의서"));
    assert!(text.contains("금12,000원"));
    assert!(text.contains("일만이천원정"));
}
