pub mod handlers;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;

use crate::service::CartService;

pub use handlers::*;

/// 업로드 최대 크기 (여러 장의 캡처 포함)
pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

pub fn router(service: Arc<CartService>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/cart/extract", post(handlers::extract_cart))
        .route("/api/cart/export/xlsx", post(handlers::export_xlsx))
        .route("/api/cart/export/csv", post(handlers::export_csv))
        .route("/api/cart/document", post(handlers::generate_document))
        .route("/api/cart/document/text", post(handlers::download_document))
        .layer(ServiceBuilder::new().layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)))
        .with_state(service)
}
