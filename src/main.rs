use cart_ocr_rust::{api, AppConfig, CartService};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::fmt::time::ChronoLocal;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 로그 초기화 - 로컬 시간 형식
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .init();

    // 설정 로드 (API 키는 Debug 출력에서 가려짐)
    let config = AppConfig::load()?;
    info!("Starting server with config: {:?}", config);

    let service = Arc::new(CartService::from_config(&config.vision)?);
    info!("Vision model: {}", service.extractor().model());

    let app = api::router(service);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  POST /api/cart/extract        - 장바구니 캡처 → 품목 표 (+ 품의서)");
    info!("  POST /api/cart/export/xlsx    - 품목 표 → 엑셀 (장바구니 시트)");
    info!("  POST /api/cart/export/csv     - 품목 표 → CSV");
    info!("  POST /api/cart/document       - 개요/품의서 생성");
    info!("  POST /api/cart/document/text  - 품의서 텍스트 파일");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
