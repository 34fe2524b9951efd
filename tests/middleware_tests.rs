//! Middleware and health endpoint tests
//!
//! Runs with the default configuration, so the admin token is unset.

use std::sync::{Arc, Once};

use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use actix_web::{App, web};
use serde_json::Value;
use tempfile::TempDir;

use bimarket::api::middleware::{RequestIdMiddleware, TimingMiddleware};
use bimarket::api::services::{AppStartTime, api_routes, health_routes};
use bimarket::config::{StaticConfig, set_config};
use bimarket::services::{AiService, AppServices};
use bimarket::storage::SeaOrmStorage;

static INIT: Once = Once::new();

fn init_default_config() {
    INIT.call_once(|| set_config(StaticConfig::default()));
}

async fn create_services(dir: &TempDir) -> AppServices {
    init_default_config();
    let db_url = format!("sqlite://{}?mode=rwc", dir.path().join("mw.db").display());
    let storage = Arc::new(
        SeaOrmStorage::new(&db_url, "sqlite")
            .await
            .expect("Failed to create storage"),
    );
    let mut config = StaticConfig::default();
    config.storage.uploads_dir = dir.path().join("uploads").display().to_string();
    AppServices::with_ai(storage, &config, AiService::new(None))
}

macro_rules! init_app {
    ($services:expr) => {
        test::init_service(
            App::new()
                .wrap(TimingMiddleware)
                .wrap(RequestIdMiddleware)
                .app_data(web::Data::new($services.clone()))
                .app_data(web::Data::new(AppStartTime {
                    start_datetime: chrono::Utc::now(),
                }))
                .service(health_routes())
                .service(api_routes()),
        )
        .await
    };
}

#[actix_rt::test]
async fn test_admin_scope_hidden_without_token() {
    let dir = TempDir::new().expect("temp dir");
    let services = create_services(&dir).await;
    let app = init_app!(services);

    let req = TestRequest::get()
        .uri("/api/admin/wish-products/export")
        .insert_header(("Authorization", "Bearer anything"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_request_id_generated_and_echoed() {
    let dir = TempDir::new().expect("temp dir");
    let services = create_services(&dir).await;
    let app = init_app!(services);

    let resp = test::call_service(&app, TestRequest::get().uri("/health/live").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let generated = resp
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .expect("request id header");
    assert_eq!(generated.len(), 36);

    let req = TestRequest::get()
        .uri("/health/ready")
        .insert_header(("X-Request-ID", "client-trace-42"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok()),
        Some("client-trace-42")
    );

    // 不合法的传入 ID 被替换
    let req = TestRequest::get()
        .uri("/health/ready")
        .insert_header(("X-Request-ID", "bad id with spaces"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_ne!(
        resp.headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok()),
        Some("bad id with spaces")
    );
}

#[actix_rt::test]
async fn test_health_check_reports_storage() {
    let dir = TempDir::new().expect("temp dir");
    let services = create_services(&dir).await;
    let app = init_app!(services);

    let resp = test::call_service(&app, TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "healthy");
    assert_eq!(body["data"]["storage"]["backend"], "sqlite");
    assert_eq!(body["data"]["storage"]["wishProductsCount"], 0);
}

#[actix_rt::test]
async fn test_invalid_query_uses_error_envelope() {
    let dir = TempDir::new().expect("temp dir");
    let services = create_services(&dir).await;
    let app = init_app!(services);

    let req = TestRequest::get()
        .uri("/api/wish-products?page=abc")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}
