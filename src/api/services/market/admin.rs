//! 管理端点（Bearer token 保护）

use std::str::FromStr;

use actix_web::{HttpResponse, Responder, web};
use tracing::info;

use crate::errors::BiMarketError;
use crate::services::{AppServices, UpdateCategoryRequest};
use crate::storage::WishStatus;
use crate::utils::csv_handler::generate_export_filename;

use super::helpers::{api_result, error_from_bimarket};
use super::types::{CategoryBody, DeletedResponse, StatusUpdateBody};

/// PATCH /api/admin/wish-products/{id}/status
pub async fn update_wish_status(
    path: web::Path<String>,
    body: web::Json<StatusUpdateBody>,
    services: web::Data<AppServices>,
) -> impl Responder {
    let id = path.into_inner();
    let status = match WishStatus::from_str(body.status.trim()) {
        Ok(status) => status,
        Err(_) => {
            return error_from_bimarket(&BiMarketError::validation(format!(
                "無效的狀態: {}",
                body.status
            )));
        }
    };

    info!("Admin API: set status of {} to {}", id, status);
    api_result(services.wish_products.update_status(&id, status).await)
}

/// DELETE /api/admin/wish-products/{id}
pub async fn delete_wish_product(
    path: web::Path<String>,
    services: web::Data<AppServices>,
) -> impl Responder {
    let id = path.into_inner();
    info!("Admin API: delete wish product {}", id);
    api_result(
        services
            .wish_products
            .delete(&id)
            .await
            .map(|()| DeletedResponse { id, deleted: true }),
    )
}

/// GET /api/admin/wish-products/export
pub async fn export_wish_products(services: web::Data<AppServices>) -> impl Responder {
    match services.wish_products.export_csv().await {
        Ok(content) => {
            let filename = generate_export_filename();
            info!("Admin API: exporting wish products to {}", filename);
            HttpResponse::Ok()
                .content_type("text/csv; charset=utf-8")
                .insert_header((
                    "Content-Disposition",
                    format!("attachment; filename=\"{}\"", filename),
                ))
                .body(content)
        }
        Err(e) => error_from_bimarket(&e),
    }
}

/// PUT /api/admin/categories/{id}
pub async fn update_category(
    path: web::Path<i32>,
    body: web::Json<CategoryBody>,
    services: web::Data<AppServices>,
) -> impl Responder {
    let body = body.into_inner();
    let req = UpdateCategoryRequest {
        name: body.name,
        description: body.description,
        is_active: body.is_active,
        sort_order: body.sort_order,
    };
    api_result(services.categories.upsert(path.into_inner(), req).await)
}
