//! 连署端点
//!
//! 访客以 cookie 中的 ID 识别；连署时没有 cookie 会先生成一个并下发。

use actix_web::{HttpRequest, Responder, web};
use tracing::debug;

use crate::services::AppServices;

use super::helpers::{
    api_result, ensure_guest_id, error_from_bimarket, guest_id, success_response, with_cookie,
};
use super::types::PetitionStatusResponse;

/// POST /api/wish-products/{id}/petition
pub async fn add_petition(
    req: HttpRequest,
    path: web::Path<String>,
    services: web::Data<AppServices>,
) -> impl Responder {
    let product_id = path.into_inner();
    let (user_id, new_cookie) = ensure_guest_id(&req);

    match services.petitions.add(&product_id, &user_id).await {
        Ok(outcome) => {
            debug!("Petition {} by {}: {:?}", product_id, user_id, outcome);
            with_cookie(success_response(outcome), new_cookie)
        }
        Err(e) => error_from_bimarket(&e),
    }
}

/// DELETE /api/wish-products/{id}/petition
pub async fn remove_petition(
    req: HttpRequest,
    path: web::Path<String>,
    services: web::Data<AppServices>,
) -> impl Responder {
    let product_id = path.into_inner();
    let (user_id, new_cookie) = ensure_guest_id(&req);

    match services.petitions.remove(&product_id, &user_id).await {
        Ok(outcome) => with_cookie(success_response(outcome), new_cookie),
        Err(e) => error_from_bimarket(&e),
    }
}

/// GET /api/wish-products/{id}/petition/status
pub async fn petition_status(
    req: HttpRequest,
    path: web::Path<String>,
    services: web::Data<AppServices>,
) -> impl Responder {
    let user_id = guest_id(&req);
    let result = services
        .petitions
        .status(&path.into_inner(), user_id.as_deref())
        .await
        .map(|petitioned| PetitionStatusResponse {
            petitioned,
            user_id,
        });
    api_result(result)
}
