use actix_web::{Responder, web};

use crate::services::AppServices;

use super::helpers::api_result;

/// GET /api/categories
pub async fn list_categories(services: web::Data<AppServices>) -> impl Responder {
    api_result(services.categories.list_active().await)
}
