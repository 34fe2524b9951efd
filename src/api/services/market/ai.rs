use actix_web::{Responder, web};

use crate::services::{AppServices, GenerateWishRequest};

use super::helpers::api_result;

/// POST /api/ai/generate-wish
pub async fn generate_wish(
    body: web::Json<GenerateWishRequest>,
    services: web::Data<AppServices>,
) -> impl Responder {
    api_result(services.ai.generate(&body).await)
}
