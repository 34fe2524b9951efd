//! 路由配置
//!
//! 按功能拆分为公开 API、文件服务和管理端三组 scope。

use actix_web::dev::HttpServiceFactory;
use actix_web::web;

use crate::api::middleware::AdminAuth;

use super::admin::{
    delete_wish_product, export_wish_products, update_category, update_wish_status,
};
use super::ai::generate_wish;
use super::categories::list_categories;
use super::helpers::{json_config, path_config, query_config};
use super::petitions::{add_petition, petition_status, remove_petition};
use super::uploads::{get_uploaded_image, serve_upload, upload_file};
use super::wish_products::{
    create_wish_product, get_wish_product, like_wish_product, list_wish_products,
    public_wish_list,
};

/// 许愿商品路由 `/wish-products`
pub fn wish_products_routes() -> actix_web::Scope {
    web::scope("/wish-products")
        .route("", web::post().to(create_wish_product))
        .route("", web::get().to(list_wish_products))
        .route("/{id}/like", web::post().to(like_wish_product))
        .route("/{id}/petition/status", web::get().to(petition_status))
        .route("/{id}/petition", web::post().to(add_petition))
        .route("/{id}/petition", web::delete().to(remove_petition))
        .route("/{id}", web::get().to(get_wish_product))
}

/// 管理路由 `/admin`
///
/// 包含：
/// - PATCH /admin/wish-products/{id}/status - 审核状态
/// - DELETE /admin/wish-products/{id} - 删除商品
/// - GET /admin/wish-products/export - 导出 CSV
/// - PUT /admin/categories/{id} - 编辑分类
pub fn admin_routes() -> impl HttpServiceFactory {
    web::scope("/admin")
        .wrap(AdminAuth)
        // export 必须在 /{id} 之前
        .route("/wish-products/export", web::get().to(export_wish_products))
        .route(
            "/wish-products/{id}/status",
            web::patch().to(update_wish_status),
        )
        .route("/wish-products/{id}", web::delete().to(delete_wish_product))
        .route("/categories/{id}", web::put().to(update_category))
}

/// 全部 `/api` 路由
pub fn api_routes() -> actix_web::Scope {
    web::scope("/api")
        .app_data(query_config())
        .app_data(json_config())
        .app_data(path_config())
        .route("/wish-products-list", web::get().to(public_wish_list))
        .service(wish_products_routes())
        .route("/categories", web::get().to(list_categories))
        .route("/upload", web::post().to(upload_file))
        .route("/upload/{filename}", web::get().to(get_uploaded_image))
        .route("/ai/generate-wish", web::post().to(generate_wish))
        .service(admin_routes())
}

/// 上传文件静态服务 `/uploads/{path..}`
pub fn uploads_routes() -> actix_web::Scope {
    web::scope("/uploads").route("/{path:.*}", web::get().to(serve_upload))
}
