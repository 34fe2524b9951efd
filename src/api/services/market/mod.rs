//! BiMarket HTTP API
//!
//! - 许愿商品：提交、列表、详情、点赞、连署
//! - 分类、图片上传与文件服务、AI 描述生成
//! - 管理端：审核、删除、导出、编辑分类

mod admin;
mod ai;
mod categories;
pub mod error_code;
mod helpers;
mod petitions;
pub mod routes;
mod types;
mod uploads;
mod wish_products;

pub use error_code::ErrorCode;
pub use helpers::{
    IMMUTABLE_CACHE_CONTROL, api_result, build_guest_cookie, error_from_bimarket, error_response,
    success_response,
};
pub use routes::{admin_routes, api_routes, uploads_routes, wish_products_routes};
pub use types::*;
