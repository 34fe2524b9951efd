//! Service layer for business logic
//!
//! Shared between the HTTP handlers and the CLI commands.

mod ai_service;
mod category_service;
mod petition_service;
mod upload_service;
pub mod validation;
mod wish_product_service;

pub use ai_service::*;
pub use category_service::*;
pub use petition_service::*;
pub use upload_service::*;
pub use wish_product_service::*;

use std::sync::Arc;

use crate::config::StaticConfig;
use crate::storage::SeaOrmStorage;

/// 所有服务的集合，启动时构建一次
#[derive(Clone)]
pub struct AppServices {
    pub storage: Arc<SeaOrmStorage>,
    pub categories: Arc<CategoryService>,
    pub uploads: Arc<UploadService>,
    pub wish_products: Arc<WishProductService>,
    pub petitions: Arc<PetitionService>,
    pub ai: Arc<AiService>,
}

impl AppServices {
    pub fn new(storage: Arc<SeaOrmStorage>, config: &StaticConfig) -> Self {
        Self::with_ai(storage, config, AiService::from_config(&config.ai))
    }

    /// 替换 AI 生成器（测试使用）
    pub fn with_ai(storage: Arc<SeaOrmStorage>, config: &StaticConfig, ai: AiService) -> Self {
        let categories = Arc::new(CategoryService::new(storage.clone()));
        let uploads = Arc::new(UploadService::new(
            storage.clone(),
            config.storage.uploads_dir.clone(),
            config.upload.clone(),
        ));
        let wish_products = Arc::new(WishProductService::new(
            storage.clone(),
            categories.clone(),
            uploads.clone(),
            config.api.max_page_size,
        ));
        let petitions = Arc::new(PetitionService::new(storage.clone()));

        Self {
            storage,
            categories,
            uploads,
            wish_products,
            petitions,
            ai: Arc::new(ai),
        }
    }
}
