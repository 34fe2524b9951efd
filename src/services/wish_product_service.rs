//! Wish product service
//!
//! 许愿商品的创建、查询、审核和导出。HTTP 与 CLI 共用这里的业务逻辑。

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::errors::{BiMarketError, Result};
use crate::services::category_service::{CategoryNames, CategoryService};
use crate::services::upload_service::{UploadService, WISH_PRODUCTS_TABLE};
use crate::services::validation::{
    ImagePart, WishProductInput, collect_image_issues, validate_wish_input,
};
use crate::storage::{
    FileUpload, SeaOrmStorage, WishProduct, WishProductFilter, WishProductSort, WishStatus,
    max_page_for,
};
use crate::utils::csv_handler;

// ============ Request/Response DTOs ============

/// 新建许愿商品的请求
#[derive(Debug, Clone, Default)]
pub struct CreateWishRequest {
    pub input: WishProductInput,
    pub images: Vec<ImagePart>,
    /// 提交者的访客 ID
    pub user_id: Option<String>,
}

/// 管理端列表查询
#[derive(Debug, Clone, Default)]
pub struct WishListQuery {
    pub category_id: Option<i32>,
    pub status: Option<WishStatus>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub sort: WishProductSort,
    pub page: u64,
    pub limit: u64,
}

/// 公开列表查询（已取消的不显示）
#[derive(Debug, Clone, Default)]
pub struct PublicListQuery {
    pub category_id: Option<i32>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub sort: WishProductSort,
    pub page: u64,
    pub page_size: u64,
}

/// 一页数据
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> u64 {
        if self.page_size == 0 {
            0
        } else {
            self.total.div_ceil(self.page_size)
        }
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_size: self.page_size,
        }
    }
}

/// 公开列表项，附带分类名称
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicWishItem {
    pub id: String,
    pub name: String,
    pub product_name: String,
    pub description: String,
    pub category: String,
    pub category_id: i32,
    pub region: String,
    pub status: WishStatus,
    pub expected_price: f64,
    pub currency: String,
    pub wish_count: i64,
    pub like_count: i64,
    pub image_url: Option<String>,
    pub image_urls: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PublicWishItem {
    pub fn from_product(product: WishProduct, names: &CategoryNames) -> Self {
        Self {
            category: names.name_of(product.category_id).to_string(),
            image_url: product.image_urls.first().cloned(),
            product_name: product.name.clone(),
            id: product.id,
            name: product.name,
            description: product.description,
            category_id: product.category_id,
            region: product.region,
            status: product.status,
            expected_price: product.expected_price,
            currency: product.currency,
            wish_count: product.wish_count,
            like_count: product.like_count,
            image_urls: product.image_urls,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

// ============ WishProductService Implementation ============

pub struct WishProductService {
    storage: Arc<SeaOrmStorage>,
    categories: Arc<CategoryService>,
    uploads: Arc<UploadService>,
    max_page_size: u64,
}

impl WishProductService {
    pub fn new(
        storage: Arc<SeaOrmStorage>,
        categories: Arc<CategoryService>,
        uploads: Arc<UploadService>,
        max_page_size: u64,
    ) -> Self {
        Self {
            storage,
            categories,
            uploads,
            max_page_size: max_page_size.max(1),
        }
    }

    fn clamp_page(&self, page: u64, page_size: u64, default_size: u64) -> (u64, u64) {
        let size = if page_size == 0 { default_size } else { page_size };
        let size = size.clamp(1, self.max_page_size);
        (page.clamp(1, max_page_for(size)), size)
    }

    /// 校验表单、保存图片并写入商品，新商品直接以 completed 上架
    pub async fn create(&self, req: CreateWishRequest) -> Result<WishProduct> {
        let images: Vec<ImagePart> = req.images.into_iter().filter(|p| p.size() > 0).collect();

        let mut image_issues = Vec::new();
        collect_image_issues(&images, self.uploads.config(), &mut image_issues);

        let wish = match validate_wish_input(&req.input) {
            Ok(wish) if image_issues.is_empty() => wish,
            Ok(_) => return Err(BiMarketError::invalid_fields(image_issues)),
            Err(BiMarketError::InvalidFields(mut issues)) => {
                issues.extend(image_issues);
                return Err(BiMarketError::invalid_fields(issues));
            }
            Err(e) => return Err(e),
        };

        self.categories.require_active(wish.category_id).await?;

        let id = uuid::Uuid::new_v4().to_string();
        let mut stored: Vec<FileUpload> = Vec::with_capacity(images.len());
        for part in &images {
            match self.uploads.write_file(part).await {
                Ok(mut record) => {
                    record.related_table = Some(WISH_PRODUCTS_TABLE.to_string());
                    record.related_id = Some(id.clone());
                    stored.push(record);
                }
                Err(e) => {
                    self.uploads.remove_files(&stored).await;
                    return Err(e);
                }
            }
        }

        let now = Utc::now();
        let product = WishProduct {
            id,
            name: wish.name,
            description: wish.description,
            category_id: wish.category_id,
            region: wish.region,
            expected_price: wish.expected_price,
            currency: wish.currency,
            wish_count: 0,
            like_count: 0,
            additional_info: wish.additional_info,
            image_urls: stored.iter().map(|u| u.stored_filename.clone()).collect(),
            status: WishStatus::Completed,
            user_id: req.user_id,
            created_at: now,
            updated_at: now,
        };

        if let Err(e) = self.storage.insert_wish_product(&product, &stored).await {
            error!("WishProductService: failed to save '{}': {}", product.name, e);
            self.uploads.remove_files(&stored).await;
            return Err(e);
        }

        info!(
            "WishProductService: created '{}' ({}) with {} images",
            product.name,
            product.id,
            stored.len()
        );
        Ok(product)
    }

    pub async fn get(&self, id: &str) -> Result<WishProduct> {
        self.storage
            .get_wish_product(id)
            .await?
            .ok_or_else(|| BiMarketError::product_not_found(format!("找不到商品 {}", id)))
    }

    /// 管理端列表：可按状态、分类、创建时间过滤
    pub async fn list(&self, query: WishListQuery) -> Result<Page<WishProduct>> {
        let (page, page_size) = self.clamp_page(query.page, query.limit, 10);
        let filter = WishProductFilter {
            category_id: query.category_id,
            statuses: query.status.into_iter().collect(),
            created_after: query.start_date,
            created_before: query.end_date,
            ..Default::default()
        };

        let (items, total) = self
            .storage
            .query_wish_products(&filter, query.sort, page, page_size)
            .await?;
        Ok(Page {
            items,
            total,
            page,
            page_size,
        })
    }

    /// 公开列表：隐藏已取消的商品，附带分类名称
    pub async fn public_list(&self, query: PublicListQuery) -> Result<Page<PublicWishItem>> {
        let (page, page_size) = self.clamp_page(query.page, query.page_size, 20);
        let filter = WishProductFilter {
            category_id: query.category_id,
            exclude_status: Some(WishStatus::Cancelled),
            min_price: query.min_price,
            max_price: query.max_price,
            ..Default::default()
        };

        let (items, total) = self
            .storage
            .query_wish_products(&filter, query.sort, page, page_size)
            .await?;
        let names = self.categories.names().await?;

        Ok(Page {
            items,
            total,
            page,
            page_size,
        }
        .map(|p| PublicWishItem::from_product(p, &names)))
    }

    pub async fn update_status(&self, id: &str, status: WishStatus) -> Result<WishProduct> {
        self.storage
            .update_wish_status(id, status)
            .await?
            .ok_or_else(|| BiMarketError::product_not_found(format!("找不到商品 {}", id)))
    }

    /// 删除商品，并尽力清理其图片文件
    pub async fn delete(&self, id: &str) -> Result<()> {
        let uploads = self
            .storage
            .delete_wish_product(id)
            .await?
            .ok_or_else(|| BiMarketError::product_not_found(format!("找不到商品 {}", id)))?;

        self.uploads.remove_files(&uploads).await;
        info!("WishProductService: deleted {}", id);
        Ok(())
    }

    /// 点赞 +1，返回新的点赞数
    pub async fn like(&self, id: &str) -> Result<i64> {
        self.storage
            .increment_like(id)
            .await?
            .ok_or_else(|| BiMarketError::product_not_found(format!("找不到商品 {}", id)))
    }

    /// 按旧 CSV 列格式导出全部商品
    pub async fn export_csv(&self) -> Result<Vec<u8>> {
        let products = self.storage.load_all_wish_products().await?;
        let mut buf = Vec::new();
        csv_handler::write_wish_products(&mut buf, &products)?;
        if products.is_empty() {
            warn!("WishProductService: exporting an empty product list");
        }
        Ok(buf)
    }
}
