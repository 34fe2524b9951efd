//! Query operations for SeaOrmStorage
//!
//! This module contains all read-only database operations.

use sea_orm::{
    ColumnTrait, Condition, EntityTrait, Order, PaginatorTrait, QueryFilter, QueryOrder,
};
use tracing::{debug, error};

use super::converters::{model_to_category, model_to_file_upload, model_to_wish_product};
use super::{SeaOrmStorage, SortOrder, max_page_for, WishProductFilter, WishProductSort, WishSortField, retry};
use crate::errors::{BiMarketError, Result};
use crate::storage::models::{FileUpload, ProductCategory, WishProduct};

use migration::entities::{file_upload, petition, product_category, wish_product};

fn build_condition(filter: &WishProductFilter) -> Condition {
    let mut condition = Condition::all();

    if let Some(category_id) = filter.category_id {
        condition = condition.add(wish_product::Column::CategoryId.eq(category_id));
    }

    if !filter.statuses.is_empty() {
        condition = condition.add(
            wish_product::Column::Status.is_in(filter.statuses.iter().map(|s| s.to_string())),
        );
    }

    if let Some(excluded) = filter.exclude_status {
        condition = condition.add(wish_product::Column::Status.ne(excluded.to_string()));
    }

    if let Some(after) = filter.created_after {
        condition = condition.add(wish_product::Column::CreatedAt.gte(after));
    }

    if let Some(before) = filter.created_before {
        condition = condition.add(wish_product::Column::CreatedAt.lte(before));
    }

    if let Some(min) = filter.min_price {
        condition = condition.add(wish_product::Column::ExpectedPrice.gte(min));
    }

    if let Some(max) = filter.max_price {
        condition = condition.add(wish_product::Column::ExpectedPrice.lte(max));
    }

    condition
}

fn sort_column(field: WishSortField) -> wish_product::Column {
    match field {
        WishSortField::CreatedAt => wish_product::Column::CreatedAt,
        WishSortField::UpdatedAt => wish_product::Column::UpdatedAt,
        WishSortField::Name => wish_product::Column::Name,
        WishSortField::WishCount => wish_product::Column::WishCount,
        WishSortField::ExpectedPrice => wish_product::Column::ExpectedPrice,
    }
}

fn sort_order(order: SortOrder) -> Order {
    match order {
        SortOrder::Asc => Order::Asc,
        SortOrder::Desc => Order::Desc,
    }
}

impl SeaOrmStorage {
    pub async fn get_wish_product(&self, id: &str) -> Result<Option<WishProduct>> {
        let db = &self.db;
        let id_owned = id.to_string();

        let model = retry::with_retry(
            &format!("get_wish_product({})", id),
            self.retry_config,
            || async { wish_product::Entity::find_by_id(id_owned.clone()).one(db).await },
        )
        .await
        .map_err(|e| {
            error!("查询许愿商品失败（重试后仍失败）: {}", e);
            BiMarketError::database_operation(format!("查询许愿商品失败: {}", e))
        })?;

        Ok(model.map(model_to_wish_product))
    }

    /// 带过滤、排序的分页查询（带 COUNT 缓存）
    ///
    /// 页码超出 [`max_page_for`] 时按最后可寻址的一页处理
    ///
    /// `page` 从 1 开始，返回 (当前页数据, 总数)
    pub async fn query_wish_products(
        &self,
        filter: &WishProductFilter,
        sort: WishProductSort,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<WishProduct>, u64)> {
        let condition = build_condition(filter);
        let cache_key = filter.cache_key();
        let db = &self.db;

        let total = if let Some(cached) = self.count_cache.get(&cache_key) {
            debug!("count cache hit: key={}, value={}", cache_key, cached);
            cached
        } else {
            let cond = condition.clone();
            let count = retry::with_retry("query_wish_products(count)", self.retry_config, || async {
                wish_product::Entity::find()
                    .filter(cond.clone())
                    .count(db)
                    .await
            })
            .await
            .map_err(|e| BiMarketError::database_operation(format!("统计许愿商品失败: {}", e)))?;
            self.count_cache.insert(cache_key, count);
            count
        };

        let page_size = page_size.max(1);
        let page_offset = page.clamp(1, max_page_for(page_size)) - 1;
        let column = sort_column(sort.field);
        let order = sort_order(sort.order);

        let models = retry::with_retry("query_wish_products(data)", self.retry_config, || async {
            wish_product::Entity::find()
                .filter(condition.clone())
                .order_by(column, order.clone())
                .order_by(wish_product::Column::Id, Order::Asc)
                .paginate(db, page_size)
                .fetch_page(page_offset)
                .await
        })
        .await
        .map_err(|e| {
            error!("分页查询许愿商品失败（重试后仍失败）: {}", e);
            BiMarketError::database_operation(format!("分页查询失败: {}", e))
        })?;

        Ok((models.into_iter().map(model_to_wish_product).collect(), total))
    }

    pub async fn count_wish_products(&self) -> Result<u64> {
        let db = &self.db;
        retry::with_retry("count_wish_products", self.retry_config, || async {
            wish_product::Entity::find().count(db).await
        })
        .await
        .map_err(|e| BiMarketError::database_operation(format!("统计许愿商品失败: {}", e)))
    }

    /// 加载全部许愿商品（导出用，按创建时间升序）
    pub async fn load_all_wish_products(&self) -> Result<Vec<WishProduct>> {
        let models = wish_product::Entity::find()
            .order_by_asc(wish_product::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| BiMarketError::database_operation(format!("加载许愿商品失败: {}", e)))?;
        Ok(models.into_iter().map(model_to_wish_product).collect())
    }

    /// 启用中的分类，按 sort_order 排序
    pub async fn list_active_categories(&self) -> Result<Vec<ProductCategory>> {
        let db = &self.db;
        let models = retry::with_retry("list_active_categories", self.retry_config, || async {
            product_category::Entity::find()
                .filter(product_category::Column::IsActive.eq(true))
                .order_by_asc(product_category::Column::SortOrder)
                .order_by_asc(product_category::Column::Id)
                .all(db)
                .await
        })
        .await
        .map_err(|e| BiMarketError::database_operation(format!("查询分类失败: {}", e)))?;
        Ok(models.into_iter().map(model_to_category).collect())
    }

    pub async fn list_all_categories(&self) -> Result<Vec<ProductCategory>> {
        let models = product_category::Entity::find()
            .order_by_asc(product_category::Column::SortOrder)
            .order_by_asc(product_category::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| BiMarketError::database_operation(format!("查询分类失败: {}", e)))?;
        Ok(models.into_iter().map(model_to_category).collect())
    }

    pub async fn get_category(&self, id: i32) -> Result<Option<ProductCategory>> {
        let db = &self.db;
        let model = retry::with_retry(&format!("get_category({})", id), self.retry_config, || async {
            product_category::Entity::find_by_id(id).one(db).await
        })
        .await
        .map_err(|e| BiMarketError::database_operation(format!("查询分类失败: {}", e)))?;
        Ok(model.map(model_to_category))
    }

    pub async fn has_petition(&self, product_id: &str, user_id: &str) -> Result<bool> {
        let db = &self.db;
        let key = (product_id.to_string(), user_id.to_string());
        let found = retry::with_retry("has_petition", self.retry_config, || async {
            petition::Entity::find_by_id(key.clone()).one(db).await
        })
        .await
        .map_err(|e| BiMarketError::database_operation(format!("查询连署状态失败: {}", e)))?;
        Ok(found.is_some())
    }

    pub async fn list_uploads_for(&self, related_id: &str) -> Result<Vec<FileUpload>> {
        let models = file_upload::Entity::find()
            .filter(file_upload::Column::RelatedId.eq(related_id))
            .order_by_asc(file_upload::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| BiMarketError::database_operation(format!("查询上传记录失败: {}", e)))?;
        Ok(models.into_iter().map(model_to_file_upload).collect())
    }

    pub async fn load_all_file_uploads(&self) -> Result<Vec<FileUpload>> {
        let models = file_upload::Entity::find()
            .order_by_asc(file_upload::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| BiMarketError::database_operation(format!("加载上传记录失败: {}", e)))?;
        Ok(models.into_iter().map(model_to_file_upload).collect())
    }
}
