//! SeaORM storage backend
//!
//! This module provides database storage using SeaORM,
//! supporting SQLite, MySQL/MariaDB, and PostgreSQL.

mod connection;
mod converters;
mod mutations;
mod operations;
mod petitions;
mod query;
pub mod retry;

use std::time::Duration;

use chrono::{DateTime, Utc};
use moka::sync::Cache;
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use strum::{AsRefStr, EnumString};
use tracing::warn;

use crate::errors::{BiMarketError, Result};
use crate::storage::models::WishStatus;

pub use connection::{connect_generic, connect_sqlite, run_migrations};
pub use converters::{
    category_to_active_model, file_upload_to_active_model, join_image_urls, model_to_category,
    model_to_file_upload, model_to_wish_product, split_image_urls, wish_product_to_active_model,
};

/// 给定每页条数时允许的最大页码，保证 `(page - 1) * page_size` 不超过 i64::MAX
pub fn max_page_for(page_size: u64) -> u64 {
    i64::MAX.unsigned_abs() / page_size.max(1)
}

/// 从数据库 URL 推断数据库类型
pub fn infer_backend_from_url(database_url: &str) -> Result<String> {
    if database_url.starts_with("sqlite:")
        || database_url.ends_with(".db")
        || database_url.ends_with(".sqlite")
        || database_url == ":memory:"
    {
        Ok("sqlite".to_string())
    } else if database_url.starts_with("mysql://") || database_url.starts_with("mariadb://") {
        Ok("mysql".to_string())
    } else if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        Ok("postgres".to_string())
    } else {
        Err(BiMarketError::database_config(format!(
            "无法从 URL 推断数据库类型: {}. 支持的 URL 格式: sqlite://, mysql://, mariadb://, postgres://",
            database_url
        )))
    }
}

/// 许愿商品过滤条件
#[derive(Default, Clone, Debug)]
pub struct WishProductFilter {
    pub category_id: Option<i32>,
    /// 只返回这些状态（空表示不限）
    pub statuses: Vec<WishStatus>,
    /// 排除某个状态（公开列表隐藏已取消的）
    pub exclude_status: Option<WishStatus>,
    /// 创建时间 >= created_after
    pub created_after: Option<DateTime<Utc>>,
    /// 创建时间 <= created_before
    pub created_before: Option<DateTime<Utc>>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

impl WishProductFilter {
    /// COUNT 缓存 key
    fn cache_key(&self) -> String {
        format!(
            "count:c={:?}:s={:?}:x={:?}:a={:?}:b={:?}:min={:?}:max={:?}",
            self.category_id,
            self.statuses,
            self.exclude_status,
            self.created_after.map(|d| d.timestamp_millis()),
            self.created_before.map(|d| d.timestamp_millis()),
            self.min_price,
            self.max_price
        )
    }
}

/// 排序字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, EnumString, AsRefStr)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum WishSortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    Name,
    WishCount,
    ExpectedPrice,
}

/// 排序方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, EnumString, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WishProductSort {
    pub field: WishSortField,
    pub order: SortOrder,
}

/// SeaORM-based storage backend
#[derive(Clone)]
pub struct SeaOrmStorage {
    db: DatabaseConnection,
    backend_name: String,
    /// 分页 COUNT 缓存（TTL 30秒）
    count_cache: Cache<String, u64>,
    /// 重试配置
    retry_config: retry::RetryConfig,
}

impl SeaOrmStorage {
    pub async fn new(database_url: &str, backend_name: &str) -> Result<Self> {
        if database_url.is_empty() {
            return Err(BiMarketError::database_config(
                "DATABASE_URL 未设置".to_string(),
            ));
        }

        // 读取重试配置
        let config = crate::config::get_config();
        let retry_config = retry::RetryConfig::from(&config.database);

        // 根据不同数据库类型配置连接选项
        let db = if backend_name == "sqlite" {
            connect_sqlite(database_url).await?
        } else {
            connect_generic(database_url, backend_name).await?
        };

        let storage = SeaOrmStorage {
            db,
            backend_name: backend_name.to_string(),
            count_cache: Cache::builder()
                .time_to_live(Duration::from_secs(30))
                .max_capacity(100)
                .build(),
            retry_config,
        };

        // 运行迁移
        run_migrations(&storage.db).await?;

        warn!(
            "{} Storage initialized.",
            storage.backend_name.to_uppercase()
        );
        Ok(storage)
    }

    pub fn backend_name(&self) -> &str {
        &self.backend_name
    }

    /// 获取数据库连接（关闭连接池等场景）
    pub fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// 清除分页 COUNT 缓存（数据变更时调用）
    pub fn invalidate_count_cache(&self) {
        self.count_cache.invalidate_all();
    }
}
