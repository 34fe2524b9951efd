//! Category service

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::errors::{BiMarketError, Result};
use crate::storage::{ProductCategory, SeaOrmStorage};

/// 找不到分类时显示的名称
pub const FALLBACK_CATEGORY_NAME: &str = "其他";

/// 管理端编辑分类的请求
#[derive(Debug, Clone)]
pub struct UpdateCategoryRequest {
    pub name: String,
    pub description: Option<String>,
    pub is_active: Option<bool>,
    pub sort_order: Option<i32>,
}

/// 分类名称查找表
#[derive(Debug, Clone, Default)]
pub struct CategoryNames(HashMap<i32, String>);

impl CategoryNames {
    pub fn name_of(&self, id: i32) -> &str {
        self.0
            .get(&id)
            .map(String::as_str)
            .unwrap_or(FALLBACK_CATEGORY_NAME)
    }
}

impl FromIterator<ProductCategory> for CategoryNames {
    fn from_iter<I: IntoIterator<Item = ProductCategory>>(iter: I) -> Self {
        Self(iter.into_iter().map(|c| (c.id, c.name)).collect())
    }
}

pub struct CategoryService {
    storage: Arc<SeaOrmStorage>,
}

impl CategoryService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    pub async fn list_active(&self) -> Result<Vec<ProductCategory>> {
        self.storage.list_active_categories().await
    }

    /// 全部分类（含停用）的名称表
    pub async fn names(&self) -> Result<CategoryNames> {
        Ok(self
            .storage
            .list_all_categories()
            .await?
            .into_iter()
            .collect())
    }

    /// 校验分类存在且启用
    pub async fn require_active(&self, id: i32) -> Result<ProductCategory> {
        match self.storage.get_category(id).await? {
            Some(category) if category.is_active => Ok(category),
            _ => Err(BiMarketError::category_not_found(format!(
                "商品類別 {} 不存在",
                id
            ))),
        }
    }

    /// 新建或更新分类；未提供的字段沿用原值
    pub async fn upsert(&self, id: i32, req: UpdateCategoryRequest) -> Result<ProductCategory> {
        let name = req.name.trim();
        if name.is_empty() || name.chars().count() > 100 {
            return Err(BiMarketError::validation("分類名稱必須為1到100個字元"));
        }
        if id <= 0 {
            return Err(BiMarketError::validation("分類 ID 必須為正整數"));
        }

        let now = Utc::now();
        let existing = self.storage.get_category(id).await?;
        let category = ProductCategory {
            id,
            name: name.to_string(),
            description: req
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty())
                .or_else(|| existing.as_ref().and_then(|c| c.description.clone())),
            is_active: req
                .is_active
                .or(existing.as_ref().map(|c| c.is_active))
                .unwrap_or(true),
            sort_order: req
                .sort_order
                .or(existing.as_ref().map(|c| c.sort_order))
                .unwrap_or(id),
            created_at: existing.as_ref().map(|c| c.created_at).unwrap_or(now),
            updated_at: now,
        };

        self.storage.upsert_category(&category).await?;
        info!(
            "CategoryService: {} category {} '{}'",
            if existing.is_some() { "updated" } else { "created" },
            id,
            category.name
        );
        Ok(category)
    }
}
