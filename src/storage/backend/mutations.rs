//! Mutation operations for SeaOrmStorage
//!
//! This module contains all write database operations.

use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ExprTrait, QueryFilter, TransactionTrait,
    sea_query::Expr,
};
use tracing::info;

use super::SeaOrmStorage;
use super::converters::{
    file_upload_to_active_model, model_to_file_upload, model_to_wish_product,
    wish_product_to_active_model,
};
use crate::errors::{BiMarketError, Result};
use crate::storage::models::{FileUpload, WishProduct, WishStatus};

use migration::entities::{file_upload, petition, wish_product};

impl SeaOrmStorage {
    /// 新增许愿商品及其图片上传记录（同一事务）
    pub async fn insert_wish_product(
        &self,
        product: &WishProduct,
        uploads: &[FileUpload],
    ) -> Result<()> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| BiMarketError::database_operation(format!("开始事务失败: {}", e)))?;

        wish_product::Entity::insert(wish_product_to_active_model(product, true))
            .exec(&txn)
            .await
            .map_err(|e| {
                BiMarketError::database_operation(format!(
                    "新增许愿商品 '{}' 失败: {}",
                    product.id, e
                ))
            })?;

        if !uploads.is_empty() {
            let models: Vec<file_upload::ActiveModel> =
                uploads.iter().map(file_upload_to_active_model).collect();
            file_upload::Entity::insert_many(models)
                .exec(&txn)
                .await
                .map_err(|e| {
                    BiMarketError::database_operation(format!("写入上传记录失败: {}", e))
                })?;
        }

        txn.commit()
            .await
            .map_err(|e| BiMarketError::database_operation(format!("提交事务失败: {}", e)))?;

        self.invalidate_count_cache();
        info!(
            "Wish product created: {} ({} images)",
            product.id,
            uploads.len()
        );
        Ok(())
    }

    /// 单独上传的文件记录
    pub async fn insert_file_upload(&self, upload: &FileUpload) -> Result<()> {
        file_upload::Entity::insert(file_upload_to_active_model(upload))
            .exec(&self.db)
            .await
            .map_err(|e| BiMarketError::database_operation(format!("写入上传记录失败: {}", e)))?;
        Ok(())
    }

    /// 更新审核状态，商品不存在时返回 None
    pub async fn update_wish_status(
        &self,
        id: &str,
        status: WishStatus,
    ) -> Result<Option<WishProduct>> {
        let Some(model) = wish_product::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await
            .map_err(|e| BiMarketError::database_operation(format!("查询许愿商品失败: {}", e)))?
        else {
            return Ok(None);
        };

        let mut active: wish_product::ActiveModel = model.into();
        active.status = Set(status.to_string());
        active.updated_at = Set(Utc::now());

        let updated = active
            .update(&self.db)
            .await
            .map_err(|e| BiMarketError::database_operation(format!("更新状态失败: {}", e)))?;

        self.invalidate_count_cache();
        info!("Wish product {} status -> {}", id, status);
        Ok(Some(model_to_wish_product(updated)))
    }

    /// 原子递增点赞数，返回新的点赞数；商品不存在时返回 None
    pub async fn increment_like(&self, id: &str) -> Result<Option<i64>> {
        let result = wish_product::Entity::update_many()
            .col_expr(
                wish_product::Column::LikeCount,
                Expr::col(wish_product::Column::LikeCount).add(1i64),
            )
            .filter(wish_product::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(|e| BiMarketError::database_operation(format!("点赞更新失败: {}", e)))?;

        if result.rows_affected == 0 {
            return Ok(None);
        }

        let like_count = self
            .get_wish_product(id)
            .await?
            .map(|p| p.like_count)
            .unwrap_or_default();
        Ok(Some(like_count))
    }

    /// 删除许愿商品，连同连署与上传记录
    ///
    /// 返回被删除的上传记录（调用方负责清理磁盘文件）；商品不存在时返回 None
    pub async fn delete_wish_product(&self, id: &str) -> Result<Option<Vec<FileUpload>>> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| BiMarketError::database_operation(format!("开始事务失败: {}", e)))?;

        let exists = wish_product::Entity::find_by_id(id.to_string())
            .one(&txn)
            .await
            .map_err(|e| BiMarketError::database_operation(format!("查询许愿商品失败: {}", e)))?
            .is_some();
        if !exists {
            return Ok(None);
        }

        petition::Entity::delete_many()
            .filter(petition::Column::ProductId.eq(id))
            .exec(&txn)
            .await
            .map_err(|e| BiMarketError::database_operation(format!("删除连署记录失败: {}", e)))?;

        let uploads: Vec<FileUpload> = file_upload::Entity::find()
            .filter(file_upload::Column::RelatedId.eq(id))
            .all(&txn)
            .await
            .map_err(|e| BiMarketError::database_operation(format!("查询上传记录失败: {}", e)))?
            .into_iter()
            .map(model_to_file_upload)
            .collect();

        file_upload::Entity::delete_many()
            .filter(file_upload::Column::RelatedId.eq(id))
            .exec(&txn)
            .await
            .map_err(|e| BiMarketError::database_operation(format!("删除上传记录失败: {}", e)))?;

        wish_product::Entity::delete_by_id(id.to_string())
            .exec(&txn)
            .await
            .map_err(|e| BiMarketError::database_operation(format!("删除许愿商品失败: {}", e)))?;

        txn.commit()
            .await
            .map_err(|e| BiMarketError::database_operation(format!("提交事务失败: {}", e)))?;

        self.invalidate_count_cache();
        info!("Wish product deleted: {} ({} uploads)", id, uploads.len());
        Ok(Some(uploads))
    }
}
