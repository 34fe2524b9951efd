//! Upsert 与批量导入
//!
//! 导入旧 CSV 数据时按主键覆盖已有记录，分块写入避免超出 SQL 参数上限。

use sea_orm::{EntityTrait, TransactionTrait, sea_query::OnConflict};
use tracing::info;

use super::SeaOrmStorage;
use super::converters::{
    category_to_active_model, file_upload_to_active_model, wish_product_to_active_model,
};
use crate::errors::{BiMarketError, Result};
use crate::storage::models::{FileUpload, ProductCategory, WishProduct};

use migration::entities::{file_upload, product_category, wish_product};

const BATCH_CHUNK_SIZE: usize = 500;

fn category_on_conflict() -> OnConflict {
    OnConflict::column(product_category::Column::Id)
        .update_columns([
            product_category::Column::Name,
            product_category::Column::Description,
            product_category::Column::IsActive,
            product_category::Column::SortOrder,
            product_category::Column::UpdatedAt,
        ])
        .to_owned()
}

impl SeaOrmStorage {
    /// 新增或覆盖一个分类（管理端编辑）
    pub async fn upsert_category(&self, category: &ProductCategory) -> Result<()> {
        product_category::Entity::insert(category_to_active_model(category))
            .on_conflict(category_on_conflict())
            .exec(&self.db)
            .await
            .map_err(|e| {
                BiMarketError::database_operation(format!(
                    "Upsert 分类 {} ({}) 失败: {}",
                    category.id, category.name, e
                ))
            })?;
        info!("Category upserted: {} {}", category.id, category.name);
        Ok(())
    }

    pub async fn batch_upsert_categories(&self, categories: &[ProductCategory]) -> Result<usize> {
        if categories.is_empty() {
            return Ok(0);
        }

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| BiMarketError::database_operation(format!("开始事务失败: {}", e)))?;

        for chunk in categories.chunks(BATCH_CHUNK_SIZE) {
            let models: Vec<_> = chunk.iter().map(category_to_active_model).collect();
            product_category::Entity::insert_many(models)
                .on_conflict(category_on_conflict())
                .exec(&txn)
                .await
                .map_err(|e| {
                    BiMarketError::database_operation(format!("批量写入分类失败: {}", e))
                })?;
        }

        txn.commit()
            .await
            .map_err(|e| BiMarketError::database_operation(format!("提交事务失败: {}", e)))?;

        info!("Batch upserted {} categories", categories.len());
        Ok(categories.len())
    }

    /// 批量导入许愿商品，计数器也以导入数据为准
    pub async fn batch_upsert_wish_products(&self, products: &[WishProduct]) -> Result<usize> {
        if products.is_empty() {
            return Ok(0);
        }

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| BiMarketError::database_operation(format!("开始事务失败: {}", e)))?;

        for chunk in products.chunks(BATCH_CHUNK_SIZE) {
            let models: Vec<_> = chunk
                .iter()
                .map(|p| wish_product_to_active_model(p, true))
                .collect();
            wish_product::Entity::insert_many(models)
                .on_conflict(
                    OnConflict::column(wish_product::Column::Id)
                        .update_columns([
                            wish_product::Column::Name,
                            wish_product::Column::Description,
                            wish_product::Column::CategoryId,
                            wish_product::Column::Region,
                            wish_product::Column::ExpectedPrice,
                            wish_product::Column::Currency,
                            wish_product::Column::WishCount,
                            wish_product::Column::LikeCount,
                            wish_product::Column::AdditionalInfo,
                            wish_product::Column::ImageUrls,
                            wish_product::Column::Status,
                            wish_product::Column::UserId,
                            wish_product::Column::CreatedAt,
                            wish_product::Column::UpdatedAt,
                        ])
                        .to_owned(),
                )
                .exec(&txn)
                .await
                .map_err(|e| {
                    BiMarketError::database_operation(format!("批量写入许愿商品失败: {}", e))
                })?;
        }

        txn.commit()
            .await
            .map_err(|e| BiMarketError::database_operation(format!("提交事务失败: {}", e)))?;

        self.invalidate_count_cache();
        info!("Batch upserted {} wish products", products.len());
        Ok(products.len())
    }

    pub async fn batch_upsert_file_uploads(&self, uploads: &[FileUpload]) -> Result<usize> {
        if uploads.is_empty() {
            return Ok(0);
        }

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| BiMarketError::database_operation(format!("开始事务失败: {}", e)))?;

        for chunk in uploads.chunks(BATCH_CHUNK_SIZE) {
            let models: Vec<_> = chunk.iter().map(file_upload_to_active_model).collect();
            file_upload::Entity::insert_many(models)
                .on_conflict(
                    OnConflict::column(file_upload::Column::Id)
                        .update_columns([
                            file_upload::Column::OriginalFilename,
                            file_upload::Column::StoredFilename,
                            file_upload::Column::FilePath,
                            file_upload::Column::FileSize,
                            file_upload::Column::MimeType,
                            file_upload::Column::RelatedTable,
                            file_upload::Column::RelatedId,
                        ])
                        .to_owned(),
                )
                .exec(&txn)
                .await
                .map_err(|e| {
                    BiMarketError::database_operation(format!("批量写入上传记录失败: {}", e))
                })?;
        }

        txn.commit()
            .await
            .map_err(|e| BiMarketError::database_operation(format!("提交事务失败: {}", e)))?;

        info!("Batch upserted {} file uploads", uploads.len());
        Ok(uploads.len())
    }
}
