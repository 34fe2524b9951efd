//! 连署（许愿 +1）操作
//!
//! 连署记录与 `wish_count` 在同一事务内变更，
//! (product_id, user_id) 主键保证同一访客只计一次。

use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, ExprTrait, QueryFilter, TransactionTrait,
    sea_query::Expr, sea_query::OnConflict,
};
use tracing::debug;

use super::{SeaOrmStorage, retry};
use crate::errors::{BiMarketError, Result};
use crate::storage::models::{PetitionAdd, PetitionRemove};

use migration::entities::{petition, wish_product};

async fn current_wish_count<C: ConnectionTrait>(
    conn: &C,
    product_id: &str,
) -> std::result::Result<Option<i64>, DbErr> {
    Ok(wish_product::Entity::find_by_id(product_id.to_string())
        .one(conn)
        .await?
        .map(|m| Ord::max(m.wish_count, 0)))
}

impl SeaOrmStorage {
    pub async fn add_petition(&self, product_id: &str, user_id: &str) -> Result<PetitionAdd> {
        let outcome = retry::with_retry("add_petition", self.retry_config, || {
            self.add_petition_once(product_id, user_id)
        })
        .await
        .map_err(|e| BiMarketError::database_operation(format!("新增连署失败: {}", e)))?;

        if matches!(outcome, PetitionAdd::Added { .. }) {
            self.invalidate_count_cache();
        }
        debug!(
            "Petition add product={} user={} -> {:?}",
            product_id, user_id, outcome
        );
        Ok(outcome)
    }

    pub async fn remove_petition(&self, product_id: &str, user_id: &str) -> Result<PetitionRemove> {
        let outcome = retry::with_retry("remove_petition", self.retry_config, || {
            self.remove_petition_once(product_id, user_id)
        })
        .await
        .map_err(|e| BiMarketError::database_operation(format!("取消连署失败: {}", e)))?;

        if matches!(outcome, PetitionRemove::Removed { .. }) {
            self.invalidate_count_cache();
        }
        debug!(
            "Petition remove product={} user={} -> {:?}",
            product_id, user_id, outcome
        );
        Ok(outcome)
    }

    async fn add_petition_once(
        &self,
        product_id: &str,
        user_id: &str,
    ) -> std::result::Result<PetitionAdd, DbErr> {
        let txn = self.db.begin().await?;

        if current_wish_count(&txn, product_id).await?.is_none() {
            return Ok(PetitionAdd::ProductNotFound);
        }

        let inserted = petition::Entity::insert(petition::ActiveModel {
            product_id: Set(product_id.to_string()),
            user_id: Set(user_id.to_string()),
            created_at: Set(Utc::now()),
        })
        .on_conflict(
            OnConflict::columns([petition::Column::ProductId, petition::Column::UserId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(&txn)
        .await?;

        if inserted > 0 {
            wish_product::Entity::update_many()
                .col_expr(
                    wish_product::Column::WishCount,
                    Expr::col(wish_product::Column::WishCount).add(1i64),
                )
                .filter(wish_product::Column::Id.eq(product_id))
                .exec(&txn)
                .await?;
        }

        let wish_count = current_wish_count(&txn, product_id)
            .await?
            .unwrap_or_default();
        txn.commit().await?;

        Ok(if inserted > 0 {
            PetitionAdd::Added { wish_count }
        } else {
            PetitionAdd::Already { wish_count }
        })
    }

    async fn remove_petition_once(
        &self,
        product_id: &str,
        user_id: &str,
    ) -> std::result::Result<PetitionRemove, DbErr> {
        let txn = self.db.begin().await?;

        if current_wish_count(&txn, product_id).await?.is_none() {
            return Ok(PetitionRemove::ProductNotFound);
        }

        let deleted =
            petition::Entity::delete_by_id((product_id.to_string(), user_id.to_string()))
                .exec(&txn)
                .await?
                .rows_affected;

        if deleted > 0 {
            // 计数不会减到 0 以下
            wish_product::Entity::update_many()
                .col_expr(
                    wish_product::Column::WishCount,
                    Expr::col(wish_product::Column::WishCount).sub(1i64),
                )
                .filter(wish_product::Column::Id.eq(product_id))
                .filter(wish_product::Column::WishCount.gt(0))
                .exec(&txn)
                .await?;
        }

        let wish_count = current_wish_count(&txn, product_id)
            .await?
            .unwrap_or_default();
        txn.commit().await?;

        Ok(if deleted > 0 {
            PetitionRemove::Removed { wish_count }
        } else {
            PetitionRemove::Absent { wish_count }
        })
    }
}
