//! Petition service
//!
//! 连署以访客 ID 区分，重复连署或重复取消都是幂等的。

use std::sync::Arc;

use serde::Serialize;

use crate::errors::{BiMarketError, Result};
use crate::storage::{PetitionAdd, PetitionRemove, SeaOrmStorage};

/// 连署操作结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PetitionOutcome {
    pub petitioned: bool,
    /// 状态没有变化（已连署再连署、未连署再取消）
    pub idempotent: bool,
    pub wish_count: i64,
}

pub struct PetitionService {
    storage: Arc<SeaOrmStorage>,
}

impl PetitionService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    pub async fn add(&self, product_id: &str, user_id: &str) -> Result<PetitionOutcome> {
        match self.storage.add_petition(product_id, user_id).await? {
            PetitionAdd::ProductNotFound => Err(not_found(product_id)),
            PetitionAdd::Already { wish_count } => Ok(PetitionOutcome {
                petitioned: true,
                idempotent: true,
                wish_count,
            }),
            PetitionAdd::Added { wish_count } => Ok(PetitionOutcome {
                petitioned: true,
                idempotent: false,
                wish_count,
            }),
        }
    }

    pub async fn remove(&self, product_id: &str, user_id: &str) -> Result<PetitionOutcome> {
        match self.storage.remove_petition(product_id, user_id).await? {
            PetitionRemove::ProductNotFound => Err(not_found(product_id)),
            PetitionRemove::Absent { wish_count } => Ok(PetitionOutcome {
                petitioned: false,
                idempotent: true,
                wish_count,
            }),
            PetitionRemove::Removed { wish_count } => Ok(PetitionOutcome {
                petitioned: false,
                idempotent: false,
                wish_count,
            }),
        }
    }

    /// 当前访客是否已连署；没有访客 ID 时视为未连署
    pub async fn status(&self, product_id: &str, user_id: Option<&str>) -> Result<bool> {
        if self.storage.get_wish_product(product_id).await?.is_none() {
            return Err(not_found(product_id));
        }
        match user_id {
            Some(uid) => self.storage.has_petition(product_id, uid).await,
            None => Ok(false),
        }
    }
}

fn not_found(product_id: &str) -> BiMarketError {
    BiMarketError::product_not_found(format!("找不到商品 {}", product_id))
}
