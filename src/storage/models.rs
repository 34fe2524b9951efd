use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// 许愿商品审核状态
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    EnumString,
    AsRefStr,
    Display,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum WishStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Cancelled,
}

/// 许愿商品
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishProduct {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category_id: i32,
    pub region: String,
    pub expected_price: f64,
    pub currency: String,
    pub wish_count: i64,
    pub like_count: i64,
    pub additional_info: Option<String>,
    pub image_urls: Vec<String>,
    pub status: WishStatus,
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 商品分类
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCategory {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 上传文件记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileUpload {
    pub id: String,
    pub original_filename: String,
    pub stored_filename: String,
    pub file_path: String,
    pub file_size: i64,
    pub mime_type: String,
    pub related_table: Option<String>,
    pub related_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// 新增连署的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PetitionAdd {
    /// 商品不存在
    ProductNotFound,
    /// 已连署过，计数不变
    Already { wish_count: i64 },
    Added { wish_count: i64 },
}

/// 取消连署的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PetitionRemove {
    ProductNotFound,
    /// 原本就没有连署，计数不变
    Absent { wish_count: i64 },
    Removed { wish_count: i64 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_wish_status_parse_and_display() {
        assert_eq!(WishStatus::from_str("pending").ok(), Some(WishStatus::Pending));
        assert_eq!(
            WishStatus::from_str("Cancelled").ok(),
            Some(WishStatus::Cancelled)
        );
        assert!(WishStatus::from_str("archived").is_err());
        assert_eq!(WishStatus::Processing.to_string(), "processing");
        assert_eq!(WishStatus::Completed.as_ref(), "completed");
    }

    #[test]
    fn test_wish_status_serde() {
        let json = serde_json::to_string(&WishStatus::Cancelled).expect("serialize");
        assert_eq!(json, "\"cancelled\"");
        let status: WishStatus = serde_json::from_str("\"processing\"").expect("deserialize");
        assert_eq!(status, WishStatus::Processing);
    }

    #[test]
    fn test_wish_product_serializes_camel_case() {
        let now = Utc::now();
        let product = WishProduct {
            id: "p1".into(),
            name: "Switch".into(),
            description: "想要一台日版主機".into(),
            category_id: 1,
            region: "日本".into(),
            expected_price: 9000.0,
            currency: "TWD".into(),
            wish_count: 3,
            like_count: 0,
            additional_info: None,
            image_urls: vec!["a.png".into()],
            status: WishStatus::Pending,
            user_id: None,
            created_at: now,
            updated_at: now,
        };
        let value = serde_json::to_value(&product).expect("serialize");
        assert_eq!(value["categoryId"], 1);
        assert_eq!(value["wishCount"], 3);
        assert_eq!(value["imageUrls"][0], "a.png");
        assert_eq!(value["status"], "pending");
    }
}
