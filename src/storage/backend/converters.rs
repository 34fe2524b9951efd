use std::str::FromStr;

use sea_orm::ActiveValue::{NotSet, Set};
use tracing::warn;

use crate::storage::models::{FileUpload, ProductCategory, WishProduct, WishStatus};
use migration::entities::{file_upload, product_category, wish_product};

/// 图片文件名分隔符（与旧 CSV 数据一致）
pub const IMAGE_URL_SEPARATOR: char = ';';

/// `a.png;b.png` → `["a.png", "b.png"]`，忽略空段
pub fn split_image_urls(raw: &str) -> Vec<String> {
    raw.split(IMAGE_URL_SEPARATOR)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

pub fn join_image_urls(urls: &[String]) -> String {
    urls.join(&IMAGE_URL_SEPARATOR.to_string())
}

fn parse_status(raw: &str, id: &str) -> WishStatus {
    WishStatus::from_str(raw).unwrap_or_else(|_| {
        warn!("Unknown wish status '{}' on product {}, treating as pending", raw, id);
        WishStatus::Pending
    })
}

pub fn model_to_wish_product(model: wish_product::Model) -> WishProduct {
    let status = parse_status(&model.status, &model.id);
    WishProduct {
        status,
        image_urls: split_image_urls(&model.image_urls),
        id: model.id,
        name: model.name,
        description: model.description,
        category_id: model.category_id,
        region: model.region,
        expected_price: model.expected_price,
        currency: model.currency,
        wish_count: model.wish_count.max(0),
        like_count: model.like_count.max(0),
        additional_info: model.additional_info,
        user_id: model.user_id,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

/// 转换为 ActiveModel；`is_new = false` 时计数器保持数据库中的值
pub fn wish_product_to_active_model(product: &WishProduct, is_new: bool) -> wish_product::ActiveModel {
    wish_product::ActiveModel {
        id: Set(product.id.clone()),
        name: Set(product.name.clone()),
        description: Set(product.description.clone()),
        category_id: Set(product.category_id),
        region: Set(product.region.clone()),
        expected_price: Set(product.expected_price),
        currency: Set(product.currency.clone()),
        wish_count: if is_new {
            Set(product.wish_count.max(0))
        } else {
            NotSet
        },
        like_count: if is_new {
            Set(product.like_count.max(0))
        } else {
            NotSet
        },
        additional_info: Set(product.additional_info.clone()),
        image_urls: Set(join_image_urls(&product.image_urls)),
        status: Set(product.status.to_string()),
        user_id: Set(product.user_id.clone()),
        created_at: if is_new {
            Set(product.created_at)
        } else {
            NotSet
        },
        updated_at: Set(product.updated_at),
    }
}

pub fn model_to_category(model: product_category::Model) -> ProductCategory {
    ProductCategory {
        id: model.id,
        name: model.name,
        description: model.description,
        is_active: model.is_active,
        sort_order: model.sort_order,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

pub fn category_to_active_model(category: &ProductCategory) -> product_category::ActiveModel {
    product_category::ActiveModel {
        id: Set(category.id),
        name: Set(category.name.clone()),
        description: Set(category.description.clone()),
        is_active: Set(category.is_active),
        sort_order: Set(category.sort_order),
        created_at: Set(category.created_at),
        updated_at: Set(category.updated_at),
    }
}

pub fn model_to_file_upload(model: file_upload::Model) -> FileUpload {
    FileUpload {
        id: model.id,
        original_filename: model.original_filename,
        stored_filename: model.stored_filename,
        file_path: model.file_path,
        file_size: model.file_size,
        mime_type: model.mime_type,
        related_table: model.related_table,
        related_id: model.related_id,
        created_at: model.created_at,
    }
}

pub fn file_upload_to_active_model(upload: &FileUpload) -> file_upload::ActiveModel {
    file_upload::ActiveModel {
        id: Set(upload.id.clone()),
        original_filename: Set(upload.original_filename.clone()),
        stored_filename: Set(upload.stored_filename.clone()),
        file_path: Set(upload.file_path.clone()),
        file_size: Set(upload.file_size),
        mime_type: Set(upload.mime_type.clone()),
        related_table: Set(upload.related_table.clone()),
        related_id: Set(upload.related_id.clone()),
        created_at: Set(upload.created_at),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::ActiveValue;

    fn create_test_model() -> wish_product::Model {
        let now = Utc::now();
        wish_product::Model {
            id: "5b0c".to_string(),
            name: "Pocky 限定口味".to_string(),
            description: "北海道限定的哈密瓜口味 Pocky".to_string(),
            category_id: 4,
            region: "日本北海道".to_string(),
            expected_price: 150.0,
            currency: "TWD".to_string(),
            wish_count: 12,
            like_count: -3,
            additional_info: None,
            image_urls: "a.webp;;b.png ".to_string(),
            status: "processing".to_string(),
            user_id: Some("guest_abc".to_string()),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_split_and_join_image_urls() {
        assert_eq!(split_image_urls("a.png;b.png"), vec!["a.png", "b.png"]);
        assert!(split_image_urls("").is_empty());
        assert!(split_image_urls(" ; ").is_empty());
        assert_eq!(
            join_image_urls(&["x.jpg".to_string(), "y.jpg".to_string()]),
            "x.jpg;y.jpg"
        );
    }

    #[test]
    fn test_model_to_wish_product() {
        let product = model_to_wish_product(create_test_model());
        assert_eq!(product.status, WishStatus::Processing);
        assert_eq!(product.image_urls, vec!["a.webp", "b.png"]);
        assert_eq!(product.wish_count, 12);
        // 负数计数被归零
        assert_eq!(product.like_count, 0);
    }

    #[test]
    fn test_unknown_status_falls_back_to_pending() {
        let mut model = create_test_model();
        model.status = "archived".to_string();
        assert_eq!(model_to_wish_product(model).status, WishStatus::Pending);
    }

    #[test]
    fn test_active_model_update_keeps_counters() {
        let product = model_to_wish_product(create_test_model());

        let new_model = wish_product_to_active_model(&product, true);
        assert_eq!(new_model.wish_count, ActiveValue::Set(12));
        assert_eq!(new_model.image_urls, ActiveValue::Set("a.webp;b.png".to_string()));

        let update_model = wish_product_to_active_model(&product, false);
        assert!(matches!(update_model.wish_count, ActiveValue::NotSet));
        assert!(matches!(update_model.like_count, ActiveValue::NotSet));
        assert!(matches!(update_model.created_at, ActiveValue::NotSet));
        assert_eq!(
            update_model.status,
            ActiveValue::Set("processing".to_string())
        );
    }
}
