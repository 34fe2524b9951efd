//! Storage backend tests
//!
//! Tests for SeaOrmStorage using temporary SQLite databases.

use chrono::{Duration, Utc};
use std::sync::Once;
use tempfile::TempDir;

use bimarket::config::init_config;
use bimarket::storage::backend::{infer_backend_from_url, retry::RetryConfig};
use bimarket::storage::{
    FileUpload, PetitionAdd, PetitionRemove, ProductCategory, SeaOrmStorage, SortOrder,
    WishProduct, WishProductFilter, WishProductSort, WishSortField, WishStatus,
};

// 确保 config 只初始化一次
static INIT: Once = Once::new();

fn init_test_config() {
    INIT.call_once(|| {
        init_config();
    });
}

/// 创建测试用的 WishProduct
fn create_test_product(id: &str, category_id: i32, price: f64) -> WishProduct {
    let now = Utc::now();
    WishProduct {
        id: id.to_string(),
        name: format!("Product {}", id),
        description: "A description long enough".to_string(),
        category_id,
        region: "Tokyo".to_string(),
        expected_price: price,
        currency: "JPY".to_string(),
        wish_count: 0,
        like_count: 0,
        additional_info: Some("boxed".to_string()),
        image_urls: vec!["a.png".to_string(), "b.webp".to_string()],
        status: WishStatus::Pending,
        user_id: Some("guest_abc".to_string()),
        created_at: now,
        updated_at: now,
    }
}

fn create_test_upload(id: &str, related_id: Option<&str>) -> FileUpload {
    FileUpload {
        id: id.to_string(),
        original_filename: "photo.png".to_string(),
        stored_filename: format!("{}.png", id),
        file_path: format!("uploads/wish-products/{}.png", id),
        file_size: 12,
        mime_type: "image/png".to_string(),
        related_table: related_id.map(|_| "wish_products".to_string()),
        related_id: related_id.map(String::from),
        created_at: Utc::now(),
    }
}

/// 创建临时 SQLite 数据库的存储实例
async fn create_temp_storage() -> (SeaOrmStorage, TempDir) {
    init_test_config();

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.db");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

    let storage = SeaOrmStorage::new(&db_url, "sqlite")
        .await
        .expect("Failed to create storage");

    (storage, temp_dir)
}

#[test]
fn test_infer_backend_from_url() {
    assert_eq!(infer_backend_from_url("sqlite://a.db").ok().as_deref(), Some("sqlite"));
    assert_eq!(infer_backend_from_url("market.db").ok().as_deref(), Some("sqlite"));
    assert_eq!(
        infer_backend_from_url("postgres://u:p@localhost/db").ok().as_deref(),
        Some("postgres")
    );
    assert_eq!(
        infer_backend_from_url("mariadb://localhost/db").ok().as_deref(),
        Some("mysql")
    );
    assert!(infer_backend_from_url("redis://localhost").is_err());
}

#[test]
fn test_retry_config_defaults() {
    let config = RetryConfig::default();
    assert!(config.max_retries > 0);
    assert!(config.base_delay_ms <= config.max_delay_ms);
}

#[tokio::test]
async fn test_seeded_categories() {
    let (storage, _dir) = create_temp_storage().await;

    let categories = storage.list_active_categories().await.expect("list");
    assert_eq!(categories.len(), 9);
    let names: Vec<&str> = categories.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names[0], "電子產品");
    assert_eq!(names[8], "其他");
    assert!(categories.windows(2).all(|w| w[0].sort_order <= w[1].sort_order));
}

#[tokio::test]
async fn test_upsert_category_and_inactive_hidden() {
    let (storage, _dir) = create_temp_storage().await;

    let mut category: ProductCategory = storage
        .get_category(2)
        .await
        .expect("get")
        .expect("seeded category");
    category.is_active = false;
    storage.upsert_category(&category).await.expect("upsert");

    let active = storage.list_active_categories().await.expect("active");
    assert!(active.iter().all(|c| c.id != 2));
    let all = storage.list_all_categories().await.expect("all");
    assert_eq!(all.len(), 9);

    let now = Utc::now();
    storage
        .upsert_category(&ProductCategory {
            id: 42,
            name: "收藏品".to_string(),
            description: None,
            is_active: true,
            sort_order: 42,
            created_at: now,
            updated_at: now,
        })
        .await
        .expect("insert new category");
    assert_eq!(storage.list_all_categories().await.expect("all").len(), 10);
}

#[tokio::test]
async fn test_insert_and_get_wish_product_with_uploads() {
    let (storage, _dir) = create_temp_storage().await;

    let product = create_test_product("p1", 1, 1200.5);
    let uploads = vec![create_test_upload("u1", Some("p1"))];
    storage
        .insert_wish_product(&product, &uploads)
        .await
        .expect("insert");

    let loaded = storage
        .get_wish_product("p1")
        .await
        .expect("get")
        .expect("product exists");
    assert_eq!(loaded.name, product.name);
    assert_eq!(loaded.image_urls, product.image_urls);
    assert_eq!(loaded.additional_info.as_deref(), Some("boxed"));
    assert_eq!(loaded.status, WishStatus::Pending);

    let linked = storage.list_uploads_for("p1").await.expect("uploads");
    assert_eq!(linked.len(), 1);
    assert_eq!(linked[0].stored_filename, "u1.png");

    assert!(storage.get_wish_product("missing").await.expect("get").is_none());
}

#[tokio::test]
async fn test_query_filters_sort_and_pagination() {
    let (storage, _dir) = create_temp_storage().await;

    for (i, price) in [300.0, 100.0, 200.0].iter().enumerate() {
        let mut product = create_test_product(&format!("p{}", i), 1, *price);
        product.created_at = Utc::now() - Duration::days(i as i64);
        storage.insert_wish_product(&product, &[]).await.expect("insert");
    }
    let mut other = create_test_product("other", 5, 50.0);
    other.status = WishStatus::Cancelled;
    storage.insert_wish_product(&other, &[]).await.expect("insert");

    let sort = WishProductSort {
        field: WishSortField::ExpectedPrice,
        order: SortOrder::Asc,
    };
    let filter = WishProductFilter {
        category_id: Some(1),
        ..Default::default()
    };
    let (items, total) = storage
        .query_wish_products(&filter, sort, 1, 2)
        .await
        .expect("query");
    assert_eq!(total, 3);
    let prices: Vec<f64> = items.iter().map(|p| p.expected_price).collect();
    assert_eq!(prices, vec![100.0, 200.0]);

    let (page2, _) = storage
        .query_wish_products(&filter, sort, 2, 2)
        .await
        .expect("query page 2");
    assert_eq!(page2.len(), 1);
    assert_eq!(page2[0].expected_price, 300.0);

    let public = WishProductFilter {
        exclude_status: Some(WishStatus::Cancelled),
        min_price: Some(150.0),
        ..Default::default()
    };
    let (_, total) = storage
        .query_wish_products(&public, WishProductSort::default(), 1, 10)
        .await
        .expect("query");
    assert_eq!(total, 2);

    let recent = WishProductFilter {
        created_after: Some(Utc::now() - Duration::hours(12)),
        ..Default::default()
    };
    let (items, _) = storage
        .query_wish_products(&recent, WishProductSort::default(), 1, 10)
        .await
        .expect("query");
    assert!(items.iter().all(|p| p.id == "p0" || p.id == "other"));

    let cancelled = WishProductFilter {
        statuses: vec![WishStatus::Cancelled],
        ..Default::default()
    };
    let (items, total) = storage
        .query_wish_products(&cancelled, WishProductSort::default(), 1, 10)
        .await
        .expect("query");
    assert_eq!(total, 1);
    assert_eq!(items[0].id, "other");
}

#[tokio::test]
async fn test_count_cache_invalidated_on_insert() {
    let (storage, _dir) = create_temp_storage().await;
    let filter = WishProductFilter::default();

    let (_, before) = storage
        .query_wish_products(&filter, WishProductSort::default(), 1, 10)
        .await
        .expect("query");
    assert_eq!(before, 0);

    storage
        .insert_wish_product(&create_test_product("fresh", 1, 1.0), &[])
        .await
        .expect("insert");

    let (_, after) = storage
        .query_wish_products(&filter, WishProductSort::default(), 1, 10)
        .await
        .expect("query");
    assert_eq!(after, 1);
    assert_eq!(storage.count_wish_products().await.expect("count"), 1);
}

#[tokio::test]
async fn test_update_status_and_like() {
    let (storage, _dir) = create_temp_storage().await;
    storage
        .insert_wish_product(&create_test_product("p1", 1, 1.0), &[])
        .await
        .expect("insert");

    let updated = storage
        .update_wish_status("p1", WishStatus::Completed)
        .await
        .expect("update")
        .expect("product exists");
    assert_eq!(updated.status, WishStatus::Completed);
    assert!(updated.updated_at >= updated.created_at);

    assert_eq!(storage.increment_like("p1").await.expect("like"), Some(1));
    assert_eq!(storage.increment_like("p1").await.expect("like"), Some(2));
    assert_eq!(storage.increment_like("nope").await.expect("like"), None);
    assert!(
        storage
            .update_wish_status("nope", WishStatus::Completed)
            .await
            .expect("update")
            .is_none()
    );
}

#[tokio::test]
async fn test_petitions_are_unique_per_guest() {
    let (storage, _dir) = create_temp_storage().await;
    storage
        .insert_wish_product(&create_test_product("p1", 1, 1.0), &[])
        .await
        .expect("insert");

    assert_eq!(
        storage.add_petition("p1", "guest_a").await.expect("add"),
        PetitionAdd::Added { wish_count: 1 }
    );
    assert_eq!(
        storage.add_petition("p1", "guest_a").await.expect("add"),
        PetitionAdd::Already { wish_count: 1 }
    );
    assert_eq!(
        storage.add_petition("p1", "guest_b").await.expect("add"),
        PetitionAdd::Added { wish_count: 2 }
    );
    assert!(storage.has_petition("p1", "guest_a").await.expect("has"));
    assert!(!storage.has_petition("p1", "guest_c").await.expect("has"));

    assert_eq!(
        storage.remove_petition("p1", "guest_a").await.expect("remove"),
        PetitionRemove::Removed { wish_count: 1 }
    );
    assert_eq!(
        storage.remove_petition("p1", "guest_a").await.expect("remove"),
        PetitionRemove::Absent { wish_count: 1 }
    );
    assert_eq!(
        storage.add_petition("missing", "guest_a").await.expect("add"),
        PetitionAdd::ProductNotFound
    );
    assert_eq!(
        storage.remove_petition("missing", "guest_a").await.expect("remove"),
        PetitionRemove::ProductNotFound
    );

    let product = storage
        .get_wish_product("p1")
        .await
        .expect("get")
        .expect("exists");
    assert_eq!(product.wish_count, 1);
}

#[tokio::test]
async fn test_delete_removes_petitions_and_uploads() {
    let (storage, _dir) = create_temp_storage().await;
    storage
        .insert_wish_product(
            &create_test_product("p1", 1, 1.0),
            &[create_test_upload("u1", Some("p1")), create_test_upload("u2", Some("p1"))],
        )
        .await
        .expect("insert");
    storage
        .insert_file_upload(&create_test_upload("loose", None))
        .await
        .expect("insert upload");
    storage.add_petition("p1", "guest_a").await.expect("petition");

    let removed = storage
        .delete_wish_product("p1")
        .await
        .expect("delete")
        .expect("product existed");
    assert_eq!(removed.len(), 2);

    assert!(storage.get_wish_product("p1").await.expect("get").is_none());
    assert!(!storage.has_petition("p1", "guest_a").await.expect("has"));
    let remaining = storage.load_all_file_uploads().await.expect("uploads");
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, "loose");

    assert!(storage.delete_wish_product("p1").await.expect("delete").is_none());
}

#[tokio::test]
async fn test_batch_upserts_overwrite_existing_rows() {
    let (storage, _dir) = create_temp_storage().await;

    let mut products: Vec<WishProduct> = (0..3)
        .map(|i| create_test_product(&format!("b{}", i), 2, i as f64))
        .collect();
    assert_eq!(
        storage.batch_upsert_wish_products(&products).await.expect("batch"),
        3
    );

    products[0].wish_count = 7;
    products[0].status = WishStatus::Processing;
    storage
        .batch_upsert_wish_products(&products[..1])
        .await
        .expect("batch update");

    let loaded = storage
        .get_wish_product("b0")
        .await
        .expect("get")
        .expect("exists");
    assert_eq!(loaded.wish_count, 7);
    assert_eq!(loaded.status, WishStatus::Processing);
    assert_eq!(storage.load_all_wish_products().await.expect("all").len(), 3);

    let uploads = vec![create_test_upload("x1", Some("b0")), create_test_upload("x2", None)];
    assert_eq!(
        storage.batch_upsert_file_uploads(&uploads).await.expect("uploads"),
        2
    );
    assert_eq!(storage.batch_upsert_file_uploads(&[]).await.expect("empty"), 0);
}
