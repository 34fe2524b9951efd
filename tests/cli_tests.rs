//! CLI command tests
//!
//! Legacy CSV import/export against a temporary database, plus
//! configuration file generation.

use std::fs;
use std::sync::{Arc, Once};

use tempfile::TempDir;

use bimarket::config::{StaticConfig, init_config};
use bimarket::interfaces::cli::commands::{config_generate, export_csv, import_csv};
use bimarket::storage::{SeaOrmStorage, WishStatus};
use bimarket::utils::csv_handler::{CATEGORIES_FILE, FILE_UPLOADS_FILE, WISH_PRODUCTS_FILE};

static INIT: Once = Once::new();

fn init_test_config() {
    INIT.call_once(|| {
        init_config();
    });
}

async fn create_storage(dir: &TempDir) -> Arc<SeaOrmStorage> {
    init_test_config();
    let db_url = format!("sqlite://{}?mode=rwc", dir.path().join("cli.db").display());
    Arc::new(
        SeaOrmStorage::new(&db_url, "sqlite")
            .await
            .expect("Failed to create storage"),
    )
}

/// 写一份旧版数据目录
fn write_legacy_dir(dir: &std::path::Path) {
    fs::create_dir_all(dir).expect("create legacy dir");
    fs::write(
        dir.join(WISH_PRODUCTS_FILE),
        "id,name,description,category_id,region,expected_price,currency,wish_count,like_count,additional_info,image_urls,status,user_id,created_at,updated_at\n\
         w1,抹茶餅乾,京都車站限定的抹茶餅乾,4,日本,450,TWD,3,1,,a.png;b.png,processing,,2024-03-01T10:00:00Z,2024-03-02T10:00:00Z\n\
         w2,露營椅,輕量化的折疊露營椅,6,美國,,,,,需要兩張,,pending,guest_abc,2024-03-05T08:30:00Z,\n\
         bad,壞資料,這一行的日期無法解析,1,台灣,1,TWD,0,0,,,pending,,not-a-date,\n",
    )
    .expect("write products");
    fs::write(
        dir.join(CATEGORIES_FILE),
        "id,name,description,is_active,sort_order,created_at,updated_at\n\
         4,食品飲料,零食與飲品,true,4,2024-01-01T00:00:00Z,\n\
         10,收藏品,,false,,2024-01-01T00:00:00Z,\n",
    )
    .expect("write categories");
    fs::write(
        dir.join(FILE_UPLOADS_FILE),
        "id,original_filename,stored_filename,file_path,file_size,mime_type,related_table,related_id,created_at\n\
         f1,a.png,a.png,uploads/wish-products/a.png,1024,image/png,wish_products,w1,2024-03-01T10:00:00Z\n",
    )
    .expect("write uploads");
}

#[tokio::test]
async fn test_import_legacy_csv() {
    let dir = TempDir::new().expect("temp dir");
    let storage = create_storage(&dir).await;
    let legacy = dir.path().join("legacy");
    write_legacy_dir(&legacy);

    import_csv(storage.clone(), legacy.display().to_string())
        .await
        .expect("import should succeed");

    let w1 = storage
        .get_wish_product("w1")
        .await
        .expect("get")
        .expect("w1 imported");
    assert_eq!(w1.image_urls, vec!["a.png".to_string(), "b.png".to_string()]);
    assert_eq!(w1.wish_count, 3);
    assert_eq!(w1.status, WishStatus::Processing);

    let w2 = storage
        .get_wish_product("w2")
        .await
        .expect("get")
        .expect("w2 imported");
    assert_eq!(w2.currency, "TWD");
    assert_eq!(w2.expected_price, 0.0);
    assert_eq!(w2.user_id.as_deref(), Some("guest_abc"));

    // 无法解析的行被跳过
    assert!(storage.get_wish_product("bad").await.expect("get").is_none());

    let categories = storage.list_all_categories().await.expect("categories");
    assert_eq!(categories.len(), 10);
    let collectibles = categories
        .iter()
        .find(|c| c.id == 10)
        .expect("category 10 imported");
    assert!(!collectibles.is_active);
    assert_eq!(collectibles.sort_order, 10);

    assert_eq!(storage.list_uploads_for("w1").await.expect("uploads").len(), 1);
}

#[tokio::test]
async fn test_import_missing_directory_fails() {
    let dir = TempDir::new().expect("temp dir");
    let storage = create_storage(&dir).await;

    let result = import_csv(storage, dir.path().join("nope").display().to_string()).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_export_writes_files_and_backups() {
    let dir = TempDir::new().expect("temp dir");
    let storage = create_storage(&dir).await;
    let legacy = dir.path().join("legacy");
    write_legacy_dir(&legacy);
    import_csv(storage.clone(), legacy.display().to_string())
        .await
        .expect("import");

    // 导出回同一个目录，原文件先被备份
    export_csv(storage.clone(), legacy.display().to_string())
        .await
        .expect("export");

    let backups: Vec<_> = fs::read_dir(legacy.join("backups"))
        .expect("backups dir")
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(backups.len(), 3);
    assert!(backups.iter().any(|name| name.ends_with(WISH_PRODUCTS_FILE)));

    let exported = fs::read_to_string(legacy.join(WISH_PRODUCTS_FILE)).expect("read export");
    assert!(exported.contains("a.png;b.png"));
    assert!(!exported.contains("bad,"));

    let categories = fs::read_to_string(legacy.join(CATEGORIES_FILE)).expect("read categories");
    // 9 个种子分类 + 1 个导入
    assert_eq!(categories.lines().count(), 1 + 10);
}

#[tokio::test]
async fn test_config_generate_writes_sample() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("config.example.toml");

    config_generate(Some(path.display().to_string()), true)
        .await
        .expect("generate");

    let content = fs::read_to_string(&path).expect("read config");
    let parsed: StaticConfig = toml::from_str(&content).expect("sample parses");
    assert_eq!(parsed.api.guest_cookie_name, "bm_uid");
    assert_eq!(parsed.upload.max_images, 5);
}
