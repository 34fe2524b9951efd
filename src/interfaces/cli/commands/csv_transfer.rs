//! Legacy CSV import and export commands

use colored::Colorize;
use std::sync::Arc;

use crate::interfaces::cli::CliError;
use crate::storage::SeaOrmStorage;
use crate::utils::csv_handler::{self, LegacyData};

/// 导入旧版 CSV 数据目录
///
/// 顺序：分类 -> 许愿商品 -> 上传记录，已存在的 id 会被覆盖。
pub async fn import_csv(storage: Arc<SeaOrmStorage>, data_dir: String) -> Result<(), CliError> {
    println!("{} {}", "Importing legacy data from".yellow(), data_dir.blue());

    let data = csv_handler::load_legacy_dir(&data_dir)?;
    if data.categories.is_empty() && data.products.is_empty() && data.uploads.is_empty() {
        println!("{} No legacy data found", "ℹ".bold().blue());
        return Ok(());
    }

    let categories = storage.batch_upsert_categories(&data.categories).await?;
    let products = storage.batch_upsert_wish_products(&data.products).await?;
    let uploads = storage.batch_upsert_file_uploads(&data.uploads).await?;

    println!(
        "{} Imported {} categories, {} wish products, {} file uploads",
        "✓".bold().green(),
        categories.to_string().cyan(),
        products.to_string().cyan(),
        uploads.to_string().cyan()
    );
    Ok(())
}

/// 导出数据库到旧版 CSV 文件，写入前备份已有文件
pub async fn export_csv(storage: Arc<SeaOrmStorage>, data_dir: String) -> Result<(), CliError> {
    let data = LegacyData {
        products: storage.load_all_wish_products().await?,
        categories: storage.list_all_categories().await?,
        uploads: storage.load_all_file_uploads().await?,
    };

    csv_handler::export_legacy_dir(&data_dir, &data)?;

    println!(
        "{} Exported {} categories, {} wish products, {} file uploads to {}",
        "✓".bold().green(),
        data.categories.len().to_string().cyan(),
        data.products.len().to_string().cyan(),
        data.uploads.len().to_string().cyan(),
        data_dir.blue()
    );
    Ok(())
}
