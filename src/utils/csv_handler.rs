//! 旧版 CSV 数据文件读写
//!
//! 三个文件 `wish-products.csv`、`product-categories.csv`、`file-uploads.csv`
//! 使用 snake_case 表头，图片文件名以 `;` 连接，布尔值为 `true/false`，
//! 日期为 RFC3339。写入前会把已有文件复制到 `<data_dir>/backups/`。

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use csv::{ReaderBuilder, WriterBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::{BiMarketError, Result};
use crate::storage::backend::{join_image_urls, split_image_urls};
use crate::storage::{FileUpload, ProductCategory, WishProduct, WishStatus};

pub const WISH_PRODUCTS_FILE: &str = "wish-products.csv";
pub const CATEGORIES_FILE: &str = "product-categories.csv";
pub const FILE_UPLOADS_FILE: &str = "file-uploads.csv";

/// wish-products.csv 行
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WishProductRow {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category_id: i32,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub expected_price: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub wish_count: Option<i64>,
    #[serde(default)]
    pub like_count: Option<i64>,
    #[serde(default)]
    pub additional_info: Option<String>,
    #[serde(default)]
    pub image_urls: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub created_at: String,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// product-categories.csv 行
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRow {
    pub id: i32,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub sort_order: Option<i32>,
    pub created_at: String,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// file-uploads.csv 行
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileUploadRow {
    pub id: String,
    pub original_filename: String,
    pub stored_filename: String,
    pub file_path: String,
    #[serde(default)]
    pub file_size: i64,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub related_table: Option<String>,
    #[serde(default)]
    pub related_id: Option<String>,
    pub created_at: String,
}

fn default_true() -> bool {
    true
}

fn parse_timestamp(raw: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| BiMarketError::date_parse(format!("{} '{}' 无法解析: {}", field, raw, e)))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

impl From<&WishProduct> for WishProductRow {
    fn from(p: &WishProduct) -> Self {
        Self {
            id: p.id.clone(),
            name: p.name.clone(),
            description: p.description.clone(),
            category_id: p.category_id,
            region: p.region.clone(),
            expected_price: Some(p.expected_price),
            currency: Some(p.currency.clone()),
            wish_count: Some(p.wish_count),
            like_count: Some(p.like_count),
            additional_info: p.additional_info.clone(),
            image_urls: join_image_urls(&p.image_urls),
            status: p.status.to_string(),
            user_id: p.user_id.clone(),
            created_at: p.created_at.to_rfc3339(),
            updated_at: Some(p.updated_at.to_rfc3339()),
        }
    }
}

impl TryFrom<WishProductRow> for WishProduct {
    type Error = BiMarketError;

    fn try_from(row: WishProductRow) -> Result<Self> {
        if row.id.trim().is_empty() {
            return Err(BiMarketError::csv_parse("id 为空"));
        }
        let created_at = parse_timestamp(&row.created_at, "created_at")?;
        let updated_at = match non_empty(row.updated_at) {
            Some(raw) => parse_timestamp(&raw, "updated_at")?,
            None => created_at,
        };
        let status = if row.status.trim().is_empty() {
            WishStatus::Pending
        } else {
            WishStatus::from_str(row.status.trim())
                .map_err(|_| BiMarketError::csv_parse(format!("未知状态 '{}'", row.status)))?
        };
        Ok(WishProduct {
            id: row.id,
            name: row.name,
            description: row.description,
            category_id: row.category_id,
            region: row.region,
            expected_price: row.expected_price.unwrap_or(0.0).max(0.0),
            currency: non_empty(row.currency)
                .map(|c| c.to_ascii_uppercase())
                .unwrap_or_else(|| "TWD".to_string()),
            wish_count: row.wish_count.unwrap_or(0).max(0),
            like_count: row.like_count.unwrap_or(0).max(0),
            additional_info: non_empty(row.additional_info),
            image_urls: split_image_urls(&row.image_urls),
            status,
            user_id: non_empty(row.user_id),
            created_at,
            updated_at,
        })
    }
}

impl From<&ProductCategory> for CategoryRow {
    fn from(c: &ProductCategory) -> Self {
        Self {
            id: c.id,
            name: c.name.clone(),
            description: c.description.clone(),
            is_active: c.is_active,
            sort_order: Some(c.sort_order),
            created_at: c.created_at.to_rfc3339(),
            updated_at: Some(c.updated_at.to_rfc3339()),
        }
    }
}

impl TryFrom<CategoryRow> for ProductCategory {
    type Error = BiMarketError;

    fn try_from(row: CategoryRow) -> Result<Self> {
        let created_at = parse_timestamp(&row.created_at, "created_at")?;
        let updated_at = match non_empty(row.updated_at) {
            Some(raw) => parse_timestamp(&raw, "updated_at")?,
            None => created_at,
        };
        Ok(ProductCategory {
            id: row.id,
            name: row.name,
            description: non_empty(row.description),
            is_active: row.is_active,
            sort_order: row.sort_order.unwrap_or(row.id),
            created_at,
            updated_at,
        })
    }
}

impl From<&FileUpload> for FileUploadRow {
    fn from(u: &FileUpload) -> Self {
        Self {
            id: u.id.clone(),
            original_filename: u.original_filename.clone(),
            stored_filename: u.stored_filename.clone(),
            file_path: u.file_path.clone(),
            file_size: u.file_size,
            mime_type: u.mime_type.clone(),
            related_table: u.related_table.clone(),
            related_id: u.related_id.clone(),
            created_at: u.created_at.to_rfc3339(),
        }
    }
}

impl TryFrom<FileUploadRow> for FileUpload {
    type Error = BiMarketError;

    fn try_from(row: FileUploadRow) -> Result<Self> {
        Ok(FileUpload {
            created_at: parse_timestamp(&row.created_at, "created_at")?,
            id: row.id,
            original_filename: row.original_filename,
            stored_filename: row.stored_filename,
            file_path: row.file_path,
            file_size: row.file_size.max(0),
            mime_type: row.mime_type,
            related_table: non_empty(row.related_table),
            related_id: non_empty(row.related_id),
        })
    }
}

/// 读取 CSV 并逐行转换；部分行失败时记录警告，全部失败才报错
fn read_rows<R, T>(path: &Path) -> Result<Vec<T>>
where
    R: DeserializeOwned,
    T: TryFrom<R, Error = BiMarketError>,
{
    let file = File::open(path).map_err(|e| {
        BiMarketError::file_read(format!("无法打开 {}: {}", path.display(), e))
    })?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(BufReader::new(file));

    let mut items = Vec::new();
    let mut errors = Vec::new();

    for (row_idx, result) in reader.deserialize::<R>().enumerate() {
        let row_num = row_idx + 2; // 1-based，跳过表头
        match result.map_err(BiMarketError::from).and_then(T::try_from) {
            Ok(item) => items.push(item),
            Err(e) => errors.push(format!("Row {}: {}", row_num, e.message())),
        }
    }

    if !errors.is_empty() && items.is_empty() {
        return Err(BiMarketError::csv_parse(format!(
            "{} 解析失败:\n{}",
            path.display(),
            errors.join("\n")
        )));
    }
    if !errors.is_empty() {
        warn!("CSV import warnings for {}:\n{}", path.display(), errors.join("\n"));
    }

    Ok(items)
}

fn write_rows<W, R, I>(writer: W, rows: I) -> Result<()>
where
    W: Write,
    R: Serialize,
    I: IntoIterator<Item = R>,
{
    let mut csv_writer = WriterBuilder::new().from_writer(writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer
        .flush()
        .map_err(|e| BiMarketError::file_write(format!("写入 CSV 失败: {}", e)))
}

pub fn read_wish_products<P: AsRef<Path>>(path: P) -> Result<Vec<WishProduct>> {
    read_rows::<WishProductRow, _>(path.as_ref())
}

pub fn read_categories<P: AsRef<Path>>(path: P) -> Result<Vec<ProductCategory>> {
    read_rows::<CategoryRow, _>(path.as_ref())
}

pub fn read_file_uploads<P: AsRef<Path>>(path: P) -> Result<Vec<FileUpload>> {
    read_rows::<FileUploadRow, _>(path.as_ref())
}

pub fn write_wish_products<W: Write>(writer: W, products: &[WishProduct]) -> Result<()> {
    write_rows(writer, products.iter().map(WishProductRow::from))
}

pub fn write_categories<W: Write>(writer: W, categories: &[ProductCategory]) -> Result<()> {
    write_rows(writer, categories.iter().map(CategoryRow::from))
}

pub fn write_file_uploads<W: Write>(writer: W, uploads: &[FileUpload]) -> Result<()> {
    write_rows(writer, uploads.iter().map(FileUploadRow::from))
}

/// 把已有文件复制到 `<data_dir>/backups/<timestamp>_<file>`，文件不存在时返回 None
pub fn backup_file(data_dir: &Path, filename: &str) -> Result<Option<PathBuf>> {
    let source = data_dir.join(filename);
    if !source.exists() {
        return Ok(None);
    }
    let backup_dir = data_dir.join("backups");
    fs::create_dir_all(&backup_dir)?;
    let target = backup_dir.join(format!(
        "{}_{}",
        Utc::now().format("%Y-%m-%dT%H-%M-%S-%3fZ"),
        filename
    ));
    fs::copy(&source, &target)?;
    info!("CSV backup created: {}", target.display());
    Ok(Some(target))
}

/// 旧数据目录中的全部记录
#[derive(Debug, Clone, Default)]
pub struct LegacyData {
    pub products: Vec<WishProduct>,
    pub categories: Vec<ProductCategory>,
    pub uploads: Vec<FileUpload>,
}

/// 读取数据目录，缺失的文件视为空
pub fn load_legacy_dir<P: AsRef<Path>>(data_dir: P) -> Result<LegacyData> {
    let dir = data_dir.as_ref();
    if !dir.is_dir() {
        return Err(BiMarketError::file_not_found(format!(
            "数据目录不存在: {}",
            dir.display()
        )));
    }

    let load = |name: &str| {
        let path = dir.join(name);
        if path.exists() { Some(path) } else { None }
    };

    Ok(LegacyData {
        categories: load(CATEGORIES_FILE)
            .map(read_categories)
            .transpose()?
            .unwrap_or_default(),
        products: load(WISH_PRODUCTS_FILE)
            .map(read_wish_products)
            .transpose()?
            .unwrap_or_default(),
        uploads: load(FILE_UPLOADS_FILE)
            .map(read_file_uploads)
            .transpose()?
            .unwrap_or_default(),
    })
}

fn write_file_with_backup<F>(dir: &Path, filename: &str, write: F) -> Result<()>
where
    F: FnOnce(BufWriter<File>) -> Result<()>,
{
    if let Err(e) = backup_file(dir, filename) {
        warn!("备份 {} 失败: {}", filename, e);
    }
    let file = File::create(dir.join(filename))
        .map_err(|e| BiMarketError::file_write(format!("无法创建 {}: {}", filename, e)))?;
    write(BufWriter::new(file))
}

/// 把全部数据写回数据目录（先备份）
pub fn export_legacy_dir<P: AsRef<Path>>(data_dir: P, data: &LegacyData) -> Result<()> {
    let dir = data_dir.as_ref();
    fs::create_dir_all(dir)?;

    write_file_with_backup(dir, WISH_PRODUCTS_FILE, |w| {
        write_wish_products(w, &data.products)
    })?;
    write_file_with_backup(dir, CATEGORIES_FILE, |w| write_categories(w, &data.categories))?;
    write_file_with_backup(dir, FILE_UPLOADS_FILE, |w| {
        write_file_uploads(w, &data.uploads)
    })?;

    info!(
        "Exported {} products, {} categories, {} uploads to {}",
        data.products.len(),
        data.categories.len(),
        data.uploads.len(),
        dir.display()
    );
    Ok(())
}

/// HTTP 导出的默认文件名
pub fn generate_export_filename() -> String {
    format!(
        "wish_products_export_{}.csv",
        Utc::now().format("%Y%m%d_%H%M%S")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_legacy_product_row_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "id,name,description,category_id,region,additional_info,image_urls,status,created_at,updated_at"
        )
        .unwrap();
        writeln!(
            file,
            "p1,耳機,想要一副降噪耳機,1,日本,,a.png;b.png,completed,2025-01-01T00:00:00.000Z,"
        )
        .unwrap();

        let products = read_wish_products(file.path()).unwrap();
        assert_eq!(products.len(), 1);
        let p = &products[0];
        assert_eq!(p.image_urls, vec!["a.png", "b.png"]);
        assert_eq!(p.status, WishStatus::Completed);
        assert_eq!(p.currency, "TWD");
        assert_eq!(p.wish_count, 0);
        assert_eq!(p.additional_info, None);
        assert_eq!(p.updated_at, p.created_at);
    }

    #[test]
    fn test_bad_rows_are_skipped_when_others_parse() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "id,name,category_id,created_at").unwrap();
        writeln!(file, "ok,好東西,1,2025-01-01T00:00:00Z").unwrap();
        writeln!(file, "bad,壞日期,1,not-a-date").unwrap();

        let products = read_wish_products(file.path()).unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].id, "ok");
    }

    #[test]
    fn test_all_rows_bad_is_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "id,name,is_active,created_at").unwrap();
        writeln!(file, "x,分類,true,2025-01-01").unwrap();
        let err = read_categories(file.path()).unwrap_err();
        assert_eq!(err.code(), BiMarketError::csv_parse("").code());
    }

    #[test]
    fn test_export_creates_backup() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CATEGORIES_FILE), "old").unwrap();

        export_legacy_dir(dir.path(), &LegacyData::default()).unwrap();

        let backups: Vec<_> = fs::read_dir(dir.path().join("backups"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(backups.len(), 1);
        assert!(backups[0].ends_with(CATEGORIES_FILE));
        assert!(dir.path().join(WISH_PRODUCTS_FILE).exists());
    }

    #[test]
    fn test_load_missing_dir() {
        let dir = TempDir::new().unwrap();
        assert!(load_legacy_dir(dir.path().join("nope")).is_err());
        let empty = load_legacy_dir(dir.path()).unwrap();
        assert!(empty.products.is_empty());
    }
}
