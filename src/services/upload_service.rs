//! 图片上传与文件服务
//!
//! 上传文件保存在 `<uploads_dir>/wish-products/` 下，
//! 文件名为 `<timestamp>_<random>.<ext>`。读取时所有路径都必须留在 uploads 目录内。

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::config::UploadConfig;
use crate::errors::{BiMarketError, Result};
use crate::services::validation::{ImagePart, validate_image};
use crate::storage::{FileUpload, SeaOrmStorage};
use crate::utils::random_base36;

/// 许愿商品图片所在子目录
pub const WISH_IMAGES_DIR: &str = "wish-products";
/// 上传记录关联的表名
pub const WISH_PRODUCTS_TABLE: &str = "wish_products";

/// 按扩展名推断 Content-Type
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

/// 存储文件名的扩展名：优先用原文件名，否则按 MIME 推断
fn extension_for(part: &ImagePart) -> String {
    let from_name = Path::new(&part.filename)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.len() <= 5 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| e.to_ascii_lowercase());
    from_name.unwrap_or_else(|| {
        match part.content_type.as_str() {
            "image/jpeg" => "jpg",
            "image/png" => "png",
            "image/webp" => "webp",
            "image/gif" => "gif",
            _ => "bin",
        }
        .to_string()
    })
}

pub fn generate_stored_filename(part: &ImagePart) -> String {
    format!(
        "{}_{}.{}",
        Utc::now().format("%Y-%m-%dT%H-%M-%S-%3fZ"),
        random_base36(6),
        extension_for(part)
    )
}

/// 仍带百分号编码的分隔符（`%2F` / `%5C`）
fn has_encoded_separator(raw: &str) -> bool {
    let lower = raw.to_ascii_lowercase();
    lower.contains("%2f") || lower.contains("%5c")
}

/// 去掉 `.`，拒绝 `..`、绝对路径和盘符
fn normalize_relative(raw: &str) -> Option<PathBuf> {
    if has_encoded_separator(raw) {
        return None;
    }
    let mut out = PathBuf::new();
    for component in Path::new(raw).components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    if out.as_os_str().is_empty() {
        None
    } else {
        Some(out)
    }
}

pub struct UploadService {
    storage: Arc<SeaOrmStorage>,
    uploads_dir: PathBuf,
    config: UploadConfig,
}

impl UploadService {
    pub fn new(
        storage: Arc<SeaOrmStorage>,
        uploads_dir: impl Into<PathBuf>,
        config: UploadConfig,
    ) -> Self {
        Self {
            storage,
            uploads_dir: uploads_dir.into(),
            config,
        }
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }

    fn images_dir(&self) -> PathBuf {
        self.uploads_dir.join(WISH_IMAGES_DIR)
    }

    pub fn public_url(stored_filename: &str) -> String {
        format!("/uploads/{}/{}", WISH_IMAGES_DIR, stored_filename)
    }

    /// 把文件写到磁盘并返回上传记录（尚未入库）
    pub async fn write_file(&self, part: &ImagePart) -> Result<FileUpload> {
        let dir = self.images_dir();
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            BiMarketError::file_upload(format!("无法创建上传目录 {}: {}", dir.display(), e))
        })?;

        let stored_filename = generate_stored_filename(part);
        let path = dir.join(&stored_filename);
        tokio::fs::write(&path, &part.data).await.map_err(|e| {
            BiMarketError::file_upload(format!("写入文件 {} 失败: {}", path.display(), e))
        })?;
        debug!("Stored upload {} ({} bytes)", path.display(), part.size());

        Ok(FileUpload {
            id: uuid::Uuid::new_v4().to_string(),
            original_filename: part.filename.clone(),
            stored_filename,
            file_path: path.to_string_lossy().into_owned(),
            file_size: part.size() as i64,
            mime_type: part.content_type.clone(),
            related_table: None,
            related_id: None,
            created_at: Utc::now(),
        })
    }

    /// 单独上传一张图片：校验、落盘、写入上传记录
    pub async fn upload(&self, part: &ImagePart) -> Result<FileUpload> {
        validate_image(part, &self.config)?;
        let record = self.write_file(part).await?;

        if let Err(e) = self.storage.insert_file_upload(&record).await {
            self.remove_files(std::slice::from_ref(&record)).await;
            return Err(BiMarketError::file_upload(format!(
                "记录上传文件失败: {}",
                e.message()
            )));
        }

        info!(
            "Upload stored: {} -> {}",
            record.original_filename, record.stored_filename
        );
        Ok(record)
    }

    /// 尽力删除磁盘上的文件，失败只记录警告
    pub async fn remove_files(&self, uploads: &[FileUpload]) {
        for upload in uploads {
            let path = self.images_dir().join(&upload.stored_filename);
            match tokio::fs::remove_file(&path).await {
                Ok(()) => debug!("Removed upload {}", path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to remove upload {}: {}", path.display(), e),
            }
        }
    }

    /// `/api/upload/{filename}`：只接受不含路径分隔符的文件名
    pub fn resolve_wish_image(&self, filename: &str) -> Result<PathBuf> {
        if filename.is_empty()
            || filename.contains('/')
            || filename.contains('\\')
            || has_encoded_separator(filename)
            || filename == "."
            || filename == ".."
        {
            return Err(BiMarketError::validation(format!("無效的檔案名稱: {}", filename)));
        }
        Ok(self.images_dir().join(filename))
    }

    /// `/uploads/{path..}`：相对路径必须落在 uploads 目录内
    pub fn resolve_upload_path(&self, raw: &str) -> Result<PathBuf> {
        let relative = normalize_relative(raw)
            .ok_or_else(|| BiMarketError::forbidden_path(format!("拒絕存取路徑: {}", raw)))?;
        let candidate = self.uploads_dir.join(relative);

        // 符号链接可能指向目录外
        if let (Ok(real), Ok(root)) = (candidate.canonicalize(), self.uploads_dir.canonicalize())
            && !real.starts_with(&root)
        {
            return Err(BiMarketError::forbidden_path(format!("拒絕存取路徑: {}", raw)));
        }
        Ok(candidate)
    }

    /// 读取文件内容；不存在时返回 FileNotFound
    pub async fn read_file(&self, path: &Path) -> Result<Vec<u8>> {
        match tokio::fs::metadata(path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => {
                return Err(BiMarketError::file_not_found(format!(
                    "檔案不存在: {}",
                    path.display()
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(BiMarketError::file_not_found(format!(
                    "檔案不存在: {}",
                    path.display()
                )));
            }
            Err(e) => return Err(BiMarketError::file_read(e.to_string())),
        }
        tokio::fs::read(path)
            .await
            .map_err(|e| BiMarketError::file_read(format!("讀取 {} 失敗: {}", path.display(), e)))
    }
}
