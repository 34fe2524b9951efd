//! API 帮助函数

use std::collections::HashMap;
use std::path::Path;

use actix_multipart::Multipart;
use actix_web::cookie::{Cookie, SameSite, time::Duration as CookieDuration};
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, error, web};
use futures_util::StreamExt;
use serde::Serialize;
use tracing::{error, warn};

use crate::config::get_config;
use crate::errors::{BiMarketError, FieldIssue};
use crate::services::content_type_for;
use crate::services::validation::ImagePart;
use crate::utils::random_base36;

use super::error_code::ErrorCode;
use super::types::{ApiError, ApiResponse};

/// 长期缓存的静态文件
pub const IMMUTABLE_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

const GUEST_ID_PREFIX: &str = "guest_";

/// 构建 JSON 信封响应
pub fn json_response<T: Serialize>(
    status: StatusCode,
    data: Option<T>,
    error: Option<ApiError>,
) -> HttpResponse {
    HttpResponse::build(status)
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(ApiResponse {
            success: error.is_none(),
            data,
            error,
        })
}

/// 构建成功响应
pub fn success_response<T: Serialize>(data: T) -> HttpResponse {
    json_response(StatusCode::OK, Some(data), None)
}

pub fn created_response<T: Serialize>(data: T) -> HttpResponse {
    json_response(StatusCode::CREATED, Some(data), None)
}

/// 构建错误响应
pub fn error_response(status: StatusCode, code: ErrorCode, message: &str) -> HttpResponse {
    json_response::<()>(
        status,
        None,
        Some(ApiError {
            code,
            message: message.to_string(),
            details: None,
        }),
    )
}

/// 对外显示的错误信息，内部错误不暴露原始内容
fn public_message(err: &BiMarketError) -> String {
    if err.is_internal() {
        return "伺服器內部錯誤，請稍後再試".to_string();
    }
    match err {
        BiMarketError::FileUpload(_) => "檔案儲存失敗".to_string(),
        BiMarketError::FileWrite(_) => "檔案寫入失敗".to_string(),
        BiMarketError::FileRead(_) => "檔案讀取失敗".to_string(),
        _ => err.message().to_string(),
    }
}

/// 从 BiMarketError 构建错误响应（自动映射 HTTP 状态码和 ErrorCode）
pub fn error_from_bimarket(err: &BiMarketError) -> HttpResponse {
    let status = err.http_status();
    if status.is_server_error() {
        error!("{}", err.format_colored());
    } else {
        warn!("Request rejected: {}", err);
    }
    json_response::<()>(
        status,
        None,
        Some(ApiError {
            code: ErrorCode::from(err),
            message: public_message(err),
            details: err.details().map(<[_]>::to_vec),
        }),
    )
}

/// 统一 Result → HttpResponse 转换
///
/// 成功时返回 200 OK + JSON 数据，失败时自动映射 BiMarketError。
pub fn api_result<T: Serialize>(result: Result<T, BiMarketError>) -> HttpResponse {
    match result {
        Ok(data) => success_response(data),
        Err(e) => error_from_bimarket(&e),
    }
}

// ============ 访客 ID ============

pub fn guest_cookie_name() -> String {
    get_config().api.guest_cookie_name.clone()
}

/// 从 cookie 读取访客 ID
pub fn guest_id(req: &HttpRequest) -> Option<String> {
    req.cookie(&guest_cookie_name())
        .map(|c| c.value().trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn generate_guest_id() -> String {
    format!("{}{}", GUEST_ID_PREFIX, random_base36(11))
}

/// 访客 cookie：前端脚本需要读取，因此不设置 HttpOnly
pub fn build_guest_cookie(value: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(guest_cookie_name(), value);
    cookie.set_path("/");
    cookie.set_http_only(false);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_max_age(CookieDuration::days(365));
    cookie
}

/// 取已有访客 ID，没有时生成一个新的并返回需要下发的 cookie
pub fn ensure_guest_id(req: &HttpRequest) -> (String, Option<Cookie<'static>>) {
    match guest_id(req) {
        Some(id) => (id, None),
        None => {
            let id = generate_guest_id();
            let cookie = build_guest_cookie(id.clone());
            (id, Some(cookie))
        }
    }
}

pub fn with_cookie(mut response: HttpResponse, cookie: Option<Cookie<'static>>) -> HttpResponse {
    if let Some(cookie) = cookie
        && let Err(e) = response.add_cookie(&cookie)
    {
        warn!("Failed to set guest cookie: {}", e);
    }
    response
}

// ============ multipart ============

/// 解析后的 multipart 表单
#[derive(Debug, Default)]
pub struct MultipartForm {
    pub fields: HashMap<String, String>,
    /// 指定文件字段下的非空文件
    pub files: Vec<ImagePart>,
}

impl MultipartForm {
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields.get(name).cloned()
    }
}

/// multipart 读取限制
#[derive(Debug, Clone, Copy)]
pub struct MultipartLimits<'a> {
    /// 接受的文件字段名，其他文件字段读完即丢弃
    pub file_field: &'a str,
    pub max_files: usize,
    pub max_file_size: u64,
}

const MAX_TEXT_FIELD: usize = 64 * 1024;
const MAX_TEXT_FIELDS: usize = 32;

async fn drain_field(field: &mut actix_multipart::Field) -> Result<(), BiMarketError> {
    while let Some(chunk) = field.next().await {
        chunk.map_err(|e| {
            BiMarketError::file_read(format!("Failed to read multipart field: {}", e))
        })?;
    }
    Ok(())
}

async fn read_field_capped(
    field: &mut actix_multipart::Field,
    cap: usize,
) -> Result<Vec<u8>, BiMarketError> {
    let mut data = Vec::new();
    while let Some(chunk) = field.next().await {
        let bytes = chunk.map_err(|e| {
            BiMarketError::file_read(format!("Failed to read multipart field: {}", e))
        })?;
        let room = cap.saturating_sub(data.len());
        data.extend_from_slice(&bytes[..bytes.len().min(room)]);
    }
    Ok(data)
}

/// 读取 multipart 表单
///
/// 单个文件最多保留 `max_file_size + 1` 字节，其余内容被丢弃，
/// 校验阶段据此判断文件过大。文件数超过 `max_files` 时立即返回
/// 字段错误，不再继续读取。
pub async fn read_multipart(
    mut payload: Multipart,
    limits: MultipartLimits<'_>,
) -> Result<MultipartForm, BiMarketError> {
    let file_cap = usize::try_from(limits.max_file_size)
        .unwrap_or(usize::MAX)
        .saturating_add(1);
    let mut form = MultipartForm::default();

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| {
            BiMarketError::validation(format!("Invalid multipart data: {}", e))
        })?;

        let name = field.name().unwrap_or("").to_string();
        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(String::from);

        let Some(filename) = filename else {
            if form.fields.len() >= MAX_TEXT_FIELDS && !form.fields.contains_key(&name) {
                drain_field(&mut field).await?;
                continue;
            }
            let data = read_field_capped(&mut field, MAX_TEXT_FIELD).await?;
            form.fields
                .insert(name, String::from_utf8_lossy(&data).into_owned());
            continue;
        };

        if name != limits.file_field {
            drain_field(&mut field).await?;
            continue;
        }

        let content_type = field
            .content_type()
            .map(|m| m.essence_str().to_string())
            .unwrap_or_default();
        let data = read_field_capped(&mut field, file_cap).await?;
        if data.is_empty() {
            continue;
        }
        if form.files.len() >= limits.max_files {
            return Err(BiMarketError::invalid_fields(vec![FieldIssue::new(
                limits.file_field,
                format!("最多只能上傳{}張圖片", limits.max_files),
            )]));
        }
        form.files.push(ImagePart {
            filename,
            content_type,
            data: data.into(),
        });
    }

    Ok(form)
}

// ============ 文件响应 ============

pub fn file_response(path: &Path, content: Vec<u8>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(content_type_for(path))
        .insert_header(("Cache-Control", IMMUTABLE_CACHE_CONTROL))
        .body(content)
}

// ============ 提取器错误 ============

/// 查询参数解析失败时返回统一信封
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        let message = format!("查詢參數無效: {}", err);
        error::InternalError::from_response(
            err,
            error_response(StatusCode::BAD_REQUEST, ErrorCode::ValidationError, &message),
        )
        .into()
    })
}

/// 路径参数解析失败时返回统一信封
pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, _req| {
        let message = format!("路徑參數無效: {}", err);
        error::InternalError::from_response(
            err,
            error_response(StatusCode::BAD_REQUEST, ErrorCode::ValidationError, &message),
        )
        .into()
    })
}

/// JSON 请求体解析失败时返回统一信封
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let message = format!("請求內容格式錯誤: {}", err);
        error::InternalError::from_response(
            err,
            error_response(StatusCode::BAD_REQUEST, ErrorCode::ValidationError, &message),
        )
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_guest_id() {
        let id = generate_guest_id();
        assert!(id.starts_with("guest_"));
        assert_eq!(id.len(), "guest_".len() + 11);
    }

    #[test]
    fn test_guest_cookie_attributes() {
        let cookie = build_guest_cookie("guest_abc".into());
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_ne!(cookie.http_only(), Some(true));
        assert_eq!(cookie.max_age(), Some(CookieDuration::days(365)));
    }

    #[test]
    fn test_public_message_hides_internal_errors() {
        let err = BiMarketError::database_operation("UNIQUE constraint failed: secret");
        assert!(!public_message(&err).contains("secret"));
        let err = BiMarketError::product_not_found("找不到商品 x");
        assert_eq!(public_message(&err), "找不到商品 x");
    }
}
