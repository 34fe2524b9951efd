//! 上传与文件服务端点

use actix_multipart::Multipart;
use actix_web::{Responder, web};
use tracing::info;

use crate::errors::BiMarketError;
use crate::services::{AppServices, UploadService};

use super::helpers::{
    MultipartLimits, error_from_bimarket, file_response, read_multipart, success_response,
};
use super::types::UploadResponse;

/// POST /api/upload（multipart 字段 `file`）
pub async fn upload_file(payload: Multipart, services: web::Data<AppServices>) -> impl Responder {
    let uploads = &services.uploads;
    let limits = MultipartLimits {
        file_field: "file",
        max_files: 1,
        max_file_size: uploads.config().max_file_size,
    };
    let form = match read_multipart(payload, limits).await {
        Ok(form) => form,
        Err(e) => return error_from_bimarket(&e),
    };

    let Some(part) = form.files.into_iter().next() else {
        return error_from_bimarket(&BiMarketError::no_file_provided("請選擇要上傳的檔案"));
    };

    match uploads.upload(&part).await {
        Ok(record) => {
            info!("API: uploaded {}", record.stored_filename);
            success_response(UploadResponse {
                url: UploadService::public_url(&record.stored_filename),
                id: record.id,
                filename: record.stored_filename,
                original_filename: record.original_filename,
                file_size: record.file_size,
                mime_type: record.mime_type,
            })
        }
        Err(e) => error_from_bimarket(&e),
    }
}

/// GET /api/upload/{filename}
pub async fn get_uploaded_image(
    path: web::Path<String>,
    services: web::Data<AppServices>,
) -> impl Responder {
    let uploads = &services.uploads;
    let result = match uploads.resolve_wish_image(&path.into_inner()) {
        Ok(file) => uploads.read_file(&file).await.map(|content| (file, content)),
        Err(e) => Err(e),
    };
    match result {
        Ok((file, content)) => file_response(&file, content),
        Err(e) => error_from_bimarket(&e),
    }
}

/// GET /uploads/{path..}
pub async fn serve_upload(
    path: web::Path<String>,
    services: web::Data<AppServices>,
) -> impl Responder {
    let uploads = &services.uploads;
    let result = match uploads.resolve_upload_path(&path.into_inner()) {
        Ok(file) => uploads.read_file(&file).await.map(|content| (file, content)),
        Err(e) => Err(e),
    };
    match result {
        Ok((file, content)) => file_response(&file, content),
        Err(e) => error_from_bimarket(&e),
    }
}
