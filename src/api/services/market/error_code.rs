//! 统一 API 错误码定义

use serde::{Deserialize, Serialize};
use strum::AsRefStr;

use crate::errors::BiMarketError;

/// API 错误码，序列化为 SCREAMING_SNAKE_CASE 字符串
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // 校验错误
    ValidationError,
    RequiredFieldMissing,
    InvalidFileFormat,
    FileTooLarge,
    NoFileProvided,

    // 业务错误
    CategoryNotFound,
    ProductNotFound,
    /// 保留：目前重复提交不做拦截
    DuplicateSubmission,
    FileNotFound,
    Forbidden,

    // 系统错误
    FileReadError,
    FileWriteError,
    FileUploadError,
    CsvParseError,
    InternalServerError,
    Unauthorized,

    // AI 生成
    ConfigError,
    GeminiError,
    ParseError,
    Timeout,
}

impl From<&BiMarketError> for ErrorCode {
    fn from(err: &BiMarketError) -> Self {
        match err {
            BiMarketError::Validation(_)
            | BiMarketError::InvalidFields(_)
            | BiMarketError::DateParse(_) => ErrorCode::ValidationError,
            BiMarketError::RequiredFieldMissing(_) => ErrorCode::RequiredFieldMissing,
            BiMarketError::InvalidFileFormat(_) => ErrorCode::InvalidFileFormat,
            BiMarketError::FileTooLarge(_) => ErrorCode::FileTooLarge,
            BiMarketError::NoFileProvided(_) => ErrorCode::NoFileProvided,
            BiMarketError::CategoryNotFound(_) => ErrorCode::CategoryNotFound,
            BiMarketError::ProductNotFound(_) => ErrorCode::ProductNotFound,
            BiMarketError::FileNotFound(_) => ErrorCode::FileNotFound,
            BiMarketError::ForbiddenPath(_) => ErrorCode::Forbidden,
            BiMarketError::FileRead(_) => ErrorCode::FileReadError,
            BiMarketError::FileWrite(_) => ErrorCode::FileWriteError,
            BiMarketError::FileUpload(_) => ErrorCode::FileUploadError,
            BiMarketError::CsvParse(_) => ErrorCode::CsvParseError,
            BiMarketError::DatabaseConfig(_)
            | BiMarketError::DatabaseConnection(_)
            | BiMarketError::DatabaseOperation(_)
            | BiMarketError::Serialization(_) => ErrorCode::InternalServerError,
            BiMarketError::AiConfig(_) => ErrorCode::ConfigError,
            BiMarketError::AiUpstream { .. } => ErrorCode::GeminiError,
            BiMarketError::AiParse(_) => ErrorCode::ParseError,
            BiMarketError::AiTimeout(_) => ErrorCode::Timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format() {
        assert_eq!(
            serde_json::to_string(&ErrorCode::ValidationError).unwrap(),
            "\"VALIDATION_ERROR\""
        );
        assert_eq!(ErrorCode::CsvParseError.as_ref(), "CSV_PARSE_ERROR");
        assert_eq!(ErrorCode::Forbidden.as_ref(), "FORBIDDEN");
    }

    #[test]
    fn test_error_mapping() {
        assert_eq!(
            ErrorCode::from(&BiMarketError::date_parse("x")),
            ErrorCode::ValidationError
        );
        assert_eq!(
            ErrorCode::from(&BiMarketError::database_operation("x")),
            ErrorCode::InternalServerError
        );
        assert_eq!(
            ErrorCode::from(&BiMarketError::ai_upstream(429, "x")),
            ErrorCode::GeminiError
        );
        assert_eq!(
            ErrorCode::from(&BiMarketError::forbidden_path("x")),
            ErrorCode::Forbidden
        );
    }
}
