use std::fmt;

use actix_web::http::StatusCode;
use serde::Serialize;

/// 单个字段的校验错误
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    pub field: String,
    pub message: String,
}

impl FieldIssue {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum BiMarketError {
    Validation(String),
    InvalidFields(Vec<FieldIssue>),
    RequiredFieldMissing(String),
    InvalidFileFormat(String),
    FileTooLarge(String),
    NoFileProvided(String),
    CategoryNotFound(String),
    ProductNotFound(String),
    FileNotFound(String),
    ForbiddenPath(String),
    FileRead(String),
    FileWrite(String),
    FileUpload(String),
    CsvParse(String),
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    Serialization(String),
    DateParse(String),
    AiConfig(String),
    AiUpstream { status: u16, message: String },
    AiParse(String),
    AiTimeout(String),
}

impl BiMarketError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            BiMarketError::Validation(_) => "E001",
            BiMarketError::InvalidFields(_) => "E002",
            BiMarketError::RequiredFieldMissing(_) => "E003",
            BiMarketError::InvalidFileFormat(_) => "E004",
            BiMarketError::FileTooLarge(_) => "E005",
            BiMarketError::NoFileProvided(_) => "E006",
            BiMarketError::CategoryNotFound(_) => "E007",
            BiMarketError::ProductNotFound(_) => "E008",
            BiMarketError::FileNotFound(_) => "E009",
            BiMarketError::ForbiddenPath(_) => "E010",
            BiMarketError::FileRead(_) => "E011",
            BiMarketError::FileWrite(_) => "E012",
            BiMarketError::FileUpload(_) => "E013",
            BiMarketError::CsvParse(_) => "E014",
            BiMarketError::DatabaseConfig(_) => "E015",
            BiMarketError::DatabaseConnection(_) => "E016",
            BiMarketError::DatabaseOperation(_) => "E017",
            BiMarketError::Serialization(_) => "E018",
            BiMarketError::DateParse(_) => "E019",
            BiMarketError::AiConfig(_) => "E020",
            BiMarketError::AiUpstream { .. } => "E021",
            BiMarketError::AiParse(_) => "E022",
            BiMarketError::AiTimeout(_) => "E023",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            BiMarketError::Validation(_) => "Validation Error",
            BiMarketError::InvalidFields(_) => "Invalid Fields",
            BiMarketError::RequiredFieldMissing(_) => "Required Field Missing",
            BiMarketError::InvalidFileFormat(_) => "Invalid File Format",
            BiMarketError::FileTooLarge(_) => "File Too Large",
            BiMarketError::NoFileProvided(_) => "No File Provided",
            BiMarketError::CategoryNotFound(_) => "Category Not Found",
            BiMarketError::ProductNotFound(_) => "Product Not Found",
            BiMarketError::FileNotFound(_) => "File Not Found",
            BiMarketError::ForbiddenPath(_) => "Forbidden Path",
            BiMarketError::FileRead(_) => "File Read Error",
            BiMarketError::FileWrite(_) => "File Write Error",
            BiMarketError::FileUpload(_) => "File Upload Error",
            BiMarketError::CsvParse(_) => "CSV Parse Error",
            BiMarketError::DatabaseConfig(_) => "Database Configuration Error",
            BiMarketError::DatabaseConnection(_) => "Database Connection Error",
            BiMarketError::DatabaseOperation(_) => "Database Operation Error",
            BiMarketError::Serialization(_) => "Serialization Error",
            BiMarketError::DateParse(_) => "Date Parse Error",
            BiMarketError::AiConfig(_) => "AI Configuration Error",
            BiMarketError::AiUpstream { .. } => "AI Upstream Error",
            BiMarketError::AiParse(_) => "AI Response Parse Error",
            BiMarketError::AiTimeout(_) => "AI Timeout",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            BiMarketError::InvalidFields(_) => "輸入資料驗證失敗",
            BiMarketError::AiUpstream { message, .. } => message,
            BiMarketError::Validation(msg)
            | BiMarketError::RequiredFieldMissing(msg)
            | BiMarketError::InvalidFileFormat(msg)
            | BiMarketError::FileTooLarge(msg)
            | BiMarketError::NoFileProvided(msg)
            | BiMarketError::CategoryNotFound(msg)
            | BiMarketError::ProductNotFound(msg)
            | BiMarketError::FileNotFound(msg)
            | BiMarketError::ForbiddenPath(msg)
            | BiMarketError::FileRead(msg)
            | BiMarketError::FileWrite(msg)
            | BiMarketError::FileUpload(msg)
            | BiMarketError::CsvParse(msg)
            | BiMarketError::DatabaseConfig(msg)
            | BiMarketError::DatabaseConnection(msg)
            | BiMarketError::DatabaseOperation(msg)
            | BiMarketError::Serialization(msg)
            | BiMarketError::DateParse(msg)
            | BiMarketError::AiConfig(msg)
            | BiMarketError::AiParse(msg)
            | BiMarketError::AiTimeout(msg) => msg,
        }
    }

    /// 字段级错误详情（仅 InvalidFields 有）
    pub fn details(&self) -> Option<&[FieldIssue]> {
        match self {
            BiMarketError::InvalidFields(issues) => Some(issues),
            _ => None,
        }
    }

    /// 对应的 HTTP 状态码
    pub fn http_status(&self) -> StatusCode {
        match self {
            BiMarketError::Validation(_)
            | BiMarketError::InvalidFields(_)
            | BiMarketError::RequiredFieldMissing(_)
            | BiMarketError::InvalidFileFormat(_)
            | BiMarketError::FileTooLarge(_)
            | BiMarketError::NoFileProvided(_)
            | BiMarketError::CategoryNotFound(_)
            | BiMarketError::CsvParse(_)
            | BiMarketError::DateParse(_) => StatusCode::BAD_REQUEST,
            BiMarketError::ProductNotFound(_) | BiMarketError::FileNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            BiMarketError::ForbiddenPath(_) => StatusCode::FORBIDDEN,
            BiMarketError::AiUpstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            BiMarketError::AiParse(_) => StatusCode::BAD_GATEWAY,
            BiMarketError::AiTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            BiMarketError::FileRead(_)
            | BiMarketError::FileWrite(_)
            | BiMarketError::FileUpload(_)
            | BiMarketError::DatabaseConfig(_)
            | BiMarketError::DatabaseConnection(_)
            | BiMarketError::DatabaseOperation(_)
            | BiMarketError::Serialization(_)
            | BiMarketError::AiConfig(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 是否为内部错误（响应中不暴露原始信息）
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            BiMarketError::DatabaseConfig(_)
                | BiMarketError::DatabaseConnection(_)
                | BiMarketError::DatabaseOperation(_)
                | BiMarketError::Serialization(_)
        )
    }

    /// 格式化为彩色输出（启动失败时打印）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出（用于 CLI 模式）
    pub fn format_simple(&self) -> String {
        match self {
            BiMarketError::InvalidFields(issues) => {
                let fields: Vec<String> = issues
                    .iter()
                    .map(|i| format!("{}: {}", i.field, i.message))
                    .collect();
                format!("{}: {}", self.error_type(), fields.join("; "))
            }
            _ => format!("{}: {}", self.error_type(), self.message()),
        }
    }
}

impl fmt::Display for BiMarketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for BiMarketError {}

// 便捷的构造函数
impl BiMarketError {
    pub fn validation<T: Into<String>>(msg: T) -> Self {
        BiMarketError::Validation(msg.into())
    }

    pub fn invalid_fields(issues: Vec<FieldIssue>) -> Self {
        BiMarketError::InvalidFields(issues)
    }

    pub fn required_field_missing<T: Into<String>>(msg: T) -> Self {
        BiMarketError::RequiredFieldMissing(msg.into())
    }

    pub fn invalid_file_format<T: Into<String>>(msg: T) -> Self {
        BiMarketError::InvalidFileFormat(msg.into())
    }

    pub fn file_too_large<T: Into<String>>(msg: T) -> Self {
        BiMarketError::FileTooLarge(msg.into())
    }

    pub fn no_file_provided<T: Into<String>>(msg: T) -> Self {
        BiMarketError::NoFileProvided(msg.into())
    }

    pub fn category_not_found<T: Into<String>>(msg: T) -> Self {
        BiMarketError::CategoryNotFound(msg.into())
    }

    pub fn product_not_found<T: Into<String>>(msg: T) -> Self {
        BiMarketError::ProductNotFound(msg.into())
    }

    pub fn file_not_found<T: Into<String>>(msg: T) -> Self {
        BiMarketError::FileNotFound(msg.into())
    }

    pub fn forbidden_path<T: Into<String>>(msg: T) -> Self {
        BiMarketError::ForbiddenPath(msg.into())
    }

    pub fn file_read<T: Into<String>>(msg: T) -> Self {
        BiMarketError::FileRead(msg.into())
    }

    pub fn file_write<T: Into<String>>(msg: T) -> Self {
        BiMarketError::FileWrite(msg.into())
    }

    pub fn file_upload<T: Into<String>>(msg: T) -> Self {
        BiMarketError::FileUpload(msg.into())
    }

    pub fn csv_parse<T: Into<String>>(msg: T) -> Self {
        BiMarketError::CsvParse(msg.into())
    }

    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        BiMarketError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        BiMarketError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        BiMarketError::DatabaseOperation(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        BiMarketError::Serialization(msg.into())
    }

    pub fn date_parse<T: Into<String>>(msg: T) -> Self {
        BiMarketError::DateParse(msg.into())
    }

    pub fn ai_config<T: Into<String>>(msg: T) -> Self {
        BiMarketError::AiConfig(msg.into())
    }

    pub fn ai_upstream<T: Into<String>>(status: u16, msg: T) -> Self {
        BiMarketError::AiUpstream {
            status,
            message: msg.into(),
        }
    }

    pub fn ai_parse<T: Into<String>>(msg: T) -> Self {
        BiMarketError::AiParse(msg.into())
    }

    pub fn ai_timeout<T: Into<String>>(msg: T) -> Self {
        BiMarketError::AiTimeout(msg.into())
    }
}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for BiMarketError {
    fn from(err: sea_orm::DbErr) -> Self {
        BiMarketError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for BiMarketError {
    fn from(err: std::io::Error) -> Self {
        BiMarketError::FileWrite(err.to_string())
    }
}

impl From<serde_json::Error> for BiMarketError {
    fn from(err: serde_json::Error) -> Self {
        BiMarketError::Serialization(err.to_string())
    }
}

impl From<csv::Error> for BiMarketError {
    fn from(err: csv::Error) -> Self {
        BiMarketError::CsvParse(err.to_string())
    }
}

impl From<chrono::ParseError> for BiMarketError {
    fn from(err: chrono::ParseError) -> Self {
        BiMarketError::DateParse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BiMarketError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(
            BiMarketError::product_not_found("x").http_status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            BiMarketError::forbidden_path("x").http_status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            BiMarketError::category_not_found("x").http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            BiMarketError::ai_timeout("x").http_status(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            BiMarketError::database_operation("x").http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_ai_upstream_keeps_status() {
        let err = BiMarketError::ai_upstream(429, "quota");
        assert_eq!(err.http_status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(err.message(), "quota");

        // 非法状态码回退到 502
        let err = BiMarketError::ai_upstream(42, "weird");
        assert_eq!(err.http_status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_invalid_fields_details_and_format() {
        let err = BiMarketError::invalid_fields(vec![
            FieldIssue::new("name", "too short"),
            FieldIssue::new("region", "required"),
        ]);
        assert_eq!(err.details().map(|d| d.len()), Some(2));
        assert_eq!(
            err.format_simple(),
            "Invalid Fields: name: too short; region: required"
        );
        assert!(BiMarketError::validation("x").details().is_none());
    }

    #[test]
    fn test_internal_errors_flagged() {
        assert!(BiMarketError::database_operation("boom").is_internal());
        assert!(!BiMarketError::file_upload("disk").is_internal());
    }

    #[test]
    fn test_from_db_err() {
        let err: BiMarketError = sea_orm::DbErr::Custom("bad".into()).into();
        assert!(matches!(err, BiMarketError::DatabaseOperation(_)));
    }
}
