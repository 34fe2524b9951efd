//! 许愿表单与上传文件校验
//!
//! 表单校验会收集所有字段问题后一起返回，前端可以一次性标出全部错误。

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::config::UploadConfig;
use crate::errors::{BiMarketError, FieldIssue, Result};

pub const DEFAULT_CURRENCY: &str = "TWD";

/// multipart 表单中的原始文本字段
#[derive(Debug, Clone, Default)]
pub struct WishProductInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<String>,
    pub region: Option<String>,
    pub additional_info: Option<String>,
    pub expected_price: Option<String>,
    pub currency: Option<String>,
}

/// 通过校验、已规范化的字段
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedWish {
    pub name: String,
    pub description: String,
    pub category_id: i32,
    pub region: String,
    pub additional_info: Option<String>,
    pub expected_price: f64,
    pub currency: String,
}

/// 一个上传的文件分片
#[derive(Debug, Clone)]
pub struct ImagePart {
    pub filename: String,
    pub content_type: String,
    pub data: bytes::Bytes,
}

impl ImagePart {
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

fn trimmed(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn check_length(
    issues: &mut Vec<FieldIssue>,
    field: &str,
    value: &str,
    min: usize,
    max: usize,
    too_short: &str,
    too_long: &str,
) {
    let len = value.chars().count();
    if len < min {
        issues.push(FieldIssue::new(field, too_short));
    } else if len > max {
        issues.push(FieldIssue::new(field, too_long));
    }
}

pub fn validate_wish_input(input: &WishProductInput) -> Result<ValidatedWish> {
    let mut issues = Vec::new();

    let name = trimmed(&input.name).unwrap_or_default();
    if name.is_empty() {
        issues.push(FieldIssue::new("name", "商品名稱為必填"));
    } else {
        check_length(
            &mut issues,
            "name",
            name,
            2,
            255,
            "商品名稱至少需要2個字元",
            "商品名稱不可超過255個字元",
        );
    }

    let description = trimmed(&input.description).unwrap_or_default();
    if description.is_empty() {
        issues.push(FieldIssue::new("description", "商品描述為必填"));
    } else {
        check_length(
            &mut issues,
            "description",
            description,
            10,
            2000,
            "商品描述至少需要10個字元",
            "商品描述不可超過2000個字元",
        );
    }

    let category_id = match trimmed(&input.category_id) {
        None => {
            issues.push(FieldIssue::new("categoryId", "請選擇商品類別"));
            0
        }
        Some(raw) => match raw.parse::<i32>() {
            Ok(id) if id > 0 => id,
            _ => {
                issues.push(FieldIssue::new("categoryId", "請選擇有效的商品類別"));
                0
            }
        },
    };

    let region = trimmed(&input.region).unwrap_or_default();
    if region.is_empty() {
        issues.push(FieldIssue::new("region", "請填寫商品所在領域"));
    } else if region.chars().count() > 100 {
        issues.push(FieldIssue::new("region", "商品所在領域不可超過100個字元"));
    }

    let additional_info = trimmed(&input.additional_info).map(String::from);
    if let Some(info) = &additional_info
        && info.chars().count() > 1000
    {
        issues.push(FieldIssue::new("additionalInfo", "補充資訊不可超過1000個字元"));
    }

    let expected_price = match trimmed(&input.expected_price) {
        None => 0.0,
        Some(raw) => match raw.parse::<f64>() {
            Ok(price) if price.is_finite() && price >= 0.0 => price,
            _ => {
                issues.push(FieldIssue::new("expectedPrice", "期望價格必須是不小於0的數字"));
                0.0
            }
        },
    };

    let currency = match trimmed(&input.currency) {
        None => DEFAULT_CURRENCY.to_string(),
        Some(raw) if raw.len() == 3 && raw.chars().all(|c| c.is_ascii_alphabetic()) => {
            raw.to_ascii_uppercase()
        }
        Some(_) => {
            issues.push(FieldIssue::new("currency", "幣別必須是3個英文字母"));
            DEFAULT_CURRENCY.to_string()
        }
    };

    if !issues.is_empty() {
        return Err(BiMarketError::invalid_fields(issues));
    }

    Ok(ValidatedWish {
        name: name.to_string(),
        description: description.to_string(),
        category_id,
        region: region.to_string(),
        additional_info,
        expected_price,
        currency,
    })
}

/// 校验单个文件（`/api/upload`），错误直接映射到对应错误码
pub fn validate_image(part: &ImagePart, config: &UploadConfig) -> Result<()> {
    if !config
        .allowed_mime_types
        .iter()
        .any(|m| m.eq_ignore_ascii_case(&part.content_type))
    {
        return Err(BiMarketError::invalid_file_format(
            "只支援 JPG, PNG, WebP 格式的圖片",
        ));
    }
    if part.size() as u64 > config.max_file_size {
        return Err(BiMarketError::file_too_large(format!(
            "檔案大小不可超過 {}MB",
            config.max_file_size / (1024 * 1024)
        )));
    }
    Ok(())
}

/// 校验许愿表单附带的图片，问题追加到 `issues`
pub fn collect_image_issues(
    parts: &[ImagePart],
    config: &UploadConfig,
    issues: &mut Vec<FieldIssue>,
) {
    if parts.len() > config.max_images {
        issues.push(FieldIssue::new(
            "images",
            format!("最多只能上傳{}張圖片", config.max_images),
        ));
    }
    for part in parts {
        if let Err(e) = validate_image(part, config) {
            issues.push(FieldIssue::new(
                "images",
                format!("{}: {}", part.filename, e.message()),
            ));
        }
    }
}

/// 解析日期查询参数：RFC3339，或 `YYYY-MM-DD`
///
/// 纯日期作为起点时取当天 00:00 UTC，作为终点时取当天最后一刻。
pub fn parse_date_bound(raw: &str, end_of_day: bool) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| BiMarketError::date_parse(format!("無效的日期 '{}': {}", raw, e)))?;
    let time = if end_of_day {
        NaiveTime::from_hms_milli_opt(23, 59, 59, 999)
    } else {
        NaiveTime::from_hms_opt(0, 0, 0)
    }
    .unwrap_or(NaiveTime::MIN);
    Ok(date.and_time(time).and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_input() -> WishProductInput {
        WishProductInput {
            name: Some("  Switch 2  ".into()),
            description: Some("想要一台日版 Switch 2 主機".into()),
            category_id: Some("1".into()),
            region: Some("日本".into()),
            additional_info: None,
            expected_price: Some("12000".into()),
            currency: Some("jpy".into()),
        }
    }

    fn image(content_type: &str, size: usize) -> ImagePart {
        ImagePart {
            filename: "a.png".into(),
            content_type: content_type.into(),
            data: bytes::Bytes::from(vec![0u8; size]),
        }
    }

    #[test]
    fn test_valid_input_is_normalized() {
        let wish = validate_wish_input(&valid_input()).unwrap();
        assert_eq!(wish.name, "Switch 2");
        assert_eq!(wish.category_id, 1);
        assert_eq!(wish.currency, "JPY");
        assert_eq!(wish.expected_price, 12000.0);
    }

    #[test]
    fn test_defaults_for_optional_fields() {
        let mut input = valid_input();
        input.expected_price = None;
        input.currency = Some("   ".into());
        let wish = validate_wish_input(&input).unwrap();
        assert_eq!(wish.expected_price, 0.0);
        assert_eq!(wish.currency, DEFAULT_CURRENCY);
    }

    #[test]
    fn test_collects_all_issues() {
        let input = WishProductInput {
            name: Some("A".into()),
            description: Some("太短".into()),
            category_id: Some("-3".into()),
            region: None,
            additional_info: Some("A".repeat(1001)),
            expected_price: Some("-1".into()),
            currency: Some("TW".into()),
        };
        let err = validate_wish_input(&input).unwrap_err();
        let fields: Vec<&str> = err
            .details()
            .unwrap()
            .iter()
            .map(|i| i.field.as_str())
            .collect();
        assert_eq!(
            fields,
            vec![
                "name",
                "description",
                "categoryId",
                "region",
                "additionalInfo",
                "expectedPrice",
                "currency"
            ]
        );
    }

    #[test]
    fn test_length_counts_chars_not_bytes() {
        let mut input = valid_input();
        // 10 个中文字符，30 字节
        input.description = Some("一二三四五六七八九十".into());
        assert!(validate_wish_input(&input).is_ok());
        input.description = Some("一".repeat(2001));
        assert!(validate_wish_input(&input).is_err());
    }

    #[test]
    fn test_validate_image() {
        let config = UploadConfig::default();
        assert!(validate_image(&image("image/png", 10), &config).is_ok());
        assert_eq!(
            validate_image(&image("image/gif", 10), &config)
                .unwrap_err()
                .code(),
            BiMarketError::invalid_file_format("").code()
        );
        let too_big = image("image/jpeg", config.max_file_size as usize + 1);
        assert_eq!(
            validate_image(&too_big, &config).unwrap_err().code(),
            BiMarketError::file_too_large("").code()
        );
    }

    #[test]
    fn test_collect_image_issues_limits_count() {
        let config = UploadConfig::default();
        let parts: Vec<ImagePart> = (0..config.max_images + 1)
            .map(|_| image("image/webp", 1))
            .collect();
        let mut issues = Vec::new();
        collect_image_issues(&parts, &config, &mut issues);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field, "images");
    }

    #[test]
    fn test_parse_date_bound() {
        let start = parse_date_bound("2024-03-01", false).unwrap();
        assert_eq!(start.to_rfc3339(), "2024-03-01T00:00:00+00:00");
        let end = parse_date_bound("2024-03-01", true).unwrap();
        assert!(end > start);
        assert_eq!(end.date_naive(), start.date_naive());
        let rfc = parse_date_bound("2024-03-01T08:00:00+08:00", false).unwrap();
        assert_eq!(rfc.to_rfc3339(), "2024-03-01T00:00:00+00:00");
        assert!(parse_date_bound("yesterday", false).is_err());
    }
}
