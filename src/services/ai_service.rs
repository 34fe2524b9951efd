//! AI 许愿描述生成
//!
//! 根据商品名称、类别和地区，让 Gemini 估一个期望价格并写一段简短描述。
//! HTTP 调用通过 [`WishGenerator`] 抽象，测试里可以替换成固定输出。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, warn};
use ureq::Agent;

use crate::config::AiConfig;
use crate::errors::{BiMarketError, Result};

/// 向模型发送 prompt，返回模型输出的原始文本
#[async_trait]
pub trait WishGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;

    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateWishRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category_id: Option<Value>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub additional_info: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedWish {
    pub expected_price: i64,
    pub description: String,
}

/// Gemini generateContent 客户端（ureq，在 spawn_blocking 中执行）
pub struct GeminiGenerator {
    api_key: String,
    api_url: String,
    agent: Agent,
}

impl GeminiGenerator {
    pub fn new(api_key: impl Into<String>, api_url: impl Into<String>, timeout: Duration) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();
        Self {
            api_key: api_key.into(),
            api_url: api_url.into(),
            agent,
        }
    }

    fn call_sync(agent: Agent, url: String, body: Value) -> Result<String> {
        let resp = agent
            .post(&url)
            .header("Content-Type", "application/json")
            .send_json(&body)
            .map_err(|e| match e {
                ureq::Error::Timeout(_) => BiMarketError::ai_timeout("AI 生成逾時，請重試"),
                other => BiMarketError::ai_upstream(502, other.to_string()),
            })?;

        let status = resp.status().as_u16();
        let mut body = resp.into_body();
        if !(200..300).contains(&status) {
            let text = body.read_to_string().unwrap_or_default();
            return Err(BiMarketError::ai_upstream(status, text));
        }

        let json: Value = body
            .read_json()
            .map_err(|e| BiMarketError::ai_parse(format!("Gemini 回應無法解析: {}", e)))?;
        Ok(json["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .unwrap_or_default()
            .to_string())
    }
}

#[async_trait]
impl WishGenerator for GeminiGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}?key={}", self.api_url, self.api_key);
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": { "temperature": 0.6, "maxOutputTokens": 256 }
        });
        let agent = self.agent.clone();

        tokio::task::spawn_blocking(move || Self::call_sync(agent, url, body))
            .await
            .map_err(|e| {
                warn!("Gemini spawn_blocking failed: {}", e);
                BiMarketError::ai_upstream(500, e.to_string())
            })?
    }

    fn name(&self) -> &'static str {
        "Gemini"
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// categoryId 可能是数字或字符串
fn category_text(value: &Option<Value>) -> Option<String> {
    match value {
        Some(Value::Number(n)) if n.as_f64().is_some_and(|v| v != 0.0) => Some(n.to_string()),
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

pub fn build_prompt(name: &str, category: &str, region: &str, additional_info: Option<&str>) -> String {
    format!(
        "你是一個電商代購平台助手。請用繁體中文為以下許願資料估算合理的期望價格（整數，新台幣區間內）並產生一段精煉描述（2-4 句），只輸出 JSON，格式如下：\n\
         {{\"expectedPrice\": 整數, \"description\": \"文字\"}}\n\n\
         資料：\n\
         - 商品名稱: {}\n\
         - 類別ID: {}\n\
         - 地區: {}\n\
         - 補充: {}\n",
        name,
        category,
        region,
        additional_info.unwrap_or("無")
    )
}

/// 取出文本中第一个 `{` 到最后一个 `}` 之间的内容
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// 解析模型输出：优先整体解析，失败时截取其中的 JSON 对象
pub fn parse_generated(text: &str) -> Result<GeneratedWish> {
    let malformed = || BiMarketError::ai_parse("AI 回傳資料格式不正確");

    let payload: Value = serde_json::from_str(text.trim())
        .ok()
        .or_else(|| extract_json_object(text).and_then(|s| serde_json::from_str(s).ok()))
        .ok_or_else(malformed)?;

    let expected_price = match &payload["expectedPrice"] {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f.trunc() as i64),
        _ => None,
    }
    .ok_or_else(malformed)?;

    let description = payload["description"]
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(malformed)?
        .to_string();

    Ok(GeneratedWish {
        expected_price,
        description,
    })
}

pub struct AiService {
    generator: Option<Arc<dyn WishGenerator>>,
}

impl AiService {
    pub fn new(generator: Option<Arc<dyn WishGenerator>>) -> Self {
        Self { generator }
    }

    /// 按配置创建；没有 API key 时生成接口返回 CONFIG_ERROR
    pub fn from_config(config: &AiConfig) -> Self {
        let generator = config
            .gemini_api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .map(|key| {
                Arc::new(GeminiGenerator::new(
                    key.trim(),
                    config.api_url.clone(),
                    Duration::from_secs(config.timeout_secs),
                )) as Arc<dyn WishGenerator>
            });
        Self::new(generator)
    }

    pub fn is_configured(&self) -> bool {
        self.generator.is_some()
    }

    pub async fn generate(&self, req: &GenerateWishRequest) -> Result<GeneratedWish> {
        let (Some(name), Some(category), Some(region)) = (
            non_blank(&req.name),
            category_text(&req.category_id),
            non_blank(&req.region),
        ) else {
            return Err(BiMarketError::validation("缺少必要欄位：商品名稱、類別、地區"));
        };

        let generator = self
            .generator
            .as_ref()
            .ok_or_else(|| BiMarketError::ai_config("缺少 GEMINI_API_KEY"))?;

        let prompt = build_prompt(name, &category, region, non_blank(&req.additional_info));
        let text = generator.generate(&prompt).await?;
        debug!("{} returned {} chars", generator.name(), text.len());

        parse_generated(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedGenerator(&'static str);

    #[async_trait]
    impl WishGenerator for FixedGenerator {
        async fn generate(&self, prompt: &str) -> Result<String> {
            assert!(prompt.contains("商品名稱"));
            Ok(self.0.to_string())
        }

        fn name(&self) -> &'static str {
            "Fixed"
        }
    }

    fn request() -> GenerateWishRequest {
        GenerateWishRequest {
            name: Some("降噪耳機".into()),
            category_id: Some(json!(1)),
            region: Some("日本".into()),
            additional_info: None,
        }
    }

    #[test]
    fn test_parse_plain_json() {
        let wish = parse_generated(r#"{"expectedPrice": 8990, "description": "熱門款式"}"#).unwrap();
        assert_eq!(wish.expected_price, 8990);
        assert_eq!(wish.description, "熱門款式");
    }

    #[test]
    fn test_parse_fenced_json() {
        let text = "```json\n{\"expectedPrice\": \"1200.7\", \"description\": \" 好用 \"}\n```";
        let wish = parse_generated(text).unwrap();
        assert_eq!(wish.expected_price, 1200);
        assert_eq!(wish.description, "好用");
    }

    #[test]
    fn test_parse_rejects_missing_fields() {
        assert!(parse_generated("沒有 JSON").is_err());
        assert!(parse_generated(r#"{"expectedPrice": 10}"#).is_err());
        assert!(parse_generated(r#"{"expectedPrice": "abc", "description": "x"}"#).is_err());
    }

    #[tokio::test]
    async fn test_generate_with_fixed_generator() {
        let service = AiService::new(Some(Arc::new(FixedGenerator(
            r#"{"expectedPrice": 500, "description": "描述"}"#,
        ))));
        let wish = service.generate(&request()).await.unwrap();
        assert_eq!(wish.expected_price, 500);
    }

    #[tokio::test]
    async fn test_generate_requires_fields_and_key() {
        let service = AiService::new(None);
        let mut req = request();
        req.region = Some("  ".into());
        let err = service.generate(&req).await.unwrap_err();
        assert_eq!(err.code(), BiMarketError::validation("").code());

        let err = service.generate(&request()).await.unwrap_err();
        assert_eq!(err.code(), BiMarketError::ai_config("").code());
    }
    #[tokio::test]
    async fn test_unreachable_upstream_is_bad_gateway() {
        let generator = GeminiGenerator::new(
            "test-key",
            "http://127.0.0.1:1/v1beta/models/gemini:generateContent",
            Duration::from_secs(5),
        );
        let err = generator.generate("商品名稱: 測試").await.unwrap_err();
        assert_eq!(err.http_status(), actix_web::http::StatusCode::BAD_GATEWAY);
    }
}
