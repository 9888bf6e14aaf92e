//! Gemini API 客户端（OpenAI 兼容格式）
//!
//! Gemini 提供 OpenAI 兼容接口。
//! - Base URL: https://generativelanguage.googleapis.com/v1beta/openai/
//! - 默认模型: gemini-1.5-flash

use crate::core::LlmError;
use crate::llm::OpenAiClient;

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai/";
pub const GEMINI_FLASH: &str = "gemini-1.5-flash";

/// 创建 Gemini 客户端
///
/// - `api_key` 为空时报错（启动期致命）
/// - `base_url` 未设置时使用官方兼容端点
pub fn create_gemini_client(
    api_key: &str,
    model: Option<&str>,
    base_url: Option<&str>,
) -> Result<OpenAiClient, LlmError> {
    if api_key.trim().is_empty() {
        return Err(LlmError::Config("GEMINI_API_KEY is not set".to_string()));
    }
    let model = model.filter(|m| !m.is_empty()).unwrap_or(GEMINI_FLASH);
    let base_url = base_url.filter(|u| !u.is_empty()).unwrap_or(GEMINI_BASE_URL);

    Ok(OpenAiClient::new(Some(base_url), model, api_key))
}
