//! 生成服务抽象
//!
//! 所有后端（OpenAI 兼容 / Gemini / Mock）实现 LlmClient：输入一段完整 prompt，返回生成文本。
//! 返回空串或纯空白是合法结果，由调用方决定如何处理。

use std::time::Duration;

use async_trait::async_trait;

use crate::core::LlmError;

/// 生成服务 trait
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;

    /// 模型标识，仅用于日志
    fn model(&self) -> &str {
        "unknown"
    }
}

/// 带超时调用；`timeout_secs == 0` 表示不设超时
pub async fn complete_with_timeout(
    llm: &dyn LlmClient,
    prompt: &str,
    timeout_secs: u64,
) -> Result<String, LlmError> {
    if timeout_secs == 0 {
        return llm.complete(prompt).await;
    }
    match tokio::time::timeout(Duration::from_secs(timeout_secs), llm.complete(prompt)).await {
        Ok(result) => result,
        Err(_) => Err(LlmError::Timeout(timeout_secs)),
    }
}
