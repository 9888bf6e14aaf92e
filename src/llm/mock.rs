//! Mock 生成客户端（用于测试，无需 API）
//!
//! 按顺序返回预置结果；预置用完后回显 prompt 中最后一行 `User:` 的内容。所有 prompt 都会被记录。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::core::LlmError;
use crate::llm::LlmClient;

#[derive(Debug, Default)]
pub struct MockLlmClient {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    prompts: Mutex<Vec<String>>,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reply(self, reply: impl Into<String>) -> Self {
        lock(&self.replies).push_back(Ok(reply.into()));
        self
    }

    pub fn with_error(self, err: LlmError) -> Self {
        lock(&self.replies).push_back(Err(err));
        self
    }

    /// 已收到的全部 prompt
    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

#[async_trait]
impl LlmClient for MockLlmClient {
    fn model(&self) -> &str {
        "mock"
    }

    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        lock(&self.prompts).push(prompt.to_string());

        if let Some(reply) = lock(&self.replies).pop_front() {
            return reply;
        }

        let last_user = prompt
            .lines()
            .rev()
            .find_map(|l| l.strip_prefix("User: "))
            .unwrap_or("(no input)");
        Ok(format!("Echo from Mock: {last_user}"))
    }
}
