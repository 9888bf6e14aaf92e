//! 错误分类器
//!
//! 把一轮对话的失败映射为 ErrorKind：会话协议类瞬时错误降级为 warn，其余按 error 记录。
//! 自由文本的子串匹配只在传输边界做一次（见 `is_transient_protocol_text`），之后全部走类型。

use crate::core::{ErrorKind, LlmError, TransportError, TurnError};

/// 已知的传输层瞬时错误标记（会话 / 密钥 / MAC）
const TRANSIENT_MARKERS: &[&str] = &[
    "prekey",
    "no session record",
    "no senderkeyrecord",
    "invalidmessageexception",
    "bad mac",
];

/// 判断一段错误描述是否属于会话协议类瞬时错误（大小写不敏感）
pub fn is_transient_protocol_text(description: &str) -> bool {
    let lower = description.to_lowercase();
    TRANSIENT_MARKERS.iter().any(|m| lower.contains(m))
}

/// 将 TurnError 映射为 ErrorKind 并按类别记录日志
#[derive(Debug, Default)]
pub struct ErrorClassifier;

impl ErrorClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, err: &TurnError) -> ErrorKind {
        match err {
            TurnError::Transport(TransportError::SessionProtocol(_)) => {
                ErrorKind::TransientProtocol
            }
            TurnError::Transport(_) => ErrorKind::Other,
            TurnError::Llm(LlmError::Timeout(_))
            | TurnError::Llm(LlmError::Request(_))
            | TurnError::Llm(LlmError::Config(_)) => ErrorKind::Other,
        }
    }

    /// 分类并记录；调用方随后统一发送兜底道歉
    pub fn report(&self, chat_id: &str, err: &TurnError) -> ErrorKind {
        let kind = self.classify(err);
        match kind {
            ErrorKind::TransientProtocol => {
                tracing::warn!(chat_id, "Signal transient error (suppressed)");
            }
            ErrorKind::Other => {
                tracing::error!(chat_id, error = ?err, "AI error: {}", err);
            }
        }
        kind
    }
}
