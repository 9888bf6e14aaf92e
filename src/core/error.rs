//! 错误类型
//!
//! 生成服务（LlmError）、聊天传输（TransportError）、图片识别（OcrError）各自给出带类型的错误；
//! 一轮对话的失败统一为 TurnError，由 ErrorClassifier 映射为 ErrorKind 决定日志级别。

use thiserror::Error;

/// 失败类别：只影响运维侧日志，用户看到的兜底回复相同
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 传输层会话 / 密钥 / MAC 类瞬时错误，降级记录
    TransientProtocol,
    Other,
}

/// 生成服务调用错误
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Network timeout after {0}s")]
    Timeout(u64),

    #[error("LLM request failed: {0}")]
    Request(String),

    #[error("Config error: {0}")]
    Config(String),
}

/// 聊天传输（桥接进程）错误
#[derive(Error, Debug)]
pub enum TransportError {
    /// 会话 / SenderKey / MAC 类错误：重新协商后通常自愈
    #[error("Session protocol error: {0}")]
    SessionProtocol(String),

    #[error("Transport request failed: {0}")]
    Request(String),

    #[error("Transport returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

/// 下载或识别图片时的错误
#[derive(Error, Debug)]
pub enum OcrError {
    #[error("Media download failed: {0}")]
    Download(#[from] TransportError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Recognizer failed: {0}")]
    Engine(String),

    #[error("Recognizer timeout after {0}s")]
    Timeout(u64),
}

/// 生成 + 发送阶段的失败
#[derive(Error, Debug)]
pub enum TurnError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}
