//! 聊天传输抽象
//!
//! 管线只依赖这四个能力：自身 JID、发送文本（引用原消息）、输入状态、下载媒体。
//! 线上由 HttpBridge 实现，测试用 MockTransport。

use async_trait::async_trait;
use serde::Serialize;

use crate::core::TransportError;
use crate::integrations::envelope::InboundEvent;

/// 输入状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Presence {
    Composing,
    Paused,
}

#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// 机器人自己的 JID（用于判断 @ 与回复）
    fn self_jid(&self) -> &str;

    async fn send_text(
        &self,
        chat_id: &str,
        text: &str,
        quoted: &InboundEvent,
    ) -> Result<(), TransportError>;

    async fn set_presence(&self, chat_id: &str, presence: Presence)
        -> Result<(), TransportError>;

    async fn download_media(&self, event: &InboundEvent) -> Result<Vec<u8>, TransportError>;
}
