//! Mock 传输（用于测试，无需桥接进程）
//!
//! 记录所有发出的消息与输入状态；可预置媒体字节和下一次发送的失败。

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::core::TransportError;
use crate::integrations::envelope::InboundEvent;
use crate::integrations::transport::{ChatTransport, Presence};

/// 一条已发送的消息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub chat_id: String,
    pub text: String,
    /// 被引用消息的 id
    pub quoted_id: Option<String>,
}

#[derive(Debug, Default)]
pub struct MockTransport {
    self_jid: String,
    sent: Mutex<Vec<SentMessage>>,
    presence: Mutex<Vec<(String, Presence)>>,
    media: Mutex<Option<Vec<u8>>>,
    chat_media: Mutex<HashMap<String, Vec<u8>>>,
    send_failures: Mutex<VecDeque<TransportError>>,
}

impl MockTransport {
    pub fn new(self_jid: impl Into<String>) -> Self {
        Self {
            self_jid: self_jid.into(),
            ..Default::default()
        }
    }

    /// 之后 download_media 返回这些字节；未设置时下载失败
    pub fn with_media(self, bytes: Vec<u8>) -> Self {
        *lock(&self.media) = Some(bytes);
        self
    }

    /// 该聊天的 download_media 返回这些字节，优先于 `with_media`
    pub fn with_chat_media(self, chat_id: impl Into<String>, bytes: Vec<u8>) -> Self {
        lock(&self.chat_media).insert(chat_id.into(), bytes);
        self
    }

    /// 让接下来的一次 send_text 失败
    pub fn fail_next_send(&self, err: TransportError) {
        lock(&self.send_failures).push_back(err);
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        lock(&self.sent).clone()
    }

    pub fn presence_updates(&self) -> Vec<(String, Presence)> {
        lock(&self.presence).clone()
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

#[async_trait]
impl ChatTransport for MockTransport {
    fn self_jid(&self) -> &str {
        &self.self_jid
    }

    async fn send_text(
        &self,
        chat_id: &str,
        text: &str,
        quoted: &InboundEvent,
    ) -> Result<(), TransportError> {
        if let Some(err) = lock(&self.send_failures).pop_front() {
            return Err(err);
        }
        lock(&self.sent).push(SentMessage {
            chat_id: chat_id.to_string(),
            text: text.to_string(),
            quoted_id: quoted.key.id.clone(),
        });
        Ok(())
    }

    async fn set_presence(
        &self,
        chat_id: &str,
        presence: Presence,
    ) -> Result<(), TransportError> {
        lock(&self.presence).push((chat_id.to_string(), presence));
        Ok(())
    }

    async fn download_media(&self, event: &InboundEvent) -> Result<Vec<u8>, TransportError> {
        if let Some(bytes) = lock(&self.chat_media).get(&event.key.remote_jid) {
            return Ok(bytes.clone());
        }
        lock(&self.media)
            .clone()
            .ok_or_else(|| TransportError::Request("no media available".to_string()))
    }
}
