//! 入站事件归一化：剥包装、取文本 / 说明、识别发送者与 @ / 回复信息

use crate::integrations::envelope::{unwrap_message, InboundEvent};
use crate::integrations::jid::{is_group_jid, jid_local};

use super::gate::{mention_info, MentionInfo};

/// 单个入站事件的归一化视图，不入库
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedMessage {
    pub chat_id: String,
    pub is_group: bool,
    /// 发送者本地号码（群聊取 participant，私聊取 remoteJid）
    pub sender_local: String,
    /// 已去首尾空白
    pub text: String,
    pub has_image: bool,
    /// 私聊恒为默认值
    pub mention: MentionInfo,
}

impl NormalizedMessage {
    /// 无内容或自己发出的消息返回 None
    pub fn from_event(event: &InboundEvent, self_local: &str) -> Option<Self> {
        if event.key.from_me {
            return None;
        }
        let raw = event.message.as_ref()?;
        let inner = unwrap_message(raw);

        let chat_id = event.key.remote_jid.clone();
        let is_group = is_group_jid(&chat_id);
        let sender = event
            .key
            .participant
            .as_deref()
            .unwrap_or(&event.key.remote_jid);

        let mention = if is_group {
            mention_info(inner.context_info(), self_local)
        } else {
            MentionInfo::default()
        };

        Some(Self {
            sender_local: jid_local(sender).to_string(),
            text: inner.text().unwrap_or("").trim().to_string(),
            has_image: inner.has_image(),
            chat_id,
            is_group,
            mention,
        })
    }
}
