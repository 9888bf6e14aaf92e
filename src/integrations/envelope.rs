//! WhatsApp 消息信封
//!
//! 桥接进程推送的入站事件（`messages.upsert` 中的单条消息），字段名与 JSON 保持 camelCase。
//! 临时消息、一次性查看、编辑、带说明文档这几类包装会把真正的内容嵌在 `message` 里，
//! `unwrap_message` 负责剥到最内层。

use serde::{Deserialize, Serialize};

/// 剥包装的最大层数
const MAX_UNWRAP_DEPTH: usize = 8;

/// 入站事件
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InboundEvent {
    pub key: MessageKey,
    pub message: Option<MessageContent>,
    pub push_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MessageKey {
    pub remote_jid: String,
    pub from_me: bool,
    /// 群聊中的实际发送者
    pub participant: Option<String>,
    pub id: Option<String>,
}

/// 消息内容
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MessageContent {
    pub conversation: Option<String>,
    pub extended_text_message: Option<ExtendedTextMessage>,
    pub image_message: Option<ImageMessage>,

    pub ephemeral_message: Option<Box<WrappedMessage>>,
    pub view_once_message: Option<Box<WrappedMessage>>,
    pub view_once_message_v2: Option<Box<WrappedMessage>>,
    pub edited_message: Option<Box<WrappedMessage>>,
    pub document_with_caption_message: Option<Box<WrappedMessage>>,

    pub context_info: Option<ContextInfo>,
}

/// 包装层：内容在 `message` 字段里
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WrappedMessage {
    pub message: Option<MessageContent>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtendedTextMessage {
    pub text: Option<String>,
    pub context_info: Option<ContextInfo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageMessage {
    pub caption: Option<String>,
    pub mimetype: Option<String>,
    pub context_info: Option<ContextInfo>,
}

/// 上下文元数据：被 @ 的成员、被回复消息的发送者
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContextInfo {
    pub mentioned_jid: Vec<String>,
    pub participant: Option<String>,
    pub stanza_id: Option<String>,
}

impl MessageContent {
    /// 按优先级返回第一个带内层消息的包装
    fn wrapped_inner(&self) -> Option<&MessageContent> {
        [
            &self.ephemeral_message,
            &self.view_once_message_v2,
            &self.view_once_message,
            &self.edited_message,
            &self.document_with_caption_message,
        ]
        .into_iter()
        .find_map(|w| w.as_deref().and_then(|w| w.message.as_ref()))
    }

    /// 文本 / 扩展文本 / 图片说明，按此顺序取第一个
    pub fn text(&self) -> Option<&str> {
        self.conversation
            .as_deref()
            .or_else(|| {
                self.extended_text_message
                    .as_ref()
                    .and_then(|m| m.text.as_deref())
            })
            .or_else(|| self.image_message.as_ref().and_then(|m| m.caption.as_deref()))
    }

    pub fn has_image(&self) -> bool {
        self.image_message.is_some()
    }

    /// 扩展文本、图片、顶层，按此顺序取第一个存在的 contextInfo
    pub fn context_info(&self) -> Option<&ContextInfo> {
        self.extended_text_message
            .as_ref()
            .and_then(|m| m.context_info.as_ref())
            .or_else(|| self.image_message.as_ref().and_then(|m| m.context_info.as_ref()))
            .or(self.context_info.as_ref())
    }
}

/// 剥掉所有已知包装直到不再匹配，返回最内层内容；没有包装时原样返回
pub fn unwrap_message(message: &MessageContent) -> &MessageContent {
    let mut inner = message;
    for _ in 0..MAX_UNWRAP_DEPTH {
        match inner.wrapped_inner() {
            Some(next) => inner = next,
            None => break,
        }
    }
    inner
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_message(text: &str) -> MessageContent {
        MessageContent {
            conversation: Some(text.to_string()),
            ..Default::default()
        }
    }

    fn wrap(inner: MessageContent) -> Option<Box<WrappedMessage>> {
        Some(Box::new(WrappedMessage {
            message: Some(inner),
        }))
    }

    #[test]
    fn test_unwrap_plain_returns_same() {
        let msg = text_message("halo");
        let inner = unwrap_message(&msg);
        assert!(std::ptr::eq(inner, &msg));
    }

    #[test]
    fn test_unwrap_single_ephemeral() {
        let msg = MessageContent {
            ephemeral_message: wrap(text_message("halo")),
            ..Default::default()
        };
        assert_eq!(unwrap_message(&msg).text(), Some("halo"));
    }

    #[test]
    fn test_unwrap_nested_wrappers_reach_innermost() {
        let edited = MessageContent {
            edited_message: wrap(text_message("revisi")),
            ..Default::default()
        };
        let view_once = MessageContent {
            view_once_message_v2: wrap(edited),
            ..Default::default()
        };
        let msg = MessageContent {
            ephemeral_message: wrap(view_once),
            ..Default::default()
        };
        assert_eq!(unwrap_message(&msg).text(), Some("revisi"));
    }

    #[test]
    fn test_unwrap_wrapper_without_inner_stops() {
        let msg = MessageContent {
            ephemeral_message: Some(Box::new(WrappedMessage { message: None })),
            conversation: Some("outer".to_string()),
            ..Default::default()
        };
        assert_eq!(unwrap_message(&msg).text(), Some("outer"));
    }

    #[test]
    fn test_deserialize_bridge_event() {
        let raw = r#"{
            "key": {"remoteJid": "1203630@g.us", "fromMe": false, "participant": "628111:3@s.whatsapp.net"},
            "message": {
                "ephemeralMessage": {"message": {
                    "extendedTextMessage": {
                        "text": "@628999 halo",
                        "contextInfo": {"mentionedJid": ["628999@s.whatsapp.net"]}
                    }
                }}
            }
        }"#;
        let event: InboundEvent = serde_json::from_str(raw).unwrap();
        assert_eq!(event.key.remote_jid, "1203630@g.us");
        let inner = unwrap_message(event.message.as_ref().unwrap());
        assert_eq!(inner.text(), Some("@628999 halo"));
        assert_eq!(
            inner.context_info().unwrap().mentioned_jid,
            vec!["628999@s.whatsapp.net".to_string()]
        );
    }

    #[test]
    fn test_view_once_v2_field_name() {
        let raw = r#"{"viewOnceMessageV2": {"message": {"imageMessage": {"caption": "lihat"}}}}"#;
        let msg: MessageContent = serde_json::from_str(raw).unwrap();
        let inner = unwrap_message(&msg);
        assert!(inner.has_image());
        assert_eq!(inner.text(), Some("lihat"));
    }
}
