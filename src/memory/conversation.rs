//! 短期记忆：单个聊天的对话历史与 OCR 知识库
//!
//! 历史最多保留 20 条、OCR 文档最多 5 份，超出时丢弃最旧的（FIFO），幸存者保持原有顺序。

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

/// 对话历史容量
pub const MAX_HISTORY_ITEMS: usize = 20;
/// OCR 文档容量
pub const MAX_OCR_DOCS: usize = 5;

/// 消息角色
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// 单条历史消息
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

/// 从图片识别出的文本
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OcrDoc {
    /// `OCR-<unix 毫秒>`
    pub id: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// 每个聊天一份状态：对话历史 + OCR 知识库
#[derive(Clone, Debug)]
pub struct ChatState {
    pub chat_id: String,
    history: VecDeque<Message>,
    ocr_docs: VecDeque<OcrDoc>,
    /// 上一份文档的毫秒时间，保证同一聊天内 id 严格递增
    last_doc_millis: i64,
}

impl ChatState {
    pub fn new(chat_id: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            history: VecDeque::with_capacity(MAX_HISTORY_ITEMS + 1),
            ocr_docs: VecDeque::with_capacity(MAX_OCR_DOCS + 1),
            last_doc_millis: 0,
        }
    }

    pub fn push_history(&mut self, role: Role, content: impl Into<String>) {
        self.history.push_back(Message {
            role,
            content: content.into(),
        });
        while self.history.len() > MAX_HISTORY_ITEMS {
            self.history.pop_front();
        }
    }

    /// 追加一份 OCR 文档并返回其 id
    pub fn add_doc(&mut self, text: impl Into<String>) -> String {
        self.add_doc_at(text, Utc::now())
    }

    pub(crate) fn add_doc_at(&mut self, text: impl Into<String>, now: DateTime<Utc>) -> String {
        let millis = now.timestamp_millis().max(self.last_doc_millis + 1);
        self.last_doc_millis = millis;
        let timestamp = DateTime::<Utc>::from_timestamp_millis(millis).unwrap_or(now);

        let id = format!("OCR-{millis}");
        self.ocr_docs.push_back(OcrDoc {
            id: id.clone(),
            text: text.into(),
            timestamp,
        });
        while self.ocr_docs.len() > MAX_OCR_DOCS {
            self.ocr_docs.pop_front();
        }
        id
    }

    pub fn history(&self) -> impl ExactSizeIterator<Item = &Message> + DoubleEndedIterator {
        self.history.iter()
    }

    pub fn ocr_docs(&self) -> impl ExactSizeIterator<Item = &OcrDoc> + DoubleEndedIterator {
        self.ocr_docs.iter()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn ocr_docs_len(&self) -> usize {
        self.ocr_docs.len()
    }
}
