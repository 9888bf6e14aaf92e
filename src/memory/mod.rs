//! 记忆层：每个聊天的短期对话历史与 OCR 知识库（仅内存）

pub mod conversation;
pub mod store;

pub use conversation::{ChatState, Message, OcrDoc, Role, MAX_HISTORY_ITEMS, MAX_OCR_DOCS};
pub use store::{ChatHandle, ChatStore};
