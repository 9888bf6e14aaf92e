//! 聊天状态存储
//!
//! chat_id -> ChatState 的进程内映射。每个聊天一把异步互斥锁：
//! 管线在一轮对话内持有该锁，同一聊天的并发事件因此按顺序处理，不同聊天互不阻塞。
//! 无持久化，进程重启即丢失。

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use super::conversation::ChatState;

/// 单个聊天状态的共享句柄
pub type ChatHandle = Arc<Mutex<ChatState>>;

#[derive(Debug, Default)]
pub struct ChatStore {
    chats: RwLock<HashMap<String, ChatHandle>>,
}

impl ChatStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取或创建聊天状态（幂等）
    pub async fn ensure(&self, chat_id: &str) -> ChatHandle {
        if let Some(handle) = self.chats.read().await.get(chat_id) {
            return Arc::clone(handle);
        }
        let mut chats = self.chats.write().await;
        Arc::clone(
            chats
                .entry(chat_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(ChatState::new(chat_id)))),
        )
    }

    /// 已知聊天数
    pub async fn len(&self) -> usize {
        self.chats.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.chats.read().await.is_empty()
    }

    /// 当前状态的拷贝（诊断 / 测试用）；不存在时不会创建
    pub async fn snapshot(&self, chat_id: &str) -> Option<ChatState> {
        let handle = self.chats.read().await.get(chat_id).cloned()?;
        let state = handle.lock().await;
        Some(state.clone())
    }
}
