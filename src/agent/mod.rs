//! 对话管线
//!
//! 单条入站事件的完整处理：归一化 -> 群聊闸门 -> 图片 OCR / 写入历史 -> 编译 prompt
//! -> 调用生成服务 -> WhatsApp 严格格式化 -> 发送 -> 写入回复。
//! 生成服务、识别器、传输都以 trait 对象注入，测试时替换为 Mock。
//!
//! 同一聊天的处理在该聊天的状态锁内完成，并发到达的事件按顺序执行。

pub mod gate;
pub mod maintenance;
pub mod message;
pub mod prompt;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use tokio::fs;

use crate::core::{ErrorClassifier, ErrorKind, OcrError, TurnError};
use crate::format::format_for_whatsapp;
use crate::integrations::envelope::InboundEvent;
use crate::integrations::jid::jid_local;
use crate::integrations::transport::{ChatTransport, Presence};
use crate::llm::{complete_with_timeout, LlmClient};
use crate::memory::{ChatState, ChatStore, Role};
use crate::ocr::{recognize_with_timeout, TextRecognizer};

pub use gate::{GateDecision, GroupGate, MentionInfo, FIX_COMMAND};
pub use message::NormalizedMessage;
pub use prompt::{summarize, PromptCompiler};

/// 写入历史时 OCR 文本的摘要长度
const HISTORY_SUMMARY_LIMIT: usize = 800;

pub const BLURRY_IMAGE_REPLY: &str =
    "⚠️ Gambarnya agak blur, OCR belum bisa baca. Coba foto lebih terang & tegak lurus ya.";
pub const IMAGE_FAILED_REPLY: &str = "⚠️ Gagal membaca gambar. Coba kirim ulang ya.";
pub const EMPTY_REPLY: &str = "⚠️ Aku belum menerima balasan. Boleh ulangi pesannya ya?";
pub const APOLOGY_REPLY: &str =
    "❌ Aduh, ada sedikit kendala saat menghubungi AI. Coba lagi beberapa saat ya.";

/// 管线运行参数（由配置层解析后传入）
#[derive(Debug, Clone)]
pub struct AgentSettings {
    /// owner 号码（任意格式，内部只保留数字）；为空时禁用维护命令
    pub owner_local: String,
    /// 会话密钥目录
    pub auth_dir: PathBuf,
    /// 图片下载目录
    pub download_dir: PathBuf,
    pub ocr_lang: String,
    /// OCR 结果至少要有这么多非空白字符
    pub ocr_min_chars: usize,
    pub ocr_timeout_secs: u64,
    pub llm_timeout_secs: u64,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            owner_local: String::new(),
            auth_dir: PathBuf::from("auth"),
            download_dir: PathBuf::from("download"),
            ocr_lang: "eng+ind".to_string(),
            ocr_min_chars: 8,
            ocr_timeout_secs: 60,
            llm_timeout_secs: 60,
        }
    }
}

/// 单条事件的处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// 无内容 / 自己发出 / 既无文本也无图片
    Skipped,
    /// 群聊中未被 @ 也不是回复机器人
    Ignored,
    Maintenance { removed: usize },
    Replied(String),
    BlurryImage,
    ImageFailed,
    /// 生成服务返回空文本，已请用户重发
    EmptyReply,
    Failed(ErrorKind),
}

pub struct ChatAgent {
    transport: Arc<dyn ChatTransport>,
    llm: Arc<dyn LlmClient>,
    ocr: Arc<dyn TextRecognizer>,
    store: ChatStore,
    gate: GroupGate,
    compiler: PromptCompiler,
    classifier: ErrorClassifier,
    settings: AgentSettings,
}

impl ChatAgent {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        llm: Arc<dyn LlmClient>,
        ocr: Arc<dyn TextRecognizer>,
        compiler: PromptCompiler,
        settings: AgentSettings,
    ) -> Self {
        let gate = GroupGate::new(transport.self_jid(), &settings.owner_local);
        Self {
            transport,
            llm,
            ocr,
            store: ChatStore::new(),
            gate,
            compiler,
            classifier: ErrorClassifier::new(),
            settings,
        }
    }

    pub fn store(&self) -> &ChatStore {
        &self.store
    }

    /// 处理一条入站事件；所有错误都在内部消化，只返回结果分类
    pub async fn handle(&self, event: &InboundEvent) -> TurnOutcome {
        let Some(msg) = NormalizedMessage::from_event(event, self.gate.self_local()) else {
            return TurnOutcome::Skipped;
        };

        let text = match self.gate.decide(&msg) {
            GateDecision::Maintenance => return self.run_maintenance(&msg, event).await,
            GateDecision::Ignore => {
                tracing::trace!(chat_id = %msg.chat_id, "Group message not addressed to us");
                return TurnOutcome::Ignored;
            }
            GateDecision::Engage(text) => text,
        };

        if !msg.has_image && text.is_empty() {
            return TurnOutcome::Skipped;
        }

        let handle = self.store.ensure(&msg.chat_id).await;
        let mut state = handle.lock().await;

        if msg.has_image {
            if let Some(outcome) = self.ingest_image(&mut state, &msg, &text, event).await {
                return outcome;
            }
        } else {
            state.push_history(Role::User, text.as_str());
        }

        self.presence(&msg.chat_id, Presence::Composing).await;
        let outcome = self.reply(&mut state, &text, event).await;
        self.presence(&msg.chat_id, Presence::Paused).await;
        outcome
    }

    async fn run_maintenance(&self, msg: &NormalizedMessage, event: &InboundEvent) -> TurnOutcome {
        let removed = maintenance::reset_sender_keys(&self.settings.auth_dir, &msg.chat_id).await;
        self.send_quiet(&msg.chat_id, &maintenance::reset_reply(removed), event)
            .await;
        TurnOutcome::Maintenance { removed }
    }

    /// 下载 + 识别图片并写入状态；图片不可用时回复警告并返回结果，成功时返回 None
    async fn ingest_image(
        &self,
        state: &mut ChatState,
        msg: &NormalizedMessage,
        caption: &str,
        event: &InboundEvent,
    ) -> Option<TurnOutcome> {
        let ocr_text = match self.read_image(event).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(chat_id = %msg.chat_id, error = %e, "OCR error");
                self.send_quiet(&msg.chat_id, IMAGE_FAILED_REPLY, event).await;
                return Some(TurnOutcome::ImageFailed);
            }
        };

        let meaningful = ocr_text.chars().filter(|c| !c.is_whitespace()).count();
        if meaningful < self.settings.ocr_min_chars {
            tracing::warn!(chat_id = %msg.chat_id, "OCR too short/unclear; skipped AI turn");
            self.send_quiet(&msg.chat_id, BLURRY_IMAGE_REPLY, event).await;
            return Some(TurnOutcome::BlurryImage);
        }

        let id = state.add_doc(ocr_text.as_str());
        let extracted = format!(
            "[Teks dari {id}]:\n{}",
            summarize(&ocr_text, HISTORY_SUMMARY_LIMIT)
        );
        let entry = if caption.is_empty() {
            extracted
        } else {
            format!("{caption}\n\n{extracted}")
        };
        state.push_history(Role::User, entry);
        tracing::info!(chat_id = %msg.chat_id, doc = %id, "OCR text stored");
        None
    }

    async fn read_image(&self, event: &InboundEvent) -> Result<String, OcrError> {
        let bytes = self.transport.download_media(event).await?;

        let dir = &self.settings.download_dir;
        fs::create_dir_all(dir).await?;
        let path = dir.join(download_file_name(event, Utc::now().timestamp_millis()));
        fs::write(&path, bytes).await?;

        let result = recognize_with_timeout(
            self.ocr.as_ref(),
            &path,
            &self.settings.ocr_lang,
            self.settings.ocr_timeout_secs,
        )
        .await;
        if let Err(e) = fs::remove_file(&path).await {
            tracing::debug!(file = %path.display(), error = %e, "Failed to remove downloaded image");
        }
        Ok(result?.trim().to_string())
    }

    async fn reply(&self, state: &mut ChatState, user_turn: &str, event: &InboundEvent) -> TurnOutcome {
        let prompt = self.compiler.compile(state, user_turn);
        match self.generate_and_send(&state.chat_id, &prompt, event).await {
            Ok(Some(text)) => {
                state.push_history(Role::Assistant, text.as_str());
                TurnOutcome::Replied(text)
            }
            Ok(None) => TurnOutcome::EmptyReply,
            Err(e) => {
                let kind = self.classifier.report(&state.chat_id, &e);
                self.send_quiet(&state.chat_id, APOLOGY_REPLY, event).await;
                TurnOutcome::Failed(kind)
            }
        }
    }

    /// 成功发送时返回已发送的文本；生成结果为空时请用户重发并返回 None
    async fn generate_and_send(
        &self,
        chat_id: &str,
        prompt: &str,
        event: &InboundEvent,
    ) -> Result<Option<String>, TurnError> {
        let raw = complete_with_timeout(self.llm.as_ref(), prompt, self.settings.llm_timeout_secs)
            .await?;
        let text = format_for_whatsapp(raw.trim());

        if text.trim().is_empty() {
            tracing::warn!(chat_id, model = self.llm.model(), "Empty completion");
            self.transport.send_text(chat_id, EMPTY_REPLY, event).await?;
            return Ok(None);
        }

        self.transport.send_text(chat_id, &text, event).await?;
        Ok(Some(text))
    }

    /// 发送提示类消息，失败只记日志
    async fn send_quiet(&self, chat_id: &str, text: &str, event: &InboundEvent) {
        if let Err(e) = self.transport.send_text(chat_id, text, event).await {
            tracing::error!(chat_id, error = %e, "Failed to send WhatsApp message");
        }
    }

    async fn presence(&self, chat_id: &str, presence: Presence) {
        if let Err(e) = self.transport.set_presence(chat_id, presence).await {
            tracing::debug!(chat_id, ?presence, error = %e, "Presence update failed");
        }
    }
}

/// `<毫秒>-<聊天本地号>-<消息 id>.jpg`；不同聊天并行处理时不会写到同一文件
fn download_file_name(event: &InboundEvent, millis: i64) -> String {
    let tag: String = format!(
        "{}-{}",
        jid_local(&event.key.remote_jid),
        event.key.id.as_deref().unwrap_or("")
    )
    .chars()
    .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
    .collect();
    format!("{millis}-{tag}.jpg")
}
