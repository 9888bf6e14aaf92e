//! 群聊闸门
//!
//! 私聊一律响应；群聊只在机器人被 @ 或消息是在回复机器人时响应，否则静默忽略。
//! `!fix` 维护命令由 owner 在群内发出时绕过闸门，直接执行。

use crate::integrations::envelope::ContextInfo;
use crate::integrations::jid::{digits_only, jid_local};

use super::message::NormalizedMessage;

/// 维护命令
pub const FIX_COMMAND: &str = "!fix";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MentionInfo {
    pub is_mentioned: bool,
    pub is_reply_to_agent: bool,
}

/// 从 contextInfo 判断是否 @ 了机器人 / 是否在回复机器人；`self_local` 为空时都为 false
pub fn mention_info(ctx: Option<&ContextInfo>, self_local: &str) -> MentionInfo {
    let Some(ctx) = ctx else {
        return MentionInfo::default();
    };
    if self_local.is_empty() {
        return MentionInfo::default();
    }
    MentionInfo {
        is_mentioned: ctx.mentioned_jid.iter().any(|j| jid_local(j) == self_local),
        is_reply_to_agent: ctx
            .participant
            .as_deref()
            .is_some_and(|p| jid_local(p) == self_local),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// 执行维护命令，不进入对话
    Maintenance,
    /// 进入对话，携带（去掉 @ 后的）用户文本
    Engage(String),
    Ignore,
}

#[derive(Debug, Clone)]
pub struct GroupGate {
    self_local: String,
    owner_local: String,
}

impl GroupGate {
    pub fn new(self_jid: &str, owner_local: &str) -> Self {
        Self {
            self_local: jid_local(self_jid).to_string(),
            owner_local: digits_only(owner_local),
        }
    }

    pub fn self_local(&self) -> &str {
        &self.self_local
    }

    fn is_maintenance(&self, msg: &NormalizedMessage) -> bool {
        msg.is_group
            && msg.text.eq_ignore_ascii_case(FIX_COMMAND)
            && !self.owner_local.is_empty()
            && msg.sender_local.ends_with(&self.owner_local)
    }

    pub fn decide(&self, msg: &NormalizedMessage) -> GateDecision {
        if self.is_maintenance(msg) {
            return GateDecision::Maintenance;
        }
        if !msg.is_group {
            return GateDecision::Engage(msg.text.clone());
        }
        if !msg.mention.is_mentioned && !msg.mention.is_reply_to_agent {
            return GateDecision::Ignore;
        }
        if msg.mention.is_mentioned {
            let token = format!("@{}", self.self_local);
            return GateDecision::Engage(msg.text.replacen(&token, "", 1).trim().to_string());
        }
        GateDecision::Engage(msg.text.clone())
    }
}
