//! Prompt 编译
//!
//! 纯函数：人设 + 对话历史 + 最近 3 份 OCR 摘要 + 固定指令 + 本轮输入 -> 一整段 prompt。
//! 同样的输入永远得到同样的输出（时间戳统一按 UTC 渲染）。

use crate::memory::{ChatState, OcrDoc, Role};

/// 知识区最多列出的 OCR 文档数
const KNOWLEDGE_DOCS: usize = 3;
/// 知识区单份摘要的默认长度
pub const DEFAULT_SUMMARY_LIMIT: usize = 600;
pub const DEFAULT_PERSONA_NAME: &str = "Yura";
/// 指令中使用的全名
pub const DEFAULT_PERSONA_FULL_NAME: &str = "Yura Naomi";

const ELLIPSIS: char = '…';
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

pub const DEFAULT_PERSONA: &str = "\
Kamu adalah \"Yura Naomi\", adik ceria maskot Gachaverse.
Gaya: hangat, semangat, helpful, sopan, satu kaomoji ringan saat pas (mis. (˶ᵔ ᵕ ᵔ˶)).
Aturan:
- Gunakan format WhatsApp: *tebal*, _miring_, ~coret~, blok kode dengan tiga backtick.
- Hindari **double asterisk**. Untuk judul, gunakan huruf tebal Unicode (tanpa bintang).
- Jawab ringkas, jelas; boleh poin/nomor bila cocok.
- Jika merujuk teks OCR, sebut \"dari gambar sebelumnya\" atau pakai ID OCR.
- Jangan mengarang; bila ragu, minta klarifikasi singkat.
- Variasikan pembuka/penutup agar tidak monoton.";

/// 折叠空白并按字符截断，截断时追加省略号
pub fn summarize(text: &str, limit: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= limit {
        return collapsed;
    }
    let mut out: String = collapsed.chars().take(limit).collect();
    out.push(ELLIPSIS);
    out
}

#[derive(Debug, Clone)]
pub struct PromptCompiler {
    persona: String,
    /// 对话标签（`Yura:`）
    name: String,
    /// 指令 `Jawab sebagai "..."` 中的全名
    full_name: String,
    summary_limit: usize,
}

impl Default for PromptCompiler {
    fn default() -> Self {
        Self::new(DEFAULT_PERSONA, DEFAULT_PERSONA_NAME, DEFAULT_SUMMARY_LIMIT)
            .with_full_name(DEFAULT_PERSONA_FULL_NAME)
    }
}

impl PromptCompiler {
    /// 全名默认与 `name` 相同
    pub fn new(persona: impl Into<String>, name: impl Into<String>, summary_limit: usize) -> Self {
        let name = name.into();
        Self {
            persona: persona.into(),
            full_name: name.clone(),
            name,
            summary_limit,
        }
    }

    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = full_name.into();
        self
    }

    pub fn persona_name(&self) -> &str {
        &self.name
    }

    pub fn compile(&self, state: &ChatState, user_turn: &str) -> String {
        let convo = state
            .history()
            .map(|m| format!("{}: {}", self.role_label(m.role), m.content))
            .collect::<Vec<_>>()
            .join("\n");
        let convo = if convo.is_empty() {
            "(Belum ada riwayat)".to_string()
        } else {
            convo
        };

        let knowledge = self.render_knowledge(state);
        let turn = if user_turn.is_empty() {
            String::new()
        } else {
            format!("\nUser: {user_turn}")
        };

        format!(
            "{persona}\n\n\
             [Riwayat Percakapan]\n\
             {convo}\n\
             {knowledge}\n\n\
             Instruksi:\n\
             - Jawab sebagai \"{full_name}\".\n\
             - Jika pertanyaan merujuk \"tadi\"/gambar/OCR, gunakan ringkasan di [Pengetahuan dari OCR Terakhir].\n\
             - Hindari output terlalu panjang.\n\n\
             {turn}\n\
             {name}:",
            persona = self.persona,
            name = self.name,
            full_name = self.full_name,
        )
        .trim()
        .to_string()
    }

    fn role_label(&self, role: Role) -> &str {
        match role {
            Role::User => "User",
            Role::Assistant => &self.name,
        }
    }

    /// 最近 3 份文档，旧的在前
    fn render_knowledge(&self, state: &ChatState) -> String {
        if state.ocr_docs_len() == 0 {
            return String::new();
        }
        let skip = state.ocr_docs_len().saturating_sub(KNOWLEDGE_DOCS);
        let entries = state
            .ocr_docs()
            .skip(skip)
            .map(|d| self.render_doc(d))
            .collect::<Vec<_>>()
            .join("\n");
        format!("\n\n[Pengetahuan dari OCR Terakhir]\n{entries}")
    }

    fn render_doc(&self, doc: &OcrDoc) -> String {
        format!(
            "- {} ({}): {}",
            doc.id,
            doc.timestamp.format(TIMESTAMP_FORMAT),
            summarize(&doc.text, self.summary_limit)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_summarize_collapses_and_truncates() {
        assert_eq!(summarize("  a \n\n b\tc ", 10), "a b c");
        assert_eq!(summarize("abcdef", 3), "abc…");
        assert_eq!(summarize("abc", 3), "abc");
        assert_eq!(summarize("ééééé", 2), "éé…");
    }

    #[test]
    fn test_empty_history_placeholder() {
        let compiler = PromptCompiler::default();
        let prompt = compiler.compile(&ChatState::new("c"), "halo");
        assert!(prompt.starts_with("Kamu adalah"));
        assert!(prompt.contains("(Belum ada riwayat)"));
        assert!(prompt.contains("\nUser: halo\nYura:"));
        assert!(prompt.ends_with("Yura:"));
        assert!(!prompt.contains("[Pengetahuan dari OCR Terakhir]\n"));
    }

    #[test]
    fn test_section_order() {
        let compiler = PromptCompiler::default();
        let mut state = ChatState::new("c");
        state.push_history(Role::User, "apa kabar");
        state.push_history(Role::Assistant, "baik!");
        state.add_doc("struk belanja");

        let prompt = compiler.compile(&state, "tadi apa?");
        let persona = prompt.find("Gachaverse").unwrap();
        let history = prompt.find("[Riwayat Percakapan]\nUser: apa kabar\nYura: baik!").unwrap();
        let knowledge = prompt.find("[Pengetahuan dari OCR Terakhir]\n- OCR-").unwrap();
        let instructions = prompt.find("Instruksi:").unwrap();
        let turn = prompt.find("User: tadi apa?").unwrap();
        assert!(persona < history);
        assert!(history < knowledge);
        assert!(knowledge < instructions);
        assert!(instructions < turn);
    }

    #[test]
    fn test_knowledge_lists_last_three_oldest_first() {
        let compiler = PromptCompiler::new("P", "Yura", 600);
        let mut state = ChatState::new("c");
        let base = Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap();
        let ids: Vec<String> = (0..4)
            .map(|i| state.add_doc_at(format!("dok {i}"), base + chrono::Duration::seconds(i)))
            .collect();

        let prompt = compiler.compile(&state, "");
        assert!(!prompt.contains(&ids[0]));
        let p1 = prompt.find(&ids[1]).unwrap();
        let p2 = prompt.find(&ids[2]).unwrap();
        let p3 = prompt.find(&ids[3]).unwrap();
        assert!(p1 < p2 && p2 < p3);
        assert!(prompt.contains(&format!("- {} (2024-05-01 08:30:01 UTC): dok 1", ids[1])));
    }

    #[test]
    fn test_knowledge_summary_limit() {
        let compiler = PromptCompiler::new("P", "Yura", 5);
        let mut state = ChatState::new("c");
        state.add_doc("abcdefghij");
        let prompt = compiler.compile(&state, "");
        assert!(prompt.contains("): abcde…"));
    }

    #[test]
    fn test_deterministic() {
        let compiler = PromptCompiler::default();
        let mut state = ChatState::new("c");
        state.push_history(Role::User, "x");
        state.add_doc("teks gambar");
        assert_eq!(compiler.compile(&state, "y"), compiler.compile(&state, "y"));
    }

    #[test]
    fn test_instruction_uses_full_name() {
        let prompt = PromptCompiler::default().compile(&ChatState::new("c"), "halo");
        assert!(prompt.contains("- Jawab sebagai \"Yura Naomi\"."));
        assert!(prompt.ends_with("\nYura:"));

        let custom = PromptCompiler::new("P", "Naomi", 600).compile(&ChatState::new("c"), "");
        assert!(custom.contains("- Jawab sebagai \"Naomi\"."));
    }

    #[test]
    fn test_no_turn_when_empty() {
        let compiler = PromptCompiler::new("P", "Yura", 600);
        let prompt = compiler.compile(&ChatState::new("c"), "");
        assert!(!prompt.contains("\nUser:"));
        assert!(prompt.ends_with("Yura:"));
    }
}
