//! WhatsApp 严格格式化
//!
//! WhatsApp 只认单符号强调：`*粗体*`、`_斜体_`、`~删除线~`。模型常输出 Markdown 的双符号与 `#` 标题，这里统一改写：
//! - 代码块（三个反引号之间）原样保留，不解析；
//! - 整行 `**标题**` / `__标题__` / `# 标题` 改为 Unicode 粗体字形，不留任何符号；
//! - 其余行内 `**x**` -> `*x*`，`__x__` -> `_x_`，`~~x~~` -> `~x~`，并去掉行尾空白。

use std::sync::OnceLock;

use regex::Regex;

const FENCE: &str = "```";

static BOLD_RE: OnceLock<Regex> = OnceLock::new();
static ITALIC_RE: OnceLock<Regex> = OnceLock::new();
static STRIKE_RE: OnceLock<Regex> = OnceLock::new();

/// 改写为 WhatsApp 可渲染的文本；代码段逐字节保留，段数不变
pub fn format_for_whatsapp(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    text.split(FENCE)
        .enumerate()
        .map(|(i, seg)| {
            if i % 2 == 0 {
                format_prose(seg)
            } else {
                seg.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(FENCE)
}

fn format_prose(segment: &str) -> String {
    segment
        .split('\n')
        .map(format_line)
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_line(line: &str) -> String {
    if let Some(title) = heading_text(line.trim()) {
        return to_unicode_bold(title);
    }

    let bold = BOLD_RE.get_or_init(|| Regex::new(r"\*\*(.+?)\*\*").unwrap());
    let italic = ITALIC_RE.get_or_init(|| Regex::new(r"__(.+?)__").unwrap());
    let strike = STRIKE_RE.get_or_init(|| Regex::new(r"~~(.+?)~~").unwrap());

    let out = bold.replace_all(line, "*$1*");
    let out = italic.replace_all(&out, "_${1}_");
    let out = strike.replace_all(&out, "~$1~");
    out.trim_end_matches([' ', '\t']).to_string()
}

/// 整行标题的正文；不是标题时返回 None
fn heading_text(trimmed: &str) -> Option<&str> {
    if let Some(inner) = wrapped_in(trimmed, "**").or_else(|| wrapped_in(trimmed, "__")) {
        return Some(inner);
    }

    let hashes = trimmed.chars().take_while(|&c| c == '#').count();
    if !(1..=6).contains(&hashes) {
        return None;
    }
    let rest = &trimmed[hashes..];
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let inner = rest.trim();
    let inner = wrapped_in(inner, "**")
        .or_else(|| wrapped_in(inner, "__"))
        .unwrap_or(inner);
    (!inner.is_empty()).then_some(inner)
}

/// `s` 恰好被一对 `delim` 包住且内部不再出现 `delim` 时返回去掉首尾空白的内部文本
fn wrapped_in<'a>(s: &'a str, delim: &str) -> Option<&'a str> {
    let inner = s.strip_prefix(delim)?.strip_suffix(delim)?;
    if inner.contains(delim) {
        return None;
    }
    let inner = inner.trim();
    (!inner.is_empty()).then_some(inner)
}

/// A-Z / a-z / 0-9 替换为数学粗体字形，其余字符原样
pub fn to_unicode_bold(s: &str) -> String {
    s.chars().map(bold_char).collect()
}

fn bold_char(c: char) -> char {
    let mapped = match c {
        'A'..='Z' => 0x1D400 + (c as u32 - 'A' as u32),
        'a'..='z' => 0x1D41A + (c as u32 - 'a' as u32),
        '0'..='9' => 0x1D7CE + (c as u32 - '0' as u32),
        _ => return c,
    };
    char::from_u32(mapped).unwrap_or(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bold_glyphs() {
        assert_eq!(to_unicode_bold("Az9"), "𝐀𝐳𝟗");
        assert_eq!(to_unicode_bold("Title"), "𝐓𝐢𝐭𝐥𝐞");
        assert_eq!(to_unicode_bold("é-!"), "é-!");
    }

    #[test]
    fn test_full_line_bold_becomes_heading() {
        let out = format_for_whatsapp("**Title**");
        assert_eq!(out, to_unicode_bold("Title"));
        assert!(!out.contains('*'));
    }

    #[test]
    fn test_underscore_and_hash_headings() {
        assert_eq!(format_for_whatsapp("__Menu__"), to_unicode_bold("Menu"));
        assert_eq!(format_for_whatsapp("## Langkah 1  "), to_unicode_bold("Langkah 1"));
        assert_eq!(format_for_whatsapp("### **Catatan**"), to_unicode_bold("Catatan"));
    }

    #[test]
    fn test_hash_without_space_is_not_heading() {
        assert_eq!(format_for_whatsapp("#hashtag"), "#hashtag");
        assert_eq!(format_for_whatsapp("####### terlalu"), "####### terlalu");
    }

    #[test]
    fn test_inline_bold_rewritten() {
        assert_eq!(format_for_whatsapp("**bold** text"), "*bold* text");
    }

    #[test]
    fn test_two_bold_spans_on_one_line_are_inline() {
        assert_eq!(format_for_whatsapp("**a** dan **b**"), "*a* dan *b*");
    }

    #[test]
    fn test_italic_and_strike() {
        assert_eq!(
            format_for_whatsapp("ini __miring__ dan ~~coret~~"),
            "ini _miring_ dan ~coret~"
        );
    }

    #[test]
    fn test_trailing_whitespace_stripped() {
        assert_eq!(format_for_whatsapp("halo  \t\ndunia "), "halo\ndunia");
    }

    #[test]
    fn test_code_block_untouched() {
        let input = "A ``` **x** ``` B";
        let out = format_for_whatsapp(input);
        let parts: Vec<&str> = out.split("```").collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[1], " **x** ");
        assert_eq!(parts[0], "A");
        assert_eq!(parts[2], " B");
    }

    #[test]
    fn test_multiline_code_block_preserves_markup() {
        let input = "**Judul**\n```rust\nlet s = \"**raw**  \";\n```\nakhir **ok**";
        let out = format_for_whatsapp(input);
        let parts: Vec<&str> = out.split("```").collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[1], "rust\nlet s = \"**raw**  \";\n");
        assert!(parts[0].starts_with(&to_unicode_bold("Judul")));
        assert_eq!(parts[2], "\nakhir *ok*");
    }

    #[test]
    fn test_unterminated_fence_keeps_segment_count() {
        let input = "a ```**b**";
        let out = format_for_whatsapp(input);
        assert_eq!(out.split("```").count(), input.split("```").count());
        assert!(out.ends_with("**b**"));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(format_for_whatsapp(""), "");
    }
}
