//! JID 工具：`628xxx:2@s.whatsapp.net` -> `628xxx`

const GROUP_SUFFIX: &str = "@g.us";

/// 去掉服务器后缀与设备号，得到本地号码；空输入返回空串
pub fn jid_local(jid: &str) -> &str {
    let user = jid.split('@').next().unwrap_or("");
    user.split(':').next().unwrap_or("")
}

pub fn is_group_jid(jid: &str) -> bool {
    jid.ends_with(GROUP_SUFFIX)
}

/// 只保留数字（配置里的 owner 号码可能带 `+` 或空格）
pub fn digits_only(s: &str) -> String {
    s.chars().filter(char::is_ascii_digit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jid_local() {
        assert_eq!(jid_local("628123:2@s.whatsapp.net"), "628123");
        assert_eq!(jid_local("628123@s.whatsapp.net"), "628123");
        assert_eq!(jid_local("628123"), "628123");
        assert_eq!(jid_local(""), "");
    }

    #[test]
    fn test_is_group_jid() {
        assert!(is_group_jid("120363021@g.us"));
        assert!(!is_group_jid("628123@s.whatsapp.net"));
    }

    #[test]
    fn test_digits_only() {
        assert_eq!(digits_only("+62 821-555"), "62821555");
        assert_eq!(digits_only(""), "");
    }
}
