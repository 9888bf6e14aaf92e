//! 维护命令：重置群组 SenderKey
//!
//! 删除会话目录中以 `sender-key-<groupJid>` 开头的文件，迫使传输层重新协商群密钥。

use std::path::Path;

use tokio::fs;

/// 删除该群的 sender-key 文件，返回删除数量；目录不可读时返回 0
pub async fn reset_sender_keys(auth_dir: &Path, group_jid: &str) -> usize {
    let prefix = format!("sender-key-{group_jid}");

    let mut entries = match fs::read_dir(auth_dir).await {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(dir = %auth_dir.display(), error = %e, "Cannot read session directory");
            return 0;
        }
    };

    let mut removed = 0;
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "Session directory scan aborted");
                break;
            }
        };
        let name = entry.file_name();
        if !name.to_string_lossy().starts_with(&prefix) {
            continue;
        }
        match fs::remove_file(entry.path()).await {
            Ok(()) => removed += 1,
            Err(e) => {
                tracing::warn!(file = %entry.path().display(), error = %e, "Failed to delete sender key");
            }
        }
    }

    tracing::info!(group = group_jid, removed, "Sender keys reset");
    removed
}

/// 维护命令的回复文本
pub fn reset_reply(removed: usize) -> String {
    if removed > 0 {
        format!(
            "𝐒𝐞𝐬𝐢 𝐠𝐫𝐮𝐩 𝐝𝐢𝐫𝐞𝐬𝐞𝐭 ({removed} berkas). Kirim 1 pesan teks biasa ya agar SenderKey baru terkirim."
        )
    } else {
        "Tidak ada sender-key yang dihapus. Coba kirim 1 pesan teks biasa untuk refresh SenderKey."
            .to_string()
    }
}
