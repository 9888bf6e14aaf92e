//! Tesseract 命令行识别器
//!
//! 执行 `tesseract <image> stdout -l <lang>`，stdout 即识别结果。需要系统已安装 tesseract 及语言包。

use std::path::Path;

use async_trait::async_trait;
use tokio::process::Command;

use crate::core::OcrError;
use crate::ocr::TextRecognizer;

pub struct TesseractCli {
    binary: String,
}

impl TesseractCli {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for TesseractCli {
    fn default() -> Self {
        Self::new("tesseract")
    }
}

#[async_trait]
impl TextRecognizer for TesseractCli {
    async fn recognize(&self, image_path: &Path, lang: &str) -> Result<String, OcrError> {
        tracing::debug!(image = %image_path.display(), lang, "tesseract recognize");

        let mut cmd = Command::new(&self.binary);
        // 超时丢弃 future 时一并结束子进程
        cmd.kill_on_drop(true);
        cmd.arg(image_path).arg("stdout");
        if !lang.is_empty() {
            cmd.args(["-l", lang]);
        }

        let output = cmd.output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::Engine(format!(
                "Exit {:?}: {}",
                output.status.code(),
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_binary_is_io_error() {
        let ocr = TesseractCli::new("yura-no-such-tesseract-binary");
        let err = ocr
            .recognize(Path::new("/nonexistent.jpg"), "eng")
            .await
            .unwrap_err();
        assert!(matches!(err, OcrError::Io(_)));
    }

    /// `sh <script> stdout -l eng`：脚本睡 2 秒后才写标记文件
    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_kills_stalled_process() {
        use crate::ocr::recognize_with_timeout;
        use std::time::Duration;

        let dir = tempfile::TempDir::new().unwrap();
        let marker = dir.path().join("finished");
        let script = dir.path().join("slow.sh");
        std::fs::write(
            &script,
            format!("sleep 2\ntouch '{}'\n", marker.display()),
        )
        .unwrap();

        let ocr = TesseractCli::new("sh");
        let err = recognize_with_timeout(&ocr, &script, "eng", 1)
            .await
            .unwrap_err();
        assert!(matches!(err, OcrError::Timeout(1)));

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert!(!marker.exists());
    }
}
