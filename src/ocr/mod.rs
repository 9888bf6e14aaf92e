//! 图片文字识别：识别器抽象、Tesseract 命令行实现、Mock

pub mod mock;
pub mod tesseract;

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use crate::core::OcrError;

pub use mock::StaticRecognizer;
pub use tesseract::TesseractCli;

/// 识别器：图片路径 + 语言提示（如 `eng+ind`）-> 文本；看不清时可以返回空串
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    async fn recognize(&self, image_path: &Path, lang: &str) -> Result<String, OcrError>;
}

/// 带超时识别；`timeout_secs == 0` 表示不设超时
pub async fn recognize_with_timeout(
    ocr: &dyn TextRecognizer,
    image_path: &Path,
    lang: &str,
    timeout_secs: u64,
) -> Result<String, OcrError> {
    if timeout_secs == 0 {
        return ocr.recognize(image_path, lang).await;
    }
    tokio::time::timeout(
        Duration::from_secs(timeout_secs),
        ocr.recognize(image_path, lang),
    )
    .await
    .map_err(|_| OcrError::Timeout(timeout_secs))?
}
