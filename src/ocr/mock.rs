//! 固定结果的识别器（用于测试）

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::core::OcrError;
use crate::ocr::TextRecognizer;

#[derive(Debug, Default)]
pub struct StaticRecognizer {
    text: Option<String>,
    seen: Mutex<Vec<(PathBuf, String)>>,
}

impl StaticRecognizer {
    /// 每次都返回 `text`
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// 每次都失败
    pub fn failing() -> Self {
        Self::default()
    }

    /// 收到过的 (图片路径, 语言)
    pub fn calls(&self) -> Vec<(PathBuf, String)> {
        self.seen
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl TextRecognizer for StaticRecognizer {
    async fn recognize(&self, image_path: &Path, lang: &str) -> Result<String, OcrError> {
        self.seen
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push((image_path.to_path_buf(), lang.to_string()));
        self.text
            .clone()
            .ok_or_else(|| OcrError::Engine("recognizer unavailable".to_string()))
    }
}
