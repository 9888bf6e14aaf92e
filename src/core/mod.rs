//! 核心层：错误类型与错误分类

pub mod classifier;
pub mod error;

pub use classifier::{is_transient_protocol_text, ErrorClassifier};
pub use error::{ErrorKind, LlmError, OcrError, TransportError, TurnError};
