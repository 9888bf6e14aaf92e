//! Yura - WhatsApp 聊天智能体
//!
//! 模块划分：
//! - **agent**: 对话管线（归一化、群聊闸门、维护命令、Prompt 编译、发送）
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误类型与错误分类
//! - **format**: WhatsApp 严格格式化（Unicode 粗体标题）
//! - **integrations**: WhatsApp 信封、传输抽象、HTTP 桥接、Webhook
//! - **llm**: 生成服务客户端（OpenAI 兼容 / Gemini / Mock）
//! - **memory**: 每个聊天的对话历史与 OCR 知识库
//! - **ocr**: 图片文字识别（Tesseract / Mock）
//! - **observability**: 日志初始化

pub mod agent;
pub mod config;
pub mod core;
pub mod format;
pub mod integrations;
pub mod llm;
pub mod memory;
pub mod observability;
pub mod ocr;

pub use agent::{AgentSettings, ChatAgent, TurnOutcome};
