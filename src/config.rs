//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `YURA__*` 覆盖（双下划线表示嵌套，如 `YURA__OCR__LANG=eng`），
//! 最后兼容旧的扁平变量：GEMINI_API_KEY、GEMINI_MODEL、OCR_LANG、AUTH_DIR、OWNER_LOCAL、LOG_LEVEL。

use std::path::PathBuf;

use serde::Deserialize;

use crate::agent::prompt::{
    DEFAULT_PERSONA, DEFAULT_PERSONA_FULL_NAME, DEFAULT_PERSONA_NAME, DEFAULT_SUMMARY_LIMIT,
};
use crate::agent::{AgentSettings, PromptCompiler};
use crate::llm::{GEMINI_BASE_URL, GEMINI_FLASH};

/// 旧版扁平环境变量 -> 配置键
const LEGACY_ENV: &[(&str, &str)] = &[
    ("GEMINI_API_KEY", "llm.api_key"),
    ("GEMINI_MODEL", "llm.model"),
    ("OCR_LANG", "ocr.lang"),
    ("AUTH_DIR", "whatsapp.auth_dir"),
    ("OWNER_LOCAL", "whatsapp.owner_local"),
    ("LOG_LEVEL", "app.log_level"),
];

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub llm: LlmSection,
    pub ocr: OcrSection,
    pub whatsapp: WhatsappSection,
    pub persona: PersonaSection,
}

/// [app] 段
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppSection {
    /// RUST_LOG 未设置时使用
    pub log_level: String,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}

/// [llm] 段：Gemini（OpenAI 兼容接口）
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    pub model: String,
    pub base_url: String,
    pub api_key: Option<String>,
    /// 单次生成超时（秒），0 为不限
    pub request_timeout_secs: u64,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            model: GEMINI_FLASH.to_string(),
            base_url: GEMINI_BASE_URL.to_string(),
            api_key: None,
            request_timeout_secs: 60,
        }
    }
}

/// [ocr] 段
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OcrSection {
    /// Tesseract 语言，如 `eng+ind`
    pub lang: String,
    pub download_dir: PathBuf,
    /// 识别结果的最少非空白字符数
    pub min_chars: usize,
    pub timeout_secs: u64,
    pub binary: String,
}

impl Default for OcrSection {
    fn default() -> Self {
        Self {
            lang: "eng+ind".to_string(),
            download_dir: PathBuf::from("download"),
            min_chars: 8,
            timeout_secs: 60,
            binary: "tesseract".to_string(),
        }
    }
}

/// [whatsapp] 段：桥接地址、会话目录、owner
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WhatsappSection {
    pub auth_dir: PathBuf,
    pub owner_local: String,
    pub bridge_url: String,
    pub listen_addr: String,
    /// 未设置时向桥接 `/me` 询问
    pub self_jid: Option<String>,
    pub bridge_timeout_secs: u64,
}

impl Default for WhatsappSection {
    fn default() -> Self {
        Self {
            auth_dir: PathBuf::from("./auth"),
            owner_local: String::new(),
            bridge_url: "http://127.0.0.1:3001".to_string(),
            listen_addr: "0.0.0.0:3000".to_string(),
            self_jid: None,
            bridge_timeout_secs: 30,
        }
    }
}

/// [persona] 段
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PersonaSection {
    pub name: String,
    /// 指令中的全名；未设置时默认名对应 "Yura Naomi"，其余沿用 name
    pub full_name: Option<String>,
    /// 覆盖内置人设
    pub preamble: Option<String>,
    /// 知识区 OCR 摘要长度
    pub summary_limit: usize,
}

impl Default for PersonaSection {
    fn default() -> Self {
        Self {
            name: DEFAULT_PERSONA_NAME.to_string(),
            full_name: None,
            preamble: None,
            summary_limit: DEFAULT_SUMMARY_LIMIT,
        }
    }
}

impl AppConfig {
    /// 生成服务 API Key；空串视为未设置
    pub fn api_key(&self) -> Option<&str> {
        self.llm.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }

    pub fn agent_settings(&self) -> AgentSettings {
        AgentSettings {
            owner_local: self.whatsapp.owner_local.clone(),
            auth_dir: self.whatsapp.auth_dir.clone(),
            download_dir: self.ocr.download_dir.clone(),
            ocr_lang: self.ocr.lang.clone(),
            ocr_min_chars: self.ocr.min_chars,
            ocr_timeout_secs: self.ocr.timeout_secs,
            llm_timeout_secs: self.llm.request_timeout_secs,
        }
    }

    pub fn prompt_compiler(&self) -> PromptCompiler {
        let persona = self
            .persona
            .preamble
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_PERSONA);
        let full_name = match self.persona.full_name.as_deref().map(str::trim) {
            Some(full) if !full.is_empty() => full,
            _ if self.persona.name == DEFAULT_PERSONA_NAME => DEFAULT_PERSONA_FULL_NAME,
            _ => self.persona.name.as_str(),
        };
        PromptCompiler::new(persona, self.persona.name.as_str(), self.persona.summary_limit)
            .with_full_name(full_name)
    }
}

/// 从 config 目录加载配置，环境变量可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 叠加环境变量 YURA__*（双下划线表示嵌套键）
/// 4. 最后叠加旧版扁平环境变量
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    load_config_with_env(config_path, |name| std::env::var(name).ok())
}

/// 同 `load_config`，旧版变量的读取方式可注入（测试用）
pub fn load_config_with_env(
    config_path: Option<PathBuf>,
    legacy_env: impl Fn(&str) -> Option<String>,
) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("YURA")
            .separator("__")
            .try_parsing(true),
    );

    for (var, key) in LEGACY_ENV {
        let value = legacy_env(var).filter(|v| !v.is_empty());
        builder = builder.set_override_option(*key, value)?;
    }

    let c = builder.build()?;
    c.try_deserialize()
}
