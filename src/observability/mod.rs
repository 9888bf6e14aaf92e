//! 可观测性：tracing 日志初始化
//!
//! RUST_LOG 优先；未设置时使用配置中的 `app.log_level`。

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// 解析日志过滤器；`level` 非法时回退到 warn
pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"))
}

pub fn init(level: &str) {
    tracing_subscriber::registry()
        .with(env_filter(level))
        .with(fmt::layer())
        .init();
}
