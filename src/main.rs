//! Yura WhatsApp 服务
//!
//! 通过 HTTP 桥接进程与 WhatsApp 对话：桥接把入站消息推到 `/events`，回复经桥接发出。
//!
//! 环境变量（也可写在 config/default.toml，或用 `YURA__*` 覆盖）:
//! - GEMINI_API_KEY: 生成服务 API Key（必填）
//! - GEMINI_MODEL: 模型，默认 gemini-1.5-flash
//! - OCR_LANG: Tesseract 语言，默认 eng+ind
//! - AUTH_DIR: 会话密钥目录，默认 ./auth
//! - OWNER_LOCAL: owner 号码，启用 `!fix`
//! - LOG_LEVEL: 日志级别，默认 warn（RUST_LOG 优先）
//!
//! 启动: cargo run --bin yura

#[cfg(feature = "whatsapp")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use std::sync::Arc;

    use anyhow::Context;
    use tokio_util::sync::CancellationToken;
    use yura::config::load_config;
    use yura::integrations::whatsapp::create_router;
    use yura::integrations::HttpBridge;
    use yura::llm::create_gemini_client;
    use yura::ocr::TesseractCli;
    use yura::ChatAgent;

    let config_path = std::env::args().nth(1).map(std::path::PathBuf::from);
    let cfg = load_config(config_path).context("Failed to load config")?;
    yura::observability::init(&cfg.app.log_level);

    let api_key = cfg
        .api_key()
        .context("GEMINI_API_KEY belum di-set (llm.api_key)")?;
    let llm = create_gemini_client(api_key, Some(&cfg.llm.model), Some(&cfg.llm.base_url))?;

    let transport = HttpBridge::connect(
        &cfg.whatsapp.bridge_url,
        cfg.whatsapp.self_jid.clone(),
        cfg.whatsapp.bridge_timeout_secs,
    )
    .await
    .context("WhatsApp bridge unavailable")?;

    let agent = ChatAgent::new(
        Arc::new(transport),
        Arc::new(llm),
        Arc::new(TesseractCli::new(cfg.ocr.binary.clone())),
        cfg.prompt_compiler(),
        cfg.agent_settings(),
    );

    let app = create_router(Arc::new(agent));

    let shutdown = CancellationToken::new();
    let token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown requested");
        }
        token.cancel();
    });

    let listener = tokio::net::TcpListener::bind(&cfg.whatsapp.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", cfg.whatsapp.listen_addr))?;
    tracing::info!("Yura WhatsApp server listening on http://{}", cfg.whatsapp.listen_addr);
    tracing::info!(model = %cfg.llm.model, "Webhook URL: http://YOUR_HOST/events");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    Ok(())
}

#[cfg(not(feature = "whatsapp"))]
fn main() {
    eprintln!("请使用 --features whatsapp 编译: cargo run --bin yura --features whatsapp");
    std::process::exit(1);
}
