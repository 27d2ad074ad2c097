//! Waymark 远端 Agent 服务
//!
//! 启动: cargo run --bin waymark-server --features server -- [config.toml]
//! 端点: POST /agent, GET /health

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;

use waymark::agent::RemoteAgent;
use waymark::config::load_config;
use waymark::core::signal_token;
use waymark::llm::create_llm_from_config;
use waymark::server::{router, ServerState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    waymark::observability::init();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let cfg = load_config(config_path).context("Failed to load config")?;

    let llm = create_llm_from_config(&cfg.model);
    let agent = RemoteAgent::new(llm);
    if !agent.has_model() {
        tracing::info!("No model configured, /agent answers with the rule-based interpreter");
    }
    let app = router(Arc::new(ServerState { agent }));

    let addr: SocketAddr = cfg
        .server
        .bind
        .parse()
        .with_context(|| format!("Invalid bind address: {}", cfg.server.bind))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("waymark-server listening on http://{}", addr);

    let token = signal_token();

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { token.cancelled().await })
        .await
        .context("Server error")?;

    tracing::info!("waymark-server stopped");
    Ok(())
}
