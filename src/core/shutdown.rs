//! 优雅关闭：HTTP 服务收到 Ctrl+C / SIGTERM 后停止接收新请求，等待进行中的请求完成

use std::future::Future;

use tokio_util::sync::CancellationToken;

/// 等待 Ctrl+C，unix 上同时等待 SIGTERM；返回信号名
pub async fn wait_for_signal() -> &'static str {
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => "ctrl-c",
        _ = terminate => "sigterm",
    }
}

/// `trigger` 完成后取消返回的 token；须在 tokio 运行时内调用
pub fn cancel_when<F>(trigger: F) -> CancellationToken
where
    F: Future<Output = &'static str> + Send + 'static,
{
    let token = CancellationToken::new();
    let cancel = token.clone();
    tokio::spawn(async move {
        let reason = trigger.await;
        tracing::info!(reason, "initiating graceful shutdown...");
        cancel.cancel();
    });
    token
}

/// 收到系统关闭信号时取消的 token
pub fn signal_token() -> CancellationToken {
    cancel_when(wait_for_signal())
}
