use anyhow::Context;
use std::sync::OnceLock;
use tracing_appender::non_blocking::WorkerGuard;
use workdeck::{config, http, workspace};

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

fn env_filter() -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
}

fn init_logging() {
    match config::log_dir() {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::daily(dir, "workdeck.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let _ = LOG_GUARD.set(guard);
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .json()
                .with_writer(non_blocking)
                .init();
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(env_filter()).init();
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let root = config::workspace_root();
    workspace::ensure_topology(&root)
        .with_context(|| format!("failed to prepare workspace at {}", root.display()))?;

    let addr = config::listen_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, workspace = %root.display(), "workdeck listening");

    axum::serve(listener, http::build_router(http::AppState { root }))
        .await
        .context("server error")?;
    Ok(())
}
