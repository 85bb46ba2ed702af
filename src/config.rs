use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_ADDR: &str = "127.0.0.1:4410";

/// Workspace root, overridable via WORKSPACE_PATH.
pub fn workspace_root() -> PathBuf {
    if let Ok(value) = std::env::var("WORKSPACE_PATH") {
        if !value.trim().is_empty() {
            return PathBuf::from(value);
        }
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".workdeck")
        .join("workspace")
}

pub fn listen_addr() -> SocketAddr {
    std::env::var("WORKDECK_ADDR")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or_else(|| {
            DEFAULT_ADDR
                .parse()
                .expect("default listen address parses")
        })
}

/// When set, logs are written as JSON to a daily-rolling file in this
/// directory instead of stderr.
pub fn log_dir() -> Option<PathBuf> {
    std::env::var("WORKDECK_LOG_DIR")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
}
