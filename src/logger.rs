//! 日志初始化
//!
//! `RUST_LOG` 优先；否则默认 `info`，开启详细日志时为 `debug`

use tracing_subscriber::{fmt, EnvFilter};

/// 初始化全局日志（重复调用时忽略）
pub fn init() {
    init_with_verbose(false);
}

pub fn init_with_verbose(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("form_builder={default_level},warn")));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
