//! 日志初始化

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};

/// 构建日志过滤器，`RUST_LOG` 优先于配置
pub fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(config.effective_level())
        .map_err(|e| anyhow!("invalid log filter '{}': {}", config.effective_level(), e))
}

/// 安装全局日志订阅器，进程内只能调用一次
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = build_filter(config)?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

    let result = match config.format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    result.map_err(|e| anyhow!("Failed to initialize logging: {}", e))
}
