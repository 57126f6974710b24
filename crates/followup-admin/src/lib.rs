//! # FollowUp 管理模块
//!
//! 提供系统配置加载、校验与日志初始化。

pub mod config;
pub mod logging;

pub use config::{
    DatabaseConfig, FollowUpConfig, LogFormat, LoggingConfig, PaginationConfig, ServerConfig,
};
pub use logging::init_logging;
