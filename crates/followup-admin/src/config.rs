//! 配置管理
//!
//! 启动时构建一次的显式配置结构，按引用传递给需要的组件。
//! 来源优先级（后者覆盖前者）：默认值 → 配置文件 → `FOLLOWUP_*` 环境变量。

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// 环境变量前缀
pub const ENV_PREFIX: &str = "FOLLOWUP";

/// 系统完整配置
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FollowUpConfig {
    /// 服务器配置
    pub server: ServerConfig,
    /// 数据库配置
    pub database: DatabaseConfig,
    /// 分页配置
    pub pagination: PaginationConfig,
    /// 日志配置
    pub logging: LoggingConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// 服务名称
    pub name: String,
    /// 服务版本
    pub version: String,
    /// 监听主机
    pub host: String,
    /// 监听端口
    pub port: u16,
    /// CORS 允许的来源，"*" 表示任意
    pub allowed_origins: Vec<String>,
}

/// 数据库配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DatabaseConfig {
    /// 连接字符串
    pub url: String,
    /// 最大连接数
    pub max_connections: u32,
    /// 最小连接数
    pub min_connections: u32,
    /// 连接超时时间（秒）
    pub connect_timeout_secs: u64,
}

/// 分页配置
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PaginationConfig {
    pub default_limit: i64,
    pub min_limit: i64,
    pub max_limit: i64,
}

/// 日志输出格式
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Compact,
    Json,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别或过滤表达式
    pub level: String,
    /// 输出格式
    pub format: LogFormat,
    /// 调试模式，强制 debug 级别
    pub debug: bool,
}

impl FollowUpConfig {
    /// 加载配置，`path` 为空时只使用默认值与环境变量
    pub fn load(path: Option<&str>) -> Result<Self> {
        Self::load_with_env(path, None)
    }

    /// 加载配置，`env` 不为空时替代进程环境变量（测试使用）
    pub fn load_with_env(path: Option<&str>, env: Option<HashMap<String, String>>) -> Result<Self> {
        let mut builder = Config::builder().add_source(
            Config::try_from(&FollowUpConfig::default())
                .context("Failed to build default configuration")?,
        );

        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("server.allowed_origins")
                .source(env),
        );

        let config: FollowUpConfig = builder
            .build()
            .context("Failed to read configuration sources")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// 校验配置
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            bail!("server.port must not be 0");
        }
        if self.database.url.trim().is_empty() {
            bail!("database.url must not be empty");
        }
        if self.database.max_connections == 0 {
            bail!("database.max_connections must be at least 1");
        }
        if self.database.min_connections > self.database.max_connections {
            bail!(
                "database.min_connections ({}) exceeds max_connections ({})",
                self.database.min_connections,
                self.database.max_connections
            );
        }

        let p = &self.pagination;
        if p.min_limit < 1 || p.min_limit > p.max_limit {
            bail!(
                "pagination bounds invalid: min_limit={} max_limit={}",
                p.min_limit,
                p.max_limit
            );
        }
        if p.default_limit < p.min_limit || p.default_limit > p.max_limit {
            bail!(
                "pagination.default_limit {} outside [{}, {}]",
                p.default_limit,
                p.min_limit,
                p.max_limit
            );
        }

        self.logging.validate()?;
        Ok(())
    }

    /// 监听地址
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl DatabaseConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl LoggingConfig {
    /// 实际生效的过滤表达式
    pub fn effective_level(&self) -> &str {
        if self.debug {
            "debug"
        } else {
            &self.level
        }
    }

    fn validate(&self) -> Result<()> {
        // 简单级别需为已知取值，包含 '=' 或 ',' 的视为完整过滤表达式
        let level = self.level.trim();
        if level.contains('=') || level.contains(',') {
            return Ok(());
        }
        match level.to_ascii_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" | "off" => Ok(()),
            other => bail!("unknown logging.level '{}'", other),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "FollowUp API".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            host: "0.0.0.0".to_string(),
            port: 8000,
            allowed_origins: vec!["*".to_string()],
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://followup.db".to_string(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout_secs: 30,
        }
    }
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: 100,
            min_limit: 1,
            max_limit: 500,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            debug: false,
        }
    }
}
