//! 错误定义模块

use thiserror::Error;

/// 系统统一错误类型
#[derive(Error, Debug)]
pub enum FollowUpError {
    #[error("参数无效: {0}")]
    InvalidArgument(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("数据冲突: {0}")]
    Conflict(String),

    #[error("配置错误: {0}")]
    Config(String),

    #[error("数据库错误: {0}")]
    Database(String),

    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("系统内部错误: {0}")]
    Internal(String),
}

#[cfg(feature = "database")]
impl From<sqlx::Error> for FollowUpError {
    fn from(err: sqlx::Error) -> Self {
        FollowUpError::Database(err.to_string())
    }
}

/// 系统统一结果类型
pub type Result<T> = std::result::Result<T, FollowUpError>;
