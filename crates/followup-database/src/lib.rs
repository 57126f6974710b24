//! # FollowUp 数据库模块
//!
//! 负责事故、跟进记录与患者目录的持久化，提供 SQLite 连接池、建表以及
//! 基于显式事务句柄的按实体数据访问函数。

pub mod connection;
pub mod models;
pub mod queries;

// 重新导出主要类型
pub use connection::{DatabasePool, PoolOptions};
pub use models::*;
pub use queries::*;
pub use sqlx::SqliteConnection;
