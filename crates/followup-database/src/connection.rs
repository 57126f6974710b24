//! 数据库连接管理

use followup_core::{FollowUpError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::str::FromStr;
use std::time::Duration;

/// 连接池参数
#[derive(Debug, Clone)]
pub struct PoolOptions {
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: Duration,
    /// 写锁被占用时的等待时长
    pub busy_timeout: Duration,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            busy_timeout: Duration::from_secs(5),
        }
    }
}

/// 数据库连接池
#[derive(Debug, Clone)]
pub struct DatabasePool {
    pool: SqlitePool,
}

impl DatabasePool {
    /// 按连接字符串建立连接池
    pub async fn connect(url: &str, options: &PoolOptions) -> Result<Self> {
        let mut connect_options = SqliteConnectOptions::from_str(url)
            .map_err(|e| FollowUpError::Config(format!("Invalid database url {}: {}", url, e)))?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(options.busy_timeout);

        if !is_memory_url(url) {
            connect_options = connect_options.journal_mode(SqliteJournalMode::Wal);
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(options.max_connections)
            .min_connections(options.min_connections)
            .acquire_timeout(options.connect_timeout)
            .connect_with(connect_options)
            .await
            .map_err(|e| FollowUpError::Database(format!("Failed to open database: {}", e)))?;

        tracing::info!(
            max_connections = options.max_connections,
            "Database connection established"
        );
        Ok(Self { pool })
    }

    /// 内存数据库，单连接以保证所有操作看到同一份数据
    pub async fn in_memory() -> Result<Self> {
        let connect_options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| FollowUpError::Config(e.to_string()))?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect_with(connect_options)
            .await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// 开启事务，一次服务调用对应一个事务
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin().await?)
    }

    /// 开启写事务并立即取得写锁
    ///
    /// SQLite 的 `BEGIN` 是延迟事务，先读后写时若另一连接已提交写入会直接返回
    /// `SQLITE_BUSY`。先执行一条空写语句拿到写锁，并发写者改为按 `busy_timeout` 排队。
    pub async fn begin_write(&self) -> Result<Transaction<'static, Sqlite>> {
        let mut tx = self.begin().await?;
        sqlx::query("UPDATE incidents SET id = id WHERE 0")
            .execute(&mut *tx)
            .await?;
        Ok(tx)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn is_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}
