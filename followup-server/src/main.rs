//! FollowUp 服务器主程序

use anyhow::{Context, Result};
use clap::Parser;
use followup_admin::{init_logging, FollowUpConfig};
use followup_database::{create_tables, DatabasePool, PoolOptions};
use followup_web::{AppState, WebServer};
use followup_workflow::{IncidentService, PaginationLimits};
use std::net::SocketAddr;
use tracing::{error, info};

/// 服务器命令行参数
#[derive(Parser, Debug)]
#[command(name = "followup-server")]
#[command(about = "人工耳蜗植入物事故跟踪 REST 服务")]
struct Args {
    /// 配置文件路径
    #[arg(short, long)]
    config: Option<String>,

    /// 监听主机
    #[arg(long)]
    host: Option<String>,

    /// 监听端口
    #[arg(short, long)]
    port: Option<u16>,

    /// 数据库连接字符串
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// 日志级别
    #[arg(short, long)]
    log_level: Option<String>,
}

impl Args {
    /// 命令行参数覆盖配置文件与环境变量
    fn apply(&self, config: &mut FollowUpConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(url) = &self.database_url {
            config.database.url = url.clone();
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = FollowUpConfig::load(args.config.as_deref())?;
    args.apply(&mut config);
    config.validate()?;

    // 初始化日志
    init_logging(&config.logging)?;

    info!("{} v{} starting up...", config.server.name, config.server.version);
    info!("  配置来源: {}", config_source(args.config.as_deref()));
    info!("  监听地址: {}", config.bind_address());
    info!("  数据库: {}", config.database.url);

    let db = DatabasePool::connect(
        &config.database.url,
        &PoolOptions {
            max_connections: config.database.max_connections,
            min_connections: config.database.min_connections,
            connect_timeout: config.database.connect_timeout(),
            ..PoolOptions::default()
        },
    )
    .await?;
    create_tables(&db).await?;
    info!("Database tables verified");

    let pagination = PaginationLimits {
        default_limit: config.pagination.default_limit,
        min_limit: config.pagination.min_limit,
        max_limit: config.pagination.max_limit,
    };
    let service = IncidentService::new(db.clone(), pagination);
    let state = AppState::new(service, &config.server.name, &config.server.version);

    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .with_context(|| format!("invalid listen address {}", config.bind_address()))?;
    let server = WebServer::new(addr, state, &config.server.allowed_origins);

    if let Err(e) = server.run(shutdown_signal()).await {
        error!("服务器运行失败: {}", e);
        db.close().await;
        return Err(e.into());
    }

    db.close().await;
    info!("{} shut down", config.server.name);
    Ok(())
}

/// 配置来源描述，供启动日志使用
fn config_source(path: Option<&str>) -> &str {
    path.unwrap_or("<defaults + FOLLOWUP_* env>")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
