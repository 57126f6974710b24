//! # FollowUp Web模块
//!
//! 事故服务的 REST 接口：路由、请求解析、错误到状态码的映射与健康检查。

pub mod error;
pub mod handlers;
pub mod server;

pub use error::ApiError;
pub use server::{create_app, AppState, WebServer};
