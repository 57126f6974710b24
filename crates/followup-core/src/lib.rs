//! # FollowUp Core
//!
//! 植入物事故跟踪系统的核心模块，提供领域数据结构、错误定义和通用校验工具。

pub mod error;
pub mod models;
pub mod utils;

pub use error::{FollowUpError, Result};
pub use models::*;
