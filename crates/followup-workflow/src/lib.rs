//! # FollowUp 工作流模块
//!
//! 提供事故处理的业务规则：
//! - 事故状态机：跟进触发的自动流转、显式更新与软删除关闭
//! - 事故服务：创建前置条件、部分更新、软删除、跟进记录与有序分页读取

pub mod service;
pub mod state_machine;

// 重新导出主要类型
pub use service::{IncidentService, PaginationLimits};
pub use state_machine::{IncidentEvent, IncidentStateMachine};
