//! 事故状态机
//!
//! 管理事故处理状态的转换规则

use followup_core::IncidentStatus;

/// 事故状态转换事件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IncidentEvent {
    /// 新增跟进记录
    FollowUpAdded,
    /// 通过更新显式指定状态
    StatusSet(IncidentStatus),
    /// 软删除
    SoftDeleted,
}

/// 事故状态机
#[derive(Debug, Default, Clone, Copy)]
pub struct IncidentStateMachine;

impl IncidentStateMachine {
    pub fn new() -> Self {
        Self
    }

    /// 新建事故的初始状态
    pub fn initial_state(&self) -> IncidentStatus {
        IncidentStatus::Open
    }

    /// 执行状态转换，返回新状态
    ///
    /// 所有事件都有定义的结果，不会失败；跟进只推进 Open，
    /// 其余状态保持不变，因此不会自动回退到 Open。
    pub fn transition(&self, from: IncidentStatus, event: IncidentEvent) -> IncidentStatus {
        match (from, event) {
            (IncidentStatus::Open, IncidentEvent::FollowUpAdded) => IncidentStatus::InProgress,
            (current, IncidentEvent::FollowUpAdded) => current,
            (_, IncidentEvent::StatusSet(target)) => target,
            (_, IncidentEvent::SoftDeleted) => IncidentStatus::Closed,
        }
    }

    /// 该事件是否会改变当前状态
    pub fn changes_state(&self, from: IncidentStatus, event: IncidentEvent) -> bool {
        self.transition(from, event) != from
    }
}
