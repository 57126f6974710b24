//! 通用校验工具函数

use crate::error::{FollowUpError, Result};

/// 事故描述最大字符数
pub const MAX_DESCRIPTION_CHARS: usize = 2000;

/// 规范化事故描述：去除首尾空白，校验非空且不超过上限
pub fn normalize_description(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(FollowUpError::InvalidArgument(
            "description must not be blank".to_string(),
        ));
    }

    let chars = trimmed.chars().count();
    if chars > MAX_DESCRIPTION_CHARS {
        return Err(FollowUpError::InvalidArgument(format!(
            "description must be at most {} characters (got {})",
            MAX_DESCRIPTION_CHARS, chars
        )));
    }

    Ok(trimmed.to_string())
}

/// 规范化跟进措施文本
pub fn normalize_actions(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(FollowUpError::InvalidArgument(
            "actionsTaken must not be blank".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

/// 校验引用ID为正数
pub fn require_positive_id(field: &str, id: i64) -> Result<()> {
    if id <= 0 {
        return Err(FollowUpError::InvalidArgument(format!(
            "{} must be a positive integer (got {})",
            field, id
        )));
    }
    Ok(())
}

/// 可选引用ID，存在时必须为正数
pub fn require_positive_opt(field: &str, id: Option<i64>) -> Result<()> {
    match id {
        Some(id) => require_positive_id(field, id),
        None => Ok(()),
    }
}
