//! 错误处理

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use followup_core::FollowUpError;
use serde_json::json;
use tracing::{error, warn};

const INTERNAL_MESSAGE: &str = "An internal error occurred. Please contact the administrator.";

/// 返回给客户端的错误
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// 创建事故时患者缺失与植入物不一致都视为请求数据无效
    pub fn from_create_error(err: FollowUpError) -> Self {
        match err {
            FollowUpError::NotFound(msg) | FollowUpError::Conflict(msg) => {
                warn!("Incident creation rejected: {}", msg);
                Self::bad_request(msg)
            }
            other => Self::from(other),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<FollowUpError> for ApiError {
    fn from(err: FollowUpError) -> Self {
        match err {
            FollowUpError::InvalidArgument(msg) => Self::bad_request(msg),
            FollowUpError::NotFound(msg) => Self::not_found(msg),
            FollowUpError::Conflict(msg) => Self::new(StatusCode::CONFLICT, msg),
            other => {
                // 内部细节只写日志，不返回给客户端
                error!(error = %other, "Unhandled service error");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE)
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": true,
            "message": self.message,
            "status": self.status.as_u16()
        }));

        (self.status, body).into_response()
    }
}
