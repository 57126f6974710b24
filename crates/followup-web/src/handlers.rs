//! HTTP处理器

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Json},
};
use followup_core::{CreateFollowUp, CreateIncident, Incident, IncidentUpdate, Suivi};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::server::AppState;

type ApiResult<T> = std::result::Result<T, ApiError>;

/// 列表查询参数
#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

/// API根路径处理器
pub async fn api_root(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "service": state.service_name,
        "version": state.version,
        "status": "running",
        "endpoints": {
            "health": "/health",
            "incidents": "/api/incidents",
            "patient_incidents": "/api/patients/{id}/incidents",
            "follow_ups": "/api/incidents/{id}/suivis"
        }
    }))
}

/// 健康检查处理器
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": state.service_name,
        "version": state.version
    }))
}

// ========== 事故 ==========

/// POST /api/incidents
pub async fn create_incident(
    State(state): State<AppState>,
    payload: Result<Json<CreateIncident>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Incident>)> {
    let Json(request) = payload?;
    let incident = state
        .service
        .create_incident(request)
        .await
        .map_err(ApiError::from_create_error)?;

    info!("POST /api/incidents -> created incident {}", incident.id);
    Ok((StatusCode::CREATED, Json(incident)))
}

/// GET /api/incidents
pub async fn list_incidents(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Json<Vec<Incident>>> {
    let Query(params) = params?;
    let incidents = state
        .service
        .list_incidents(params.skip, params.limit)
        .await?;

    info!("GET /api/incidents -> returned {} incidents", incidents.len());
    Ok(Json(incidents))
}

/// GET /api/incidents/:id
pub async fn get_incident(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Incident>> {
    let Path(id) = id?;
    let incident = state.service.get_incident(id).await.map_err(|e| {
        warn!("GET /api/incidents/{} -> {}", id, e);
        ApiError::from(e)
    })?;
    Ok(Json(incident))
}

/// PUT /api/incidents/:id
pub async fn update_incident(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<IncidentUpdate>, JsonRejection>,
) -> ApiResult<Json<Incident>> {
    let Path(id) = id?;
    let Json(update) = payload?;
    let incident = state.service.update_incident(id, update).await?;

    info!("PUT /api/incidents/{} -> updated", id);
    Ok(Json(incident))
}

/// DELETE /api/incidents/:id
pub async fn delete_incident(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path(id) = id?;
    state.service.soft_delete_incident(id).await?;

    info!("DELETE /api/incidents/{} -> soft-deleted", id);
    Ok(StatusCode::NO_CONTENT)
}

// ========== 患者 ==========

/// GET /api/patients/:id/incidents
pub async fn get_patient_incidents(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Vec<Incident>>> {
    let Path(id) = id?;
    if !state.service.patient_exists(id).await? {
        warn!("GET /api/patients/{}/incidents -> patient not found", id);
        return Err(ApiError::not_found(format!("Patient {} not found", id)));
    }

    let incidents = state.service.list_incidents_by_patient(id).await?;
    info!(
        "GET /api/patients/{}/incidents -> returned {} incidents",
        id,
        incidents.len()
    );
    Ok(Json(incidents))
}

// ========== 跟进记录 ==========

/// POST /api/incidents/:id/suivis
pub async fn add_suivi(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<CreateFollowUp>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Suivi>)> {
    let Path(id) = id?;
    let Json(request) = payload?;
    let suivi = state.service.add_follow_up(id, request).await?;

    info!("POST /api/incidents/{}/suivis -> created suivi {}", id, suivi.id);
    Ok((StatusCode::CREATED, Json(suivi)))
}

/// GET /api/incidents/:id/suivis
pub async fn get_suivis(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Vec<Suivi>>> {
    let Path(id) = id?;
    // 已软删除的事故不再暴露其跟进历史
    if let Err(e) = state.service.get_incident(id).await {
        warn!("GET /api/incidents/{}/suivis -> {}", id, e);
        return Err(ApiError::from(e));
    }

    let suivis = state.service.list_follow_ups(id).await?;
    info!(
        "GET /api/incidents/{}/suivis -> returned {} suivis",
        id,
        suivis.len()
    );
    Ok(Json(suivis))
}
