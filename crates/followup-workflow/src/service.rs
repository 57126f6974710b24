//! 事故服务
//!
//! 业务规则的唯一写入方：创建前置条件、状态转换、软删除以及读取的排序和分页。
//! 每个操作在一个事务内完成，出错时事务随之丢弃并回滚。

use chrono::Utc;
use followup_core::utils::{
    normalize_actions, normalize_description, require_positive_id, require_positive_opt,
};
use followup_core::{
    CreateFollowUp, CreateIncident, FollowUpError, Incident, IncidentUpdate, Result, Suivi,
};
use followup_database::{self as db, DatabasePool, NewIncident, NewSuivi};
use tracing::{debug, info, warn};

use crate::state_machine::{IncidentEvent, IncidentStateMachine};

/// 分页上限配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationLimits {
    pub default_limit: i64,
    pub min_limit: i64,
    pub max_limit: i64,
}

impl Default for PaginationLimits {
    fn default() -> Self {
        Self {
            default_limit: 100,
            min_limit: 1,
            max_limit: 500,
        }
    }
}

impl PaginationLimits {
    /// 校验分页参数，返回实际使用的 (skip, limit)
    pub fn resolve(&self, skip: Option<i64>, limit: Option<i64>) -> Result<(i64, i64)> {
        let skip = skip.unwrap_or(0);
        if skip < 0 {
            return Err(FollowUpError::InvalidArgument(format!(
                "skip must be >= 0 (got {})",
                skip
            )));
        }

        let limit = limit.unwrap_or(self.default_limit);
        if limit < self.min_limit || limit > self.max_limit {
            return Err(FollowUpError::InvalidArgument(format!(
                "limit must be between {} and {} (got {})",
                self.min_limit, self.max_limit, limit
            )));
        }

        Ok((skip, limit))
    }
}

/// 事故服务
#[derive(Debug, Clone)]
pub struct IncidentService {
    db: DatabasePool,
    pagination: PaginationLimits,
    state_machine: IncidentStateMachine,
}

impl IncidentService {
    pub fn new(db: DatabasePool, pagination: PaginationLimits) -> Self {
        Self {
            db,
            pagination,
            state_machine: IncidentStateMachine::new(),
        }
    }

    pub fn database(&self) -> &DatabasePool {
        &self.db
    }

    pub fn pagination(&self) -> &PaginationLimits {
        &self.pagination
    }

    // ========== 事故 ==========

    /// 创建事故：患者必须存在，若提供植入物则必须与患者当前植入物一致
    pub async fn create_incident(&self, request: CreateIncident) -> Result<Incident> {
        require_positive_id("patientId", request.patient_id)?;
        require_positive_opt("implantId", request.implant_id)?;
        require_positive_opt("processorId", request.processor_id)?;
        require_positive_opt("clinicianId", request.clinician_id)?;
        let description = normalize_description(&request.description)?;

        info!(patient_id = request.patient_id, "Creating incident");

        let mut tx = self.db.begin_write().await?;

        let patient = match db::find_patient(&mut tx, request.patient_id).await? {
            Some(patient) => patient,
            None => {
                warn!(
                    patient_id = request.patient_id,
                    "Incident creation failed: patient not found"
                );
                return Err(FollowUpError::NotFound(format!(
                    "Patient {} not found",
                    request.patient_id
                )));
            }
        };

        if let Some(implant_id) = request.implant_id {
            if patient.current_implant_id != Some(implant_id) {
                warn!(
                    patient_id = patient.id,
                    implant_id, "Incident creation failed: implant does not belong to patient"
                );
                return Err(FollowUpError::Conflict(format!(
                    "ImplantMismatch: implant {} does not belong to patient {}",
                    implant_id, patient.id
                )));
            }
        }

        let mut new_incident = NewIncident::from_request(&request, description, Utc::now());
        new_incident.status = self.state_machine.initial_state();

        let id = db::insert_incident(&mut tx, &new_incident).await?;
        let incident = db::find_active_incident(&mut tx, id)
            .await?
            .ok_or_else(|| FollowUpError::Internal(format!("incident {} vanished after insert", id)))?;
        tx.commit().await?;

        info!(
            incident_id = incident.id,
            severity = %incident.severity,
            "Incident created"
        );
        Ok(incident)
    }

    /// 获取未删除的事故；已软删除与不存在无法区分
    pub async fn get_incident(&self, id: i64) -> Result<Incident> {
        debug!(incident_id = id, "Fetching incident");

        let mut conn = self.db.pool().acquire().await?;
        db::find_active_incident(&mut conn, id)
            .await?
            .ok_or_else(|| incident_not_found(id))
    }

    /// 分页列出未删除事故，最新创建的在前
    pub async fn list_incidents(&self, skip: Option<i64>, limit: Option<i64>) -> Result<Vec<Incident>> {
        let (skip, limit) = self.pagination.resolve(skip, limit)?;
        debug!(skip, limit, "Listing incidents");

        let mut conn = self.db.pool().acquire().await?;
        db::list_active_incidents(&mut conn, skip, limit).await
    }

    /// 列出患者的未删除事故，按事故日期、时间倒序；不校验患者是否存在
    pub async fn list_incidents_by_patient(&self, patient_id: i64) -> Result<Vec<Incident>> {
        debug!(patient_id, "Listing incidents for patient");

        let mut conn = self.db.pool().acquire().await?;
        db::list_active_incidents_by_patient(&mut conn, patient_id).await
    }

    /// 患者目录中是否存在该患者
    pub async fn patient_exists(&self, patient_id: i64) -> Result<bool> {
        let mut conn = self.db.pool().acquire().await?;
        Ok(db::find_patient(&mut conn, patient_id).await?.is_some())
    }

    /// 部分更新：仅应用提供的字段
    pub async fn update_incident(&self, id: i64, update: IncidentUpdate) -> Result<Incident> {
        let description = update
            .description
            .as_deref()
            .map(normalize_description)
            .transpose()?;
        require_positive_opt("clinicianId", update.clinician_id)?;

        info!(incident_id = id, fields = ?update.provided_fields(), "Updating incident");

        let mut tx = self.db.begin_write().await?;
        let mut incident = match db::find_active_incident(&mut tx, id).await? {
            Some(incident) => incident,
            None => {
                warn!(incident_id = id, "Update failed: incident not found");
                return Err(incident_not_found(id));
            }
        };

        if let Some(severity) = update.severity {
            incident.severity = severity;
        }
        if let Some(description) = description {
            incident.description = description;
        }
        if let Some(status) = update.status {
            incident.status = self
                .state_machine
                .transition(incident.status, IncidentEvent::StatusSet(status));
        }
        if let Some(clinician_id) = update.clinician_id {
            incident.clinician_id = Some(clinician_id);
        }
        incident.updated_at = Utc::now();

        db::update_incident(&mut tx, &incident).await?;
        tx.commit().await?;

        info!(incident_id = id, status = %incident.status, "Incident updated");
        Ok(incident)
    }

    /// 软删除：置删除标记并强制关闭，记录保留
    pub async fn soft_delete_incident(&self, id: i64) -> Result<()> {
        info!(incident_id = id, "Soft-deleting incident");

        let mut tx = self.db.begin_write().await?;
        let mut incident = match db::find_active_incident(&mut tx, id).await? {
            Some(incident) => incident,
            None => {
                warn!(incident_id = id, "Soft-delete failed: incident not found");
                return Err(incident_not_found(id));
            }
        };

        incident.deleted = true;
        incident.status = self
            .state_machine
            .transition(incident.status, IncidentEvent::SoftDeleted);
        incident.updated_at = Utc::now();

        db::update_incident(&mut tx, &incident).await?;
        tx.commit().await?;

        info!(incident_id = id, "Incident soft-deleted");
        Ok(())
    }

    // ========== 跟进记录 ==========

    /// 新增跟进；事故为 Open 时同一事务内转为 InProgress
    pub async fn add_follow_up(&self, incident_id: i64, request: CreateFollowUp) -> Result<Suivi> {
        let actions_taken = normalize_actions(&request.actions_taken)?;
        require_positive_opt("clinicianId", request.clinician_id)?;

        info!(incident_id, "Adding follow-up");

        let mut tx = self.db.begin_write().await?;
        let mut incident = match db::find_active_incident(&mut tx, incident_id).await? {
            Some(incident) => incident,
            None => {
                warn!(incident_id, "Add follow-up failed: incident not found");
                return Err(incident_not_found(incident_id));
            }
        };

        let now = Utc::now();
        if self
            .state_machine
            .changes_state(incident.status, IncidentEvent::FollowUpAdded)
        {
            let from = incident.status;
            incident.status = self
                .state_machine
                .transition(from, IncidentEvent::FollowUpAdded);
            incident.updated_at = now;
            db::update_incident(&mut tx, &incident).await?;
            info!(incident_id, from = %from, to = %incident.status, "Incident status transitioned");
        }

        let suivi = db::insert_suivi(
            &mut tx,
            &NewSuivi {
                follow_up_date: request.follow_up_date,
                actions_taken,
                incident_id,
                clinician_id: request.clinician_id,
                created_at: now,
            },
        )
        .await?;
        tx.commit().await?;

        info!(incident_id, suivi_id = suivi.id, "Follow-up added");
        Ok(suivi)
    }

    /// 列出跟进记录，按日期正序；不校验事故是否存在
    pub async fn list_follow_ups(&self, incident_id: i64) -> Result<Vec<Suivi>> {
        debug!(incident_id, "Listing follow-ups");

        let mut conn = self.db.pool().acquire().await?;
        db::list_suivis(&mut conn, incident_id).await
    }
}

fn incident_not_found(id: i64) -> FollowUpError {
    FollowUpError::NotFound(format!("Incident {} not found", id))
}
