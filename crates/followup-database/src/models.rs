//! 数据库模型

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use followup_core::models::*;
use followup_core::FollowUpError;
use sqlx::FromRow;

// 数据库表模型 - 使用FromRow trait用于SQL查询

/// 数据库患者表
#[derive(Debug, FromRow)]
pub struct DbPatient {
    pub id: i64,
    pub last_name: String,
    pub first_name: String,
    pub birth_date: Option<NaiveDate>,
    pub sex: Option<String>,
    pub implantation_date: Option<NaiveDate>,
    pub current_implant_id: Option<i64>,
}

impl From<DbPatient> for PatientRecord {
    fn from(db_patient: DbPatient) -> Self {
        PatientRecord {
            id: db_patient.id,
            last_name: db_patient.last_name,
            first_name: db_patient.first_name,
            birth_date: db_patient.birth_date,
            sex: db_patient.sex,
            implantation_date: db_patient.implantation_date,
            current_implant_id: db_patient.current_implant_id,
        }
    }
}

/// 数据库事故表
#[derive(Debug, FromRow)]
pub struct DbIncident {
    pub id: i64,
    pub incident_date: NaiveDate,
    pub incident_time: NaiveTime,
    pub severity: String, // 存储为字符串，转换为Severity枚举
    pub description: String,
    pub status: String, // 存储为字符串，转换为IncidentStatus枚举
    pub patient_id: i64,
    pub implant_id: Option<i64>,
    pub processor_id: Option<i64>,
    pub clinician_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted: bool,
}

impl TryFrom<DbIncident> for Incident {
    type Error = FollowUpError;

    fn try_from(db_incident: DbIncident) -> Result<Self, Self::Error> {
        // 库中出现未知取值属于数据损坏，而非调用方输入错误
        let severity = db_incident.severity.parse::<Severity>().map_err(|_| {
            FollowUpError::Database(format!(
                "incident {} has unknown severity '{}'",
                db_incident.id, db_incident.severity
            ))
        })?;
        let status = db_incident.status.parse::<IncidentStatus>().map_err(|_| {
            FollowUpError::Database(format!(
                "incident {} has unknown status '{}'",
                db_incident.id, db_incident.status
            ))
        })?;

        Ok(Incident {
            id: db_incident.id,
            incident_date: db_incident.incident_date,
            incident_time: db_incident.incident_time,
            severity,
            description: db_incident.description,
            status,
            patient_id: db_incident.patient_id,
            implant_id: db_incident.implant_id,
            processor_id: db_incident.processor_id,
            clinician_id: db_incident.clinician_id,
            created_at: db_incident.created_at,
            updated_at: db_incident.updated_at,
            deleted: db_incident.deleted,
        })
    }
}

/// 数据库跟进记录表
#[derive(Debug, FromRow)]
pub struct DbSuivi {
    pub id: i64,
    pub follow_up_date: NaiveDate,
    pub actions_taken: String,
    pub incident_id: i64,
    pub clinician_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl From<DbSuivi> for Suivi {
    fn from(db_suivi: DbSuivi) -> Self {
        Suivi {
            id: db_suivi.id,
            follow_up_date: db_suivi.follow_up_date,
            actions_taken: db_suivi.actions_taken,
            incident_id: db_suivi.incident_id,
            clinician_id: db_suivi.clinician_id,
            created_at: db_suivi.created_at,
        }
    }
}

// 插入模型 - 用于创建新记录

/// 新患者插入模型
#[derive(Debug, Clone)]
pub struct NewPatient {
    pub last_name: String,
    pub first_name: String,
    pub birth_date: Option<NaiveDate>,
    pub sex: Option<String>,
    pub implantation_date: Option<NaiveDate>,
    pub current_implant_id: Option<i64>,
}

impl NewPatient {
    pub fn new(last_name: &str, first_name: &str) -> Self {
        Self {
            last_name: last_name.to_string(),
            first_name: first_name.to_string(),
            birth_date: None,
            sex: None,
            implantation_date: None,
            current_implant_id: None,
        }
    }

    pub fn with_implant(mut self, implant_id: i64) -> Self {
        self.current_implant_id = Some(implant_id);
        self
    }
}

/// 新事故插入模型，描述已规范化
#[derive(Debug, Clone)]
pub struct NewIncident {
    pub incident_date: NaiveDate,
    pub incident_time: NaiveTime,
    pub severity: Severity,
    pub description: String,
    pub status: IncidentStatus,
    pub patient_id: i64,
    pub implant_id: Option<i64>,
    pub processor_id: Option<i64>,
    pub clinician_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl NewIncident {
    /// 由已校验的请求构造，初始状态为 Open
    pub fn from_request(request: &CreateIncident, description: String, now: DateTime<Utc>) -> Self {
        Self {
            incident_date: request.incident_date,
            incident_time: request.incident_time,
            severity: request.severity,
            description,
            status: IncidentStatus::default(),
            patient_id: request.patient_id,
            implant_id: request.implant_id,
            processor_id: request.processor_id,
            clinician_id: request.clinician_id,
            created_at: now,
        }
    }
}

/// 新跟进记录插入模型
#[derive(Debug, Clone)]
pub struct NewSuivi {
    pub follow_up_date: NaiveDate,
    pub actions_taken: String,
    pub incident_id: i64,
    pub clinician_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}
