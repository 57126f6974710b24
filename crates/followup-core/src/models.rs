//! 核心数据模型定义

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::FollowUpError;

/// 事故严重程度
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Severity {
    Minor,
    Moderate,
    Major,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Minor => "Minor",
            Severity::Moderate => "Moderate",
            Severity::Major => "Major",
            Severity::Critical => "Critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = FollowUpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Minor" => Ok(Severity::Minor),
            "Moderate" => Ok(Severity::Moderate),
            "Major" => Ok(Severity::Major),
            "Critical" => Ok(Severity::Critical),
            other => Err(FollowUpError::InvalidArgument(format!(
                "未知的严重程度: {}",
                other
            ))),
        }
    }
}

/// 事故处理状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum IncidentStatus {
    Open,       // 已上报
    InProgress, // 处理中
    Resolved,   // 已解决
    Closed,     // 已关闭
}

impl IncidentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentStatus::Open => "Open",
            IncidentStatus::InProgress => "InProgress",
            IncidentStatus::Resolved => "Resolved",
            IncidentStatus::Closed => "Closed",
        }
    }
}

impl Default for IncidentStatus {
    fn default() -> Self {
        IncidentStatus::Open
    }
}

impl fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IncidentStatus {
    type Err = FollowUpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Open" => Ok(IncidentStatus::Open),
            "InProgress" => Ok(IncidentStatus::InProgress),
            "Resolved" => Ok(IncidentStatus::Resolved),
            "Closed" => Ok(IncidentStatus::Closed),
            other => Err(FollowUpError::InvalidArgument(format!(
                "未知的事故状态: {}",
                other
            ))),
        }
    }
}

/// 植入物事故
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    pub id: i64,
    pub incident_date: NaiveDate,
    pub incident_time: NaiveTime,
    pub severity: Severity,
    pub description: String,
    pub status: IncidentStatus,
    pub patient_id: i64,
    pub implant_id: Option<i64>,
    pub processor_id: Option<i64>,
    pub clinician_id: Option<i64>, // 负责医生
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// 软删除标记，不对外输出
    #[serde(skip)]
    pub deleted: bool,
}

/// 事故跟进记录 (suivi)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Suivi {
    pub id: i64,
    pub follow_up_date: NaiveDate,
    pub actions_taken: String,
    pub incident_id: i64,
    pub clinician_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// 患者目录记录，只读
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PatientRecord {
    pub id: i64,
    pub last_name: String,
    pub first_name: String,
    pub birth_date: Option<NaiveDate>,
    pub sex: Option<String>,
    pub implantation_date: Option<NaiveDate>,
    pub current_implant_id: Option<i64>,
}

/// 创建事故请求
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIncident {
    pub incident_date: NaiveDate,
    pub incident_time: NaiveTime,
    pub severity: Severity,
    pub description: String,
    pub patient_id: i64,
    #[serde(default)]
    pub implant_id: Option<i64>,
    #[serde(default)]
    pub processor_id: Option<i64>,
    #[serde(default)]
    pub clinician_id: Option<i64>,
}

/// 事故部分更新请求，缺省字段保持原值
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentUpdate {
    #[serde(default)]
    pub severity: Option<Severity>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<IncidentStatus>,
    #[serde(default)]
    pub clinician_id: Option<i64>,
}

impl IncidentUpdate {
    /// 已提供的字段名，用于日志
    pub fn provided_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.severity.is_some() {
            fields.push("severity");
        }
        if self.description.is_some() {
            fields.push("description");
        }
        if self.status.is_some() {
            fields.push("status");
        }
        if self.clinician_id.is_some() {
            fields.push("clinicianId");
        }
        fields
    }
}

/// 新增跟进请求
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFollowUp {
    pub follow_up_date: NaiveDate,
    pub actions_taken: String,
    #[serde(default)]
    pub clinician_id: Option<i64>,
}
