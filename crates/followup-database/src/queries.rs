//! 数据库查询操作
//!
//! 每个函数接收显式的连接/事务句柄，由调用方决定事务边界。

use crate::connection::DatabasePool;
use crate::models::*;
use chrono::Utc;
use followup_core::{Incident, PatientRecord, Result, Suivi};
use sqlx::SqliteConnection;

const INCIDENT_COLUMNS: &str = "id, incident_date, incident_time, severity, description, status, \
     patient_id, implant_id, processor_id, clinician_id, created_at, updated_at, deleted";

const SUIVI_COLUMNS: &str =
    "id, follow_up_date, actions_taken, incident_id, clinician_id, created_at";

/// 创建数据库表
pub async fn create_tables(db: &DatabasePool) -> Result<()> {
    let pool = db.pool();

    // 创建患者表
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS patients (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            last_name TEXT NOT NULL,
            first_name TEXT NOT NULL,
            birth_date TEXT,
            sex TEXT,
            implantation_date TEXT,
            current_implant_id INTEGER,
            created_at TEXT NOT NULL
        )
    "#,
    )
    .execute(pool)
    .await?;

    // 创建事故表
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS incidents (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            incident_date TEXT NOT NULL,
            incident_time TEXT NOT NULL,
            severity TEXT NOT NULL CHECK (severity IN ('Minor', 'Moderate', 'Major', 'Critical')),
            description TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'Open' CHECK (status IN ('Open', 'InProgress', 'Resolved', 'Closed')),
            patient_id INTEGER NOT NULL REFERENCES patients(id),
            implant_id INTEGER,
            processor_id INTEGER,
            clinician_id INTEGER,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            deleted INTEGER NOT NULL DEFAULT 0
        )
    "#,
    )
    .execute(pool)
    .await?;

    // 创建跟进记录表
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS incident_follow_ups (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            follow_up_date TEXT NOT NULL,
            actions_taken TEXT NOT NULL,
            incident_id INTEGER NOT NULL REFERENCES incidents(id),
            clinician_id INTEGER,
            created_at TEXT NOT NULL
        )
    "#,
    )
    .execute(pool)
    .await?;

    create_indexes(db).await?;

    tracing::info!("Database tables created successfully");
    Ok(())
}

/// 创建数据库索引
async fn create_indexes(db: &DatabasePool) -> Result<()> {
    let pool = db.pool();

    let indexes = [
        "CREATE INDEX IF NOT EXISTS idx_incidents_patient_id ON incidents(patient_id)",
        "CREATE INDEX IF NOT EXISTS idx_incidents_created_at ON incidents(created_at)",
        "CREATE INDEX IF NOT EXISTS idx_incidents_deleted ON incidents(deleted)",
        "CREATE INDEX IF NOT EXISTS idx_follow_ups_incident_id ON incident_follow_ups(incident_id)",
    ];

    for index_sql in indexes {
        sqlx::query(index_sql).execute(pool).await?;
    }

    tracing::debug!("Database indexes created successfully");
    Ok(())
}

// ========== 患者目录 ==========

/// 根据ID查找患者
pub async fn find_patient(conn: &mut SqliteConnection, id: i64) -> Result<Option<PatientRecord>> {
    let result = sqlx::query_as::<_, DbPatient>(
        "SELECT id, last_name, first_name, birth_date, sex, implantation_date, current_implant_id \
         FROM patients WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(result.map(PatientRecord::from))
}

/// 登记患者（初始化数据与测试使用）
pub async fn insert_patient(conn: &mut SqliteConnection, patient: &NewPatient) -> Result<i64> {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO patients (last_name, first_name, birth_date, sex, implantation_date, current_implant_id, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        RETURNING id
    "#,
    )
    .bind(&patient.last_name)
    .bind(&patient.first_name)
    .bind(patient.birth_date)
    .bind(&patient.sex)
    .bind(patient.implantation_date)
    .bind(patient.current_implant_id)
    .bind(Utc::now())
    .fetch_one(&mut *conn)
    .await?;

    Ok(id)
}

// ========== 事故相关操作 ==========

/// 插入事故，返回新ID
pub async fn insert_incident(conn: &mut SqliteConnection, incident: &NewIncident) -> Result<i64> {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO incidents (incident_date, incident_time, severity, description, status,
                               patient_id, implant_id, processor_id, clinician_id,
                               created_at, updated_at, deleted)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0)
        RETURNING id
    "#,
    )
    .bind(incident.incident_date)
    .bind(incident.incident_time)
    .bind(incident.severity.as_str())
    .bind(&incident.description)
    .bind(incident.status.as_str())
    .bind(incident.patient_id)
    .bind(incident.implant_id)
    .bind(incident.processor_id)
    .bind(incident.clinician_id)
    .bind(incident.created_at)
    .bind(incident.created_at)
    .fetch_one(&mut *conn)
    .await?;

    Ok(id)
}

/// 查找未删除的事故
pub async fn find_active_incident(conn: &mut SqliteConnection, id: i64) -> Result<Option<Incident>> {
    let sql = format!(
        "SELECT {} FROM incidents WHERE id = ? AND deleted = 0",
        INCIDENT_COLUMNS
    );
    let result = sqlx::query_as::<_, DbIncident>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    result.map(Incident::try_from).transpose()
}

/// 不过滤软删除标记地查找事故（审计检查使用）
pub async fn find_incident_including_deleted(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<Incident>> {
    let sql = format!("SELECT {} FROM incidents WHERE id = ?", INCIDENT_COLUMNS);
    let result = sqlx::query_as::<_, DbIncident>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    result.map(Incident::try_from).transpose()
}

/// 分页列出未删除事故，按创建时间倒序
pub async fn list_active_incidents(
    conn: &mut SqliteConnection,
    skip: i64,
    limit: i64,
) -> Result<Vec<Incident>> {
    let sql = format!(
        "SELECT {} FROM incidents WHERE deleted = 0 \
         ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
        INCIDENT_COLUMNS
    );
    let results = sqlx::query_as::<_, DbIncident>(&sql)
        .bind(limit)
        .bind(skip)
        .fetch_all(&mut *conn)
        .await?;

    results.into_iter().map(Incident::try_from).collect()
}

/// 列出患者的未删除事故，按事故日期、时间倒序
pub async fn list_active_incidents_by_patient(
    conn: &mut SqliteConnection,
    patient_id: i64,
) -> Result<Vec<Incident>> {
    let sql = format!(
        "SELECT {} FROM incidents WHERE patient_id = ? AND deleted = 0 \
         ORDER BY incident_date DESC, incident_time DESC",
        INCIDENT_COLUMNS
    );
    let results = sqlx::query_as::<_, DbIncident>(&sql)
        .bind(patient_id)
        .fetch_all(&mut *conn)
        .await?;

    results.into_iter().map(Incident::try_from).collect()
}

/// 写回事故的可变字段
pub async fn update_incident(conn: &mut SqliteConnection, incident: &Incident) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE incidents
        SET severity = ?, description = ?, status = ?, clinician_id = ?, updated_at = ?, deleted = ?
        WHERE id = ?
    "#,
    )
    .bind(incident.severity.as_str())
    .bind(&incident.description)
    .bind(incident.status.as_str())
    .bind(incident.clinician_id)
    .bind(incident.updated_at)
    .bind(incident.deleted)
    .bind(incident.id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// 事故总行数，包含已软删除的记录
pub async fn count_incidents(conn: &mut SqliteConnection) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM incidents")
        .fetch_one(&mut *conn)
        .await?;
    Ok(count)
}

// ========== 跟进记录相关操作 ==========

/// 插入跟进记录
pub async fn insert_suivi(conn: &mut SqliteConnection, suivi: &NewSuivi) -> Result<Suivi> {
    let sql = format!(
        "INSERT INTO incident_follow_ups (follow_up_date, actions_taken, incident_id, clinician_id, created_at) \
         VALUES (?, ?, ?, ?, ?) RETURNING {}",
        SUIVI_COLUMNS
    );
    let row = sqlx::query_as::<_, DbSuivi>(&sql)
        .bind(suivi.follow_up_date)
        .bind(&suivi.actions_taken)
        .bind(suivi.incident_id)
        .bind(suivi.clinician_id)
        .bind(suivi.created_at)
        .fetch_one(&mut *conn)
        .await?;

    Ok(Suivi::from(row))
}

/// 列出事故的全部跟进记录，按跟进日期正序
pub async fn list_suivis(conn: &mut SqliteConnection, incident_id: i64) -> Result<Vec<Suivi>> {
    let sql = format!(
        "SELECT {} FROM incident_follow_ups WHERE incident_id = ? \
         ORDER BY follow_up_date ASC, id ASC",
        SUIVI_COLUMNS
    );
    let results = sqlx::query_as::<_, DbSuivi>(&sql)
        .bind(incident_id)
        .fetch_all(&mut *conn)
        .await?;

    Ok(results.into_iter().map(Suivi::from).collect())
}
