//! Primary tier: the relational backend over sqlx/MySQL.
//!
//! This is the only tier that accepts writes. Field-name translation between
//! the internal camelCase record shape and the snake_case column names
//! (including the historical `signature_base_64` column) lives entirely here.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};

use crate::model::leave_record::{LeaveRecord, LeaveStatus, LeaveType};
use crate::model::school::School;
use crate::model::teacher::Teacher;
use crate::sync::error::SyncError;
use crate::sync::{Directory, RemoteStore};

pub struct SqlBackend {
    pool: MySqlPool,
}

impl SqlBackend {
    /// Lazy pool: nothing touches the network until the first query, so a
    /// dead database surfaces as a failed startup read and triggers the
    /// fallback chain, exactly like any other backend exception.
    pub fn new(database_url: &str) -> Result<Self, SyncError> {
        let pool = MySqlPool::connect_lazy(database_url)?;
        Ok(Self { pool })
    }
}

fn row_to_teacher(row: &MySqlRow) -> Result<Teacher, SyncError> {
    let roles: String = row.try_get("roles")?;
    Ok(Teacher {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        school_id: row.try_get("school_id")?,
        position: row.try_get("position")?,
        roles: roles
            .split(',')
            .filter(|r| !r.is_empty())
            .map(str::to_string)
            .collect(),
    })
}

fn row_to_school(row: &MySqlRow) -> Result<School, SyncError> {
    Ok(School {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        address: row.try_get("address")?,
    })
}

fn row_to_leave(row: &MySqlRow) -> Result<LeaveRecord, SyncError> {
    let leave_type: String = row.try_get("leave_type")?;
    let status: String = row.try_get("status")?;
    Ok(LeaveRecord {
        id: row.try_get("id")?,
        teacher_id: row.try_get("teacher_id")?,
        teacher_name: row.try_get("teacher_name")?,
        leave_type: leave_type
            .parse::<LeaveType>()
            .map_err(|_| SyncError::Decode(format!("unknown leave type `{leave_type}`")))?,
        start_date: row.try_get::<NaiveDate, _>("start_date")?,
        end_date: row.try_get::<NaiveDate, _>("end_date")?,
        start_time: row.try_get::<Option<NaiveTime>, _>("start_time")?,
        end_time: row.try_get::<Option<NaiveTime>, _>("end_time")?,
        reason: row.try_get("reason")?,
        status: status
            .parse::<LeaveStatus>()
            .map_err(|_| SyncError::Decode(format!("unknown leave status `{status}`")))?,
        teacher_signature: row.try_get::<Option<String>, _>("signature_base_64")?,
        director_signature: row.try_get::<Option<String>, _>("director_signature")?,
        approved_date: row.try_get::<Option<NaiveDate>, _>("approved_date")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

#[async_trait::async_trait]
impl RemoteStore for SqlBackend {
    async fn load_directory(&self) -> Result<Directory, SyncError> {
        let teacher_rows =
            sqlx::query("SELECT id, name, school_id, position, roles FROM teachers")
                .fetch_all(&self.pool)
                .await?;
        let school_rows = sqlx::query("SELECT id, name, address FROM schools")
            .fetch_all(&self.pool)
            .await?;

        Ok(Directory {
            teachers: teacher_rows
                .iter()
                .map(row_to_teacher)
                .collect::<Result<_, _>>()?,
            schools: school_rows
                .iter()
                .map(row_to_school)
                .collect::<Result<_, _>>()?,
        })
    }

    async fn load_leaves(&self) -> Result<Vec<LeaveRecord>, SyncError> {
        let rows = sqlx::query(
            r#"
            SELECT id, teacher_id, teacher_name, leave_type, start_date, end_date,
                   start_time, end_time, reason, status, signature_base_64,
                   director_signature, approved_date, created_at
            FROM leave_requests
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_leave).collect()
    }

    async fn insert_leave(&self, record: &LeaveRecord) -> Result<(), SyncError> {
        sqlx::query(
            r#"
            INSERT INTO leave_requests
                (id, teacher_id, teacher_name, leave_type, start_date, end_date,
                 start_time, end_time, reason, status, signature_base_64, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.teacher_id)
        .bind(&record.teacher_name)
        .bind(record.leave_type.to_string())
        .bind(record.start_date)
        .bind(record.end_date)
        .bind(record.start_time)
        .bind(record.end_time)
        .bind(&record.reason)
        .bind(record.status.to_string())
        .bind(&record.teacher_signature)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn apply_decision(
        &self,
        id: &str,
        status: LeaveStatus,
        approved_date: NaiveDate,
        director_signature: Option<&str>,
    ) -> Result<(), SyncError> {
        let result = sqlx::query(
            r#"
            UPDATE leave_requests
            SET status = ?, approved_date = ?, director_signature = ?
            WHERE id = ?
            AND status = 'pending'
            "#,
        )
        .bind(status.to_string())
        .bind(approved_date)
        .bind(director_signature)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(SyncError::NotFound(id.to_string()));
        }
        Ok(())
    }
}
