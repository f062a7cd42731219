use async_trait::async_trait;
use chrono::FixedOffset;
use sqlx::MySqlPool;

use super::{
    DUPLICATE_ACTION, EventStore, ProfileStore, SettingsStore, USERNAME_TAKEN, apply_patch,
    dedupe_key, event_dedupe_key,
};
use crate::error::{AppError, AppResult};
use crate::model::admin_log::{AdminLog, NewAdminLog};
use crate::model::announcement::Announcement;
use crate::model::attendance::{AttendanceEvent, EventPatch, NewAttendanceEvent, TimeWindow};
use crate::model::employee::{
    Credentials, EmployeeProfile, NewEmployee, capabilities_from_column, capabilities_to_column,
};

const ANNOUNCEMENT_ID: &str = "announcement";

pub struct MySqlStore {
    pool: MySqlPool,
    offset: FixedOffset,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool, offset: FixedOffset) -> Self {
        Self { pool, offset }
    }
}

/// Duplicate-entry violations (SQLSTATE 23000) become validation errors.
fn map_write_error(e: sqlx::Error, duplicate_message: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.code().as_deref() == Some("23000") {
            return AppError::validation(duplicate_message);
        }
    }
    AppError::from(e)
}

#[derive(sqlx::FromRow)]
struct EventRow {
    id: u64,
    employee_name: String,
    session_kind: String,
    action: String,
    note: Option<String>,
    month_index: u8,
    timestamp_ms: i64,
    is_edited: bool,
}

impl TryFrom<EventRow> for AttendanceEvent {
    type Error = AppError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let corrupt = |field: &str| AppError::Internal(format!("attendance_logs.{field} unreadable (id {})", row.id));
        Ok(AttendanceEvent {
            id: row.id,
            session_kind: row.session_kind.parse().map_err(|_| corrupt("session_kind"))?,
            action: row.action.parse().map_err(|_| corrupt("action"))?,
            employee_name: row.employee_name,
            note: row.note,
            occurred_at: row.timestamp_ms,
            month_index: u32::from(row.month_index),
            is_edited: row.is_edited,
        })
    }
}

#[derive(sqlx::FromRow)]
struct EmployeeRow {
    id: u64,
    username: String,
    display_name: String,
    role: String,
    capabilities: String,
    password_hash: String,
    last_updated: i64,
}

impl TryFrom<EmployeeRow> for Credentials {
    type Error = AppError;

    fn try_from(row: EmployeeRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .parse()
            .map_err(|_| AppError::Internal(format!("employees.role unreadable (id {})", row.id)))?;
        Ok(Credentials {
            profile: EmployeeProfile {
                id: row.id,
                username: row.username,
                display_name: row.display_name,
                role,
                capabilities: capabilities_from_column(&row.capabilities),
            },
            password_hash: row.password_hash,
            last_updated: row.last_updated,
        })
    }
}

#[derive(sqlx::FromRow)]
struct AdminLogRow {
    id: u64,
    admin: String,
    aksi: String,
    timestamp_ms: i64,
}

impl From<AdminLogRow> for AdminLog {
    fn from(row: AdminLogRow) -> Self {
        AdminLog {
            id: row.id,
            admin: row.admin,
            action: row.aksi,
            occurred_at: row.timestamp_ms,
        }
    }
}

const EVENT_COLUMNS: &str =
    "id, employee_name, session_kind, action, note, month_index, timestamp_ms, is_edited";

const EMPLOYEE_COLUMNS: &str =
    "id, username, display_name, role, capabilities, password_hash, last_updated";

#[async_trait]
impl EventStore for MySqlStore {
    async fn list_events(&self, window: Option<TimeWindow>) -> AppResult<Vec<AttendanceEvent>> {
        let rows = match window {
            Some(w) => {
                sqlx::query_as::<_, EventRow>(&format!(
                    "SELECT {EVENT_COLUMNS} FROM attendance_logs \
                     WHERE timestamp_ms >= ? AND timestamp_ms < ? \
                     ORDER BY timestamp_ms, id"
                ))
                .bind(w.start)
                .bind(w.end)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, EventRow>(&format!(
                    "SELECT {EVENT_COLUMNS} FROM attendance_logs ORDER BY timestamp_ms, id"
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };
        rows.into_iter().map(AttendanceEvent::try_from).collect()
    }

    async fn get_event(&self, id: u64) -> AppResult<Option<AttendanceEvent>> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM attendance_logs WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(AttendanceEvent::try_from).transpose()
    }

    async fn append_event(&self, event: NewAttendanceEvent) -> AppResult<AttendanceEvent> {
        let key = dedupe_key(
            &event.employee_name,
            event.session_kind,
            event.action,
            event.occurred_at,
            &self.offset,
        );

        // The unique index on dedupe_key serializes concurrent writers.
        let result = sqlx::query(
            r#"
            INSERT INTO attendance_logs
            (employee_name, session_kind, action, note, month_index, timestamp_ms, is_edited, dedupe_key)
            VALUES (?, ?, ?, ?, ?, ?, FALSE, ?)
            "#,
        )
        .bind(&event.employee_name)
        .bind(event.session_kind.to_string())
        .bind(event.action.to_string())
        .bind(&event.note)
        .bind(event.month_index)
        .bind(event.occurred_at)
        .bind(key)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, DUPLICATE_ACTION))?;

        Ok(event.into_event(result.last_insert_id()))
    }

    async fn update_event(&self, id: u64, patch: EventPatch) -> AppResult<AttendanceEvent> {
        let mut event = self
            .get_event(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Attendance log".to_string()))?;
        apply_patch(&mut event, patch, &self.offset)?;

        sqlx::query(
            r#"
            UPDATE attendance_logs
            SET action = ?, note = ?, month_index = ?, timestamp_ms = ?, is_edited = TRUE, dedupe_key = ?
            WHERE id = ?
            "#,
        )
        .bind(event.action.to_string())
        .bind(&event.note)
        .bind(event.month_index)
        .bind(event.occurred_at)
        .bind(event_dedupe_key(&event, &self.offset))
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, DUPLICATE_ACTION))?;

        Ok(event)
    }

    async fn delete_event(&self, id: u64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM attendance_logs WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Attendance log".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for MySqlStore {
    async fn find_credentials(&self, username: &str) -> AppResult<Option<Credentials>> {
        let row = sqlx::query_as::<_, EmployeeRow>(&format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE username = ?"
        ))
        .bind(username.to_lowercase())
        .fetch_optional(&self.pool)
        .await?;
        row.map(Credentials::try_from).transpose()
    }

    async fn list_profiles(&self) -> AppResult<Vec<EmployeeProfile>> {
        let rows = sqlx::query_as::<_, EmployeeRow>(&format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(|row| Credentials::try_from(row).map(|c| c.profile))
            .collect()
    }

    async fn create_profile(
        &self,
        employee: &NewEmployee,
        password_hash: &str,
        created_at: i64,
    ) -> AppResult<EmployeeProfile> {
        let username = employee.username.to_lowercase();
        let result = sqlx::query(
            r#"
            INSERT INTO employees
            (username, display_name, role, capabilities, password_hash, last_updated)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&username)
        .bind(&employee.display_name)
        .bind(employee.role.to_string())
        .bind(capabilities_to_column(&employee.capabilities))
        .bind(password_hash)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, USERNAME_TAKEN))?;

        Ok(EmployeeProfile {
            id: result.last_insert_id(),
            username,
            display_name: employee.display_name.clone(),
            role: employee.role,
            capabilities: employee.capabilities.clone(),
        })
    }

    async fn update_password(
        &self,
        username: &str,
        password_hash: &str,
        updated_at: i64,
    ) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE employees SET password_hash = ?, last_updated = ? WHERE username = ?",
        )
        .bind(password_hash)
        .bind(updated_at)
        .bind(username.to_lowercase())
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Employee".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for MySqlStore {
    async fn announcement(&self) -> AppResult<Option<Announcement>> {
        let row = sqlx::query_as::<_, (String, String, i64)>(
            "SELECT text, updated_by, timestamp_ms FROM settings WHERE id = ?",
        )
        .bind(ANNOUNCEMENT_ID)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(text, updated_by, updated_at)| Announcement {
            text,
            updated_by,
            updated_at,
        }))
    }

    async fn put_announcement(&self, announcement: Announcement) -> AppResult<Announcement> {
        sqlx::query(
            r#"
            INSERT INTO settings (id, text, updated_by, timestamp_ms)
            VALUES (?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                text = VALUES(text),
                updated_by = VALUES(updated_by),
                timestamp_ms = VALUES(timestamp_ms)
            "#,
        )
        .bind(ANNOUNCEMENT_ID)
        .bind(&announcement.text)
        .bind(&announcement.updated_by)
        .bind(announcement.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(announcement)
    }

    async fn append_admin_log(&self, entry: NewAdminLog) -> AppResult<AdminLog> {
        let result =
            sqlx::query("INSERT INTO admin_logs (admin, aksi, timestamp_ms) VALUES (?, ?, ?)")
                .bind(&entry.admin)
                .bind(&entry.action)
                .bind(entry.occurred_at)
                .execute(&self.pool)
                .await?;
        Ok(AdminLog {
            id: result.last_insert_id(),
            admin: entry.admin,
            action: entry.action,
            occurred_at: entry.occurred_at,
        })
    }

    async fn list_admin_logs(&self, limit: u32) -> AppResult<Vec<AdminLog>> {
        let rows = sqlx::query_as::<_, AdminLogRow>(
            r#"
            SELECT id, admin, aksi, timestamp_ms
            FROM admin_logs
            ORDER BY timestamp_ms DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(AdminLog::from).collect())
    }
}
