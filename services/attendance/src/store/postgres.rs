//! PostgreSQL storage backends
//!
//! One store struct per table, all sharing the same connection pool.
//! Row mapping is done by hand because `role`, `status` and `schedule`
//! are stored as text and must be parsed back into their closed types;
//! a row that fails to parse aborts the operation instead of guessing.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use crate::models::{
    AttendanceRecord, AttendanceStatus, Class, NewAttendance, NewClass, NewUser, Role, User,
};
use crate::store::{AttendanceInsert, AttendanceStore, ClassStore, StoreError, StoreResult, UserStore};

use common::error::{DatabaseError, DatabaseResult};

/// Create the tables and uniqueness indexes if they do not exist yet.
/// The DDL is idempotent, so running it on every boot is safe.
pub async fn ensure_schema(pool: &PgPool) -> DatabaseResult<()> {
    sqlx::raw_sql(include_str!("schema.sql"))
        .execute(pool)
        .await
        .map_err(|e| DatabaseError::Schema(e.to_string()))?;

    info!("Database schema is in place");
    Ok(())
}

fn user_from_row(row: &PgRow) -> StoreResult<User> {
    let role_text: String = row.get("role");
    let role = Role::parse(&role_text).ok_or_else(|| {
        StoreError::Unavailable(format!("stored role {role_text:?} is not recognized"))
    })?;

    Ok(User {
        id: row.get("id"),
        username: row.get("username"),
        full_name: row.get("full_name"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role,
        created_at: row.get("created_at"),
    })
}

fn class_from_row(row: &PgRow) -> StoreResult<Class> {
    let schedule_text: String = row.get("schedule");
    let schedule = serde_json::from_str(&schedule_text).map_err(|e| {
        StoreError::Unavailable(format!("stored schedule failed to parse: {e}"))
    })?;

    Ok(Class {
        id: row.get("id"),
        name: row.get("name"),
        teacher_id: row.get("teacher_id"),
        room: row.get("room"),
        schedule,
    })
}

fn attendance_from_row(row: &PgRow) -> StoreResult<AttendanceRecord> {
    let status_text: String = row.get("status");
    let status = AttendanceStatus::parse(&status_text).ok_or_else(|| {
        StoreError::Unavailable(format!("stored status {status_text:?} is not recognized"))
    })?;

    Ok(AttendanceRecord {
        id: row.get("id"),
        class_id: row.get("class_id"),
        student_id: row.get("student_id"),
        date: row.get("date"),
        status,
    })
}

/// User store backed by PostgreSQL
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn get(&self, id: Uuid) -> StoreResult<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, username, full_name, email, password_hash, role, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn get_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, username, full_name, email, password_hash, role, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn insert(&self, new_user: NewUser) -> StoreResult<User> {
        info!("Creating new user: {}", new_user.username);

        let row = sqlx::query(
            r#"
            INSERT INTO users (id, username, full_name, email, password_hash, role)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, username, full_name, email, password_hash, role, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_user.username)
        .bind(&new_user.full_name)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(new_user.role.as_str())
        .fetch_one(&self.pool)
        .await?;

        user_from_row(&row)
    }
}

/// Class store backed by PostgreSQL
#[derive(Clone)]
pub struct PgClassStore {
    pool: PgPool,
}

impl PgClassStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClassStore for PgClassStore {
    async fn get(&self, id: Uuid) -> StoreResult<Option<Class>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, teacher_id, room, schedule
            FROM classes
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(class_from_row).transpose()
    }

    async fn insert(&self, new_class: NewClass) -> StoreResult<Class> {
        info!("Creating new class: {}", new_class.name);

        let schedule_text = serde_json::to_string(&new_class.schedule).map_err(|e| {
            StoreError::Unavailable(format!("schedule failed to serialize: {e}"))
        })?;

        let row = sqlx::query(
            r#"
            INSERT INTO classes (id, name, teacher_id, room, schedule)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, teacher_id, room, schedule
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_class.name)
        .bind(new_class.teacher_id)
        .bind(&new_class.room)
        .bind(&schedule_text)
        .fetch_one(&self.pool)
        .await?;

        class_from_row(&row)
    }

    async fn list(&self) -> StoreResult<Vec<Class>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, teacher_id, room, schedule
            FROM classes
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(class_from_row).collect()
    }

    async fn list_by_teacher(&self, teacher_id: Uuid) -> StoreResult<Vec<Class>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, teacher_id, room, schedule
            FROM classes
            WHERE teacher_id = $1
            ORDER BY name
            "#,
        )
        .bind(teacher_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(class_from_row).collect()
    }
}

/// Attendance store backed by PostgreSQL
#[derive(Clone)]
pub struct PgAttendanceStore {
    pool: PgPool,
}

impl PgAttendanceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AttendanceStore for PgAttendanceStore {
    async fn insert_if_absent(&self, record: NewAttendance) -> StoreResult<AttendanceInsert> {
        // The unique index on (class_id, student_id, date) makes the
        // conflict check and the insert one atomic statement; RETURNING
        // yields a row only when this call actually wrote it.
        let inserted = sqlx::query(
            r#"
            INSERT INTO attendance (id, class_id, student_id, date, status)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (class_id, student_id, date) DO NOTHING
            RETURNING id, class_id, student_id, date, status
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(record.class_id)
        .bind(record.student_id)
        .bind(record.date)
        .bind(record.status.as_str())
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = inserted {
            return Ok(AttendanceInsert::Inserted(attendance_from_row(&row)?));
        }

        let existing = sqlx::query(
            r#"
            SELECT id, class_id, student_id, date, status
            FROM attendance
            WHERE class_id = $1 AND student_id = $2 AND date = $3
            "#,
        )
        .bind(record.class_id)
        .bind(record.student_id)
        .bind(record.date)
        .fetch_optional(&self.pool)
        .await?;

        match existing {
            Some(row) => Ok(AttendanceInsert::AlreadyRecorded(attendance_from_row(&row)?)),
            // Nothing deletes attendance rows, so the winner of the
            // conflict must still be visible.
            None => Err(StoreError::Unavailable(
                "attendance row missing after conflict".to_string(),
            )),
        }
    }

    async fn update_status(
        &self,
        class_id: Uuid,
        student_id: Uuid,
        date: NaiveDate,
        status: AttendanceStatus,
    ) -> StoreResult<Option<AttendanceRecord>> {
        let row = sqlx::query(
            r#"
            UPDATE attendance
            SET status = $4
            WHERE class_id = $1 AND student_id = $2 AND date = $3
            RETURNING id, class_id, student_id, date, status
            "#,
        )
        .bind(class_id)
        .bind(student_id)
        .bind(date)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(attendance_from_row).transpose()
    }

    async fn list_by_class(&self, class_id: Uuid) -> StoreResult<Vec<AttendanceRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, class_id, student_id, date, status
            FROM attendance
            WHERE class_id = $1
            ORDER BY date, student_id
            "#,
        )
        .bind(class_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(attendance_from_row).collect()
    }

    async fn list_by_student(&self, student_id: Uuid) -> StoreResult<Vec<AttendanceRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, class_id, student_id, date, status
            FROM attendance
            WHERE student_id = $1
            ORDER BY date, class_id
            "#,
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(attendance_from_row).collect()
    }
}
