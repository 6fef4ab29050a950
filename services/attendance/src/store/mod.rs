//! Storage backends for users, classes and attendance records
//!
//! The services talk to storage through the narrow traits in this
//! module, so the integrity rules can be exercised against the in-memory
//! backend while production runs on PostgreSQL.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{AttendanceRecord, AttendanceStatus, Class, NewAttendance, NewClass, NewUser, User};

/// Errors surfaced by a storage backend
#[derive(Error, Debug)]
pub enum StoreError {
    /// Insert violated a uniqueness rule
    #[error("conflicting row already exists")]
    Conflict,

    /// Backend failure (connectivity, query execution)
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return StoreError::Conflict;
            }
        }
        StoreError::Unavailable(err.to_string())
    }
}

/// Type alias for store results
pub type StoreResult<T> = Result<T, StoreError>;

/// Outcome of an attendance insert attempt.
///
/// The check and the insert happen as one atomic step inside the store;
/// when the uniqueness key is already taken the existing record comes
/// back instead of a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttendanceInsert {
    /// No record existed for the tuple; this one was written
    Inserted(AttendanceRecord),
    /// A record already existed for the tuple; nothing was written
    AlreadyRecorded(AttendanceRecord),
}

/// User persistence operations
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn get_by_username(&self, username: &str) -> StoreResult<Option<User>>;
    /// Insert a new user. Fails with [`StoreError::Conflict`] when the
    /// username is already taken.
    async fn insert(&self, new_user: NewUser) -> StoreResult<User>;
}

/// Class persistence operations
#[async_trait]
pub trait ClassStore: Send + Sync {
    async fn get(&self, id: Uuid) -> StoreResult<Option<Class>>;
    async fn insert(&self, new_class: NewClass) -> StoreResult<Class>;
    async fn list(&self) -> StoreResult<Vec<Class>>;
    async fn list_by_teacher(&self, teacher_id: Uuid) -> StoreResult<Vec<Class>>;
}

/// Attendance persistence operations
#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// Atomically insert a record unless one already exists for the
    /// (class_id, student_id, date) tuple. Two racing calls for the
    /// same tuple yield exactly one [`AttendanceInsert::Inserted`].
    async fn insert_if_absent(&self, record: NewAttendance) -> StoreResult<AttendanceInsert>;

    /// Overwrite the status of the record identified by the tuple.
    /// Returns `None` when no such record exists.
    async fn update_status(
        &self,
        class_id: Uuid,
        student_id: Uuid,
        date: NaiveDate,
        status: AttendanceStatus,
    ) -> StoreResult<Option<AttendanceRecord>>;

    async fn list_by_class(&self, class_id: Uuid) -> StoreResult<Vec<AttendanceRecord>>;
    async fn list_by_student(&self, student_id: Uuid) -> StoreResult<Vec<AttendanceRecord>>;
}
