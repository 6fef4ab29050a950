//! In-memory storage backend
//!
//! Backs the whole store surface with maps behind a single async mutex.
//! One lock over all tables keeps the attendance check-and-insert
//! atomic without any further coordination, which is exactly what the
//! integrity tests lean on. Also usable as a throwaway backend for
//! local development.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::{AttendanceRecord, AttendanceStatus, Class, NewAttendance, NewClass, NewUser, User};
use crate::store::{AttendanceInsert, AttendanceStore, ClassStore, StoreError, StoreResult, UserStore};

#[derive(Debug, Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    classes: HashMap<Uuid, Class>,
    attendance: HashMap<Uuid, AttendanceRecord>,
}

/// In-memory implementation of all store traits
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn get(&self, id: Uuid) -> StoreResult<Option<User>> {
        let inner = self.inner.lock().await;
        Ok(inner.users.get(&id).cloned())
    }

    async fn get_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .users
            .values()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn insert(&self, new_user: NewUser) -> StoreResult<User> {
        let mut inner = self.inner.lock().await;
        if inner
            .users
            .values()
            .any(|user| user.username == new_user.username)
        {
            return Err(StoreError::Conflict);
        }

        let user = User {
            id: Uuid::new_v4(),
            username: new_user.username,
            full_name: new_user.full_name,
            email: new_user.email,
            password_hash: new_user.password_hash,
            role: new_user.role,
            created_at: Utc::now(),
        };
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }
}

#[async_trait]
impl ClassStore for MemoryStore {
    async fn get(&self, id: Uuid) -> StoreResult<Option<Class>> {
        let inner = self.inner.lock().await;
        Ok(inner.classes.get(&id).cloned())
    }

    async fn insert(&self, new_class: NewClass) -> StoreResult<Class> {
        let mut inner = self.inner.lock().await;
        let class = Class {
            id: Uuid::new_v4(),
            name: new_class.name,
            teacher_id: new_class.teacher_id,
            room: new_class.room,
            schedule: new_class.schedule,
        };
        inner.classes.insert(class.id, class.clone());
        Ok(class)
    }

    async fn list(&self) -> StoreResult<Vec<Class>> {
        let inner = self.inner.lock().await;
        let mut classes: Vec<Class> = inner.classes.values().cloned().collect();
        classes.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(classes)
    }

    async fn list_by_teacher(&self, teacher_id: Uuid) -> StoreResult<Vec<Class>> {
        let inner = self.inner.lock().await;
        let mut classes: Vec<Class> = inner
            .classes
            .values()
            .filter(|class| class.teacher_id == teacher_id)
            .cloned()
            .collect();
        classes.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(classes)
    }
}

#[async_trait]
impl AttendanceStore for MemoryStore {
    async fn insert_if_absent(&self, record: NewAttendance) -> StoreResult<AttendanceInsert> {
        // Lookup and insert happen under the same lock; a racing call
        // for the same tuple sees either nothing or the committed row.
        let mut inner = self.inner.lock().await;
        if let Some(existing) = inner.attendance.values().find(|row| {
            row.class_id == record.class_id
                && row.student_id == record.student_id
                && row.date == record.date
        }) {
            return Ok(AttendanceInsert::AlreadyRecorded(existing.clone()));
        }

        let row = AttendanceRecord {
            id: Uuid::new_v4(),
            class_id: record.class_id,
            student_id: record.student_id,
            date: record.date,
            status: record.status,
        };
        inner.attendance.insert(row.id, row.clone());
        Ok(AttendanceInsert::Inserted(row))
    }

    async fn update_status(
        &self,
        class_id: Uuid,
        student_id: Uuid,
        date: NaiveDate,
        status: AttendanceStatus,
    ) -> StoreResult<Option<AttendanceRecord>> {
        let mut inner = self.inner.lock().await;
        let row = inner.attendance.values_mut().find(|row| {
            row.class_id == class_id && row.student_id == student_id && row.date == date
        });
        Ok(row.map(|row| {
            row.status = status;
            row.clone()
        }))
    }

    async fn list_by_class(&self, class_id: Uuid) -> StoreResult<Vec<AttendanceRecord>> {
        let inner = self.inner.lock().await;
        let mut rows: Vec<AttendanceRecord> = inner
            .attendance
            .values()
            .filter(|row| row.class_id == class_id)
            .cloned()
            .collect();
        rows.sort_by_key(|row| (row.date, row.student_id));
        Ok(rows)
    }

    async fn list_by_student(&self, student_id: Uuid) -> StoreResult<Vec<AttendanceRecord>> {
        let inner = self.inner.lock().await;
        let mut rows: Vec<AttendanceRecord> = inner
            .attendance
            .values()
            .filter(|row| row.student_id == student_id)
            .cloned()
            .collect();
        rows.sort_by_key(|row| (row.date, row.class_id));
        Ok(rows)
    }
}
