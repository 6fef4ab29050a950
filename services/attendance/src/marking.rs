//! Attendance marking service
//!
//! All writes to the attendance ledger go through here. Preconditions
//! run in a fixed order before anything is written: status parse,
//! class existence, student reference, then authorization. The write
//! itself is a single atomic check-and-insert in the store, classified
//! afterwards, so two racing marks for the same (class, student, date)
//! can never produce two rows.
//!
//! Re-submitting an identical mark is a no-op that returns the stored
//! record; a conflicting status is rejected. Changing a committed
//! record is its own operation, `correct`, and never happens
//! implicitly.

use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::jwt::Claims;
use crate::models::{AttendanceRecord, AttendanceStatus, Class, NewAttendance, Role, User};
use crate::notify::Notifier;
use crate::policy::{self, Action};
use crate::store::{AttendanceInsert, AttendanceStore, ClassStore, UserStore};

/// Attendance marking service
#[derive(Clone)]
pub struct AttendanceService {
    classes: Arc<dyn ClassStore>,
    users: Arc<dyn UserStore>,
    attendance: Arc<dyn AttendanceStore>,
    notifier: Arc<dyn Notifier>,
}

impl AttendanceService {
    /// Create a new attendance service
    pub fn new(
        classes: Arc<dyn ClassStore>,
        users: Arc<dyn UserStore>,
        attendance: Arc<dyn AttendanceStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            classes,
            users,
            attendance,
            notifier,
        }
    }

    /// Record attendance for a student in a class on a date.
    ///
    /// Idempotent for identical re-submissions; a record with a
    /// different status for the same (class, student, date) is a
    /// [`ServiceError::DuplicateRecord`].
    pub async fn mark(
        &self,
        claims: &Claims,
        class_id: Uuid,
        student_id: Uuid,
        date: NaiveDate,
        status: &str,
    ) -> ServiceResult<AttendanceRecord> {
        let (status, class) = self
            .check_preconditions(claims, class_id, student_id, status, |owner| {
                Action::MarkAttendance { class_owner: owner }
            })
            .await?;

        let outcome = self
            .attendance
            .insert_if_absent(NewAttendance {
                class_id,
                student_id,
                date,
                status,
            })
            .await
            .map_err(|e| {
                error!("Attendance insert failed: {}", e);
                ServiceError::Unavailable
            })?;

        match outcome {
            AttendanceInsert::Inserted(record) => {
                info!(
                    "Marked {} {} for student {} in class {}",
                    date, status, student_id, class_id
                );
                self.notifier
                    .notify(
                        student_id,
                        &format!(
                            "Attendance for {} on {} recorded as {}",
                            class.name, date, status
                        ),
                    )
                    .await;
                Ok(record)
            }
            AttendanceInsert::AlreadyRecorded(existing) if existing.status == status => {
                // Same fact resubmitted; nothing changed, nobody is
                // notified again.
                Ok(existing)
            }
            AttendanceInsert::AlreadyRecorded(_) => Err(ServiceError::DuplicateRecord),
        }
    }

    /// Overwrite the status of an existing attendance record.
    ///
    /// The explicit fix-up path: it never creates a record, so a
    /// correction aimed at a day nobody marked is a
    /// [`ServiceError::RecordNotFound`].
    pub async fn correct(
        &self,
        claims: &Claims,
        class_id: Uuid,
        student_id: Uuid,
        date: NaiveDate,
        status: &str,
    ) -> ServiceResult<AttendanceRecord> {
        let (status, _class) = self
            .check_preconditions(claims, class_id, student_id, status, |owner| {
                Action::CorrectAttendance { class_owner: owner }
            })
            .await?;

        let updated = self
            .attendance
            .update_status(class_id, student_id, date, status)
            .await
            .map_err(|e| {
                error!("Attendance update failed: {}", e);
                ServiceError::Unavailable
            })?;

        match updated {
            Some(record) => {
                info!(
                    "Corrected attendance to {} for student {} in class {} on {}",
                    status, student_id, class_id, date
                );
                Ok(record)
            }
            None => Err(ServiceError::RecordNotFound),
        }
    }

    /// Attendance roster of a class.
    pub async fn class_roster(
        &self,
        claims: &Claims,
        class_id: Uuid,
    ) -> ServiceResult<Vec<AttendanceRecord>> {
        let class = self
            .classes
            .get(class_id)
            .await
            .map_err(|e| {
                error!("Class lookup failed: {}", e);
                ServiceError::Unavailable
            })?
            .ok_or(ServiceError::ClassNotFound)?;

        policy::ensure(
            claims,
            &Action::ReadClassRoster {
                class_owner: class.teacher_id,
            },
        )?;

        self.attendance.list_by_class(class_id).await.map_err(|e| {
            error!("Roster query failed: {}", e);
            ServiceError::Unavailable
        })
    }

    /// Attendance history of a student across classes.
    pub async fn student_history(
        &self,
        claims: &Claims,
        student_id: Uuid,
    ) -> ServiceResult<Vec<AttendanceRecord>> {
        policy::ensure(claims, &Action::ReadStudentHistory { student_id })?;
        self.resolve_student(student_id).await?;

        self.attendance
            .list_by_student(student_id)
            .await
            .map_err(|e| {
                error!("History query failed: {}", e);
                ServiceError::Unavailable
            })
    }

    /// Shared precondition chain for mark and correct. Order is part
    /// of the contract: status, class, student, then authorization.
    async fn check_preconditions(
        &self,
        claims: &Claims,
        class_id: Uuid,
        student_id: Uuid,
        status: &str,
        action: impl FnOnce(Uuid) -> Action,
    ) -> ServiceResult<(AttendanceStatus, Class)> {
        let status = AttendanceStatus::parse(status).ok_or(ServiceError::InvalidStatus)?;

        let class = self
            .classes
            .get(class_id)
            .await
            .map_err(|e| {
                error!("Class lookup failed: {}", e);
                ServiceError::Unavailable
            })?
            .ok_or(ServiceError::ClassNotFound)?;

        self.resolve_student(student_id).await?;

        policy::ensure(claims, &action(class.teacher_id))?;

        Ok((status, class))
    }

    async fn resolve_student(&self, student_id: Uuid) -> ServiceResult<User> {
        let student = self
            .users
            .get(student_id)
            .await
            .map_err(|e| {
                error!("Student lookup failed: {}", e);
                ServiceError::Unavailable
            })?
            .ok_or(ServiceError::InvalidStudent)?;
        if student.role != Role::Student {
            return Err(ServiceError::InvalidStudent);
        }
        Ok(student)
    }
}
