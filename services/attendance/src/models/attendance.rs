//! Attendance model and related functionality

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Attendance status.
///
/// Closed set: anything outside it is rejected before a record is
/// touched, so no free-form status ever reaches the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    Excused,
}

impl AttendanceStatus {
    /// Canonical lowercase form, as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::Late => "late",
            AttendanceStatus::Excused => "excused",
        }
    }

    /// Parse a submitted or stored status value. Unknown values yield
    /// `None`; callers decide how to fail.
    pub fn parse(value: &str) -> Option<AttendanceStatus> {
        if value.eq_ignore_ascii_case("present") {
            Some(AttendanceStatus::Present)
        } else if value.eq_ignore_ascii_case("absent") {
            Some(AttendanceStatus::Absent)
        } else if value.eq_ignore_ascii_case("late") {
            Some(AttendanceStatus::Late)
        } else if value.eq_ignore_ascii_case("excused") {
            Some(AttendanceStatus::Excused)
        } else {
            None
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attendance record entity.
///
/// At most one record exists per (class_id, student_id, date); the
/// stores enforce that tuple as a uniqueness key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: Uuid,
    pub class_id: Uuid,
    pub student_id: Uuid,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
}

/// New attendance record payload
#[derive(Debug, Clone)]
pub struct NewAttendance {
    pub class_id: Uuid,
    pub student_id: Uuid,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_canonical_form() {
        for status in [
            AttendanceStatus::Present,
            AttendanceStatus::Absent,
            AttendanceStatus::Late,
            AttendanceStatus::Excused,
        ] {
            assert_eq!(AttendanceStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert_eq!(AttendanceStatus::parse("presnt"), None);
        assert_eq!(AttendanceStatus::parse("PRESENT!"), None);
        assert_eq!(AttendanceStatus::parse(""), None);
    }
}
