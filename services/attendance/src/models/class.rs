//! Class model and related functionality

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single timetable entry for a class.
///
/// Times are kept as submitted ("09:00", "10:30"); the schedule is
/// display data and the service only stores and echoes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSlot {
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
}

/// Class entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Class {
    pub id: Uuid,
    pub name: String,
    pub teacher_id: Uuid,
    pub room: String,
    pub schedule: Vec<ScheduleSlot>,
}

/// New class creation payload
#[derive(Debug, Clone, Deserialize)]
pub struct NewClass {
    pub name: String,
    pub teacher_id: Uuid,
    pub room: String,
    #[serde(default)]
    pub schedule: Vec<ScheduleSlot>,
}
