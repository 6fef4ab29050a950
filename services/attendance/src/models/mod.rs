//! Attendance service models

pub mod attendance;
pub mod class;
pub mod user;

// Re-export for convenience
pub use attendance::{AttendanceRecord, AttendanceStatus, NewAttendance};
pub use class::{Class, NewClass, ScheduleSlot};
pub use user::{NewUser, Role, User};
