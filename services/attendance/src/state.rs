//! Application state shared across handlers

use crate::auth::AuthService;
use crate::checkin::CheckInService;
use crate::classes::ClassService;
use crate::marking::AttendanceService;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub classes: ClassService,
    pub attendance: AttendanceService,
    pub checkin: CheckInService,
}
