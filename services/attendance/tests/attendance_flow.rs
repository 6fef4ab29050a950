//! End-to-end flows over the in-memory backend
//!
//! These tests wire the services together the same way main() does,
//! swapping PostgreSQL for the in-memory store, and walk the paths a
//! real deployment sees: register, log in, create a class, mark and
//! correct attendance, read it back.

use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use uuid::Uuid;

use attendance::auth::{AuthService, Registration};
use attendance::checkin::{CheckInConfig, CheckInService};
use attendance::classes::ClassService;
use attendance::error::ServiceError;
use attendance::jwt::{Claims, JwtConfig, TokenService};
use attendance::marking::AttendanceService;
use attendance::models::{AttendanceStatus, NewClass, Role, User};
use attendance::notify::LogNotifier;
use attendance::store::memory::MemoryStore;
use attendance::throttle::{LoginThrottle, ThrottleConfig};

const SECRET: &str = "integration-test-secret";

struct App {
    auth: AuthService,
    classes: ClassService,
    attendance: AttendanceService,
    checkin: CheckInService,
}

fn app() -> App {
    let store = MemoryStore::new();
    let users: Arc<MemoryStore> = Arc::new(store.clone());
    let tokens = TokenService::new(JwtConfig {
        secret: SECRET.to_string(),
        token_ttl: 3600,
        leeway: 0,
    });

    App {
        auth: AuthService::new(
            users.clone(),
            tokens,
            LoginThrottle::new(ThrottleConfig::default()),
        )
        .unwrap(),
        classes: ClassService::new(Arc::new(store.clone()), users.clone()),
        attendance: AttendanceService::new(
            Arc::new(store.clone()),
            users.clone(),
            Arc::new(store.clone()),
            Arc::new(LogNotifier),
        ),
        checkin: CheckInService::new(
            SECRET,
            CheckInConfig::default(),
            Arc::new(store),
        ),
    }
}

fn registration(username: &str, role: Role) -> Registration {
    Registration {
        username: username.to_string(),
        password: format!("{username}-pw"),
        full_name: format!("{username} Example"),
        email: format!("{username}@school.test"),
        role,
    }
}

async fn sign_in(app: &App, username: &str) -> (User, Claims) {
    let now = Utc::now();
    let session = app
        .auth
        .login(username, &format!("{username}-pw"), now)
        .await
        .unwrap();
    let claims = app.auth.validate_request(&session.token, now).unwrap();
    (session.user, claims)
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 9, 2).unwrap()
}

#[tokio::test]
async fn full_attendance_flow() {
    let app = app();

    app.auth
        .register(registration("alice", Role::Teacher))
        .await
        .unwrap();
    let student = app
        .auth
        .register(registration("carol", Role::Student))
        .await
        .unwrap();

    let (teacher, teacher_claims) = sign_in(&app, "alice").await;
    assert_eq!(teacher_claims.sub, teacher.id);
    assert_eq!(teacher_claims.role, Role::Teacher);

    let class = app
        .classes
        .create(
            &teacher_claims,
            NewClass {
                name: "Mathematics".to_string(),
                teacher_id: teacher.id,
                room: "B12".to_string(),
                schedule: vec![],
            },
        )
        .await
        .unwrap();

    // The teacher marks; re-marking the same fact changes nothing.
    let record = app
        .attendance
        .mark(&teacher_claims, class.id, student.id, date(), "present")
        .await
        .unwrap();
    let replay = app
        .attendance
        .mark(&teacher_claims, class.id, student.id, date(), "present")
        .await
        .unwrap();
    assert_eq!(record, replay);

    // A different status for the same day is a conflict, not an
    // overwrite.
    let conflict = app
        .attendance
        .mark(&teacher_claims, class.id, student.id, date(), "late")
        .await
        .unwrap_err();
    assert_eq!(conflict, ServiceError::DuplicateRecord);

    // The explicit correction path does overwrite.
    let corrected = app
        .attendance
        .correct(&teacher_claims, class.id, student.id, date(), "late")
        .await
        .unwrap();
    assert_eq!(corrected.id, record.id);
    assert_eq!(corrected.status, AttendanceStatus::Late);

    // The student sees exactly one record in their history.
    let (_, student_claims) = sign_in(&app, "carol").await;
    let history = app
        .attendance
        .student_history(&student_claims, student.id)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, AttendanceStatus::Late);

    // And cannot touch the ledger themselves.
    let err = app
        .attendance
        .mark(&student_claims, class.id, student.id, date(), "present")
        .await
        .unwrap_err();
    assert_eq!(err, ServiceError::Forbidden);
}

#[tokio::test]
async fn expired_session_is_rejected_everywhere() {
    let app = app();
    app.auth
        .register(registration("alice", Role::Teacher))
        .await
        .unwrap();

    let issued_at = Utc::now();
    let session = app.auth.login("alice", "alice-pw", issued_at).await.unwrap();

    // One second past the ttl the token no longer authenticates.
    let later = issued_at + Duration::seconds(3601);
    let err = app.auth.validate_request(&session.token, later).unwrap_err();
    assert_eq!(err, ServiceError::Unauthorized);
}

#[tokio::test]
async fn checkin_codes_follow_class_ownership() {
    let app = app();
    app.auth
        .register(registration("alice", Role::Teacher))
        .await
        .unwrap();
    app.auth
        .register(registration("carol", Role::Student))
        .await
        .unwrap();

    let (teacher, teacher_claims) = sign_in(&app, "alice").await;
    let (_, student_claims) = sign_in(&app, "carol").await;

    let class = app
        .classes
        .create(
            &teacher_claims,
            NewClass {
                name: "Mathematics".to_string(),
                teacher_id: teacher.id,
                room: "B12".to_string(),
                schedule: vec![],
            },
        )
        .await
        .unwrap();

    let now = Utc::now();
    let code = app.checkin.mint(&teacher_claims, class.id, now).await.unwrap();
    assert_eq!(app.checkin.validate(&code.code, now).unwrap(), class.id);

    let err = app
        .checkin
        .mint(&student_claims, class.id, now)
        .await
        .unwrap_err();
    assert_eq!(err, ServiceError::Forbidden);
}

#[tokio::test]
async fn unknown_references_fail_with_typed_errors() {
    let app = app();
    app.auth
        .register(registration("alice", Role::Teacher))
        .await
        .unwrap();
    let (_, teacher_claims) = sign_in(&app, "alice").await;

    let missing_class = app
        .attendance
        .mark(
            &teacher_claims,
            Uuid::new_v4(),
            Uuid::new_v4(),
            date(),
            "present",
        )
        .await
        .unwrap_err();
    assert_eq!(missing_class, ServiceError::ClassNotFound);

    let missing = app
        .classes
        .get(&teacher_claims, Uuid::new_v4())
        .await
        .unwrap_err();
    assert_eq!(missing, ServiceError::ClassNotFound);
}
