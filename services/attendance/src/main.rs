use anyhow::Result;
use std::sync::Arc;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use attendance::auth::AuthService;
use attendance::checkin::{CheckInConfig, CheckInService};
use attendance::classes::ClassService;
use attendance::jwt::{JwtConfig, TokenService};
use attendance::marking::AttendanceService;
use attendance::notify::LogNotifier;
use attendance::routes;
use attendance::state::AppState;
use attendance::store::postgres::{PgAttendanceStore, PgClassStore, PgUserStore, ensure_schema};
use attendance::throttle::{LoginThrottle, ThrottleConfig};

use common::database;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting attendance service");

    // Initialize database connection pool
    let db_config = database::DatabaseConfig::from_env()?;
    let pool = database::init_pool(&db_config).await?;

    // Check database connectivity
    if database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    ensure_schema(&pool).await?;

    // Stores
    let users = Arc::new(PgUserStore::new(pool.clone()));
    let classes_store = Arc::new(PgClassStore::new(pool.clone()));
    let attendance_store = Arc::new(PgAttendanceStore::new(pool.clone()));

    // Services
    let jwt_config = JwtConfig::from_env()?;
    let secret = jwt_config.secret.clone();
    let tokens = TokenService::new(jwt_config);
    let throttle = LoginThrottle::new(ThrottleConfig::default());
    let auth = AuthService::new(users.clone(), tokens, throttle)
        .map_err(|e| anyhow::anyhow!("Failed to initialize auth service: {}", e))?;
    let classes = ClassService::new(classes_store.clone(), users.clone());
    let attendance_service = AttendanceService::new(
        classes_store.clone(),
        users.clone(),
        attendance_store,
        Arc::new(LogNotifier),
    );
    let checkin = CheckInService::new(&secret, CheckInConfig::from_env()?, classes_store);

    let app_state = AppState {
        auth,
        classes,
        attendance: attendance_service,
        checkin,
    };

    info!("Attendance service initialized successfully");

    // Start the web server
    let app = routes::create_router(app_state);

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Attendance service listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
