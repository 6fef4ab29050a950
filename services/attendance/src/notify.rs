//! Notification hook
//!
//! Attendance marking emits a best-effort notification to the affected
//! student. Delivery is somebody else's problem; implementations must
//! swallow their own failures so a broken channel can never fail a
//! mark that was already committed.

use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

/// Fire-and-forget notification sink
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, user_id: Uuid, message: &str);
}

/// Notifier that writes notifications to the service log. The default
/// sink when no delivery channel is wired up.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, user_id: Uuid, message: &str) {
        info!("Notification for {}: {}", user_id, message);
    }
}
