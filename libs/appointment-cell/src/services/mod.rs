pub mod availability;
pub mod completion;
pub mod dashboard;
pub mod release;
pub mod reservation;

use tracing::warn;
use uuid::Uuid;

use crate::models::SchedulingConfig;

/// Linear backoff between version-checked attempts on one practitioner.
pub(crate) async fn backoff(config: &SchedulingConfig, practitioner_id: Uuid, attempt: u32) {
    warn!(
        "Version conflict on doctor {}, retrying attempt {}/{}",
        practitioner_id, attempt, config.max_attempts
    );
    tokio::time::sleep(config.retry_backoff * attempt).await;
}
