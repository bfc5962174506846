use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeDelta, Utc};
use common::storage::{ImageStore, StoreError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Spawn the staged-image reaper, or nothing when `ttl` is `None`.
pub fn spawn_image_reaper(
    images: Arc<dyn ImageStore>,
    ttl: Option<Duration>,
    every: Duration,
    cancel: CancellationToken,
) -> Option<JoinHandle<()>> {
    let ttl = ttl?;
    Some(tokio::spawn(run_image_reaper(images, ttl, every, cancel)))
}

/// Drop images that stayed staged longer than `ttl`, every `every`, until cancelled.
pub async fn run_image_reaper(
    images: Arc<dyn ImageStore>,
    ttl: Duration,
    every: Duration,
    cancel: CancellationToken,
) {
    info!(
        ttl_secs = ttl.as_secs(),
        interval_secs = every.as_secs(),
        "Starting image reaper"
    );

    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("Image reaper stopped");
                return;
            }
            _ = interval.tick() => {}
        }

        match reap_once(images.as_ref(), ttl).await {
            Ok(0) => {}
            Ok(removed) => info!(removed, "Reaped stale staged images"),
            Err(e) => error!(error = %e, "Image cleanup failed"),
        }
    }
}

/// Wait for a cancelled reaper to finish. Returns `false` if the task
/// panicked or was aborted.
pub async fn join_image_reaper(handle: Option<JoinHandle<()>>) -> bool {
    let Some(handle) = handle else {
        return true;
    };
    match handle.await {
        Ok(()) => true,
        Err(e) => {
            error!(error = %e, "Image reaper task failed");
            false
        }
    }
}

/// One cleanup pass with cutoff `now - ttl`.
pub async fn reap_once(images: &dyn ImageStore, ttl: Duration) -> Result<usize, StoreError> {
    let ttl = TimeDelta::from_std(ttl)
        .map_err(|_| StoreError::Invalid(format!("image ttl {ttl:?} is out of range")))?;
    images.cleanup(Utc::now() - ttl).await
}
