//! Async driver feeding device location updates into a [`NavigationTracker`].

use safeway_core::Coordinate;
use tokio::sync::{mpsc, oneshot};

use crate::tracker::{GeoError, NavigationTracker, Progress, TrackerState};

type Unsubscribe = Box<dyn FnOnce() + Send>;

/// A live location watch. Dropping it unsubscribes from the device.
pub struct WatchSubscription {
    updates: mpsc::Receiver<Result<Coordinate, GeoError>>,
    unsubscribe: Option<Unsubscribe>,
}

impl WatchSubscription {
    pub fn new(
        updates: mpsc::Receiver<Result<Coordinate, GeoError>>,
        unsubscribe: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            updates,
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    /// Next fix or error; `None` once the device side closes the channel.
    pub async fn next(&mut self) -> Option<Result<Coordinate, GeoError>> {
        self.updates.recv().await
    }
}

impl Drop for WatchSubscription {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
            tracing::debug!("location watch released");
        }
    }
}

impl std::fmt::Debug for WatchSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchSubscription")
            .field("active", &self.unsubscribe.is_some())
            .finish_non_exhaustive()
    }
}

/// Device capability for continuous position updates.
pub trait LocationProvider {
    /// Starts a continuous watch.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError`] when no watch can be established.
    fn watch(&self) -> Result<WatchSubscription, GeoError>;
}

/// Runs a navigation session to completion and returns the final state.
///
/// - Watch setup failure: warning logged, tracker left `Idle`.
/// - `cancel` resolving (sent or dropped, i.e. the user navigated away):
///   `Cancelled`.
/// - Location stream closing: `Cancelled`.
///
/// The subscription is owned by this function and dropped on every return
/// path, which unsubscribes from the device.
pub async fn run_navigation<P, F>(
    tracker: &mut NavigationTracker,
    provider: &P,
    mut cancel: oneshot::Receiver<()>,
    mut on_progress: F,
) -> TrackerState
where
    P: LocationProvider + ?Sized,
    F: FnMut(&Progress),
{
    let mut subscription = match provider.watch() {
        Ok(sub) => sub,
        Err(e) => {
            tracing::warn!(
                error = %e,
                position = %tracker.current_position(),
                "could not start location watch; staying idle"
            );
            return tracker.state();
        }
    };
    tracker.start();

    while !tracker.state().is_terminal() {
        tokio::select! {
            biased;
            _ = &mut cancel => {
                tracker.cancel();
            }
            update = subscription.next() => match update {
                Some(Ok(position)) => {
                    if let Some(progress) = tracker.update(position) {
                        on_progress(&progress);
                    }
                }
                Some(Err(e)) => tracker.location_error(&e),
                None => {
                    tracing::warn!("location stream closed");
                    tracker.cancel();
                }
            },
        }
    }

    drop(subscription);
    tracker.state()
}
