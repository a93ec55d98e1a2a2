//! Process-wide copy of the CCTV and streetlight datasets.
//!
//! Scoring reads from the cached snapshot instead of paging the citywide
//! datasets on every request. A snapshot older than `max_age` is refetched
//! on demand; the server also refreshes it on a schedule.

use std::sync::Arc;
use std::time::{Duration, Instant};

use safeway_core::{AppConfig, Coordinate};
use tokio::sync::{Mutex, RwLock};

use crate::client::OpenDataClient;
use crate::error::OpenDataError;

/// Complete position lists from one refresh.
#[derive(Debug, Clone)]
pub struct InfrastructureSnapshot {
    pub cctv: Vec<Coordinate>,
    pub streetlights: Vec<Coordinate>,
    pub fetched_at: Instant,
}

pub struct InfrastructureCache {
    client: OpenDataClient,
    max_age: Duration,
    current: RwLock<Option<Arc<InfrastructureSnapshot>>>,
    // Serialises refreshes so a cold cache is fetched once, not per request.
    refresh_lock: Mutex<()>,
}

impl InfrastructureCache {
    #[must_use]
    pub fn new(client: OpenDataClient, max_age: Duration) -> Self {
        Self {
            client,
            max_age,
            current: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        }
    }

    /// `Ok(None)` when no open-data key is configured.
    ///
    /// # Errors
    ///
    /// Same as [`OpenDataClient::from_app_config`].
    pub fn from_app_config(config: &AppConfig) -> Result<Option<Self>, OpenDataError> {
        let max_age = Duration::from_secs(config.opendata_cache_ttl_secs);
        Ok(OpenDataClient::from_app_config(config)?.map(|client| Self::new(client, max_age)))
    }

    #[must_use]
    pub fn client(&self) -> &OpenDataClient {
        &self.client
    }

    /// The current snapshot, fetching a new one if it is missing or stale.
    ///
    /// # Errors
    ///
    /// Returns the fetch error when no fresh snapshot exists and the refetch
    /// fails. A stale snapshot is never served.
    pub async fn snapshot(&self) -> Result<Arc<InfrastructureSnapshot>, OpenDataError> {
        if let Some(snapshot) = self.fresh().await {
            return Ok(snapshot);
        }
        let _guard = self.refresh_lock.lock().await;
        if let Some(snapshot) = self.fresh().await {
            return Ok(snapshot);
        }
        self.fetch_and_store().await
    }

    /// Unconditionally refetches both datasets. On failure the previous
    /// snapshot stays in place until it ages out.
    ///
    /// # Errors
    ///
    /// Returns the first dataset error.
    pub async fn refresh(&self) -> Result<Arc<InfrastructureSnapshot>, OpenDataError> {
        let _guard = self.refresh_lock.lock().await;
        self.fetch_and_store().await
    }

    async fn fresh(&self) -> Option<Arc<InfrastructureSnapshot>> {
        self.current
            .read()
            .await
            .as_ref()
            .filter(|s| s.fetched_at.elapsed() < self.max_age)
            .cloned()
    }

    async fn fetch_and_store(&self) -> Result<Arc<InfrastructureSnapshot>, OpenDataError> {
        let started = Instant::now();
        let (cctv, streetlights) =
            tokio::try_join!(self.client.fetch_cctv(), self.client.fetch_streetlights())?;

        let snapshot = Arc::new(InfrastructureSnapshot {
            cctv,
            streetlights,
            fetched_at: Instant::now(),
        });
        *self.current.write().await = Some(Arc::clone(&snapshot));

        tracing::info!(
            cctv = snapshot.cctv.len(),
            streetlights = snapshot.streetlights.len(),
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "infrastructure cache refreshed"
        );
        Ok(snapshot)
    }
}

impl std::fmt::Debug for InfrastructureCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InfrastructureCache")
            .field("max_age", &self.max_age)
            .finish_non_exhaustive()
    }
}
