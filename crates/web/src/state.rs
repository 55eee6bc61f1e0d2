//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;

use okinawa_rentals_core::Agency;

use crate::config::WebConfig;
use crate::db::agencies::AgencyRepository;
use crate::db::{DocumentStore, RepositoryError};
use crate::services::email::EmailService;

const AGENCY_CACHE_KEY: &str = "all";

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: WebConfig,
    store: Arc<dyn DocumentStore>,
    email: Option<EmailService>,
    /// Agency directory reads (60 second TTL).
    agencies: Cache<&'static str, Arc<Vec<Agency>>>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the SMTP relay configuration is invalid.
    pub fn new(
        config: WebConfig,
        store: Arc<dyn DocumentStore>,
    ) -> Result<Self, lettre::transport::smtp::Error> {
        let email = config.email.as_ref().map(EmailService::new).transpose()?;
        if email.is_none() {
            tracing::warn!("SMTP not configured; contact relay disabled");
        }

        let agencies = Cache::builder()
            .max_capacity(1)
            .time_to_live(Duration::from_secs(60))
            .build();

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                email,
                agencies,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &WebConfig {
        &self.inner.config
    }

    /// The document store behind every repository.
    #[must_use]
    pub fn store(&self) -> &dyn DocumentStore {
        self.inner.store.as_ref()
    }

    /// Contact relay, when SMTP is configured.
    #[must_use]
    pub fn email(&self) -> Option<&EmailService> {
        self.inner.email.as_ref()
    }

    /// Every agency, served from cache when fresh.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the cache is cold and the store cannot be reached.
    pub async fn agencies(&self) -> Result<Arc<Vec<Agency>>, RepositoryError> {
        if let Some(cached) = self.inner.agencies.get(AGENCY_CACHE_KEY).await {
            return Ok(cached);
        }
        let agencies = Arc::new(AgencyRepository::new(self.store()).list().await?);
        self.inner
            .agencies
            .insert(AGENCY_CACHE_KEY, Arc::clone(&agencies))
            .await;
        Ok(agencies)
    }

    /// Drop cached agency reads after a write.
    pub async fn invalidate_agencies(&self) {
        self.inner.agencies.invalidate(AGENCY_CACHE_KEY).await;
    }
}
