use std::sync::Arc;

use storage::catalog::InMemoryCatalog;
use storage::repository::{ContentCatalog, Storage};

use crate::Clock;
use crate::config::PracticeConfig;
use crate::error::AppServicesError;
use crate::onboarding::OnboardingFlow;
use crate::progress_service::ProgressStore;
use crate::sessions::PracticeService;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    progress: Arc<ProgressStore>,
    practice: Arc<PracticeService>,
    onboarding: Arc<OnboardingFlow>,
}

impl AppServices {
    /// Build services whose progress record lives in `SQLite`.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails or the
    /// catalog cannot be read.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        catalog: Arc<dyn ContentCatalog>,
        config: PracticeConfig,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url, catalog).await?;
        let topics = storage.catalog.topics().await?.len();
        tracing::debug!(topics, "catalog ready");
        Ok(Self::from_storage(storage, clock, config).await)
    }

    /// Build services over in-memory storage, for demos and tests.
    pub async fn in_memory(
        clock: Clock,
        catalog: InMemoryCatalog,
        config: PracticeConfig,
    ) -> Self {
        Self::from_storage(Storage::in_memory(catalog), clock, config).await
    }

    /// Loads the progress record and wires the services around it.
    pub async fn from_storage(storage: Storage, clock: Clock, config: PracticeConfig) -> Self {
        let progress = Arc::new(ProgressStore::load(Arc::clone(&storage.progress)).await);
        let practice = Arc::new(
            PracticeService::new(clock, Arc::clone(&storage.catalog), Arc::clone(&progress))
                .with_config(config),
        );
        let onboarding = Arc::new(OnboardingFlow::with_default_handlers(Arc::clone(
            &progress,
        )));
        Self {
            progress,
            practice,
            onboarding,
        }
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressStore> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn practice(&self) -> Arc<PracticeService> {
        Arc::clone(&self.practice)
    }

    #[must_use]
    pub fn onboarding(&self) -> Arc<OnboardingFlow> {
        Arc::clone(&self.onboarding)
    }
}
