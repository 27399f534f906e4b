use std::sync::Arc;

use tracing::info;

use crate::billing::{CreditLedger, MemoryLedger};
use crate::config::Config;
use crate::error::Result;
use crate::storage::{ArtifactStore, LocalArtifactStore};
use crate::store::{JobRepository, MemoryStore, UsageRepository};
use crate::translate::{BackendFactory, BackendProvider};

/// Configuration and collaborators shared by every request.
///
/// Handlers and orchestrators receive this explicitly; nothing reads
/// process-wide toggles.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub backends: Arc<dyn BackendProvider>,
    pub ledger: Arc<dyn CreditLedger>,
    pub jobs: Arc<dyn JobRepository>,
    pub usage: Arc<dyn UsageRepository>,
    pub artifacts: Arc<dyn ArtifactStore>,
}

impl AppContext {
    /// Wire the default collaborators for a configuration
    pub fn from_config(config: Config) -> Result<Self> {
        let backends = Arc::new(BackendFactory::new(
            config.translate.clone(),
            config.billing.batch_size,
        ));
        let ledger = Arc::new(MemoryLedger::new(config.billing.signup_bonus));
        let store = Arc::new(MemoryStore::new());
        let artifacts = Arc::new(LocalArtifactStore::new(
            config.storage.root.clone(),
            config.storage.public_base_url.clone(),
        )?);

        info!(
            "Context ready: environment={}, default service={}, storage={}",
            config.environment.as_str(),
            config.translate.service.as_str(),
            config.storage.root.display()
        );

        Ok(Self {
            config: Arc::new(config),
            backends,
            ledger,
            jobs: store.clone(),
            usage: store,
            artifacts,
        })
    }
}
