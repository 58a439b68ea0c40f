use crate::{
    config::{default_storage_path, ClientConfig, DEFAULT_API_BASE_URL, DEFAULT_TIMEOUT_SECONDS},
    navigation::{Navigator, TracingNavigator},
    storage::FileStorage,
    store::AuthStore,
};
use anyhow::Result;
use std::{path::PathBuf, sync::Arc, time::Duration};

/// Connection settings shared by every subcommand.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub api_base_url: String,
    pub token_file: Option<PathBuf>,
    pub timeout: u64,
}

impl Default for GlobalArgs {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE_URL.to_string())
    }
}

impl GlobalArgs {
    #[must_use]
    pub fn new(api_base_url: String) -> Self {
        Self {
            api_base_url,
            token_file: None,
            timeout: DEFAULT_TIMEOUT_SECONDS,
        }
    }

    #[must_use]
    pub fn token_file(&self) -> PathBuf {
        self.token_file.clone().unwrap_or_else(default_storage_path)
    }

    #[must_use]
    pub fn config(&self) -> ClientConfig {
        ClientConfig::new(self.api_base_url.clone())
            .with_timeout(Duration::from_secs(self.timeout))
            .with_storage_path(self.token_file())
    }

    /// Builds a store over the token file with a logging navigator.
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn store(&self) -> Result<Arc<AuthStore>> {
        let config = self.config();
        let storage = Arc::new(FileStorage::new(config.storage_path().clone()));
        let navigator: Arc<dyn Navigator> = Arc::new(TracingNavigator::default());
        Ok(Arc::new(AuthStore::connect(config, storage, navigator)?))
    }
}
