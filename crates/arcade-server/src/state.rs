use std::sync::Arc;

use arcade_crypto::UrlSigner;
use arcade_registry::UserRegistry;
use arcade_store::{DocumentStore, FsDocumentStore};
use arcade_types::{Clock, SystemClock};

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};

/// Everything a request handler needs, built once per process.
pub struct AppState {
    pub config: ServerConfig,
    pub store: Arc<dyn DocumentStore>,
    pub registry: UserRegistry<dyn DocumentStore>,
    pub signer: UrlSigner,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(
        config: ServerConfig,
        store: Arc<dyn DocumentStore>,
        signer: UrlSigner,
        clock: Arc<dyn Clock>,
    ) -> Arc<Self> {
        let registry =
            UserRegistry::new(store.clone(), config.document_key.clone()).with_clock(clock.clone());
        Arc::new(Self {
            config,
            store,
            registry,
            signer,
            clock,
        })
    }

    /// State over the filesystem bucket named in `config`.
    pub fn from_config(config: ServerConfig) -> ServerResult<Arc<Self>> {
        config.validate()?;
        let store = FsDocumentStore::new(&config.store_root, config.bucket.clone())
            .map_err(|e| ServerError::Config(format!("bucket: {e}")))?;
        let signer = config.signer()?;
        Ok(Self::new(config, Arc::new(store), signer, Arc::new(SystemClock)))
    }
}
