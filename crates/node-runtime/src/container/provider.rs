//! Provider wiring.

use std::sync::Arc;

use mx_01_user_db::{UserDbError, UserDirectory, UserDirectoryApi};
use mx_02_spool::{DurableSpool, MemorySpool, Spool, SpoolError};
use mx_03_provider::{PacketScheduler, ProviderApi, ProviderError, ProviderPipeline, SurbAckFactory};
use thiserror::Error;

use crate::adapters::data_dir::{ensure_data_dir, DataDirError, DataDirLock};
use crate::adapters::keys::{KeyError, NodeKeys};
use crate::container::config::{ConfigError, NodeConfig, StorageBackend};

#[derive(Debug, Error)]
pub enum ContainerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    DataDir(#[from] DataDirError),

    #[error(transparent)]
    Keys(#[from] KeyError),

    #[error("User directory: {0}")]
    Directory(#[from] UserDbError),

    #[error("Spool: {0}")]
    Spool(#[from] SpoolError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Storage backend '{0}' is not compiled in")]
    BackendUnavailable(&'static str),
}

/// A running provider and the resources it depends on.
///
/// Fields drop top to bottom: the pipeline halts (closing the spool and the
/// directory) before the data directory lock is released.
pub struct ProviderContainer {
    pipeline: ProviderPipeline,
    directory: Arc<dyn UserDirectoryApi>,
    spool: Arc<dyn Spool>,
    scheduler: Arc<dyn PacketScheduler>,
    keys: NodeKeys,
    config: NodeConfig,
    _lock: DataDirLock,
}

impl ProviderContainer {
    /// Bring the provider up.
    ///
    /// ## Startup Sequence
    ///
    /// 1. Validate configuration
    /// 2. Create or check the data directory and take its lock
    /// 3. Load or generate node keys
    /// 4. Open the user directory, then the spool
    /// 5. Start the pipeline worker
    pub fn new(
        config: NodeConfig,
        ack_factory: Arc<dyn SurbAckFactory>,
        scheduler: Arc<dyn PacketScheduler>,
    ) -> Result<Self, ContainerError> {
        config.validate()?;
        let data_dir = config.server.data_dir.clone();
        ensure_data_dir(&data_dir)?;
        let lock = DataDirLock::acquire(&data_dir)?;
        let keys = NodeKeys::load_or_generate(&data_dir)?;

        let directory = open_directory(&config)?;
        let spool = match open_spool(&config) {
            Ok(spool) => spool,
            Err(e) => {
                directory.close();
                return Err(e);
            }
        };

        let pipeline = match ProviderPipeline::start(
            Arc::clone(&directory),
            Arc::clone(&spool),
            ack_factory,
            Arc::downgrade(&scheduler),
            config.provider_config(),
        ) {
            Ok(pipeline) => pipeline,
            Err(e) => {
                spool.close();
                directory.close();
                return Err(e.into());
            }
        };

        tracing::info!(
            "[node] Provider '{}' started ({:?} backend, data dir {:?})",
            config.server.identifier,
            config.provider.backend,
            data_dir
        );

        Ok(Self {
            pipeline,
            directory,
            spool,
            scheduler,
            keys,
            config,
            _lock: lock,
        })
    }

    pub fn provider(&self) -> &ProviderPipeline {
        &self.pipeline
    }

    /// Shared handle for operator tooling (adding users while running).
    pub fn directory(&self) -> Arc<dyn UserDirectoryApi> {
        Arc::clone(&self.directory)
    }

    /// Shared handle for the client retrieval path.
    pub fn spool(&self) -> Arc<dyn Spool> {
        Arc::clone(&self.spool)
    }

    pub fn scheduler(&self) -> Arc<dyn PacketScheduler> {
        Arc::clone(&self.scheduler)
    }

    pub fn keys(&self) -> &NodeKeys {
        &self.keys
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Halt the pipeline and close storage. Blocks until done; idempotent.
    pub fn shutdown(&self) {
        tracing::info!("[node] Shutting down provider '{}'", self.config.server.identifier);
        self.pipeline.halt();
    }
}

/// Open the user directory for the configured backend.
pub fn open_directory(config: &NodeConfig) -> Result<Arc<dyn UserDirectoryApi>, ContainerError> {
    let db_config = config.user_db_config();
    let path = config.data_path(&config.provider.user_db);
    let directory: Arc<dyn UserDirectoryApi> = match config.provider.backend {
        StorageBackend::File => Arc::new(UserDirectory::open_file(&path, db_config)?),
        StorageBackend::Memory => Arc::new(UserDirectory::open_memory(db_config)?),
        #[cfg(feature = "rocksdb")]
        StorageBackend::Rocksdb => Arc::new(UserDirectory::open_rocksdb(&path, db_config)?),
        #[cfg(not(feature = "rocksdb"))]
        StorageBackend::Rocksdb => return Err(ContainerError::BackendUnavailable("rocksdb")),
    };
    Ok(directory)
}

fn open_spool(config: &NodeConfig) -> Result<Arc<dyn Spool>, ContainerError> {
    let path = config.data_path(&config.provider.spool);
    let spool: Arc<dyn Spool> = match config.provider.backend {
        StorageBackend::File => Arc::new(DurableSpool::open_file(&path)?),
        StorageBackend::Memory => Arc::new(MemorySpool::new()),
        #[cfg(feature = "rocksdb")]
        StorageBackend::Rocksdb => Arc::new(DurableSpool::open_rocksdb(&path)?),
        #[cfg(not(feature = "rocksdb"))]
        StorageBackend::Rocksdb => return Err(ContainerError::BackendUnavailable("rocksdb")),
    };
    Ok(spool)
}
