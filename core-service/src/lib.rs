//! Core service façade and bootstrap helpers.
//!
//! [`PhotoService`] is the one object a host needs: it owns the catalog, the
//! sync orchestrator, the credential vault and the iCloud flow, built from an
//! [`AppConfig`] and a set of bridge implementations. Servers and desktop
//! hosts enable the `desktop-shims` feature and call [`bootstrap_desktop`],
//! which wires the `bridge-desktop` adapters (S3 and reqwest).
//!
//! Parts whose settings are missing are left out; calling into them returns a
//! configuration error naming the missing variable, and the rest of the
//! service keeps working.

pub mod error;
pub mod views;

pub use error::{CoreError, Result};
pub use views::{AssetUrls, PhotoView};

pub use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
pub use core_runtime::AppConfig;
pub use core_sync::{IcloudSyncOutcome, PendingChallenge, SyncResult, WorkerSyncSummary};

use bridge_traits::{http::HttpClient, storage::ObjectStore, time::Clock};
use core_auth::{CredentialVault, EncryptionKey, WorkerAuthBridge};
use core_library::Catalog;
use core_metadata::MetadataExtractor;
use core_sync::{IcloudSync, SyncConfig, SyncOrchestrator, WorkerClient};
use provider_object_storage::ObjectLister;
use std::sync::Arc;
use tracing::{info, instrument};

/// Aggregated handle to the bridge dependencies the core requires.
#[derive(Clone)]
pub struct CoreDependencies {
    pub object_store: Arc<dyn ObjectStore>,
    pub http_client: Arc<dyn HttpClient>,
    pub extractor: Arc<dyn MetadataExtractor>,
    pub clock: Arc<dyn Clock>,
}

impl CoreDependencies {
    pub fn new(
        object_store: Arc<dyn ObjectStore>,
        http_client: Arc<dyn HttpClient>,
        extractor: Arc<dyn MetadataExtractor>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            object_store,
            http_client,
            extractor,
            clock,
        }
    }
}

/// Primary façade exposed to host applications.
pub struct PhotoService {
    config: AppConfig,
    catalog: Catalog,
    urls: AssetUrls,
    orchestrator: Option<SyncOrchestrator>,
    vault: Option<CredentialVault>,
    icloud: Option<IcloudSync>,
}

impl PhotoService {
    /// Assemble the service.
    ///
    /// # Errors
    ///
    /// A vault key or worker setting that is present but unusable fails here.
    /// Absent settings do not.
    pub fn new(config: AppConfig, catalog: Catalog, deps: CoreDependencies) -> Result<Self> {
        let orchestrator = config.storage.bucket.as_deref().map(|bucket| {
            let mut sync_config = SyncConfig::new(bucket, config.storage.photo_prefix.clone())
                .with_source(config.source.id.clone(), config.source.label.clone())
                .with_default_limit(config.sync_limit);
            if let Some(prefix) = &config.storage.thumbnail_prefix {
                sync_config = sync_config.with_thumbnail_prefix(prefix.clone());
            }
            SyncOrchestrator::new(
                sync_config,
                catalog.clone(),
                ObjectLister::new(deps.object_store.clone()),
                deps.extractor.clone(),
                deps.clock.clone(),
            )
        });

        let vault = if config.has_encryption_key() {
            let key = EncryptionKey::from_bytes(&config.require_encryption_key()?)?;
            Some(CredentialVault::new(&key, catalog.accounts(), deps.clock.clone()))
        } else {
            None
        };

        let icloud = match (&vault, &config.worker.base_url, &config.worker.jwt_secret) {
            (Some(vault), Some(base_url), Some(secret)) => {
                let auth = WorkerAuthBridge::new(base_url, secret, deps.clock.clone())?;
                let worker = WorkerClient::new(deps.http_client.clone(), auth, config.worker.timeout);
                Some(IcloudSync::new(vault.clone(), worker, deps.clock.clone()))
            }
            _ => None,
        };

        info!(
            bucket_sync = orchestrator.is_some(),
            vault = vault.is_some(),
            icloud = icloud.is_some(),
            "Photo service ready"
        );

        Ok(Self {
            urls: AssetUrls::from_public_base(config.storage.public_base_url.as_deref()),
            config,
            catalog,
            orchestrator,
            vault,
            icloud,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Import new photos from the configured bucket.
    #[instrument(skip(self))]
    pub async fn sync_bucket(&self, limit: Option<usize>) -> Result<SyncResult> {
        let orchestrator = self.orchestrator()?;
        Ok(orchestrator.sync(limit).await?)
    }

    /// Every cataloged photo, newest capture first, with browser URLs.
    #[instrument(skip(self))]
    pub async fn list_photos(&self) -> Result<Vec<PhotoView>> {
        let photos = self.catalog.list_photos().await?;
        Ok(photos
            .into_iter()
            .map(|photo| PhotoView::from_photo(photo, &self.urls))
            .collect())
    }

    pub async fn has_account(&self, user_id: &str) -> Result<bool> {
        Ok(self.vault()?.has_account(user_id).await?)
    }

    pub async fn save_credentials(
        &self,
        user_id: &str,
        apple_id: &str,
        app_password: &str,
    ) -> Result<()> {
        Ok(self
            .vault()?
            .save_credentials(user_id, apple_id, app_password)
            .await?)
    }

    /// Ask the iCloud worker to pull the user's library into the bucket.
    pub async fn start_icloud_sync(
        &self,
        user_id: &str,
        limit: Option<usize>,
    ) -> Result<IcloudSyncOutcome> {
        Ok(self.icloud()?.start(user_id, limit).await?)
    }

    pub async fn submit_two_factor(
        &self,
        user_id: &str,
        session_id: &str,
        code: &str,
    ) -> Result<IcloudSyncOutcome> {
        Ok(self
            .icloud()?
            .submit_two_factor(user_id, session_id, code)
            .await?)
    }

    fn orchestrator(&self) -> Result<&SyncOrchestrator> {
        match &self.orchestrator {
            Some(orchestrator) => Ok(orchestrator),
            None => Err(self.config.storage.require_bucket().err().map_or_else(
                || CoreError::InitializationFailed("bucket sync is unavailable".to_string()),
                CoreError::from,
            )),
        }
    }

    fn vault(&self) -> Result<&CredentialVault> {
        match &self.vault {
            Some(vault) => Ok(vault),
            None => Err(self.config.require_encryption_key().err().map_or_else(
                || CoreError::InitializationFailed("credential vault is unavailable".to_string()),
                CoreError::from,
            )),
        }
    }

    fn icloud(&self) -> Result<&IcloudSync> {
        if let Some(icloud) = &self.icloud {
            return Ok(icloud);
        }
        self.vault()?;
        self.config.worker.require_base_url()?;
        self.config.worker.require_jwt_secret()?;
        Err(CoreError::InitializationFailed(
            "iCloud sync is unavailable".to_string(),
        ))
    }
}

/// Build a [`PhotoService`] on the desktop adapters: SQLite at
/// `DATABASE_URL`, the S3 bucket from the storage settings, and reqwest for
/// the worker.
#[cfg(all(feature = "desktop-shims", not(target_arch = "wasm32")))]
pub async fn bootstrap_desktop(config: AppConfig) -> Result<PhotoService> {
    use bridge_desktop::{ReqwestHttpClient, S3ObjectStore, S3StoreConfig};
    use bridge_traits::time::SystemClock;
    use core_library::db::{create_pool, DatabaseConfig};
    use core_metadata::ExifMetadataExtractor;

    let pool = create_pool(DatabaseConfig::from_url(config.database_url.clone())).await?;

    let storage = &config.storage;
    let mut store_config =
        S3StoreConfig::new(storage.region.clone()).with_force_path_style(storage.force_path_style);
    if let Some(endpoint) = &storage.endpoint {
        store_config = store_config.with_endpoint(endpoint.clone());
    }
    if let (Some(access_key_id), Some(secret_access_key)) =
        (&storage.access_key_id, &storage.secret_access_key)
    {
        store_config =
            store_config.with_static_credentials(access_key_id.clone(), secret_access_key.clone());
    }
    let object_store = S3ObjectStore::connect(store_config).await;

    let http_client = ReqwestHttpClient::with_timeout(config.worker.timeout)
        .map_err(|e| CoreError::InitializationFailed(e.to_string()))?;

    let deps = CoreDependencies::new(
        Arc::new(object_store),
        Arc::new(http_client),
        Arc::new(ExifMetadataExtractor::new()),
        Arc::new(SystemClock),
    );
    PhotoService::new(config, Catalog::new(pool), deps)
}
