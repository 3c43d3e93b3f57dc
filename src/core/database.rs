//! Connection management for the metadata store (MongoDB) and the object
//! store (MinIO).
//!
//! Each store is connected independently so the service can start, and
//! report itself as degraded, while one of them is down.

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::core::config::{MinIOConfig, MongoDBConfig, RetryConfig};
use crate::core::error::{AppError, Result};
use crate::modules::documents::{FileMetadataStore, MongoClient};
use crate::modules::storage::{MinIOClient, ObjectStore};
use crate::shared::constants::HEALTH_CONNECT_TIMEOUT;

/// Opens new store clients
#[async_trait]
pub trait StoreConnector: Send + Sync {
    async fn open_metadata_store(&self) -> Result<Arc<dyn FileMetadataStore>>;
    async fn open_object_store(&self) -> Result<Arc<dyn ObjectStore>>;
}

/// Connector backed by the configured MongoDB and MinIO servers
pub struct DefaultConnector {
    mongodb: MongoDBConfig,
    minio: MinIOConfig,
}

impl DefaultConnector {
    pub fn new(mongodb: MongoDBConfig, minio: MinIOConfig) -> Self {
        Self { mongodb, minio }
    }
}

#[async_trait]
impl StoreConnector for DefaultConnector {
    async fn open_metadata_store(&self) -> Result<Arc<dyn FileMetadataStore>> {
        let client = MongoClient::connect(&self.mongodb).await?;
        Ok(Arc::new(client))
    }

    async fn open_object_store(&self) -> Result<Arc<dyn ObjectStore>> {
        let client = MinIOClient::connect(&self.minio).await?;
        Ok(Arc::new(client))
    }
}

/// Outcome of connecting one store
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConnectResult {
    pub success: bool,
    pub attempts: u32,
    pub error: Option<String>,
}

/// Outcome of connecting both stores
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionReport {
    pub mongodb: ServiceConnectResult,
    pub minio: ServiceConnectResult,
}

impl ConnectionReport {
    pub fn all_connected(&self) -> bool {
        self.mongodb.success && self.minio.success
    }

    pub fn any_connected(&self) -> bool {
        self.mongodb.success || self.minio.success
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceStatus {
    Healthy,
    Unhealthy,
    Disconnected,
}

impl ServiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceStatus::Healthy => "healthy",
            ServiceStatus::Unhealthy => "unhealthy",
            ServiceStatus::Disconnected => "disconnected",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceHealth {
    pub status: ServiceStatus,
    pub error: Option<String>,
}

impl ServiceHealth {
    fn healthy() -> Self {
        Self {
            status: ServiceStatus::Healthy,
            error: None,
        }
    }

    fn unhealthy(error: &AppError) -> Self {
        Self {
            status: ServiceStatus::Unhealthy,
            error: Some(error.to_string()),
        }
    }

    fn disconnected(error: &AppError) -> Self {
        Self {
            status: ServiceStatus::Disconnected,
            error: Some(error.to_string()),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == ServiceStatus::Healthy
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverallStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl OverallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverallStatus::Healthy => "healthy",
            OverallStatus::Degraded => "degraded",
            OverallStatus::Unhealthy => "unhealthy",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HealthReport {
    pub status: OverallStatus,
    pub mongodb: ServiceHealth,
    pub minio: ServiceHealth,
}

impl HealthReport {
    fn from_services(mongodb: ServiceHealth, minio: ServiceHealth) -> Self {
        let status = match (mongodb.is_healthy(), minio.is_healthy()) {
            (true, true) => OverallStatus::Healthy,
            (false, false) => OverallStatus::Unhealthy,
            _ => OverallStatus::Degraded,
        };
        Self {
            status,
            mongodb,
            minio,
        }
    }
}

/// Delay to wait before connection attempt `attempt` (1-based).
///
/// The first attempt runs immediately, then the delay doubles each time.
pub fn backoff_delay(initial: Duration, attempt: u32) -> Duration {
    if attempt < 2 {
        return Duration::ZERO;
    }
    let factor = 1u32.checked_shl(attempt - 2).unwrap_or(u32::MAX);
    initial.saturating_mul(factor)
}

async fn connect_with_backoff<F, Fut>(
    service: &str,
    max_attempts: u32,
    initial_delay: Duration,
    mut connect: F,
) -> ServiceConnectResult
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let max_attempts = max_attempts.max(1);
    let mut last_error = None;

    for attempt in 1..=max_attempts {
        let delay = backoff_delay(initial_delay, attempt);
        if !delay.is_zero() {
            info!(
                "Retrying {} connection in {:?} (attempt {}/{})",
                service, delay, attempt, max_attempts
            );
            tokio::time::sleep(delay).await;
        }

        match connect().await {
            Ok(()) => {
                return ServiceConnectResult {
                    success: true,
                    attempts: attempt,
                    error: None,
                };
            }
            Err(e) => {
                warn!(
                    "{} connection attempt {}/{} failed: {}",
                    service, attempt, max_attempts, e
                );
                last_error = Some(e.to_string());
            }
        }
    }

    error!(
        "Giving up on {} after {} attempt(s)",
        service, max_attempts
    );
    ServiceConnectResult {
        success: false,
        attempts: max_attempts,
        error: last_error,
    }
}

/// Owns the live store clients and the connector used to (re)open them
pub struct ConnectionManager {
    connector: Arc<dyn StoreConnector>,
    metadata: RwLock<Option<Arc<dyn FileMetadataStore>>>,
    objects: RwLock<Option<Arc<dyn ObjectStore>>>,
    health_connect_timeout: Duration,
}

impl ConnectionManager {
    pub fn new(connector: Arc<dyn StoreConnector>) -> Self {
        Self {
            connector,
            metadata: RwLock::new(None),
            objects: RwLock::new(None),
            health_connect_timeout: HEALTH_CONNECT_TIMEOUT,
        }
    }

    /// Bound the connection attempt a health check makes for a missing store
    #[cfg(test)]
    pub fn with_health_connect_timeout(mut self, timeout: Duration) -> Self {
        self.health_connect_timeout = timeout;
        self
    }

    async fn connect_within<F>(&self, service: &str, connect: F) -> Result<()>
    where
        F: Future<Output = Result<()>>,
    {
        match tokio::time::timeout(self.health_connect_timeout, connect).await {
            Ok(result) => result,
            Err(_) => {
                let message = format!(
                    "{} connect timed out after {:?}",
                    service, self.health_connect_timeout
                );
                warn!("{}", message);
                Err(AppError::StoreUnavailable(message))
            }
        }
    }

    /// Single attempt to connect the metadata store
    pub async fn connect_metadata_store(&self) -> Result<()> {
        let store = self.connector.open_metadata_store().await?;
        *self.metadata.write().await = Some(store);
        info!("Connected to MongoDB");
        Ok(())
    }

    /// Single attempt to connect the object store
    pub async fn connect_object_store(&self) -> Result<()> {
        let store = self.connector.open_object_store().await?;
        *self.objects.write().await = Some(store);
        info!("Connected to MinIO");
        Ok(())
    }

    /// One attempt per store, without waiting between them
    pub async fn connect(&self) -> ConnectionReport {
        self.connect_with_retry(&RetryConfig {
            enabled: false,
            max_retries: 1,
            initial_delay: Duration::ZERO,
        })
        .await
    }

    /// Connect both stores, retrying each with exponential backoff.
    ///
    /// A store that exhausts its attempts does not stop the other one from
    /// being tried.
    pub async fn connect_with_retry(&self, policy: &RetryConfig) -> ConnectionReport {
        let max_attempts = if policy.enabled { policy.max_retries } else { 1 };

        let mongodb = connect_with_backoff("MongoDB", max_attempts, policy.initial_delay, || {
            self.connect_metadata_store()
        })
        .await;
        let minio = connect_with_backoff("MinIO", max_attempts, policy.initial_delay, || {
            self.connect_object_store()
        })
        .await;

        ConnectionReport { mongodb, minio }
    }

    pub async fn metadata_store(&self) -> Result<Arc<dyn FileMetadataStore>> {
        self.metadata
            .read()
            .await
            .clone()
            .ok_or_else(|| AppError::StoreUnavailable("MongoDB is not connected".to_string()))
    }

    pub async fn object_store(&self) -> Result<Arc<dyn ObjectStore>> {
        self.objects
            .read()
            .await
            .clone()
            .ok_or_else(|| AppError::StoreUnavailable("MinIO is not connected".to_string()))
    }

    /// Ping both stores. A store that is not connected gets one connection
    /// attempt first.
    pub async fn health_check(&self) -> HealthReport {
        let (mongodb, minio) = tokio::join!(self.metadata_health(), self.object_health());
        HealthReport::from_services(mongodb, minio)
    }

    async fn metadata_health(&self) -> ServiceHealth {
        let store = match self.metadata_store().await {
            Ok(store) => store,
            Err(_) => {
                if let Err(e) = self
                    .connect_within("MongoDB", self.connect_metadata_store())
                    .await
                {
                    return ServiceHealth::disconnected(&e);
                }
                match self.metadata_store().await {
                    Ok(store) => store,
                    Err(e) => return ServiceHealth::disconnected(&e),
                }
            }
        };

        match store.ping().await {
            Ok(()) => ServiceHealth::healthy(),
            Err(e) => ServiceHealth::unhealthy(&e),
        }
    }

    async fn object_health(&self) -> ServiceHealth {
        let store = match self.object_store().await {
            Ok(store) => store,
            Err(_) => {
                if let Err(e) = self
                    .connect_within("MinIO", self.connect_object_store())
                    .await
                {
                    return ServiceHealth::disconnected(&e);
                }
                match self.object_store().await {
                    Ok(store) => store,
                    Err(e) => return ServiceHealth::disconnected(&e),
                }
            }
        };

        match store.ping().await {
            Ok(()) => ServiceHealth::healthy(),
            Err(e) => ServiceHealth::unhealthy(&e),
        }
    }

    /// Drop both clients
    pub async fn close(&self) {
        if self.metadata.write().await.take().is_some() {
            info!("MongoDB connection closed");
        }
        if self.objects.write().await.take().is_some() {
            info!("MinIO client released");
        }
    }
}
