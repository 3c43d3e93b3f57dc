//! In-memory store doubles for unit and handler tests

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::core::config::UploadConfig;
use crate::core::database::{ConnectionManager, StoreConnector};
use crate::core::error::{AppError, Result};
use crate::features::files::models::FileRecord;
use crate::features::files::{FileService, UploadPolicy};
use crate::modules::documents::FileMetadataStore;
use crate::modules::storage::ObjectStore;

#[derive(Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<String, (Vec<u8>, String)>>,
    fail_puts: AtomicBool,
    fail_gets: AtomicBool,
    fail_deletes: AtomicBool,
    fail_pings: AtomicBool,
}

impl MemoryObjectStore {
    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn content_type(&self, key: &str) -> Option<String> {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .map(|(_, content_type)| content_type.clone())
    }

    /// Remove an object behind the service's back
    pub fn remove(&self, key: &str) {
        self.objects.lock().unwrap().remove(key);
    }

    pub fn set_fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_gets(&self, fail: bool) {
        self.fail_gets.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_pings(&self, fail: bool) {
        self.fail_pings.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<()> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(AppError::Storage(format!("put '{}' rejected", key)));
        }
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (data, content_type.to_string()));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        if self.fail_gets.load(Ordering::SeqCst) {
            return Err(AppError::Storage(format!("get '{}' failed", key)));
        }
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .map(|(data, _)| data.clone())
            .ok_or_else(|| AppError::NotFound(format!("Object '{}' not found", key)))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(AppError::Storage(format!("delete '{}' failed", key)));
        }
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        if self.fail_pings.load(Ordering::SeqCst) {
            return Err(AppError::Storage("MinIO ping failed".to_string()));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryMetadataStore {
    records: Mutex<Vec<FileRecord>>,
    fail_inserts: AtomicBool,
    fail_pings: AtomicBool,
}

impl MemoryMetadataStore {
    pub fn get(&self, file_id: &str) -> Option<FileRecord> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.file_id == file_id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn set_fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_pings(&self, fail: bool) {
        self.fail_pings.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl FileMetadataStore for MemoryMetadataStore {
    async fn list(&self) -> Result<Vec<FileRecord>> {
        Ok(self.records.lock().unwrap().clone())
    }

    async fn find(&self, file_id: &str) -> Result<Option<FileRecord>> {
        Ok(self.get(file_id))
    }

    async fn insert(&self, record: &FileRecord) -> Result<()> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(AppError::Internal("insert rejected".to_string()));
        }
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn update_name(&self, file_id: &str, name: &str) -> Result<bool> {
        let mut records = self.records.lock().unwrap();
        match records.iter_mut().find(|r| r.file_id == file_id) {
            Some(record) => {
                record.name = name.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, file_id: &str) -> Result<bool> {
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|r| r.file_id != file_id);
        Ok(records.len() != before)
    }

    async fn ping(&self) -> Result<()> {
        if self.fail_pings.load(Ordering::SeqCst) {
            return Err(AppError::StoreUnavailable("MongoDB ping failed".to_string()));
        }
        Ok(())
    }
}

/// Connector handing out shared in-memory stores, with scripted failures
#[derive(Default)]
pub struct TestConnector {
    pub metadata: Arc<MemoryMetadataStore>,
    pub objects: Arc<MemoryObjectStore>,
    metadata_failures: AtomicU32,
    object_failures: AtomicU32,
    metadata_attempts: AtomicU32,
    object_attempts: AtomicU32,
    open_delay_ms: AtomicU64,
}

impl TestConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `times` metadata connection attempts
    pub fn fail_metadata_times(&self, times: u32) {
        self.metadata_failures.store(times, Ordering::SeqCst);
    }

    /// Fail the next `times` object store connection attempts
    pub fn fail_object_times(&self, times: u32) {
        self.object_failures.store(times, Ordering::SeqCst);
    }

    /// Make every connection attempt hang for `delay` before answering
    pub fn set_open_delay(&self, delay: Duration) {
        self.open_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    async fn open_delay(&self) {
        let ms = self.open_delay_ms.load(Ordering::SeqCst);
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }

    pub fn metadata_attempts(&self) -> u32 {
        self.metadata_attempts.load(Ordering::SeqCst)
    }

    pub fn object_attempts(&self) -> u32 {
        self.object_attempts.load(Ordering::SeqCst)
    }
}

fn take_failure(counter: &AtomicU32) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

#[async_trait]
impl StoreConnector for TestConnector {
    async fn open_metadata_store(&self) -> Result<Arc<dyn FileMetadataStore>> {
        self.metadata_attempts.fetch_add(1, Ordering::SeqCst);
        self.open_delay().await;
        if take_failure(&self.metadata_failures) {
            return Err(AppError::StoreUnavailable(
                "MongoDB connection refused".to_string(),
            ));
        }
        Ok(self.metadata.clone())
    }

    async fn open_object_store(&self) -> Result<Arc<dyn ObjectStore>> {
        self.object_attempts.fetch_add(1, Ordering::SeqCst);
        self.open_delay().await;
        if take_failure(&self.object_failures) {
            return Err(AppError::Storage("MinIO connection refused".to_string()));
        }
        Ok(self.objects.clone())
    }
}

pub fn upload_config(max_file_size: usize, allowed_file_types: &[&str]) -> UploadConfig {
    UploadConfig {
        max_file_size,
        allowed_file_types: allowed_file_types.iter().map(|t| t.to_string()).collect(),
    }
}

/// Fully connected manager plus handles to its stores
pub async fn connected_manager() -> (Arc<ConnectionManager>, Arc<TestConnector>) {
    let connector = Arc::new(TestConnector::new());
    let manager = Arc::new(ConnectionManager::new(connector.clone()));
    manager.connect().await;
    (manager, connector)
}

pub async fn file_service(upload: &UploadConfig) -> (Arc<FileService>, Arc<TestConnector>) {
    let (manager, connector) = connected_manager().await;
    let service = Arc::new(FileService::new(manager, UploadPolicy::from(upload)));
    (service, connector)
}
