use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard};

use async_trait::async_trait;

use crate::models::AdminRecord;
use crate::storage::{AdminStore, StoreError};

/// Admin records held in memory, one per site.
pub struct MemoryAdminStore {
    records: RwLock<HashMap<String, AdminRecord>>,
    /// Returned by `key` for sites without their own secret.
    secret: String,
}

impl MemoryAdminStore {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            secret: secret.into(),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, AdminRecord>>, StoreError> {
        self.records
            .read()
            .map_err(|_| StoreError::poisoned("admin store"))
    }

    fn with_record<T>(
        &self,
        site: &str,
        f: impl FnOnce(&AdminRecord) -> T,
    ) -> Result<T, StoreError> {
        let records = self.read()?;
        records
            .get(site)
            .map(f)
            .ok_or_else(|| StoreError::NotFound(format!("site {site}")))
    }
}

#[async_trait]
impl AdminStore for MemoryAdminStore {
    async fn set(&self, site: &str, mut record: AdminRecord) -> Result<(), StoreError> {
        if site.is_empty() {
            return Err(StoreError::Invalid("site is required".into()));
        }
        record.site_id = site.to_string();
        let mut records = self
            .records
            .write()
            .map_err(|_| StoreError::poisoned("admin store"))?;
        records.insert(site.to_string(), record);
        Ok(())
    }

    async fn get(&self, site: &str) -> Result<AdminRecord, StoreError> {
        self.with_record(site, AdminRecord::clone)
    }

    async fn list(&self) -> Result<Vec<AdminRecord>, StoreError> {
        let records = self.read()?;
        let mut all: Vec<AdminRecord> = records.values().cloned().collect();
        all.sort_by(|a, b| a.site_id.cmp(&b.site_id));
        Ok(all)
    }

    async fn admins(&self, site: &str) -> Result<Vec<String>, StoreError> {
        self.with_record(site, |r| r.admins.iter().cloned().collect())
    }

    async fn email(&self, site: &str) -> Result<String, StoreError> {
        self.with_record(site, |r| r.email.clone())
    }

    async fn enabled(&self, site: &str) -> Result<bool, StoreError> {
        self.with_record(site, |r| r.enabled)
    }

    async fn key(&self, site: &str) -> Result<String, StoreError> {
        let records = self.read()?;
        Ok(records
            .get(site)
            .and_then(|r| r.secret.clone())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| self.secret.clone()))
    }
}
