use common::models::AdminRecord;
use common::storage::StoreError;
use serde::Deserialize;
use serde::de::IgnoredAny;

use super::store::SiteParams;
use crate::rpc::Registry;
use crate::state::Stores;

#[derive(Debug, Deserialize)]
pub struct SetParams {
    pub site: String,
    pub record: AdminRecord,
}

pub fn register(registry: &mut Registry) {
    registry
        .register("admin.set", set)
        .register("admin.get", get)
        .register("admin.list", list)
        .register("admin.admins", admins)
        .register("admin.email", email)
        .register("admin.enabled", enabled)
        .register("admin.key", key);
}

pub async fn set(stores: Stores, p: SetParams) -> Result<(), StoreError> {
    stores.admin.set(&p.site, p.record).await
}

pub async fn get(stores: Stores, p: SiteParams) -> Result<AdminRecord, StoreError> {
    stores.admin.get(&p.site).await
}

pub async fn list(stores: Stores, _: IgnoredAny) -> Result<Vec<AdminRecord>, StoreError> {
    stores.admin.list().await
}

pub async fn admins(stores: Stores, p: SiteParams) -> Result<Vec<String>, StoreError> {
    stores.admin.admins(&p.site).await
}

pub async fn email(stores: Stores, p: SiteParams) -> Result<String, StoreError> {
    stores.admin.email(&p.site).await
}

pub async fn enabled(stores: Stores, p: SiteParams) -> Result<bool, StoreError> {
    stores.admin.enabled(&p.site).await
}

pub async fn key(stores: Stores, p: SiteParams) -> Result<String, StoreError> {
    stores.admin.key(&p.site).await
}
