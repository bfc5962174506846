use chrono::{DateTime, Utc};
use common::models::ImageInfo;
use common::storage::{ImageId, StoreError};
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

use crate::rpc::Registry;
use crate::state::Stores;

/// Image bytes travel as standard base64 strings.
pub mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded.as_bytes()).map_err(de::Error::custom)
    }
}

/// Envelope room on top of the base64-encoded image.
const ENVELOPE_HEADROOM: usize = 64 * 1024;

/// Body limit that lets an image of `max_image_size` bytes reach the store,
/// so oversized uploads get the store's own error in the envelope.
pub fn body_limit(max_image_size: u64) -> axum::extract::DefaultBodyLimit {
    let encoded = max_image_size.div_ceil(3).saturating_mul(4);
    let encoded = usize::try_from(encoded).unwrap_or(usize::MAX);
    axum::extract::DefaultBodyLimit::max(encoded.saturating_add(ENVELOPE_HEADROOM))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImageData {
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
}

#[derive(Debug, Deserialize)]
pub struct ImageRef {
    pub id: ImageId,
}

#[derive(Debug, Deserialize)]
pub struct CleanupParams {
    pub before: DateTime<Utc>,
}

pub fn register(registry: &mut Registry) {
    registry
        .register("image.save", save)
        .register("image.load", load)
        .register("image.commit", commit)
        .register("image.cleanup", cleanup)
        .register("image.info", info);
}

pub async fn save(stores: Stores, p: ImageData) -> Result<ImageId, StoreError> {
    stores.images.save(p.data).await
}

pub async fn load(stores: Stores, p: ImageRef) -> Result<ImageData, StoreError> {
    let data = stores.images.load(&p.id).await?;
    Ok(ImageData { data })
}

pub async fn commit(stores: Stores, p: ImageRef) -> Result<(), StoreError> {
    stores.images.commit(&p.id).await
}

pub async fn cleanup(stores: Stores, p: CleanupParams) -> Result<usize, StoreError> {
    stores.images.cleanup(p.before).await
}

pub async fn info(stores: Stores, _: IgnoredAny) -> Result<ImageInfo, StoreError> {
    stores.images.info().await
}
