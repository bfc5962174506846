use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::models::ImageInfo;
use crate::storage::{ImageId, ImageStore, StoreError};

/// Default upper bound on a single image.
pub const DEFAULT_MAX_IMAGE_SIZE: u64 = 5 * 1024 * 1024;

struct Blob {
    data: Vec<u8>,
    staged_at: DateTime<Utc>,
    committed: bool,
}

/// Image blobs held in memory, keyed by content hash.
pub struct MemoryImageStore {
    blobs: RwLock<HashMap<ImageId, Blob>>,
    max_size: u64,
}

impl Default for MemoryImageStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_IMAGE_SIZE)
    }
}

impl MemoryImageStore {
    pub fn new(max_size: u64) -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
            max_size,
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<ImageId, Blob>>, StoreError> {
        self.blobs
            .read()
            .map_err(|_| StoreError::poisoned("image store"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<ImageId, Blob>>, StoreError> {
        self.blobs
            .write()
            .map_err(|_| StoreError::poisoned("image store"))
    }
}

fn image_not_found(id: &ImageId) -> StoreError {
    StoreError::NotFound(format!("image {id}"))
}

#[async_trait]
impl ImageStore for MemoryImageStore {
    async fn save(&self, data: Vec<u8>) -> Result<ImageId, StoreError> {
        let size = data.len() as u64;
        if size > self.max_size {
            return Err(StoreError::TooLarge {
                actual: size,
                limit: self.max_size,
            });
        }

        let id = ImageId::of(&data);
        let mut blobs = self.write()?;
        // Re-uploading known content keeps its original state and staging time.
        blobs.entry(id).or_insert_with(|| Blob {
            data,
            staged_at: Utc::now(),
            committed: false,
        });
        Ok(id)
    }

    async fn load(&self, id: &ImageId) -> Result<Vec<u8>, StoreError> {
        let blobs = self.read()?;
        blobs
            .get(id)
            .map(|b| b.data.clone())
            .ok_or_else(|| image_not_found(id))
    }

    async fn commit(&self, id: &ImageId) -> Result<(), StoreError> {
        let mut blobs = self.write()?;
        let blob = blobs.get_mut(id).ok_or_else(|| image_not_found(id))?;
        blob.committed = true;
        Ok(())
    }

    async fn cleanup(&self, before: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut blobs = self.write()?;
        let initial = blobs.len();
        blobs.retain(|_, b| b.committed || b.staged_at >= before);
        let removed = initial - blobs.len();
        if removed > 0 {
            debug!(removed, %before, "Removed stale staged images");
        }
        Ok(removed)
    }

    async fn info(&self) -> Result<ImageInfo, StoreError> {
        let blobs = self.read()?;
        let mut info = ImageInfo::default();
        for blob in blobs.values() {
            info.bytes += blob.data.len() as u64;
            if blob.committed {
                info.committed += 1;
            } else {
                info.staged += 1;
                info.first_staged = Some(match info.first_staged {
                    Some(t) => t.min(blob.staged_at),
                    None => blob.staged_at,
                });
            }
        }
        Ok(info)
    }
}
