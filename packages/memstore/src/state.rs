use std::sync::Arc;

use common::storage::memory::{MemoryAdminStore, MemoryCommentStore, MemoryImageStore};
use common::storage::{AdminStore, CommentStore, ImageStore};

use crate::config::AppConfig;
use crate::handlers;
use crate::rpc::{Registry, Signature};

/// The three stores every handler works against.
#[derive(Clone)]
pub struct Stores {
    pub comments: Arc<dyn CommentStore>,
    pub admin: Arc<dyn AdminStore>,
    pub images: Arc<dyn ImageStore>,
}

impl Stores {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            comments: Arc::new(MemoryCommentStore::new(config.edit_window())),
            admin: Arc::new(MemoryAdminStore::new(config.auth.secret.clone())),
            images: Arc::new(MemoryImageStore::new(config.store.max_image_size)),
        }
    }

    /// In-memory stores with default limits.
    pub fn in_memory(secret: &str) -> Self {
        Self {
            comments: Arc::new(MemoryCommentStore::default()),
            admin: Arc::new(MemoryAdminStore::new(secret)),
            images: Arc::new(MemoryImageStore::default()),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub stores: Stores,
    pub registry: Arc<Registry>,
    pub config: AppConfig,
    pub signature: Signature,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            stores: Stores::from_config(&config),
            registry: Arc::new(handlers::registry()),
            config,
            signature: Signature::current(),
        }
    }
}
