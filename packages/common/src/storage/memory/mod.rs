//! Volatile store realisations.
//!
//! Each store guards its maps with one `RwLock`: lookups share the read
//! side, every mutation (including the read-modify-write of a vote) holds the
//! write side for its whole duration. Nothing awaits while a guard is held.

mod admin;
mod comments;
mod images;

pub use admin::MemoryAdminStore;
pub use comments::MemoryCommentStore;
pub use images::{DEFAULT_MAX_IMAGE_SIZE, MemoryImageStore};
