pub mod ids;
pub mod models;
pub mod retry;
pub mod storage;
pub mod tree;

pub use models::{Comment, Locator, Sign, SortKey};
pub use storage::{ErrorKind, StoreError};
