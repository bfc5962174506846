mod error;
mod hash;
mod traits;

pub mod memory;

pub use error::{ErrorKind, StoreError};
pub use hash::ImageId;
pub use traits::{AdminStore, CommentStore, ImageStore};
