pub mod admin;
pub mod image;
pub mod rpc;
pub mod store;

use crate::rpc::Registry;

/// Registry with every `store.*`, `admin.*` and `image.*` method.
pub fn registry() -> Registry {
    let mut registry = Registry::new();
    store::register(&mut registry);
    admin::register(&mut registry);
    image::register(&mut registry);
    registry
}
