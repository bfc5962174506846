//! JSON-RPC envelope and method registry.

pub mod envelope;
pub mod registry;

pub use envelope::{Request, Response, Signature};
pub use registry::Registry;
