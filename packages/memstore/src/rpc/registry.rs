use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use common::storage::StoreError;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::error::RpcError;
use crate::state::Stores;

type BoxFuture = Pin<Box<dyn Future<Output = Result<Value, RpcError>> + Send>>;
type Handler = Arc<dyn Fn(Stores, Value) -> BoxFuture + Send + Sync>;

/// Method name to handler table.
///
/// Each handler decodes its own params, so the dispatcher never needs to
/// know a method's schema.
#[derive(Default, Clone)]
pub struct Registry {
    handlers: HashMap<&'static str, Handler>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a typed handler under `method`, replacing any previous one.
    pub fn register<P, R, F, Fut>(&mut self, method: &'static str, handler: F) -> &mut Self
    where
        P: DeserializeOwned + Send + 'static,
        R: Serialize + 'static,
        F: Fn(Stores, P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, StoreError>> + Send + 'static,
    {
        let handler = Arc::new(handler);
        let erased: Handler = Arc::new(move |stores: Stores, params: Value| -> BoxFuture {
            let handler = Arc::clone(&handler);
            Box::pin(async move {
                let params: P = serde_json::from_value(params).map_err(RpcError::Params)?;
                let result = handler(stores, params).await?;
                serde_json::to_value(result).map_err(RpcError::Encode)
            })
        });
        self.handlers.insert(method, erased);
        self
    }

    pub fn contains(&self, method: &str) -> bool {
        self.handlers.contains_key(method)
    }

    /// Registered method names, sorted.
    pub fn methods(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.handlers.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub async fn call(&self, stores: &Stores, method: &str, params: Value) -> Result<Value, RpcError> {
        let handler = self
            .handlers
            .get(method)
            .ok_or_else(|| RpcError::UnknownMethod(method.to_string()))?;
        handler(stores.clone(), params).await
    }
}
