//! Typed client for the RPC endpoint.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use common::retry::{Classify, Delay, Repeater, RetryError};
use reqwest::{Client, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::rpc::{Request, Response};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server replied {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("can't encode params: {0}")]
    Encode(serde_json::Error),

    #[error("can't decode reply: {0}")]
    Decode(serde_json::Error),

    /// The server answered with an `error` envelope.
    #[error("{0}")]
    Remote(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientErrorKind {
    Transport,
    ServerError,
    Rejected,
    Encode,
    Decode,
    Remote,
}

impl Classify for ClientError {
    type Kind = ClientErrorKind;

    fn kind(&self) -> ClientErrorKind {
        match self {
            ClientError::Transport(_) => ClientErrorKind::Transport,
            ClientError::Status { status, .. } if status.is_server_error() => {
                ClientErrorKind::ServerError
            }
            ClientError::Status { .. } => ClientErrorKind::Rejected,
            ClientError::Encode(_) => ClientErrorKind::Encode,
            ClientError::Decode(_) => ClientErrorKind::Decode,
            ClientError::Remote(_) => ClientErrorKind::Remote,
        }
    }
}

/// Retries transport failures and 5xx replies; everything else is final.
pub fn default_repeater() -> Repeater<ClientErrorKind> {
    Repeater::new(
        3,
        Delay::Exponential {
            base: Duration::from_millis(100),
            ceiling: Duration::from_secs(2),
        },
    )
    .fatal(ClientErrorKind::Rejected)
    .fatal(ClientErrorKind::Encode)
    .fatal(ClientErrorKind::Decode)
    .fatal(ClientErrorKind::Remote)
}

pub struct RpcClient {
    http: Client,
    endpoint: String,
    credentials: Option<(String, String)>,
    repeater: Repeater<ClientErrorKind>,
    next_id: AtomicU64,
}

impl RpcClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            endpoint: endpoint.into(),
            credentials: None,
            repeater: default_repeater(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn with_credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some((user.into(), password.into()));
        self
    }

    pub fn with_repeater(mut self, repeater: Repeater<ClientErrorKind>) -> Self {
        self.repeater = repeater;
        self
    }

    pub async fn call<P, R>(&self, method: &str, params: &P) -> Result<R, RetryError<ClientError>>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.call_with_cancel(method, params, &CancellationToken::new())
            .await
    }

    /// Like [`call`](Self::call), giving up between attempts once `cancel` fires.
    ///
    /// Every attempt reuses the same envelope id, so the server sees a replay.
    pub async fn call_with_cancel<P, R>(
        &self,
        method: &str,
        params: &P,
        cancel: &CancellationToken,
    ) -> Result<R, RetryError<ClientError>>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.repeater
            .run(cancel, move || self.attempt(id, method, params))
            .await
    }

    async fn attempt<P, R>(&self, id: u64, method: &str, params: &P) -> Result<R, ClientError>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let request = Request {
            method: method.to_string(),
            id,
            params: serde_json::to_value(params).map_err(ClientError::Encode)?,
        };

        let mut builder = self.http.post(&self.endpoint).json(&request);
        if let Some((user, password)) = &self.credentials {
            builder = builder.basic_auth(user, Some(password));
        }
        let res = builder.send().await?;

        let status = res.status();
        let body = res.bytes().await?;
        if !status.is_success() {
            return Err(ClientError::Status {
                status,
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        let reply: Response = serde_json::from_slice(&body).map_err(ClientError::Decode)?;
        if let Some(error) = reply.error {
            return Err(ClientError::Remote(error));
        }
        serde_json::from_value(reply.result.unwrap_or(Value::Null)).map_err(ClientError::Decode)
    }
}
