use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use serde_json::{Value, json};

use memstore::config::AppConfig;
use memstore::state::AppState;

pub const SECRET: &str = "test-secret-for-integration-tests";
pub const ADMIN_USER: &str = "admin";
pub const ADMIN_PASSWORD: &str = "admin-password";

pub const SITE: &str = "remark";
pub const POST: &str = "https://example.com/blog/first-post";

/// A running test server.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub state: AppState,
    auth: Option<(String, String)>,
    next_id: AtomicU64,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
    pub headers: reqwest::header::HeaderMap,
}

impl TestResponse {
    async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let headers = res.headers().clone();
        let text = res.text().await.expect("Failed to read response body");
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self {
            status,
            text,
            body,
            headers,
        }
    }

    /// The `result` of a successful envelope; panics with the error otherwise.
    pub fn result(&self) -> &Value {
        assert_eq!(self.status, 200, "unexpected status: {}", self.text);
        assert!(
            self.body.get("error").is_none(),
            "RPC call failed: {}",
            self.body["error"]
        );
        &self.body["result"]
    }

    /// The `error` string of a failed envelope.
    pub fn error(&self) -> &str {
        assert_eq!(self.status, 200, "unexpected status: {}", self.text);
        self.body["error"]
            .as_str()
            .unwrap_or_else(|| panic!("expected an error envelope, got {}", self.text))
    }
}

impl TestApp {
    /// Server without Basic auth.
    pub async fn spawn() -> Self {
        Self::spawn_with(AppConfig::with_secret(SECRET)).await
    }

    /// Server requiring the admin Basic credentials.
    pub async fn spawn_with_auth() -> Self {
        let mut config = AppConfig::with_secret(SECRET);
        config.auth.user = Some(ADMIN_USER.to_string());
        config.auth.password = Some(ADMIN_PASSWORD.to_string());
        Self::spawn_with(config).await
    }

    pub async fn spawn_with(config: AppConfig) -> Self {
        let auth = config
            .auth
            .user
            .clone()
            .map(|user| (user, config.auth.password.clone().unwrap_or_default()));
        let state = AppState::new(config);
        let app = memstore::build_router(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            state,
            auth,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn endpoint(&self) -> String {
        self.url(&self.state.config.server.api_root)
    }

    /// Call `method` with the server's own credentials.
    pub async fn rpc(&self, method: &str, params: Value) -> TestResponse {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.post_envelope(&json!({"method": method, "id": id, "params": params}))
            .await
    }

    /// POST a raw envelope with the server's own credentials.
    pub async fn post_envelope(&self, body: &Value) -> TestResponse {
        let mut req = self.client.post(self.endpoint()).json(body);
        if let Some((user, password)) = &self.auth {
            req = req.basic_auth(user, Some(password));
        }
        let res = req.send().await.expect("Failed to send POST request");
        TestResponse::from_response(res).await
    }

    /// POST a raw envelope with an explicit `Authorization` header, or none.
    pub async fn post_with_authorization(
        &self,
        body: &Value,
        authorization: Option<&str>,
    ) -> TestResponse {
        let mut req = self.client.post(self.endpoint()).json(body);
        if let Some(value) = authorization {
            req = req.header("Authorization", value);
        }
        let res = req.send().await.expect("Failed to send POST request");
        TestResponse::from_response(res).await
    }

    pub async fn post_raw(&self, body: &str) -> TestResponse {
        let mut req = self
            .client
            .post(self.endpoint())
            .header("Content-Type", "application/json")
            .body(body.to_string());
        if let Some((user, password)) = &self.auth {
            req = req.basic_auth(user, Some(password));
        }
        let res = req.send().await.expect("Failed to send POST request");
        TestResponse::from_response(res).await
    }

    /// Create a top-level comment and return its ID.
    pub async fn create_comment(&self, user: &str, text: &str) -> String {
        let res = self.rpc("store.create", comment_params(user, text, "")).await;
        res.result()
            .as_str()
            .expect("create should return an id")
            .to_string()
    }
}

pub fn basic(user: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{user}:{password}")))
}

pub fn comment_params(user: &str, text: &str, parent_id: &str) -> Value {
    json!({
        "locator": {"site": SITE, "url": POST},
        "parent_id": parent_id,
        "user": {"id": user, "name": format!("{user} name")},
        "text": text,
        "html": format!("<p>{text}</p>"),
        "timestamp": "2024-05-01T10:00:00Z",
    })
}

pub fn post() -> Value {
    json!({"site": SITE, "url": POST})
}
