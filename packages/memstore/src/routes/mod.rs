use axum::extract::State;
use axum::http::{HeaderName, HeaderValue};
use axum::response::Response;
use axum::{Router, routing::post};

use crate::handlers::{image, rpc::dispatch};
use crate::state::AppState;

pub fn rpc_routes(api_root: &str, max_image_size: u64) -> Router<AppState> {
    Router::new()
        .route(api_root, post(dispatch))
        .layer(image::body_limit(max_image_size))
}

/// Stamp every reply with the server signature headers.
pub async fn stamp_signature(State(state): State<AppState>, mut response: Response) -> Response {
    let sig = &state.signature;
    let headers = response.headers_mut();
    for (name, value) in [
        ("app-name", &sig.name),
        ("author", &sig.author),
        ("app-version", &sig.version),
    ] {
        if let Ok(value) = HeaderValue::from_str(value) {
            headers.insert(HeaderName::from_static(name), value);
        }
    }
    response
}
