use axum::Json;
use axum::extract::State;
use tracing::instrument;

use crate::extractors::auth::BasicAuth;
use crate::extractors::client_ip::ClientIp;
use crate::extractors::json::RpcJson;
use crate::rpc::{Request, Response};
use crate::state::AppState;

/// Single RPC entry point.
///
/// Auth and envelope failures become HTTP errors; everything past decoding,
/// unknown methods included, is answered with a 200 envelope.
#[instrument(
    name = "rpc",
    skip_all,
    fields(method = %request.method, id = request.id, client_ip = %client_ip)
)]
pub async fn dispatch(
    _auth: BasicAuth,
    ClientIp(client_ip): ClientIp,
    State(state): State<AppState>,
    RpcJson(request): RpcJson<Request>,
) -> Json<Response> {
    let Request { method, id, params } = request;
    let sig = state.signature.clone();

    let response = match state.registry.call(&state.stores, &method, params).await {
        Ok(result) => {
            tracing::debug!("RPC call succeeded");
            Response::success(id, result, sig)
        }
        Err(e) => {
            e.log();
            Response::failure(id, e, sig)
        }
    };
    Json(response)
}
