use axum::{extract::FromRequestParts, http::header, http::request::Parts};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sha2::{Digest, Sha256};

use crate::config::AuthConfig;
use crate::error::AppError;
use crate::state::AppState;

/// Caller that passed the HTTP Basic check.
///
/// Add this as a handler parameter to require credentials. When no auth user
/// is configured every request passes and `user` is `None`.
#[derive(Debug)]
pub struct BasicAuth {
    pub user: Option<String>,
}

impl FromRequestParts<AppState> for BasicAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected_user) = state.config.auth.user.as_deref() else {
            return Ok(BasicAuth { user: None });
        };

        let header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::Unauthorized)?;

        let (user, password) = decode(header).ok_or(AppError::Unauthorized)?;
        if !matches(&state.config.auth, expected_user, &user, &password) {
            tracing::warn!(user = %user, "Rejected Basic credentials");
            return Err(AppError::Unauthorized);
        }

        Ok(BasicAuth { user: Some(user) })
    }
}

/// Split a `Basic <base64(user:password)>` header value.
fn decode(header: &str) -> Option<(String, String)> {
    let (scheme, encoded) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let raw = STANDARD.decode(encoded.trim()).ok()?;
    let creds = String::from_utf8(raw).ok()?;
    let (user, password) = creds.split_once(':')?;
    Some((user.to_string(), password.to_string()))
}

fn matches(config: &AuthConfig, expected_user: &str, user: &str, password: &str) -> bool {
    let expected_password = config.password.as_deref().unwrap_or_default();
    // Evaluate both so timing does not reveal which one differed.
    let user_ok = same_secret(user, expected_user);
    let password_ok = same_secret(password, expected_password);
    user_ok & password_ok
}

/// Compare fixed-length digests without an early exit.
fn same_secret(given: &str, expected: &str) -> bool {
    let given = Sha256::digest(given.as_bytes());
    let expected = Sha256::digest(expected.as_bytes());
    given
        .iter()
        .zip(expected.iter())
        .fold(0u8, |diff, (a, b)| diff | (a ^ b))
        == 0
}
