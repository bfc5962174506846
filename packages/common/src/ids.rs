//! Identifier and fingerprint helpers.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::models::Locator;

const FIELD_SEPARATOR: &[u8] = &[0];

/// Hex SHA-256 of a comment body.
pub fn body_hash(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

/// Derive a comment ID from its identifying inputs.
///
/// Identical inputs always produce the same ID, so a replayed create collides
/// with the record it already wrote.
pub fn comment_id(
    locator: &Locator,
    parent_id: &str,
    author_id: &str,
    text: &str,
    time: DateTime<Utc>,
) -> String {
    let mut hasher = Sha256::new();
    for field in [
        locator.site.as_bytes(),
        locator.url.as_bytes(),
        parent_id.as_bytes(),
        author_id.as_bytes(),
        body_hash(text).as_bytes(),
    ] {
        hasher.update(field);
        hasher.update(FIELD_SEPARATOR);
    }
    hasher.update(time.timestamp_nanos_opt().unwrap_or_default().to_be_bytes());
    hex::encode(&hasher.finalize()[..16])
}

/// Fingerprint of a parent chain, root first, ending with the comment itself.
///
/// Two comments share a fingerprint only when they sit at the same place in
/// the same thread.
pub fn thread_fingerprint<'a>(chain: impl IntoIterator<Item = &'a str>) -> String {
    chain
        .into_iter()
        .fold(None, |parent: Option<String>, id| {
            Some(extend_fingerprint(parent.as_deref(), id))
        })
        .unwrap_or_else(|| extend_fingerprint(None, ""))
}

/// Fingerprint of `id` replying to the comment whose fingerprint is `parent`.
pub fn extend_fingerprint(parent: Option<&str>, id: &str) -> String {
    let mut hasher = Sha256::new();
    if let Some(parent) = parent {
        hasher.update(parent.as_bytes());
    }
    hasher.update(FIELD_SEPARATOR);
    hasher.update(id.as_bytes());
    hex::encode(&hasher.finalize()[..8])
}

/// Key whose lexicographic order matches (timestamp, id) order.
pub fn ordering_key(timestamp: DateTime<Utc>, id: &str) -> String {
    // Offset by i64::MIN so pre-epoch times still sort first as unsigned.
    let nanos = timestamp.timestamp_nanos_opt().unwrap_or_default();
    let shifted = (nanos as i128 - i64::MIN as i128) as u64;
    format!("{shifted:020}-{id}")
}
