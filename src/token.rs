//! Bearer token payload decoding. Signatures are never verified here; the
//! decoded claims only drive client-side decisions such as proactive refresh,
//! and the backend remains the authority on token validity.

use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::{DateTime, Duration, Utc};
use serde_json::{Map, Value};

pub type Claims = Map<String, Value>;

/// Decodes the payload segment of a `header.payload.signature` token.
/// Returns `None` for a missing segment, bad base64url, or a payload that is
/// not a JSON object.
#[must_use]
pub fn decode_payload(token: &str) -> Option<Claims> {
    let mut segments = token.split('.');
    let _header = segments.next()?;
    let payload = segments.next()?;

    let bytes = Base64UrlUnpadded::decode_vec(payload.trim_end_matches('=')).ok()?;

    match serde_json::from_slice::<Value>(&bytes).ok()? {
        Value::Object(claims) => Some(claims),
        _ => None,
    }
}

/// Reads `exp` as epoch seconds. Fractional values are truncated.
fn exp_seconds(claims: &Claims) -> Option<i64> {
    let exp = claims.get("exp")?;
    exp.as_i64().or_else(|| {
        #[allow(clippy::cast_possible_truncation)]
        exp.as_f64().map(|secs| secs as i64)
    })
}

/// Expiry of the token, or `None` when the payload or `exp` is missing.
/// An `exp` outside the representable date range is also `None`, so such a
/// token counts as expired.
#[must_use]
pub fn expiry_date(token: &str) -> Option<DateTime<Utc>> {
    let claims = decode_payload(token)?;
    DateTime::<Utc>::from_timestamp(exp_seconds(&claims)?, 0)
}

#[must_use]
pub fn is_expired(token: &str) -> bool {
    is_expired_at(token, Utc::now())
}

/// True when the payload or `exp` is missing, or `now` has reached `exp`.
#[must_use]
pub fn is_expired_at(token: &str, now: DateTime<Utc>) -> bool {
    expiry_date(token).map_or(true, |expiry| now >= expiry)
}

/// True when the token is expired or will be within `window`.
#[must_use]
pub fn expires_within(token: &str, window: Duration) -> bool {
    expiry_date(token).map_or(true, |expiry| Utc::now() + window >= expiry)
}

/// Time left until `exp`, `None` if already expired or undecodable.
#[must_use]
pub fn remaining_lifetime(token: &str) -> Option<std::time::Duration> {
    let expiry = expiry_date(token)?;
    (expiry - Utc::now()).to_std().ok()
}

#[cfg(test)]
pub(crate) fn encode_for_tests(claims: &Value) -> String {
    let header = Base64UrlUnpadded::encode_string(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = Base64UrlUnpadded::encode_string(claims.to_string().as_bytes());
    format!("{header}.{payload}.signature")
}
